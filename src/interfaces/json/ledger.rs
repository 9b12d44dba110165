use crate::domain::recurring::RecurringInvoice;
use crate::error::Result;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Reads a recurring-invoice ledger: a JSON array of recurring invoices.
pub fn read_ledger<R: Read>(source: R) -> Result<Vec<RecurringInvoice>> {
    Ok(serde_json::from_reader(BufReader::new(source))?)
}

pub fn write_ledger<W: Write>(sink: W, invoices: &[RecurringInvoice]) -> Result<()> {
    let mut writer = BufWriter::new(sink);
    serde_json::to_writer_pretty(&mut writer, invoices)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Loads a ledger file; a missing file is an empty ledger.
pub fn load_ledger(path: &Path) -> Result<Vec<RecurringInvoice>> {
    match File::open(path) {
        Ok(file) => read_ledger(file),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

pub fn save_ledger(path: &Path, invoices: &[RecurringInvoice]) -> Result<()> {
    write_ledger(File::create(path)?, invoices)
}
