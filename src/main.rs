use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use paypilot::application::intake::{self, AssistantReply};
use paypilot::application::recurring::RecurringInvoiceService;
use paypilot::application::terminal::TerminalHandle;
use paypilot::config::Config;
use paypilot::domain::amount::ChargeAmount;
use paypilot::domain::card::CardField;
use paypilot::domain::invoice::Invoice;
use paypilot::domain::ports::{Clock, ClockBox, SchedulerBox};
use paypilot::domain::recurring::{RecurrenceFrequency, compute_next_occurrence};
use paypilot::domain::terminal::PaymentTerminal;
use paypilot::error::PilotError;
use paypilot::infrastructure::clock::{FixedClock, SystemClock};
use paypilot::infrastructure::in_memory::InMemoryRecurringInvoiceStore;
use paypilot::infrastructure::json_file::JsonFileRecurringInvoiceStore;
use paypilot::infrastructure::timer::{InstantScheduler, TokioScheduler};
use paypilot::interfaces::csv::schedule_writer::ScheduleWriter;
use paypilot::interfaces::json::ledger::{load_ledger, save_ledger};
use rust_decimal::Decimal;
use serde_json::json;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one simulated card charge through the terminal
    Charge {
        /// Amount to charge
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        name: String,
        #[arg(long)]
        number: String,
        /// Expiry as MM/YY
        #[arg(long)]
        expiry: String,
        #[arg(long)]
        cvc: String,
        #[arg(long)]
        address: String,
        #[arg(long, default_value = "")]
        city: String,
        #[arg(long)]
        zip: String,
        /// Skip the stage delays
        #[arg(long)]
        instant: bool,
    },

    /// Print the occurrence after DATE
    NextDate {
        date: NaiveDate,
        frequency: RecurrenceFrequency,
    },

    /// Flag due invoices in a ledger and print the schedule as CSV
    Due {
        ledger: PathBuf,
        /// Evaluate at this RFC 3339 instant instead of now
        #[arg(long)]
        now: Option<DateTime<Utc>>,
        /// Write the flags back to the ledger
        #[arg(long)]
        in_place: bool,
    },

    /// Approve a recurring invoice and print the drafted invoice as JSON
    Approve {
        ledger: PathBuf,
        #[arg(long)]
        id: String,
        #[arg(long)]
        now: Option<DateTime<Utc>>,
        /// Write the advanced schedule back to the ledger
        #[arg(long)]
        in_place: bool,
    },

    /// Interpret an assistant reply ("-" reads stdin)
    Intake {
        response: PathBuf,
        /// Ledger to append recurring invoices to
        #[arg(long)]
        ledger: Option<PathBuf>,
    },

    /// Print the structured-output schema for invoice replies
    Schema,

    /// Poll a ledger and flag invoices in it as they come due, until Ctrl-C
    Watch { ledger: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Charge {
            amount,
            name,
            number,
            expiry,
            cvc,
            address,
            city,
            zip,
            instant,
        } => {
            let config = Config::from_env().into_diagnostic()?;
            let amount = ChargeAmount::new(amount).into_diagnostic()?;
            let scheduler: SchedulerBox = if instant {
                Box::new(InstantScheduler)
            } else {
                Box::new(TokioScheduler)
            };
            let terminal = PaymentTerminal::new(config.gateway.clone(), config.stage_timings());
            let handle = TerminalHandle::new(terminal, scheduler);
            let today = SystemClock.today();

            handle.set_charge_amount(Some(amount)).await;
            for (field, value) in [
                (CardField::Name, name),
                (CardField::Number, number),
                (CardField::Expiry, expiry),
                (CardField::Cvc, cvc),
                (CardField::Address, address),
                (CardField::City, city),
                (CardField::Zip, zip),
            ] {
                handle.update_field(field, &value, today).await;
            }

            let outcome = match handle.charge(today, |_| {}).await {
                Ok(outcome) => outcome,
                Err(PilotError::CardRejected(errors)) => {
                    for (field, message) in errors.iter() {
                        eprintln!("{field}: {message}");
                    }
                    return Err(PilotError::CardRejected(errors)).into_diagnostic();
                }
                Err(e) => return Err(e).into_diagnostic(),
            };

            if let Some(outcome) = outcome {
                for status in &outcome.path {
                    println!("{status}");
                }
                match outcome.reason {
                    None => println!("Successfully processed a payment of {amount}"),
                    Some(reason) => println!("Payment of {amount} failed: {reason}"),
                }
            }
            handle.set_charge_amount(None).await;
        }

        Command::NextDate { date, frequency } => {
            let next = compute_next_occurrence(date, frequency).into_diagnostic()?;
            println!("{next}");
        }

        Command::Due {
            ledger,
            now,
            in_place,
        } => {
            let service = open_ledger(&ledger, clock_at(now))?;
            service.check_due().await.into_diagnostic()?;
            let invoices = service.list().await.into_diagnostic()?;

            let stdout = io::stdout();
            let mut writer = ScheduleWriter::new(stdout.lock());
            writer.write_schedule(&invoices).into_diagnostic()?;

            if in_place {
                save_ledger(&ledger, &invoices).into_diagnostic()?;
            }
        }

        Command::Approve {
            ledger,
            id,
            now,
            in_place,
        } => {
            let service = open_ledger(&ledger, clock_at(now))?;
            let draft = service.approve(&id).await.into_diagnostic()?;
            print_draft(&draft)?;

            if in_place {
                let invoices = service.list().await.into_diagnostic()?;
                save_ledger(&ledger, &invoices).into_diagnostic()?;
            }
        }

        Command::Intake { response, ledger } => {
            let text = read_response(&response).into_diagnostic()?;
            let today = SystemClock.today();

            match intake::interpret(&text, today, intake::new_recurring_id) {
                AssistantReply::Draft(invoice) => print_draft(&invoice)?,
                AssistantReply::Scheduled(recurring) => {
                    println!(
                        "Scheduled a new {} recurring invoice for {} ({})",
                        recurring.recurrence_frequency, recurring.customer_name, recurring.id
                    );
                    match ledger {
                        Some(path) => {
                            let service = open_ledger(&path, Box::new(SystemClock))?;
                            service.schedule(recurring).await.into_diagnostic()?;
                            let invoices = service.list().await.into_diagnostic()?;
                            save_ledger(&path, &invoices).into_diagnostic()?;
                        }
                        None => println!(
                            "{}",
                            serde_json::to_string_pretty(&recurring).into_diagnostic()?
                        ),
                    }
                }
                AssistantReply::Message(message) => println!("{message}"),
            }
        }

        Command::Schema => {
            println!(
                "{}",
                serde_json::to_string_pretty(&intake::invoice_response_schema()).into_diagnostic()?
            );
        }

        Command::Watch { ledger } => {
            let config = Config::from_env().into_diagnostic()?;
            let store = JsonFileRecurringInvoiceStore::new(&ledger);
            let service = RecurringInvoiceService::new(Box::new(store), Box::new(SystemClock));
            tracing::info!(ledger = %ledger.display(), every = ?config.poll_interval, "Watching recurring invoices");
            service
                .poll_until(config.poll_interval, async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await
                .into_diagnostic()?;
        }
    }

    Ok(())
}

fn clock_at(now: Option<DateTime<Utc>>) -> ClockBox {
    match now {
        Some(now) => Box::new(FixedClock::new(now)),
        None => Box::new(SystemClock),
    }
}

fn open_ledger(path: &Path, clock: ClockBox) -> Result<RecurringInvoiceService> {
    let invoices = load_ledger(path).into_diagnostic()?;
    let store = InMemoryRecurringInvoiceStore::with_invoices(invoices);
    Ok(RecurringInvoiceService::new(Box::new(store), clock))
}

fn read_response(path: &Path) -> io::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        std::fs::read_to_string(path)
    }
}

fn print_draft(invoice: &Invoice) -> Result<()> {
    let totals = invoice.totals().rounded();
    let preview = json!({
        "invoice": invoice,
        "paymentChannel": invoice.payment_channel().map(|channel| channel.to_string()),
        "subtotal": totals.subtotal,
        "tax": totals.tax,
        "total": totals.total,
    });
    println!("{}", serde_json::to_string_pretty(&preview).into_diagnostic()?);
    Ok(())
}
