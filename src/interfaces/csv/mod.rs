pub mod schedule_writer;
