pub mod alert_writer;
pub mod event_reader;
