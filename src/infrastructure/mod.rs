//! Adapters implementing the domain ports.

pub mod csv_alerts;
pub mod event_bus;
pub mod in_memory;
pub mod local_kms;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
