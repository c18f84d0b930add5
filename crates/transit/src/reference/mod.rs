//! Bundled station/stop reference data, loaded once per process.

pub mod spatial;
pub mod store;

pub use store::ReferenceDataStore;
