pub mod facade;

pub use facade::{ArrivalsResult, TransitFacade};
