//! Server-driven pagination state for table screens.

mod controller;

pub use controller::{TableController, PAGE_SIZES};
