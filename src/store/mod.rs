#![allow(dead_code)]

pub mod error;
pub mod file;
pub mod memory;
pub mod ports;
pub mod types;

pub use error::{StoreError, StoreErrorKind};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use ports::StorePort;
pub use types::{ClientRecord, LoanRecord};
