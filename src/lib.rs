// For integration tests only, crivo does binary-only packaging
pub mod bureau;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod document;
pub mod journal;
pub mod logging;
pub mod notify;
pub mod outcall;
pub mod pipeline;
pub mod retrieval;
pub mod store;
