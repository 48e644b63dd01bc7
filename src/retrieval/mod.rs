#![allow(dead_code)]

pub mod client;
pub mod ports;
pub mod types;

pub use client::HttpRetrievalClient;
pub use ports::RetrievalPort;
pub use types::{RetrievalReply, RetrievedChunk};
