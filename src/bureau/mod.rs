#![allow(dead_code)]

pub mod client;
pub mod ports;
pub mod types;

pub use client::HttpBureauClient;
pub use ports::BureauPort;
pub use types::{BureauReply, RestrictionReport};
