pub mod monitor;
pub mod monitoring;
pub mod storage;
pub mod tools;
pub mod tracker;
pub mod types;
pub mod utils;

pub use crate::types::*;
