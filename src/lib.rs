pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod exchange;
pub mod graph;
pub mod storage;
pub mod value;

pub use error::{NodeportError, Result};
