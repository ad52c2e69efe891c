pub mod client;
pub mod types;

pub use client::{NodeClient, MAX_BLOCKS, MIN_BLOCKS};
pub use types::*;
