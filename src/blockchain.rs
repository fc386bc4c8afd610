// Thin re-export module: implementation is in `blockchain/core.rs`, split
// into block hashing/mining, chain management and validation.

pub mod core;
pub use core::*;
