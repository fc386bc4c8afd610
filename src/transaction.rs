//! Transaction module: payload item types live in `types`

pub mod types;

pub use types::*;
