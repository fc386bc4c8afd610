//! Intercoin - A minimal tamper-evident proof-of-work ledger
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`blockchain`] - Block hashing and mining, the ledger, chain validation
//! - [`transaction`] - Payload item types
//!
//! ## Integration
//! - [`observer`] - Hooks for mining and validation messages
//! - [`shared`] - Mutex-guarded ledger handle for threaded hosts
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod transaction;

// ============================================================================
// Integration
// ============================================================================
pub mod observer;
pub mod shared;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

pub use blockchain::{Block, BlockSummary, InvalidReason, Ledger, ValidationReport};
pub use error::{ChainError, Result};
pub use transaction::{Payload, Transaction};
