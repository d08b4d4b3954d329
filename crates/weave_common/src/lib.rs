//! Shared foundational types used across the Weave behavior-graph toolchain.
//!
//! This crate provides the literal value model carried on graph sockets,
//! content hashing for reproducible exports, and common result types.

#![warn(missing_docs)]

pub mod hash;
pub mod result;
pub mod value;

pub use hash::ContentHash;
pub use result::{InternalError, Stage, WeaveResult};
pub use value::{Value, ValueType};
