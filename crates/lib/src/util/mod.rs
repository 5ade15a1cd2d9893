//! Shared utilities.
//!
//! File hashing and the store-confined file reader.

pub mod hash;
pub mod secure;
