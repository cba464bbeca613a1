//! Domain types shared by every suggestor crate.
//!
//! Nothing in here performs I/O: the key-value store, the wiki client and
//! the HTTP layer all build on these types.

pub mod credential;
pub mod edit;
pub mod error;
pub mod types;
