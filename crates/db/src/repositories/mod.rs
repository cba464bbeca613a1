//! Repositories over the key-value store.

pub mod edit_queue;

pub use edit_queue::{ApprovalTransition, EditQueue};
