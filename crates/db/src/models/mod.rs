//! Mapping between domain types and stored hash fields.

pub mod edit;
