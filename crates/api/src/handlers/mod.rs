pub mod auth;
pub mod edits;
pub mod moderation;
pub mod root;
