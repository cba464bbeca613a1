/// Edit ids come from an atomic counter in the key-value store and start at 1.
pub type EditId = i64;
