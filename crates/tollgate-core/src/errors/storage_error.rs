/// Durable-tier failures. The cache swallows these; they only escape from
/// tier constructors and direct tier calls.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("{tier} tier lock poisoned")]
    LockPoisoned { tier: String },

    #[error("corrupt entry {key} in {tier} tier: {details}")]
    CorruptEntry {
        tier: String,
        key: String,
        details: String,
    },
}
