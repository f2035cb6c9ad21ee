use std::time::SystemTime;

use derive_more::Display;

use crate::models::Note;

pub mod memory;
pub mod postgres;

/// Expired rows are removed at most this many at a time per sweep statement.
pub const SWEEP_BATCH_SIZE: i64 = 1000;

#[derive(Debug, Display)]
pub enum StorageError {
    /// A freshly generated note id hit the unique constraint. Retryable with
    /// a new id.
    #[display(fmt = "note id already taken")]
    IdCollision,
    #[display(fmt = "storage backend failure: {}", _0)]
    Backend(String),
}

impl From<diesel::result::Error> for StorageError {
    fn from(err: diesel::result::Error) -> StorageError {
        match err {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => StorageError::IdCollision,
            other => StorageError::Backend(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for StorageError {
    fn from(err: r2d2::Error) -> StorageError {
        StorageError::Backend(err.to_string())
    }
}

/// The shared durable record store. One production implementation on
/// postgres, one in-memory fake for tests; request handlers and the sweeper
/// only ever see this trait.
pub trait Storage: Send + Sync {
    fn insert_note(&self, note: Note) -> Result<(), StorageError>;

    fn fetch_note(&self, note_id: &str) -> Result<Option<Note>, StorageError>;

    /// Deletes the note only if both the id and the delete token match, as a
    /// single conditional statement. Returns whether a row was removed; an
    /// unknown id and a wrong token are indistinguishable to the caller.
    fn delete_authorized(&self, note_id: &str, token: &str) -> Result<bool, StorageError>;

    /// Opens an exclusive sweep session, or `None` when another sweeper
    /// already holds the lock. Lock contention is a normal outcome, not an
    /// error.
    fn begin_sweep(&self) -> Result<Option<Box<dyn SweepSession + '_>>, StorageError>;
}

/// One held sweep: the backend's session keeps the cross-process lock for as
/// long as the session lives.
pub trait SweepSession {
    /// Deletes up to `limit` notes that expired at or before `cutoff`,
    /// returning how many went away.
    fn delete_expired_batch(
        &mut self,
        cutoff: SystemTime,
        limit: i64,
    ) -> Result<usize, StorageError>;

    /// Releases the lock and any session-scoped settings. Cleanup failures
    /// are reported back rather than masking the sweep's own result.
    fn finish(self: Box<Self>) -> Vec<String>;
}
