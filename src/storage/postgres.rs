use std::time::SystemTime;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::ConnectionManager;
use diesel::sql_types::{BigInt, Timestamp};

use super::{Storage, StorageError, SweepSession};
use crate::models::Note;
use crate::schema::notes::dsl::{delete_token, id, notes};

pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;
type PooledPg = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

const SWEEP_LOCK: &str = "SELECT pg_try_advisory_lock(hashtext('note_sweep')) AS acquired";
const SWEEP_UNLOCK: &str = "SELECT pg_advisory_unlock(hashtext('note_sweep'))";

/// Hard ceiling on any single sweep statement. A runaway sweep must not sit
/// on the advisory lock indefinitely.
const SWEEP_STATEMENT_TIMEOUT_MS: u64 = 120_000;

pub struct PgStorage {
    pool: Pool,
}

impl PgStorage {
    pub fn new(pool: Pool) -> PgStorage {
        PgStorage { pool }
    }
}

#[derive(QueryableByName)]
struct LockRow {
    #[diesel(sql_type = diesel::sql_types::Bool)]
    acquired: bool,
}

impl Storage for PgStorage {
    fn insert_note(&self, note: Note) -> Result<(), StorageError> {
        let mut connection = self.pool.get()?;
        diesel::insert_into(notes)
            .values(&note)
            .execute(&mut connection)?;
        Ok(())
    }

    fn fetch_note(&self, note_id: &str) -> Result<Option<Note>, StorageError> {
        let mut connection = self.pool.get()?;
        Ok(notes
            .find(note_id)
            .first::<Note>(&mut connection)
            .optional()?)
    }

    fn delete_authorized(&self, note_id: &str, token: &str) -> Result<bool, StorageError> {
        let mut connection = self.pool.get()?;
        let deleted = diesel::delete(notes.filter(id.eq(note_id).and(delete_token.eq(token))))
            .execute(&mut connection)?;
        Ok(deleted > 0)
    }

    fn begin_sweep(&self) -> Result<Option<Box<dyn SweepSession + '_>>, StorageError> {
        let mut connection = self.pool.get()?;

        // Advisory locks are session-scoped, so the sweep has to keep this
        // exact connection until it unlocks.
        let lock = diesel::sql_query(SWEEP_LOCK).get_result::<LockRow>(&mut connection)?;
        if !lock.acquired {
            return Ok(None);
        }

        let timeout = format!("SET statement_timeout = {}", SWEEP_STATEMENT_TIMEOUT_MS);
        if let Err(err) = diesel::sql_query(timeout).execute(&mut connection) {
            // never return the connection to the pool still holding the lock
            let _ = diesel::sql_query(SWEEP_UNLOCK).execute(&mut connection);
            return Err(err.into());
        }

        Ok(Some(Box::new(PgSweep { connection })))
    }
}

struct PgSweep {
    connection: PooledPg,
}

impl SweepSession for PgSweep {
    fn delete_expired_batch(
        &mut self,
        cutoff: SystemTime,
        limit: i64,
    ) -> Result<usize, StorageError> {
        let deleted = diesel::sql_query(
            "DELETE FROM notes WHERE id IN \
             (SELECT id FROM notes WHERE expires_at <= $1 LIMIT $2)",
        )
        .bind::<Timestamp, _>(cutoff)
        .bind::<BigInt, _>(limit)
        .execute(&mut self.connection)?;
        Ok(deleted)
    }

    fn finish(mut self: Box<Self>) -> Vec<String> {
        let mut errors = Vec::new();
        if let Err(err) = diesel::sql_query("RESET statement_timeout").execute(&mut self.connection)
        {
            errors.push(format!("failed to reset statement timeout: {}", err));
        }
        if let Err(err) = diesel::sql_query(SWEEP_UNLOCK).execute(&mut self.connection) {
            errors.push(format!("failed to release sweep lock: {}", err));
        }
        errors
    }
}
