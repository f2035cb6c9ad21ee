use std::time::SystemTime;

use diesel::{Insertable, Queryable};

use crate::schema::notes;

/// One stored note. Rows are immutable: created once, then removed by an
/// authorized delete, lazy expiry, or the background sweep.
#[derive(Clone, Debug, Queryable, Insertable)]
#[diesel(table_name = notes)]
pub struct Note {
    pub id: String,
    pub ciphertext: String,
    pub iv: String,
    pub salt: Option<String>,
    pub delete_token: String,
    pub created_at: SystemTime,
    pub expires_at: SystemTime,
}

impl Note {
    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expires_at <= now
    }
}
