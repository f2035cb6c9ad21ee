use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

use crate::validate::DELETE_TOKEN_LEN;

/// 22 url-safe characters from the 128 random bits of a v4 UUID. The id is
/// the only public handle on a note, so it has to be unguessable.
pub fn new_note_id() -> String {
    URL_SAFE_NO_PAD.encode(Uuid::new_v4().as_bytes())
}

/// 32 url-safe characters from two fresh 128-bit values. Independent of the
/// note id so knowing one never yields the other.
pub fn new_delete_token() -> String {
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    let mut token = URL_SAFE_NO_PAD.encode(seed);
    token.truncate(DELETE_TOKEN_LEN);
    token
}
