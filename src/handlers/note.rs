use std::time::{Instant, SystemTime};

use actix_web::{web, HttpRequest, HttpResponse};
use serde_derive::Deserialize;
use serde_json::json;

use super::pad_response_time;
use crate::errors::ApiError;
use crate::ident;
use crate::models::Note;
use crate::storage::{Storage, StorageError};
use crate::validate;

#[derive(Deserialize)]
pub struct NewNoteRequest {
    message: String,
    iv: String,
    salt: Option<String>,
    expiry: Option<u64>,
}

pub async fn create(
    input: web::Json<NewNoteRequest>,
    storage: web::Data<dyn Storage>,
) -> Result<HttpResponse, ApiError> {
    validate::check_message(&input.message).map_err(ApiError::Validation)?;
    validate::check_iv(&input.iv).map_err(ApiError::Validation)?;
    if let Some(salt) = &input.salt {
        validate::check_salt(salt).map_err(ApiError::Validation)?;
    }
    let ttl = validate::expiry_duration(input.expiry).map_err(ApiError::Validation)?;

    let created_at = SystemTime::now();
    let expires_at = created_at + ttl;

    // 128-bit ids make a collision a freak event; one retry covers it
    // without letting a misbehaving backend spin us forever
    for attempt in 0..2 {
        let note = Note {
            id: ident::new_note_id(),
            ciphertext: input.message.clone(),
            iv: input.iv.clone(),
            salt: input.salt.clone(),
            delete_token: ident::new_delete_token(),
            created_at,
            expires_at,
        };
        let note_id = note.id.clone();
        let token = note.delete_token.clone();

        match storage.insert_note(note) {
            Ok(()) => {
                log::info!("note created: {} ({} chars)", note_id, input.message.len());
                return Ok(HttpResponse::Ok().json(json!({
                    "id": note_id,
                    "url": format!("/note/{}", note_id),
                    "deleteToken": token,
                })));
            }
            Err(StorageError::IdCollision) => {
                log::warn!("note id collision on attempt {}", attempt + 1);
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(StorageError::Backend("note id collision retries exhausted".to_string()).into())
}

pub async fn retrieve(
    note_id: web::Path<String>,
    storage: web::Data<dyn Storage>,
) -> Result<HttpResponse, ApiError> {
    let started = Instant::now();
    let outcome = retrieve_note(&note_id, storage.get_ref());
    pad_response_time(started).await;
    outcome
}

fn retrieve_note(note_id: &str, storage: &dyn Storage) -> Result<HttpResponse, ApiError> {
    validate::check_note_id(note_id).map_err(ApiError::Validation)?;

    let note = match storage.fetch_note(note_id)? {
        Some(note) => note,
        None => return Err(ApiError::NotFound),
    };

    if note.is_expired(SystemTime::now()) {
        // lazy expiry; the conditional delete means a racing sweep or
        // explicit delete and this path cannot both claim the row
        if let Err(err) = storage.delete_authorized(note_id, &note.delete_token) {
            log::error!("failed to remove expired note {}: {}", note_id, err);
        }
        return Err(ApiError::Expired);
    }

    Ok(HttpResponse::Ok().json(json!({
        "id": note.id,
        "message": note.ciphertext,
        "iv": note.iv,
        "salt": note.salt,
        "deleteToken": note.delete_token,
    })))
}

pub async fn delete(
    note_id: web::Path<String>,
    req: HttpRequest,
    storage: web::Data<dyn Storage>,
) -> Result<HttpResponse, ApiError> {
    let started = Instant::now();
    let outcome = delete_note(&note_id, &req, storage.get_ref());
    pad_response_time(started).await;
    outcome
}

fn delete_note(
    note_id: &str,
    req: &HttpRequest,
    storage: &dyn Storage,
) -> Result<HttpResponse, ApiError> {
    validate::check_note_id(note_id).map_err(ApiError::Validation)?;

    let token = req
        .headers()
        .get("x-delete-token")
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Validation("missing x-delete-token header"))?;
    validate::check_delete_token(token).map_err(ApiError::Validation)?;

    if storage.delete_authorized(note_id, token)? {
        log::info!("note deleted: {}", note_id);
        Ok(HttpResponse::Ok().json(json!({ "success": true })))
    } else {
        Err(ApiError::DeleteRejected)
    }
}
