use std::sync::Arc;
use std::time::{Duration, SystemTime};

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web, App, Error};
use serde_json::{json, Value};

use shoutbin::handlers;
use shoutbin::models::Note;
use shoutbin::storage::memory::MemoryStorage;
use shoutbin::storage::Storage;

async fn spawn_app(
    storage: Arc<MemoryStorage>,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    let shared: Arc<dyn Storage> = storage;
    test::init_service(
        App::new()
            .app_data(web::Data::from(shared))
            .configure(handlers::routes),
    )
    .await
}

fn valid_note_body() -> Value {
    json!({
        "message": "QQ==",
        "iv": "aaaaaaaaaaaaaaaa",
        "expiry": 60000u64,
    })
}

async fn create_note<S, B>(app: &S, body: Value) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/note")
        .set_json(body)
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    test::read_body_json(resp).await
}

#[actix_web::test]
async fn create_returns_id_url_and_delete_token() {
    let app = spawn_app(Arc::new(MemoryStorage::new())).await;

    let created = create_note(&app, valid_note_body()).await;
    let id = created["id"].as_str().unwrap();
    assert_eq!(id.len(), 22);
    assert_eq!(created["url"], format!("/note/{}", id));
    assert_eq!(created["deleteToken"].as_str().unwrap().len(), 32);
}

#[actix_web::test]
async fn round_trip_returns_stored_fields_unchanged() {
    let app = spawn_app(Arc::new(MemoryStorage::new())).await;

    let body = json!({
        "message": "YWJjZGVmZ2hpamtsbW5vcA==",
        "iv": "aaaabbbbccccdddd",
        "salt": "0123456789abcdef",
        "expiry": 3600000u64,
    });
    let created = create_note(&app, body).await;
    let id = created["id"].as_str().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/note/{}/data", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Value = test::read_body_json(resp).await;
    assert_eq!(fetched["id"], *id);
    assert_eq!(fetched["message"], "YWJjZGVmZ2hpamtsbW5vcA==");
    assert_eq!(fetched["iv"], "aaaabbbbccccdddd");
    assert_eq!(fetched["salt"], "0123456789abcdef");
    assert_eq!(fetched["deleteToken"], created["deleteToken"]);
}

#[actix_web::test]
async fn note_is_consumed_exactly_once() {
    let app = spawn_app(Arc::new(MemoryStorage::new())).await;

    let created = create_note(&app, valid_note_body()).await;
    let id = created["id"].as_str().unwrap().to_string();
    let token = created["deleteToken"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/api/note/{}/data", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/note/{}", id))
        .insert_header(("x-delete-token", token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let deleted: Value = test::read_body_json(resp).await;
    assert_eq!(deleted["success"], true);

    let req = test::TestRequest::get()
        .uri(&format!("/api/note/{}/data", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["statusCode"], 404);
}

#[actix_web::test]
async fn delete_with_wrong_token_leaves_the_note_intact() {
    let app = spawn_app(Arc::new(MemoryStorage::new())).await;

    let created = create_note(&app, valid_note_body()).await;
    let id = created["id"].as_str().unwrap().to_string();
    let token = created["deleteToken"].as_str().unwrap();

    // well-formed but wrong: flip the first character
    let mut wrong = token.to_string();
    wrong.replace_range(0..1, if token.starts_with('z') { "a" } else { "z" });

    let req = test::TestRequest::delete()
        .uri(&format!("/api/note/{}", id))
        .insert_header(("x-delete-token", wrong))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Note not found or invalid delete token");

    let req = test::TestRequest::get()
        .uri(&format!("/api/note/{}/data", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn delete_without_token_header_is_rejected() {
    let app = spawn_app(Arc::new(MemoryStorage::new())).await;

    let created = create_note(&app, valid_note_body()).await;
    let id = created["id"].as_str().unwrap();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/note/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn expired_note_reports_gone_and_row_is_deleted() {
    let storage = Arc::new(MemoryStorage::new());
    let app = spawn_app(Arc::clone(&storage)).await;

    let now = SystemTime::now();
    storage
        .insert_note(Note {
            id: "expiredexpiredexpired0".to_string(),
            ciphertext: "QQ==".to_string(),
            iv: "aaaaaaaaaaaaaaaa".to_string(),
            salt: None,
            delete_token: "tttttttttttttttttttttttttttttttt".to_string(),
            created_at: now - Duration::from_secs(120),
            expires_at: now - Duration::from_secs(60),
        })
        .unwrap();

    let req = test::TestRequest::get()
        .uri("/api/note/expiredexpiredexpired0/data")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::GONE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Note expired");
    assert_eq!(body["statusCode"], 410);

    // lazy expiry removed the row, so the id now reads as never-existed
    assert!(storage
        .fetch_note("expiredexpiredexpired0")
        .unwrap()
        .is_none());
    let req = test::TestRequest::get()
        .uri("/api/note/expiredexpiredexpired0/data")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn message_validation_boundaries() {
    let app = spawn_app(Arc::new(MemoryStorage::new())).await;

    let mut body = valid_note_body();
    body["message"] = Value::from("A".repeat(140_000));
    create_note(&app, body).await;

    let mut body = valid_note_body();
    body["message"] = Value::from("A".repeat(140_001));
    let req = test::TestRequest::post()
        .uri("/api/note")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let mut body = valid_note_body();
    body["message"] = Value::from("not base64!");
    let req = test::TestRequest::post()
        .uri("/api/note")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn iv_validation_boundaries() {
    let app = spawn_app(Arc::new(MemoryStorage::new())).await;

    let mut body = valid_note_body();
    body["iv"] = Value::from("a".repeat(15));
    let req = test::TestRequest::post()
        .uri("/api/note")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["statusCode"], 400);

    let mut body = valid_note_body();
    body["iv"] = Value::from("a".repeat(16));
    create_note(&app, body).await;
}

#[actix_web::test]
async fn unlisted_expiry_is_rejected_not_clamped() {
    let app = spawn_app(Arc::new(MemoryStorage::new())).await;

    let mut body = valid_note_body();
    body["expiry"] = Value::from(61_000u64);
    let req = test::TestRequest::post()
        .uri("/api/note")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // absent expiry falls back to the default instead
    let body = json!({ "message": "QQ==", "iv": "aaaaaaaaaaaaaaaa" });
    create_note(&app, body).await;
}

#[actix_web::test]
async fn malformed_ids_never_reach_storage() {
    let app = spawn_app(Arc::new(MemoryStorage::new())).await;

    let req = test::TestRequest::get()
        .uri("/api/note/too-short/data")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/note/{}", "x".repeat(23)))
        .insert_header(("x-delete-token", "t".repeat(32)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // well-formed but unknown id is a plain miss
    let req = test::TestRequest::get()
        .uri(&format!("/api/note/{}/data", "x".repeat(22)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn view_shell_checks_the_id_format() {
    let app = spawn_app(Arc::new(MemoryStorage::new())).await;

    let req = test::TestRequest::get()
        .uri(&format!("/note/{}", "x".repeat(22)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().starts_with("text/html"));

    let req = test::TestRequest::get().uri("/note/nope").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn end_to_end_scenario() {
    let storage = Arc::new(MemoryStorage::new());
    let app = spawn_app(Arc::clone(&storage)).await;

    let created = create_note(
        &app,
        json!({ "message": "QQ==", "iv": "aaaaaaaaaaaaaaaa", "expiry": 60000u64 }),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 22);
    assert_eq!(created["url"], format!("/note/{}", id));
    let token = created["deleteToken"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 32);

    // before expiry the note reads back intact
    let req = test::TestRequest::get()
        .uri(&format!("/api/note/{}/data", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Value = test::read_body_json(resp).await;
    assert_eq!(fetched["message"], "QQ==");
    assert_eq!(fetched["iv"], "aaaaaaaaaaaaaaaa");
    assert_eq!(fetched["deleteToken"], token.as_str());

    // simulate the clock passing the expiry by rewriting the stored row
    let expired = Note {
        id: id.clone(),
        ciphertext: "QQ==".to_string(),
        iv: "aaaaaaaaaaaaaaaa".to_string(),
        salt: None,
        delete_token: token.clone(),
        created_at: SystemTime::now() - Duration::from_secs(61),
        expires_at: SystemTime::now() - Duration::from_secs(1),
    };
    assert!(storage.delete_authorized(&id, &token).unwrap());
    storage.insert_note(expired).unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/note/{}/data", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::GONE);
    assert_eq!(storage.note_count(), 0);
}
