use std::time::{Duration, Instant};

use actix_web::{web, HttpResponse};

use crate::validate;

pub mod note;

/// Floor on the wall-clock time of retrieval and deletion responses. Every
/// outcome is padded to at least this long so response timing does not
/// reveal whether an id exists, is expired, or had a mismatched token.
pub const MIN_RESPONSE_TIME: Duration = Duration::from_millis(100);

pub async fn pad_response_time(started: Instant) {
    if let Some(remaining) = MIN_RESPONSE_TIME.checked_sub(started.elapsed()) {
        actix_web::rt::time::sleep(remaining).await;
    }
}

pub async fn index() -> impl actix_web::Responder {
    HttpResponse::Ok().finish()
}

const VIEW_SHELL: &str = "<!DOCTYPE html>\n\
<html lang=\"en\">\n\
<head>\n\
<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<title>shoutbin</title>\n\
</head>\n\
<body>\n\
<main id=\"note-view\" data-endpoint=\"/api/note\">\n\
<noscript>This note is decrypted in your browser; enable JavaScript to read it.</noscript>\n\
</main>\n\
<script src=\"/js/view.js\"></script>\n\
</body>\n\
</html>\n";

/// Shell page hosting the client-side decrypt UI. The ciphertext itself is
/// only ever fetched by the page's script via the data endpoint.
pub async fn view_page(note_id: web::Path<String>) -> HttpResponse {
    if validate::check_note_id(&note_id).is_err() {
        return HttpResponse::NotFound().finish();
    }
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(VIEW_SHELL)
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/note/{id}", web::get().to(view_page))
        .service(
            web::scope("/api/note")
                .route("", web::post().to(note::create))
                .route("/{id}/data", web::get().to(note::retrieve))
                .route("/{id}", web::delete().to(note::delete)),
        );
}
