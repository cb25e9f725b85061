//! Notes CRUD — list, add, detail, edit, delete, plus the home and
//! success pages.
//!
//! Every protected handler resolves the caller through
//! `auth::require_user` first; anonymous callers are redirected to the
//! login page with `next` pointing back here. Edit and delete are
//! owner-only; detail is readable by any authenticated user.

use actix_web::{HttpRequest, HttpResponse, Responder, http::header, web};

use crate::AppState;
use crate::auth;
use crate::db;
use crate::notes::form::{FieldErrors, NoteForm, WARNING};

pub const NOTES_PATH: &str = "/notes";
pub const SUCCESS_PATH: &str = "/done";

fn success_redirect() -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, SUCCESS_PATH))
        .finish()
}

fn forbidden(action: &str) -> HttpResponse {
    HttpResponse::Forbidden().json(serde_json::json!({
        "error": format!("Only the author can {} this note", action)
    }))
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": "Note not found"
    }))
}

fn db_error(e: rusqlite::Error) -> HttpResponse {
    log::error!("Database error: {}", e);
    HttpResponse::InternalServerError().json(serde_json::json!({
        "error": format!("Database error: {}", e)
    }))
}

// --- Public pages ---

async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "page": "home",
        "message": "Personal notes. Log in to see yours."
    }))
}

// --- List ---

async fn list_notes(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let user = match auth::require_user(&data, &req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match data.db.list_notes_by_author(user.id) {
        Ok(notes) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "notes": notes
        })),
        Err(e) => db_error(e),
    }
}

// --- Add ---

async fn add_note_page(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = auth::require_user(&data, &req) {
        return resp;
    }

    HttpResponse::Ok().json(serde_json::json!({
        "page": "add",
        "form": { "fields": ["title", "text", "slug"] }
    }))
}

async fn add_note(
    data: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<NoteForm>,
) -> impl Responder {
    let user = match auth::require_user(&data, &req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    let validated = match form.validate(&data.db) {
        Ok(Ok(validated)) => validated,
        Ok(Err(errors)) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "errors": errors
            }));
        }
        Err(e) => return db_error(e),
    };

    match data
        .db
        .create_note(&validated.title, &validated.text, &validated.slug, user.id)
    {
        Ok(_) => success_redirect(),
        // Lost a race against another submission with the same slug
        Err(e) if db::is_unique_violation(&e) => {
            let mut errors = FieldErrors::default();
            errors.add("slug", format!("{}{}", validated.slug, WARNING));
            HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "errors": errors
            }))
        }
        Err(e) => db_error(e),
    }
}

// --- Detail ---

async fn note_detail(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = auth::require_user(&data, &req) {
        return resp;
    }
    let slug = path.into_inner();

    match data.db.get_note_by_slug(&slug) {
        Ok(Some(note)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "note": note
        })),
        Ok(None) => not_found(),
        Err(e) => db_error(e),
    }
}

// --- Edit ---

async fn edit_note_page(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    let user = match auth::require_user(&data, &req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let slug = path.into_inner();

    match data.db.get_note_by_slug(&slug) {
        Ok(Some(note)) if note.is_owned_by(user.id) => HttpResponse::Ok().json(serde_json::json!({
            "page": "edit",
            "form": {
                "title": note.title,
                "text": note.text,
                "slug": note.slug
            }
        })),
        Ok(Some(_)) => forbidden("edit"),
        Ok(None) => not_found(),
        Err(e) => db_error(e),
    }
}

async fn edit_note(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    form: web::Form<NoteForm>,
) -> impl Responder {
    let user = match auth::require_user(&data, &req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let slug = path.into_inner();

    let note = match data.db.get_note_by_slug(&slug) {
        Ok(Some(note)) => note,
        Ok(None) => return not_found(),
        Err(e) => return db_error(e),
    };

    if !note.is_owned_by(user.id) {
        return forbidden("edit");
    }

    let (title, text) = match form.validate_edit() {
        Ok(fields) => fields,
        Err(errors) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "errors": errors
            }));
        }
    };

    match data.db.update_note(&slug, &title, &text) {
        Ok(Some(_)) => success_redirect(),
        Ok(None) => not_found(),
        Err(e) => db_error(e),
    }
}

// --- Delete ---

async fn delete_note_page(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    let user = match auth::require_user(&data, &req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let slug = path.into_inner();

    match data.db.get_note_by_slug(&slug) {
        Ok(Some(note)) if note.is_owned_by(user.id) => HttpResponse::Ok().json(serde_json::json!({
            "page": "delete",
            "note": note
        })),
        Ok(Some(_)) => forbidden("delete"),
        Ok(None) => not_found(),
        Err(e) => db_error(e),
    }
}

async fn delete_note(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    let user = match auth::require_user(&data, &req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let slug = path.into_inner();

    let note = match data.db.get_note_by_slug(&slug) {
        Ok(Some(note)) => note,
        Ok(None) => return not_found(),
        Err(e) => return db_error(e),
    };

    if !note.is_owned_by(user.id) {
        return forbidden("delete");
    }

    match data.db.delete_note(&slug) {
        Ok(_) => success_redirect(),
        Err(e) => db_error(e),
    }
}

// --- Success page ---

async fn success_page(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = auth::require_user(&data, &req) {
        return resp;
    }

    HttpResponse::Ok().json(serde_json::json!({
        "page": "done",
        "message": "Done."
    }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(home));
    cfg.route(SUCCESS_PATH, web::get().to(success_page));
    cfg.service(
        web::scope(NOTES_PATH)
            .route("", web::get().to(list_notes))
            .route("/add", web::get().to(add_note_page))
            .route("/add", web::post().to(add_note))
            .route("/{slug}", web::get().to(note_detail))
            .route("/{slug}/edit", web::get().to(edit_note_page))
            .route("/{slug}/edit", web::post().to(edit_note))
            .route("/{slug}/delete", web::get().to(delete_note_page))
            .route("/{slug}/delete", web::post().to(delete_note))
            .route("/{slug}/delete", web::delete().to(delete_note)),
    );
}
