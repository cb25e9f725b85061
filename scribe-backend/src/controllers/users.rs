//! Signup, login, and logout.
//!
//! The page GETs are public and answer 200 so anonymous navigation
//! works; the POSTs perform the action. Login and signup issue the
//! session cookie and redirect to `next` (relative paths only) or the
//! notes list.

use actix_web::{HttpRequest, HttpResponse, Responder, cookie::Cookie, http::header, web};
use serde::Deserialize;

use crate::AppState;
use crate::auth;
use crate::controllers::notes::NOTES_PATH;
use crate::notes::form::FieldErrors;

const REQUIRED: &str = "This field is required";

/// Pick the post-login redirect target. Only relative paths are
/// honored, so a crafted `next` cannot send the browser off-site.
fn redirect_target(next: Option<&str>) -> String {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") => n.to_string(),
        _ => NOTES_PATH.to_string(),
    }
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build(auth::SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .finish()
}

// --- Login ---

#[derive(Debug, Deserialize)]
struct LoginPageQuery {
    next: Option<String>,
}

async fn login_page(query: web::Query<LoginPageQuery>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "page": "login",
        "form": { "fields": ["username", "password"] },
        "next": query.next,
    }))
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    next: Option<String>,
}

async fn login(data: web::Data<AppState>, body: web::Form<LoginForm>) -> impl Responder {
    let user = match data.db.get_user_by_username(body.username.trim()) {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "Invalid username or password"
            }));
        }
        Err(e) => {
            log::error!("Failed to look up user: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }));
        }
    };

    if !auth::verify_password(&body.password, &user.password_hash) {
        return HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "Invalid username or password"
        }));
    }

    match data.db.create_session(user.id) {
        Ok(session) => HttpResponse::Found()
            .append_header((header::LOCATION, redirect_target(body.next.as_deref())))
            .cookie(session_cookie(session.token))
            .finish(),
        Err(e) => {
            log::error!("Failed to create session: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

// --- Logout ---

async fn logout_page() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "page": "logout"
    }))
}

async fn logout(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Some(cookie) = req.cookie(auth::SESSION_COOKIE) {
        if let Err(e) = data.db.delete_session(cookie.value()) {
            log::error!("Failed to delete session: {}", e);
        }
    }

    let mut removal = Cookie::new(auth::SESSION_COOKIE, "");
    removal.set_path("/");
    removal.make_removal();

    HttpResponse::Ok().cookie(removal).json(serde_json::json!({
        "success": true
    }))
}

// --- Signup ---

async fn signup_page() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "page": "signup",
        "form": { "fields": ["username", "password"] },
    }))
}

#[derive(Debug, Deserialize)]
struct SignupForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

async fn signup(data: web::Data<AppState>, body: web::Form<SignupForm>) -> impl Responder {
    let username = body.username.trim();

    let mut errors = FieldErrors::default();
    if username.is_empty() {
        errors.add("username", REQUIRED.to_string());
    }
    if body.password.is_empty() {
        errors.add("password", REQUIRED.to_string());
    }
    if !errors.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "errors": errors
        }));
    }

    // Pre-check so the common case gets a clean 409; the UNIQUE
    // constraint still catches a racing signup below.
    if let Ok(Some(_)) = data.db.get_user_by_username(username) {
        return HttpResponse::Conflict().json(serde_json::json!({
            "error": "This username is already taken"
        }));
    }

    let password_hash = auth::hash_password(&body.password);
    let user = match data.db.create_user(username, &password_hash) {
        Ok(user) => user,
        Err(e) if crate::db::is_unique_violation(&e) => {
            return HttpResponse::Conflict().json(serde_json::json!({
                "error": "This username is already taken"
            }));
        }
        Err(e) => {
            log::error!("Failed to create user: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }));
        }
    };

    match data.db.create_session(user.id) {
        Ok(session) => HttpResponse::Found()
            .append_header((header::LOCATION, NOTES_PATH))
            .cookie(session_cookie(session.token))
            .finish(),
        Err(e) => {
            log::error!("Failed to create session: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/login", web::get().to(login_page))
            .route("/login", web::post().to(login))
            .route("/logout", web::get().to(logout_page))
            .route("/logout", web::post().to(logout))
            .route("/signup", web::get().to(signup_page))
            .route("/signup", web::post().to(signup)),
    );
}

#[cfg(test)]
mod tests {
    use actix_web::{App, cookie::Cookie, http::StatusCode, http::header, test, web};
    use std::sync::Arc;

    use crate::AppState;
    use crate::auth;
    use crate::config::Config;
    use crate::db::Database;

    fn test_state() -> web::Data<AppState> {
        web::Data::new(AppState {
            db: Arc::new(Database::new(":memory:").expect("Failed to open in-memory database")),
            config: Config {
                port: 0,
                database_url: ":memory:".to_string(),
            },
        })
    }

    #[actix_web::test]
    async fn test_signup_creates_account_and_logs_in() {
        let state = test_state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(super::config)).await;

        let req = test::TestRequest::post()
            .uri("/auth/signup")
            .set_form(&[("username", "person"), ("password", "secret")])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap().to_str().unwrap(),
            "/notes"
        );

        let set_cookie = resp
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie expected")
            .to_str()
            .unwrap();
        assert!(set_cookie.starts_with("session="));

        let user = state.db.get_user_by_username("person").unwrap();
        assert!(user.is_some());
    }

    #[actix_web::test]
    async fn test_signup_rejects_taken_username() {
        let state = test_state();
        state
            .db
            .create_user("person", &auth::hash_password("secret"))
            .unwrap();
        let app = test::init_service(App::new().app_data(state.clone()).configure(super::config)).await;

        let req = test::TestRequest::post()
            .uri("/auth/signup")
            .set_form(&[("username", "person"), ("password", "other")])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_signup_requires_username_and_password() {
        let state = test_state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(super::config)).await;

        let req = test::TestRequest::post()
            .uri("/auth/signup")
            .set_form(&[("username", ""), ("password", "")])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["errors"]["username"].is_array());
        assert!(body["errors"]["password"].is_array());
    }

    #[actix_web::test]
    async fn test_login_rejects_bad_credentials() {
        let state = test_state();
        state
            .db
            .create_user("person", &auth::hash_password("secret"))
            .unwrap();
        let app = test::init_service(App::new().app_data(state.clone()).configure(super::config)).await;

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_form(&[("username", "person"), ("password", "wrong")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_form(&[("username", "nobody"), ("password", "secret")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_login_redirects_to_next() {
        let state = test_state();
        state
            .db
            .create_user("person", &auth::hash_password("secret"))
            .unwrap();
        let app = test::init_service(App::new().app_data(state.clone()).configure(super::config)).await;

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_form(&[
                ("username", "person"),
                ("password", "secret"),
                ("next", "/notes/add"),
            ])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap().to_str().unwrap(),
            "/notes/add"
        );
    }

    #[actix_web::test]
    async fn test_login_ignores_external_next() {
        let state = test_state();
        state
            .db
            .create_user("person", &auth::hash_password("secret"))
            .unwrap();
        let app = test::init_service(App::new().app_data(state.clone()).configure(super::config)).await;

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_form(&[
                ("username", "person"),
                ("password", "secret"),
                ("next", "https://evil.example"),
            ])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap().to_str().unwrap(),
            "/notes"
        );
    }

    #[actix_web::test]
    async fn test_logout_invalidates_session() {
        let state = test_state();
        let user = state
            .db
            .create_user("person", &auth::hash_password("secret"))
            .unwrap();
        let session = state.db.create_session(user.id).unwrap();
        let app = test::init_service(App::new().app_data(state.clone()).configure(super::config)).await;

        let req = test::TestRequest::post()
            .uri("/auth/logout")
            .cookie(Cookie::new(auth::SESSION_COOKIE, session.token.clone()))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(state.db.validate_session(&session.token).unwrap().is_none());
    }
}
