use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::{
    auth::AuthenticatedUser,
    error::{AppError, AppResult},
    state::AppState,
};

pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod departments;
pub mod documents;
pub mod faqs;
pub mod health;
pub mod logs;
pub mod navigation;
pub mod profile;

/// Room for multipart framing and the non-file form fields on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Every delete must carry `?confirm=true`.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteConfirmation {
    #[serde(default)]
    pub confirm: bool,
}

impl DeleteConfirmation {
    pub fn require(&self) -> AppResult<()> {
        if self.confirm {
            Ok(())
        } else {
            Err(AppError::bad_request(
                "deletion must be confirmed with confirm=true",
            ))
        }
    }
}

fn cors_layer(allowed: Option<&String>) -> CorsLayer {
    let allow_origin = match allowed {
        Some(origins) => {
            let headers: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .filter_map(|value| match value.parse::<HeaderValue>() {
                    Ok(header) => Some(header),
                    Err(_) => {
                        warn!(origin = %value, "ignoring invalid CORS allowed origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(headers)
        }
        None => AllowOrigin::mirror_request(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn create_router(state: AppState) -> Router<()> {
    let cors = cors_layer(state.config.cors_allowed_origin.as_ref());
    let body_limit = state.config.upload_max_bytes + MULTIPART_OVERHEAD_BYTES;

    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    let documents_routes = Router::new()
        .route(
            "/",
            get(documents::list_documents).post(documents::upload_document),
        )
        .route("/:id", delete(documents::delete_document))
        .route("/:id/approve", post(documents::approve_document))
        .route("/:id/reject", post(documents::reject_document))
        .route("/:id/download", get(documents::download_document));

    let faqs_routes = Router::new()
        .route("/", get(faqs::list_faqs).post(faqs::create_faq))
        .route("/:id", patch(faqs::update_faq).delete(faqs::delete_faq));

    let suggestions_routes = Router::new()
        .route("/", get(faqs::list_suggestions))
        .route("/:id/approve", post(faqs::approve_suggestion))
        .route("/:id/reject", post(faqs::reject_suggestion));

    let departments_routes = Router::new()
        .route(
            "/",
            get(departments::list_departments).post(departments::create_department),
        )
        .route("/tree", get(departments::org_chart))
        .route(
            "/invitations",
            get(departments::list_invitations).post(departments::invite_user),
        )
        .route(
            "/:id",
            patch(departments::update_department)
                .delete(departments::delete_department),
        );

    let logs_routes = Router::new()
        .route("/", get(logs::list_logs))
        .route("/export", get(logs::export_logs))
        .route("/activity", get(logs::list_activity))
        .route("/errors", get(logs::list_errors));

    let chat_routes = Router::new()
        .route("/sessions", post(chat::open_console))
        .route(
            "/sessions/:id",
            get(chat::get_console)
                .patch(chat::set_console_mode)
                .delete(chat::close_console),
        )
        .route("/sessions/:id/messages", post(chat::submit_message))
        .route("/sessions/:id/reset", post(chat::reset_console));

    let protected_state = state.clone();
    let error_feed_state = state.clone();
    let protected_routes = Router::new()
        .route("/api/navigation", get(navigation::menu))
        .route(
            "/api/profile",
            get(profile::get_profile).patch(profile::update_profile),
        )
        .route("/api/dashboard", get(dashboard::overview))
        .nest("/api/documents", documents_routes)
        .nest("/api/faqs", faqs_routes)
        .nest("/api/faq-suggestions", suggestions_routes)
        .nest("/api/departments", departments_routes)
        .nest("/api/logs", logs_routes)
        .nest("/api/chat", chat_routes)
        .layer(middleware::from_extractor_with_state::<AuthenticatedUser, _>(protected_state));

    Router::new()
        .merge(protected_routes)
        .nest("/api/auth", auth_routes)
        .route("/api/health", get(health::health_check))
        .route("/", get(navigation::root_redirect))
        .with_state(state)
        .layer(middleware::from_fn_with_state(
            error_feed_state,
            logs::record_internal_errors,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(body_limit))
}
