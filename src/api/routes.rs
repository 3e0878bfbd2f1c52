//! Shared state and router construction.
use axum::{
    extract::{DefaultBodyLimit, State},
    http::Request,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers::{executions, pages, results, templates, uploads};
use crate::config::Config;
use crate::error::AppError;
use crate::supabase::client::SupabaseClient;
use crate::utils::files::MAX_FILE_SIZE;
use crate::webhook::client::WebhookClient;

pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// Room for the largest accepted file plus form overhead; bigger bodies are
/// refused before the handler runs.
const BODY_LIMIT: usize = (MAX_FILE_SIZE as usize) + 16 * 1024 * 1024;

pub struct AppState {
    pub supabase: SupabaseClient,
    pub webhook: WebhookClient,
    /// Plain client for fetching generated images.
    pub http: reqwest::Client,
    pub default_webhook_url: Option<String>,
    pub admin_password: Option<String>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        let http = reqwest::Client::new();
        AppState {
            supabase: SupabaseClient::new(config.supabase_url.clone(), config.supabase_key.clone()),
            webhook: WebhookClient::new(http.clone()),
            http,
            default_webhook_url: config.webhook_url.clone(),
            admin_password: config.admin_password.clone(),
        }
    }
}

/// Build the full application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Catalogue mutations sit behind the admin password when one is set
    let admin = Router::new()
        .route("/api/templates/upload", post(templates::upload_templates))
        .route("/api/templates/bulk-delete", delete(templates::bulk_delete))
        .route("/api/templates/prompt", patch(templates::update_prompt))
        .route("/api/templates/visibility", patch(templates::update_visibility))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/", get(pages::index_page))
        .route("/admin", get(pages::admin_page))
        .route("/api/admin/verify", post(pages::verify_admin))
        .route("/api/templates/list", get(templates::list_templates))
        .route("/api/executions/create", post(executions::create_execution))
        .route("/api/executions/:id", get(executions::get_execution))
        .route("/api/upload", post(uploads::upload_image))
        .route("/api/trigger", post(executions::trigger))
        .route("/api/results/upload", post(results::upload_results))
        .merge(admin)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Timing-safe password check. A missing password never matches.
pub(crate) fn password_matches(expected: &str, supplied: Option<&str>) -> bool {
    match supplied {
        Some(supplied) => expected.as_bytes().ct_eq(supplied.as_bytes()).into(),
        None => false,
    }
}

async fn require_admin<B>(
    State(state): State<Arc<AppState>>,
    request: Request<B>,
    next: Next<B>,
) -> Response {
    if let Some(expected) = &state.admin_password {
        let supplied = request
            .headers()
            .get(ADMIN_PASSWORD_HEADER)
            .and_then(|v| v.to_str().ok());
        if !password_matches(expected, supplied) {
            tracing::warn!("Rejected admin request to {}", request.uri().path());
            return AppError::Unauthorized("Invalid password".to_string()).into_response();
        }
    }
    next.run(request).await
}
