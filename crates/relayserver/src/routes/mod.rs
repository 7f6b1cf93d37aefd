use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

mod agents;
mod analytics;
mod events;
mod integrations;
mod workflows;

const USER_HEADER: &str = "x-user-id";
const ANONYMOUS: &str = "anonymous";
const DEFAULT_PAGE_SIZE: usize = 50;

/// Mount every route. Malformed JSON bodies become 400 `{error}` responses.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::BadRequest(format!("Invalid request body: {}", err)).into()
    }))
    .service(health_check)
    .service(system_status)
    .service(agents::list_agents)
    .service(agents::get_agent)
    .service(agents::execute_agent)
    .service(agents::test_agent)
    .service(agents::get_execution)
    .service(agents::user_executions)
    .service(workflows::list_templates)
    .service(workflows::get_template)
    .service(workflows::execute_workflow)
    .service(workflows::get_execution)
    .service(workflows::user_executions)
    .service(integrations::list_integrations)
    .service(integrations::by_category)
    .service(integrations::validate_keys)
    .service(integrations::get_integration)
    .service(integrations::test_integration)
    .service(analytics::dashboard)
    .service(events::websocket_events);
}

/// Caller identity, `anonymous` without the header.
fn caller(req: &HttpRequest) -> String {
    req.headers()
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(ANONYMOUS)
        .to_string()
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageQuery {
    limit: Option<usize>,
    offset: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Pagination {
    total: usize,
    limit: usize,
    offset: usize,
    has_more: bool,
}

impl PageQuery {
    fn apply<T: Serialize>(&self, items: Vec<T>) -> serde_json::Value {
        let total = items.len();
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0);
        let page: Vec<T> = items.into_iter().skip(offset).take(limit).collect();

        json!({
            "executions": page,
            "pagination": Pagination {
                total,
                limit,
                offset,
                has_more: offset.saturating_add(limit) < total,
            },
        })
    }
}

/// Health check endpoint
#[get("/health")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "relayserver",
        "timestamp": chrono::Utc::now(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[get("/api/status")]
async fn system_status(data: web::Data<AppState>) -> impl Responder {
    let runtime = &data.runtime;
    HttpResponse::Ok().json(json!({
        "status": runtime.system_status(),
        "agents": runtime.coordinator().agents().len(),
        "templates": runtime.runner().templates().await.len(),
        "integrations": runtime.integrations().list().len(),
    }))
}
