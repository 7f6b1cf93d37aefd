use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use relaycore::Credentials;
use relayruntime::sample_input;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::{caller, PageQuery};
use crate::error::ApiError;
use crate::state::AppState;

const TEST_USER: &str = "test-user";

/// Request body for agent execution
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    #[serde(default)]
    input: Value,
    #[serde(default)]
    api_keys: Credentials,
}

/// Response for a run started in the background
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartedResponse {
    execution_id: String,
    status: &'static str,
    message: String,
}

#[get("/api/agents")]
pub async fn list_agents(data: web::Data<AppState>) -> impl Responder {
    let agents = data.runtime.coordinator().agents();
    HttpResponse::Ok().json(json!({
        "agents": agents,
        "count": agents.len(),
    }))
}

#[get("/api/agents/{id}")]
pub async fn get_agent(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let agent = data
        .runtime
        .coordinator()
        .agent(&path)
        .ok_or_else(|| ApiError::NotFound("Agent not found".to_string()))?;
    Ok(HttpResponse::Ok().json(agent))
}

/// Start an agent run. Returns as soon as the run is registered.
#[post("/api/agents/{id}/execute")]
pub async fn execute_agent(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ExecuteRequest>,
) -> Result<HttpResponse, ApiError> {
    let agent_id = path.into_inner();
    let ExecuteRequest { input, api_keys } = body.into_inner();
    if input.is_null() {
        return Err(ApiError::BadRequest("Input is required".to_string()));
    }
    let user_id = caller(&req);

    info!("Executing agent {} for {}", agent_id, user_id);
    let execution_id = data
        .runtime
        .coordinator()
        .start(&agent_id, &user_id, input, api_keys)
        .await?;

    Ok(HttpResponse::Ok().json(StartedResponse {
        execution_id,
        status: "started",
        message: "Agent execution started successfully".to_string(),
    }))
}

/// Start an agent run with canned input and no credentials.
#[post("/api/agents/{id}/test")]
pub async fn test_agent(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let agent_id = path.into_inner();
    let input = sample_input(&agent_id);

    let execution_id = data
        .runtime
        .coordinator()
        .start(&agent_id, TEST_USER, input.clone(), Credentials::new())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "executionId": execution_id,
        "status": "started",
        "message": "Agent test execution started",
        "testInput": input,
    })))
}

#[get("/api/agents/execution/{id}")]
pub async fn get_execution(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let execution = data
        .runtime
        .coordinator()
        .get_execution(&path)
        .await
        .ok_or_else(|| ApiError::NotFound("Execution not found".to_string()))?;

    let mut body = serde_json::to_value(&execution)?;
    if let Some(fields) = body.as_object_mut() {
        fields.insert("progress".to_string(), json!(execution.progress()));
        fields.insert(
            "currentStep".to_string(),
            json!(execution.current_step_description()),
        );
    }
    Ok(HttpResponse::Ok().json(body))
}

/// Newest first.
#[get("/api/agents/executions/user/{user_id}")]
pub async fn user_executions(
    data: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    let executions = data.runtime.coordinator().executions_by_user(&path).await;
    HttpResponse::Ok().json(query.apply(executions))
}
