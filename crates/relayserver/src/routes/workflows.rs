use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;

use super::{caller, PageQuery};
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for workflow execution
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    #[serde(default)]
    template_id: String,
    #[serde(default)]
    variables: Map<String, Value>,
}

#[get("/api/workflows/templates")]
pub async fn list_templates(data: web::Data<AppState>) -> impl Responder {
    let templates = data.runtime.runner().templates().await;
    HttpResponse::Ok().json(json!({
        "count": templates.len(),
        "templates": templates,
    }))
}

#[get("/api/workflows/templates/{id}")]
pub async fn get_template(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let template = data
        .runtime
        .runner()
        .template(&path)
        .await
        .ok_or_else(|| ApiError::NotFound("Workflow template not found".to_string()))?;
    Ok(HttpResponse::Ok().json(template))
}

#[post("/api/workflows/execute")]
pub async fn execute_workflow(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<ExecuteRequest>,
) -> Result<HttpResponse, ApiError> {
    let ExecuteRequest {
        template_id,
        variables,
    } = body.into_inner();
    if template_id.trim().is_empty() {
        return Err(ApiError::BadRequest("Template ID is required".to_string()));
    }
    let user_id = caller(&req);

    info!("Executing workflow template {} for {}", template_id, user_id);
    let execution_id = data
        .runtime
        .runner()
        .start(&template_id, variables, &user_id)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "executionId": execution_id,
        "status": "started",
        "message": "Workflow execution started successfully",
    })))
}

#[get("/api/workflows/execution/{id}")]
pub async fn get_execution(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let runner = data.runtime.runner();
    let execution = runner
        .get_execution(&path)
        .await
        .ok_or_else(|| ApiError::NotFound("Workflow execution not found".to_string()))?;

    let total_steps = runner
        .template(&execution.template_id)
        .await
        .map(|t| t.steps.len())
        .unwrap_or(1)
        .max(1);

    let mut body = serde_json::to_value(&execution)?;
    if let Some(fields) = body.as_object_mut() {
        fields.insert("progress".to_string(), json!(execution.progress(total_steps)));
        fields.insert("totalSteps".to_string(), json!(total_steps));
        fields.insert("completedSteps".to_string(), json!(execution.results.len()));
    }
    Ok(HttpResponse::Ok().json(body))
}

/// Newest first.
#[get("/api/workflows/executions/user/{user_id}")]
pub async fn user_executions(
    data: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    let executions = data.runtime.runner().executions_by_user(&path).await;
    HttpResponse::Ok().json(query.apply(executions))
}
