use actix_web::{get, post, web, HttpResponse, Responder};
use relaycore::{Credentials, IntegrationCategory};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRequest {
    #[serde(default)]
    api_keys: Credentials,
    test_data: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateKeysRequest {
    integration_id: Option<String>,
    api_keys: Option<Credentials>,
}

#[get("/api/integrations")]
pub async fn list_integrations(data: web::Data<AppState>) -> impl Responder {
    let integrations = data.runtime.integrations().list();
    HttpResponse::Ok().json(json!({
        "count": integrations.len(),
        "integrations": integrations,
    }))
}

#[get("/api/integrations/{id}")]
pub async fn get_integration(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let config = data
        .runtime
        .integrations()
        .resolve(&path)
        .ok_or_else(|| ApiError::NotFound("Integration not found".to_string()))?;
    Ok(HttpResponse::Ok().json(config))
}

/// Unknown categories yield an empty list.
#[get("/api/integrations/categories/{category}")]
pub async fn by_category(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let category = path.into_inner();
    let integrations = category
        .parse::<IntegrationCategory>()
        .map(|c| data.runtime.integrations().by_category(c))
        .unwrap_or_default();

    HttpResponse::Ok().json(json!({
        "category": category,
        "count": integrations.len(),
        "integrations": integrations,
    }))
}

/// Dispatch a canned deliverable through one adapter with the caller's keys.
#[post("/api/integrations/{id}/test")]
pub async fn test_integration(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: Option<web::Json<TestRequest>>,
) -> Result<HttpResponse, ApiError> {
    let registry = data.runtime.integrations();
    let config = registry
        .resolve(&path)
        .ok_or_else(|| ApiError::NotFound("Integration not found".to_string()))?;

    let TestRequest {
        api_keys,
        test_data,
    } = body.map(web::Json::into_inner).unwrap_or_default();
    let deliverable =
        test_data.unwrap_or_else(|| format!("Test data for {} integration", config.name));
    let input = json!({ "result": { "deliverable": deliverable } });

    let result = registry.dispatch(&config.id, &input, &api_keys).await;
    Ok(HttpResponse::Ok().json(result))
}

#[post("/api/integrations/validate-keys")]
pub async fn validate_keys(
    data: web::Data<AppState>,
    body: web::Json<ValidateKeysRequest>,
) -> Result<HttpResponse, ApiError> {
    let ValidateKeysRequest {
        integration_id,
        api_keys,
    } = body.into_inner();
    let (Some(integration_id), Some(api_keys)) = (integration_id, api_keys) else {
        return Err(ApiError::BadRequest(
            "Integration ID and API keys are required".to_string(),
        ));
    };

    let config = data
        .runtime
        .integrations()
        .resolve(&integration_id)
        .ok_or_else(|| ApiError::NotFound("Integration not found".to_string()))?;

    let missing = config.missing_keys(&api_keys);
    if !missing.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "Missing required API keys",
            "missingKeys": missing,
            "requiredKeys": config.required_keys,
        })));
    }

    let mut provided: Vec<&String> = api_keys.keys().collect();
    provided.sort();
    Ok(HttpResponse::Ok().json(json!({
        "valid": true,
        "integration": config.name,
        "providedKeys": provided,
        "requiredKeys": config.required_keys,
    })))
}
