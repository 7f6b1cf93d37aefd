use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use relaycore::{AgentDefinition, Execution, RunStatus, WorkflowExecution};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::caller;
use crate::state::AppState;

/// Estimated manual effort replaced by one successful run.
const MINUTES_PER_RUN: u64 = 30;
const DOLLARS_PER_RUN: u64 = 50;
const POPULAR_AGENTS: usize = 5;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    timeframe: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Overview {
    total_executions: usize,
    successful_executions: usize,
    failed_executions: usize,
    /// Whole percent, 0 without runs.
    success_rate: u64,
    time_saved_hours: u64,
    cost_savings: u64,
    active_agents: usize,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct AgentUsage {
    agent_id: String,
    name: String,
    executions: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Dashboard {
    overview: Overview,
    popular_agents: Vec<AgentUsage>,
    timeframe: String,
}

impl Dashboard {
    fn build(
        agent_runs: &[Execution],
        workflow_runs: &[WorkflowExecution],
        agents: &[AgentDefinition],
        timeframe: String,
    ) -> Self {
        let statuses = agent_runs
            .iter()
            .map(|e| e.status)
            .chain(workflow_runs.iter().map(|e| e.status));
        let (mut total, mut successful, mut failed) = (0, 0, 0);
        for status in statuses {
            total += 1;
            match status {
                RunStatus::Completed => successful += 1,
                RunStatus::Failed => failed += 1,
                _ => {}
            }
        }

        let success_rate = if total == 0 {
            0
        } else {
            ((successful as f64 / total as f64) * 100.0).round() as u64
        };
        let minutes = successful as u64 * MINUTES_PER_RUN;

        let mut usage: HashMap<&str, usize> = HashMap::new();
        for run in agent_runs {
            *usage.entry(run.agent_id.as_str()).or_default() += 1;
        }
        let mut popular: Vec<AgentUsage> = usage
            .into_iter()
            .map(|(agent_id, executions)| AgentUsage {
                agent_id: agent_id.to_string(),
                name: agents
                    .iter()
                    .find(|a| a.id == agent_id)
                    .map_or_else(|| agent_id.to_string(), |a| a.name.clone()),
                executions,
            })
            .collect();
        popular.sort_by(|a, b| {
            b.executions
                .cmp(&a.executions)
                .then_with(|| a.agent_id.cmp(&b.agent_id))
        });
        popular.truncate(POPULAR_AGENTS);

        Self {
            overview: Overview {
                total_executions: total,
                successful_executions: successful,
                failed_executions: failed,
                success_rate,
                time_saved_hours: (minutes as f64 / 60.0).round() as u64,
                cost_savings: successful as u64 * DOLLARS_PER_RUN,
                active_agents: agents.len(),
            },
            popular_agents: popular,
            timeframe,
        }
    }
}

/// Usage statistics for the caller across agent and workflow runs
#[get("/api/analytics/dashboard")]
pub async fn dashboard(
    req: HttpRequest,
    data: web::Data<AppState>,
    query: web::Query<DashboardQuery>,
) -> impl Responder {
    let user_id = caller(&req);
    let runtime = &data.runtime;
    let agent_runs = runtime.coordinator().executions_by_user(&user_id).await;
    let workflow_runs = runtime.runner().executions_by_user(&user_id).await;

    let timeframe = query.into_inner().timeframe.unwrap_or_else(|| "30d".to_string());
    HttpResponse::Ok().json(Dashboard::build(
        &agent_runs,
        &workflow_runs,
        runtime.coordinator().agents(),
        timeframe,
    ))
}
