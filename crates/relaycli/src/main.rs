use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use relaycore::{Credentials, ExecutionEvent, RunStatus, StepEvent};
use relaynodes::{standard_runtime, GenerationConfig};
use relayruntime::{sample_input, RelayRuntime, RuntimeConfig};
use serde_json::{json, Map, Value};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "Agent relay CLI", long_about = None)]
struct Cli {
    /// Skip artificial step and integration delays
    #[arg(long, global = true)]
    immediate: bool,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in agents
    Agents,

    /// List the built-in workflow templates
    Templates,

    /// List the supported integrations
    Integrations,

    /// Run an agent to completion
    Run {
        agent: String,

        /// Input as a JSON string. Defaults to the agent's sample input.
        #[arg(short, long)]
        input: Option<String>,

        /// Integration credential, repeatable
        #[arg(short, long = "key", value_name = "NAME=VALUE", value_parser = parse_pair)]
        keys: Vec<(String, String)>,
    },

    /// Run a workflow template to completion
    Workflow {
        template: String,

        /// Template variable, repeatable. Values are parsed as JSON when possible.
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_pair)]
        vars: Vec<(String, String)>,
    },

    /// Dispatch a test deliverable through one integration
    TestIntegration {
        id: String,

        #[arg(short, long = "key", value_name = "NAME=VALUE", value_parser = parse_pair)]
        keys: Vec<(String, String)>,

        /// Deliverable text
        #[arg(short, long)]
        data: Option<String>,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {:?}", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty name in {:?}", raw));
    }
    Ok((name.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    let config = if cli.immediate {
        RuntimeConfig::immediate()
    } else {
        RuntimeConfig::from_env()
    };
    let runtime = standard_runtime(&config, GenerationConfig::from_env()).await?;

    match cli.command {
        Commands::Agents => list_agents(&runtime),
        Commands::Templates => list_templates(&runtime).await,
        Commands::Integrations => list_integrations(&runtime),
        Commands::Run { agent, input, keys } => {
            run_agent(&runtime, &agent, input, keys.into_iter().collect()).await?
        }
        Commands::Workflow { template, vars } => run_workflow(&runtime, &template, vars).await?,
        Commands::TestIntegration { id, keys, data } => {
            test_integration(&runtime, &id, keys.into_iter().collect(), data).await?
        }
    }

    Ok(())
}

fn list_agents(runtime: &RelayRuntime) {
    println!("🤖 Agents:");
    println!();
    for agent in runtime.coordinator().agents() {
        println!("  • {} ({})", agent.id, agent.name);
        println!("    {}", agent.description);
        println!("    integrations: {}", agent.integrations.join(", "));
    }
}

async fn list_templates(runtime: &RelayRuntime) {
    println!("📋 Workflow templates:");
    println!();
    for template in runtime.runner().templates().await {
        println!("  • {} ({} steps)", template.id, template.steps.len());
        println!("    {}", template.description);
        let mut variables: Vec<&String> = template.variables.keys().collect();
        variables.sort();
        if !variables.is_empty() {
            let names: Vec<&str> = variables.iter().map(|s| s.as_str()).collect();
            println!("    variables: {}", names.join(", "));
        }
    }
}

fn list_integrations(runtime: &RelayRuntime) {
    println!("🔌 Integrations:");
    println!();
    for config in runtime.integrations().list() {
        println!(
            "  • {} ({}) requires: {}",
            config.id,
            config.name,
            config.required_keys.join(", ")
        );
    }
}

/// Print run events until the returned task is aborted.
fn print_events(runtime: &RelayRuntime) -> JoinHandle<()> {
    let mut events = runtime.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ExecutionEvent::RunStarted { execution_id, .. } => {
                    println!("▶️  Run {} started", execution_id);
                }
                ExecutionEvent::StepStarted {
                    step_id, step_type, ..
                } => {
                    println!("  ⚡ Starting step: {} ({})", step_id, step_type);
                }
                ExecutionEvent::StepCompleted {
                    step_id,
                    duration_ms,
                    ..
                } => {
                    println!("  ✅ Step {} completed in {}ms", step_id, duration_ms);
                }
                ExecutionEvent::StepFailed { step_id, error, .. } => {
                    println!("  ❌ Step {} failed: {}", step_id, error);
                }
                ExecutionEvent::StepEvent { step_id, event, .. } => match event {
                    StepEvent::Info { message } => println!("     ℹ️  [{}] {}", step_id, message),
                    StepEvent::Warning { message } => println!("     ⚠️  [{}] {}", step_id, message),
                },
                ExecutionEvent::RunFinished {
                    success,
                    duration_ms,
                    ..
                } => {
                    if success {
                        println!("✨ Run completed in {}ms", duration_ms);
                    } else {
                        println!("💥 Run failed after {}ms", duration_ms);
                    }
                }
            }
        }
    })
}

async fn run_agent(
    runtime: &RelayRuntime,
    agent_id: &str,
    input: Option<String>,
    credentials: Credentials,
) -> Result<()> {
    let input = match input {
        Some(raw) => serde_json::from_str(&raw).context("Input must be valid JSON")?,
        None => sample_input(agent_id),
    };

    let event_task = print_events(runtime);
    let execution = runtime
        .coordinator()
        .execute(agent_id, "cli", input, credentials)
        .await?;

    // let the listener drain
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    event_task.abort();

    println!();
    println!("📊 Execution Summary:");
    println!("   Execution ID: {}", execution.id);
    println!("   Status: {:?}", execution.status);
    println!("   Steps: {}/{} completed", execution.completed_steps(), execution.steps.len());
    if let Some(error) = &execution.error {
        println!("   Error: {}", error);
    }
    if let Some(result) = &execution.result {
        println!();
        println!("📤 Result:");
        println!("{}", serde_json::to_string_pretty(result)?);
    }

    if execution.status == RunStatus::Failed {
        return Err(anyhow!("Agent {} failed", agent_id));
    }
    Ok(())
}

async fn run_workflow(
    runtime: &RelayRuntime,
    template_id: &str,
    vars: Vec<(String, String)>,
) -> Result<()> {
    let template = runtime
        .runner()
        .template(template_id)
        .await
        .ok_or_else(|| anyhow!("Workflow template {} not found", template_id))?;

    let variables: Map<String, Value> = vars
        .into_iter()
        .map(|(name, raw)| {
            let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
            (name, value)
        })
        .collect();

    let event_task = print_events(runtime);
    let execution = runtime.runner().execute(&template, variables, "cli").await;

    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    event_task.abort();

    println!();
    println!("📊 Execution Summary:");
    println!("   Execution ID: {}", execution.id);
    println!("   Status: {:?}", execution.status);
    println!("   Completed: {}/{} steps", execution.results.len(), template.steps.len());

    if !execution.results.is_empty() {
        println!();
        println!("📤 Outputs:");
        for (step_id, output) in &execution.results {
            println!("   {}: {}", step_id, output);
        }
    }

    match execution.error {
        Some(error) => Err(anyhow!("Workflow {} failed: {}", template_id, error)),
        None => Ok(()),
    }
}

async fn test_integration(
    runtime: &RelayRuntime,
    id: &str,
    credentials: Credentials,
    data: Option<String>,
) -> Result<()> {
    let registry = runtime.integrations();
    let config = registry
        .resolve(id)
        .ok_or_else(|| anyhow!("Integration {} not found", id))?;

    let deliverable = data.unwrap_or_else(|| format!("Test data for {} integration", config.name));
    let result = registry
        .dispatch(id, &json!({ "result": { "deliverable": deliverable } }), &credentials)
        .await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    if !result.success {
        return Err(anyhow!("Integration {} test failed", id));
    }
    Ok(())
}
