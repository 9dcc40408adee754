//! CLI runner - executes commands

use crate::auth::{ChainedCredentials, EnvCredentials, StaticCredentials};
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::cli::server::{serve, ServerConfig};
use crate::config::Config;
use crate::dispatch::ExecutionContext;
use crate::engine::{Engine, ExecutionConfig};
use crate::error::{Error, Result, ResultExt};
use crate::params::ItemParameters;
use crate::registry;
use crate::types::JsonObject;
use serde_json::{json, Value};
use std::io::Read;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::List => self.list(),
            Commands::Execute {
                node,
                items,
                continue_on_fail,
            } => self.execute(node, items, *continue_on_fail).await,
            Commands::LoadOptions {
                node,
                method,
                params,
            } => self.load_options(node, method, params.as_deref()).await,
            Commands::Serve {
                port,
                trigger,
                webhook_url,
                register,
                params,
            } => {
                let server = ServerConfig {
                    port: *port,
                    trigger: trigger.clone(),
                    webhook_url: webhook_url.clone(),
                    register: *register,
                    params: parse_params(params.as_deref())?,
                };
                serve(server, self.load_config()?, self.load_credentials()?).await
            }
        }
    }

    /// Config file if given, defaults otherwise
    fn load_config(&self) -> Result<Config> {
        match &self.cli.config {
            Some(path) => Config::from_path(path),
            None => Ok(Config::default()),
        }
    }

    /// Credentials file first, then environment variables
    fn load_credentials(&self) -> Result<ChainedCredentials> {
        let mut chain = ChainedCredentials::new();
        if let Some(path) = &self.cli.credentials {
            chain = chain.with(StaticCredentials::from_path(path)?);
        }
        Ok(chain.with(EnvCredentials::from_env()))
    }

    fn list(&self) -> Result<()> {
        let nodes = registry::NODES
            .iter()
            .map(|info| {
                let node = registry::node(info.name)?;
                let operations: Vec<String> =
                    node.operations().iter().map(ToString::to_string).collect();
                Ok(json!({
                    "name": info.name,
                    "description": info.description,
                    "credential": info.credential,
                    "operations": operations,
                }))
            })
            .collect::<Result<Vec<Value>>>()?;

        self.output_message(&json!({
            "type": "NODES",
            "nodes": nodes,
            "triggers": registry::TRIGGERS,
        }));
        Ok(())
    }

    async fn execute(&self, node_name: &str, items: &str, continue_on_fail: bool) -> Result<()> {
        let node = registry::node(node_name)?;
        let config = self.load_config()?;
        let credentials = self.load_credentials()?;
        let params = ItemParameters::from_json(read_items(items)?)?;

        let mut execution = ExecutionConfig::from(&config.execution);
        execution.continue_on_fail |= continue_on_fail;
        let engine = Engine::new().with_config(execution);

        let ctx = ExecutionContext::new(&params, &credentials, &config);
        let output = engine.execute(node.as_ref(), &ctx).await?;

        for record in &output.records {
            self.output_message(&json!({
                "type": "RECORD",
                "record": serde_json::to_value(record)?,
            }));
        }
        self.output_message(&json!({
            "type": "STATS",
            "items": output.stats.items,
            "succeeded": output.stats.succeeded,
            "failed": output.stats.failed,
            "duration_ms": output.stats.duration_ms,
        }));
        Ok(())
    }

    async fn load_options(&self, node_name: &str, method: &str, params: Option<&str>) -> Result<()> {
        let loader = registry::options(node_name)?;
        let config = self.load_config()?;
        let credentials = self.load_credentials()?;
        let params = parse_params(params)?;

        let ctx = ExecutionContext::new(&params, &credentials, &config);
        let options = loader.load(method, &ctx).await?;

        self.output_message(&json!({
            "type": "OPTIONS",
            "node": node_name,
            "method": method,
            "options": options,
        }));
        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Read the items document from a file or stdin (`-`)
fn read_items(source: &str) -> Result<Value> {
    let content = if source == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read items from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(source).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: source.to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?
    };
    Ok(serde_json::from_str(&content)?)
}

/// Single-item parameters from inline JSON; absent means no parameters
fn parse_params(inline: Option<&str>) -> Result<ItemParameters> {
    match inline {
        Some(json) => ItemParameters::from_json(serde_json::from_str(json)?),
        None => Ok(ItemParameters::single(JsonObject::new())),
    }
}
