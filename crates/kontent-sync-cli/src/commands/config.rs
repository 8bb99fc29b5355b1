//! Config command - View and validate ksync configuration
//!
//! Provides the `ksync config` CLI command which:
//! 1. Shows the current configuration (YAML or JSON) with API keys masked
//! 2. Validates the configuration file and reports every error
//! 3. Prints the path of the configuration file in use

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Subcommand;
use kontent_sync_core::config::Config;
use tracing::info;

use super::{exit_code, CommandContext};
use crate::output::get_formatter;

const MASKED_KEY: &str = "********";

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Validate configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<ExitCode> {
        match self {
            ConfigCommand::Show => self.execute_show(ctx),
            ConfigCommand::Validate => self.execute_validate(ctx),
            ConfigCommand::Path => self.execute_path(ctx),
        }
    }

    fn execute_show(&self, ctx: &CommandContext) -> Result<ExitCode> {
        let formatter = get_formatter(ctx.format);
        let config_path = &ctx.config_path;
        let config = redacted(Config::load_or_default(config_path));

        info!(config_path = %config_path.display(), "Showing configuration");

        if ctx.format.is_json() {
            let json = serde_json::to_value(&config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", config_path.display()));
            formatter.info("");

            let yaml = serde_yaml::to_string(&config)
                .context("Failed to serialize configuration to YAML")?;

            for line in yaml.lines() {
                formatter.info(line);
            }
        }

        Ok(ExitCode::SUCCESS)
    }

    fn execute_validate(&self, ctx: &CommandContext) -> Result<ExitCode> {
        let formatter = get_formatter(ctx.format);
        let config_path = &ctx.config_path;

        info!(config_path = %config_path.display(), "Validating configuration");

        let errors = validation_errors(config_path);

        if ctx.format.is_json() {
            let json = serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": config_path.display().to_string(),
                "errors": errors,
            });
            formatter.print_json(&json);
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", config_path.display()));
        } else {
            formatter.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ));
            formatter.info(&format!("File: {}", config_path.display()));
            formatter.info("");
            for error in &errors {
                formatter.info(&format!("  {error}"));
            }
        }

        Ok(exit_code(errors.is_empty()))
    }

    fn execute_path(&self, ctx: &CommandContext) -> Result<ExitCode> {
        let formatter = get_formatter(ctx.format);
        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "config_path": ctx.config_path.display().to_string(),
                "exists": ctx.config_path.exists(),
            }));
        } else {
            println!("{}", ctx.config_path.display());
        }
        Ok(ExitCode::SUCCESS)
    }
}

/// Loads the file at `path` and returns every problem found, as display lines
fn validation_errors(path: &Path) -> Vec<String> {
    if !path.exists() {
        return vec![format!("Configuration file not found: {}", path.display())];
    }
    let config = match Config::load(path) {
        Ok(config) => config,
        Err(e) => return vec![format!("Failed to parse configuration: {e}")],
    };

    let mut errors: Vec<String> = config.validate().iter().map(ToString::to_string).collect();
    if config.clients.is_empty() {
        errors.push("clients: at least one client must be configured".to_string());
    }
    errors
}

/// Replaces every API key with a fixed mask
fn redacted(mut config: Config) -> Config {
    for options in config.clients.values_mut() {
        if options.api_key.is_some() {
            options.api_key = Some(MASKED_KEY.to_string());
        }
    }
    config
}
