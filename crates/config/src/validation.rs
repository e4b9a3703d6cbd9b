//! Configuration validation

use crate::{ConfigError, Result, RunConfig};
use bridge_probe_types::parse_amount;
use std::collections::HashSet;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the entire run configuration, reporting every problem at once
pub fn validate_config(config: &RunConfig) -> Result<()> {
    let mut errors = Vec::new();

    // Validate network config
    if let Err(e) = validate_log_level(&config.network.log_level) {
        errors.push(e);
    }

    if config.network.metrics_enabled && config.network.metrics_port == 0 {
        errors.push(ValidationError::new(
            "network.metrics_port",
            "metrics port must be greater than 0",
        ));
    }

    // Validate chains
    if config.chains.is_empty() {
        errors.push(ValidationError::new("chains", "at least one chain is required"));
    }

    for (name, chain) in &config.chains {
        if name.is_empty() {
            errors.push(ValidationError::new("chains", "chain name cannot be empty"));
        }
        if chain.decimals > 77 {
            errors.push(ValidationError::new(
                format!("chains.{name}.decimals"),
                "must be <= 77",
            ));
        }
    }

    // Validate routes
    let route_count: usize = config.routes.values().map(Vec::len).sum();
    if route_count == 0 {
        errors.push(ValidationError::new("routes", "at least one route is required"));
    }

    for (source, destinations) in &config.routes {
        if !config.chains.contains_key(source) {
            errors.push(ValidationError::new(
                format!("routes.{source}"),
                format!("chain '{source}' not found in chains config"),
            ));
        }

        for destination in destinations {
            if destination == source {
                errors.push(ValidationError::new(
                    format!("routes.{source}"),
                    "a chain cannot route to itself",
                ));
            } else if !config.chains.contains_key(destination) {
                errors.push(ValidationError::new(
                    format!("routes.{source}"),
                    format!("chain '{destination}' not found in chains config"),
                ));
            }
        }
    }

    // Validate accounts
    if let Err(e) = validate_accounts("accounts.senders", &config.accounts.senders) {
        errors.push(e);
    }
    if let Err(e) = validate_accounts("accounts.receivers", &config.accounts.receivers) {
        errors.push(e);
    }

    // Validate transfer
    match parse_amount(&config.transfer.amount) {
        Ok(amount) if amount.is_zero() => {
            errors.push(ValidationError::new("transfer.amount", "must be greater than 0"));
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new("transfer.amount", e.to_string())),
    }

    if config.transfer.repeat == 0 {
        errors.push(ValidationError::new("transfer.repeat", "must be at least 1"));
    }

    // Validate polling budgets
    if config.polling.max_attempts == 0 {
        errors.push(ValidationError::new("polling.max_attempts", "must be at least 1"));
    }

    if config.no_activity.enabled && config.no_activity.max_attempts == 0 {
        errors.push(ValidationError::new(
            "no_activity.max_attempts",
            "must be at least 1",
        ));
    }

    // Validate perturbation schedule
    if let Some(perturbation) = &config.perturbation {
        if perturbation.stop_after_ms.is_some() && perturbation.stop_validators.is_empty() {
            errors.push(ValidationError::new(
                "perturbation.stop_validators",
                "validators are required when stop_after_ms is set",
            ));
        }

        if perturbation.start_after_ms.is_some() && perturbation.start_validators.is_empty() {
            errors.push(ValidationError::new(
                "perturbation.start_validators",
                "validators are required when start_after_ms is set",
            ));
        }

        for index in perturbation
            .stop_validators
            .iter()
            .chain(&perturbation.start_validators)
        {
            if *index >= config.simulation.validators {
                errors.push(ValidationError::new(
                    "perturbation",
                    format!(
                        "validator {index} out of range, simulation has {}",
                        config.simulation.validators
                    ),
                ));
            }
        }
    }

    // Validate simulation
    if config.simulation.quorum == 0 || config.simulation.quorum > config.simulation.validators {
        errors.push(ValidationError::new(
            "simulation.quorum",
            format!(
                "must be between 1 and the validator count ({})",
                config.simulation.validators
            ),
        ));
    }

    // Return all errors if any were found
    if !errors.is_empty() {
        let error_msg = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ConfigError::ValidationError(error_msg));
    }

    Ok(())
}

fn validate_accounts(field: &str, accounts: &[String]) -> std::result::Result<(), ValidationError> {
    if accounts.is_empty() {
        return Err(ValidationError::new(field, "at least one account is required"));
    }

    if accounts.iter().any(|a| a.trim().is_empty()) {
        return Err(ValidationError::new(field, "account IDs cannot be empty"));
    }

    let unique: HashSet<_> = accounts.iter().collect();
    if unique.len() != accounts.len() {
        return Err(ValidationError::new(field, "duplicate account IDs found"));
    }

    Ok(())
}

/// Validate log level
fn validate_log_level(level: &str) -> std::result::Result<(), ValidationError> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new(
            "network.log_level",
            format!(
                "invalid log level '{level}', must be one of: trace, debug, info, warn, error"
            ),
        )),
    }
}
