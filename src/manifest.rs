use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde_json::json;
use tracing::info;

use crate::error_codes::{CodedError, INVALID_OVERRIDE};
use crate::schema::{GlobalParams, GridConfig};

/// `key=value` override for a global parameter, from `--set`.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamOverride {
    Scheme(String),
    Speed(f64),
}

impl ParamOverride {
    pub fn parse(raw: &str) -> Result<Self> {
        let Some((key, value)) = raw.split_once('=') else {
            return Err(invalid_override(raw, "expected key=value"));
        };
        let value = value.trim();
        match key.trim() {
            "scheme" if !value.is_empty() => Ok(Self::Scheme(value.to_owned())),
            "scheme" => Err(invalid_override(raw, "scheme must not be empty")),
            "speed" => value
                .parse::<f64>()
                .map(Self::Speed)
                .map_err(|_| invalid_override(raw, "speed must be a number")),
            other => Err(invalid_override(
                raw,
                &format!("unknown parameter '{other}', expected scheme or speed"),
            )),
        }
    }

    pub fn apply(&self, params: &mut GlobalParams) {
        match self {
            Self::Scheme(scheme) => params.scheme = scheme.clone(),
            Self::Speed(speed) => params.speed = *speed,
        }
    }
}

fn invalid_override(raw: &str, reason: &str) -> anyhow::Error {
    anyhow!(CodedError::usage(
        INVALID_OVERRIDE,
        format!("invalid override '{raw}': {reason}"),
    )
    .with_details(json!({ "provided": raw })))
}

#[derive(Debug, Clone, Default)]
pub struct ConfigLoadOptions {
    pub overrides: Vec<ParamOverride>,
}

pub fn parse_config(contents: &str, origin: &str) -> Result<GridConfig> {
    serde_yaml::from_str(contents).map_err(|error| {
        let location = error
            .location()
            .map(|location| format!("line {}, column {}", location.line(), location.column()))
            .unwrap_or_else(|| "unknown location".to_owned());
        anyhow!(
            "failed to parse yaml in {} at {}: {}",
            origin,
            location,
            error
        )
    })
}

pub fn load_and_validate_config(path: &Path) -> Result<GridConfig> {
    load_and_validate_config_with_options(path, &ConfigLoadOptions::default())
}

pub fn load_and_validate_config_with_options(
    path: &Path,
    options: &ConfigLoadOptions,
) -> Result<GridConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = parse_config(&contents, &path.display().to_string())?;
    finalize_config(config, options)
        .with_context(|| format!("invalid config {}", path.display()))
}

/// Apply overrides to an in-memory configuration and validate it.
pub fn finalize_config(mut config: GridConfig, options: &ConfigLoadOptions) -> Result<GridConfig> {
    for override_value in &options.overrides {
        override_value.apply(&mut config.params);
    }
    config.validate()?;
    info!(
        grids = config.grids.len(),
        scheme = %config.params.scheme,
        speed = config.params.speed,
        "configuration loaded"
    );
    Ok(config)
}
