//! Config file reading.
//!
//! Readers return `None` and log for the expected failure modes (missing
//! file, malformed JSON, failed required-shape check); they never throw for
//! those. Treating a `None` as fatal is the caller's choice. Sample-file
//! resolution is a separate, fallible step so each entry point can pick its
//! own policy for unresolvable samples.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};
use tsmith_model::{ClientConfig, WebhookConfig};

/// A successfully read config file of either shape.
#[derive(Debug, Clone)]
pub enum ConfigFile {
    Client(ClientConfig),
    Webhooks(WebhookConfig),
}

/// Reads a config file, detecting its shape from the present keys:
/// `webhooks[]` marks a webhook config, `baseUrl` + `endpoints[]` a client
/// config.
pub fn read_config(path: &Path) -> Option<ConfigFile> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            warn!(target: "config", path = %path.display(), %err, "cannot read config file");
            return None;
        }
    };

    let value: Value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(err) => {
            warn!(target: "config", path = %path.display(), %err, "config is not valid JSON");
            return None;
        }
    };

    if value.get("webhooks").is_some_and(Value::is_array) {
        return match serde_json::from_value::<WebhookConfig>(value) {
            Ok(config) => {
                debug!(target: "config", path = %path.display(), webhooks = config.webhooks.len(), "read webhook config");
                Some(ConfigFile::Webhooks(config))
            }
            Err(err) => {
                warn!(target: "config", path = %path.display(), %err, "invalid webhook config");
                None
            }
        };
    }

    if value.get("baseUrl").is_some() && value.get("endpoints").is_some_and(Value::is_array) {
        return match serde_json::from_value::<ClientConfig>(value) {
            Ok(config) => {
                debug!(target: "config", path = %path.display(), endpoints = config.endpoints.len(), "read client config");
                Some(ConfigFile::Client(config))
            }
            Err(err) => {
                warn!(target: "config", path = %path.display(), %err, "invalid client config");
                None
            }
        };
    }

    warn!(
        target: "config",
        path = %path.display(),
        "config is missing required fields (baseUrl + endpoints[], or webhooks[])"
    );
    None
}

/// Resolves `responseSampleFile` references into inline samples, reading each
/// file relative to the config's directory.
///
/// Unlike [`read_config`], an unresolvable sample is an error: callers decide
/// whether to skip the config (batch drivers) or abort (fail-fast drivers).
pub fn resolve_samples(
    config: &mut ClientConfig,
    config_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    for endpoint in &mut config.endpoints {
        if endpoint.response_sample.is_some() {
            continue;
        }
        let Some(file) = &endpoint.response_sample_file else {
            continue;
        };

        let sample_path = config_dir.join(file);
        let text = std::fs::read_to_string(&sample_path).map_err(|err| {
            format!(
                "endpoint {}: cannot read sample file {}: {err}",
                endpoint.name,
                sample_path.display()
            )
        })?;
        let value: Value = serde_json::from_str(&text).map_err(|err| {
            format!(
                "endpoint {}: sample file {} is not valid JSON: {err}",
                endpoint.name,
                sample_path.display()
            )
        })?;
        endpoint.response_sample = Some(value);
    }
    Ok(())
}
