//! Configuration file types for endpoint clients and webhooks.
//!
//! Config files are JSON; field names follow the camelCase convention of the
//! generated TypeScript, so every type here renames via serde.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Authentication scheme for a generated client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthScheme {
    /// API key from `<BASENAME>_APIKEY` with a literal fallback.
    ApiKey,
    /// Basic auth from `<BASENAME>_USERNAME` / `<BASENAME>_PASSWORD`.
    Basic,
    /// No authentication; the auth helper returns an empty header object.
    #[default]
    None,
}

/// Retry behavior for generated request wrappers.
///
/// Every field is independently overridable in config; defaults apply
/// per-field, not all-or-nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryPolicy {
    pub enabled: bool,
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub multiplier: f64,
    pub retry_statuses: Vec<u16>,
    pub method: String,
    pub idempotent_methods: Vec<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            max_attempts: 3,
            initial_delay_ms: 250,
            multiplier: 2.0,
            retry_statuses: vec![429, 502, 503, 504],
            method: "GET".to_string(),
            idempotent_methods: ["GET", "HEAD", "PUT", "DELETE", "OPTIONS"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl RetryPolicy {
    /// Returns an enabled policy with default tuning.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Returns this policy re-targeted at the given HTTP method.
    pub fn for_method(&self, method: &str) -> Self {
        Self {
            method: method.to_uppercase(),
            ..self.clone()
        }
    }

    /// Returns true if the policy's method is in the idempotent set.
    pub fn is_idempotent(&self) -> bool {
        let upper = self.method.to_uppercase();
        self.idempotent_methods.iter().any(|m| m.eq_ignore_ascii_case(&upper))
    }

    /// Returns true if the given status code warrants a retry.
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    /// Backoff delay before the retry numbered `attempt_num` (1-based).
    ///
    /// `floor(initial_delay_ms * multiplier^(attempt_num - 1))`, so the first
    /// retry waits exactly `initial_delay_ms`.
    pub fn backoff_delay_ms(&self, attempt_num: u32) -> u64 {
        let exponent = attempt_num.saturating_sub(1);
        (self.initial_delay_ms as f64 * self.multiplier.powi(exponent as i32)).floor() as u64
    }
}

/// One endpoint of a client config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// The endpoint name (e.g. `GetUser`); drives all generated identifiers.
    pub name: String,
    /// HTTP method; defaults to GET.
    #[serde(default = "default_method")]
    pub method: String,
    /// Request path, may contain `{param}` segments.
    pub path: String,
    /// Inline JSON sample of the response body, used for type inference.
    #[serde(default)]
    pub response_sample: Option<Value>,
    /// Path to a sibling file holding the response sample, relative to the config.
    #[serde(default)]
    pub response_sample_file: Option<String>,
    /// Per-endpoint retry override; falls back to the config-level policy.
    #[serde(default)]
    pub retry: Option<RetryPolicy>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl Endpoint {
    /// Resolves the effective retry policy against a config-level default,
    /// re-targeted at this endpoint's method.
    pub fn effective_retry(&self, config_default: Option<&RetryPolicy>) -> Option<RetryPolicy> {
        self.retry
            .as_ref()
            .or(config_default)
            .map(|p| p.for_method(&self.method))
    }
}

/// An endpoint-client config file: `{ baseUrl, endpoints: [...] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthScheme,
    #[serde(default)]
    pub retry: Option<RetryPolicy>,
    pub endpoints: Vec<Endpoint>,
}

impl ClientConfig {
    /// Looks up an endpoint by name.
    pub fn get_endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    /// Returns the endpoints that have retry enabled after override resolution.
    pub fn retry_endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints
            .iter()
            .filter(|e| e.effective_retry(self.retry.as_ref()).is_some_and(|p| p.enabled))
    }
}

/// One webhook of a webhook config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    /// The webhook name (e.g. `OrderShipped`); drives handler identifiers.
    pub name: String,
    /// Route path the handler is mounted on.
    pub path: String,
    /// HTTP method; webhooks default to POST.
    #[serde(default = "default_webhook_method")]
    pub method: String,
    /// Inline JSON sample of the delivery payload, used for type inference.
    #[serde(default)]
    pub sample: Option<Value>,
}

fn default_webhook_method() -> String {
    "POST".to_string()
}

/// A webhook config file: `{ webhooks: [...] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    pub webhooks: Vec<Webhook>,
}
