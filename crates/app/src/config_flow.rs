//! Config flow — the steps that turn user input or a zeroconf announcement
//! into a [`ConfigEntry`], plus the options step.

use std::collections::BTreeMap;

use homee_bridge_domain::config_entry::{ConfigEntry, EntryOptions};
use homee_bridge_domain::error::BridgeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ports::Authenticator;

pub const STEP_USER: &str = "user";
pub const STEP_ZEROCONF_CONFIRM: &str = "zeroconf_confirm";
pub const STEP_OPTIONS: &str = "init";

/// Form error key for failures that are neither auth nor connectivity.
pub const ERROR_UNKNOWN: &str = "unknown";

/// Credentials typed into the setup form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInput {
    pub host: String,
    pub username: String,
    pub password: String,
}

/// What a successful validation yields for the new entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub title: String,
}

/// A `_sftp-ssh._tcp` service announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZeroconfInfo {
    /// Service instance name, `homee-<ID>._sftp-ssh._tcp.local.`.
    pub name: String,
    pub host: String,
}

/// Outcome of a flow step.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowResult {
    CreateEntry(ConfigEntry),
    ShowForm {
        step_id: &'static str,
        /// Field (or `base`) to error key.
        errors: BTreeMap<String, String>,
        placeholders: BTreeMap<String, String>,
    },
    Abort {
        reason: &'static str,
    },
    /// New options for an existing entry.
    UpdateOptions(EntryOptions),
}

impl FlowResult {
    fn form(step_id: &'static str) -> Self {
        Self::ShowForm {
            step_id,
            errors: BTreeMap::new(),
            placeholders: BTreeMap::new(),
        }
    }

    fn form_error(step_id: &'static str, error: &str) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert("base".to_string(), error.to_string());
        Self::ShowForm {
            step_id,
            errors,
            placeholders: BTreeMap::new(),
        }
    }
}

/// Form error key for a failed validation.
#[must_use]
pub fn form_error(err: &BridgeError) -> &'static str {
    match err {
        BridgeError::Setup(setup) => setup.form_error(),
        _ => ERROR_UNKNOWN,
    }
}

/// Check that the hub is reachable and accepts the credentials.
///
/// # Errors
///
/// Returns the authenticator's error; see [`form_error`] for how it is
/// presented.
#[tracing::instrument(skip_all, fields(host = %input.host))]
pub async fn validate_input<A: Authenticator>(
    authenticator: &A,
    input: &UserInput,
) -> Result<EntryInfo, BridgeError> {
    authenticator
        .access_token(&input.host, &input.username, &input.password)
        .await?;
    Ok(EntryInfo {
        title: format!("homee cube at {}", input.host),
    })
}

/// Homee id from a zeroconf instance name such as
/// `homee-0123456789AB._sftp-ssh._tcp.local.`.
#[must_use]
pub fn parse_zeroconf_name(name: &str) -> Option<String> {
    let id = name.split('-').nth(1)?.split('.').next()?;
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// One run of the setup flow.
#[derive(Debug)]
pub struct ConfigFlow<A> {
    authenticator: A,
    configured: Vec<String>,
    discovered: Option<(String, String)>,
}

impl<A: Authenticator> ConfigFlow<A> {
    /// Start a flow; `existing` are the entries already configured.
    #[must_use]
    pub fn new(authenticator: A, existing: &[ConfigEntry]) -> Self {
        Self {
            authenticator,
            configured: existing.iter().map(|e| e.unique_id().to_string()).collect(),
            discovered: None,
        }
    }

    /// Manual setup. Without input the empty form is shown.
    pub async fn step_user(&mut self, input: Option<UserInput>) -> FlowResult {
        let Some(input) = input else {
            return FlowResult::form(STEP_USER);
        };
        match validate_input(&self.authenticator, &input).await {
            Ok(info) => Self::create_entry(&input, info.title, None),
            Err(err) => Self::failed(STEP_USER, &err),
        }
    }

    /// A hub announced itself on the network.
    pub async fn step_zeroconf(&mut self, info: ZeroconfInfo) -> FlowResult {
        let Some(homee_id) = parse_zeroconf_name(&info.name) else {
            tracing::debug!(name = %info.name, "not a homee announcement");
            return FlowResult::Abort {
                reason: "not_homee_device",
            };
        };
        if self.configured.contains(&homee_id) {
            tracing::debug!(%homee_id, "hub already configured");
            return FlowResult::Abort {
                reason: "already_configured",
            };
        }
        tracing::info!(%homee_id, host = %info.host, "discovered hub");
        self.discovered = Some((homee_id, info.host));
        self.step_zeroconf_confirm(None).await
    }

    /// Ask for credentials of a discovered hub. An empty host in the input
    /// falls back to the announced one.
    pub async fn step_zeroconf_confirm(&mut self, input: Option<UserInput>) -> FlowResult {
        let Some((homee_id, host)) = self.discovered.clone() else {
            return FlowResult::Abort {
                reason: "no_discovery",
            };
        };
        let Some(mut input) = input else {
            let mut placeholders = BTreeMap::new();
            placeholders.insert("id".to_string(), homee_id);
            placeholders.insert("host".to_string(), host);
            return FlowResult::ShowForm {
                step_id: STEP_ZEROCONF_CONFIRM,
                errors: BTreeMap::new(),
                placeholders,
            };
        };
        if input.host.is_empty() {
            input.host = host;
        }
        match validate_input(&self.authenticator, &input).await {
            Ok(_) => {
                let title = format!("{homee_id} ({})", input.host);
                Self::create_entry(&input, title, Some(homee_id))
            }
            Err(err) => Self::failed(STEP_ZEROCONF_CONFIRM, &err),
        }
    }

    fn create_entry(input: &UserInput, title: String, homee_id: Option<String>) -> FlowResult {
        let mut builder = ConfigEntry::builder()
            .title(title)
            .host(input.host.clone())
            .credentials(input.username.clone(), input.password.clone());
        if let Some(id) = homee_id {
            builder = builder.homee_id(id);
        }
        match builder.build() {
            Ok(entry) => FlowResult::CreateEntry(entry),
            Err(err) => Self::failed(STEP_USER, &err),
        }
    }

    fn failed(step_id: &'static str, err: &BridgeError) -> FlowResult {
        let key = form_error(err);
        if key == ERROR_UNKNOWN {
            tracing::error!(error = %err, "unexpected error while validating hub");
        } else {
            tracing::warn!(error = %err, key, "hub validation failed");
        }
        FlowResult::form_error(step_id, key)
    }
}

/// Options of an existing entry. Submitted fields replace the current ones;
/// missing fields keep their value.
#[must_use]
pub fn step_options(current: &EntryOptions, input: Option<&Value>) -> FlowResult {
    let Some(input) = input else {
        return FlowResult::form(STEP_OPTIONS);
    };
    let Some(fields) = input.as_object() else {
        return FlowResult::form_error(STEP_OPTIONS, "invalid_options");
    };
    let mut merged = match serde_json::to_value(current) {
        Ok(Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };
    for (key, value) in fields {
        merged.insert(key.clone(), value.clone());
    }
    match serde_json::from_value::<EntryOptions>(Value::Object(merged)) {
        Ok(options) => FlowResult::UpdateOptions(options),
        Err(err) => {
            tracing::warn!(error = %err, "rejected options");
            FlowResult::form_error(STEP_OPTIONS, "invalid_options")
        }
    }
}
