use crate::error::{CliError, CliResult};
use donation_forms::{FormConfig, MAX_DONATION_AMOUNT};
use donation_gateway::GatewayConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Donation desk configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationConfig {
    /// Amount limits, presets and currency of the donation form
    #[serde(default)]
    pub form: FormConfig,

    #[serde(default)]
    pub gateway: GatewaySettings,

    /// Path to the ledger database
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
}

impl Default for DonationConfig {
    fn default() -> Self {
        Self {
            form: FormConfig::default(),
            gateway: GatewaySettings::default(),
            ledger_path: default_ledger_path(),
        }
    }
}

/// File form of `GatewayConfig`; durations are plain numbers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    pub razorpay_key_id: Option<String>,

    /// Prefer the `RAZORPAY_KEY_SECRET` environment variable over this field
    pub razorpay_key_secret: Option<String>,

    #[serde(default = "default_merchant_name")]
    pub merchant_name: String,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            razorpay_key_id: None,
            razorpay_key_secret: None,
            merchant_name: default_merchant_name(),
        }
    }
}

impl GatewaySettings {
    pub fn to_gateway_config(&self) -> CliResult<GatewayConfig> {
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(CliError::InvalidConfig(format!(
                "initial_backoff_ms ({}) exceeds max_backoff_ms ({})",
                self.initial_backoff_ms, self.max_backoff_ms
            )));
        }

        let mut config = GatewayConfig {
            api_base_url: self.api_base_url.clone(),
            max_retries: self.max_retries,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            razorpay_key_id: self.razorpay_key_id.clone(),
            razorpay_key_secret: std::env::var("RAZORPAY_KEY_SECRET")
                .ok()
                .or_else(|| self.razorpay_key_secret.clone()),
            merchant_name: self.merchant_name.clone(),
            ..Default::default()
        }
        .with_initial_backoff(Duration::from_millis(self.initial_backoff_ms));
        config.retry_backoff.max_interval = Duration::from_millis(self.max_backoff_ms);

        config.validate()?;
        Ok(config)
    }
}

impl DonationConfig {
    /// Load from a YAML file, or defaults when no file is given
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    CliError::InvalidConfig(format!(
                        "Failed to read config '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                Self::from_yaml(&text)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml(text: &str) -> CliResult<Self> {
        let config: DonationConfig = serde_yaml::from_str(text)?;
        if config.form.min_amount > config.form.max_amount {
            return Err(CliError::InvalidConfig(format!(
                "form.min_amount ({}) exceeds form.max_amount ({})",
                config.form.min_amount, config.form.max_amount
            )));
        }
        if config.form.max_amount > MAX_DONATION_AMOUNT {
            return Err(CliError::InvalidConfig(format!(
                "form.max_amount ({}) exceeds the limit of {}",
                config.form.max_amount, MAX_DONATION_AMOUNT
            )));
        }
        Ok(config)
    }
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("donations.db")
}

fn default_api_base_url() -> String {
    GatewayConfig::default().api_base_url
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    8_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_merchant_name() -> String {
    "Donations".to_string()
}
