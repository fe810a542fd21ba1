//! Configuration management
//!
//! 設定は 環境変数 → YAMLファイル → CLIフラグ の順に重ねて一度だけ構築し、
//! 検証後は不変として扱う。ファイルに無い項目は環境変数（またはデフォルト）の値が残る。
//! 環境変数は新しい名前を優先し、旧名にも警告付きでフォールバックする。

use crate::error::ConfigError;
use crate::health::retry::RetryPolicy;
use crate::types::EndpointConfig;
use reqwest::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// デフォルトのベースURL
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";

/// Get an environment variable with fallback to a deprecated name
///
/// If the new variable name is set, returns its value.
/// If only the old (deprecated) variable name is set, returns its value
/// and logs a deprecation warning.
pub fn get_env_with_fallback(new_name: &str, old_name: &str) -> Option<String> {
    if let Ok(val) = std::env::var(new_name) {
        return Some(val);
    }
    if let Ok(val) = std::env::var(old_name) {
        tracing::warn!(
            "Environment variable '{}' is deprecated, use '{}' instead",
            old_name,
            new_name
        );
        return Some(val);
    }
    None
}

/// Get an environment variable with fallback and default value
pub fn get_env_with_fallback_or(new_name: &str, old_name: &str, default: &str) -> String {
    get_env_with_fallback(new_name, old_name).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable with fallback, parsing to a specific type
///
/// Unparsable values fall back to `default`.
pub fn get_env_with_fallback_parse<T: std::str::FromStr>(
    new_name: &str,
    old_name: &str,
    default: T,
) -> T {
    get_env_with_fallback(new_name, old_name)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

fn default_alert_threshold() -> f64 {
    0.95
}

fn default_min_failures() -> u64 {
    3
}

fn default_min_samples() -> u64 {
    10
}

/// アラート設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertingConfig {
    /// アラートを有効化するか (デフォルト: false)
    #[serde(default)]
    pub enabled: bool,
    /// 送信先Webhook URL（有効時は必須）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    /// 失敗時にアラートを出すか (デフォルト: true)
    #[serde(default = "default_true")]
    pub alert_on_failure: bool,
    /// 成功率の閾値 0.0-1.0 (デフォルト: 0.95)
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: f64,
    /// 連続失敗アラートの閾値 (デフォルト: 3)
    #[serde(default = "default_min_failures")]
    pub min_failures: u64,
    /// 成功率判定に必要な最小チェック回数 (デフォルト: 10)
    #[serde(default = "default_min_samples")]
    pub min_samples: u64,
    /// 条件が継続している間の再送を抑止するか (デフォルト: false)
    #[serde(default)]
    pub suppress_repeats: bool,
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: None,
            alert_on_failure: true,
            alert_threshold: default_alert_threshold(),
            min_failures: default_min_failures(),
            min_samples: default_min_samples(),
            suppress_repeats: false,
        }
    }
}

impl AlertingConfig {
    /// 設定値を検証
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.alert_threshold) {
            return Err(ConfigError::Validation(format!(
                "alerting.alert_threshold must be within 0.0..=1.0, got {}",
                self.alert_threshold
            )));
        }
        if self.min_failures < 1 {
            return Err(ConfigError::Validation(
                "alerting.min_failures must be >= 1".to_string(),
            ));
        }
        if self.min_samples < 1 {
            return Err(ConfigError::Validation(
                "alerting.min_samples must be >= 1".to_string(),
            ));
        }
        match self.webhook_url.as_deref() {
            Some(url) => validate_http_url("alerting.webhook_url", url)?,
            None if self.enabled => {
                return Err(ConfigError::Validation(
                    "alerting.webhook_url is required when alerting is enabled".to_string(),
                ));
            }
            None => {}
        }
        Ok(())
    }
}

/// YAMLファイルの内容（省略された項目は下の層の値を残す）
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default, rename = "timeout")]
    timeout_secs: Option<u64>,
    #[serde(default)]
    retry_attempts: Option<u32>,
    #[serde(default)]
    retry_delay_ms: Option<u64>,
    #[serde(default)]
    backoff_factor: Option<f64>,
    endpoints: BTreeMap<String, EndpointConfig>,
    #[serde(default)]
    alerting: Option<AlertingConfig>,
}

/// 監視設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorConfig {
    /// 監視対象サーバーのベースURL
    pub base_url: String,
    /// リクエストごとのタイムアウト（秒）(デフォルト: 10)
    #[serde(rename = "timeout", default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// 最大試行回数 (デフォルト: 3)
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// リトライ基準待機時間（ミリ秒）(デフォルト: 2000)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// 指数バックオフの係数 (デフォルト: 2.0)
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    /// エンドポイントキー → 設定
    pub endpoints: BTreeMap<String, EndpointConfig>,
    /// アラート設定
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alerting: Option<AlertingConfig>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: default_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            backoff_factor: default_backoff_factor(),
            endpoints: default_endpoints(),
            alerting: None,
        }
    }
}

/// 設定ファイルが無い場合の監視対象（ルートのみ）
pub fn default_endpoints() -> BTreeMap<String, EndpointConfig> {
    let mut endpoints = BTreeMap::new();
    endpoints.insert("/".to_string(), EndpointConfig::new("/"));
    endpoints
}

impl MonitorConfig {
    /// 環境変数から設定を構築（エンドポイントはルートのみ）
    pub fn from_env() -> Self {
        // The legacy RETRY_DELAY variable is expressed in seconds.
        let retry_delay_ms = std::env::var("OLLAMA_MONITOR_RETRY_DELAY_MS")
            .ok()
            .and_then(|ms| ms.parse().ok())
            .or_else(|| {
                let secs = std::env::var("RETRY_DELAY").ok()?.parse::<u64>().ok()?;
                tracing::warn!(
                    "Environment variable 'RETRY_DELAY' is deprecated, use 'OLLAMA_MONITOR_RETRY_DELAY_MS' instead"
                );
                Some(secs.saturating_mul(1000))
            })
            .unwrap_or_else(default_retry_delay_ms);

        Self {
            base_url: get_env_with_fallback_or(
                "OLLAMA_MONITOR_BASE_URL",
                "OLLAMA_API_BASE",
                DEFAULT_BASE_URL,
            ),
            timeout_secs: get_env_with_fallback_parse(
                "OLLAMA_MONITOR_TIMEOUT",
                "DEFAULT_TIMEOUT",
                default_timeout_secs(),
            ),
            retry_attempts: get_env_with_fallback_parse(
                "OLLAMA_MONITOR_RETRY_ATTEMPTS",
                "RETRY_ATTEMPTS",
                default_retry_attempts(),
            ),
            retry_delay_ms,
            ..Self::default()
        }
    }

    /// YAML文字列の値を重ねる（検証はしない）
    ///
    /// `endpoints`は必須。その他の省略された項目は`self`の値を保持する。
    pub fn overlay_yaml_str(mut self, yaml: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_yaml::from_str(yaml)?;

        if let Some(base_url) = file.base_url {
            self.base_url = base_url;
        }
        if let Some(timeout_secs) = file.timeout_secs {
            self.timeout_secs = timeout_secs;
        }
        if let Some(retry_attempts) = file.retry_attempts {
            self.retry_attempts = retry_attempts;
        }
        if let Some(retry_delay_ms) = file.retry_delay_ms {
            self.retry_delay_ms = retry_delay_ms;
        }
        if let Some(backoff_factor) = file.backoff_factor {
            self.backoff_factor = backoff_factor;
        }
        self.endpoints = file.endpoints;
        if file.alerting.is_some() {
            self.alerting = file.alerting;
        }
        Ok(self)
    }

    /// YAMLファイルの値を重ねる（検証はしない）
    pub fn overlay_yaml_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.overlay_yaml_str(&contents)
    }

    /// YAML文字列から設定を読み込み検証する（省略項目はデフォルト値）
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config = Self::default().overlay_yaml_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// YAMLファイルから設定を読み込み検証する（省略項目はデフォルト値）
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::default().overlay_yaml_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// 設定値を検証
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_http_url("base_url", &self.base_url)?;

        if !(1..=300).contains(&self.timeout_secs) {
            return Err(ConfigError::Validation(format!(
                "timeout must be within 1..=300 seconds, got {}",
                self.timeout_secs
            )));
        }
        if self.retry_attempts < 1 {
            return Err(ConfigError::Validation(
                "retry_attempts must be >= 1".to_string(),
            ));
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(ConfigError::Validation(format!(
                "backoff_factor must be >= 1.0, got {}",
                self.backoff_factor
            )));
        }
        if self.endpoints.is_empty() {
            return Err(ConfigError::Validation(
                "at least one endpoint must be configured".to_string(),
            ));
        }
        for (key, endpoint) in &self.endpoints {
            validate_endpoint(key, endpoint)?;
        }
        if let Some(alerting) = &self.alerting {
            alerting.validate()?;
        }
        Ok(())
    }

    /// リクエストタイムアウト
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// リトライポリシー
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_delay_ms),
        )
        .with_backoff_factor(self.backoff_factor)
    }

    /// アラート設定（未指定時はデフォルト＝無効）
    pub fn alerting_or_default(&self) -> AlertingConfig {
        self.alerting.clone().unwrap_or_default()
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = reqwest::Url::parse(value)
        .map_err(|e| ConfigError::Validation(format!("{field} is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation(format!(
            "{field} must use http or https, got '{}'",
            url.scheme()
        )));
    }
    Ok(())
}

fn validate_endpoint(key: &str, endpoint: &EndpointConfig) -> Result<(), ConfigError> {
    if endpoint.path.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "endpoint '{key}': path must not be empty"
        )));
    }
    if !(100..=599).contains(&endpoint.expected_status) {
        return Err(ConfigError::Validation(format!(
            "endpoint '{key}': expected_status must be within 100..=599, got {}",
            endpoint.expected_status
        )));
    }
    for (name, value) in &endpoint.headers {
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            ConfigError::Validation(format!("endpoint '{key}': invalid header name '{name}'"))
        })?;
        HeaderValue::from_str(value).map_err(|_| {
            ConfigError::Validation(format!(
                "endpoint '{key}': invalid value for header '{name}'"
            ))
        })?;
    }
    Ok(())
}
