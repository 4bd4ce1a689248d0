use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
const MAX_TOKENS_CEILING: u32 = 8192;

/// Main configuration structure loaded from five_s_audit.toml and environment variables
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub capability: CapabilityConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Settings for the vision inference capability (everything except the credential)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CapabilityConfig {
    pub base_url: String,
    pub model: String,
    pub anthropic_version: String,
    pub max_tokens: u32,
    pub request_timeout_ms: u64,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            anthropic_version: DEFAULT_ANTHROPIC_VERSION.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            // Vision calls over four images regularly take tens of seconds
            request_timeout_ms: 120_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: std::net::SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: std::net::SocketAddr::from(([127, 0, 0, 1], 8788)),
        }
    }
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub anthropic_api_key: Option<String>,
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            log_level: "five_s_audit=info,tower_http=info".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment variables
    pub fn load_from_env() -> Self {
        Self {
            // Blank keys count as missing so the invoker reports CapabilityUnavailable
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            log_level: std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "five_s_audit=info,tower_http=info".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capability: CapabilityConfig::default(),
            server: ServerConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses FIVE_S_AUDIT_CONFIG environment variable or defaults to "five_s_audit.toml"
    pub fn load() -> anyhow::Result<Self> {
        Self::load_dotenv();

        let config_path = std::env::var("FIVE_S_AUDIT_CONFIG")
            .unwrap_or_else(|_| "five_s_audit.toml".to_string());

        let mut config: Config = if let Ok(content) = std::fs::read_to_string(&config_path) {
            Self::from_toml(&content)?
        } else {
            tracing::warn!("Config file {} not found, using defaults", config_path);
            Self::default()
        };

        config.apply_env_overrides();
        config.runtime = RuntimeConfig::load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Populate the process environment from FIVE_S_ENV_FILE, otherwise ./.env if present
    ///
    /// Existing variables win. Safe to call more than once, so callers can read
    /// RUST_LOG and install a subscriber before [`Config::load`] emits warnings.
    pub fn load_dotenv() {
        if let Ok(env_path) = std::env::var("FIVE_S_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::from_path(".env");
        }
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply env overrides (env-first)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("ANTHROPIC_BASE_URL") {
            self.capability.base_url = url;
            tracing::debug!("ANTHROPIC_BASE_URL env override applied");
        }
        if let Ok(model) = std::env::var("ANTHROPIC_MODEL") {
            self.capability.model = model;
            tracing::debug!("ANTHROPIC_MODEL env override applied");
        }
        if let Some(max_tokens) = std::env::var("FIVE_S_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
        {
            self.capability.max_tokens = max_tokens;
        }
        if let Some(timeout) = std::env::var("FIVE_S_REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            self.capability.request_timeout_ms = timeout;
        }
        if let Ok(v) = std::env::var("FIVE_S_HTTP_BIND")
            && let Ok(bind) = v.parse::<std::net::SocketAddr>()
        {
            self.server.bind = bind;
        }
    }

    /// Validate and clamp values
    pub fn validate(&mut self) -> anyhow::Result<()> {
        if self.capability.model.trim().is_empty() {
            anyhow::bail!("capability.model must not be empty");
        }
        if !self.capability.base_url.starts_with("http://")
            && !self.capability.base_url.starts_with("https://")
        {
            anyhow::bail!(
                "capability.base_url '{}' must start with http:// or https://",
                self.capability.base_url
            );
        }

        if self.capability.max_tokens == 0 {
            self.capability.max_tokens = 1;
        } else if self.capability.max_tokens > MAX_TOKENS_CEILING {
            tracing::warn!(
                "max_tokens {} exceeds max {}, clamping",
                self.capability.max_tokens,
                MAX_TOKENS_CEILING
            );
            self.capability.max_tokens = MAX_TOKENS_CEILING;
        }

        if self.capability.request_timeout_ms == 0 {
            tracing::warn!("request_timeout_ms must be > 0, using default");
            self.capability.request_timeout_ms = CapabilityConfig::default().request_timeout_ms;
        }

        Ok(())
    }
}
