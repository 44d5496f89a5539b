use serde::Deserialize;

/// Top-level configuration for the Dikast server, loaded from a TOML file.
///
/// Every section and field has a default, so an absent or empty file
/// yields a runnable configuration. Configuration is read once at startup
/// and never reloaded.
#[derive(Debug, Default, Deserialize)]
pub struct DikastConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// API surface configuration.
    #[serde(default)]
    pub api: ApiConfig,
    /// Rule engine limits and defaults.
    #[serde(default)]
    pub engine: EngineConfig,
}

/// HTTP server bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// API surface configuration.
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    /// Path prefix all routes are nested under.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Origins allowed by CORS; `"*"` allows any origin.
    #[serde(default = "default_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            allowed_origins: default_origins(),
        }
    }
}

/// Rule engine limits and defaults.
#[derive(Debug, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of rules accepted by a single store or ad-hoc
    /// evaluation request.
    #[serde(default = "default_max_rules")]
    pub max_rules_per_request: usize,
    /// Entity type assigned to uploaded rules that carry none.
    #[serde(default = "default_entity_type")]
    pub default_entity_type: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_rules_per_request: default_max_rules(),
            default_entity_type: default_entity_type(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    8080
}

fn default_prefix() -> String {
    "/api/v1".to_owned()
}

fn default_origins() -> Vec<String> {
    vec!["*".to_owned()]
}

fn default_max_rules() -> usize {
    100
}

fn default_entity_type() -> String {
    "generic".to_owned()
}
