use arbor_domain::categories::OwnershipPolicy;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_env: String,
    pub port: u16,
    pub log_level: String,
    pub data_backend: String,
    pub surreal_endpoint: String,
    pub surreal_ns: String,
    pub surreal_db: String,
    pub surreal_user: String,
    pub surreal_pass: String,
    pub cors_allowed_origins: String,
    pub request_timeout_ms: u64,
    pub enforce_category_ownership: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataBackend {
    Memory,
    Surreal,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let cfg = config::Config::builder()
            .set_default("app_env", "development")?
            .set_default("port", 5000)?
            .set_default("log_level", "info")?
            .set_default("data_backend", "memory")?
            .set_default("surreal_endpoint", "ws://127.0.0.1:8000")?
            .set_default("surreal_ns", "arbor")?
            .set_default("surreal_db", "categories")?
            .set_default("surreal_user", "root")?
            .set_default("surreal_pass", "root")?
            .set_default("cors_allowed_origins", "*")?
            .set_default("request_timeout_ms", 30_000)?
            .set_default("enforce_category_ownership", false)?
            .add_source(config::Environment::default().separator("__"))
            .build()?;
        cfg.try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn data_backend(&self) -> Result<DataBackend, config::ConfigError> {
        match self.data_backend.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(DataBackend::Memory),
            "surreal" | "surrealdb" => Ok(DataBackend::Surreal),
            other => Err(config::ConfigError::Message(format!(
                "unknown data_backend '{other}', expected 'memory' or 'surreal'"
            ))),
        }
    }

    pub fn ownership_policy(&self) -> OwnershipPolicy {
        OwnershipPolicy::from_flag(self.enforce_category_ownership)
    }

    /// Allowed CORS origins; `None` means any origin.
    pub fn cors_origins(&self) -> Option<Vec<String>> {
        let origins: Vec<String> = self
            .cors_allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();
        if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
            None
        } else {
            Some(origins)
        }
    }
}
