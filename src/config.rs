use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub reset_ttl_minutes: i64,
}

/// Runtime mode. Only decides whether internal error detail reaches the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            _ => Environment::Production,
        }
    }

    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub admin_key: Option<String>,
    pub predict: PredictConfig,
    pub host: String,
    pub port: u16,
    pub environment: Environment,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "sleepmetrics".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "sleepmetrics-users".into()),
            ttl_minutes: parse_var("JWT_TTL_MINUTES").unwrap_or(60 * 24 * 30),
            reset_ttl_minutes: parse_var("RESET_TTL_MINUTES").unwrap_or(10),
        };
        let admin_key = std::env::var("ADMIN_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        let predict = PredictConfig {
            base_url: std::env::var("PREDICT_URL")
                .unwrap_or_else(|_| "http://localhost:5001".into()),
            timeout_secs: parse_var("PREDICT_TIMEOUT_SECS").unwrap_or(10),
        };
        let environment = std::env::var("APP_ENV")
            .map(|v| Environment::parse(&v))
            .unwrap_or(Environment::Production);

        Ok(Self {
            database_url,
            jwt,
            admin_key,
            predict,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_var("APP_PORT").unwrap_or(5000),
            environment,
        })
    }

    /// True when `candidate` matches the configured admin key.
    pub fn admin_key_matches(&self, candidate: Option<&str>) -> bool {
        match (self.admin_key.as_deref(), candidate) {
            (Some(expected), Some(given)) => !given.is_empty() && expected == given,
            _ => false,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
