use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    /// Expected `aud` claim of tokens minted by the hosted auth service, if any.
    pub jwt_audience: Option<String>,
    pub host: String,
    pub port: u16,
    pub app_base_url: String,
    pub run_migrations: bool,
    pub metrics_refresh_seconds: u64,
    /// Max public form submissions (registration, partner request) per IP per hour.
    pub registration_rate_limit: u64,
    // SMTP (optional)
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
            jwt_secret: required("JWT_SECRET")?,
            jwt_audience: optional("JWT_AUDIENCE"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            run_migrations: parse_flag(env::var("RUN_MIGRATIONS").ok().as_deref(), true),
            metrics_refresh_seconds: env::var("METRICS_REFRESH_SECONDS")
                .unwrap_or_else(|_| "300".into())
                .parse()?,
            registration_rate_limit: env::var("REGISTRATION_RATE_LIMIT")
                .unwrap_or_else(|_| "5".into())
                .parse()?,
            smtp_host: optional("SMTP_HOST"),
            smtp_port: env::var("SMTP_PORT").ok().and_then(|v| v.parse().ok()),
            smtp_username: optional("SMTP_USERNAME"),
            smtp_password: optional("SMTP_PASSWORD"),
            smtp_from: optional("SMTP_FROM"),
        })
    }

    /// Login page of the dashboard, used in account emails.
    pub fn login_url(&self) -> String {
        format!("{}/login", self.app_base_url.trim_end_matches('/'))
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn parse_flag(value: Option<&str>, default: bool) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}
