use std::time::Duration;

use anyhow::{Context, Result};

use crate::deploy::readiness::RetryPolicy;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub github_client_id: String,
    pub github_client_secret: String,
    pub github_api_url: String,
    /// Browser origin allowed by CORS and used for the OAuth redirect.
    pub frontend_origin: String,
    /// Sets the `Secure` attribute on session cookies.
    pub cookie_secure: bool,
    pub port: u16,
    pub rust_log: String,
    pub timings: DeployTimings,
}

/// Delays and retry bounds for the deployment pipeline. GitHub's
/// consistency windows are empirical, so every one of these is tunable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployTimings {
    /// Pause after repository creation before the first upload.
    pub branch_ready_delay: Duration,
    /// Pause before pushing the workflow so Actions has registered the repo.
    pub actions_provision_delay: Duration,
    /// Pause before the standalone enable-pages call.
    pub pages_enable_delay: Duration,
    /// Use the ref/commit verifier instead of the fixed branch delay.
    pub verify_branch: bool,
    pub readiness: RetryPolicy,
}

impl Default for DeployTimings {
    fn default() -> Self {
        Self {
            branch_ready_delay: Duration::from_millis(2000),
            actions_provision_delay: Duration::from_millis(4000),
            pages_enable_delay: Duration::from_millis(3000),
            verify_branch: false,
            readiness: RetryPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = DeployTimings::default();
        let timings = DeployTimings {
            branch_ready_delay: env_millis(
                "DEPLOY_BRANCH_READY_DELAY_MS",
                defaults.branch_ready_delay,
            )?,
            actions_provision_delay: env_millis(
                "DEPLOY_ACTIONS_DELAY_MS",
                defaults.actions_provision_delay,
            )?,
            pages_enable_delay: env_millis("DEPLOY_PAGES_DELAY_MS", defaults.pages_enable_delay)?,
            verify_branch: env_bool("DEPLOY_VERIFY_BRANCH", defaults.verify_branch)?,
            readiness: RetryPolicy {
                max_attempts: env_parse(
                    "DEPLOY_READY_MAX_ATTEMPTS",
                    defaults.readiness.max_attempts,
                )?,
                interval: env_millis("DEPLOY_READY_INTERVAL_MS", defaults.readiness.interval)?,
            },
        };

        if timings.readiness.max_attempts == 0 {
            anyhow::bail!("DEPLOY_READY_MAX_ATTEMPTS must be at least 1");
        }

        Ok(Config {
            github_client_id: require_env("GITHUB_CLIENT_ID")?,
            github_client_secret: require_env("GITHUB_CLIENT_SECRET")?,
            github_api_url: std::env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| "https://api.github.com".to_string()),
            frontend_origin: std::env::var("FRONTEND_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            cookie_secure: env_bool("COOKIE_SECURE", false)?,
            port: env_parse("PORT", 4000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            timings,
        })
    }

    /// Config for router tests: no pipeline delays, fake credentials.
    #[cfg(test)]
    pub fn for_testing() -> Self {
        Config {
            github_client_id: "test-client".to_string(),
            github_client_secret: "test-secret".to_string(),
            github_api_url: "http://127.0.0.1:0".to_string(),
            frontend_origin: "http://localhost:3000".to_string(),
            cookie_secure: false,
            port: 0,
            rust_log: "debug".to_string(),
            timings: DeployTimings {
                branch_ready_delay: Duration::ZERO,
                actions_provision_delay: Duration::ZERO,
                pages_enable_delay: Duration::ZERO,
                verify_branch: false,
                readiness: RetryPolicy {
                    max_attempts: 1,
                    interval: Duration::ZERO,
                },
            },
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn env_millis(key: &str, default: Duration) -> Result<Duration> {
    env_parse::<u64>(key, default.as_millis() as u64).map(Duration::from_millis)
}

fn env_bool(key: &str, default: bool) -> Result<bool> {
    match std::env::var(key) {
        Ok(raw) => parse_bool(&raw).with_context(|| format!("{key} must be true or false")),
        Err(_) => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
