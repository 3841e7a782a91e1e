//! Runtime configuration.
//!
//! Every setting can be given as a command-line flag; otherwise it is read
//! from the environment and finally falls back to a built-in default.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::upstream::RetryPolicy;

/// Account shown on the portfolio when no username is configured.
pub const DEFAULT_USERNAME: &str = "g_for_gour";

/// Placeholder value shipped in example env files; treated as unset.
pub const USERNAME_SENTINEL: &str = "your_leetcode_username";

/// Default server port.
pub const DEFAULT_PORT: u16 = 13234;

pub const DEFAULT_GRAPHQL_URL: &str = "https://leetcode.com/graphql";
pub const DEFAULT_FRESHNESS_SECS: u64 = 6 * 60 * 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

/// Command-line overrides.
#[derive(Debug, Default, Parser)]
#[command(name = "cpstats", version, about = "LeetCode stats service")]
pub struct CliArgs {
    /// LeetCode username to report on.
    #[arg(long, value_name = "NAME")]
    pub username: Option<String>,
    /// HTTP bind address (ip:port).
    #[arg(long, value_name = "ADDR", value_parser = clap::value_parser!(SocketAddr))]
    pub bind: Option<SocketAddr>,
    /// LeetCode GraphQL endpoint.
    #[arg(long, value_name = "URL")]
    pub graphql_url: Option<String>,
    /// How long a fetched snapshot is served before refreshing, in seconds.
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64))]
    pub freshness_secs: Option<u64>,
    /// Upstream request timeout in seconds.
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64))]
    pub request_timeout_secs: Option<u64>,
    /// Retries after a rate-limited or failed upstream call.
    #[arg(long, value_name = "COUNT", value_parser = clap::value_parser!(u32))]
    pub max_retries: Option<u32>,
    /// Delay before the first retry in milliseconds; doubles per attempt.
    #[arg(long, value_name = "MILLIS", value_parser = clap::value_parser!(u64))]
    pub retry_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub username: String,
    pub bind: SocketAddr,
    pub graphql_url: String,
    #[serde(serialize_with = "as_secs")]
    pub freshness: Duration,
    #[serde(serialize_with = "as_secs")]
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            bind: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
            freshness: Duration::from_secs(DEFAULT_FRESHNESS_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Resolves the configuration from CLI flags, then the process environment.
    pub fn from_sources(overrides: &CliArgs) -> Result<Self> {
        Self::resolve(overrides, |key| env::var(key).ok())
    }

    /// Same as [`AppConfig::from_sources`] with an injectable environment lookup.
    pub fn resolve(overrides: &CliArgs, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let username = resolve_username(
            overrides
                .username
                .clone()
                .or_else(|| lookup("LEETCODE_USERNAME")),
        );

        let bind = match overrides.bind {
            Some(addr) => addr,
            None => parse_env(&lookup, "CPSTATS_BIND")?.unwrap_or(defaults.bind),
        };

        let graphql_url = overrides
            .graphql_url
            .clone()
            .or_else(|| lookup("LEETCODE_GRAPHQL_URL"))
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.graphql_url);
        if !graphql_url.starts_with("http://") && !graphql_url.starts_with("https://") {
            return Err(anyhow!("invalid GraphQL URL: {graphql_url}"));
        }

        let freshness_secs = match overrides.freshness_secs {
            Some(secs) => secs,
            None => parse_env(&lookup, "CPSTATS_FRESHNESS_SECS")?
                .unwrap_or(DEFAULT_FRESHNESS_SECS),
        };

        let request_timeout_secs = match overrides.request_timeout_secs {
            Some(secs) => secs,
            None => parse_env(&lookup, "CPSTATS_REQUEST_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        };
        if request_timeout_secs == 0 {
            return Err(anyhow!("request timeout must be at least one second"));
        }

        let max_retries = match overrides.max_retries {
            Some(n) => n,
            None => parse_env(&lookup, "CPSTATS_MAX_RETRIES")?.unwrap_or(DEFAULT_MAX_RETRIES),
        };

        let retry_delay_ms = match overrides.retry_delay_ms {
            Some(ms) => ms,
            None => parse_env(&lookup, "CPSTATS_RETRY_DELAY_MS")?
                .unwrap_or(DEFAULT_RETRY_DELAY_MS),
        };

        Ok(Self {
            username,
            bind,
            graphql_url,
            freshness: Duration::from_secs(freshness_secs),
            request_timeout: Duration::from_secs(request_timeout_secs),
            retry: RetryPolicy {
                max_retries,
                initial_delay: Duration::from_millis(retry_delay_ms),
            },
        })
    }
}

/// Falls back to [`DEFAULT_USERNAME`] for a missing, blank or placeholder name.
fn resolve_username(candidate: Option<String>) -> String {
    match candidate.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() && name != USERNAME_SENTINEL => name.to_string(),
        Some(USERNAME_SENTINEL) => {
            tracing::warn!(
                default = DEFAULT_USERNAME,
                "LEETCODE_USERNAME holds the placeholder value, using default account"
            );
            DEFAULT_USERNAME.to_string()
        }
        _ => DEFAULT_USERNAME.to_string(),
    }
}

fn parse_env<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("invalid {key}: {raw}")),
        None => Ok(None),
    }
}

fn as_secs<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_secs())
}
