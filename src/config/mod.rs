//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    fmt,
    net::SocketAddr,
    num::NonZeroU32,
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File, Map};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

mod cli;

pub use cli::{CliArgs, Command, DatabaseOverride, ServeArgs, ServeOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "duodriven";
const ENV_PREFIX: &str = "DUODRIVEN";
const ENV_SEPARATOR: &str = "__";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_PUBLIC_URL: &str = "https://duodriven.com";
const DEFAULT_CHAT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CONTACT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u64 = 120;
const DEFAULT_SCHEDULER_CADENCE_SECS: u64 = 60;

/// Deployment variable names kept from earlier releases, mapped onto their
/// structured configuration keys.
const LEGACY_ENV_ALIASES: &[(&str, &str)] = &[
    ("DATABASE_URL", "DATABASE__URL"),
    ("DUODRIVEN_API_KEY", "API__KEY"),
    ("APP_ENV", "SITE__ENVIRONMENT"),
    ("SECRET_KEY", "SITE__SECRET_KEY"),
    ("N8N_WEBHOOK_URL", "INTEGRATIONS__CHAT_WEBHOOK_URL"),
    ("CONTACT_WEBHOOK_URL", "INTEGRATIONS__CONTACT_WEBHOOK_URL"),
];

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub api: ApiSettings,
    pub site: SiteSettings,
    pub integrations: IntegrationSettings,
    pub scheduler: SchedulerSettings,
    pub rate_limit: RateLimitSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: NonZeroU32,
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

#[derive(Clone, Default)]
pub struct ApiSettings {
    /// Shared secret for the content API. `None` rejects every API call.
    pub key: Option<String>,
}

impl fmt::Debug for ApiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiSettings")
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl AppEnvironment {
    pub fn as_str(self) -> &'static str {
        match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        }
    }
}

impl FromStr for AppEnvironment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "default" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            other => Err(format!(
                "unknown environment `{other}` (expected development, production or testing)"
            )),
        }
    }
}

#[derive(Clone)]
pub struct SiteSettings {
    pub environment: AppEnvironment,
    pub secret_key: Option<String>,
    pub public_url: String,
}

impl fmt::Debug for SiteSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteSettings")
            .field("environment", &self.environment)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("public_url", &self.public_url)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct IntegrationSettings {
    pub chat_webhook_url: Option<String>,
    pub chat_timeout: Duration,
    pub contact_webhook_url: Option<String>,
    pub contact_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub enabled: bool,
    pub cadence: Duration,
}

#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    pub window_seconds: NonZeroU32,
    pub max_requests: NonZeroU32,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence.
///
/// Files come first, then the legacy variable names, then
/// `DUODRIVEN__SECTION__KEY` variables, then CLI overrides.
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    let legacy = legacy_env_overrides(|name| std::env::var(name).ok());
    builder = builder
        .add_source(
            Environment::default()
                .separator(ENV_SEPARATOR)
                .source(Some(legacy)),
        )
        .add_source(Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Migrate(database)) | Some(Command::PublishScheduled(database)) => {
            raw.apply_database_override(database)
        }
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

fn legacy_env_overrides(lookup: impl Fn(&str) -> Option<String>) -> Map<String, String> {
    let mut overrides = Map::new();
    for (name, key) in LEGACY_ENV_ALIASES {
        if let Some(value) = lookup(name).filter(|value| !value.trim().is_empty()) {
            overrides.insert((*key).to_string(), value);
        }
    }
    overrides
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    api: RawApiSettings,
    site: RawSiteSettings,
    integrations: RawIntegrationSettings,
    scheduler: RawSchedulerSettings,
    rate_limit: RawRateLimitSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.format = Some(if json { "json" } else { "compact" }.to_string());
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(window) = overrides.rate_limit_window_seconds {
            self.rate_limit.window_seconds = Some(window);
        }
        if let Some(max) = overrides.rate_limit_max_requests {
            self.rate_limit.max_requests = Some(max);
        }
        if let Some(enabled) = overrides.scheduler_enabled {
            self.scheduler.enabled = Some(enabled);
        }
        if let Some(cadence) = overrides.scheduler_cadence_seconds {
            self.scheduler.cadence_seconds = Some(cadence);
        }
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            api,
            site,
            integrations,
            scheduler,
            rate_limit,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let database = build_database_settings(database)?;
        let api = build_api_settings(api);
        let site = build_site_settings(site)?;
        let integrations = build_integration_settings(integrations)?;
        let scheduler = build_scheduler_settings(scheduler)?;
        let rate_limit = build_rate_limit_settings(rate_limit)?;

        if site.environment == AppEnvironment::Production {
            if api.key.is_none() {
                return Err(LoadError::invalid(
                    "api.key",
                    "an API key is required in production",
                ));
            }
            if site.secret_key.is_none() {
                return Err(LoadError::invalid(
                    "site.secret_key",
                    "a secret key is required in production",
                ));
            }
        }

        Ok(Self {
            server,
            logging,
            database,
            api,
            site,
            integrations,
            scheduler,
            rate_limit,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    let graceful_shutdown = non_zero_duration(graceful_secs, "server.graceful_shutdown_seconds")?;

    Ok(ServerSettings {
        addr,
        graceful_shutdown,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = match logging.format.as_deref().map(str::trim) {
        None | Some("") | Some("compact") => LogFormat::Compact,
        Some("json") => LogFormat::Json,
        Some(other) => {
            return Err(LoadError::invalid(
                "logging.format",
                format!("unknown format `{other}` (expected compact or json)"),
            ));
        }
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = non_blank(database.url)
        .ok_or_else(|| LoadError::invalid("database.url", "a database URL is required"))?;
    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_api_settings(api: RawApiSettings) -> ApiSettings {
    ApiSettings {
        key: non_blank(api.key),
    }
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let environment = match non_blank(site.environment) {
        Some(value) => AppEnvironment::from_str(&value)
            .map_err(|reason| LoadError::invalid("site.environment", reason))?,
        None => AppEnvironment::Development,
    };

    let public_url = non_blank(site.public_url).unwrap_or_else(|| DEFAULT_PUBLIC_URL.to_string());
    Url::parse(&public_url)
        .map_err(|err| LoadError::invalid("site.public_url", format!("invalid URL: {err}")))?;

    Ok(SiteSettings {
        environment,
        secret_key: non_blank(site.secret_key),
        public_url,
    })
}

fn build_integration_settings(
    integrations: RawIntegrationSettings,
) -> Result<IntegrationSettings, LoadError> {
    let chat_webhook_url = webhook_url(
        integrations.chat_webhook_url,
        "integrations.chat_webhook_url",
    )?;
    let contact_webhook_url = webhook_url(
        integrations.contact_webhook_url,
        "integrations.contact_webhook_url",
    )?;
    let chat_timeout = non_zero_duration(
        integrations
            .chat_timeout_seconds
            .unwrap_or(DEFAULT_CHAT_TIMEOUT_SECS),
        "integrations.chat_timeout_seconds",
    )?;
    let contact_timeout = non_zero_duration(
        integrations
            .contact_timeout_seconds
            .unwrap_or(DEFAULT_CONTACT_TIMEOUT_SECS),
        "integrations.contact_timeout_seconds",
    )?;

    Ok(IntegrationSettings {
        chat_webhook_url,
        chat_timeout,
        contact_webhook_url,
        contact_timeout,
    })
}

fn build_scheduler_settings(
    scheduler: RawSchedulerSettings,
) -> Result<SchedulerSettings, LoadError> {
    let cadence = non_zero_duration(
        scheduler
            .cadence_seconds
            .unwrap_or(DEFAULT_SCHEDULER_CADENCE_SECS),
        "scheduler.cadence_seconds",
    )?;

    Ok(SchedulerSettings {
        enabled: scheduler.enabled.unwrap_or(true),
        cadence,
    })
}

fn build_rate_limit_settings(
    rate_limit: RawRateLimitSettings,
) -> Result<RateLimitSettings, LoadError> {
    let window_seconds = non_zero_u32(
        rate_limit
            .window_seconds
            .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECS),
        "rate_limit.window_seconds",
    )?;
    let max_requests = non_zero_u32(
        rate_limit
            .max_requests
            .unwrap_or(DEFAULT_RATE_LIMIT_MAX_REQUESTS),
        "rate_limit.max_requests",
    )?;

    Ok(RateLimitSettings {
        window_seconds,
        max_requests,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    format: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawApiSettings {
    key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    environment: Option<String>,
    secret_key: Option<String>,
    public_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawIntegrationSettings {
    chat_webhook_url: Option<String>,
    chat_timeout_seconds: Option<u64>,
    contact_webhook_url: Option<String>,
    contact_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSchedulerSettings {
    enabled: Option<bool>,
    cadence_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRateLimitSettings {
    window_seconds: Option<u64>,
    max_requests: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn webhook_url(value: Option<String>, key: &'static str) -> Result<Option<String>, LoadError> {
    let Some(value) = non_blank(value) else {
        return Ok(None);
    };
    Url::parse(&value).map_err(|err| LoadError::invalid(key, format!("invalid URL: {err}")))?;
    Ok(Some(value))
}

fn non_zero_duration(seconds: u64, key: &'static str) -> Result<Duration, LoadError> {
    if seconds == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(seconds))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[cfg(test)]
mod tests;
