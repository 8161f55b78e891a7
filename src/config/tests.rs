use serial_test::serial;

use super::*;

fn raw_with_database() -> RawSettings {
    let mut raw = RawSettings::default();
    raw.database.url = Some("postgres://localhost/duodriven".to_string());
    raw
}

#[test]
fn defaults_resolve_with_only_a_database_url() {
    let settings = Settings::from_raw(raw_with_database()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert_eq!(settings.site.environment, AppEnvironment::Development);
    assert_eq!(settings.site.public_url, DEFAULT_PUBLIC_URL);
    assert!(settings.api.key.is_none());
    assert!(settings.integrations.chat_webhook_url.is_none());
    assert_eq!(settings.integrations.chat_timeout, Duration::from_secs(60));
    assert_eq!(settings.integrations.contact_timeout, Duration::from_secs(10));
    assert!(settings.scheduler.enabled);
    assert_eq!(settings.scheduler.cadence, Duration::from_secs(60));
}

#[test]
fn missing_database_url_is_rejected() {
    let err = Settings::from_raw(RawSettings::default()).expect_err("database url required");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "database.url",
            ..
        }
    ));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = raw_with_database();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = raw_with_database();
    raw.logging.format = Some("compact".to_string());
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn unknown_log_format_is_rejected() {
    let mut raw = raw_with_database();
    raw.logging.format = Some("pretty".to_string());
    let err = Settings::from_raw(raw).expect_err("unknown format");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "logging.format",
            ..
        }
    ));
}

#[test]
fn production_requires_api_key_and_secret() {
    let mut raw = raw_with_database();
    raw.site.environment = Some("production".to_string());
    raw.site.secret_key = Some("s3cret".to_string());
    let err = Settings::from_raw(raw.clone()).expect_err("api key required");
    assert!(matches!(err, LoadError::Invalid { key: "api.key", .. }));

    raw.api.key = Some("   ".to_string());
    let err = Settings::from_raw(raw.clone()).expect_err("blank api key rejected");
    assert!(matches!(err, LoadError::Invalid { key: "api.key", .. }));

    raw.api.key = Some("k".to_string());
    raw.site.secret_key = None;
    let err = Settings::from_raw(raw.clone()).expect_err("secret required");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "site.secret_key",
            ..
        }
    ));

    raw.site.secret_key = Some("s3cret".to_string());
    let settings = Settings::from_raw(raw).expect("valid production settings");
    assert_eq!(settings.site.environment, AppEnvironment::Production);
}

#[test]
fn zero_values_are_rejected() {
    let mut raw = raw_with_database();
    raw.rate_limit.max_requests = Some(0);
    let err = Settings::from_raw(raw).expect_err("zero max requests");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "rate_limit.max_requests",
            ..
        }
    ));

    let mut raw = raw_with_database();
    raw.scheduler.cadence_seconds = Some(0);
    let err = Settings::from_raw(raw).expect_err("zero cadence");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "scheduler.cadence_seconds",
            ..
        }
    ));
}

#[test]
fn blank_webhook_urls_mean_unconfigured() {
    let mut raw = raw_with_database();
    raw.integrations.chat_webhook_url = Some("  ".to_string());
    raw.integrations.contact_webhook_url = Some("https://hooks.example.com/contact".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(settings.integrations.chat_webhook_url.is_none());
    assert_eq!(
        settings.integrations.contact_webhook_url.as_deref(),
        Some("https://hooks.example.com/contact")
    );
}

#[test]
fn malformed_webhook_url_is_rejected() {
    let mut raw = raw_with_database();
    raw.integrations.chat_webhook_url = Some("not a url".to_string());
    let err = Settings::from_raw(raw).expect_err("invalid url");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "integrations.chat_webhook_url",
            ..
        }
    ));
}

#[test]
fn legacy_aliases_map_onto_structured_keys() {
    let overrides = legacy_env_overrides(|name| match name {
        "DUODRIVEN_API_KEY" => Some("key-123".to_string()),
        "N8N_WEBHOOK_URL" => Some("https://n8n.example.com/chat".to_string()),
        "SECRET_KEY" => Some(String::new()),
        _ => None,
    });

    assert_eq!(overrides.get("API__KEY").map(String::as_str), Some("key-123"));
    assert_eq!(
        overrides
            .get("INTEGRATIONS__CHAT_WEBHOOK_URL")
            .map(String::as_str),
        Some("https://n8n.example.com/chat")
    );
    assert!(!overrides.contains_key("SITE__SECRET_KEY"));
    assert_eq!(overrides.len(), 2);
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["duodriven"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_publish_scheduled_arguments() {
    let args = CliArgs::parse_from([
        "duodriven",
        "publish-scheduled",
        "--database-url",
        "postgres://example",
    ]);

    match args.command.expect("publish-scheduled command") {
        Command::PublishScheduled(database) => {
            assert_eq!(database.database_url.as_deref(), Some("postgres://example"));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "duodriven",
        "serve",
        "--server-port",
        "9000",
        "--log-json",
        "yes",
        "--scheduler-enabled",
        "false",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_port, Some(9000));
            assert_eq!(serve.overrides.log_json, Some(true));
            assert_eq!(serve.overrides.scheduler_enabled, Some(false));
        }
        _ => panic!("wrong command parsed"),
    }
}

const ENV_VARS: &[&str] = &[
    "DATABASE_URL",
    "DUODRIVEN_API_KEY",
    "APP_ENV",
    "SECRET_KEY",
    "N8N_WEBHOOK_URL",
    "CONTACT_WEBHOOK_URL",
    "DUODRIVEN__API__KEY",
    "DUODRIVEN__DATABASE__URL",
    "DUODRIVEN__SERVER__PORT",
];

fn clear_env() {
    for name in ENV_VARS {
        // SAFETY: every test touching the environment is `#[serial]`.
        unsafe { std::env::remove_var(name) };
    }
}

fn set_env(name: &str, value: &str) {
    // SAFETY: every test touching the environment is `#[serial]`.
    unsafe { std::env::set_var(name, value) };
}

#[test]
#[serial]
fn load_reads_legacy_variable_names() {
    clear_env();
    set_env("DATABASE_URL", "postgres://legacy/duodriven");
    set_env("DUODRIVEN_API_KEY", "legacy-key");
    set_env("APP_ENV", "testing");

    let settings = load(&CliArgs::parse_from(["duodriven"])).expect("settings load");
    clear_env();

    assert_eq!(settings.database.url, "postgres://legacy/duodriven");
    assert_eq!(settings.api.key.as_deref(), Some("legacy-key"));
    assert_eq!(settings.site.environment, AppEnvironment::Testing);
}

#[test]
#[serial]
fn structured_variables_win_over_legacy_names() {
    clear_env();
    set_env("DATABASE_URL", "postgres://legacy/duodriven");
    set_env("DUODRIVEN_API_KEY", "legacy-key");
    set_env("DUODRIVEN__API__KEY", "structured-key");
    set_env("DUODRIVEN__SERVER__PORT", "8123");

    let settings = load(&CliArgs::parse_from(["duodriven"])).expect("settings load");
    clear_env();

    assert_eq!(settings.api.key.as_deref(), Some("structured-key"));
    assert_eq!(settings.server.addr.port(), 8123);
}

#[test]
#[serial]
fn cli_database_url_wins_over_environment() {
    clear_env();
    set_env("DUODRIVEN__DATABASE__URL", "postgres://env/duodriven");

    let args = CliArgs::parse_from(["duodriven", "migrate", "--database-url", "postgres://cli/db"]);
    let settings = load(&args).expect("settings load");
    clear_env();

    assert_eq!(settings.database.url, "postgres://cli/db");
}
