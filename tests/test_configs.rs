use rs_log_ng::configs::Settings;
use rs_log_ng::{LogError, LogLevel};
use figment::Jail;

#[test]
fn defaults_without_environment() {
    Jail::expect_with(|_jail| {
        let settings = Settings::from_env().expect("defaults load");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.min_level().unwrap(), LogLevel::Info);
        assert!(settings.plugin_names().is_empty());
        assert!(settings.search_path().is_none());
        Ok(())
    });
}

#[test]
fn log_prefixed_variables_override_defaults() {
    Jail::expect_with(|jail| {
        jail.set_env("LOG_PLUGINS", "sentry, heap,_utils");
        jail.set_env("LOG_PLUGINS_PATH", "/etc/log-plugins/");
        jail.set_env("LOG_LEVEL", "trace");
        jail.set_env("LOG_PRETTY", "true");
        jail.set_env("LOG_LABEL", "true");
        jail.set_env("LOG_ERROR_ENDPOINT", "https://errors.example.com/ingest");

        let settings = Settings::from_env().expect("env loads");
        assert_eq!(settings.plugin_names(), vec!["sentry", "heap"]);
        assert_eq!(settings.search_path(), Some("/etc/log-plugins".into()));
        assert_eq!(settings.min_level().unwrap(), LogLevel::Trace);
        assert!(settings.pretty);
        assert!(settings.label);
        assert!(!settings.force_level);
        assert_eq!(settings.error_endpoint.as_deref(), Some("https://errors.example.com/ingest"));
        Ok(())
    });
}

#[test]
fn sentry_dsn_is_a_fallback_endpoint() {
    Jail::expect_with(|jail| {
        jail.set_env("SENTRY_DSN", "https://key@sentry.example.com/1");
        let settings = Settings::from_env().expect("env loads");
        assert_eq!(settings.error_endpoint.as_deref(), Some("https://key@sentry.example.com/1"));

        jail.set_env("LOG_ERROR_ENDPOINT", "https://errors.example.com/ingest");
        let settings = Settings::from_env().expect("env loads");
        assert_eq!(settings.error_endpoint.as_deref(), Some("https://errors.example.com/ingest"));
        Ok(())
    });
}

#[test]
fn invalid_level_surfaces_on_use() {
    Jail::expect_with(|jail| {
        jail.set_env("LOG_LEVEL", "verbose");
        let settings = Settings::from_env().expect("env loads");
        assert!(matches!(settings.min_level(), Err(LogError::UnknownLevel(_))));
        Ok(())
    });
}

#[test]
fn local_file_is_merged_under_environment() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "logging.toml",
            r#"
                plugins = "heap"
                level = "warn"
                force_level = true
            "#,
        )?;
        jail.create_file("logging.json", r#"{ "plugins": "system", "pretty": true }"#)?;

        let toml = Settings::from_file("logging.toml").expect("toml loads");
        assert_eq!(toml.plugin_names(), vec!["heap"]);
        assert_eq!(toml.min_level().unwrap(), LogLevel::Warn);
        assert!(toml.force_level);

        jail.set_env("LOG_PLUGINS", "sentry");
        let json = Settings::from_file("logging.json").expect("json loads");
        assert_eq!(json.plugin_names(), vec!["sentry"]);
        assert!(json.pretty);
        Ok(())
    });
}

#[test]
fn missing_local_file_is_a_config_error() {
    Jail::expect_with(|_jail| {
        assert!(matches!(Settings::from_file("nope.json"), Err(LogError::ConfigError(_))));
        Ok(())
    });
}

#[test]
fn switches_accept_numeric_and_word_spellings() {
    Jail::expect_with(|jail| {
        jail.set_env("LOG_PRETTY", "1");
        jail.set_env("LOG_LABEL", "on");
        jail.set_env("LOG_FORCE_LEVEL", "0");

        let settings = Settings::from_env().expect("numeric switches load");
        assert!(settings.pretty);
        assert!(settings.label);
        assert!(!settings.force_level);

        jail.set_env("LOG_PRETTY", "maybe");
        assert!(matches!(Settings::from_env(), Err(LogError::ConfigError(_))));
        Ok(())
    });
}
