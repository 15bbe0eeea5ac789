use headerguard::config::AppConfig;
use headerguard::detector::AlertThreshold;
use headerguard::engine::Engine;
use headerguard::error::Error;

const FULL_TOML: &str = r#"
[scan]
threshold = "low"
disabled = ["server-version", "x-debug-token"]

[[matchers.application_errors]]
id = "acme-error-code"
kind = "regex"
pattern = "ACME-ERR-[0-9]{4}"

[[matchers.application_errors]]
id = "acme-panic"
kind = "literal"
pattern = "ACME PANIC"

[versions]
Apache = "2.4.62"
php = "8.3.0"

[messages]
"x_powered_by.name" = "X-Powered-By present"
"#;

#[test]
fn default_template_is_valid() {
    let content = include_str!("../templates/headerguard.toml");
    let config = AppConfig::from_toml(content)
        .unwrap_or_else(|e| panic!("default template failed to parse: {}", e));
    assert_eq!(config.scan.threshold, AlertThreshold::Medium);
    assert!(config.scan.disabled.is_empty());
    assert!(config.versions.is_empty());
    config.build_context().unwrap();
}

#[test]
fn init_template_loads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("headerguard.toml");
    std::fs::write(&path, include_str!("../templates/headerguard.toml")).unwrap();

    let config = AppConfig::load_from_path(&path)
        .unwrap_or_else(|e| panic!("written template failed to load: {}", e));
    Engine::from_config(&config).unwrap();
}

#[test]
fn load_full_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("headerguard.toml");
    std::fs::write(&path, FULL_TOML).unwrap();

    let config = AppConfig::load_from_path(&path).unwrap();
    assert_eq!(config.scan.threshold, AlertThreshold::Low);
    assert_eq!(config.scan.disabled, vec!["server-version", "x-debug-token"]);
    assert_eq!(config.matchers.application_errors.as_ref().unwrap().len(), 2);
    assert!(config.matchers.directory_listings.is_none());
    assert_eq!(config.versions.len(), 2);
}

#[test]
fn engine_from_config_applies_every_section() {
    let config = AppConfig::from_toml(FULL_TOML).unwrap();
    let engine = Engine::from_config(&config).unwrap();

    assert!(engine.registry().get("server-version").is_none());
    assert!(engine.registry().get("x-debug-token").is_none());
    assert!(engine.registry().get("csp").is_some());

    let ctx = engine.context();
    assert_eq!(ctx.threshold, AlertThreshold::Low);
    assert_eq!(
        ctx.application_errors.rule_ids().collect::<Vec<_>>(),
        vec!["acme-error-code", "acme-panic"]
    );
    assert!(!ctx.directory_listings.is_empty());
    assert_eq!(ctx.latest_versions.get("apache").map(String::as_str), Some("2.4.62"));
    assert_eq!(ctx.messages.get("x_powered_by.name"), "X-Powered-By present");
}

#[test]
fn env_var_substitution_in_file() {
    std::env::set_var("HEADERGUARD_IT_NGINX_LATEST", "1.27.0");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("headerguard.toml");
    std::fs::write(&path, "[versions]\nnginx = \"${HEADERGUARD_IT_NGINX_LATEST}\"\n").unwrap();

    let config = AppConfig::load_from_path(&path).unwrap();
    assert_eq!(config.versions.get("nginx").map(String::as_str), Some("1.27.0"));
}

#[test]
fn unset_env_var_fails_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("headerguard.toml");
    std::fs::write(&path, "[versions]\nnginx = \"${HEADERGUARD_IT_NEVER_SET}\"\n").unwrap();

    let err = AppConfig::load_from_path(&path).unwrap_err();
    assert!(matches!(err, Error::ConfigEnvVar(_)));
}

#[test]
fn bad_regex_fails_engine_construction() {
    let config = AppConfig::from_toml(
        r#"
[[matchers.directory_listings]]
id = "broken-listing"
kind = "regex"
pattern = "<title>Index of ("
"#,
    )
    .unwrap();
    let err = Engine::from_config(&config).unwrap_err();
    assert!(err.to_string().contains("broken-listing"));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = AppConfig::from_toml("[scan\nthreshold = ").unwrap_err();
    assert!(matches!(err, Error::ConfigParse(_)));
}

#[test]
fn unknown_threshold_is_rejected() {
    assert!(AppConfig::from_toml("[scan]\nthreshold = \"paranoid\"\n").is_err());
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AppConfig::load_from_path(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
