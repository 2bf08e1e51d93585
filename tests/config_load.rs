// Config and secrets files, and how missing credentials disable clients.
use labstock::config::{Config, GEMINI_API_KEY_ENV, Secrets};
use labstock::context::{AppContext, TestContext};
use labstock::controller::LabController;
use labstock::error::ConfigurationError;
use serial_test::serial;
use std::time::Duration;

const TEST_KEY: &str = include_str!("fixtures/test_service_account_key.pem");

fn clear_env() {
    // SAFETY: tests touching the environment are serialised.
    unsafe { std::env::remove_var(GEMINI_API_KEY_ENV) };
}

#[test]
fn test_missing_config_is_detected() {
    let ctx = TestContext::new();
    let err = Config::load(&ctx).unwrap_err();
    assert!(Config::is_missing_config_error(&err));
}

#[test]
fn test_broken_config_is_not_treated_as_missing() {
    let ctx = TestContext::new();
    std::fs::write(ctx.get_config_file_path().unwrap(), "spreadsheet = [unclosed").unwrap();
    let err = Config::load(&ctx).unwrap_err();
    assert!(!Config::is_missing_config_error(&err));
}

#[test]
fn test_defaults_fill_partial_config() {
    let ctx = TestContext::new();
    std::fs::write(
        ctx.get_config_file_path().unwrap(),
        "spreadsheet = \"https://docs.google.com/spreadsheets/d/abc/edit\"\n",
    )
    .unwrap();

    let cfg = Config::load(&ctx).unwrap();
    assert_eq!(cfg.worksheet, "Stock_In");
    assert_eq!(cfg.model, "gemini-2.0-flash");
    assert_eq!(cfg.extraction_delay(), Duration::from_secs(4));
    assert_eq!(cfg.confirm_pause(), Duration::from_secs(2));
    assert_eq!(cfg.capture_dir, None);
    assert_eq!(cfg.log_level, "info");
}

#[test]
fn test_save_then_load() {
    let ctx = TestContext::new();
    let cfg = Config {
        spreadsheet: "Lab Stock".to_string(),
        capture_dir: Some(ctx.root.join("camera")),
        extraction_delay_secs: 6,
        ..Config::default()
    };
    cfg.save(&ctx).unwrap();

    assert_eq!(Config::load(&ctx).unwrap(), cfg);
    assert!(!ctx.get_config_dir().unwrap().join("config.tmp").exists());
}

#[test]
#[serial]
fn test_missing_secrets_file_gives_empty_secrets() {
    clear_env();
    let ctx = TestContext::new();
    let secrets = Secrets::load(&ctx).unwrap();

    assert_eq!(secrets.api_key(), Err(ConfigurationError::MissingApiKey));
    assert!(matches!(
        secrets.service_account(),
        Err(ConfigurationError::MissingServiceAccount)
    ));
}

#[test]
#[serial]
fn test_secrets_file_with_service_account_table() {
    clear_env();
    let ctx = TestContext::new();
    let toml = format!(
        r#"GEMINI_API_KEY = "file-key"

[gcp_service_account]
type = "service_account"
project_id = "lab-inventory"
private_key_id = "kid"
private_key = """{}"""
client_email = "scanner@lab-inventory.iam.gserviceaccount.com"
"#,
        TEST_KEY
    );
    std::fs::write(ctx.get_secrets_file_path().unwrap(), toml).unwrap();

    let secrets = Secrets::load(&ctx).unwrap();
    assert_eq!(secrets.api_key(), Ok("file-key"));
    let account = secrets.service_account().unwrap();
    assert_eq!(account.key_type, "service_account");
    assert_eq!(account.token_uri, "https://oauth2.googleapis.com/token");
    assert!(account.private_key.contains("BEGIN PRIVATE KEY"));

    // Debug output never shows key material.
    let debug = format!("{:?}", secrets);
    assert!(!debug.contains("file-key"));
    assert!(!debug.contains("BEGIN PRIVATE KEY"));
}

#[test]
#[serial]
fn test_environment_overrides_file_key() {
    let ctx = TestContext::new();
    std::fs::write(
        ctx.get_secrets_file_path().unwrap(),
        "GEMINI_API_KEY = \"file-key\"\n",
    )
    .unwrap();

    // SAFETY: serialised with the other environment tests.
    unsafe { std::env::set_var(GEMINI_API_KEY_ENV, "env-key") };
    let secrets = Secrets::load(&ctx).unwrap();
    clear_env();

    assert_eq!(secrets.api_key(), Ok("env-key"));
}

#[test]
#[serial]
fn test_unreadable_secrets_is_a_configuration_error() {
    clear_env();
    let ctx = TestContext::new();
    std::fs::write(ctx.get_secrets_file_path().unwrap(), "GEMINI_API_KEY = ").unwrap();

    assert!(matches!(Secrets::load(&ctx), Err(ConfigurationError::Io(_))));
}

#[tokio::test]
async fn test_missing_credentials_disable_clients_without_crashing() {
    let controller = LabController::from_config(&Config::default(), &Secrets::default());

    assert!(controller.extractor().is_none());
    assert!(controller.store().is_none());
    assert_eq!(controller.startup_errors().len(), 2);
    assert!(controller.startup_errors()[0].contains("GEMINI_API_KEY"));
    assert!(controller.startup_errors()[1].contains("gcp_service_account"));
}

#[tokio::test]
async fn test_full_credentials_enable_both_clients() {
    let secrets: Secrets = toml::from_str(&format!(
        r#"GEMINI_API_KEY = "k"

[gcp_service_account]
private_key = """{}"""
client_email = "scanner@lab-inventory.iam.gserviceaccount.com"
"#,
        TEST_KEY
    ))
    .unwrap();

    let cfg = Config {
        spreadsheet: "Lab Stock".to_string(),
        extraction_delay_secs: 1,
        ..Config::default()
    };
    let controller = LabController::from_config(&cfg, &secrets);

    assert!(controller.startup_errors().is_empty());
    assert_eq!(controller.extractor().unwrap().model(), "gemini-2.0-flash");
    assert_eq!(
        controller.store().unwrap().client().worksheet_name(),
        "Stock_In"
    );
    assert_eq!(controller.extraction_delay(), Duration::from_secs(1));
}

#[tokio::test]
#[serial]
async fn test_malformed_secrets_are_reported_once_at_startup() {
    clear_env();
    let ctx = TestContext::new();
    std::fs::write(
        ctx.get_secrets_file_path().unwrap(),
        "GEMINI_API_KEY = \"k\"\n[gcp_service_account\n",
    )
    .unwrap();
    let cfg = Config {
        confirm_pause_secs: 5,
        ..Config::default()
    };

    let controller = LabController::from_context(&cfg, &ctx);

    let errors = controller.startup_errors();
    assert_eq!(errors.len(), 1, "{:?}", errors);
    assert!(errors[0].starts_with("Could not read secrets"));
    assert!(errors[0].contains("secrets.toml"));
    assert!(!errors[0].contains("Missing"));
    assert!(controller.extractor().is_none());
    assert!(controller.store().is_none());
    assert_eq!(controller.confirm_pause(), Duration::from_secs(5));
}

#[tokio::test]
#[serial]
async fn test_startup_reads_secrets_file_from_context() {
    clear_env();
    let ctx = TestContext::new();
    std::fs::write(ctx.get_secrets_file_path().unwrap(), "GEMINI_API_KEY = \"k\"\n").unwrap();

    let controller = LabController::from_context(&Config::default(), &ctx);

    assert!(controller.extractor().is_some());
    assert_eq!(controller.startup_errors().len(), 1);
    assert!(controller.startup_errors()[0].contains("gcp_service_account"));
}
