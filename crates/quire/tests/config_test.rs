use quire::QuireConfig;
use std::io::Write;
use std::time::Duration;

const VALID: &str = r#"
[openai]
api_key = "sk-test"
model = "gpt-4o-mini"
"#;

#[test]
fn test_overrides_win_over_bundled_defaults() {
    let config = QuireConfig::from_toml(
        r#"
[openai]
api_key = "sk-test"
temperature = 1.2

[generation.outline]
max_tokens = 1500
"#,
    )
    .unwrap();

    assert_eq!(config.openai.temperature, 1.2);
    assert_eq!(config.generation.outline.max_tokens, 1500);
    assert_eq!(config.generation.outline.temperature, 0.7);
    assert_eq!(config.openai.model, "gpt-3.5-turbo");
    config.validate().unwrap();
}

#[test]
fn test_missing_api_key_is_rejected() {
    let config = QuireConfig::from_toml("[openai]\napi_key = \"   \"").unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.message.contains("openai.api_key"));
}

#[test]
fn test_out_of_range_temperatures_are_rejected() {
    for (section, toml) in [
        ("openai", "[openai]\napi_key = \"k\"\ntemperature = 2.5"),
        ("generation.outline", "[openai]\napi_key = \"k\"\n[generation.outline]\ntemperature = -0.1"),
        ("generation.content", "[openai]\napi_key = \"k\"\n[generation.content]\ntemperature = 3.0"),
    ] {
        let err = QuireConfig::from_toml(toml).unwrap().validate().unwrap_err();
        assert!(err.message.contains(section), "{}", err.message);
        assert!(err.message.contains("temperature"));
    }
}

#[test]
fn test_zero_max_tokens_is_rejected() {
    let config =
        QuireConfig::from_toml("[openai]\napi_key = \"k\"\n[generation.content]\nmax_tokens = 0")
            .unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.message.contains("generation.content.max_tokens"));
}

#[test]
fn test_malformed_toml_is_a_config_error() {
    let err = QuireConfig::from_toml("[openai\napi_key = ").unwrap_err();
    assert!(err.message.contains("configuration"));
}

#[test]
fn test_client_config_carries_service_settings() {
    let config = QuireConfig::from_toml(VALID).unwrap();
    let client = config.openai_config().unwrap();

    assert_eq!(client.api_key(), "sk-test");
    assert_eq!(client.model(), "gpt-4o-mini");
    assert_eq!(client.api_base(), "https://api.openai.com/v1");
    assert_eq!(*client.max_tokens(), 2000);
    assert_eq!(*client.timeout(), Duration::from_secs(120));
}

#[test]
fn test_pipeline_config_maps_generation_sections() {
    let config = QuireConfig::from_toml(
        r#"
[openai]
api_key = "k"

[generation]
streaming = false
flush_interval_ms = 250

[generation.content]
temperature = 0.9
max_tokens = 3000
"#,
    )
    .unwrap();

    let pipeline = config.pipeline_config(None).unwrap();
    assert!(!pipeline.streaming());
    assert_eq!(*pipeline.flush_interval(), Duration::from_millis(250));
    assert_eq!(*pipeline.chapter().temperature(), 0.9);
    assert_eq!(*pipeline.chapter().max_tokens(), 3000);
    assert_eq!(*pipeline.outline().max_tokens(), 1000);

    assert!(config.pipeline_config(Some(true)).unwrap().streaming());
}

#[test]
fn test_explicit_file_is_loaded() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[openai]\napi_key = \"sk-file\"\n\n[database]\npath = \"story.db\"").unwrap();

    let config = QuireConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.openai.api_key, "sk-file");
    assert_eq!(config.database.path, "story.db");
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    assert!(QuireConfig::load(Some(&missing)).is_err());
}
