use std::path::PathBuf;

use moviebarcode_core::color::KMeansParams;
use moviebarcode_core::error::BarcodeError;
use moviebarcode_core::pipeline::config::BarcodeConfig;
use moviebarcode_core::pipeline::PipelineStage;

#[test]
fn test_defaults() {
    let config = BarcodeConfig::default();
    assert_eq!(config.output_width, 1280);
    assert_eq!(config.output_height, 480);
    assert_eq!(config.border_threshold, 10);
    assert_eq!(config.kmeans.clusters, 5);
    assert_eq!(config.kmeans.max_iterations, 200);
    assert_eq!(config.kmeans.attempts, 10);
    assert!((config.kmeans.epsilon - 0.1).abs() < 1e-6);
    assert_eq!(config.input, PathBuf::from("./"));
}

#[test]
fn test_toml_roundtrip() {
    let config = BarcodeConfig {
        input: PathBuf::from("movie.mkv"),
        output: PathBuf::from("barcode.png"),
        ..Default::default()
    };
    let text = toml::to_string_pretty(&config).unwrap();
    let parsed: BarcodeConfig = toml::from_str(&text).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_partial_toml_uses_defaults() {
    let parsed: BarcodeConfig = toml::from_str(
        r#"
        output_width = 640

        [kmeans]
        seed = 99
        "#,
    )
    .unwrap();
    assert_eq!(parsed.output_width, 640);
    assert_eq!(parsed.output_height, 480);
    assert_eq!(parsed.kmeans.seed, 99);
    assert_eq!(parsed.kmeans.clusters, KMeansParams::default().clusters);
}

#[test]
fn test_zero_width_rejected() {
    let config = BarcodeConfig {
        output_width: 0,
        ..Default::default()
    };
    assert!(matches!(config.validate(), Err(BarcodeError::Config(_))));
}

#[test]
fn test_sampler_settings_follow_config() {
    let config = BarcodeConfig {
        output_width: 300,
        border_threshold: 20,
        ..Default::default()
    };
    let settings = config.sampler_settings();
    assert_eq!(settings.output_width, 300);
    assert_eq!(settings.border_threshold, 20);
}

#[test]
fn test_stage_display() {
    assert_eq!(PipelineStage::Counting.to_string(), "Counting frames");
    assert_eq!(PipelineStage::Writing.to_string(), "Writing output");
}
