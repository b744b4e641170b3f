//! Configuration files: loading, saving and merging with command-line values.

use std::fs;

use doc2md::{ConversionConfig, ErrorKind, LogLevel, TableStyle};
use tempfile::TempDir;

#[test]
fn test_save_and_load_keeps_persistent_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/doc2md.yaml");

    let config = ConversionConfig::new()
        .with_input("ignored.docx")
        .with_heading_offset(2)
        .with_table_style(TableStyle::Compact)
        .with_encoding("shift_jis")
        .with_metadata(true);
    config.save(&path).unwrap();

    let loaded = ConversionConfig::load(&path).unwrap();
    assert_eq!(loaded.heading_offset, 2);
    assert_eq!(loaded.table_style, TableStyle::Compact);
    assert_eq!(loaded.output_encoding, "shift_jis");
    assert!(loaded.include_metadata);
    assert_eq!(loaded.input_path, None);
    assert_eq!(loaded.config_file, Some(path));
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.yaml");
    fs::write(&path, "table_style: grid\nlog_level: warning\nunknown_key: 5\n").unwrap();

    let loaded = ConversionConfig::load(&path).unwrap();
    assert_eq!(loaded.table_style, TableStyle::Grid);
    assert_eq!(loaded.log_level, LogLevel::Warning);
    assert_eq!(loaded.heading_offset, 0);
    assert!(loaded.extract_images);
}

#[test]
fn test_empty_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.yaml");
    fs::write(&path, "").unwrap();

    let loaded = ConversionConfig::load(&path).unwrap();
    assert_eq!(
        loaded,
        ConversionConfig {
            config_file: Some(path),
            ..ConversionConfig::default()
        }
    );
}

#[test]
fn test_missing_and_malformed_files() {
    let dir = TempDir::new().unwrap();
    let err = ConversionConfig::load(dir.path().join("absent.yaml")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);

    let path = dir.path().join("list.yaml");
    fs::write(&path, "- a\n- b\n").unwrap();
    assert!(ConversionConfig::load(&path).is_err());
}

#[test]
fn test_sample_config_loads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sample.yaml");
    ConversionConfig::write_sample(&path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with('#'));
    let loaded = ConversionConfig::load(&path).unwrap();
    assert_eq!(loaded.heading_offset, ConversionConfig::default().heading_offset);
    assert_eq!(loaded.max_file_size_mb, 100);
}

#[test]
fn test_merge_prefers_non_default_cli_values() {
    let file = ConversionConfig::new()
        .with_heading_offset(3)
        .with_table_style(TableStyle::Grid)
        .with_metadata(true);
    let cli = ConversionConfig::new()
        .with_input("a.docx")
        .with_heading_offset(1);

    let merged = ConversionConfig::merge(Some(&file), &cli);
    assert_eq!(merged.heading_offset, 1);
    assert_eq!(merged.table_style, TableStyle::Grid);
    assert!(merged.include_metadata);
    assert_eq!(merged.input_path, cli.input_path);

    assert_eq!(ConversionConfig::merge(None, &cli), cli);
}
