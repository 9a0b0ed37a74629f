// Tests for settings loading and defaults.
use mdtasks::config::Settings;
use std::fs;
use std::path::PathBuf;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mdtasks-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_defaults() {
    let settings = Settings::from_toml_str("").unwrap();
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.global_filter, "");
    assert!(!settings.remove_global_filter);
}

#[test]
fn test_parse_values() {
    let settings = Settings::from_toml_str(
        "global_filter = \"#task\"\nremove_global_filter = true\n",
    )
    .unwrap();
    assert_eq!(settings.global_filter, "#task");
    assert!(settings.remove_global_filter);
}

#[test]
fn test_missing_file_is_detected() {
    let path = scratch_dir("missing").join("nope.toml");
    let err = Settings::load(&path).unwrap_err();
    assert!(Settings::is_missing_config_error(&err));
    // An explicitly named file has to exist.
    assert!(Settings::load_or_default(Some(path.as_path())).is_err());
}

#[test]
fn test_broken_file_is_an_error() {
    let path = scratch_dir("broken").join("config.toml");
    fs::write(&path, "global_filter = [").unwrap();
    let err = Settings::load(&path).unwrap_err();
    assert!(!Settings::is_missing_config_error(&err));
    assert!(Settings::load_or_default(Some(path.as_path())).is_err());
    assert!(format!("{:#}", err).contains("Failed to parse config file"));
}

#[test]
fn test_load_from_disk() {
    let path = scratch_dir("load").join("config.toml");
    fs::write(&path, "global_filter = \"#todo\"\n").unwrap();
    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.global_filter, "#todo");
}
