// tests/config.rs
use std::path::PathBuf;
use std::{env, fs};

use engblogs::config::ENV_CONFIG_PATH;
use engblogs::DigestConfig;

#[test]
fn json_and_toml_files_both_load() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("engblogs.toml");
    fs::write(
        &p_toml,
        r#"
opml_path = "feeds/engblogs.opml"
concurrency = 8
window_days = 3
"#,
    )
    .unwrap();
    let t = DigestConfig::load_from(&p_toml).unwrap();
    assert_eq!(t.opml_path, PathBuf::from("feeds/engblogs.opml"));
    assert_eq!(t.concurrency, 8);
    assert_eq!(t.window().num_days(), 3);

    let p_json = dir.path().join("engblogs.json");
    fs::write(&p_json, r#"{"concurrency": 0, "user_agent": "  "}"#).unwrap();
    let j = DigestConfig::load_from(&p_json).unwrap();
    assert_eq!(j.concurrency, 30);
    assert_eq!(j.user_agent, DigestConfig::default().user_agent);
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("engblogs.toml");
    fs::write(&p, "concurrency = \"many\"").unwrap();
    assert!(DigestConfig::load_from(&p).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Run in an empty directory so no real config/ is picked up.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_CONFIG_PATH);

    // 1) Nothing on disk: defaults.
    assert_eq!(DigestConfig::load_default().unwrap(), DigestConfig::default());

    // 2) ./config/engblogs.json, then TOML beside it takes precedence.
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("engblogs.json"), r#"{"window_days": 2}"#).unwrap();
    assert_eq!(DigestConfig::load_default().unwrap().window_days, 2);
    fs::write(cfg_dir.join("engblogs.toml"), "window_days = 5").unwrap();
    assert_eq!(DigestConfig::load_default().unwrap().window_days, 5);

    // 3) The env var wins over both.
    let p_env = tmp.path().join("custom.toml");
    fs::write(&p_env, "window_days = 9").unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    assert_eq!(DigestConfig::load_default().unwrap().window_days, 9);

    // 4) ...and must point at something real.
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
    assert!(DigestConfig::load_default().is_err());

    env::remove_var(ENV_CONFIG_PATH);
    env::set_current_dir(&old).unwrap();
}
