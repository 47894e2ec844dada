use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn installer(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_nsx-installer"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("spawn nsx-installer")
}

#[test]
fn test_reset_commands_write_both_files() {
    let dir = tempfile::tempdir().unwrap();

    let defaults = installer(dir.path(), &["reset-defaults"]);
    let config = installer(dir.path(), &["reset-config"]);

    assert!(defaults.status.success());
    assert!(config.status.success());
    assert!(dir.path().join("nsx-defaults.toml").is_file());
    assert!(dir.path().join("nsx-config.toml").is_file());
    assert!(dir.path().join("nsx-install.log").is_file());
}

#[test]
fn test_run_with_blank_config_exits_with_config_error() {
    let dir = tempfile::tempdir().unwrap();
    installer(dir.path(), &["reset-defaults"]);
    installer(dir.path(), &["reset-config"]);

    let run = installer(dir.path(), &["run"]);

    assert_eq!(run.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&run.stderr);
    assert!(stderr.contains("nsx_manager.mgmt_ip"), "{}", stderr);
}

#[test]
fn test_render_writes_merged_json() {
    let dir = tempfile::tempdir().unwrap();
    installer(dir.path(), &["reset-defaults"]);
    fs::write(
        dir.path().join("lab.toml"),
        r#"
[nsx_manager]
mgmt_ip = "192.168.1.10"
password = "myPassword1!myPassword1!"
license_key = "AAAAA-BBBBB-CCCCC-DDDDD-EEEEE"
"#,
    )
    .unwrap();

    let render = installer(
        dir.path(),
        &["render", "--config", "lab.toml", "--output", "resolved.json"],
    );

    assert!(render.status.success(), "{}", String::from_utf8_lossy(&render.stderr));
    let json = fs::read_to_string(dir.path().join("resolved.json")).unwrap();
    assert!(json.contains("\"mgmt_ip\": \"192.168.1.10\""));
    assert!(json.contains("\"validate_certs\": false"));
}

#[test]
fn test_log_file_is_appended_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    installer(dir.path(), &["reset-defaults", "--log-file", "custom.log"]);
    let first = fs::read_to_string(dir.path().join("custom.log")).unwrap();

    installer(dir.path(), &["reset-defaults", "--log-file", "custom.log"]);
    let second = fs::read_to_string(dir.path().join("custom.log")).unwrap();

    assert!(second.starts_with(&first));
    assert!(second.len() > first.len());
}
