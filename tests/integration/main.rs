//! Integration tests for Shipgen

mod service;

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use chrono::{Duration, Utc};
    use predicates::prelude::*;
    use serde_json::Value;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Binary with config, state and home redirected into `home`, and no
    /// API key in the environment
    fn shipgen(home: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("shipgen");
        cmd.env("HOME", home)
            .env("XDG_CONFIG_HOME", home.join("config"))
            .env("XDG_STATE_HOME", home.join("state"))
            .env("SHIPGEN_CONFIG", home.join("config").join("shipgen.toml"))
            .env_remove("GEMINI_API_KEY")
            .env_remove("API_KEY")
            .env_remove("CI");
        cmd
    }

    fn quota_flag_path(home: &Path) -> PathBuf {
        home.join("state").join("shipgen").join("quota.json")
    }

    fn write_active_flag(home: &Path) {
        let path = quota_flag_path(home);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let now = Utc::now();
        let flag = serde_json::json!({
            "suspended_at": now,
            "until": now + Duration::hours(12),
            "reason": "RESOURCE_EXHAUSTED",
        });
        std::fs::write(&path, flag.to_string()).unwrap();
    }

    fn stdout_json(cmd: &mut Command) -> Value {
        let output = cmd.assert().success().get_output().stdout.clone();
        serde_json::from_slice(&output).unwrap()
    }

    #[test]
    fn help_displays() {
        let home = TempDir::new().unwrap();
        shipgen(home.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("starship concept art"));
    }

    #[test]
    fn version_displays() {
        let home = TempDir::new().unwrap();
        shipgen(home.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("shipgen"));
    }

    #[test]
    fn prompt_for_default_ship() {
        let home = TempDir::new().unwrap();
        shipgen(home.path())
            .args(["prompt", "--turrets", "3"])
            .assert()
            .success()
            .stdout(predicate::str::contains("3 visible turrets"))
            .stdout(predicate::str::contains("Only one vessel in its environment."));
    }

    #[test]
    fn prompt_for_horde_has_no_turrets() {
        let home = TempDir::new().unwrap();
        shipgen(home.path())
            .args(["prompt", "--faction", "horde", "--purpose", "civilian"])
            .assert()
            .success()
            .stdout(predicate::str::contains("organic weapon pods"))
            .stdout(predicate::str::contains("visible turrets").not());
    }

    #[test]
    fn prompt_json() {
        let home = TempDir::new().unwrap();
        let value = stdout_json(shipgen(home.path()).args([
            "prompt",
            "--faction",
            "kovarol",
            "--class",
            "11",
            "--format",
            "json",
        ]));

        assert_eq!(value["request"]["aspect_ratio"], "16:9");
        assert_eq!(value["ship"]["faction"], "kovarol");
        // Kovarol hulls stop at class 5
        assert_eq!(value["ship"]["size_index"], 4);
        assert_eq!(value["ship"]["origin"], "Kovarol");
        assert_eq!(value["fingerprint"].as_str().unwrap().len(), 32);
    }

    #[test]
    fn unknown_faction_is_rejected() {
        let home = TempDir::new().unwrap();
        shipgen(home.path())
            .args(["prompt", "--faction", "rebels"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("rebels"));
    }

    #[test]
    fn generate_without_key_uses_placeholder() {
        let home = TempDir::new().unwrap();
        let value = stdout_json(shipgen(home.path()).args(["generate", "--format", "json"]));

        assert_eq!(value["image"]["image"]["kind"], "url");
        assert!(value["image"]["image"]["value"]
            .as_str()
            .unwrap()
            .starts_with("https://placehold.co/"));
        assert_eq!(value["image"]["origin"]["source"], "fallback");
        assert_eq!(value["image"]["origin"]["reason"], "missing_credentials");
        assert_eq!(value["file_name"], "LEVIATHAN-IX_empire_class1.png");
    }

    #[test]
    fn generate_placeholder_is_deterministic() {
        let home = TempDir::new().unwrap();
        let args = ["generate", "--name", "ECHO", "--format", "json"];
        let first = stdout_json(shipgen(home.path()).args(args));
        let second = stdout_json(shipgen(home.path()).args(args));
        assert_eq!(first["image"], second["image"]);
    }

    #[test]
    fn generate_output_skips_url_images() {
        let home = TempDir::new().unwrap();
        let target = home.path().join("ship.png");
        shipgen(home.path())
            .args(["generate", "-o"])
            .arg(&target)
            .assert()
            .success()
            .stdout(predicate::str::contains("nothing was written"));
        assert!(!target.exists());
    }

    #[test]
    fn persisted_suspension_skips_the_api() {
        let home = TempDir::new().unwrap();
        write_active_flag(home.path());

        // a key is present, but the suspension must keep us off the network
        let value = stdout_json(
            shipgen(home.path())
                .env("GEMINI_API_KEY", "test-key")
                .args(["generate", "--format", "json"]),
        );
        assert_eq!(value["image"]["origin"]["reason"], "quota_suspended");
    }

    #[test]
    fn quota_status_and_clear() {
        let home = TempDir::new().unwrap();
        shipgen(home.path())
            .args(["quota", "status"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Available"));

        write_active_flag(home.path());
        let value = stdout_json(shipgen(home.path()).args(["quota", "status", "--format", "json"]));
        assert_eq!(value["suspended"], true);
        assert_eq!(value["flag"]["reason"], "RESOURCE_EXHAUSTED");

        shipgen(home.path())
            .args(["quota", "clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("cleared"));
        assert!(!quota_flag_path(home.path()).exists());
    }

    #[test]
    fn quota_clear_without_suspension() {
        let home = TempDir::new().unwrap();
        shipgen(home.path())
            .args(["quota", "clear"])
            .assert()
            .success()
            .stdout(predicate::str::contains("not suspended"));
    }

    #[test]
    fn expired_flag_is_ignored() {
        let home = TempDir::new().unwrap();
        let path = quota_flag_path(home.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let past = Utc::now() - Duration::hours(48);
        let flag = serde_json::json!({
            "suspended_at": past,
            "until": past + Duration::hours(24),
            "reason": "quota",
        });
        std::fs::write(&path, flag.to_string()).unwrap();

        let value = stdout_json(shipgen(home.path()).args(["quota", "status", "--format", "json"]));
        assert_eq!(value["suspended"], false);
        assert!(!path.exists());
    }

    #[test]
    fn catalog_lists_factions() {
        let home = TempDir::new().unwrap();
        shipgen(home.path())
            .arg("catalog")
            .assert()
            .success()
            .stdout(predicate::str::contains("Construction Cartel"))
            .stdout(predicate::str::contains("Heavy light transport"));
    }

    #[test]
    fn catalog_single_faction_json() {
        let home = TempDir::new().unwrap();
        let value = stdout_json(shipgen(home.path()).args([
            "catalog",
            "--faction",
            "pjsc-empire",
            "--format",
            "json",
        ]));
        assert_eq!(value["factions"].as_array().unwrap().len(), 1);
        assert_eq!(value["factions"][0]["purpose"], "civilian");
    }

    #[test]
    fn batch_resolves_every_ship() {
        let home = TempDir::new().unwrap();
        let fleet = home.path().join("fleet.toml");
        std::fs::write(
            &fleet,
            r#"
            [[ship]]
            name = "ALPHA"
            faction = "empire"
            purpose = "military"
            size_index = 2

            [[ship]]
            name = "ALPHA"
            faction = "empire"
            purpose = "military"
            size_index = 2

            [[ship]]
            name = "HIVE"
            faction = "horde"
            purpose = "military"
            size_index = 6
            "#,
        )
        .unwrap();

        let value = stdout_json(
            shipgen(home.path())
                .args(["batch", "--format", "json"])
                .arg(&fleet),
        );
        let results = value["results"].as_array().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0]["image"], results[1]["image"]);
        assert_eq!(value["stats"]["dispatched"], 0);
        assert_eq!(
            value["stats"]["fallbacks"].as_u64().unwrap()
                + value["stats"]["cache_hits"].as_u64().unwrap(),
            3
        );
    }

    #[test]
    fn batch_rejects_empty_file() {
        let home = TempDir::new().unwrap();
        let fleet = home.path().join("fleet.toml");
        std::fs::write(&fleet, "").unwrap();
        shipgen(home.path())
            .arg("batch")
            .arg(&fleet)
            .assert()
            .failure()
            .stderr(predicate::str::contains("No [[ship]] entries"));
    }

    #[test]
    fn config_path() {
        let home = TempDir::new().unwrap();
        shipgen(home.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("shipgen.toml"));
    }

    #[test]
    fn config_show() {
        let home = TempDir::new().unwrap();
        shipgen(home.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[queue]"))
            .stdout(predicate::str::contains("min_interval_ms = 4100"));
    }

    #[test]
    fn config_set_then_show() {
        let home = TempDir::new().unwrap();
        shipgen(home.path())
            .args(["config", "set", "queue.min_interval_ms", "5000"])
            .assert()
            .success();
        shipgen(home.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("min_interval_ms = 5000"));
    }

    #[test]
    fn config_set_unknown_key_fails() {
        let home = TempDir::new().unwrap();
        shipgen(home.path())
            .args(["config", "set", "vm.name", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn invalid_config_shows_hint() {
        let home = TempDir::new().unwrap();
        let config = home.path().join("config").join("shipgen.toml");
        std::fs::create_dir_all(config.parent().unwrap()).unwrap();
        std::fs::write(&config, "[queue\nmin_interval_ms = ").unwrap();

        shipgen(home.path())
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn status_reports_missing_key() {
        let home = TempDir::new().unwrap();
        shipgen(home.path())
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("No API key"));
    }
}
