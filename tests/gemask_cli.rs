use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::{contains, is_empty};
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

const TEST_MODEL: &str = "gemini-pro";

fn scrub(cmd: &mut Command) {
    cmd.env_remove("GP_MODEL")
        .env_remove("GP_TEMPERATURE")
        .env_remove("GP_TOP_K")
        .env_remove("GP_TOP_P")
        .env_remove("GP_CANDIDATES")
        .env_remove("GP_MAX_OUTPUT_TOKENS")
        .env_remove("GP_TIMEOUT")
        .env_remove("GP_SAFETY")
        .env_remove("GP_CONFIG")
        .env_remove("GEMINI_API_KEY")
        .env_remove("XDG_CONFIG_HOME");
}

fn gemask_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("gemask"));
    scrub(&mut cmd);
    cmd
}

fn gempipe_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("gempipe"));
    scrub(&mut cmd);
    cmd
}

fn unique_temp_path(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("gemask-test-{label}-{nanos}"))
}

fn parse_stdout_json(output: &[u8]) -> Value {
    let text = String::from_utf8(output.to_vec()).expect("stdout should be utf-8");
    serde_json::from_str(text.trim()).expect("stdout should contain valid JSON")
}

fn write_fixture_png(path: &PathBuf) {
    image::DynamicImage::new_rgb8(2, 2)
        .save_with_format(path, image::ImageFormat::Png)
        .expect("fixture image should be writable");
}

#[test]
fn dry_run_succeeds_without_api_key() {
    let assert = gemask_cmd()
        .args(["--model", TEST_MODEL, "--dry-run", "2+2?"])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["dry_run"], Value::Bool(true));
    assert_eq!(body["model"], Value::String(TEST_MODEL.to_string()));
}

#[test]
fn dry_run_show_usage_prints_unavailable() {
    gemask_cmd()
        .args(["--model", TEST_MODEL, "--dry-run", "--show-usage", "2+2?"])
        .assert()
        .success()
        .stderr(contains("usage: unavailable (dry-run)"));
}

#[test]
fn missing_model_returns_explicit_error() {
    gemask_cmd()
        .arg("hello")
        .assert()
        .failure()
        .stderr(contains("No model provided. Use --model or set GP_MODEL."));
}

#[test]
fn invalid_temperature_from_env_returns_error() {
    gemask_cmd()
        .env("GP_TEMPERATURE", "abc")
        .args(["--model", TEST_MODEL, "--dry-run", "hello"])
        .assert()
        .failure()
        .stderr(contains("Invalid GP_TEMPERATURE 'abc'."));
}

#[test]
fn out_of_range_temperature_fails_before_any_network_use() {
    gemask_cmd()
        .args(["--model", TEST_MODEL, "--dry-run", "--temperature", "1.5", "hello"])
        .assert()
        .failure()
        .stderr(contains("invalid temperature: must be within 0.0..=1.0"));
}

#[test]
fn out_of_range_top_p_fails_validation() {
    gemask_cmd()
        .args(["--model", TEST_MODEL, "--dry-run", "--top-p", "1.5", "hello"])
        .assert()
        .failure()
        .stderr(contains("invalid top_p: must be within 0.0..=1.0"));
}

#[test]
fn invalid_safety_preset_returns_error() {
    gemask_cmd()
        .args(["--model", TEST_MODEL, "--dry-run", "--safety", "brutal", "hello"])
        .assert()
        .failure()
        .stderr(contains("unknown preset 'brutal'"));
}

#[test]
fn safety_preset_maps_every_category() {
    let assert = gemask_cmd()
        .args(["--model", TEST_MODEL, "--dry-run", "--safety", "high", "hello"])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    let settings = body["request"]["safetySettings"]
        .as_array()
        .expect("safetySettings should be an array");
    assert_eq!(settings.len(), 4);
    for setting in settings {
        assert_eq!(setting["threshold"], Value::String("BLOCK_ONLY_HIGH".to_string()));
    }
}

#[test]
fn argument_prompt_has_priority_over_stdin() {
    let assert = gemask_cmd()
        .args(["--model", TEST_MODEL, "--dry-run", "argument prompt"])
        .write_stdin("stdin prompt")
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    let parts = body["request"]["contents"][0]["parts"]
        .as_array()
        .expect("parts should be an array");
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0]["text"], Value::String("argument prompt".to_string()));
}

#[test]
fn stop_flags_populate_stop_sequences_in_order() {
    let assert = gemask_cmd()
        .args([
            "--model", TEST_MODEL, "--dry-run", "--stop", "END", "--stop", "DONE", "hello",
        ])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(
        body["request"]["generationConfig"]["stopSequences"],
        json!(["END", "DONE"])
    );
}

#[test]
fn sampling_flags_are_reflected_in_the_request() {
    let assert = gemask_cmd()
        .args([
            "--model",
            TEST_MODEL,
            "--dry-run",
            "--top-k",
            "40",
            "--top-p",
            "0.9",
            "--candidates",
            "2",
            "--max-output-tokens",
            "128",
            "hello",
        ])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    let config = &body["request"]["generationConfig"];
    assert_eq!(config["topK"], Value::from(40));
    assert_eq!(config["topP"], json!(0.9));
    assert_eq!(config["candidateCount"], Value::from(2));
    assert_eq!(config["maxOutputTokens"], Value::from(128));
}

#[test]
fn image_file_argument_becomes_inline_data() {
    let image_path = unique_temp_path("fixture").with_extension("png");
    write_fixture_png(&image_path);

    let assert = gemask_cmd()
        .args([
            "--model",
            TEST_MODEL,
            "--dry-run",
            image_path.to_string_lossy().as_ref(),
            "what is in this picture?",
        ])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    let parts = body["request"]["contents"][0]["parts"]
        .as_array()
        .expect("parts should be an array");
    assert_eq!(parts.len(), 2);
    assert_eq!(
        parts[0]["inlineData"]["mimeType"],
        Value::String("image/png".to_string())
    );
    assert_eq!(
        parts[1]["text"],
        Value::String("what is in this picture?".to_string())
    );
}

#[test]
fn nonexistent_file_argument_stays_literal_text() {
    let assert = gemask_cmd()
        .args(["--model", TEST_MODEL, "--dry-run", "/no/such/picture.png"])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(
        body["request"]["contents"][0]["parts"][0]["text"],
        Value::String("/no/such/picture.png".to_string())
    );
}

#[test]
fn json_flag_sets_json_output_mode() {
    let assert = gemask_cmd()
        .args(["--model", TEST_MODEL, "--dry-run", "--json", "hello"])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["output"], Value::String("json".to_string()));
}

#[test]
fn output_json_sets_json_output_mode() {
    let assert = gemask_cmd()
        .args(["--model", TEST_MODEL, "--dry-run", "--output", "json", "hello"])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["output"], Value::String("json".to_string()));
}

#[test]
fn json_flag_overrides_output_text() {
    let assert = gemask_cmd()
        .args([
            "--model", TEST_MODEL, "--dry-run", "--output", "text", "--json", "hello",
        ])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["output"], Value::String("json".to_string()));
}

#[test]
fn invalid_output_value_returns_error() {
    gemask_cmd()
        .args(["--model", TEST_MODEL, "--dry-run", "--output", "yaml", "hello"])
        .assert()
        .failure()
        .stderr(contains("Invalid --output 'yaml'. Supported values: text, json."));
}

#[test]
fn profile_loads_model_for_dry_run() {
    let config_path = unique_temp_path("config");
    fs::write(
        &config_path,
        "[profiles.gem]\nmodel = \"gemini-pro\"\nsafety = \"medium\"\n",
    )
    .expect("config should be writable");

    let assert = gemask_cmd()
        .env("GP_CONFIG", &config_path)
        .args(["--profile", "gem", "--dry-run", "hello"])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["model"], Value::String("gemini-pro".to_string()));
    let settings = body["request"]["safetySettings"]
        .as_array()
        .expect("safetySettings should be an array");
    assert_eq!(
        settings[0]["threshold"],
        Value::String("BLOCK_MEDIUM_AND_ABOVE".to_string())
    );
}

#[test]
fn profile_is_not_implicit_when_not_passed() {
    let config_path = unique_temp_path("config-no-implicit");
    fs::write(
        &config_path,
        "[profiles.default]\nmodel = \"gemini-pro\"\n",
    )
    .expect("config should be writable");

    gemask_cmd()
        .env("GP_CONFIG", &config_path)
        .arg("hello")
        .assert()
        .failure()
        .stderr(contains("No model provided. Use --model or set GP_MODEL."));
}

#[test]
fn profile_env_and_cli_precedence_is_respected() {
    let config_path = unique_temp_path("precedence");
    fs::write(
        &config_path,
        "[profiles.gem]\nmodel = \"profile-model\"\n",
    )
    .expect("config should be writable");

    let assert = gemask_cmd()
        .env("GP_CONFIG", &config_path)
        .env("GP_MODEL", "env-model")
        .args(["--profile", "gem", "--model", "cli-model", "--dry-run", "hello"])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["model"], Value::String("cli-model".to_string()));
}

#[test]
fn precedence_for_temperature_timeout_and_output_is_respected() {
    let config_path = unique_temp_path("precedence-more-options");
    fs::write(
        &config_path,
        "[profiles.gem]\nmodel = \"gemini-pro\"\ntemperature = 0.1\ntimeout = 7\noutput = \"json\"\n",
    )
    .expect("config should be writable");

    let env_over_profile = gemask_cmd()
        .env("GP_CONFIG", &config_path)
        .env("GP_TEMPERATURE", "0.6")
        .env("GP_TIMEOUT", "21")
        .args(["--profile", "gem", "--dry-run", "hello"])
        .assert()
        .success();

    let env_body = parse_stdout_json(&env_over_profile.get_output().stdout);
    assert_eq!(env_body["request"]["generationConfig"]["temperature"], json!(0.6));
    assert_eq!(env_body["timeout_secs"], Value::from(21));
    assert_eq!(env_body["output"], Value::String("json".to_string()));

    let cli_over_env = gemask_cmd()
        .env("GP_CONFIG", &config_path)
        .env("GP_TEMPERATURE", "0.6")
        .env("GP_TIMEOUT", "21")
        .args([
            "--profile",
            "gem",
            "--dry-run",
            "--temperature",
            "0.9",
            "--timeout",
            "33",
            "--output",
            "text",
            "hello",
        ])
        .assert()
        .success();

    let cli_body = parse_stdout_json(&cli_over_env.get_output().stdout);
    assert_eq!(cli_body["request"]["generationConfig"]["temperature"], json!(0.9));
    assert_eq!(cli_body["timeout_secs"], Value::from(33));
    assert_eq!(cli_body["output"], Value::String("text".to_string()));
}

#[test]
fn stop_sequence_string_in_profile_becomes_single_element_list() {
    let config_path = unique_temp_path("stop-string");
    fs::write(
        &config_path,
        "[profiles.gem]\nmodel = \"gemini-pro\"\nstop_sequences = \"END\"\n",
    )
    .expect("config should be writable");

    let assert = gemask_cmd()
        .env("GP_CONFIG", &config_path)
        .args(["--profile", "gem", "--dry-run", "hello"])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(
        body["request"]["generationConfig"]["stopSequences"],
        json!(["END"])
    );
}

#[test]
fn save_writes_and_overwrites_output_file() {
    let output_path = unique_temp_path("save-output");

    gemask_cmd()
        .args([
            "--model",
            TEST_MODEL,
            "--dry-run",
            "--save",
            output_path.to_string_lossy().as_ref(),
            "first",
        ])
        .assert()
        .success();

    let first = fs::read_to_string(&output_path).expect("first output file should exist");
    assert!(first.contains("\"text\":\"first\""));

    gemask_cmd()
        .args([
            "--model",
            TEST_MODEL,
            "--dry-run",
            "--save",
            output_path.to_string_lossy().as_ref(),
            "second",
        ])
        .assert()
        .success();

    let second = fs::read_to_string(&output_path).expect("second output file should exist");
    assert!(second.contains("\"text\":\"second\""));
    assert!(!second.contains("\"text\":\"first\""));
}

#[test]
fn save_with_invalid_parent_path_returns_explicit_error() {
    let parent_file = unique_temp_path("save-invalid-parent");
    fs::write(&parent_file, "not a directory").expect("parent marker file should be writable");
    let output_path = parent_file.join("out.json");

    gemask_cmd()
        .args([
            "--model",
            TEST_MODEL,
            "--dry-run",
            "--save",
            output_path.to_string_lossy().as_ref(),
            "hello",
        ])
        .assert()
        .failure()
        .stderr(contains("Failed to create output directory"));
}

#[test]
fn long_prompt_with_max_tokens_is_reflected_in_dry_run_request() {
    let prompt = "x".repeat(24_000);

    let assert = gemask_cmd()
        .args(["--model", TEST_MODEL, "--dry-run", "--max-output-tokens", "128"])
        .write_stdin(prompt.clone())
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(
        body["request"]["contents"][0]["parts"][0]["text"],
        Value::String(prompt)
    );
    assert_eq!(
        body["request"]["generationConfig"]["maxOutputTokens"],
        Value::from(128)
    );
}

#[test]
fn verbose_does_not_leak_api_key() {
    let secret = "gemini-secret-value";

    gemask_cmd()
        .env("GEMINI_API_KEY", secret)
        .args(["--model", TEST_MODEL, "--dry-run", "--verbose", "hello"])
        .assert()
        .success()
        .stderr(contains("api_key_present=true").and(contains(secret).not()));
}

#[test]
fn profile_file_missing_returns_explicit_error() {
    let config_path = unique_temp_path("missing-config");

    gemask_cmd()
        .env("GP_CONFIG", &config_path)
        .args(["--profile", "gem", "hello"])
        .assert()
        .failure()
        .stderr(contains("Failed to read config file"));
}

#[test]
fn invalid_profile_toml_returns_parse_error() {
    let config_path = unique_temp_path("invalid-toml");
    fs::write(&config_path, "[profiles.bad\nmodel = \"gemini-pro\"")
        .expect("config should be writable");

    gemask_cmd()
        .env("GP_CONFIG", &config_path)
        .args(["--profile", "bad", "hello"])
        .assert()
        .failure()
        .stderr(contains("Failed to parse config file"));
}

#[test]
fn profile_not_found_returns_error() {
    let config_path = unique_temp_path("profile-not-found");
    fs::write(&config_path, "[profiles.gem]\nmodel = \"gemini-pro\"\n")
        .expect("config should be writable");

    gemask_cmd()
        .env("GP_CONFIG", &config_path)
        .args(["--profile", "missing", "hello"])
        .assert()
        .failure()
        .stderr(contains("Profile 'missing' not found"));
}

#[test]
fn version_prints_build_metadata() {
    gemask_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(contains("commit:").and(contains("built:")));
}

#[test]
fn gempipe_ask_version_prints_metadata() {
    gempipe_cmd()
        .args(["ask", "--version"])
        .assert()
        .success()
        .stdout(contains("commit:").and(contains("built:")));
}

#[test]
fn gempipe_ask_dry_run_matches_gemask_output_shape() {
    let assert = gempipe_cmd()
        .args(["ask", "--model", TEST_MODEL, "--dry-run", "hello"])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["model"], Value::String(TEST_MODEL.to_string()));
    assert_eq!(body["output"], Value::String("text".to_string()));
}

#[test]
fn quiet_suppresses_show_usage_on_stderr() {
    gemask_cmd()
        .args([
            "--model", TEST_MODEL, "--dry-run", "--show-usage", "--quiet", "hello",
        ])
        .assert()
        .success()
        .stderr(is_empty());
}

#[test]
fn quiet_suppresses_verbose_logs_on_stderr() {
    gemask_cmd()
        .args([
            "--model", TEST_MODEL, "--dry-run", "--verbose", "--quiet", "hello",
        ])
        .assert()
        .success()
        .stderr(is_empty());
}

#[test]
fn quiet_keeps_fatal_errors_visible() {
    gemask_cmd()
        .args(["--quiet", "hello"])
        .assert()
        .failure()
        .stderr(contains("No model provided. Use --model or set GP_MODEL."));
}

#[test]
fn config_check_reports_ok() {
    let config_path = unique_temp_path("check-ok");
    fs::write(
        &config_path,
        "[profiles.gem]\nmodel = \"gemini-pro\"\nsafety = \"low\"\noutput = \"json\"\n",
    )
    .expect("config should be writable");

    gempipe_cmd()
        .env("GP_CONFIG", &config_path)
        .args(["config", "check"])
        .assert()
        .success()
        .stdout(contains("config OK:"));
}

#[test]
fn config_check_rejects_invalid_safety() {
    let config_path = unique_temp_path("check-bad-safety");
    fs::write(
        &config_path,
        "[profiles.bad]\nmodel = \"gemini-pro\"\nsafety = \"extreme\"\n",
    )
    .expect("config should be writable");

    gempipe_cmd()
        .env("GP_CONFIG", &config_path)
        .args(["config", "check"])
        .assert()
        .failure()
        .stderr(contains("Invalid profile safety 'extreme'"));
}

#[test]
fn config_check_rejects_invalid_output() {
    let config_path = unique_temp_path("check-bad-output");
    fs::write(
        &config_path,
        "[profiles.bad]\nmodel = \"gemini-pro\"\noutput = \"yaml\"\n",
    )
    .expect("config should be writable");

    gempipe_cmd()
        .env("GP_CONFIG", &config_path)
        .args(["config", "check"])
        .assert()
        .failure()
        .stderr(contains("Invalid profile output 'yaml'"));
}

#[test]
fn config_check_rejects_out_of_range_profile_temperature() {
    let config_path = unique_temp_path("check-bad-temperature");
    fs::write(
        &config_path,
        "[profiles.bad]\nmodel = \"gemini-pro\"\ntemperature = 1.8\n",
    )
    .expect("config should be writable");

    gempipe_cmd()
        .env("GP_CONFIG", &config_path)
        .args(["config", "check", "--profile", "bad"])
        .assert()
        .failure()
        .stderr(contains("invalid temperature"));
}

#[test]
fn config_check_unknown_profile_returns_error() {
    let config_path = unique_temp_path("check-unknown-profile");
    fs::write(&config_path, "[profiles.gem]\nmodel = \"gemini-pro\"\n")
        .expect("config should be writable");

    gempipe_cmd()
        .env("GP_CONFIG", &config_path)
        .args(["config", "check", "--profile", "missing"])
        .assert()
        .failure()
        .stderr(contains("Profile 'missing' not found"));
}

#[test]
fn gempipe_completion_bash_outputs_script() {
    gempipe_cmd()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(contains("_gempipe").and(contains("complete")));
}

#[test]
fn gempipe_completion_fish_outputs_script() {
    gempipe_cmd()
        .args(["completion", "fish"])
        .assert()
        .success()
        .stdout(contains("complete -c gempipe"));
}

#[test]
fn gempipe_help_mentions_completion_command() {
    gempipe_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("completion").and(contains("Generate shell completion script")));
}

#[test]
fn gempipe_ask_help_includes_examples() {
    gempipe_cmd()
        .args(["ask", "--help"])
        .assert()
        .success()
        .stdout(contains("Examples:").and(contains("--dry-run --json")));
}
