#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Runs the `setting-options` binary against a mock settings API.

use std::process::{Command, Output, Stdio};

use httpmock::prelude::*;
use serde_json::json;

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_setting-options"))
        .args(args)
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("failed to execute setting-options")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn help_lists_subcommands() {
    let output = run(&["--help"]);

    assert!(output.status.success());
    let text = stdout(&output);
    for command in ["groups", "list", "get", "set", "batch", "--config", "--print-config"] {
        assert!(text.contains(command), "help should mention {command}");
    }
}

#[test]
fn print_config_applies_base_url_override() {
    let output = run(&["--base-url", "https://shop.example.com", "--print-config"]);

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("https://shop.example.com"));
    assert!(text.contains("/wc-admin"));
}

#[test]
fn missing_config_file_fails() {
    let output = run(&["--config", "/definitely/not/here.yaml", "groups"]);
    assert!(!output.status.success());
}

#[test]
fn config_file_is_honored() {
    let server = MockServer::start();
    let groups = server.mock(|when, then| {
        when.method(GET).path("/wc/v3/settings");
        then.status(200)
            .json_body(json!([{ "id": "general", "label": "General", "sub_groups": [] }]));
    });
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.yaml");
    std::fs::write(&path, format!("api:\n  base_url: {}\n", server.base_url())).unwrap();

    let output = run(&["--config", path.to_str().unwrap(), "groups"]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    groups.assert_calls(1);
    assert_eq!(stdout(&output), "general\tGeneral\n");
}

#[test]
fn get_prints_json_value() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/wc-admin/settings/general/woocommerce_specific_allowed_countries");
        then.status(200).json_body(json!({
            "id": "woocommerce_specific_allowed_countries",
            "type": "multi_select_countries",
            "value": ["US", "CA"]
        }));
    });

    let output = run(&[
        "--base-url",
        &server.base_url(),
        "get",
        "general",
        "woocommerce_specific_allowed_countries",
    ]);

    assert!(output.status.success());
    assert_eq!(stdout(&output), "[\"US\",\"CA\"]\n");
}

#[test]
fn set_edits_then_saves() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/wc-admin/settings/general/woocommerce_store_city");
        then.status(200).json_body(json!({
            "id": "woocommerce_store_city",
            "value": "San Francisco"
        }));
    });
    let save = server.mock(|when, then| {
        when.method(PUT)
            .path("/wc-admin/settings/general/woocommerce_store_city")
            .json_body(json!({ "value": "Berlin" }));
        then.status(200).json_body(json!({
            "id": "woocommerce_store_city",
            "value": "Berlin"
        }));
    });

    let output = run(&[
        "--base-url",
        &server.base_url(),
        "set",
        "general",
        "woocommerce_store_city",
        "Berlin",
    ]);

    assert!(output.status.success());
    save.assert_calls(1);
    assert_eq!(stdout(&output), "woocommerce_store_city\t\"Berlin\"\n");
}

#[test]
fn batch_partial_failure_exits_non_zero() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/wc-admin/settings/general");
        then.status(200).json_body(json!([
            { "id": "woocommerce_store_city", "value": "San Francisco" },
            { "id": "woocommerce_currency", "value": "USD" }
        ]));
    });
    server.mock(|when, then| {
        when.method(POST).path("/wc-admin/settings/general/batch");
        then.status(200).json_body(json!({
            "update": [
                { "id": "woocommerce_store_city", "value": "Berlin" },
                {
                    "id": "woocommerce_currency",
                    "error": {
                        "code": "rest_setting_value_invalid",
                        "message": "An invalid setting value was passed."
                    }
                }
            ]
        }));
    });

    let output = run(&[
        "--base-url",
        &server.base_url(),
        "batch",
        "general",
        "woocommerce_store_city=Berlin",
        "woocommerce_currency=XYZ",
    ]);

    assert!(!output.status.success());
    let text = stdout(&output);
    assert!(text.contains(
        "woocommerce_currency\tfailed: An invalid setting value was passed. (rest_setting_value_invalid)"
    ));
    assert!(String::from_utf8_lossy(&output.stderr).contains("1 of 2 settings were rejected"));
}
