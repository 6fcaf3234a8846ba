#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::process::Command;
use tempfile::tempdir;

mod common;

fn vault_cmd(db_path: &std::path::Path) -> Command {
    let mut cmd = Command::new(cargo_bin!("cardvault"));
    cmd.env("VAULT_MASTER_KEY", common::TEST_MASTER_KEY)
        .env("TPP_CLIENT_ID", common::TPP_CLIENT)
        .env_remove("VAULT_EVENTS_OUT")
        .arg("--db-path")
        .arg(db_path);
    cmd
}

#[test]
fn test_rocksdb_token_survives_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");
    let alerts_path = dir.path().join("alerts.csv");

    // 1. First run: tokenize
    let output1 = vault_cmd(&db_path)
        .args(["tokenize", "4111111111111111"])
        .output()
        .expect("Failed to execute command");
    assert!(output1.status.success());
    let body: serde_json::Value = serde_json::from_slice(&output1.stdout).unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    // 2. Second run: pay with the token from the first run
    let output2 = vault_cmd(&db_path)
        .arg("--alerts-out")
        .arg(&alerts_path)
        .args(["pay", "--token", &token, "--amount", "7500"])
        .args(["--client-id", common::TPP_CLIENT])
        .args(["--scope", "payments-api/payments.tpp"])
        .output()
        .expect("Failed to execute command");
    assert!(output2.status.success());
    let stdout2 = String::from_utf8_lossy(&output2.stdout);
    assert!(stdout2.contains(r#""account":"****1111""#));
    assert!(stdout2.contains(r#""status":"APPROVED""#));

    // The in-process consumer flagged the payment before exit
    let alerts = std::fs::read_to_string(&alerts_path).unwrap();
    assert!(alerts.contains(&token));
    assert!(alerts.contains("HIGH_AMOUNT"));
}

#[test]
fn test_rocksdb_different_key_cannot_detokenize() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    let output1 = vault_cmd(&db_path)
        .args(["tokenize", "5500000000000004"])
        .output()
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&output1.stdout).unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    let output2 = vault_cmd(&db_path)
        .env("VAULT_KEY_ID", "alias/other")
        .args(["pay", "--token", &token, "--amount", "10"])
        .args(["--client-id", common::TPP_CLIENT])
        .args(["--scope", "payments-api/payments.tpp"])
        .output()
        .unwrap();
    assert_eq!(output2.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output2.stdout).contains("internal error"));
}
