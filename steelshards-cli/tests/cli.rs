use assert_cmd::Command;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn steelshards() -> Command {
    let mut cmd = Command::cargo_bin("steelshards").unwrap();
    cmd.env_remove("STEELSHARDS_INPUTS").env_remove("STEELSHARDS_SOLC");
    cmd
}

fn project(config: serde_json::Value) -> TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("steelshards.json"), config.to_string()).unwrap();
    fs::create_dir_all(dir.path().join("contracts")).unwrap();
    fs::write(dir.path().join("contracts/Store.sol"), "contract Store {}\n").unwrap();
    dir
}

/// Install a shell script that ignores its input and prints `output`.
#[cfg(unix)]
fn fake_solc(dir: &Path, output: &serde_json::Value) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("fake-solc");
    fs::write(
        &path,
        format!("#!/bin/sh\ncat > /dev/null\ncat <<'JSON'\n{output}\nJSON\n"),
    )
    .unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[test]
fn list_networks() {
    let dir = project(json!({
        "networks": [
            { "name": "local", "networkID": 1337, "rpc": "http://localhost:8545",
              "wallet": { "displayName": "dev", "privateKey": "0x01" } },
            { "name": "sepolia", "networkID": 11155111, "rpc": "https://rpc.sepolia.org" }
        ]
    }));
    let output = steelshards()
        .current_dir(dir.path())
        .arg("networks")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).unwrap();
    assert!(stdout.contains("1. local (id 1337) http://localhost:8545/"));
    assert!(stdout.contains("wallet: dev"));
    assert!(stdout.contains("2. sepolia (id 11155111)"));
    assert!(!stdout.contains("0x01"));
}

#[test]
fn missing_config() {
    let dir = tempdir().unwrap();
    let output = steelshards()
        .arg("build")
        .arg("-c")
        .arg(dir.path().join("steelshards.json"))
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8(output).unwrap().contains("Could not load config"));
}

#[cfg(unix)]
#[test]
fn build_with_fake_compiler() {
    let dir = project(json!({
        "outputs": { "json": "dist/json", "ts": "ts" },
        "codeGenerationTarget": "ethers.js"
    }));
    let solc = fake_solc(
        dir.path(),
        &json!({
            "sources": { "Store.sol": { "id": 0 } },
            "contracts": { "Store.sol": { "Store": {
                "abi": [],
                "evm": { "bytecode": { "object": "6080" } }
            } } }
        }),
    );
    steelshards()
        .current_dir(dir.path())
        .env("STEELSHARDS_SOLC", &solc)
        .args(["build"])
        .assert()
        .success();
    let artifact: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("dist/json/Store.json")).unwrap())
            .unwrap();
    assert_eq!(artifact["evm"]["bytecode"]["object"], "6080");
    let client = fs::read_to_string(dir.path().join("ts/Store.ts")).unwrap();
    assert!(client.contains("export class Store {"));
}

#[cfg(unix)]
#[test]
fn build_reports_compile_errors() {
    let dir = project(json!({ "outputs": { "json": "dist/json" } }));
    let solc = fake_solc(
        dir.path(),
        &json!({
            "errors": [
                { "severity": "error", "message": "Expected pragma.",
                  "sourceLocation": { "file": "Store.sol", "start": 0, "end": 8 } }
            ],
            "contracts": { "Store.sol": { "Store": { "abi": [] } } }
        }),
    );
    let assert = steelshards()
        .current_dir(dir.path())
        .env("STEELSHARDS_SOLC", &solc)
        .args(["build", "--no-emit"])
        .assert()
        .failure();
    let out = assert.get_output();
    let stdout = String::from_utf8(out.stdout.clone()).unwrap();
    assert!(stdout.contains("error while compiling Store.sol: Expected pragma."));
    assert!(stdout.contains("  1 | contract Store {}"));
    let stderr = String::from_utf8(out.stderr.clone()).unwrap();
    assert!(stderr.contains("Compilation failed with 1 error(s)"));
    assert!(!dir.path().join("dist").exists());
}
