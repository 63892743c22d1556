use anyhow::Result;
use chrono::TimeZone;
use std::env;
use std::fs;
use std::process::Command;
use vergen_gitcl::{Emitter, GitclBuilder};

const LIBRARY_PACKAGE: &str = "mediacodec";

fn main() -> Result<()> {
    // Generate git information
    let gitcl = GitclBuilder::default()
        .describe(true, true, Some("[0-9]*"))
        .build()?;

    let gitcl_res = Emitter::default()
        .idempotent()
        .fail_on_error()
        .add_instructions(&gitcl)
        .and_then(|emitter| emitter.emit());

    if let Err(e) = gitcl_res {
        eprintln!("error occurred while generating instructions: {e:?}");
        Emitter::default().idempotent().fail_on_error().emit()?;
        println!("cargo:rustc-env=VERGEN_GIT_DESCRIBE=unknown");
    }

    // Add build timestamp
    let now = env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|val| val.parse::<i64>().ok())
        .and_then(|secs| chrono::Utc.timestamp_opt(secs, 0).single())
        .unwrap_or_else(chrono::Utc::now);

    println!(
        "cargo:rustc-env=BUILD_TIMESTAMP={}",
        now.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let library_version = version_from_metadata().unwrap_or_else(|_| {
        version_from_manifest().unwrap_or_else(|_| "unknown".to_string())
    });
    println!("cargo:rustc-env=MEDIACODEC_VERSION={library_version}");

    println!("cargo:rerun-if-changed={LIBRARY_PACKAGE}/Cargo.toml");

    Ok(())
}

/// Library version from `cargo metadata`, for path and registry dependencies alike.
fn version_from_metadata() -> Result<String> {
    let output = Command::new("cargo")
        .args(["metadata", "--format-version", "1"])
        .output()?;

    if !output.status.success() {
        anyhow::bail!("cargo metadata failed");
    }

    let metadata: serde_json::Value = serde_json::from_slice(&output.stdout)?;

    let packages = metadata["packages"].as_array().into_iter().flatten();
    for package in packages {
        if package["name"].as_str() == Some(LIBRARY_PACKAGE) {
            if let Some(version) = package["version"].as_str() {
                return Ok(version.to_string());
            }
        }
    }

    // "mediacodec 0.2.0 (registry+...)" in the resolve graph
    let nodes = metadata["resolve"]["nodes"].as_array().into_iter().flatten();
    for node in nodes {
        let Some(id) = node["id"].as_str() else {
            continue;
        };
        let mut parts = id.split(' ');
        if parts.next() == Some(LIBRARY_PACKAGE) {
            if let Some(version) = parts.next() {
                return Ok(version.to_string());
            }
        }
    }

    anyhow::bail!("{LIBRARY_PACKAGE} package not found in metadata");
}

/// Fallback: read the version line of the library manifest.
fn version_from_manifest() -> Result<String> {
    let toml_content = fs::read_to_string(format!("{LIBRARY_PACKAGE}/Cargo.toml"))?;

    for line in toml_content.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("version") {
            if let Some(value) = value.trim_start().strip_prefix('=') {
                return Ok(value.trim().trim_matches('"').trim_matches('\'').to_string());
            }
        }
    }

    anyhow::bail!("Could not find version in {LIBRARY_PACKAGE}/Cargo.toml");
}
