use std::env;
use std::process::Command;

const UNKNOWN: &str = "unknown";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    for var in ["GITHUB_SHA", "POSESHARK_COMMIT", "POSESHARK_DATE"] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    let commit_full = build_commit();
    let commit_short = match commit_full.as_str() {
        UNKNOWN => UNKNOWN.to_string(),
        full => full.chars().take(7).collect(),
    };
    let build_date = env_value("POSESHARK_DATE")
        .or_else(|| run_git(&["log", "-1", "--format=%cs"]))
        .unwrap_or_else(|| UNKNOWN.to_string());

    println!("cargo:rustc-env=POSESHARK_BUILD_COMMIT={commit_short}");
    println!("cargo:rustc-env=POSESHARK_BUILD_COMMIT_FULL={commit_full}");
    println!("cargo:rustc-env=POSESHARK_BUILD_DATE={build_date}");
}

/// Explicit override first, then CI, then the local checkout.
fn build_commit() -> String {
    env_value("POSESHARK_COMMIT")
        .or_else(|| env_value("GITHUB_SHA"))
        .or_else(|| run_git(&["rev-parse", "HEAD"]))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn env_value(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn run_git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if value.is_empty() { None } else { Some(value) }
}
