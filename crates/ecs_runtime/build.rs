// build.rs
// Records the compiler version so loaded modules can be matched against the host build

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-env-changed=RUSTC");

    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let version = match Command::new(&rustc).arg("--version").output() {
        Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout).trim().to_string(),
        _ => {
            eprintln!("warning: could not query {} --version", rustc);
            "unknown".to_string()
        }
    };

    println!("cargo:rustc-env=ECS_RUNTIME_RUSTC_VERSION={}", version);
    println!(
        "cargo:rustc-env=ECS_RUNTIME_BUILD_TARGET={}",
        env::var("TARGET").unwrap_or_default()
    );
}
