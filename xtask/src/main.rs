//! Build automation tasks for the vfd-kit project.
//!
//! Run with: `cargo xtask <command>`

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::process::{Command, ExitCode};

/// The one board this project targets.
const FIRMWARE_TARGET: &str = "thumbv6m-none-eabi";
const FIRMWARE_FEATURES: &str = "pico1,arm,defmt";
const HOST_FEATURES: &str = "host";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation for vfd-kit project", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: build firmware, run host tests, generate docs
    CheckAll,
    /// Build the library and firmware binaries for the Pico
    Build,
    /// Build a UF2 firmware file for drag-and-drop flashing
    Uf2 {
        /// Binary name
        #[arg(default_value = "vfd_pico1")]
        name: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckAll => check_all(),
        Commands::Build => build_firmware(),
        Commands::Uf2 { name } => build_uf2(&name),
    }
}

fn check_all() -> ExitCode {
    let workspace_root = workspace_root();

    println!("{}", "==> Building library...".cyan());
    if !run_command(Command::new("cargo").current_dir(&workspace_root).args([
        "build",
        "--lib",
        "--target",
        FIRMWARE_TARGET,
        "--features",
        FIRMWARE_FEATURES,
        "--no-default-features",
    ])) {
        return ExitCode::FAILURE;
    }

    println!("\n{}", "==> Building firmware binaries...".cyan());
    for name in ["vfd_pico1", "vfd_iv18"] {
        println!("  {}", format!("- {name}").bright_black());
        if !run_command(Command::new("cargo").current_dir(&workspace_root).args([
            "build",
            "--bin",
            name,
            "--target",
            FIRMWARE_TARGET,
            "--features",
            FIRMWARE_FEATURES,
            "--no-default-features",
        ])) {
            return ExitCode::FAILURE;
        }
    }

    let host_target = host_target();
    match host_target.as_deref() {
        Some(target) => {
            println!(
                "\n  {}",
                format!("Using host target: {target}").bright_black()
            );
        }
        None => {
            println!(
                "\n{}",
                "  Unable to detect host target; relying on cargo default.".bright_black()
            );
        }
    }

    println!("\n{}", "==> Running unit tests...".cyan());
    if !run_host_test(&workspace_root, host_target.as_deref(), "--lib") {
        return ExitCode::FAILURE;
    }

    println!("\n{}", "==> Running integration tests...".cyan());
    if !run_host_test(&workspace_root, host_target.as_deref(), "--tests") {
        return ExitCode::FAILURE;
    }

    println!("\n{}", "==> Running doc tests...".cyan());
    if !run_host_test(&workspace_root, host_target.as_deref(), "--doc") {
        return ExitCode::FAILURE;
    }

    println!("\n{}", "==> Building documentation...".cyan());
    if !run_command(Command::new("cargo").current_dir(&workspace_root).args([
        "doc",
        "--target",
        FIRMWARE_TARGET,
        "--no-deps",
        "--features",
        FIRMWARE_FEATURES,
        "--no-default-features",
    ])) {
        return ExitCode::FAILURE;
    }

    println!("\n{}", "==> All checks passed! 🎉".green().bold());
    ExitCode::SUCCESS
}

fn build_firmware() -> ExitCode {
    let workspace_root = workspace_root();
    println!(
        "{}",
        format!("Building firmware with features: {FIRMWARE_FEATURES}").cyan()
    );

    if run_command(Command::new("cargo").current_dir(&workspace_root).args([
        "build",
        "--bin",
        "vfd_pico1",
        "--target",
        FIRMWARE_TARGET,
        "--features",
        FIRMWARE_FEATURES,
        "--no-default-features",
    ])) {
        println!("{}", "Build successful! ✨".green());
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn build_uf2(name: &str) -> ExitCode {
    let workspace_root = workspace_root();

    println!("{}", format!("Building UF2 for '{name}'").cyan());
    println!("  Features: {}", FIRMWARE_FEATURES.bright_black());
    println!("  Target: {}", FIRMWARE_TARGET.bright_black());

    // Build in release mode for UF2
    if !run_command(Command::new("cargo").current_dir(&workspace_root).args([
        "build",
        "--bin",
        name,
        "--release",
        "--target",
        FIRMWARE_TARGET,
        "--features",
        FIRMWARE_FEATURES,
        "--no-default-features",
    ])) {
        return ExitCode::FAILURE;
    }

    // Convert to UF2 using elf2uf2-rs
    let elf_path = format!("target/{FIRMWARE_TARGET}/release/{name}");
    let uf2_path = format!("{name}.uf2");

    println!("\n{}", "Converting to UF2 format...".cyan());

    if run_command(
        Command::new("elf2uf2-rs")
            .current_dir(&workspace_root)
            .args([&elf_path, &uf2_path]),
    ) {
        println!("{}", format!("UF2 created: {uf2_path} 🚀").green().bold());
        println!("{}", "Ready to drag-and-drop to your Pico!".bright_black());
        ExitCode::SUCCESS
    } else {
        println!(
            "{}",
            "Note: Install elf2uf2-rs with: cargo install elf2uf2-rs".yellow()
        );
        ExitCode::FAILURE
    }
}

fn run_host_test(workspace_root: &std::path::Path, host_target: Option<&str>, scope: &str) -> bool {
    let mut cmd = Command::new("cargo");
    cmd.current_dir(workspace_root).args(["test", scope]);

    if let Some(target) = host_target {
        cmd.arg("--target").arg(target);
    }

    cmd.args(["--no-default-features", "--features", HOST_FEATURES]);
    run_command(&mut cmd)
}

fn workspace_root() -> std::path::PathBuf {
    std::env::current_dir().expect("Failed to get current directory")
}

fn host_target() -> Option<String> {
    let output = Command::new("rustc").arg("-vV").output().ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines() {
        if let Some(host) = line.strip_prefix("host: ") {
            return Some(host.trim().to_string());
        }
    }
    None
}

fn run_command(cmd: &mut Command) -> bool {
    match cmd.status() {
        Ok(status) => status.success(),
        Err(e) => {
            eprintln!("{}", format!("Failed to execute command: {e}").red());
            false
        }
    }
}
