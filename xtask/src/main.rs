//! Project automation for Mannequin
//!
//! Usage:
//!   cargo xtask validate-scenes          # Check every scene file under assets/scenes
//!   cargo xtask validate-scenes --dir X  # Check scene files in another directory
//!   cargo xtask dist                     # Release build + assets into dist/native

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Project automation for Mannequin")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate every .ron scene file
    ValidateScenes {
        /// Directory to scan (defaults to assets/scenes)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Build a native release and copy it with its assets into dist/native
    Dist,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::ValidateScenes { dir } => validate_scenes(dir),
        Commands::Dist => dist(),
    }
}

/// Get the project root directory
fn project_root() -> Result<PathBuf> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .context("xtask must live one level below the project root")
}

/// Run a command and check for success
fn run_cmd(cmd: &mut Command) -> Result<()> {
    let status = cmd.status().context("Failed to execute command")?;
    if !status.success() {
        anyhow::bail!("Command failed with status: {}", status);
    }
    Ok(())
}

/// Copy directory recursively
fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Load every scene file in a directory and report the failures
fn validate_scenes(dir: Option<PathBuf>) -> Result<()> {
    let dir = match dir {
        Some(dir) => dir,
        None => project_root()?.join("assets/scenes"),
    };

    let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|ext| ext == "ron").unwrap_or(false))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No scene files in {}", dir.display());
    }

    let mut failures = 0;
    for path in &files {
        match mannequin::rig::file::load_scene(path) {
            Ok(rig) => println!(
                "ok    {} ({} bones, {} roots)",
                path.display(),
                rig.skeleton.len(),
                rig.skeleton.roots().count()
            ),
            Err(e) => {
                println!("FAIL  {}: {}", path.display(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} scene files failed validation", failures, files.len());
    }
    println!("All {} scene files valid", files.len());
    Ok(())
}

/// Native release build
fn dist() -> Result<()> {
    validate_scenes(None)?;

    let root = project_root()?;
    let dist = root.join("dist/native");

    // Clean and create dist folder
    if dist.exists() {
        std::fs::remove_dir_all(&dist)?;
    }
    std::fs::create_dir_all(&dist)?;

    println!("Building native release...");
    run_cmd(
        Command::new("cargo")
            .current_dir(&root)
            .args(["build", "--release", "--bin", "mannequin"]),
    )?;

    let binary_name = if cfg!(target_os = "windows") {
        "mannequin.exe"
    } else {
        "mannequin"
    };
    std::fs::copy(
        root.join(format!("target/release/{}", binary_name)),
        dist.join(binary_name),
    )?;

    copy_dir_recursive(&root.join("assets"), &dist.join("assets"))?;

    println!("Native build complete: dist/native/");
    Ok(())
}
