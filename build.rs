//! Build script for moodcli.
//!
//! Installs the `.env.example` configuration template into the local data
//! directory next to the location where `config::load_env` looks for the
//! real `.env` file:
//!
//! - Linux: `~/.local/share/moodcli/.env.example`
//! - macOS: `~/Library/Application Support/moodcli/.env.example`
//! - Windows: `%LOCALAPPDATA%/moodcli/.env.example`
//!
//! An existing `.env` is never touched. A missing template only produces a
//! cargo warning.

use std::{env, fs, path::PathBuf};

const TEMPLATE: &str = ".env.example";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed={TEMPLATE}");

    let template = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?).join(TEMPLATE);
    if !template.is_file() {
        println!(
            "cargo:warning={TEMPLATE} not found at {}",
            template.display()
        );
        return Ok(());
    }

    let mut target_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    target_dir.push("moodcli");
    fs::create_dir_all(&target_dir)?;

    fs::copy(&template, target_dir.join(TEMPLATE))?;
    Ok(())
}
