//! `studykit onboard` — write a default config file to edit.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use studykit_core::config::{get_config_path, load_config, save_config};
use studykit_providers::registry::PROVIDERS;

/// Run the onboard command.
pub fn run() -> Result<()> {
    println!();
    println!("{}", "📚 StudyKit — Setup".cyan().bold());
    println!();

    let config_path = get_config_path();
    let created = ensure_config(&config_path)?;
    println!(
        "  {} {} {}",
        "✓".green(),
        if created { "created config at" } else { "config already exists at" },
        config_path.display()
    );

    println!();
    println!("  Add at least one API key to the config, or export one of:");
    for spec in PROVIDERS {
        println!("    {}", spec.env_key.dimmed());
    }
    println!();

    Ok(())
}

/// Write the default config unless one exists. Returns whether it was created.
fn ensure_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    let config = load_config(Some(path)); // defaults
    save_config(&config, Some(path))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_config_creates_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studykit").join("config.json");

        assert!(ensure_config(&path).unwrap());
        assert!(path.exists());

        std::fs::write(&path, r#"{"dispatch": {"timeoutSecs": 7}}"#).unwrap();
        assert!(!ensure_config(&path).unwrap());
        let kept = std::fs::read_to_string(&path).unwrap();
        assert!(kept.contains("timeoutSecs\": 7"));
    }
}
