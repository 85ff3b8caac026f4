//! Shared CLI helpers — prompt input and response printing.

use std::io::Read;

use anyhow::{Context, Result};
use colored::Colorize;

use studykit_providers::Completion;

/// Resolve the prompt: the argument if given, otherwise all of stdin.
pub fn read_prompt(arg: Option<String>) -> Result<String> {
    match arg {
        Some(prompt) if prompt != "-" => Ok(prompt),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read prompt from stdin")?;
            Ok(buf)
        }
    }
}

/// Print a completion to stdout.
pub fn print_completion(completion: &Completion) {
    println!();
    println!(
        "{} {}",
        "📚 StudyKit".cyan().bold(),
        format!("via {}", completion.provider).dimmed()
    );
    println!("{}", completion.content);
    println!();
}

/// Print the banner shown when the server starts.
pub fn print_banner(addr: &str) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "📚 StudyKit".cyan().bold(), version.dimmed());
    println!("  Serving on {}", format!("http://{addr}").underline());
    println!();
}
