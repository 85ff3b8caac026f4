//! `studykit status` — show configuration and provider credentials.

use anyhow::Result;
use colored::Colorize;

use studykit_core::config::{get_config_path, load_config};
use studykit_core::utils::mask_secret;
use studykit_providers::registry::{ProviderDescriptor, PROVIDERS};

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!("{}", "📚 StudyKit Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found)".red().to_string()
        }
    );

    println!(
        "  {:<18} {}",
        "Dispatch:".bold(),
        format!(
            "timeout {}s | max_tokens {} | temp {}",
            config.dispatch.timeout_secs, config.dispatch.max_tokens, config.dispatch.temperature
        )
        .dimmed(),
    );

    println!();
    println!("  {}", "Providers (priority order):".bold());

    for spec in PROVIDERS {
        let provider_config = config
            .providers
            .get_by_name(spec.name)
            .cloned()
            .unwrap_or_default();
        let descriptor = ProviderDescriptor::from_spec(spec, &provider_config);

        let key_status = match descriptor.credential.as_deref() {
            Some(key) if provider_config.is_configured() => {
                format!("{} {} (config)", "✓".green(), mask_secret(key))
            }
            Some(key) => format!("{} {} (env {})", "✓".green(), mask_secret(key), spec.env_key),
            None => format!("{}", "· not configured".dimmed()),
        };
        println!(
            "    {:<14} {:<42} {}",
            spec.display_name,
            descriptor.model.dimmed(),
            key_status
        );

        if let Some(limits) = descriptor.rate_limits {
            println!(
                "    {:<14} {}",
                "",
                format!(
                    "limits: {}/min {}/hour {}/day",
                    limits.per_minute, limits.per_hour, limits.per_day
                )
                .dimmed()
            );
        }
    }

    println!();

    Ok(())
}
