//! Config command - manage configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use safeconsole_store::default_config_dir;
use tracing::info;

use crate::context::{load_settings, session_path, settings_path};
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Write the current configuration (defaults if none) to disk.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },

    /// Write the defaults over the configuration file.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli).await,
        ConfigAction::Path => show_paths(cli),
        ConfigAction::Init { force } => init_config(*force, cli).await,
        ConfigAction::Reset => reset_config(cli).await,
    }
}

async fn show_config(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli).await.get().await;

    match cli.format {
        OutputFormat::Text => {
            println!("SafeConsole Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("API base URL:     {}", settings.api_base_url);
            println!("Rate-limit URL:   {}", settings.rate_limit_url());
            println!("Request timeout:  {}s", settings.request_timeout_secs);
            println!(
                "Default limits:   {} monthly, {} daily",
                settings.default_monthly_limit, settings.default_daily_limit
            );
            println!("Session storage:  {}", settings.storage_backend);
            println!("Log level:        {}", settings.log_level);
            println!();
            println!("Classifier:");
            let classifier = settings.classifier_config();
            println!("  Local dev hosts: {}", classifier.local_dev_hosts.join(", "));
            println!("  API prefix:      {}", classifier.api_prefix);
            println!("  Backend hosts:   {}", classifier.backend_hosts.join(", "));
            println!("  Absolute URLs:   {}", classifier.absolute_urls);
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&settings)?);
        }
    }

    Ok(())
}

fn show_paths(cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let settings_file = settings_path(cli);
    let session_file = session_path(&settings_file);

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:    {}", config_dir.display());
            println!("Settings file: {}", settings_file.display());
            println!("Session file:  {}", session_file.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "settings_file": settings_file.display().to_string(),
                "session_file": session_file.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

async fn init_config(force: bool, cli: &Cli) -> Result<()> {
    let store = load_settings(cli).await;
    let path = store.path().clone();

    if path.exists() && !force {
        println!("Configuration already exists at {}", path.display());
        return Ok(());
    }

    store.save().await?;
    info!(path = %path.display(), "Settings written");
    println!("Configuration written to {}", path.display());
    Ok(())
}

async fn reset_config(cli: &Cli) -> Result<()> {
    let store = load_settings(cli).await;
    store.reset().await;
    store.save().await?;

    info!(path = %store.path().display(), "Settings reset");
    println!("Configuration reset to defaults");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use safeconsole_store::{Settings, persistence::load_json};

    #[tokio::test]
    async fn test_reset_writes_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");
        tokio::fs::write(
            &path,
            r#"{"api_base_url": "https://safety.example.com", "default_daily_limit": 5}"#,
        )
        .await
        .unwrap();

        let cli = Cli::try_parse_from(["safeconsole", "--config", path.to_str().unwrap()]).unwrap();
        reset_config(&cli).await.unwrap();

        let saved: Settings = load_json(&path).await.unwrap();
        assert_eq!(saved, Settings::default());
    }

    #[tokio::test]
    async fn test_init_keeps_existing_file_without_force() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");
        let custom = r#"{"default_daily_limit": 5}"#;
        tokio::fs::write(&path, custom).await.unwrap();

        let cli = Cli::try_parse_from(["safeconsole", "--config", path.to_str().unwrap()]).unwrap();
        init_config(false, &cli).await.unwrap();
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), custom);

        init_config(true, &cli).await.unwrap();
        let saved: Settings = load_json(&path).await.unwrap();
        assert_eq!(saved.default_daily_limit, 5);
    }
}
