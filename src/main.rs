mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{AuthCommands, Cli, Commands, ConfigCommands, FilterCommands, HealthCommands, render};
use std::path::Path;
use tracing::{debug, info};
use wharf::config::ClientConfig;
use wharf::container::HealthTest;
use wharf::detach::DetachKeys;
use wharf::filters::Filters;
use wharf::registry::AuthConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);

    // `config init` runs before a config exists
    let initializing = matches!(
        cli.command,
        Commands::Config {
            command: ConfigCommands::Init { .. }
        }
    );

    let mut config = if initializing {
        Ok(ClientConfig::default())
    } else if cli.config.is_some() {
        ClientConfig::load(&config_path)
    } else {
        ClientConfig::load_or_default(&config_path)
    }
    .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    if let Some(host) = cli.host {
        config.engine.host = host;
    }
    if let Some(api_version) = cli.api_version {
        config.engine.api_version = api_version;
    }

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.log_level = "debug".to_string();
    }
    let _guard = logging.init_tracing()?;

    debug!(host = %config.engine.host, api_version = %config.engine.api_version, "Using engine");

    match cli.command {
        Commands::Request { operation } => {
            let request = render::build_request(&operation, &config)?;
            let view = render::describe(&request, &config.engine.host, &config.engine.api_version)?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }

        Commands::Filters { command } => match command {
            FilterCommands::Encode { pairs } => {
                println!("{}", render::parse_filters(&pairs)?.encode());
            }
            FilterCommands::Decode { text } => {
                let filters = Filters::decode(&text)?;
                for key in filters.keys() {
                    println!("{key}={}", filters.get(key).join(","));
                }
            }
        },

        Commands::DetachKeys { keys } => {
            let keys = DetachKeys::parse(&keys)?;
            let bytes: Vec<String> = keys.to_bytes().iter().map(|b| format!("0x{b:02x}")).collect();
            println!("{} -> {}", keys, bytes.join(" "));
        }

        Commands::Health { command } => match command {
            HealthCommands::Validate { test } => {
                let parsed = HealthTest::parse(&test)?;
                println!("✅ {parsed:?}");
            }
        },

        Commands::Auth { command } => match command {
            AuthCommands::Encode {
                server,
                username,
                password,
                identity_token,
            } => {
                let auth = match (password, identity_token) {
                    (None, None) => config
                        .auth_for(&server)
                        .with_context(|| format!("No stored credentials for {server}"))?,
                    (_, Some(token)) => AuthConfig::identity_token(token, server.as_str()),
                    (Some(password), None) => {
                        let Some(username) = username else {
                            bail!("--username is required with --password");
                        };
                        AuthConfig::basic(username, password, server.as_str())
                    }
                };
                auth.validate()?;
                info!(server = %server, "Encoding registry credential");
                println!("{}", auth.encode()?.as_str());
            }
        },

        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                println!("# {}", config_path.display());
                println!("{config:#?}");
            }
            ConfigCommands::Validate => {
                config.validate()?;
                println!("✅ {} is valid", config_path.display());
            }
            ConfigCommands::Init { force } => init_config(&config_path, force)?,
        },
    }

    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, ClientConfig::template())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("✅ Wrote {}", path.display());
    Ok(())
}
