use anyhow::{Context, Result};
use clap::Parser;
use relay_proxy::cli::{Cli, Commands};
use relay_proxy::config::{ConfigFormat, ProxyConfig};
use relay_proxy::server;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over --log-level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("Invalid log level")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    match &cli.command {
        Some(Commands::Check { config }) => check_config(config),
        Some(Commands::Template { output, format }) => {
            generate_config_template((*format).into(), output.as_deref())
        }
        None => {
            info!("Relay Proxy v{}", env!("CARGO_PKG_VERSION"));

            let config = match cli.config.as_deref() {
                Some(path) => {
                    info!("Loading configuration from: {}", path);
                    ProxyConfig::load(path)
                        .with_context(|| format!("Failed to load config [{}]", path))?
                }
                None => ProxyConfig::default(),
            };

            server::run_proxy_until(config, shutdown_signal()).await
        }
    }
}

/// 等待 Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Generate configuration template
fn generate_config_template(format: ConfigFormat, output: Option<&str>) -> Result<()> {
    let content = ProxyConfig::default().to_string_with_format(format)?;

    if let Some(path) = output {
        std::fs::write(path, &content)
            .with_context(|| format!("Failed to write config template to {}", path))?;
        println!("Generated configuration template: {}", path);
    } else {
        println!("{}", content);
    }

    Ok(())
}

/// Check configuration file format
fn check_config(config_path: &str) -> Result<()> {
    println!("Checking configuration file: {}\n", config_path);

    match ProxyConfig::load(config_path) {
        Ok(config) => {
            println!("✓ Listen address: {}", config.listen_addr());
            if config.timeout == 0 {
                println!("✓ Dial timeout: unbounded");
            } else {
                println!("✓ Dial timeout: {:?}", config.dial_timeout());
            }
            println!("\n✓ Configuration is valid!");
            Ok(())
        }
        Err(e) => {
            println!("✗ Configuration validation failed!");
            println!("\nError details:");
            println!("{:#}", e);
            Err(e)
        }
    }
}
