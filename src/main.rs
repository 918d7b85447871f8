use std::{future::IntoFuture, net::SocketAddr, path::Path, sync::Arc, time::Duration};

use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use svcgate::{
    adapters::{
        FileParameterStore, HttpClientAdapter, HttpHandler, HttpParameterStore, SystemDnsResolver,
    },
    config::{GatewayConfig, GatewayConfigValidator, StoreConfig, load_config},
    ports::config_store::ConfigStore,
    tracing_setup,
    utils::GracefulShutdown,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
    /// Initialize a new configuration file
    Init {
        /// Output path for the new config file
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
    /// Start the gateway server (default)
    Serve {
        /// Configuration file to use
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
}

fn create_config_store(store: &StoreConfig) -> Arc<dyn ConfigStore> {
    match store {
        StoreConfig::Http {
            url,
            timeout_secs,
            page_size,
        } => Arc::new(HttpParameterStore::new(
            url.clone(),
            Duration::from_secs(*timeout_secs),
            *page_size,
        )),
        StoreConfig::File { path, page_size } => {
            Arc::new(FileParameterStore::new(path.clone(), *page_size))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    let config_path = match args.command {
        Some(Commands::Validate { config }) => return validate_config_command(&config).await,
        Some(Commands::Init { config }) => return init_config_command(&config).await,
        Some(Commands::Serve { config }) => config,
        None => args.config, // Default to serve with config from args
    };

    let config: GatewayConfig = load_config(&config_path)
        .await
        .with_context(|| format!("Failed to load config from {config_path}"))?;
    GatewayConfigValidator::validate(&config)
        .map_err(|e| eyre!("Invalid configuration in {config_path}: {e}"))?;

    tracing_setup::init_tracing(&config.logging)
        .map_err(|e| eyre!("Failed to initialize tracing: {}", e))?;

    let provider = rustls::crypto::aws_lc_rs::default_provider();
    if let Err(e) = rustls::crypto::CryptoProvider::install_default(provider) {
        tracing::warn!(
            "CryptoProvider::install_default for aws-lc-rs reported an error: {:?}. \
            A provider was most likely installed already.",
            e
        );
    }

    let store = create_config_store(&config.store);
    let http_client =
        Arc::new(HttpClientAdapter::new().context("Failed to create outbound HTTP client")?);
    let handler = Arc::new(HttpHandler::from_config(
        &config,
        store,
        http_client,
        Arc::new(SystemDnsResolver::new()),
    ));
    let app = handler.into_router();

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .context("Failed to parse listen address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    tracing::info!(
        listen_addr = %addr,
        services_path = %config.services_path,
        proxy_timeout_secs = config.proxy.timeout_secs,
        "svcgate starting"
    );

    let graceful_shutdown = Arc::new(GracefulShutdown::new());
    {
        let graceful_shutdown = graceful_shutdown.clone();
        tokio::spawn(async move { graceful_shutdown.run_signal_handler().await });
    }

    let shutdown = graceful_shutdown.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let reason = shutdown.wait_for_shutdown_signal().await;
            tracing::info!("Draining in-flight requests after {:?}", reason);
        })
        .into_future();

    // In-flight requests get a bounded window once shutdown starts
    let drain_deadline = async {
        graceful_shutdown.wait_for_shutdown_signal().await;
        tokio::time::sleep(graceful_shutdown.drain_timeout()).await;
    };

    tokio::select! {
        result = server => {
            result.context("Server error")?;
            tracing::info!("Graceful shutdown completed");
        }
        _ = drain_deadline => {
            tracing::warn!(
                "Drain timeout of {:?} exceeded, dropping remaining connections",
                graceful_shutdown.drain_timeout()
            );
        }
    }

    Ok(())
}

/// Validate configuration file and exit
async fn validate_config_command(config_path: &str) -> Result<()> {
    println!("🔍 Validating configuration file: {config_path}");

    if !Path::new(config_path).exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' not found");
        std::process::exit(1);
    }

    let config = match load_config(config_path).await {
        Ok(config) => {
            println!("✅ Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("❌ Configuration parsing failed:");
            eprintln!("   {e:#}");
            std::process::exit(1);
        }
    };

    match GatewayConfigValidator::validate(&config) {
        Ok(()) => {
            let store = match &config.store {
                StoreConfig::Http { url, .. } => format!("http ({url})"),
                StoreConfig::File { path, .. } => format!("file ({path})"),
            };
            println!("✅ Configuration validation: OK");
            println!();
            println!("📋 Configuration Summary:");
            println!("   • Listen Address: {}", config.listen_addr);
            println!("   • Parameter Store: {store}");
            println!("   • Services Path: {}", config.services_path);
            println!("   • ALB Key: {}", config.front_ends.alb_dns_key);
            println!("   • VPC Endpoint Key: {}", config.front_ends.vpc_endpoint_dns_key);
            println!("   • Proxy Timeout: {}s", config.proxy.timeout_secs);
            println!("   • On-prem Endpoints: {}", config.onprem.len());
            println!();
            println!("🎉 Configuration is valid and ready to use!");
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed:");
            eprintln!("{e}");
            println!();
            println!("💡 Common fixes:");
            println!("   • Ensure the store URL starts with http:// or https://");
            println!("   • Parameter keys must start with '/'");
            println!("   • Verify listen address format (e.g., '0.0.0.0:8080')");
            println!("   • Timeouts must be greater than 0");
            std::process::exit(1);
        }
    }
}

/// Initialize a new configuration file
async fn init_config_command(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    if path.exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' already exists");
        std::process::exit(1);
    }

    let default_config = r#"# svcgate configuration

# The address to listen on
listen_addr = "0.0.0.0:8080"

# Namespace holding one "<services_path>/<name>/config" record per service
services_path = "/services"

# Parameter store backend
[store]
type = "http"
url = "http://127.0.0.1:4000"
timeout_secs = 5

# Local alternative:
# [store]
# type = "file"
# path = "./parameters.json"
# page_size = 10

# Keys holding the DNS name of each front-end tier (first present wins)
[front_ends]
alb_dns_key = "/linked/infra/alb/dns"
vpc_endpoint_dns_key = "/linked/infra/privatelink/endpoint"
nlb_dns_key = "/linked/infra/nlb/dns"

[proxy]
timeout_secs = 30

[docs]
timeout_secs = 10

[[onprem]]
name = "GitLab API"
key = "/onprem/as4-gitlab/endpoint"

[[onprem]]
name = "License Server"
key = "/onprem/silver-license/endpoint"

[logging]
level = "info"
json = true
"#;

    tokio::fs::write(path, default_config)
        .await
        .context("Failed to write config file")?;
    println!("✅ Created default configuration at: {config_path}");
    println!("   Run 'svcgate serve --config {config_path}' to start the server");
    Ok(())
}
