//! qwhisk command-line interface.
//!
//! Runs the broker and offers a few one-shot management commands against
//! its store and clients.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use qwhisk_engine::{Broker, Config};

/// qwhisk - broker between quantum backends and FaaS runtimes
#[derive(Parser)]
#[command(name = "qwhisk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (YAML)
    #[arg(short, long, global = true, env = "QWHISK_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the broker with its reconciliation pollers
    Serve,

    /// Load, validate and print the effective configuration
    CheckConfig,

    /// Register a FaaS provider
    AddProvider {
        /// Unique provider name
        name: String,

        /// FaaS runtime API base URL
        #[arg(long)]
        base_url: String,

        /// Runtime namespace
        #[arg(long, default_value = "guest")]
        namespace: String,

        /// Runtime username
        #[arg(long, env = "QWHISK_FAAS_USER")]
        username: String,

        /// Runtime password
        #[arg(long, env = "QWHISK_FAAS_PASSWORD")]
        password: String,
    },

    /// Invoke an application's action once
    Invoke {
        /// Application name
        application: String,

        /// Invocation parameters as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve => {
            let broker = Broker::from_config(config).await?;
            let handles = broker.start();
            tracing::info!("broker running, press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
            for handle in handles {
                handle.abort();
            }
            println!("stopped");
        }
        Commands::CheckConfig => {
            println!("{config:#?}");
            println!("configuration OK");
        }
        Commands::AddProvider {
            name,
            base_url,
            namespace,
            username,
            password,
        } => {
            let broker = Broker::from_config(config).await?;
            let provider = broker
                .providers
                .register(&name, &base_url, &namespace, &username, &password)
                .await?;
            println!("registered provider '{}' ({})", provider.name, provider.base_url);
        }
        Commands::Invoke {
            application,
            params,
        } => {
            let params: serde_json::Value = serde_json::from_str(&params)?;
            let broker = Broker::from_config(config).await?;
            let execution = broker.applications.invoke(&application, &params).await?;
            println!("activation {}", execution.activation_id);
        }
    }

    Ok(())
}
