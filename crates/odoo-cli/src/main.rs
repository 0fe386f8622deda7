//! Odoo Command-Line Client
//!
//! Lists the models, fields and accounts of an Odoo database.

mod commands;
mod formatter;

use clap::Parser;
use commands::Command;
use formatter::OutputFormat;
use odoo_client::{ClientConfig, OdooClient};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Log directives used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "odoo_cli=info,odoo_client=info";

/// Odoo Command-Line Client
#[derive(Parser, Debug)]
#[command(name = "odoo-cli")]
#[command(version, about = "Inspect the models of an Odoo server over XML-RPC")]
pub struct Args {
    /// Server base URL, e.g. https://erp.example.com
    #[arg(short = 'H', long, env = "ODOO_HOST")]
    pub host: String,

    /// Port, when it differs from the URL or scheme default
    #[arg(short = 'p', long, env = "ODOO_PORT")]
    pub port: Option<u16>,

    /// Database name
    #[arg(short = 'd', long = "db", env = "ODOO_DB")]
    pub database: String,

    /// Login
    #[arg(short = 'u', long, env = "ODOO_USER")]
    pub user: String,

    /// Password or API key
    #[arg(long, env = "ODOO_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[tokio::main]
async fn main() {
    // Initialize tracing; logs go to stderr so JSON output stays clean
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let result = run(args).await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ClientConfig::new(&args.host, args.database, args.user, args.password)?;
    if let Some(port) = args.port {
        config = config.with_port(port);
    }

    let mut client = OdooClient::new(config)?;
    let uid = client.connect().await?;
    info!(uid = uid.get(), "connected");

    let formatter = formatter::create_formatter(args.format);
    let output = commands::execute(&client, &args.command, &*formatter).await?;
    println!("{}", output);

    Ok(())
}
