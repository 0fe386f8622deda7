//! Subcommands and their execution.

use clap::{Args, Subcommand};
use odoo_client::catalog::{DEFAULT_CHUNK_SIZE, DEFAULT_PAGE_SIZE};
use odoo_client::{
    BareModelPolicy, CallError, CatalogOptions, OdooClient, SearchReadOptions, Transport,
};
use odoo_proto::Domain;
use thiserror::Error;
use tracing::info;

use crate::formatter::Formatter;

/// Model read by the `accounts` command.
pub const ACCOUNT_MODEL: &str = "account.account";

/// Columns shown by the `accounts` command.
pub const ACCOUNT_FIELDS: [&str; 6] = [
    "code",
    "name",
    "account_type",
    "reconcile",
    "deprecated",
    "company_id",
];

/// Command errors.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The `--domain` argument is not a JSON domain.
    #[error("invalid domain: {0}")]
    InvalidDomain(#[source] serde_json::Error),

    /// A remote call failed.
    #[error(transparent)]
    Call(#[from] CallError),
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every readable model with its field count
    Models(ModelsArgs),

    /// Show the fields of one model
    Fields {
        /// Dotted model name, e.g. res.partner
        model: String,
    },

    /// List the active accounts of the chart of accounts
    Accounts,
}

#[derive(Args, Debug)]
pub struct ModelsArgs {
    /// Models requested per discovery page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Field schemas fetched concurrently
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Leave out models whose fields could not be read
    #[arg(long)]
    pub drop_bare: bool,

    /// Skip framework, technical and transient models
    #[arg(long, conflicts_with = "domain")]
    pub business_only: bool,

    /// Filter on ir.model as JSON, e.g. '[["model", "like", "sale.%"]]'
    #[arg(long)]
    pub domain: Option<String>,

    /// Print each model's fields too
    #[arg(long)]
    pub with_fields: bool,
}

impl ModelsArgs {
    /// Catalog options for these arguments.
    pub fn options(&self) -> Result<CatalogOptions, CommandError> {
        let domain = match &self.domain {
            Some(json) => serde_json::from_str(json).map_err(CommandError::InvalidDomain)?,
            None if self.business_only => Domain::business_models(),
            None => Domain::new(),
        };
        let policy = if self.drop_bare {
            BareModelPolicy::Drop
        } else {
            BareModelPolicy::Keep
        };

        Ok(CatalogOptions::new()
            .with_page_size(self.page_size)
            .with_chunk_size(self.chunk_size)
            .with_domain(domain)
            .with_bare_models(policy))
    }
}

/// Execute a command and return formatted output.
pub async fn execute<T: Transport>(
    client: &OdooClient<T>,
    command: &Command,
    formatter: &dyn Formatter,
) -> Result<String, CommandError> {
    match command {
        Command::Models(args) => {
            let catalog = client.get_models_report(&args.options()?).await?;
            info!(summary = %catalog.summary(), "catalog fetched");
            Ok(formatter.format_models(&catalog.models, args.with_fields))
        }
        Command::Fields { model } => {
            let fields = client.get_fields(model).await?;
            Ok(formatter.format_fields(model, &fields))
        }
        Command::Accounts => {
            let domain = Domain::new().eq("deprecated", false);
            let options = SearchReadOptions::new().with_order("code asc");
            let records = client
                .search_read_values(ACCOUNT_MODEL, &domain, &ACCOUNT_FIELDS, &options)
                .await?;
            Ok(formatter.format_records(&ACCOUNT_FIELDS, &records))
        }
    }
}
