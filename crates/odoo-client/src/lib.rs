//! Odoo Client - read-only introspection of Odoo servers over XML-RPC.
//!
//! This crate authenticates against an Odoo database, reads records with
//! `search_read`, fetches field schemas with `fields_get` and aggregates the
//! whole model catalog with bounded concurrency.
//!
//! # Quick Start
//!
//! ```no_run
//! use odoo_client::{CatalogOptions, ClientConfig, OdooClient, SearchReadOptions};
//! use odoo_proto::Domain;
//! use serde_json::Value;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = OdooClient::new(ClientConfig::from_env()?)?;
//!     client.connect().await?;
//!
//!     // Active accounts, ordered by code
//!     let accounts: Vec<Value> = client
//!         .search_read(
//!             "account.account",
//!             &Domain::new().eq("deprecated", false),
//!             &["code", "name"],
//!             &SearchReadOptions::new().with_order("code asc"),
//!         )
//!         .await?;
//!     println!("{} accounts", accounts.len());
//!
//!     // Business models only, with fields
//!     let options = CatalogOptions::new().with_domain(Domain::business_models());
//!     let catalog = client.get_models_report(&options).await?;
//!     println!("{}", catalog.summary());
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod object;
pub mod session;
pub mod transport;

pub use catalog::{
    BareModelPolicy, Catalog, CatalogOptions, CatalogSummary, ModelFailure, CATALOG_MODEL,
};
pub use client::OdooClient;
pub use config::ClientConfig;
pub use error::{AuthError, CallError, ConfigError, DecodeError, Error, TransportError};
pub use models::{FieldDescriptor, FieldMap, FieldType, ModelDescriptor};
pub use object::SearchReadOptions;
pub use session::{Session, SessionId};
pub use transport::{HttpTransport, Transport};

/// Re-export protocol types.
pub use odoo_proto as proto;
