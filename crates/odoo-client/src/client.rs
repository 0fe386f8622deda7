//! Odoo client API.
//!
//! This module provides the main `OdooClient` struct for introspecting an
//! Odoo server over XML-RPC.

use odoo_proto::{Domain, Value};
use serde::de::DeserializeOwned;

use crate::auth::authenticate;
use crate::catalog::{fetch_catalog, Catalog, CatalogOptions};
use crate::config::ClientConfig;
use crate::error::{AuthError, CallError, Error};
use crate::models::{FieldMap, ModelDescriptor};
use crate::object::{self, SearchReadOptions};
use crate::session::{Session, SessionId};
use crate::transport::{HttpTransport, Transport};

/// An Odoo client for reading models, records and field schemas.
///
/// # Example
///
/// ```no_run
/// use odoo_client::{ClientConfig, OdooClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ClientConfig::new("https://erp.example.com", "prod", "admin", "secret")?;
///     let mut client = OdooClient::new(config)?;
///
///     // Authenticate once
///     client.connect().await?;
///
///     // List every model with its fields
///     for model in client.get_models().await? {
///         println!("{} ({} fields)", model.model, model.field_count());
///     }
///     Ok(())
/// }
/// ```
pub struct OdooClient<T = HttpTransport> {
    config: ClientConfig,
    transport: T,
    session: Option<Session>,
}

impl OdooClient<HttpTransport> {
    /// Create a client talking HTTP(S) to the configured server.
    ///
    /// No request is made until [`connect`](Self::connect).
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> OdooClient<T> {
    /// Create a client over an arbitrary transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            session: None,
        }
    }

    /// Authenticate and keep the session for later calls.
    ///
    /// Calling this again re-authenticates and replaces the session.
    pub async fn connect(&mut self) -> Result<SessionId, AuthError> {
        let uid = authenticate(
            &self.transport,
            &self.config.database,
            &self.config.username,
            &self.config.password,
        )
        .await?;

        self.session = Some(Session::new(
            self.config.database.clone(),
            uid,
            self.config.password.clone(),
        ));
        Ok(uid)
    }

    /// The current session, or [`CallError::NotConnected`].
    pub fn session(&self) -> Result<&Session, CallError> {
        self.session.as_ref().ok_or(CallError::NotConnected)
    }

    /// Check if `connect` has succeeded.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Invoke an arbitrary read method on a model.
    pub async fn execute_kw(
        &self,
        model: &str,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Value, CallError> {
        object::execute_kw(&self.transport, self.session()?, model, method, params).await
    }

    /// Read records of `model` matching `domain`, decoded into `R`.
    pub async fn search_read<R: DeserializeOwned>(
        &self,
        model: &str,
        domain: &Domain,
        fields: &[&str],
        options: &SearchReadOptions,
    ) -> Result<Vec<R>, CallError> {
        object::search_read(&self.transport, self.session()?, model, domain, fields, options).await
    }

    /// Read records of `model` matching `domain` as raw values.
    pub async fn search_read_values(
        &self,
        model: &str,
        domain: &Domain,
        fields: &[&str],
        options: &SearchReadOptions,
    ) -> Result<Vec<Value>, CallError> {
        object::search_read_values(&self.transport, self.session()?, model, domain, fields, options)
            .await
    }

    /// Get the field schema of one model.
    pub async fn get_fields(&self, model: &str) -> Result<FieldMap, CallError> {
        object::fields_get(&self.transport, self.session()?, model).await
    }

    /// Discover every model and fetch its fields with default options.
    ///
    /// Models whose schema cannot be read are returned without fields.
    pub async fn get_models(&self) -> Result<Vec<ModelDescriptor>, CallError> {
        self.get_models_with(&CatalogOptions::default()).await
    }

    /// Discover models and fetch their fields.
    pub async fn get_models_with(
        &self,
        options: &CatalogOptions,
    ) -> Result<Vec<ModelDescriptor>, CallError> {
        Ok(self.get_models_report(options).await?.into_models())
    }

    /// Discover models and fetch their fields, keeping per-model failures.
    pub async fn get_models_report(&self, options: &CatalogOptions) -> Result<Catalog, CallError> {
        fetch_catalog(&self.transport, self.session()?, options).await
    }
}

impl<T> std::fmt::Debug for OdooClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OdooClient")
            .field("config", &self.config)
            .field("uid", &self.session.as_ref().map(Session::uid))
            .finish()
    }
}
