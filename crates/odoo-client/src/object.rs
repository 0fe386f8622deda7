//! Model calls on the object endpoint.

use std::collections::BTreeMap;

use odoo_proto::{Domain, Value, OBJECT_PATH};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{CallError, DecodeError};
use crate::models::{FieldDescriptor, FieldMap};
use crate::session::Session;
use crate::transport::Transport;

/// Attributes requested from `fields_get`.
pub const FIELD_ATTRIBUTES: [&str; 6] = [
    "string", "help", "type", "required", "readonly", "relation",
];

/// Paging and ordering of a `search_read`.
///
/// Unset values are sent as the server's neutral defaults: offset `0`,
/// limit `0` (no limit) and an empty order (model default).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchReadOptions {
    pub offset: Option<u32>,
    pub limit: Option<u32>,
    pub order: Option<String>,
}

impl SearchReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }
}

/// Invoke `model.method` through `execute_kw`.
pub async fn execute_kw<T>(
    transport: &T,
    session: &Session,
    model: &str,
    method: &str,
    params: Vec<Value>,
) -> Result<Value, CallError>
where
    T: Transport + ?Sized,
{
    let args = session.execute_kw_args(model, method, params);
    transport
        .call(OBJECT_PATH, "execute_kw", args)
        .await
        .map_err(|err| CallError::from_transport(model, method, err))
}

/// Positional parameters of a `search_read`.
pub(crate) fn search_read_params(
    domain: &Domain,
    fields: &[&str],
    options: &SearchReadOptions,
) -> Vec<Value> {
    let mut kwargs = BTreeMap::new();
    kwargs.insert(
        "fields".to_string(),
        Value::Array(fields.iter().map(|f| Value::from(*f)).collect()),
    );
    kwargs.insert("offset".to_string(), Value::from(options.offset.unwrap_or(0)));
    kwargs.insert("limit".to_string(), Value::from(options.limit.unwrap_or(0)));
    kwargs.insert(
        "order".to_string(),
        Value::from(options.order.clone().unwrap_or_default()),
    );

    vec![domain.to_value(), Value::Struct(kwargs)]
}

/// Read matching records as raw values.
pub async fn search_read_values<T>(
    transport: &T,
    session: &Session,
    model: &str,
    domain: &Domain,
    fields: &[&str],
    options: &SearchReadOptions,
) -> Result<Vec<Value>, CallError>
where
    T: Transport + ?Sized,
{
    let params = search_read_params(domain, fields, options);
    debug!(
        model,
        conditions = domain.len(),
        offset = ?options.offset,
        limit = ?options.limit,
        "search_read"
    );

    match execute_kw(transport, session, model, "search_read", params).await? {
        Value::Array(records) => Ok(records),
        other => {
            let context = format!("{} search_read result", model);
            Err(DecodeError::unexpected(context, "array", &other).into())
        }
    }
}

/// Read matching records and decode each into `R`.
pub async fn search_read<T, R>(
    transport: &T,
    session: &Session,
    model: &str,
    domain: &Domain,
    fields: &[&str],
    options: &SearchReadOptions,
) -> Result<Vec<R>, CallError>
where
    T: Transport + ?Sized,
    R: DeserializeOwned,
{
    let records = search_read_values(transport, session, model, domain, fields, options).await?;

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| -> Result<R, CallError> {
            serde_json::from_value(record.into_json()).map_err(|err| {
                DecodeError::new(format!("{} record {}", model, index), err.to_string()).into()
            })
        })
        .collect()
}

/// Fetch the field schema of one model.
pub async fn fields_get<T>(
    transport: &T,
    session: &Session,
    model: &str,
) -> Result<FieldMap, CallError>
where
    T: Transport + ?Sized,
{
    let mut options = BTreeMap::new();
    options.insert(
        "attributes".to_string(),
        Value::from(FIELD_ATTRIBUTES.to_vec()),
    );
    let params = vec![Value::Array(Vec::new()), Value::Struct(options)];

    let reply = execute_kw(transport, session, model, "fields_get", params).await?;
    let members = match reply {
        Value::Struct(members) => members,
        other => {
            let context = format!("{} fields_get result", model);
            return Err(DecodeError::unexpected(context, "struct", &other).into());
        }
    };

    members
        .into_iter()
        .map(|(name, value)| -> Result<(String, FieldDescriptor), CallError> {
            let field = serde_json::from_value(value.into_json()).map_err(|err| {
                DecodeError::new(format!("{}.{}", model, name), err.to_string())
            })?;
            Ok((name, field))
        })
        .collect()
}
