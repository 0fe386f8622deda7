//! Scripted in-memory Odoo server shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use odoo_client::proto::{fault_codes, Fault, Value, COMMON_PATH, OBJECT_PATH};
use odoo_client::{ClientConfig, OdooClient, Transport, TransportError};

pub const DB: &str = "test";
pub const USER: &str = "admin";
pub const PASSWORD: &str = "admin";
pub const UID: i64 = 2;

/// One call as the server saw it.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: String,
    pub method: String,
    pub params: Vec<Value>,
}

impl RecordedCall {
    /// Model method of an `execute_kw` call.
    pub fn model_method(&self) -> Option<(&str, &str)> {
        if self.method != "execute_kw" {
            return None;
        }
        Some((self.params.get(3)?.as_str()?, self.params.get(4)?.as_str()?))
    }

    /// Keyword arguments of a `search_read` call.
    pub fn kwargs(&self) -> Option<&Value> {
        self.params.get(6)
    }
}

/// Fake server: `ir.model` catalog, per-model field maps or faults, and
/// plain records for other models.
#[derive(Default)]
pub struct MockOdoo {
    models: Vec<(i64, String, String)>,
    fields: HashMap<String, Result<Value, Fault>>,
    records: HashMap<String, Vec<Value>>,
    catalog_fault: Option<Fault>,
    endless_catalog: bool,
    delay: Duration,
    calls: Mutex<Vec<RecordedCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockOdoo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, id: i64, model: &str, name: &str) -> Self {
        self.models.push((id, model.to_string(), name.to_string()));
        self
    }

    /// `count` models named `test.model0000` onwards, registered in reverse
    /// order so that the server has to sort them.
    pub fn with_generated_models(mut self, count: usize) -> Self {
        for i in (0..count).rev() {
            let id = i as i64 + 1;
            self.models
                .push((id, format!("test.model{:04}", i), format!("Test Model {}", i)));
        }
        self
    }

    pub fn with_fields(mut self, model: &str, fields: Value) -> Self {
        self.fields.insert(model.to_string(), Ok(fields));
        self
    }

    pub fn with_fields_fault(mut self, model: &str, fault: Fault) -> Self {
        self.fields.insert(model.to_string(), Err(fault));
        self
    }

    pub fn with_records(mut self, model: &str, records: Vec<Value>) -> Self {
        self.records.insert(model.to_string(), records);
        self
    }

    pub fn with_catalog_fault(mut self, fault: Fault) -> Self {
        self.catalog_fault = Some(fault);
        self
    }

    /// `ir.model` never returns an empty page.
    pub fn endless(mut self) -> Self {
        self.endless_catalog = true;
        self
    }

    /// Hold every call for `millis` before answering.
    pub fn with_delay(mut self, millis: u64) -> Self {
        self.delay = Duration::from_millis(millis);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// `execute_kw` calls of one model method, in order.
    pub fn calls_to(&self, model: &str, method: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.model_method() == Some((model, method)))
            .collect()
    }

    /// Largest number of calls observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Answer one call.
    pub fn respond(&self, path: &str, method: &str, params: Vec<Value>) -> Result<Value, Fault> {
        self.calls.lock().unwrap().push(RecordedCall {
            path: path.to_string(),
            method: method.to_string(),
            params: params.clone(),
        });

        match (path, method) {
            (COMMON_PATH, "authenticate") => self.authenticate(&params),
            (OBJECT_PATH, "execute_kw") => self.execute_kw(&params),
            _ => Err(Fault::new(
                fault_codes::APPLICATION_ERROR,
                format!("method \"{}\" is not supported on {}", method, path),
            )),
        }
    }

    fn authenticate(&self, params: &[Value]) -> Result<Value, Fault> {
        let arg = |i: usize| params.get(i).and_then(Value::as_str).unwrap_or_default();

        if arg(0) != DB {
            return Err(Fault::new(
                fault_codes::APPLICATION_ERROR,
                format!("FATAL:  database \"{}\" does not exist", arg(0)),
            ));
        }
        if arg(1) == USER && arg(2) == PASSWORD {
            Ok(Value::Int(UID))
        } else {
            Ok(Value::Bool(false))
        }
    }

    fn execute_kw(&self, params: &[Value]) -> Result<Value, Fault> {
        let authorized = params.first().and_then(Value::as_str) == Some(DB)
            && params.get(1).and_then(Value::as_i64) == Some(UID)
            && params.get(2).and_then(Value::as_str) == Some(PASSWORD);
        if !authorized {
            return Err(Fault::new(fault_codes::ACCESS_DENIED, "Access Denied"));
        }

        let model = params.get(3).and_then(Value::as_str).unwrap_or_default();
        let method = params.get(4).and_then(Value::as_str).unwrap_or_default();
        let kwarg = |key: &str| params.get(6).and_then(|kwargs| kwargs.get(key));

        match method {
            "search_read" => {
                let offset = kwarg("offset").and_then(Value::as_i64).unwrap_or(0) as usize;
                let limit = kwarg("limit").and_then(Value::as_i64).unwrap_or(0) as usize;
                if model == "ir.model" {
                    self.catalog_page(offset, limit)
                } else {
                    let records = self.records.get(model).cloned().unwrap_or_default();
                    Ok(Value::Array(page(records, offset, limit)))
                }
            }
            "fields_get" => match self.fields.get(model) {
                Some(scripted) => scripted.clone(),
                None => Ok(default_fields()),
            },
            other => Err(Fault::new(
                fault_codes::APPLICATION_ERROR,
                format!("'{}' object has no attribute '{}'", model, other),
            )),
        }
    }

    fn catalog_page(&self, offset: usize, limit: usize) -> Result<Value, Fault> {
        if let Some(fault) = &self.catalog_fault {
            return Err(fault.clone());
        }
        if self.endless_catalog {
            let id = offset as i64 + 1;
            return Ok(Value::Array(vec![model_record(
                id,
                &format!("endless.model{}", id),
                "Endless",
            )]));
        }

        let mut models = self.models.clone();
        models.sort_by(|a, b| a.1.cmp(&b.1));
        let records = models
            .iter()
            .map(|(id, model, name)| model_record(*id, model, name))
            .collect();
        Ok(Value::Array(page(records, offset, limit)))
    }
}

#[async_trait]
impl Transport for MockOdoo {
    async fn call(
        &self,
        path: &str,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Value, TransportError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let result = self.respond(path, method, params);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result.map_err(TransportError::Fault)
    }
}

fn page(records: Vec<Value>, offset: usize, limit: usize) -> Vec<Value> {
    let rest = records.into_iter().skip(offset);
    if limit == 0 {
        rest.collect()
    } else {
        rest.take(limit).collect()
    }
}

pub fn model_record(id: i64, model: &str, name: &str) -> Value {
    let mut record = BTreeMap::new();
    record.insert("id".to_string(), Value::Int(id));
    record.insert("model".to_string(), Value::from(model));
    record.insert("name".to_string(), Value::from(name));
    Value::Struct(record)
}

/// One `fields_get` entry as the server sends it.
pub fn field(field_type: &str, label: &str, required: bool, readonly: bool) -> Value {
    let mut attributes = BTreeMap::new();
    attributes.insert("type".to_string(), Value::from(field_type));
    attributes.insert("string".to_string(), Value::from(label));
    attributes.insert("required".to_string(), Value::Bool(required));
    attributes.insert("readonly".to_string(), Value::Bool(readonly));
    attributes.insert("help".to_string(), Value::Bool(false));
    Value::Struct(attributes)
}

pub fn fields(entries: Vec<(&str, Value)>) -> Value {
    Value::Struct(
        entries
            .into_iter()
            .map(|(name, attributes)| (name.to_string(), attributes))
            .collect(),
    )
}

pub fn default_fields() -> Value {
    fields(vec![
        ("display_name", field("char", "Display Name", false, true)),
        ("id", field("integer", "ID", false, true)),
    ])
}

pub fn config() -> ClientConfig {
    ClientConfig::new("http://odoo.test:8069", DB, USER, PASSWORD).unwrap()
}

/// A connected client over `mock`.
pub async fn connected(mock: &Arc<MockOdoo>) -> OdooClient<Arc<MockOdoo>> {
    let mut client = OdooClient::with_transport(config(), Arc::clone(mock));
    client.connect().await.unwrap();
    client
}
