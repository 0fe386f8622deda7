//! Model and field descriptors.
//!
//! These are the typed shapes of `ir.model` records and `fields_get`
//! results. Both decode from the server reply through `serde`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Field metadata of one model, keyed by field name.
pub type FieldMap = BTreeMap<String, FieldDescriptor>;

/// One data model exposed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Record id in `ir.model`.
    pub id: i64,
    /// Dotted machine name, e.g. `res.partner`.
    pub model: String,
    /// Human-readable label.
    pub name: String,
    /// Field schema, absent when it was not (or could not be) fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldMap>,
}

impl ModelDescriptor {
    /// Create a bare descriptor.
    pub fn new(id: i64, model: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            model: model.into(),
            name: name.into(),
            fields: None,
        }
    }

    /// Attach a field map.
    pub fn with_fields(mut self, fields: FieldMap) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Whether the field schema is present.
    pub fn is_enriched(&self) -> bool {
        self.fields.is_some()
    }

    /// Number of fields, zero for a bare descriptor.
    pub fn field_count(&self) -> usize {
        self.fields.as_ref().map_or(0, BTreeMap::len)
    }
}

/// Metadata of one field, restricted to the attributes the client requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(rename = "string", default)]
    pub label: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub readonly: bool,

    /// Target model of relational fields.
    #[serde(
        default,
        deserialize_with = "false_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub relation: Option<String>,

    #[serde(
        default,
        deserialize_with = "false_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub help: Option<String>,
}

impl FieldDescriptor {
    /// Create a descriptor with no relation or help text.
    pub fn new(field_type: FieldType, label: impl Into<String>) -> Self {
        Self {
            field_type,
            label: label.into(),
            required: false,
            readonly: false,
            relation: None,
            help: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// Odoo field type. Unknown types are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Char,
    Text,
    Html,
    Integer,
    Float,
    Monetary,
    Boolean,
    Date,
    Datetime,
    Binary,
    Selection,
    Many2one,
    One2many,
    Many2many,
    Reference,
    Many2oneReference,
    Json,
    Properties,
    Other(String),
}

impl FieldType {
    /// Wire name of the type.
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Char => "char",
            FieldType::Text => "text",
            FieldType::Html => "html",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Monetary => "monetary",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Binary => "binary",
            FieldType::Selection => "selection",
            FieldType::Many2one => "many2one",
            FieldType::One2many => "one2many",
            FieldType::Many2many => "many2many",
            FieldType::Reference => "reference",
            FieldType::Many2oneReference => "many2one_reference",
            FieldType::Json => "json",
            FieldType::Properties => "properties",
            FieldType::Other(name) => name,
        }
    }

    /// Whether fields of this type point at another model.
    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            FieldType::Many2one
                | FieldType::One2many
                | FieldType::Many2many
                | FieldType::Many2oneReference
        )
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "char" => FieldType::Char,
            "text" => FieldType::Text,
            "html" => FieldType::Html,
            "integer" => FieldType::Integer,
            "float" => FieldType::Float,
            "monetary" => FieldType::Monetary,
            "boolean" => FieldType::Boolean,
            "date" => FieldType::Date,
            "datetime" => FieldType::Datetime,
            "binary" => FieldType::Binary,
            "selection" => FieldType::Selection,
            "many2one" => FieldType::Many2one,
            "one2many" => FieldType::One2many,
            "many2many" => FieldType::Many2many,
            "reference" => FieldType::Reference,
            "many2one_reference" => FieldType::Many2oneReference,
            "json" => FieldType::Json,
            "properties" => FieldType::Properties,
            _ => FieldType::Other(name),
        }
    }
}

impl From<&str> for FieldType {
    fn from(name: &str) -> Self {
        FieldType::from(name.to_string())
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Odoo sends `false` where a value is absent.
fn false_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrFalse {
        String(String),
        Bool(#[allow(dead_code)] bool),
    }

    Ok(match Option::<StringOrFalse>::deserialize(deserializer)? {
        Some(StringOrFalse::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    })
}
