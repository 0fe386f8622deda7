//! Search domains: the filter expressions attached to server-side searches.
//!
//! A domain is an ordered list of `(field, operator, value)` conditions,
//! implicitly combined with AND by the server. It serializes to a nested
//! array, e.g. `[["deprecated", "=", false]]`, with no reordering and no
//! coercion of the values.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::value::Value;
use crate::Error;

/// Comparison operator of a domain condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `like` (case-sensitive, `%` wildcards added by the server)
    Like,
    /// `not like`
    NotLike,
    /// `ilike` (case-insensitive)
    Ilike,
    /// `not ilike`
    NotIlike,
    /// `in`
    In,
    /// `not in`
    NotIn,
    /// `child_of` (hierarchical descendants, inclusive)
    ChildOf,
    /// `parent_of` (hierarchical ancestors, inclusive)
    ParentOf,
}

impl Operator {
    /// All operators, in wire-name order of the documentation.
    pub const ALL: [Operator; 14] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Ge,
        Operator::Lt,
        Operator::Le,
        Operator::Like,
        Operator::NotLike,
        Operator::Ilike,
        Operator::NotIlike,
        Operator::In,
        Operator::NotIn,
        Operator::ChildOf,
        Operator::ParentOf,
    ];

    /// The operator as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Like => "like",
            Operator::NotLike => "not like",
            Operator::Ilike => "ilike",
            Operator::NotIlike => "not ilike",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::ChildOf => "child_of",
            Operator::ParentOf => "parent_of",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| Error::InvalidMessage(format!("unknown domain operator {:?}", s)))
    }
}

/// A single `(field, operator, value)` filter triple.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Field name; dotted paths traverse relations.
    pub field: String,
    /// Comparison operator.
    pub operator: Operator,
    /// Right-hand operand.
    pub value: Value,
}

impl Condition {
    /// Create a condition.
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Wire form: a three-element array.
    pub fn to_value(&self) -> Value {
        Value::Array(vec![
            Value::String(self.field.clone()),
            Value::String(self.operator.as_str().to_string()),
            self.value.clone(),
        ])
    }
}

/// An ordered list of conditions. Empty means "every record".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Domain {
    conditions: Vec<Condition>,
}

impl Domain {
    /// Create an empty domain that matches all records.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a condition.
    pub fn filter(
        mut self,
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.conditions.push(Condition::new(field, operator, value));
        self
    }

    /// Append an equality condition.
    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, Operator::Eq, value)
    }

    /// Append a not-equal condition.
    pub fn ne(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, Operator::Ne, value)
    }

    /// Append a `like` condition.
    pub fn like(self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.filter(field, Operator::Like, pattern.into())
    }

    /// Append a `not like` condition.
    pub fn not_like(self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.filter(field, Operator::NotLike, pattern.into())
    }

    /// Append an `ilike` condition.
    pub fn ilike(self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.filter(field, Operator::Ilike, pattern.into())
    }

    /// Append an `in` condition.
    pub fn is_in(self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.filter(field, Operator::In, Value::Array(values))
    }

    /// Append a `not in` condition.
    pub fn not_in(self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.filter(field, Operator::NotIn, Value::Array(values))
    }

    /// Persistent, non-technical models a regular user is likely allowed to
    /// read: skips transient wizards, custom models and the framework's
    /// `ir`, `base`, `bus`, `mail`, `res` and `report` namespaces.
    pub fn business_models() -> Self {
        Domain::new()
            .eq("transient", false)
            .not_like("model", "base_%")
            .not_like("model", "ir.%")
            .not_like("model", "bus.%")
            .not_like("model", "mail.%")
            .not_like("model", "res.%")
            .not_like("model", "report.%")
            .eq("state", "base")
    }

    /// The conditions, in order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Number of conditions.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Whether this domain matches everything.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Wire form: an array of condition arrays.
    pub fn to_value(&self) -> Value {
        Value::Array(self.conditions.iter().map(Condition::to_value).collect())
    }
}

impl From<Vec<Condition>> for Domain {
    fn from(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }
}

impl FromIterator<Condition> for Domain {
    fn from_iter<I: IntoIterator<Item = Condition>>(iter: I) -> Self {
        Self {
            conditions: iter.into_iter().collect(),
        }
    }
}

impl From<&Domain> for Value {
    fn from(domain: &Domain) -> Self {
        domain.to_value()
    }
}

impl Serialize for Domain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().into_json().serialize(serializer)
    }
}

/// Accepts the JSON form of the wire encoding, e.g.
/// `[["state", "=", "base"], ["model", "not like", "ir.%"]]`.
impl<'de> Deserialize<'de> for Domain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let triples = Vec::<(String, String, serde_json::Value)>::deserialize(deserializer)?;
        triples
            .into_iter()
            .map(|(field, operator, value)| -> Result<Condition, D::Error> {
                let operator = operator.parse::<Operator>().map_err(D::Error::custom)?;
                Ok(Condition::new(field, operator, Value::from_json(value)))
            })
            .collect()
    }
}
