//! Output formatters for catalogs, field maps and records.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use odoo_client::{FieldMap, ModelDescriptor};
use odoo_proto::Value;

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format a model catalog, optionally with each model's fields.
    fn format_models(&self, models: &[ModelDescriptor], with_fields: bool) -> String;

    /// Format the field map of one model.
    fn format_fields(&self, model: &str, fields: &FieldMap) -> String;

    /// Format raw records, showing `columns` in order.
    fn format_records(&self, columns: &[&str], records: &[Value]) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_models(&self, models: &[ModelDescriptor], with_fields: bool) -> String {
        let mut table = Table::new();
        table.set_header(vec!["id", "model", "name", "fields"]);

        for model in models {
            let fields = match &model.fields {
                Some(fields) => fields.len().to_string(),
                None => "-".to_string(),
            };
            table.add_row(vec![
                Cell::new(model.id),
                Cell::new(&model.model),
                Cell::new(&model.name),
                Cell::new(fields),
            ]);
        }

        let mut output = format!("{}\n{} model(s)", table, models.len());

        if with_fields {
            for model in models {
                if let Some(fields) = &model.fields {
                    output.push_str("\n\n");
                    output.push_str(&self.format_fields(&model.model, fields));
                }
            }
        }

        output
    }

    fn format_fields(&self, model: &str, fields: &FieldMap) -> String {
        let mut table = Table::new();
        table.set_header(vec!["field", "type", "label", "required", "readonly", "relation"]);

        for (name, field) in fields {
            table.add_row(vec![
                Cell::new(name),
                Cell::new(&field.field_type),
                Cell::new(&field.label),
                Cell::new(flag(field.required)),
                Cell::new(flag(field.readonly)),
                Cell::new(field.relation.as_deref().unwrap_or("")),
            ]);
        }

        format!("{}\n{}\n{} field(s)", model, table, fields.len())
    }

    fn format_records(&self, columns: &[&str], records: &[Value]) -> String {
        if records.is_empty() {
            return "No results".to_string();
        }

        let mut table = Table::new();
        table.set_header(columns.to_vec());

        for record in records {
            let cells: Vec<Cell> = columns
                .iter()
                .map(|column| Cell::new(record.get(column).map(format_value).unwrap_or_default()))
                .collect();
            table.add_row(cells);
        }

        format!("{}\n{} row(s)", table, records.len())
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_models(&self, models: &[ModelDescriptor], with_fields: bool) -> String {
        let json = if with_fields {
            serde_json::to_value(models)
        } else {
            let bare: Vec<serde_json::Value> = models
                .iter()
                .map(|model| {
                    serde_json::json!({
                        "id": model.id,
                        "model": model.model,
                        "name": model.name,
                        "field_count": model.fields.as_ref().map(|fields| fields.len()),
                    })
                })
                .collect();
            Ok(serde_json::Value::Array(bare))
        };

        json.and_then(|json| serde_json::to_string_pretty(&json))
            .unwrap_or_else(|_| "[]".to_string())
    }

    fn format_fields(&self, _model: &str, fields: &FieldMap) -> String {
        serde_json::to_string_pretty(fields).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_records(&self, _columns: &[&str], records: &[Value]) -> String {
        let rows: Vec<serde_json::Value> = records.iter().cloned().map(Value::into_json).collect();
        serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        ""
    }
}

/// Format a record value for display.
///
/// Odoo sends `false` for empty non-boolean fields and `[id, name]` pairs
/// for many2one fields.
fn format_value(value: &Value) -> String {
    match value {
        Value::Nil => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Double(f) => f.to_string(),
        Value::String(s) | Value::DateTime(s) => s.clone(),
        Value::Base64(bytes) => format!("<{} bytes>", bytes.len()),
        Value::Array(items) => match items.as_slice() {
            [Value::Int(_), Value::String(name)] => name.clone(),
            items => items.iter().map(format_value).collect::<Vec<_>>().join(", "),
        },
        Value::Struct(_) => value.clone().into_json().to_string(),
    }
}
