//! XML-RPC method call and response encoding.
//!
//! Both directions are implemented: clients encode [`MethodCall`] and decode
//! [`MethodResponse`], and an in-process server (used by the test suites)
//! does the reverse.

use std::collections::BTreeMap;
use std::fmt::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::value::Value;
use crate::xml::{escape, Event, Reader};
use crate::Error;

/// Deepest array/struct nesting accepted when decoding.
pub const MAX_DEPTH: usize = 128;

/// Fault codes the server uses on the `/xmlrpc/2` endpoints.
pub mod fault_codes {
    /// Generic application error (carries a traceback).
    pub const APPLICATION_ERROR: i64 = 1;
    /// User-facing warning or validation error.
    pub const WARNING: i64 = 2;
    /// Authentication rejected.
    pub const ACCESS_DENIED: i64 = 3;
    /// Access rights violation on a model or record.
    pub const ACCESS_ERROR: i64 = 4;
}

/// A remote procedure invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    /// Remote method name.
    pub method: String,
    /// Positional parameters.
    pub params: Vec<Value>,
}

impl MethodCall {
    /// Create a new method call.
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Encode as an XML-RPC `<methodCall>` document.
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(256);
        out.push_str("<?xml version=\"1.0\"?>\n<methodCall><methodName>");
        out.push_str(&escape(&self.method));
        out.push_str("</methodName><params>");
        for param in &self.params {
            out.push_str("<param>");
            write_value(&mut out, param);
            out.push_str("</param>");
        }
        out.push_str("</params></methodCall>\n");
        out
    }

    /// Decode an XML-RPC `<methodCall>` document.
    pub fn from_xml(xml: &str) -> Result<Self, Error> {
        let mut reader = Reader::new(xml);
        reader.expect_start("methodCall")?;
        reader.expect_start("methodName")?;
        let method = reader.read_text("methodName")?.trim().to_string();

        let mut params = Vec::new();
        reader.skip_whitespace()?;
        if matches!(reader.peek()?, Some(Event::Start("params") | Event::Empty("params"))) {
            if !reader.expect_start("params")? {
                loop {
                    reader.skip_whitespace()?;
                    if matches!(reader.peek()?, Some(Event::End("params"))) {
                        break;
                    }
                    reader.expect_start("param")?;
                    params.push(read_value(&mut reader, 0)?);
                    reader.expect_end("param")?;
                }
                reader.expect_end("params")?;
            }
        }

        reader.expect_end("methodCall")?;
        reader.expect_eof()?;

        Ok(Self { method, params })
    }
}

/// A fault reported by the remote side instead of a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// Numeric fault code (see [`fault_codes`]).
    pub code: i64,
    /// Human-readable fault description; often a server traceback.
    pub message: String,
}

impl Fault {
    /// Create a new fault.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Whether the fault signals missing permissions rather than a bug.
    pub fn is_access_denied(&self) -> bool {
        if self.code == fault_codes::ACCESS_DENIED || self.code == fault_codes::ACCESS_ERROR {
            return true;
        }
        let message = self.message.trim_start();
        message.starts_with("Access")
            || message.contains("AccessError")
            || message.contains("AccessDenied")
            || message.contains("Access Denied")
    }

    fn to_value(&self) -> Value {
        let mut members = BTreeMap::new();
        members.insert("faultCode".to_string(), Value::Int(self.code));
        members.insert("faultString".to_string(), Value::String(self.message.clone()));
        Value::Struct(members)
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        let mut members = match value {
            Value::Struct(members) => members,
            other => {
                return Err(Error::InvalidMessage(format!(
                    "fault must be a struct, got {}",
                    other.kind()
                )))
            }
        };

        let message = match members.remove("faultString") {
            Some(Value::String(s)) => s,
            Some(other) => other.into_json().to_string(),
            None => String::new(),
        };

        // The legacy endpoints send the exception name as a string code.
        let (code, message) = match members.remove("faultCode") {
            Some(Value::Int(code)) => (code, message),
            Some(Value::String(text)) => match text.trim().parse::<i64>() {
                Ok(code) => (code, message),
                Err(_) if message.is_empty() => (fault_codes::APPLICATION_ERROR, text),
                Err(_) => (fault_codes::APPLICATION_ERROR, format!("{}: {}", text, message)),
            },
            Some(other) => {
                return Err(Error::InvalidMessage(format!(
                    "faultCode must be int or string, got {}",
                    other.kind()
                )))
            }
            None => return Err(Error::InvalidMessage("fault without faultCode".to_string())),
        };

        Ok(Self { code, message })
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fault {}: {}", self.code, self.message)
    }
}

/// The outcome of a remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    /// The single return value.
    Success(Value),
    /// The call failed on the remote side.
    Fault(Fault),
}

impl MethodResponse {
    /// Encode as an XML-RPC `<methodResponse>` document.
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(256);
        out.push_str("<?xml version=\"1.0\"?>\n<methodResponse>");
        match self {
            MethodResponse::Success(value) => {
                out.push_str("<params><param>");
                write_value(&mut out, value);
                out.push_str("</param></params>");
            }
            MethodResponse::Fault(fault) => {
                out.push_str("<fault>");
                write_value(&mut out, &fault.to_value());
                out.push_str("</fault>");
            }
        }
        out.push_str("</methodResponse>\n");
        out
    }

    /// Decode an XML-RPC `<methodResponse>` document.
    pub fn from_xml(xml: &str) -> Result<Self, Error> {
        let mut reader = Reader::new(xml);
        reader.expect_start("methodResponse")?;
        reader.skip_whitespace()?;

        let response = match reader.next_event()? {
            Some(Event::Start("params")) => {
                reader.expect_start("param")?;
                let value = read_value(&mut reader, 0)?;
                reader.expect_end("param")?;
                reader.expect_end("params")?;
                MethodResponse::Success(value)
            }
            Some(Event::Start("fault")) => {
                let value = read_value(&mut reader, 0)?;
                reader.expect_end("fault")?;
                MethodResponse::Fault(Fault::from_value(value)?)
            }
            Some(other) => {
                return Err(Error::InvalidMessage(format!(
                    "methodResponse must contain params or fault, found {:?}",
                    other
                )))
            }
            None => return Err(Error::UnexpectedEof("methodResponse".to_string())),
        };

        reader.expect_end("methodResponse")?;
        reader.expect_eof()?;

        Ok(response)
    }
}

fn write_value(out: &mut String, value: &Value) {
    out.push_str("<value>");
    match value {
        Value::Nil => out.push_str("<nil/>"),
        Value::Bool(b) => {
            out.push_str(if *b {
                "<boolean>1</boolean>"
            } else {
                "<boolean>0</boolean>"
            });
        }
        Value::Int(i) => {
            if i32::try_from(*i).is_ok() {
                let _ = write!(out, "<int>{}</int>", i);
            } else {
                let _ = write!(out, "<i8>{}</i8>", i);
            }
        }
        Value::Double(f) => {
            let _ = write!(out, "<double>{}</double>", f);
        }
        Value::String(s) => {
            out.push_str("<string>");
            out.push_str(&escape(s));
            out.push_str("</string>");
        }
        Value::DateTime(s) => {
            out.push_str("<dateTime.iso8601>");
            out.push_str(&escape(s));
            out.push_str("</dateTime.iso8601>");
        }
        Value::Base64(bytes) => {
            out.push_str("<base64>");
            out.push_str(&STANDARD.encode(bytes));
            out.push_str("</base64>");
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                write_value(out, item);
            }
            out.push_str("</data></array>");
        }
        Value::Struct(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                out.push_str("<member><name>");
                out.push_str(&escape(name));
                out.push_str("</name>");
                write_value(out, member);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
    }
    out.push_str("</value>");
}

fn read_value(reader: &mut Reader<'_>, depth: usize) -> Result<Value, Error> {
    if depth > MAX_DEPTH {
        return Err(Error::InvalidMessage(format!(
            "values nested deeper than {} levels",
            MAX_DEPTH
        )));
    }

    if reader.expect_start("value")? {
        return Ok(Value::String(String::new()));
    }

    // Untyped character data is a string, whitespace included.
    let mut text = String::new();
    loop {
        match reader.peek()? {
            Some(Event::Text(chunk)) => text.push_str(chunk),
            _ => break,
        }
        reader.next_event()?;
    }

    let value = match reader.next_event()? {
        Some(Event::End("value")) => return Ok(Value::String(text)),
        _ if !text.trim().is_empty() => {
            return Err(Error::InvalidMessage(
                "mixed text and typed content in <value>".to_string(),
            ))
        }
        Some(Event::Empty(tag)) => empty_scalar(tag)?,
        Some(Event::Start(tag)) => read_typed(reader, tag, depth)?,
        Some(Event::End(tag)) => {
            return Err(Error::UnexpectedTag {
                expected: "/value".to_string(),
                found: format!("/{}", tag),
            })
        }
        Some(Event::Text(_)) => {
            return Err(Error::InvalidMessage("unexpected text in <value>".to_string()))
        }
        None => return Err(Error::UnexpectedEof("value".to_string())),
    };

    reader.expect_end("value")?;
    Ok(value)
}

fn empty_scalar(tag: &str) -> Result<Value, Error> {
    match tag {
        "nil" | "ex:nil" => Ok(Value::Nil),
        "string" => Ok(Value::String(String::new())),
        "base64" => Ok(Value::Base64(Vec::new())),
        "array" => Ok(Value::Array(Vec::new())),
        "struct" => Ok(Value::empty_struct()),
        other => Err(Error::InvalidMessage(format!("empty <{}/> has no value", other))),
    }
}

fn read_typed(reader: &mut Reader<'_>, tag: &str, depth: usize) -> Result<Value, Error> {
    match tag {
        "int" | "i4" | "i8" => {
            let text = reader.read_text(tag)?;
            text.trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| Error::Deserialization(format!("invalid <{}> {:?}: {}", tag, text, e)))
        }
        "boolean" => match reader.read_text(tag)?.trim() {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            other => Err(Error::Deserialization(format!("invalid <boolean> {:?}", other))),
        },
        "double" => {
            let text = reader.read_text(tag)?;
            text.trim()
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|e| Error::Deserialization(format!("invalid <double> {:?}: {}", text, e)))
        }
        "string" => Ok(Value::String(reader.read_text(tag)?)),
        "dateTime.iso8601" => Ok(Value::DateTime(reader.read_text(tag)?.trim().to_string())),
        "base64" => {
            let text: String = reader
                .read_text(tag)?
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            STANDARD
                .decode(text)
                .map(Value::Base64)
                .map_err(|e| Error::Deserialization(format!("invalid <base64>: {}", e)))
        }
        "nil" | "ex:nil" => {
            reader.expect_end(tag)?;
            Ok(Value::Nil)
        }
        "array" => read_array(reader, depth),
        "struct" => read_struct(reader, depth),
        other => Err(Error::InvalidMessage(format!("unknown value type <{}>", other))),
    }
}

fn read_array(reader: &mut Reader<'_>, depth: usize) -> Result<Value, Error> {
    let mut items = Vec::new();
    if !reader.expect_start("data")? {
        loop {
            reader.skip_whitespace()?;
            if matches!(reader.peek()?, Some(Event::End("data"))) {
                reader.next_event()?;
                break;
            }
            items.push(read_value(reader, depth + 1)?);
        }
    }
    reader.expect_end("array")?;
    Ok(Value::Array(items))
}

fn read_struct(reader: &mut Reader<'_>, depth: usize) -> Result<Value, Error> {
    let mut members = BTreeMap::new();
    loop {
        reader.skip_whitespace()?;
        if matches!(reader.peek()?, Some(Event::End("struct"))) {
            reader.next_event()?;
            break;
        }
        reader.expect_start("member")?;
        reader.expect_start("name")?;
        let name = reader.read_text("name")?;
        let value = read_value(reader, depth + 1)?;
        reader.expect_end("member")?;
        members.insert(name, value);
    }
    Ok(Value::Struct(members))
}
