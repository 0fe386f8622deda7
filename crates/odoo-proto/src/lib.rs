//! Odoo wire protocol types and serialization.
//!
//! This crate defines the XML-RPC payloads exchanged with an Odoo server and
//! the search domain builder used to filter remote queries.
//!
//! # Modules
//!
//! - [`value`] - Dynamically-shaped XML-RPC values
//! - [`codec`] - `<methodCall>` / `<methodResponse>` encoding and faults
//! - [`domain`] - Search domain (filter triple) construction
//! - [`error`] - Protocol error types
//!
//! # Example
//!
//! ```
//! use odoo_proto::{Domain, MethodCall, MethodResponse, Value};
//!
//! let call = MethodCall::new(
//!     "search_read",
//!     vec![Domain::new().eq("deprecated", false).to_value()],
//! );
//! let xml = call.to_xml();
//! assert_eq!(MethodCall::from_xml(&xml).unwrap(), call);
//!
//! let response = MethodResponse::Success(Value::Int(2));
//! assert_eq!(MethodResponse::from_xml(&response.to_xml()).unwrap(), response);
//! ```

pub mod codec;
pub mod domain;
pub mod error;
pub mod value;
mod xml;

pub use error::Error;

// Re-export commonly used types at crate root
pub use codec::{fault_codes, Fault, MethodCall, MethodResponse};
pub use domain::{Condition, Domain, Operator};
pub use value::Value;

/// Endpoint path for authentication-class calls.
pub const COMMON_PATH: &str = "/xmlrpc/2/common";

/// Endpoint path for model (object) calls.
pub const OBJECT_PATH: &str = "/xmlrpc/2/object";
