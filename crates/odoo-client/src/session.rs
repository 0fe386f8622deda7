//! Authenticated session state.

use std::fmt;

use odoo_proto::Value;

/// Positive user id returned by a successful authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(i64);

impl SessionId {
    /// Wrap a user id. Zero and negative ids are not sessions.
    pub fn new(uid: i64) -> Option<Self> {
        (uid > 0).then_some(Self(uid))
    }

    /// The raw user id.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The `(database, uid, password)` triple every model call carries.
///
/// The protocol is stateless: there is no server-side session, so the
/// password travels with each `execute_kw`.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    database: String,
    uid: SessionId,
    password: String,
}

impl Session {
    /// Create a session.
    pub fn new(database: impl Into<String>, uid: SessionId, password: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            uid,
            password: password.into(),
        }
    }

    /// Database name.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Authenticated user id.
    pub fn uid(&self) -> SessionId {
        self.uid
    }

    /// Full positional argument list of an `execute_kw` call.
    pub fn execute_kw_args(&self, model: &str, method: &str, params: Vec<Value>) -> Vec<Value> {
        let mut args = Vec::with_capacity(5 + params.len());
        args.push(Value::String(self.database.clone()));
        args.push(Value::Int(self.uid.get()));
        args.push(Value::String(self.password.clone()));
        args.push(Value::String(model.to_string()));
        args.push(Value::String(method.to_string()));
        args.extend(params);
        args
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("database", &self.database)
            .field("uid", &self.uid)
            .field("password", &"<redacted>")
            .finish()
    }
}
