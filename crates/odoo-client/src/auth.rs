//! Authentication against the common endpoint.

use odoo_proto::{Value, COMMON_PATH};
use tracing::{info, warn};

use crate::error::AuthError;
use crate::session::SessionId;
use crate::transport::Transport;

/// Exchange credentials for a user id.
///
/// Sends `authenticate(database, username, password, {})`. A reply that is
/// not a positive integer (Odoo answers `false` for bad credentials) is
/// [`AuthError::InvalidCredentials`]; any transport failure, faults
/// included, is [`AuthError::TransportFailure`].
pub async fn authenticate<T>(
    transport: &T,
    database: &str,
    username: &str,
    password: &str,
) -> Result<SessionId, AuthError>
where
    T: Transport + ?Sized,
{
    let params = vec![
        Value::from(database),
        Value::from(username),
        Value::from(password),
        Value::empty_struct(),
    ];

    let reply = transport.call(COMMON_PATH, "authenticate", params).await?;

    match reply.as_i64().and_then(SessionId::new) {
        Some(uid) => {
            info!(database, username, uid = uid.get(), "authenticated");
            Ok(uid)
        }
        None => {
            warn!(database, username, reply = reply.kind(), "authentication rejected");
            Err(AuthError::InvalidCredentials)
        }
    }
}
