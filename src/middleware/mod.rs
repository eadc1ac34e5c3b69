/// Middleware module
///
/// Bearer-token gate for protected scopes.

mod auth_gate;

pub use auth_gate::{extract_bearer_token, AuthGate};
