pub mod auth;
pub mod model;
pub mod server;

pub use auth::{Credential, CredentialGate, CredentialSet};
pub use server::TraceServer;
