//! Client side of the codeguard rules backend: a transport seam, typed REST
//! calls, and a `Session` that keeps the local taxonomy in step with what the
//! backend confirmed.

pub mod api;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

pub use api::ApiClient;
pub use session::Session;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};

/// Session over HTTP for the given base URL.
pub fn connect(base_url: &str) -> codeguard_core::Result<Session<HttpTransport>> {
    let transport = HttpTransport::new(base_url)?;
    tracing::debug!(base_url = transport.base_url(), "rules backend configured");
    Ok(Session::new(ApiClient::new(transport)))
}
