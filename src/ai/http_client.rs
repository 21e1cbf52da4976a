//! Shared HTTP Client Module
//!
//! Provides a global, lazy-initialized HTTP client for Gemini calls so repeated
//! scans reuse the pooled connection and TLS session instead of building a new
//! client per request.

use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

/// Global HTTP client for Gemini API calls
///
/// Configuration tuned for a single grounded generation per scan:
/// - 60s timeout; grounded answers with Maps lookups can take a while
/// - a handful of idle connections, scans are strictly sequential
/// - 90s idle timeout so back-to-back scans skip the handshake
pub static GEMINI_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(60))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .build()
        .expect("Failed to create Gemini HTTP client")
});

/// Get the global Gemini HTTP client
#[inline]
pub fn gemini_client() -> &'static Client {
    &GEMINI_CLIENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_is_same_instance() {
        let client1 = gemini_client();
        let client2 = gemini_client();
        assert!(std::ptr::eq(client1, client2));
    }
}
