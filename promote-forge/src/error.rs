//! Error types for promote-forge.

use thiserror::Error;

/// Failures talking to the hosting API.
#[derive(Debug, Error)]
pub enum ForgeError {
    /// Non-2xx response.
    #[error("GET {url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// Connection, TLS, DNS or timeout failure.
    #[error("GET {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("GET {url} returned malformed JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("GET {url} response has no '{field}' field")]
    MissingField { url: String, field: &'static str },

    /// The listing never returned an empty page.
    #[error("listing {url} did not terminate after {pages} pages")]
    Pagination { url: String, pages: u32 },
}
