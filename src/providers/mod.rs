//! Remote search providers.
//!
//! Each provider owns one pipeline: build the service-specific query from the
//! validated options, issue a single blocking request, and map the raw JSON
//! results into uniform [`ResultItem`]s.

pub mod confluence;
pub mod notion;

use thiserror::Error;

use crate::model::types::{ResultItem, SearchFallback};

/// Failures surfaced to the user as a single invalid launcher item.
#[derive(Debug, Error)]
pub enum SearchError {
    /// A required option was missing after merging flags and environment.
    #[error("{0} not specified.")]
    MissingConfig(&'static str),

    /// The service answered with a non-200 status. The body is kept verbatim
    /// so the user sees exactly what the service said.
    #[error("Response {status} ({body})")]
    Remote { status: u16, body: String },

    /// The service answered 200 but the payload did not have the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The request never completed (DNS, TLS, connect, read).
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// A remote document-search service: one query, one request, uniform results.
pub trait SearchProvider {
    /// Issues the search and maps the response into result rows.
    fn search(&self) -> Result<Vec<ResultItem>, SearchError>;

    /// Zero-result presentation for this service.
    fn fallback(&self) -> SearchFallback;
}

/// Reads the response body, accepting only HTTP 200.
pub(crate) fn read_body(response: reqwest::blocking::Response) -> Result<String, SearchError> {
    let status = response.status().as_u16();
    let body = response.text()?;
    if status != 200 {
        return Err(SearchError::Remote { status, body });
    }
    Ok(body)
}
