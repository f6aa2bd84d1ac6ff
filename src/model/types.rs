//! Core data types shared by the search providers and the output renderer.

use serde_json::Value;

/// Uniform search result row.
///
/// Every provider maps each raw service result into one of these, so the
/// renderer never needs to know which service a row came from.
#[derive(Debug, Clone)]
pub struct ResultItem {
    pub title: String,
    pub subtitle: String,
    /// Canonical link opened by the primary action.
    pub url: String,
    /// Link for the secondary "open in editor" action, when the service
    /// has one for this result.
    pub edit_url: Option<String>,
    pub icon: ItemIcon,
}

/// Icon attached to a result row.
#[derive(Debug, Clone)]
pub enum ItemIcon {
    /// Bundled workflow asset, referenced by path.
    Asset(&'static str),
    /// Icon descriptor returned by the service, passed through verbatim.
    /// May be JSON null.
    Service(Value),
}

/// What to offer the user when a search comes back empty.
#[derive(Debug, Clone)]
pub struct SearchFallback {
    /// Service display name, e.g. "Confluence".
    pub service: &'static str,
    /// Query text as the user typed it.
    pub query: String,
    /// Full-text web search URL, for services that expose one.
    pub search_url: Option<String>,
}
