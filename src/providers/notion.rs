//! Notion provider: POST search against the public v1 API.

use std::collections::HashMap;

use clap::Args;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, trace};

use crate::model::types::{ItemIcon, ResultItem, SearchFallback};
use crate::output::OutputMode;
use crate::providers::{read_body, SearchError, SearchProvider};

/// Service name used in the error payload title.
pub const LABEL: &str = "Notion Search";

const DEFAULT_BASE_URL: &str = "https://api.notion.com";
const SEARCH_PATH: &str = "/v1/search";
const API_VERSION: &str = "2022-06-28";

/// `wqs notion` options.
#[derive(Args, Debug)]
pub struct NotionArgs {
    /// Search text; multiple words are joined into one query
    #[arg(required = true)]
    pub text: Vec<String>,

    /// Integration token with read access to the searched pages
    #[arg(long, env = "CA_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// API base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub url: String,

    /// Output mode
    #[arg(short, long, value_enum, default_value_t = OutputMode::Cli)]
    pub output: OutputMode,

    /// Maximum number of results
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    pub limit: u32,
}

/// Validated Notion search, ready to execute.
#[derive(Debug)]
pub struct NotionProvider {
    query: String,
    limit: u32,
    base_url: String,
    token: String,
}

impl NotionProvider {
    pub fn from_args(args: NotionArgs) -> Result<Self, SearchError> {
        let token = args
            .token
            .filter(|token| !token.is_empty())
            .ok_or(SearchError::MissingConfig("Token"))?;
        Ok(Self {
            query: args.text.join(" "),
            limit: args.limit,
            base_url: args.url.trim_end_matches('/').to_string(),
            token,
        })
    }
}

impl SearchProvider for NotionProvider {
    fn search(&self) -> Result<Vec<ResultItem>, SearchError> {
        debug!(query = %self.query, limit = self.limit, "searching notion");

        let client = reqwest::blocking::Client::builder().build()?;
        let response = client
            .post(format!("{}{SEARCH_PATH}", self.base_url))
            .bearer_auth(&self.token)
            .header("Notion-Version", API_VERSION)
            .header("accept", "application/json")
            .json(&serde_json::json!({
                "page_size": self.limit,
                "query": self.query,
            }))
            .send()?;
        let body = read_body(response)?;
        trace!(%body, "notion response");

        let envelope: SearchEnvelope =
            serde_json::from_str(&body).map_err(|err| SearchError::Malformed(err.to_string()))?;
        debug!(results = envelope.results.len(), "notion search done");

        Ok(envelope.results.into_iter().map(map_result).collect())
    }

    fn fallback(&self) -> SearchFallback {
        SearchFallback {
            service: "Notion",
            query: self.query.clone(),
            search_url: None,
        }
    }
}

/// Maps one search result into a result row. The title is assembled from
/// the rich-text runs of whichever property carries the id `title`;
/// results without one are shown as "unknown".
fn map_result(page: Page) -> ResultItem {
    let title = page
        .properties
        .values()
        .find(|property| property.id == "title")
        .map(|property| {
            property
                .title
                .iter()
                .map(|run| run.plain_text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_else(|| "unknown".to_string());

    ResultItem {
        title,
        subtitle: page.last_edited_time,
        edit_url: Some(page.url.clone()),
        url: page.url,
        icon: ItemIcon::Service(page.icon),
    }
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    results: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    url: String,
    last_edited_time: String,
    /// Icon descriptor, forwarded untouched. Explicitly null for pages
    /// without an icon.
    icon: Value,
    #[serde(default)]
    properties: HashMap<String, PageProperty>,
}

#[derive(Debug, Deserialize)]
struct PageProperty {
    id: String,
    #[serde(default, deserialize_with = "title_runs")]
    title: Vec<TextRun>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    plain_text: String,
}

/// Runs of a `title` property. Search mixes pages and databases: a page
/// carries an array of rich-text runs here, a database carries its title
/// schema (an object), which holds no runs.
fn title_runs<'de, D>(deserializer: D) -> Result<Vec<TextRun>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(runs) => runs
            .into_iter()
            .map(|run| serde_json::from_value(run).map_err(serde::de::Error::custom))
            .collect(),
        _ => Ok(Vec::new()),
    }
}
