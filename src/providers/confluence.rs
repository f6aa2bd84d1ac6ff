//! Confluence provider: CQL quicksearch against the REST search endpoint.
//!
//! Works against both cloud instances (`*.atlassian.net`, served under the
//! `/wiki` path) and self-hosted datacenter installs (served at the root).

use clap::Args;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::model::types::{ItemIcon, ResultItem, SearchFallback};
use crate::output::OutputMode;
use crate::providers::{read_body, SearchError, SearchProvider};

/// Service name used in the error payload title.
pub const LABEL: &str = "Confluence Quicksearch";

const SEARCH_PATH: &str = "/rest/api/search";
/// Expansions required by the mapper: space names, published title emoji and
/// last-updated author all live behind these.
const EXPAND: &str =
    "content.space,content.metadata.properties.emoji_title_published,content.history.lastUpdated";

const PAGE_ICON: &str = "./assets/content-type-page.png";
const BLOGPOST_ICON: &str = "./assets/content-type-blogpost.png";

/// `wqs confluence` options.
#[derive(Args, Debug)]
pub struct ConfluenceArgs {
    /// Search text; multiple words are joined into one query
    #[arg(required = true)]
    pub text: Vec<String>,

    /// Base URL of the instance, e.g. https://acme.atlassian.net
    #[arg(long, env = "CA_URL")]
    pub url: Option<String>,

    /// Account the API token belongs to
    #[arg(long, env = "CA_USER")]
    pub user: Option<String>,

    /// API token used as the bearer credential
    #[arg(long, env = "CA_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Output mode
    #[arg(short, long, value_enum, default_value_t = OutputMode::Cli)]
    pub output: OutputMode,

    /// Restrict the search to one space key
    #[arg(short, long)]
    pub space: Option<String>,

    /// Maximum number of results
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    pub limit: u32,

    /// Content types to search, comma separated
    #[arg(
        short = 't',
        long = "type",
        value_delimiter = ',',
        default_values_t = [String::from("page"), String::from("blogpost")]
    )]
    pub types: Vec<String>,

    /// Search page content instead of titles
    #[arg(short, long)]
    pub content: bool,
}

/// Validated Confluence search, ready to execute.
#[derive(Debug)]
pub struct ConfluenceProvider {
    query: String,
    space: Option<String>,
    types: Vec<String>,
    limit: u32,
    search_content: bool,
    base_url: String,
    cloud: bool,
    token: String,
}

impl ConfluenceProvider {
    /// Merges flags with the `CA_*` environment (clap resolves that merge,
    /// flags winning) and rejects anything incomplete up front, before a
    /// request is attempted.
    pub fn from_args(args: ConfluenceArgs) -> Result<Self, SearchError> {
        let base_url = args
            .url
            .as_deref()
            .unwrap_or("")
            .trim_end_matches('/')
            .to_string();
        if base_url.is_empty() {
            return Err(SearchError::MissingConfig("URL"));
        }
        let user = args
            .user
            .filter(|user| !user.is_empty())
            .ok_or(SearchError::MissingConfig("User"))?;
        let token = args
            .token
            .filter(|token| !token.is_empty())
            .ok_or(SearchError::MissingConfig("Token"))?;

        let cloud = base_url.contains("atlassian.net") || base_url.contains("jira.com");
        debug!(user = %user, cloud, "resolved confluence instance");

        Ok(Self {
            query: args.text.join(" "),
            space: args.space.filter(|space| !space.is_empty()),
            types: args.types,
            limit: args.limit,
            search_content: args.content,
            base_url,
            cloud,
            token,
        })
    }

    /// Cloud instances serve the wiki under `/wiki`; datacenter installs
    /// serve it at the root.
    fn path_prefix(&self) -> &'static str {
        if self.cloud { "/wiki" } else { "" }
    }

    fn endpoint(&self) -> String {
        format!("{}{}{SEARCH_PATH}", self.base_url, self.path_prefix())
    }

    /// Builds the CQL expression. Double quotes in the query text are passed
    /// through unescaped, so a literal `"` corrupts the query.
    fn build_cql(&self) -> String {
        let field = if self.search_content { "text" } else { "title" };
        let mut cql = format!("{field} ~ \"{}\"", self.query);
        if let Some(space) = &self.space {
            cql.push_str(&format!(" AND space = \"{space}\""));
        }
        cql.push_str(&format!(" AND type IN ({})", self.types.join(",")));
        cql
    }

    fn map_result(&self, raw: &ResultEntry) -> Result<ResultItem, SearchError> {
        let content = &raw.content;
        let title = format!(
            "{}{}",
            emoji_prefix(&content.metadata.properties)?,
            content.title
        );
        let subtitle = format!(
            "Last Update: {1} by {2} | Space: {0}",
            content.space.name,
            raw.friendly_last_modified,
            content.history.last_updated.by.display_name
        );
        let url = format!("{}{}{}", self.base_url, self.path_prefix(), raw.url);
        let edit_url = self.edit_url(content)?;
        let icon = if content.content_type == "blogpost" {
            ItemIcon::Asset(BLOGPOST_ICON)
        } else {
            ItemIcon::Asset(PAGE_ICON)
        };
        debug!(space = %content.space.key, kind = %content.content_type, "mapped result");

        Ok(ResultItem {
            title,
            subtitle,
            url,
            edit_url,
            icon,
        })
    }

    /// Edit link for pages and blog posts. Cloud instances publish a ready
    /// `editui` link; datacenter installs use the classic edit action URL.
    fn edit_url(&self, content: &Content) -> Result<Option<String>, SearchError> {
        if content.content_type != "page" && content.content_type != "blogpost" {
            return Ok(None);
        }
        let url = if self.cloud {
            let editui = content.links.editui.as_deref().ok_or_else(|| {
                SearchError::Malformed(format!("content {} has no _links.editui", content.id))
            })?;
            format!("{}{}{editui}", self.base_url, self.path_prefix())
        } else {
            format!(
                "{}{}/pages/editpage.action?pageId={}",
                self.base_url,
                self.path_prefix(),
                content.id
            )
        };
        Ok(Some(url))
    }
}

impl SearchProvider for ConfluenceProvider {
    fn search(&self) -> Result<Vec<ResultItem>, SearchError> {
        let cql = self.build_cql();
        debug!(%cql, limit = self.limit, "searching confluence");

        let limit = self.limit.to_string();
        let client = reqwest::blocking::Client::builder().build()?;
        let response = client
            .get(self.endpoint())
            .bearer_auth(&self.token)
            .query(&[
                ("cql", cql.as_str()),
                ("limit", limit.as_str()),
                ("expand", EXPAND),
            ])
            .send()?;
        let body = read_body(response)?;
        trace!(%body, "confluence response");

        let envelope: SearchEnvelope =
            serde_json::from_str(&body).map_err(|err| SearchError::Malformed(err.to_string()))?;
        debug!(results = envelope.results.len(), "confluence search done");

        envelope
            .results
            .iter()
            .map(|raw| self.map_result(raw))
            .collect()
    }

    fn fallback(&self) -> SearchFallback {
        SearchFallback {
            service: "Confluence",
            query: self.query.clone(),
            search_url: Some(format!(
                "{}{}/search?text={}",
                self.base_url,
                self.path_prefix(),
                self.query
            )),
        }
    }
}

/// Decodes the published title emoji property (a bare hex codepoint such as
/// `1f680`) into a `"{emoji} "` title prefix.
fn emoji_prefix(properties: &MetadataProperties) -> Result<String, SearchError> {
    match &properties.emoji_title_published {
        Some(prop) => {
            let emoji = u32::from_str_radix(&prop.value, 16)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| {
                    SearchError::Malformed(format!("bad emoji codepoint {:?}", prop.value))
                })?;
            Ok(format!("{emoji} "))
        }
        None => Ok(String::new()),
    }
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    results: Vec<ResultEntry>,
}

#[derive(Debug, Deserialize)]
struct ResultEntry {
    content: Content,
    /// Instance-relative link to the rendered document.
    url: String,
    #[serde(rename = "friendlyLastModified")]
    friendly_last_modified: String,
}

#[derive(Debug, Deserialize)]
struct Content {
    id: String,
    #[serde(rename = "type")]
    content_type: String,
    title: String,
    space: Space,
    metadata: ContentMetadata,
    history: History,
    #[serde(rename = "_links", default)]
    links: ContentLinks,
}

#[derive(Debug, Deserialize)]
struct Space {
    key: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ContentMetadata {
    properties: MetadataProperties,
}

#[derive(Debug, Deserialize)]
struct MetadataProperties {
    // Underscores in the expand parameter, hyphens in the response.
    #[serde(rename = "emoji-title-published")]
    emoji_title_published: Option<EmojiProperty>,
}

#[derive(Debug, Deserialize)]
struct EmojiProperty {
    value: String,
}

#[derive(Debug, Deserialize)]
struct History {
    #[serde(rename = "lastUpdated")]
    last_updated: LastUpdated,
}

#[derive(Debug, Deserialize)]
struct LastUpdated {
    by: UpdatedBy,
}

#[derive(Debug, Deserialize)]
struct UpdatedBy {
    #[serde(rename = "displayName")]
    display_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ContentLinks {
    editui: Option<String>,
}
