//! Rendering of search results into the final stdout payload.
//!
//! Two shapes, chosen per run: `cli` is a line-oriented text report, `alfred`
//! is a Script Filter JSON object with a single top-level `items` array.
//! Failures never reach the result renderers; they go through
//! [`error_payload`], which emits launcher JSON regardless of the requested
//! mode so the calling UI always receives something it can parse.

use std::fmt;

use clap::ValueEnum;
use serde::Serialize;
use serde_json::{json, Value};

use crate::model::types::{ItemIcon, ResultItem, SearchFallback};

const SEARCH_ICON: &str = "./assets/search-for.png";

/// Supported output modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputMode {
    /// Line-oriented text report
    #[default]
    Cli,
    /// Alfred Script Filter JSON
    Alfred,
}

/// One entry of the launcher payload.
///
/// Optional fields are omitted from the JSON entirely when unset, so the
/// three item shapes (result, zero-result fallback, error) serialize with
/// exactly the keys the launcher has always received.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LauncherItem {
    pub title: String,
    pub subtitle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mods: Option<Mods>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<ItemText>,
}

/// Modifier-key actions attached to a launcher item.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Mods {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd: Option<ModAction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModAction {
    pub valid: bool,
    pub arg: String,
    pub subtitle: String,
}

/// Copy and large-type text attached to a launcher item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemText {
    pub copy: String,
    pub largetype: String,
}

#[derive(Serialize)]
struct Feedback {
    items: Vec<LauncherItem>,
}

/// Renders the final payload for the selected mode.
pub fn render(items: &[ResultItem], fallback: &SearchFallback, mode: OutputMode) -> String {
    match mode {
        OutputMode::Cli => render_text(items, fallback),
        OutputMode::Alfred => render_launcher(items, fallback),
    }
}

fn render_text(items: &[ResultItem], fallback: &SearchFallback) -> String {
    if items.is_empty() {
        return match &fallback.search_url {
            Some(url) => format!(
                "No search results found\n    Search {} for '{}':\n    {}",
                fallback.service, fallback.query, url
            ),
            None => format!(
                "No search results found\n    No {} pages matched '{}'",
                fallback.service, fallback.query
            ),
        };
    }

    let mut out = String::new();
    for item in items {
        out.push_str(&format!("· {}\n", item.title));
        out.push_str(&format!("    {}\n", item.subtitle));
        out.push_str(&format!("    {}", item.url));
    }
    out
}

fn render_launcher(items: &[ResultItem], fallback: &SearchFallback) -> String {
    let mut launcher_items: Vec<LauncherItem> = Vec::with_capacity(items.len().max(1));

    if items.is_empty() {
        if let Some(url) = &fallback.search_url {
            launcher_items.push(LauncherItem {
                title: "No search results".to_string(),
                subtitle: format!(
                    "Hit <enter> to do a full-text search for '{}' in {}",
                    fallback.query, fallback.service
                ),
                arg: Some(url.clone()),
                icon: Some(json!({ "path": SEARCH_ICON })),
                ..LauncherItem::default()
            });
        }
    }

    for item in items {
        launcher_items.push(launcher_item(item));
    }

    feedback_json(launcher_items)
}

fn launcher_item(item: &ResultItem) -> LauncherItem {
    LauncherItem {
        title: item.title.clone(),
        subtitle: item.subtitle.clone(),
        arg: Some(item.url.clone()),
        icon: Some(icon_value(&item.icon)),
        valid: None,
        mods: Some(Mods {
            cmd: item.edit_url.as_ref().map(|edit| ModAction {
                valid: true,
                arg: edit.clone(),
                subtitle: "Open in editor".to_string(),
            }),
        }),
        text: Some(ItemText {
            copy: item.url.clone(),
            largetype: item.url.clone(),
        }),
    }
}

fn icon_value(icon: &ItemIcon) -> Value {
    match icon {
        ItemIcon::Asset(path) => json!({ "path": path }),
        ItemIcon::Service(value) => value.clone(),
    }
}

/// Builds the single-item payload surfaced on any failure. Always launcher
/// JSON, whatever output mode was requested.
pub fn error_payload(label: &str, err: &impl fmt::Display) -> String {
    let details = err.to_string();
    feedback_json(vec![LauncherItem {
        title: format!("Error in {label}"),
        subtitle: format!("Details: {details}"),
        valid: Some(false),
        text: Some(ItemText {
            copy: details.clone(),
            largetype: details,
        }),
        ..LauncherItem::default()
    }])
}

fn feedback_json(items: Vec<LauncherItem>) -> String {
    serde_json::to_string(&Feedback { items })
        .unwrap_or_else(|_| r#"{"items":[]}"#.to_string())
}
