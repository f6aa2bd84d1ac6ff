pub mod model;
pub mod output;
pub mod providers;

use std::io::Write;

use anyhow::Result;
use clap::{Parser, Subcommand};

use output::OutputMode;
use providers::confluence::{self, ConfluenceArgs, ConfluenceProvider};
use providers::notion::{self, NotionArgs, NotionProvider};
use providers::{SearchError, SearchProvider};

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "wqs",
    version,
    about = "Launcher-style quicksearch across Confluence and Notion"
)]
pub struct Cli {
    /// Log progress details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search Confluence pages and blog posts
    Confluence(ConfluenceArgs),
    /// Search Notion pages
    Notion(NotionArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let payload = match cli.command {
        Commands::Confluence(args) => {
            let mode = args.output;
            search_payload(confluence::LABEL, mode, ConfluenceProvider::from_args(args))
        }
        Commands::Notion(args) => {
            let mode = args.output;
            search_payload(notion::LABEL, mode, NotionProvider::from_args(args))
        }
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(payload.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Runs one provider pipeline to completion and renders whatever came out of
/// it. Any failure collapses into the single-item error payload, so the
/// caller always gets exactly one string to write.
fn search_payload<P: SearchProvider>(
    label: &str,
    mode: OutputMode,
    provider: Result<P, SearchError>,
) -> String {
    let rendered = provider.and_then(|provider| {
        let items = provider.search()?;
        Ok(output::render(&items, &provider.fallback(), mode))
    });

    match rendered {
        Ok(payload) => payload,
        Err(err) => {
            tracing::error!(%err, "search failed");
            output::error_payload(label, &err)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "workspace_quicksearch=debug"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{ItemIcon, ResultItem, SearchFallback};

    struct StubProvider {
        items: Vec<ResultItem>,
    }

    impl SearchProvider for StubProvider {
        fn search(&self) -> Result<Vec<ResultItem>, SearchError> {
            Ok(self.items.clone())
        }

        fn fallback(&self) -> SearchFallback {
            SearchFallback {
                service: "Stub",
                query: "roadmap".into(),
                search_url: None,
            }
        }
    }

    #[test]
    fn failed_construction_renders_the_error_payload() {
        let payload = search_payload::<StubProvider>(
            "Stub Search",
            OutputMode::Cli,
            Err(SearchError::MissingConfig("Token")),
        );
        let json: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(json["items"][0]["title"], "Error in Stub Search");
        assert_eq!(json["items"][0]["subtitle"], "Details: Token not specified.");
        assert_eq!(json["items"][0]["valid"], false);
    }

    #[test]
    fn successful_search_renders_the_requested_mode() {
        let provider = StubProvider {
            items: vec![ResultItem {
                title: "Doc".into(),
                subtitle: "sub".into(),
                url: "https://example.test/doc".into(),
                edit_url: None,
                icon: ItemIcon::Asset("./assets/content-type-page.png"),
            }],
        };
        let payload = search_payload("Stub Search", OutputMode::Cli, Ok(provider));
        assert_eq!(payload, "\u{b7} Doc\n    sub\n    https://example.test/doc");
    }

    #[test]
    fn empty_results_fall_back_per_service() {
        let payload = search_payload(
            "Stub Search",
            OutputMode::Alfred,
            Ok(StubProvider { items: Vec::new() }),
        );
        let json: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(json["items"], serde_json::json!([]));
    }
}
