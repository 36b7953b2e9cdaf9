//! CLI command implementations.
//!
//! Every editing command opens an [`EditorSession`](crate::EditorSession),
//! fetches the collection it touches and applies one optimistic mutation.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `links` | List, add, update, remove, reorder, toggle and sync links |
//! | `products` | Manage shop products |
//! | `profile` | Show or edit the signed-in creator's profile |
//! | `public` | Print a creator's public page (no token needed) |
//!
//! # Example Usage
//!
//! ```bash
//! # Add a link
//! reachme links add --title Blog --url https://example.com
//!
//! # Put three links in a new order
//! reachme links reorder 65f0c3 65f0a1 65f0b2
//!
//! # Show a public page
//! reachme public alice
//! ```

mod links;
mod products;
mod profile;
mod public;
mod render;

pub use links::LinksCommand;
pub use products::ProductsCommand;
pub use profile::ProfileCommand;
pub use render::{render_links, render_products, render_profile, render_public_page};

use crate::config::ReachmeConfig;
use crate::models::RecordId;
use crate::services::EditorSession;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Reachme - edit a link-in-bio page from the terminal.
#[derive(Debug, Parser)]
#[command(name = "reachme")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "REACHME_CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// API base URL (overrides configuration).
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage links.
    Links {
        /// Links subcommand.
        #[command(subcommand)]
        action: LinksCommand,
    },

    /// Manage shop products.
    Products {
        /// Products subcommand.
        #[command(subcommand)]
        action: ProductsCommand,
    },

    /// Show or edit the profile.
    Profile {
        /// Profile subcommand.
        #[command(subcommand)]
        action: ProfileCommand,
    },

    /// Print a creator's public page.
    Public {
        /// Username of the page.
        username: String,
    },
}

/// Runs a parsed command against the configured API.
///
/// # Errors
///
/// Returns an error if the session cannot be opened or the command fails.
pub fn run(command: Command, config: &ReachmeConfig) -> anyhow::Result<()> {
    match command {
        Command::Links { action } => with_session(config, |session| links::run(action, session)),
        Command::Products { action } => {
            with_session(config, |session| products::run(action, session))
        },
        Command::Profile { action } => {
            with_session(config, |session| profile::run(action, session))
        },
        Command::Public { username } => public::run(&username, config),
    }
}

/// Opens a session for one command and closes it afterwards.
fn with_session(
    config: &ReachmeConfig,
    command: impl FnOnce(&EditorSession) -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    let session = EditorSession::connect(config).context("failed to open editor session")?;
    let result = command(&session);
    session.close();
    result
}

/// Parses positional ids.
fn record_ids(raw: &[String]) -> Vec<RecordId> {
    raw.iter().map(|id| RecordId::new(id.trim())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_links_reorder() {
        let cli = Cli::try_parse_from(["reachme", "links", "reorder", "3", "1", "2"]).unwrap();
        match cli.command {
            Command::Links {
                action: LinksCommand::Reorder { ids },
            } => assert_eq!(ids, vec!["3", "1", "2"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "reachme",
            "public",
            "alice",
            "--verbose",
            "--api-url",
            "http://example.test/api",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.api_url.as_deref(), Some("http://example.test/api"));
    }

    #[test]
    fn test_links_add_requires_title_and_url() {
        assert!(Cli::try_parse_from(["reachme", "links", "add", "--title", "Blog"]).is_err());
    }

    #[test]
    fn test_record_ids_are_trimmed() {
        let ids = record_ids(&[" 1 ".to_string(), "2".to_string()]);
        assert_eq!(ids, vec![RecordId::new("1"), RecordId::new("2")]);
    }
}
