//! Links CLI command.

// CLI commands are allowed to use println! for output
#![allow(clippy::print_stdout)]
// CLI commands take owned values from clap parsing
#![allow(clippy::needless_pass_by_value)]

use super::{record_ids, render_links};
use crate::models::{Asset, LinkDraft, RecordId};
use crate::services::EditorSession;
use anyhow::{Context, bail};
use clap::Subcommand;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Links subcommands.
#[derive(Debug, Subcommand)]
pub enum LinksCommand {
    /// List links in display order.
    List,

    /// Add a link at the end of the page.
    Add {
        /// Display title.
        #[arg(short, long)]
        title: String,

        /// Target URL.
        #[arg(short, long)]
        url: String,

        /// Thumbnail image URL.
        #[arg(long)]
        thumbnail: Option<String>,

        /// Create the link hidden.
        #[arg(long)]
        hidden: bool,
    },

    /// Change a link's title or URL.
    Update {
        /// Link ID.
        id: String,

        /// New title.
        #[arg(short, long)]
        title: Option<String>,

        /// New URL.
        #[arg(short, long)]
        url: Option<String>,
    },

    /// Delete a link.
    Remove {
        /// Link ID.
        id: String,
    },

    /// Put links in a new order (every link ID, first to last).
    Reorder {
        /// Link IDs in the new order.
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Show a hidden link or hide a shown one.
    Toggle {
        /// Link ID.
        id: String,
    },

    /// Refresh a dynamic feed link from its source.
    Sync {
        /// Link ID.
        id: String,
    },

    /// Upload a thumbnail image for a link.
    Thumbnail {
        /// Link ID.
        id: String,

        /// Image file.
        file: PathBuf,
    },
}

/// Runs a links subcommand.
///
/// # Errors
///
/// Returns an error if the links cannot be fetched or the mutation fails.
pub fn run(action: LinksCommand, session: &EditorSession) -> anyhow::Result<()> {
    let links = session.links();
    links.load().context("failed to fetch links")?;

    match action {
        LinksCommand::List => {},
        LinksCommand::Add {
            title,
            url,
            thumbnail,
            hidden,
        } => {
            let mut draft = LinkDraft::new(title, url);
            draft.thumbnail_url = thumbnail;
            draft.is_active = !hidden;
            let link = links.add(draft).context("failed to add link")?;
            println!("Added {} ({})", link.title, link.id);
        },
        LinksCommand::Update { id, title, url } => {
            let mut partial = Map::new();
            if let Some(title) = title {
                partial.insert("title".to_string(), Value::String(title));
            }
            if let Some(url) = url {
                partial.insert("url".to_string(), Value::String(url));
            }
            if partial.is_empty() {
                bail!("nothing to update: pass --title or --url");
            }
            let id = RecordId::new(id);
            if links.update(&id, Value::Object(partial))?.is_none() {
                bail!("no link with id {id}");
            }
        },
        LinksCommand::Remove { id } => {
            let id = RecordId::new(id);
            if !links.remove(&id)? {
                bail!("no link with id {id}");
            }
        },
        LinksCommand::Reorder { ids } => {
            links.reorder(&record_ids(&ids))?;
        },
        LinksCommand::Toggle { id } => {
            let id = RecordId::new(id);
            let Some(link) = links.get(&id) else {
                bail!("no link with id {id}");
            };
            links.set_active(&id, !link.is_active)?;
        },
        LinksCommand::Sync { id } => {
            let id = RecordId::new(id);
            if links.sync_feed(&id)?.is_none() {
                bail!("no link with id {id}");
            }
        },
        LinksCommand::Thumbnail { id, file } => {
            let asset = Asset::from_path(&file)?;
            let url = links.upload_asset(&RecordId::new(id), "thumbnail_url", &asset)?;
            println!("Uploaded {url}");
        },
    }

    print!("{}", render_links(&links.records()));
    Ok(())
}
