//! Profile CLI command.

// CLI commands are allowed to use println! for output
#![allow(clippy::print_stdout)]
// CLI commands take owned values from clap parsing
#![allow(clippy::needless_pass_by_value)]

use super::render_profile;
use crate::models::Asset;
use crate::services::EditorSession;
use anyhow::{Context, bail};
use clap::Subcommand;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Profile subcommands.
#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Show the profile.
    Show,

    /// Change the display name or bio.
    Set {
        /// Display name.
        #[arg(short = 'n', long)]
        full_name: Option<String>,

        /// Short bio.
        #[arg(short, long)]
        bio: Option<String>,
    },

    /// Upload a new avatar.
    Avatar {
        /// Image file.
        file: PathBuf,
    },
}

/// Runs a profile subcommand.
///
/// # Errors
///
/// Returns an error if the profile cannot be fetched or updated.
pub fn run(action: ProfileCommand, session: &EditorSession) -> anyhow::Result<()> {
    let profile = session.profile();

    match action {
        ProfileCommand::Show => {},
        ProfileCommand::Set { full_name, bio } => {
            let mut partial = Map::new();
            if let Some(full_name) = full_name {
                partial.insert("full_name".to_string(), Value::String(full_name));
            }
            if let Some(bio) = bio {
                partial.insert("bio".to_string(), Value::String(bio));
            }
            if partial.is_empty() {
                bail!("nothing to update: pass --full-name or --bio");
            }
            profile
                .update_profile(Value::Object(partial))
                .context("failed to update profile")?;
        },
        ProfileCommand::Avatar { file } => {
            let asset = Asset::from_path(&file)?;
            let url = profile.upload_avatar(&asset).context("failed to upload avatar")?;
            println!("Uploaded {url}");
        },
    }

    let Some(current) = profile.current() else {
        bail!("profile is not loaded");
    };
    print!("{}", render_profile(&current));
    Ok(())
}
