//! Public page CLI command.

// CLI commands are allowed to use println! for output
#![allow(clippy::print_stdout)]

use super::render_public_page;
use crate::config::ReachmeConfig;
use crate::services::PublicPageLoader;
use anyhow::Context;

/// Prints the public page of `username`.
///
/// # Errors
///
/// Returns an error if the page cannot be loaded.
pub fn run(username: &str, config: &ReachmeConfig) -> anyhow::Result<()> {
    let page = PublicPageLoader::from_config(config)
        .load(username)
        .with_context(|| format!("failed to load the public page of {username}"))?;
    print!("{}", render_public_page(&page));
    Ok(())
}
