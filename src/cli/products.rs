//! Products CLI command.

// CLI commands are allowed to use println! for output
#![allow(clippy::print_stdout)]
// CLI commands take owned values from clap parsing
#![allow(clippy::needless_pass_by_value)]

use super::{record_ids, render_products};
use crate::models::{Asset, ProductDraft, RecordId};
use crate::services::EditorSession;
use anyhow::{Context, bail};
use clap::Subcommand;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Products subcommands.
#[derive(Debug, Subcommand)]
pub enum ProductsCommand {
    /// List products in display order.
    List,

    /// Add a product at the end of the shop.
    Add {
        /// Display title.
        #[arg(short, long)]
        title: String,

        /// Where the product is sold.
        #[arg(short, long)]
        url: String,

        /// Price.
        #[arg(short, long)]
        price: Option<f64>,

        /// Product image URL.
        #[arg(long)]
        image: Option<String>,
    },

    /// Change a product's title, URL or price.
    Update {
        /// Product ID.
        id: String,

        /// New title.
        #[arg(short, long)]
        title: Option<String>,

        /// New URL.
        #[arg(short, long)]
        url: Option<String>,

        /// New price.
        #[arg(short, long)]
        price: Option<f64>,
    },

    /// Delete a product.
    Remove {
        /// Product ID.
        id: String,
    },

    /// Put products in a new order (every product ID, first to last).
    Reorder {
        /// Product IDs in the new order.
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// List or unlist a product.
    Toggle {
        /// Product ID.
        id: String,
    },

    /// Upload a product image.
    Image {
        /// Product ID.
        id: String,

        /// Image file.
        file: PathBuf,
    },
}

/// Runs a products subcommand.
///
/// # Errors
///
/// Returns an error if the products cannot be fetched or the mutation fails.
pub fn run(action: ProductsCommand, session: &EditorSession) -> anyhow::Result<()> {
    let products = session.products();
    products.load().context("failed to fetch products")?;

    match action {
        ProductsCommand::List => {},
        ProductsCommand::Add {
            title,
            url,
            price,
            image,
        } => {
            let mut draft = ProductDraft::new(title, url);
            draft.price = price;
            draft.image_url = image;
            let product = products.add(draft).context("failed to add product")?;
            println!("Added {} ({})", product.title, product.id);
        },
        ProductsCommand::Update {
            id,
            title,
            url,
            price,
        } => {
            let mut partial = Map::new();
            if let Some(title) = title {
                partial.insert("title".to_string(), Value::String(title));
            }
            if let Some(url) = url {
                partial.insert("product_url".to_string(), Value::String(url));
            }
            if let Some(price) = price {
                if !price.is_finite() || price < 0.0 {
                    bail!("price must be a non-negative number");
                }
                partial.insert("price".to_string(), Value::from(price));
            }
            if partial.is_empty() {
                bail!("nothing to update: pass --title, --url or --price");
            }
            let id = RecordId::new(id);
            if products.update(&id, Value::Object(partial))?.is_none() {
                bail!("no product with id {id}");
            }
        },
        ProductsCommand::Remove { id } => {
            let id = RecordId::new(id);
            if !products.remove(&id)? {
                bail!("no product with id {id}");
            }
        },
        ProductsCommand::Reorder { ids } => {
            products.reorder(&record_ids(&ids))?;
        },
        ProductsCommand::Toggle { id } => {
            let id = RecordId::new(id);
            let Some(product) = products.get(&id) else {
                bail!("no product with id {id}");
            };
            products.set_active(&id, !product.is_active)?;
        },
        ProductsCommand::Image { id, file } => {
            let asset = Asset::from_path(&file)?;
            let url = products.upload_asset(&RecordId::new(id), "image_url", &asset)?;
            println!("Uploaded {url}");
        },
    }

    print!("{}", render_products(&products.records()));
    Ok(())
}
