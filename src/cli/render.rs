//! Plain-text rendering of cached records.

use crate::models::{Link, Product, Profile, PublicPage};
use std::fmt::Write;
use std::sync::Arc;

/// Renders links one per line, in display order.
#[must_use]
pub fn render_links(links: &[Arc<Link>]) -> String {
    if links.is_empty() {
        return "No links.\n".to_string();
    }
    let mut out = String::new();
    for link in links {
        let _ = writeln!(
            out,
            "{:>3}. [{}] {} <{}>  ({})",
            link.sort_order,
            active_mark(link.is_active),
            link.title,
            link.url,
            link.id
        );
    }
    out
}

/// Renders products one per line, in display order.
#[must_use]
pub fn render_products(products: &[Arc<Product>]) -> String {
    if products.is_empty() {
        return "No products.\n".to_string();
    }
    let mut out = String::new();
    for product in products {
        let _ = writeln!(
            out,
            "{:>3}. [{}] {}  {}  <{}>  ({})",
            product.sort_order,
            active_mark(product.is_active),
            product.title,
            price(product.price),
            product.product_url,
            product.id
        );
    }
    out
}

/// Renders a profile as labelled fields.
#[must_use]
pub fn render_profile(profile: &Profile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Username: @{}", profile.username);
    let _ = writeln!(out, "Name:     {}", profile.display_name());
    let _ = writeln!(out, "Bio:      {}", profile.bio.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "Avatar:   {}", profile.avatar_url.as_deref().unwrap_or("-"));
    out
}

/// Renders what a visitor of the public page sees.
#[must_use]
pub fn render_public_page(page: &PublicPage) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} (@{})", page.profile.display_name(), page.profile.username);
    if let Some(bio) = page.profile.bio.as_deref().filter(|bio| !bio.is_empty()) {
        let _ = writeln!(out, "{bio}");
    }

    let mut links = page.visible_links().peekable();
    if links.peek().is_some() {
        out.push_str("\nLinks:\n");
        for link in links {
            let _ = writeln!(out, "  {} <{}>", link.title, link.url);
        }
    }

    let mut products = page.visible_products().peekable();
    if products.peek().is_some() {
        out.push_str("\nShop:\n");
        for product in products {
            let _ = writeln!(
                out,
                "  {}  {}  <{}>",
                product.title,
                price(product.price),
                product.product_url
            );
        }
    }
    out
}

const fn active_mark(active: bool) -> &'static str {
    if active { "on " } else { "off" }
}

fn price(price: Option<f64>) -> String {
    price.map_or_else(|| "-".to_string(), |p| format!("{p:.2}"))
}
