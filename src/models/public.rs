//! The visitor-facing page.

use super::{Link, Product, Profile};

/// Everything a visitor sees on a creator's page.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicPage {
    /// The creator's profile.
    pub profile: Profile,
    /// Links in display order.
    pub links: Vec<Link>,
    /// Shop products in display order.
    pub products: Vec<Product>,
}

impl PublicPage {
    /// Builds a page, ordering links and products by `sort_order`.
    #[must_use]
    pub fn new(profile: Profile, mut links: Vec<Link>, mut products: Vec<Product>) -> Self {
        links.sort_by_key(|link| link.sort_order);
        products.sort_by_key(|product| product.sort_order);
        Self {
            profile,
            links,
            products,
        }
    }

    /// Links the visitor can see.
    pub fn visible_links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(|link| link.is_active)
    }

    /// Products the visitor can see.
    pub fn visible_products(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|product| product.is_active)
    }
}
