//! Read-only loader for a creator's public page.

use crate::config::ReachmeConfig;
use crate::models::{
    Link, OwnerId, Product, Profile, PublicPage, Record, ResourceKind, decode_record,
    decode_records,
};
use crate::remote::{HttpClient, RemoteClient};
use crate::{Error, Result};
use std::sync::Arc;
use std::thread;
use tracing::instrument;

/// Fetches public pages by username.
///
/// Public pages bypass the editing cache and need no credentials.
pub struct PublicPageLoader {
    client: Arc<dyn RemoteClient>,
}

impl PublicPageLoader {
    /// Creates a loader over `client`.
    #[must_use]
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        Self { client }
    }

    /// Creates an anonymous HTTP loader for the configured API.
    #[must_use]
    pub fn from_config(config: &ReachmeConfig) -> Self {
        Self::new(Arc::new(HttpClient::from_config(config).without_token()))
    }

    /// Loads the profile of `username`, then its links and products in parallel.
    ///
    /// # Errors
    ///
    /// Returns an error if the username is blank, the profile does not exist,
    /// or any of the three requests fails.
    #[instrument(skip(self), fields(operation = "public.load"))]
    pub fn load(&self, username: &str) -> Result<PublicPage> {
        let username = username.trim().trim_start_matches('@');
        if username.is_empty() {
            return Err(Error::Validation("username is required".to_string()));
        }

        let payload = self.client.get(&format!("/profiles/{username}"))?;
        if payload.is_null() {
            return Err(Error::Decode {
                resource: ResourceKind::Profile.as_str(),
                cause: format!("profile {username} not found"),
            });
        }
        let profile: Profile = decode_record(payload)?;
        let owner = OwnerId::from(profile.id());

        let (links, products) = thread::scope(|scope| {
            let links = scope.spawn(|| self.fetch::<Link>(&owner));
            let products = self.fetch::<Product>(&owner);
            let links = links.join().map_err(|_| Error::OperationFailed {
                operation: "load_public_links".to_string(),
                cause: "fetch thread panicked".to_string(),
            })?;
            Ok::<_, Error>((links?, products?))
        })?;

        tracing::debug!(
            %owner,
            links = links.len(),
            products = products.len(),
            "Public page loaded"
        );
        Ok(PublicPage::new(profile, links, products))
    }

    fn fetch<T: Record>(&self, owner: &OwnerId) -> Result<Vec<T>> {
        let Some(path) = T::KIND.public_path(owner) else {
            return Ok(Vec::new());
        };
        decode_records(self.client.get(&path)?)
    }
}
