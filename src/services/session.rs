//! Editing session of the signed-in creator.

use super::ResourceHook;
use crate::cache::CacheStore;
use crate::config::ReachmeConfig;
use crate::models::{Link, OwnerId, Product, Profile, Record, ResourceKind, decode_record};
use crate::remote::{AssetUploader, HttpClient, RemoteClient};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::instrument;

/// One creator's cache and the hooks bound to it.
///
/// The cache lives exactly as long as the session; [`EditorSession::close`]
/// drops every cached collection.
#[derive(Debug)]
pub struct EditorSession {
    owner: OwnerId,
    store: Arc<CacheStore>,
    links: ResourceHook<Link>,
    products: ResourceHook<Product>,
    profile: ResourceHook<Profile>,
}

impl EditorSession {
    /// Opens a session for the creator `client` is authenticated as.
    ///
    /// Fetches `/profiles/me` to learn the owner and caches the profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be fetched or decoded.
    #[instrument(skip_all, fields(operation = "session.open", client = client.name()))]
    pub fn open(
        client: Arc<dyn RemoteClient>,
        uploader: Option<Arc<dyn AssetUploader>>,
    ) -> Result<Self> {
        let payload = client.get(ResourceKind::Profile.collection_path())?;
        let me: Profile = decode_record(payload)?;
        let owner = OwnerId::from(me.id());

        let store = Arc::new(CacheStore::new());
        let links = bind(&owner, &store, &client, uploader.as_ref());
        let products = bind(&owner, &store, &client, uploader.as_ref());
        let profile: ResourceHook<Profile> = bind(&owner, &store, &client, uploader.as_ref());
        store.replace_records(profile.key(), vec![me])?;

        tracing::info!(%owner, "Editor session opened");
        Ok(Self {
            owner,
            store,
            links,
            products,
            profile,
        })
    }

    /// Opens a session against the configured API over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if no API token is configured, or the
    /// error from [`EditorSession::open`].
    pub fn connect(config: &ReachmeConfig) -> Result<Self> {
        if config.api_token.is_none() {
            return Err(Error::Validation(
                "an API token is required to edit a page (set REACHME_API_TOKEN)".to_string(),
            ));
        }
        let http = Arc::new(HttpClient::from_config(config));
        let uploader: Arc<dyn AssetUploader> = Arc::clone(&http) as Arc<dyn AssetUploader>;
        Self::open(http, Some(uploader))
    }

    /// The signed-in creator.
    #[must_use]
    pub const fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// The session's cache.
    #[must_use]
    pub const fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    /// The creator's links.
    #[must_use]
    pub const fn links(&self) -> &ResourceHook<Link> {
        &self.links
    }

    /// The creator's shop products.
    #[must_use]
    pub const fn products(&self) -> &ResourceHook<Product> {
        &self.products
    }

    /// The creator's profile.
    #[must_use]
    pub const fn profile(&self) -> &ResourceHook<Profile> {
        &self.profile
    }

    /// Fetches every collection of the creator.
    ///
    /// # Errors
    ///
    /// Returns the first fetch error; collections fetched before it stay cached.
    pub fn load_all(&self) -> Result<()> {
        self.links.load()?;
        self.products.load()?;
        self.profile.load()?;
        Ok(())
    }

    /// Ends the session and drops its cache.
    pub fn close(self) {
        self.store.clear();
        tracing::info!(owner = %self.owner, "Editor session closed");
    }
}

fn bind<T: Record>(
    owner: &OwnerId,
    store: &Arc<CacheStore>,
    client: &Arc<dyn RemoteClient>,
    uploader: Option<&Arc<dyn AssetUploader>>,
) -> ResourceHook<T> {
    let hook = ResourceHook::new(owner.clone(), Arc::clone(store), Arc::clone(client));
    match uploader {
        Some(uploader) => hook.with_uploader(Arc::clone(uploader)),
        None => hook,
    }
}
