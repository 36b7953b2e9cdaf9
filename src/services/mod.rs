//! Editor-facing services.
//!
//! [`EditorSession`] owns one cache per signed-in creator and hands out a
//! [`ResourceHook`] per resource. [`PublicPageLoader`] reads public pages
//! without touching the cache.

mod public;
mod resource;
mod session;

pub use public::PublicPageLoader;
pub use resource::ResourceHook;
pub use session::EditorSession;
