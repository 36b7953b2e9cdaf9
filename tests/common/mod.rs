//! In-process stand-in for the REST API.
//!
//! `MockRemote` records every call, answers from canned routes, echoes creates
//! with a server id, and can be told to fail.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use reachme::models::{Asset, CollectionKey, Link, OwnerId, ResourceKind};
use reachme::{AssetUploader, CacheStore, Error, RemoteClient, ResourceHook, Result};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One recorded call.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

type Inspector = Box<dyn Fn(&Request) + Send + Sync>;

#[derive(Default)]
pub struct MockRemote {
    requests: Mutex<Vec<Request>>,
    routes: Mutex<HashMap<(&'static str, String), Value>>,
    failing_paths: Mutex<HashSet<String>>,
    fail_all: AtomicBool,
    created: AtomicUsize,
    delay: Mutex<Option<Duration>>,
    inspector: Mutex<Option<Inspector>>,
}

impl MockRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A remote whose `/profiles/me` is the creator `owner`.
    pub fn signed_in(owner: &str) -> Arc<Self> {
        let remote = Self::new();
        remote.route(
            "GET",
            "/profiles/me",
            json!({"_id": owner, "username": owner, "full_name": "Test Creator"}),
        );
        remote
    }

    /// Answers `method path` with `answer`.
    pub fn route(&self, method: &'static str, path: &str, answer: Value) {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), answer);
    }

    /// Makes every call fail.
    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Makes every call to `path` fail.
    pub fn fail_path(&self, path: &str) {
        self.failing_paths.lock().unwrap().insert(path.to_string());
    }

    /// Sleeps this long inside every call.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Runs `inspect` inside every call, before it answers.
    pub fn inspect(&self, inspect: impl Fn(&Request) + Send + Sync + 'static) {
        *self.inspector.lock().unwrap() = Some(Box::new(inspect));
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    /// Calls other than the initial `GET`s.
    pub fn writes(&self) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|request| request.method != "GET")
            .collect()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn call(&self, method: &'static str, path: &str, body: Option<&Value>) -> Result<Option<Value>> {
        let request = Request {
            method,
            path: path.to_string(),
            body: body.cloned(),
        };
        self.requests.lock().unwrap().push(request.clone());

        if let Some(inspect) = self.inspector.lock().unwrap().as_ref() {
            inspect(&request);
        }
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        if self.fail_all.load(Ordering::SeqCst) || self.failing_paths.lock().unwrap().contains(path)
        {
            return Err(Error::Request {
                method,
                path: path.to_string(),
                status: None,
                cause: "connection reset".to_string(),
            });
        }

        if let Some(answer) = self.routes.lock().unwrap().get(&(method, path.to_string())) {
            return Ok(Some(answer.clone()));
        }

        // Creates echo the payload with a server id.
        if method == "POST" && !path.contains("/sync") {
            if let Some(Value::Object(fields)) = body {
                let n = self.created.fetch_add(1, Ordering::SeqCst);
                let mut record = fields.clone();
                record.insert("_id".to_string(), Value::String(format!("srv-{n}")));
                return Ok(Some(Value::Object(record)));
            }
        }
        Ok(None)
    }
}

impl RemoteClient for MockRemote {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn get(&self, path: &str) -> Result<Value> {
        Ok(self.call("GET", path, None)?.unwrap_or_default())
    }

    fn post(&self, path: &str, body: &Value) -> Result<Option<Value>> {
        self.call("POST", path, Some(body))
    }

    fn put(&self, path: &str, body: &Value) -> Result<Option<Value>> {
        self.call("PUT", path, Some(body))
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.call("DELETE", path, None).map(|_| ())
    }
}

impl AssetUploader for MockRemote {
    fn upload(&self, asset: &Asset) -> Result<String> {
        self.call("POST", "/upload", None)?;
        Ok(format!("https://cdn.test/{}", asset.file_name))
    }
}

/// A link payload as the server sends it.
pub fn link_json(id: &str, sort_order: u32) -> Value {
    json!({
        "_id": id,
        "title": format!("Link {id}"),
        "url": format!("https://example.com/{id}"),
        "sort_order": sort_order,
        "is_active": true,
        "clicks": 3
    })
}

/// A links hook for `owner` whose cache holds links with `ids`, in order.
pub fn loaded_links(owner: &str, ids: &[&str]) -> (Arc<MockRemote>, ResourceHook<Link>) {
    let remote = MockRemote::new();
    let store = Arc::new(CacheStore::new());
    let hook = links_hook(owner, &store, &remote);
    seed_links(&remote, &hook, ids);
    (remote, hook)
}

pub fn links_hook(owner: &str, store: &Arc<CacheStore>, remote: &Arc<MockRemote>) -> ResourceHook<Link> {
    let client: Arc<dyn RemoteClient> = Arc::clone(remote) as Arc<dyn RemoteClient>;
    let uploader: Arc<dyn AssetUploader> = Arc::clone(remote) as Arc<dyn AssetUploader>;
    ResourceHook::new(owner, Arc::clone(store), client).with_uploader(uploader)
}

pub fn seed_links(remote: &MockRemote, hook: &ResourceHook<Link>, ids: &[&str]) {
    let payload: Vec<Value> = ids
        .iter()
        .zip(0_u32..)
        .map(|(id, sort_order)| link_json(id, sort_order))
        .collect();
    remote.route("GET", "/links", Value::Array(payload));
    hook.load().unwrap();
    remote.clear_requests();
}

pub fn ids_of(hook: &ResourceHook<Link>) -> Vec<String> {
    hook.records().iter().map(|link| link.id.to_string()).collect()
}

pub fn key(resource: ResourceKind, owner: &str) -> CollectionKey {
    CollectionKey::new(resource, OwnerId::new(owner))
}
