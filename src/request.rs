//! Minimal request abstraction consumed by the dispatch engine.
//!
//! The engine only needs already-parsed request metadata: the method, the
//! path, the captured parameters it populates itself, and the base path
//! consumed so far when delegating into mounted sub-routers. Transport
//! concerns (headers, bodies, keep-alive) live with the collaborator that
//! constructs the pair.

use crate::pattern::ParamVec;
use crate::settings::SettingsStore;
use http::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A single in-flight request as the dispatch engine sees it.
#[derive(Debug, Default)]
pub struct Request {
    method: Method,
    path: String,
    /// Length of the path prefix consumed by mounted routers so far.
    base_len: usize,
    params: ParamVec,
    settings: Option<Arc<SettingsStore>>,
}

impl Request {
    /// Build a request from parsed metadata. Any query string on `path` is
    /// dropped; the engine matches on the path component only.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let raw: String = path.into();
        let path = match raw.find('?') {
            Some(idx) => raw[..idx].to_string(),
            None => raw,
        };
        Self {
            method,
            path,
            base_len: 0,
            params: ParamVec::new(),
            settings: None,
        }
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The full request path, independent of any mount prefix.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path prefix consumed by mounted routers so far; empty at the top
    /// level.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.path[..self.base_len]
    }

    /// The path a router at the current mount depth matches against, with
    /// the empty suffix normalized to `/`.
    #[must_use]
    pub fn dispatch_path(&self) -> &str {
        let rest = &self.path[self.base_len..];
        if rest.is_empty() {
            "/"
        } else {
            rest
        }
    }

    pub(crate) fn base_len(&self) -> usize {
        self.base_len
    }

    pub(crate) fn set_base_len(&mut self, base_len: usize) {
        debug_assert!(base_len <= self.path.len());
        self.base_len = base_len;
    }

    /// Get a captured path parameter by name.
    ///
    /// Uses "last write wins" semantics: if nested layers capture the same
    /// name (e.g. `/org/:id` mounting `/team/:id`), the innermost capture is
    /// returned.
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// All captured parameters in capture order.
    #[must_use]
    pub fn params(&self) -> &ParamVec {
        &self.params
    }

    /// Convert params to a HashMap for compatibility with map-based code.
    /// Note: this allocates - use `param()` in hot paths instead.
    #[must_use]
    pub fn params_map(&self) -> HashMap<String, String> {
        self.params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    pub(crate) fn extend_params(&mut self, params: &ParamVec) {
        for (name, value) in params {
            self.params.push((Arc::clone(name), value.clone()));
        }
    }

    /// Attach the owning application's settings store. A back-reference for
    /// shared configuration lookup, never an ownership edge.
    pub(crate) fn bind_app(&mut self, settings: Arc<SettingsStore>) {
        self.settings = Some(settings);
    }

    /// Look up a setting on the owning application, when dispatched through
    /// one.
    #[must_use]
    pub fn app_setting(&self, key: &str) -> Option<Value> {
        self.settings.as_ref().and_then(|s| s.setting(key))
    }
}
