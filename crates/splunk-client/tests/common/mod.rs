//! Shared fixtures: an in-memory transport and feed builders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use splunk_client::{FetchResponse, Result, SplunkError, Transport, TransportError};

pub const BASE: &str = "https://localhost:8089/services";

/// One recorded POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub path: String,
    pub form: Vec<(String, String)>,
}

/// Transport answering from scripted bodies and recording every request.
///
/// Fetches match the exact path first, then the path without its query.
/// Unscripted fetches are `NotFound`; unscripted submits return an empty
/// body.
#[derive(Default)]
pub struct MockTransport {
    fetch_bodies: Mutex<HashMap<String, String>>,
    submit_bodies: Mutex<HashMap<String, String>>,
    fetches: Mutex<Vec<String>>,
    submissions: Mutex<Vec<Submission>>,
    deletes: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_fetch(&self, path: &str, body: impl Into<String>) {
        self.fetch_bodies
            .lock()
            .unwrap()
            .insert(path.to_string(), body.into());
    }

    pub fn on_submit(&self, path: &str, body: impl Into<String>) {
        self.submit_bodies
            .lock()
            .unwrap()
            .insert(path.to_string(), body.into());
    }

    /// Drop a scripted fetch body so later fetches of `path` are `NotFound`.
    pub fn forget_fetch(&self, path: &str) {
        self.fetch_bodies.lock().unwrap().remove(path);
    }

    /// Make every subsequent request fail with a 503.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    fn check_failing(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Status {
                status: 503,
                message: "Service Unavailable".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch(&self, path: &str) -> Result<FetchResponse> {
        self.fetches.lock().unwrap().push(path.to_string());
        self.check_failing()?;

        let bodies = self.fetch_bodies.lock().unwrap();
        let without_query = path.split_once('?').map_or(path, |(p, _)| p);
        let body = bodies
            .get(path)
            .or_else(|| bodies.get(without_query))
            .ok_or_else(|| SplunkError::NotFound(path.to_string()))?;

        Ok(FetchResponse {
            body: body.clone().into_bytes(),
            content_type: Some("text/xml; charset=UTF-8".to_string()),
        })
    }

    async fn submit(&self, path: &str, form: &[(String, String)]) -> Result<Vec<u8>> {
        self.submissions.lock().unwrap().push(Submission {
            path: path.to_string(),
            form: form.to_vec(),
        });
        self.check_failing()?;

        Ok(self
            .submit_bodies
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_default()
            .into_bytes())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.deletes.lock().unwrap().push(path.to_string());
        self.check_failing()
    }
}

/// An `<entry>` whose id is `{BASE}/{path}`.
pub fn entry(path: &str, fields: &[(&str, &str)]) -> String {
    let keys: String = fields
        .iter()
        .map(|(k, v)| format!(r#"<s:key name="{k}">{v}</s:key>"#))
        .collect();
    let title = path.rsplit('/').next().unwrap_or(path);
    format!(
        r#"<entry><title>{title}</title><id>{BASE}/{path}</id><link href="/services/{path}" rel="edit"/><content type="text/xml"><s:dict>{keys}</s:dict></content></entry>"#
    )
}

/// A `<feed>` for `path` holding `entries`.
pub fn feed(path: &str, entries: &[String], total: Option<usize>) -> String {
    let total = total
        .map(|n| format!("<opensearch:totalResults>{n}</opensearch:totalResults>"))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:s="http://dev.splunk.com/ns/rest" xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">
<title>{path}</title><id>{BASE}/{path}</id>{total}{}</feed>"#,
        entries.concat()
    )
}

/// Form pairs from string slices.
pub fn form(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
