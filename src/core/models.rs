// src/core/models.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

/// Retrieval strategy that decides whether a host is reachable at all.
pub const AUTO: &str = "auto";
pub const HTTP: &str = "http";
pub const HTTPS: &str = "https";

/// Error string reported when the `auto` retrieval came back empty.
pub const SITE_DOWN: &str = "site down";

// --- Scan Input ---

fn default_http_port() -> u16 {
    80
}

fn default_https_port() -> u16 {
    443
}

fn default_path() -> String {
    "/".to_string()
}

/// Per-scan knobs handed verbatim to the retriever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    #[serde(default = "default_http_port", alias = "httpPort")]
    pub http_port: u16,
    #[serde(default = "default_https_port", alias = "httpsPort")]
    pub https_port: u16,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            https_port: default_https_port(),
            path: default_path(),
            cookies: BTreeMap::new(),
            headers: BTreeMap::new(),
        }
    }
}

// --- Retrieved Responses ---

/// A snapshot of one final HTTP response, detached from the client that fetched it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub url: String,
    pub status: u16,
    /// Lower-cased header names. Repeated headers are joined with ", ".
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub set_cookies: Vec<String>,
    /// Every URL visited before `url`, oldest first.
    #[serde(default)]
    pub history: Vec<String>,
    #[serde(default)]
    pub body: Option<String>,
    pub verified: bool,
}

impl HttpResponse {
    pub fn new(url: &str, status: u16) -> Self {
        Self {
            url: url.to_string(),
            status,
            headers: BTreeMap::new(),
            set_cookies: Vec::new(),
            history: Vec::new(),
            body: None,
            verified: true,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        let name = name.to_ascii_lowercase();
        match self.headers.get_mut(&name) {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => {
                self.headers.insert(name, value.to_string());
            }
        }
        self
    }

    /// Records a `Set-Cookie` header both raw and in the joined header map.
    pub fn with_set_cookie(mut self, value: &str) -> Self {
        self.set_cookies.push(value.to_string());
        self.with_header("set-cookie", value)
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }

    pub fn with_history(mut self, history: &[&str]) -> Self {
        self.history = history.iter().map(|u| u.to_string()).collect();
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// All responses fetched for one host, keyed by retrieval strategy.
///
/// Built once by the retriever and only read afterwards. A missing `auto`
/// entry means the host could not be reached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseBundle {
    pub responses: BTreeMap<String, Option<HttpResponse>>,
}

impl ResponseBundle {
    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Option<HttpResponse>)>,
    {
        Self {
            responses: pairs
                .into_iter()
                .map(|(strategy, response)| (strategy.to_string(), response))
                .collect(),
        }
    }

    pub fn get(&self, strategy: &str) -> Option<&HttpResponse> {
        self.responses.get(strategy).and_then(Option::as_ref)
    }

    pub fn auto(&self) -> Option<&HttpResponse> {
        self.get(AUTO)
    }

    pub fn http(&self) -> Option<&HttpResponse> {
        self.get(HTTP)
    }

    pub fn https(&self) -> Option<&HttpResponse> {
        self.get(HTTPS)
    }

    pub fn is_reachable(&self) -> bool {
        self.auto().is_some()
    }
}

// --- Check Results ---

/// Fields a check-specific detail may not shadow once flattened.
const RESERVED_FIELDS: &[&str] = &[
    "name",
    "pass",
    "score_modifier",
    "result",
    "expectation",
    "score_description",
];

/// The verdict of a single check unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    /// `None` means "not applicable", which is distinct from a failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<bool>,
    #[serde(default)]
    pub score_modifier: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expectation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_description: Option<String>,
    /// Check-specific fields, flattened into the serialized record.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl CheckResult {
    /// A result with no verdict and no effect on the score.
    pub fn neutral(name: &str) -> Self {
        Self {
            name: name.to_string(),
            pass: None,
            score_modifier: 0,
            result: None,
            expectation: None,
            score_description: None,
            details: Map::new(),
        }
    }

    /// Adds a check-specific field. Keys that collide with a named field are
    /// dropped, so the serialized record never carries a key twice.
    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        if RESERVED_FIELDS.contains(&key) {
            warn!(check = %self.name, key, "Dropping detail that shadows a result field.");
            return self;
        }
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn passed(&self) -> bool {
        self.pass == Some(true)
    }
}

/// A `CheckResult` once it has been filed under its name in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<bool>,
    #[serde(default)]
    pub score_modifier: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expectation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_description: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl From<&CheckResult> for TestEntry {
    fn from(result: &CheckResult) -> Self {
        Self {
            pass: result.pass,
            score_modifier: result.score_modifier,
            result: result.result.clone(),
            expectation: result.expectation.clone(),
            score_description: result.score_description.clone(),
            details: result.details.clone(),
        }
    }
}

// --- Report ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub grade: crate::core::grader::Grade,
    pub likelihood_indicator: crate::core::grader::Likelihood,
    pub response_headers: BTreeMap<String, String>,
    pub score: i64,
    pub tests_failed: usize,
    pub tests_passed: usize,
    pub tests_quantity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan: ScanSummary,
    pub tests: BTreeMap<String, TestEntry>,
}

/// What a scan hands back to its caller.
///
/// Serialized untagged, so a failure is exactly `{"error":"site down"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScanOutcome {
    Reported(ScanReport),
    Failed { error: String },
}

impl ScanOutcome {
    pub fn site_down() -> Self {
        ScanOutcome::Failed {
            error: SITE_DOWN.to_string(),
        }
    }

    pub fn report(&self) -> Option<&ScanReport> {
        match self {
            ScanOutcome::Reported(report) => Some(report),
            ScanOutcome::Failed { .. } => None,
        }
    }
}
