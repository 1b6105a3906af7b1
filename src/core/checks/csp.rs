// src/core/checks/csp.rs

use super::{Check, auto_response, verdict};
use crate::core::models::{CheckResult, HttpResponse, ResponseBundle};
use color_eyre::eyre::{Result, bail};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

static RE_DIRECTIVE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9-]*$").unwrap());

/// Sources that let any inline or arbitrary script run.
const UNSAFE_SCRIPT_SOURCES: &[&str] = &["'unsafe-inline'", "data:", "*", "http:", "https:"];

pub type Policy = BTreeMap<String, Vec<String>>;

/// Splits a policy into directive → sources. Only the first policy of a
/// comma-joined header is considered.
pub fn parse_policy(header: &str) -> Result<Policy> {
    let first = header.split(',').next().unwrap_or_default();
    let mut policy = Policy::new();

    for directive in first.split(';').map(str::trim).filter(|d| !d.is_empty()) {
        let mut tokens = directive.split_ascii_whitespace();
        let Some(name) = tokens.next().map(str::to_ascii_lowercase) else {
            continue;
        };
        if !RE_DIRECTIVE_NAME.is_match(&name) {
            bail!("invalid directive name `{name}`");
        }
        if policy.contains_key(&name) {
            bail!("directive `{name}` repeated");
        }
        let sources = tokens.map(|t| t.to_ascii_lowercase()).collect();
        policy.insert(name, sources);
    }

    if policy.is_empty() {
        bail!("empty policy");
    }
    Ok(policy)
}

/// The policy of the `auto` response, if it carries a parseable one.
pub fn response_policy(response: &HttpResponse) -> Option<Policy> {
    response
        .header("content-security-policy")
        .and_then(|h| parse_policy(h).ok())
}

/// Classifies a parsed policy into one of the `csp-*` result codes.
pub fn classify(policy: &Policy, over_https: bool) -> &'static str {
    let script_src = policy
        .get("script-src")
        .or_else(|| policy.get("default-src"));

    let Some(script_src) = script_src else {
        return "csp-implemented-with-unsafe-inline";
    };
    if script_src
        .iter()
        .any(|s| UNSAFE_SCRIPT_SOURCES.contains(&s.as_str()))
    {
        return "csp-implemented-with-unsafe-inline";
    }
    if script_src.iter().any(|s| s == "'unsafe-eval'") {
        return "csp-implemented-with-unsafe-eval";
    }
    if over_https
        && policy
            .values()
            .flatten()
            .any(|s| s.starts_with("http:") || s.starts_with("ws:"))
    {
        return "csp-implemented-with-insecure-scheme";
    }
    "csp-implemented-with-no-unsafe"
}

pub struct ContentSecurityPolicy;

impl Check for ContentSecurityPolicy {
    fn name(&self) -> &'static str {
        "content-security-policy"
    }

    fn expectation(&self) -> &'static str {
        "csp-implemented-with-no-unsafe"
    }

    fn evaluate(&self, bundle: &ResponseBundle) -> Result<CheckResult> {
        let response = auto_response(bundle)?;

        let Some(header) = response.header("content-security-policy") else {
            debug!("CSP header missing.");
            return verdict(self, "csp-not-implemented");
        };

        let policy = match parse_policy(header) {
            Ok(policy) => policy,
            Err(e) => {
                debug!(error = %e, "CSP header could not be parsed.");
                return verdict(self, "csp-header-invalid");
            }
        };

        let over_https = response.url.starts_with("https://");
        let code = classify(&policy, over_https);
        debug!(code, directives = policy.len(), "CSP classified.");

        let data: Map<String, Value> = policy
            .into_iter()
            .map(|(name, sources)| (name, Value::from(sources)))
            .collect();
        Ok(verdict(self, code)?.with_detail("data", data))
    }
}
