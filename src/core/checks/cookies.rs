// src/core/checks/cookies.rs

use super::headers::hsts_protected;
use super::{Check, auto_response, verdict};
use crate::core::models::{CheckResult, ResponseBundle};
use color_eyre::eyre::Result;
use serde_json::{Map, Value, json};
use tracing::debug;

const VALID_SAMESITE: &[&str] = &["strict", "lax", "none"];

/// Result codes from best to worst. A scan reports the worst one any cookie earns.
const GOODNESS: &[&str] = &[
    "cookies-secure-with-httponly-sessions-and-samesite",
    "cookies-secure-with-httponly-sessions",
    "cookies-without-secure-flag-but-protected-by-hsts",
    "cookies-session-without-secure-flag-but-protected-by-hsts",
    "cookies-without-secure-flag",
    "cookies-samesite-flag-invalid",
    "cookies-anticsrf-without-samesite-flag",
    "cookies-session-without-httponly-flag",
    "cookies-session-without-secure-flag",
];

#[derive(Debug, PartialEq, Eq)]
struct SetCookie {
    name: String,
    secure: bool,
    http_only: bool,
    /// Lower-cased value; `Some("")` for a bare `SameSite` attribute.
    same_site: Option<String>,
}

impl SetCookie {
    fn is_session(&self) -> bool {
        let name = self.name.to_ascii_lowercase();
        name.contains("sess") || name.contains("login")
    }

    fn is_anticsrf(&self) -> bool {
        self.name.to_ascii_lowercase().contains("csrf")
    }

    fn same_site_valid(&self) -> bool {
        self.same_site
            .as_deref()
            .is_some_and(|value| VALID_SAMESITE.contains(&value))
    }

    /// Every code this cookie earns on its own.
    fn findings(&self, hsts: bool) -> Vec<&'static str> {
        let mut found = Vec::new();
        if self.same_site.is_some() && !self.same_site_valid() {
            found.push("cookies-samesite-flag-invalid");
        }
        if self.is_anticsrf() && self.same_site.is_none() {
            found.push("cookies-anticsrf-without-samesite-flag");
        }
        if self.is_session() && !self.http_only {
            found.push("cookies-session-without-httponly-flag");
        }
        if !self.secure {
            found.push(match (self.is_session(), hsts) {
                (true, true) => "cookies-session-without-secure-flag-but-protected-by-hsts",
                (true, false) => "cookies-session-without-secure-flag",
                (false, true) => "cookies-without-secure-flag-but-protected-by-hsts",
                (false, false) => "cookies-without-secure-flag",
            });
        }
        found
    }
}

fn parse_set_cookie(raw: &str) -> Option<SetCookie> {
    let mut parts = raw.split(';');
    let (name, _) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut cookie = SetCookie {
        name: name.to_string(),
        secure: false,
        http_only: false,
        same_site: None,
    };
    for attribute in parts.map(str::trim).filter(|a| !a.is_empty()) {
        let (key, value) = attribute.split_once('=').unwrap_or((attribute, ""));
        match key.trim().to_ascii_lowercase().as_str() {
            "secure" => cookie.secure = true,
            "httponly" => cookie.http_only = true,
            "samesite" => cookie.same_site = Some(value.trim().to_ascii_lowercase()),
            _ => {}
        }
    }
    Some(cookie)
}

fn rank(code: &str) -> usize {
    GOODNESS.iter().position(|c| *c == code).unwrap_or(0)
}

pub struct Cookies;

impl Check for Cookies {
    fn name(&self) -> &'static str {
        "cookies"
    }

    fn expectation(&self) -> &'static str {
        "cookies-secure-with-httponly-sessions"
    }

    fn evaluate(&self, bundle: &ResponseBundle) -> Result<CheckResult> {
        let response = auto_response(bundle)?;
        let cookies: Vec<SetCookie> = response
            .set_cookies
            .iter()
            .filter_map(|raw| parse_set_cookie(raw))
            .collect();
        if cookies.is_empty() {
            return verdict(self, "cookies-not-found");
        }

        let hsts = hsts_protected(bundle);
        let worst = cookies
            .iter()
            .flat_map(|cookie| cookie.findings(hsts))
            .max_by_key(|code| rank(code));

        let code = match worst {
            Some(code) => code,
            None if cookies.iter().all(SetCookie::same_site_valid) => {
                "cookies-secure-with-httponly-sessions-and-samesite"
            }
            None => "cookies-secure-with-httponly-sessions",
        };
        debug!(code, cookies = cookies.len(), hsts, "Cookies classified.");

        let data: Map<String, Value> = cookies
            .into_iter()
            .map(|cookie| {
                let flags = json!({
                    "httponly": cookie.http_only,
                    "samesite": cookie.same_site,
                    "secure": cookie.secure,
                });
                (cookie.name, flags)
            })
            .collect();
        Ok(verdict(self, code)?.with_detail("data", data))
    }
}
