// src/core/checks/headers.rs

use super::csp::{classify, response_policy};
use super::{Check, auto_response, verdict};
use crate::core::models::{CheckResult, ResponseBundle};
use color_eyre::eyre::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Six months, in seconds.
const SIX_MONTHS: u64 = 15_768_000;

static RE_MAX_AGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)^max-age\s*=\s*"?(\d+)"?$"#).unwrap());
static RE_XXP_MODE_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^mode\s*=\s*block$").unwrap());
static RE_XXP_REPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^report\s*=\s*\S+$").unwrap());

const PRIVATE_REFERRER_POLICIES: &[&str] = &[
    "no-referrer",
    "same-origin",
    "strict-origin",
    "strict-origin-when-cross-origin",
];
const UNSAFE_REFERRER_POLICIES: &[&str] = &["origin", "origin-when-cross-origin", "unsafe-url"];

// --- Strict-Transport-Security ---

pub struct StrictTransportSecurity;

#[derive(Debug, Default, PartialEq, Eq)]
struct Hsts {
    max_age: Option<u64>,
    include_subdomains: bool,
    preload: bool,
}

fn parse_hsts(header: &str) -> Option<Hsts> {
    let mut hsts = Hsts::default();
    for directive in header.split(';').map(str::trim).filter(|d| !d.is_empty()) {
        if let Some(captures) = RE_MAX_AGE.captures(directive) {
            if hsts.max_age.is_some() {
                return None;
            }
            hsts.max_age = Some(captures[1].parse().ok()?);
        } else if directive.eq_ignore_ascii_case("includesubdomains") {
            hsts.include_subdomains = true;
        } else if directive.eq_ignore_ascii_case("preload") {
            hsts.preload = true;
        }
    }
    hsts.max_age.map(|_| hsts)
}

/// Whether a verified HTTPS response carries HSTS for at least six months.
pub(crate) fn hsts_protected(bundle: &ResponseBundle) -> bool {
    bundle
        .https()
        .filter(|response| response.verified)
        .and_then(|response| response.header("strict-transport-security"))
        .and_then(parse_hsts)
        .and_then(|hsts| hsts.max_age)
        .is_some_and(|max_age| max_age >= SIX_MONTHS)
}

impl Check for StrictTransportSecurity {
    fn name(&self) -> &'static str {
        "strict-transport-security"
    }

    fn expectation(&self) -> &'static str {
        "hsts-implemented-max-age-at-least-six-months"
    }

    fn evaluate(&self, bundle: &ResponseBundle) -> Result<CheckResult> {
        auto_response(bundle)?;

        let Some(response) = bundle.https() else {
            return verdict(self, "hsts-not-implemented-no-https");
        };
        if !response.verified {
            return verdict(self, "hsts-invalid-cert");
        }
        let Some(header) = response.header("strict-transport-security") else {
            return verdict(self, "hsts-not-implemented");
        };
        let Some(hsts) = parse_hsts(header) else {
            debug!(header, "HSTS header unrecognised.");
            return verdict(self, "hsts-header-invalid");
        };

        let max_age = hsts.max_age.unwrap_or_default();
        let code = if max_age >= SIX_MONTHS {
            "hsts-implemented-max-age-at-least-six-months"
        } else {
            "hsts-implemented-max-age-less-than-six-months"
        };
        Ok(verdict(self, code)?
            .with_detail("max-age", max_age)
            .with_detail("includeSubDomains", hsts.include_subdomains)
            .with_detail("preload", hsts.preload))
    }
}

// --- X-Content-Type-Options ---

pub struct XContentTypeOptions;

impl Check for XContentTypeOptions {
    fn name(&self) -> &'static str {
        "x-content-type-options"
    }

    fn expectation(&self) -> &'static str {
        "x-content-type-options-nosniff"
    }

    fn evaluate(&self, bundle: &ResponseBundle) -> Result<CheckResult> {
        let response = auto_response(bundle)?;
        let code = match response.header("x-content-type-options") {
            None => "x-content-type-options-not-implemented",
            Some(value) if value.trim().eq_ignore_ascii_case("nosniff") => {
                "x-content-type-options-nosniff"
            }
            Some(_) => "x-content-type-options-header-invalid",
        };
        verdict(self, code)
    }
}

// --- X-Frame-Options ---

pub struct XFrameOptions;

impl Check for XFrameOptions {
    fn name(&self) -> &'static str {
        "x-frame-options"
    }

    fn expectation(&self) -> &'static str {
        "x-frame-options-sameorigin-or-deny"
    }

    fn evaluate(&self, bundle: &ResponseBundle) -> Result<CheckResult> {
        let response = auto_response(bundle)?;

        if response_policy(response).is_some_and(|p| p.contains_key("frame-ancestors")) {
            return verdict(self, "x-frame-options-implemented-via-csp");
        }

        let code = match response.header("x-frame-options") {
            None => "x-frame-options-not-implemented",
            Some(value) => {
                let value = value.trim().to_ascii_uppercase();
                if value == "DENY" || value == "SAMEORIGIN" {
                    "x-frame-options-sameorigin-or-deny"
                } else if value.starts_with("ALLOW-FROM ") {
                    "x-frame-options-allow-from-origin"
                } else {
                    "x-frame-options-header-invalid"
                }
            }
        };
        verdict(self, code)
    }
}

// --- X-XSS-Protection ---

pub struct XXssProtection;

impl Check for XXssProtection {
    fn name(&self) -> &'static str {
        "x-xss-protection"
    }

    fn expectation(&self) -> &'static str {
        "x-xss-protection-enabled-mode-block"
    }

    fn evaluate(&self, bundle: &ResponseBundle) -> Result<CheckResult> {
        let response = auto_response(bundle)?;

        let strong_csp = response_policy(response).is_some_and(|p| {
            classify(&p, response.url.starts_with("https://")) == "csp-implemented-with-no-unsafe"
        });

        let Some(header) = response.header("x-xss-protection") else {
            return verdict(
                self,
                if strong_csp {
                    "x-xss-protection-not-needed-due-to-csp"
                } else {
                    "x-xss-protection-not-implemented"
                },
            );
        };

        let mut parts = header.split(';').map(str::trim).filter(|p| !p.is_empty());
        let mut mode_block = false;
        let code = match parts.next() {
            Some("0") if strong_csp => "x-xss-protection-not-needed-due-to-csp",
            Some("0") => "x-xss-protection-disabled",
            Some("1") => {
                let mut valid = true;
                for part in parts {
                    if RE_XXP_MODE_BLOCK.is_match(part) {
                        mode_block = true;
                    } else if !RE_XXP_REPORT.is_match(part) {
                        valid = false;
                    }
                }
                match (valid, mode_block) {
                    (false, _) => "x-xss-protection-header-invalid",
                    (true, true) => "x-xss-protection-enabled-mode-block",
                    (true, false) => "x-xss-protection-enabled",
                }
            }
            _ => "x-xss-protection-header-invalid",
        };
        verdict(self, code)
    }
}

// --- Referrer-Policy ---

pub struct ReferrerPolicy;

impl Check for ReferrerPolicy {
    fn name(&self) -> &'static str {
        "referrer-policy"
    }

    fn expectation(&self) -> &'static str {
        "referrer-policy-private"
    }

    fn evaluate(&self, bundle: &ResponseBundle) -> Result<CheckResult> {
        let response = auto_response(bundle)?;
        let Some(header) = response.header("referrer-policy") else {
            return verdict(self, "referrer-policy-not-implemented");
        };

        // Browsers honour the last policy they understand.
        let effective = header
            .split(',')
            .map(|p| p.trim().to_ascii_lowercase())
            .filter(|p| {
                PRIVATE_REFERRER_POLICIES.contains(&p.as_str())
                    || UNSAFE_REFERRER_POLICIES.contains(&p.as_str())
                    || p == "no-referrer-when-downgrade"
            })
            .last();

        let code = match effective.as_deref() {
            None => "referrer-policy-header-invalid",
            Some(p) if PRIVATE_REFERRER_POLICIES.contains(&p) => "referrer-policy-private",
            Some("no-referrer-when-downgrade") => "referrer-policy-no-referrer-when-downgrade",
            Some(_) => "referrer-policy-unsafe",
        };
        Ok(verdict(self, code)?.with_detail("data", header))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{AUTO, HTTPS, HttpResponse};

    fn bundle_with(headers: &[(&str, &str)]) -> ResponseBundle {
        let mut response = HttpResponse::new("https://example.com/", 200);
        for (name, value) in headers {
            response = response.with_header(name, value);
        }
        ResponseBundle::from_pairs([(AUTO, Some(response.clone())), (HTTPS, Some(response))])
    }

    fn code(check: &dyn Check, bundle: &ResponseBundle) -> String {
        check.evaluate(bundle).unwrap().result.unwrap()
    }

    #[test]
    fn hsts_max_age_thresholds() {
        let long = bundle_with(&[(
            "Strict-Transport-Security",
            "max-age=31536000; includeSubDomains; preload",
        )]);
        let result = StrictTransportSecurity.evaluate(&long).unwrap();
        assert_eq!(result.result.as_deref(), Some("hsts-implemented-max-age-at-least-six-months"));
        assert_eq!(result.details["max-age"], 31_536_000);
        assert_eq!(result.details["includeSubDomains"], true);
        assert_eq!(result.details["preload"], true);

        let short = bundle_with(&[("Strict-Transport-Security", "max-age=300")]);
        assert_eq!(
            code(&StrictTransportSecurity, &short),
            "hsts-implemented-max-age-less-than-six-months"
        );
    }

    #[test]
    fn hsts_failures() {
        let invalid = bundle_with(&[("Strict-Transport-Security", "includeSubDomains")]);
        assert_eq!(code(&StrictTransportSecurity, &invalid), "hsts-header-invalid");

        let twice = bundle_with(&[("Strict-Transport-Security", "max-age=1; max-age=2")]);
        assert_eq!(code(&StrictTransportSecurity, &twice), "hsts-header-invalid");

        let missing = bundle_with(&[]);
        assert_eq!(code(&StrictTransportSecurity, &missing), "hsts-not-implemented");

        let http_only = ResponseBundle::from_pairs([
            (AUTO, Some(HttpResponse::new("http://example.com/", 200))),
            (HTTPS, None),
        ]);
        assert_eq!(code(&StrictTransportSecurity, &http_only), "hsts-not-implemented-no-https");

        let mut untrusted = HttpResponse::new("https://example.com/", 200)
            .with_header("Strict-Transport-Security", "max-age=31536000");
        untrusted.verified = false;
        let bundle =
            ResponseBundle::from_pairs([(AUTO, Some(untrusted.clone())), (HTTPS, Some(untrusted))]);
        assert_eq!(code(&StrictTransportSecurity, &bundle), "hsts-invalid-cert");
    }

    #[test]
    fn hsts_protection_needs_a_long_verified_policy() {
        assert!(hsts_protected(&bundle_with(&[("Strict-Transport-Security", "max-age=15768000")])));
        assert!(!hsts_protected(&bundle_with(&[("Strict-Transport-Security", "max-age=300")])));
        assert!(!hsts_protected(&bundle_with(&[])));
    }

    #[test]
    fn x_content_type_options() {
        assert_eq!(
            code(&XContentTypeOptions, &bundle_with(&[("X-Content-Type-Options", "NoSniff ")])),
            "x-content-type-options-nosniff"
        );
        assert_eq!(
            code(&XContentTypeOptions, &bundle_with(&[("X-Content-Type-Options", "sniff")])),
            "x-content-type-options-header-invalid"
        );
        assert_eq!(
            code(&XContentTypeOptions, &bundle_with(&[])),
            "x-content-type-options-not-implemented"
        );
    }

    #[test]
    fn x_frame_options() {
        assert_eq!(
            code(&XFrameOptions, &bundle_with(&[("X-Frame-Options", "deny")])),
            "x-frame-options-sameorigin-or-deny"
        );
        assert_eq!(
            code(&XFrameOptions, &bundle_with(&[("X-Frame-Options", "ALLOW-FROM https://a.example")])),
            "x-frame-options-allow-from-origin"
        );
        assert_eq!(
            code(&XFrameOptions, &bundle_with(&[("X-Frame-Options", "whenever")])),
            "x-frame-options-header-invalid"
        );
        assert_eq!(code(&XFrameOptions, &bundle_with(&[])), "x-frame-options-not-implemented");

        let via_csp = bundle_with(&[("Content-Security-Policy", "frame-ancestors 'none'")]);
        let result = XFrameOptions.evaluate(&via_csp).unwrap();
        assert_eq!(result.result.as_deref(), Some("x-frame-options-implemented-via-csp"));
        assert_eq!(result.score_modifier, 5);
    }

    #[test]
    fn x_xss_protection() {
        let cases = [
            ("1; mode=block", "x-xss-protection-enabled-mode-block"),
            ("1", "x-xss-protection-enabled"),
            ("1; report=https://r.example/", "x-xss-protection-enabled"),
            ("0", "x-xss-protection-disabled"),
            ("1; mode=allow", "x-xss-protection-header-invalid"),
            ("yes", "x-xss-protection-header-invalid"),
        ];
        for (value, expected) in cases {
            assert_eq!(
                code(&XXssProtection, &bundle_with(&[("X-XSS-Protection", value)])),
                expected,
                "value {value:?}"
            );
        }
        assert_eq!(code(&XXssProtection, &bundle_with(&[])), "x-xss-protection-not-implemented");
    }

    #[test]
    fn x_xss_protection_waived_by_strong_csp() {
        let bundle = bundle_with(&[("Content-Security-Policy", "default-src 'self'")]);
        assert_eq!(code(&XXssProtection, &bundle), "x-xss-protection-not-needed-due-to-csp");

        let weak = bundle_with(&[("Content-Security-Policy", "default-src *")]);
        assert_eq!(code(&XXssProtection, &weak), "x-xss-protection-not-implemented");
    }

    #[test]
    fn referrer_policy() {
        let cases = [
            ("no-referrer", "referrer-policy-private"),
            ("unsafe-url, strict-origin-when-cross-origin", "referrer-policy-private"),
            ("same-origin, made-up", "referrer-policy-private"),
            ("no-referrer-when-downgrade", "referrer-policy-no-referrer-when-downgrade"),
            ("origin", "referrer-policy-unsafe"),
            ("nonsense", "referrer-policy-header-invalid"),
        ];
        for (value, expected) in cases {
            assert_eq!(
                code(&ReferrerPolicy, &bundle_with(&[("Referrer-Policy", value)])),
                expected,
                "value {value:?}"
            );
        }
        assert_eq!(code(&ReferrerPolicy, &bundle_with(&[])), "referrer-policy-not-implemented");
    }
}
