// src/core/checks/mod.rs

//! Check units and the registry that holds them.
//!
//! A check is a pure function of a `ResponseBundle`: it never mutates the
//! bundle and never depends on another check having run first, which is what
//! lets the runner execute them in any order or in parallel.

pub mod cookies;
pub mod csp;
pub mod headers;
pub mod redirection;
pub mod sri;

use crate::core::knowledge_base;
use crate::core::models::{CheckResult, ResponseBundle};
use color_eyre::eyre::{Result, bail, eyre};
use std::collections::HashSet;
use std::sync::Arc;

/// One independently pluggable security check.
pub trait Check: Send + Sync {
    /// Stable identifier; becomes the key of this check in the report.
    fn name(&self) -> &'static str;

    /// Result code this check hopes to see.
    fn expectation(&self) -> &'static str;

    fn evaluate(&self, bundle: &ResponseBundle) -> Result<CheckResult>;
}

/// Builds the verdict for `code`, pulling modifier and description from the
/// knowledge base.
pub fn verdict(check: &dyn Check, code: &str) -> Result<CheckResult> {
    let detail = knowledge_base::get_result_detail(code)
        .ok_or_else(|| eyre!("unknown result code `{code}`"))?;
    if detail.check != check.name() {
        bail!("result code `{code}` belongs to `{}`, not `{}`", detail.check, check.name());
    }

    Ok(CheckResult {
        pass: Some(detail.passes()),
        score_modifier: detail.modifier,
        result: Some(code.to_string()),
        expectation: Some(check.expectation().to_string()),
        score_description: Some(detail.description.to_string()),
        ..CheckResult::neutral(check.name())
    })
}

/// Ordered, fixed set of checks. Its length is the number of tests a report
/// always accounts for.
#[derive(Clone)]
pub struct CheckRegistry {
    checks: Vec<Arc<dyn Check>>,
}

impl CheckRegistry {
    /// Rejects registries where two checks share a name.
    pub fn new(checks: Vec<Arc<dyn Check>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for check in &checks {
            if !seen.insert(check.name()) {
                bail!("check `{}` registered twice", check.name());
            }
        }
        Ok(Self { checks })
    }

    /// The checks every scan runs, in report order.
    pub fn default_checks() -> Result<Self> {
        Self::new(vec![
            Arc::new(csp::ContentSecurityPolicy),
            Arc::new(cookies::Cookies),
            Arc::new(redirection::Redirection),
            Arc::new(headers::ReferrerPolicy),
            Arc::new(headers::StrictTransportSecurity),
            Arc::new(sri::SubresourceIntegrity),
            Arc::new(headers::XContentTypeOptions),
            Arc::new(headers::XFrameOptions),
            Arc::new(headers::XXssProtection),
        ])
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Check>> {
        self.checks.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }
}

/// The `auto` response, or an error that the runner turns into a neutral result.
pub(crate) fn auto_response(
    bundle: &ResponseBundle,
) -> Result<&crate::core::models::HttpResponse> {
    bundle
        .auto()
        .ok_or_else(|| eyre!("bundle has no `auto` response"))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl Check for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        fn expectation(&self) -> &'static str {
            "x-content-type-options-nosniff"
        }

        fn evaluate(&self, _bundle: &ResponseBundle) -> Result<CheckResult> {
            verdict(self, "x-content-type-options-nosniff")
        }
    }

    #[test]
    fn default_registry_is_unique_and_ordered() {
        let registry = CheckRegistry::default_checks().unwrap();
        assert_eq!(registry.len(), 9);
        assert_eq!(
            registry.names(),
            vec![
                "content-security-policy",
                "cookies",
                "redirection",
                "referrer-policy",
                "strict-transport-security",
                "subresource-integrity",
                "x-content-type-options",
                "x-frame-options",
                "x-xss-protection",
            ]
        );
    }

    #[test]
    fn every_expectation_is_a_passing_code_of_its_own_check() {
        let registry = CheckRegistry::default_checks().unwrap();
        for check in registry.iter() {
            let detail = knowledge_base::get_result_detail(check.expectation()).unwrap();
            assert_eq!(detail.check, check.name());
            assert!(detail.passes());
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = CheckRegistry::new(vec![Arc::new(Named("a")), Arc::new(Named("a"))])
            .err()
            .unwrap();
        assert!(err.to_string().contains("registered twice"));
    }

    #[test]
    fn verdict_refuses_foreign_codes() {
        let check = Named("x-content-type-options");
        assert!(verdict(&check, "hsts-not-implemented").is_err());
        assert!(verdict(&check, "made-up").is_err());

        let ok = verdict(&check, "x-content-type-options-not-implemented").unwrap();
        assert_eq!(ok.name, "x-content-type-options");
        assert_eq!(ok.pass, Some(false));
        assert_eq!(ok.score_modifier, -5);
        assert_eq!(ok.expectation.as_deref(), Some("x-content-type-options-nosniff"));
    }
}
