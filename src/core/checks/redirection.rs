// src/core/checks/redirection.rs

use super::{Check, auto_response, verdict};
use crate::core::models::{CheckResult, ResponseBundle};
use color_eyre::eyre::{Result, WrapErr};
use tracing::debug;
use url::Url;

/// Does plain HTTP send visitors to HTTPS, and does it do so right away?
pub struct Redirection;

impl Check for Redirection {
    fn name(&self) -> &'static str {
        "redirection"
    }

    fn expectation(&self) -> &'static str {
        "redirection-to-https"
    }

    fn evaluate(&self, bundle: &ResponseBundle) -> Result<CheckResult> {
        auto_response(bundle)?;

        let Some(response) = bundle.http() else {
            return verdict(self, "redirection-not-needed-no-http");
        };

        let route: Vec<Url> = response
            .history
            .iter()
            .chain(std::iter::once(&response.url))
            .map(|u| Url::parse(u).wrap_err_with(|| format!("unparseable URL in redirect chain: {u}")))
            .collect::<Result<_>>()?;
        debug!(hops = route.len() - 1, "Evaluating HTTP redirect chain.");

        let code = match route.as_slice() {
            [] | [_] => "redirection-missing",
            [first, next, ..] => {
                let last = &route[route.len() - 1];
                if last.scheme() != "https" {
                    "redirection-not-to-https"
                } else if !response.verified {
                    "redirection-invalid-cert"
                } else if next.scheme() != "https" {
                    "redirection-not-to-https-on-initial-redirection"
                } else if next.host_str() != first.host_str() {
                    "redirection-off-host-from-http"
                } else {
                    "redirection-to-https"
                }
            }
        };

        let route: Vec<String> = route.into_iter().map(String::from).collect();
        Ok(verdict(self, code)?
            .with_detail("destination", route.last().cloned().unwrap_or_default())
            .with_detail("route", route)
            .with_detail("status_code", response.status))
    }
}
