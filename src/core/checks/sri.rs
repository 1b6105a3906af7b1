// src/core/checks/sri.rs

use super::{Check, auto_response, verdict};
use crate::core::models::{CheckResult, ResponseBundle};
use color_eyre::eyre::{Result, WrapErr, eyre};
use scraper::{Html, Selector};
use serde_json::{Map, Value, json};
use tracing::debug;
use url::Url;

/// Are third-party scripts pinned with an `integrity` hash and fetched over HTTPS?
pub struct SubresourceIntegrity;

struct Script {
    src: String,
    integrity: Option<String>,
    crossorigin: Option<String>,
    same_origin: bool,
    secure: bool,
}

fn is_html(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| {
        let ct = ct.to_ascii_lowercase();
        ct.contains("text/html") || ct.contains("application/xhtml+xml")
    })
}

fn collect_scripts(page: &Url, body: &str) -> Result<Vec<Script>> {
    let selector = Selector::parse("script[src]").map_err(|e| eyre!("invalid selector: {e}"))?;
    let document = Html::parse_document(body);

    let mut scripts = Vec::new();
    for element in document.select(&selector) {
        let Some(src) = element.value().attr("src") else {
            continue;
        };
        let Ok(resolved) = page.join(src) else {
            debug!(src, "Skipping script with unresolvable src.");
            continue;
        };
        scripts.push(Script {
            src: src.to_string(),
            integrity: element
                .value()
                .attr("integrity")
                .map(str::trim)
                .filter(|i| !i.is_empty())
                .map(String::from),
            crossorigin: element.value().attr("crossorigin").map(String::from),
            same_origin: resolved.origin() == page.origin(),
            secure: resolved.scheme() == "https",
        });
    }
    Ok(scripts)
}

impl Check for SubresourceIntegrity {
    fn name(&self) -> &'static str {
        "subresource-integrity"
    }

    fn expectation(&self) -> &'static str {
        "sri-implemented-and-external-scripts-loaded-securely"
    }

    fn evaluate(&self, bundle: &ResponseBundle) -> Result<CheckResult> {
        let response = auto_response(bundle)?;

        let body = match response.body.as_deref() {
            Some(body) if is_html(response.header("content-type")) => body,
            _ => return verdict(self, "sri-not-implemented-response-not-html"),
        };
        let page = Url::parse(&response.url).wrap_err("auto response has an unparseable URL")?;
        let scripts = collect_scripts(&page, body)?;
        debug!(scripts = scripts.len(), "Collected script tags.");

        let external: Vec<&Script> = scripts.iter().filter(|s| !s.same_origin).collect();
        let all_pinned = external.iter().all(|s| s.integrity.is_some());
        let all_secure = external.iter().all(|s| s.secure);

        let code = if scripts.is_empty() {
            "sri-not-implemented-but-no-scripts-loaded"
        } else if external.is_empty() {
            "sri-not-implemented-but-all-scripts-loaded-from-secure-origin"
        } else {
            match (all_pinned, all_secure) {
                (true, true) => "sri-implemented-and-external-scripts-loaded-securely",
                (false, true) => "sri-not-implemented-but-external-scripts-loaded-securely",
                (true, false) => "sri-implemented-but-external-scripts-not-loaded-securely",
                (false, false) => "sri-not-implemented-and-external-scripts-not-loaded-securely",
            }
        };

        let data: Map<String, Value> = scripts
            .into_iter()
            .map(|s| {
                (
                    s.src,
                    json!({ "crossorigin": s.crossorigin, "integrity": s.integrity }),
                )
            })
            .collect();
        Ok(verdict(self, code)?.with_detail("data", data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{AUTO, HttpResponse};

    fn page(body: &str) -> ResponseBundle {
        let response = HttpResponse::new("https://example.com/", 200)
            .with_header("Content-Type", "text/html; charset=utf-8")
            .with_body(body);
        ResponseBundle::from_pairs([(AUTO, Some(response))])
    }

    fn code(bundle: &ResponseBundle) -> String {
        SubresourceIntegrity.evaluate(bundle).unwrap().result.unwrap()
    }

    #[test]
    fn not_html() {
        let response = HttpResponse::new("https://example.com/", 200)
            .with_header("Content-Type", "application/json")
            .with_body("{}");
        let bundle = ResponseBundle::from_pairs([(AUTO, Some(response))]);
        assert_eq!(code(&bundle), "sri-not-implemented-response-not-html");
    }

    #[test]
    fn no_scripts_or_only_local_ones() {
        assert_eq!(
            code(&page("<html><body><p>hi</p></body></html>")),
            "sri-not-implemented-but-no-scripts-loaded"
        );
        assert_eq!(
            code(&page(r#"<script src="/app.js"></script><script src="https://example.com/b.js"></script>"#)),
            "sri-not-implemented-but-all-scripts-loaded-from-secure-origin"
        );
    }

    #[test]
    fn external_scripts() {
        let pinned = page(
            r#"<script src="https://cdn.example.net/lib.js" integrity="sha384-abc" crossorigin="anonymous"></script>"#,
        );
        let result = SubresourceIntegrity.evaluate(&pinned).unwrap();
        assert_eq!(
            result.result.as_deref(),
            Some("sri-implemented-and-external-scripts-loaded-securely")
        );
        assert_eq!(result.score_modifier, 5);
        assert_eq!(
            result.details["data"]["https://cdn.example.net/lib.js"]["integrity"],
            "sha384-abc"
        );

        assert_eq!(
            code(&page(r#"<script src="https://cdn.example.net/lib.js"></script>"#)),
            "sri-not-implemented-but-external-scripts-loaded-securely"
        );
        assert_eq!(
            code(&page(r#"<script src="http://cdn.example.net/lib.js" integrity="sha384-abc"></script>"#)),
            "sri-implemented-but-external-scripts-not-loaded-securely"
        );

        let worst = SubresourceIntegrity
            .evaluate(&page(r#"<script src="http://cdn.example.net/lib.js"></script>"#))
            .unwrap();
        assert_eq!(worst.score_modifier, -50);
        assert_eq!(worst.pass, Some(false));
    }
}
