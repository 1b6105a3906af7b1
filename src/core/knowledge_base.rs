//! Static, read-only table of every result code a check can emit.
//! Checks only pick a code; the modifier and description come from here.

/// Everything known about one result code.
pub struct ResultDetail {
    /// Machine-readable identifier (e.g. "hsts-not-implemented").
    pub code: &'static str,
    /// Name of the check that emits this code.
    pub check: &'static str,
    /// Delta applied to the baseline score.
    pub modifier: i64,
    /// One-line explanation shown in reports.
    pub description: &'static str,
}

impl ResultDetail {
    /// A result passes unless it costs points.
    pub fn passes(&self) -> bool {
        self.modifier >= 0
    }
}

static RESULTS: &[ResultDetail] = &[
    // --- Content Security Policy ---
    ResultDetail {
        code: "csp-implemented-with-no-unsafe",
        check: "content-security-policy",
        modifier: 5,
        description: "Content Security Policy (CSP) implemented without 'unsafe-inline' or 'unsafe-eval'",
    },
    ResultDetail {
        code: "csp-implemented-with-unsafe-eval",
        check: "content-security-policy",
        modifier: -10,
        description: "Content Security Policy (CSP) implemented, but allows 'unsafe-eval'",
    },
    ResultDetail {
        code: "csp-implemented-with-unsafe-inline",
        check: "content-security-policy",
        modifier: -20,
        description: "Content Security Policy (CSP) implemented unsafely. This includes 'unsafe-inline' or data: inside script-src",
    },
    ResultDetail {
        code: "csp-implemented-with-insecure-scheme",
        check: "content-security-policy",
        modifier: -20,
        description: "Content Security Policy (CSP) implemented, but secure site allows resources to be loaded from http",
    },
    ResultDetail {
        code: "csp-header-invalid",
        check: "content-security-policy",
        modifier: -25,
        description: "Content Security Policy (CSP) header cannot be parsed successfully",
    },
    ResultDetail {
        code: "csp-not-implemented",
        check: "content-security-policy",
        modifier: -25,
        description: "Content Security Policy (CSP) header not implemented",
    },
    // --- Cookies ---
    ResultDetail {
        code: "cookies-secure-with-httponly-sessions-and-samesite",
        check: "cookies",
        modifier: 5,
        description: "All cookies use the Secure flag, session cookies use the HttpOnly flag, and cross-origin restrictions are in place via the SameSite flag",
    },
    ResultDetail {
        code: "cookies-secure-with-httponly-sessions",
        check: "cookies",
        modifier: 0,
        description: "All cookies use the Secure flag and all session cookies use the HttpOnly flag",
    },
    ResultDetail {
        code: "cookies-not-found",
        check: "cookies",
        modifier: 0,
        description: "No cookies detected",
    },
    ResultDetail {
        code: "cookies-without-secure-flag-but-protected-by-hsts",
        check: "cookies",
        modifier: -5,
        description: "Cookies set without using the Secure flag, but transmission over HTTP prevented by HSTS",
    },
    ResultDetail {
        code: "cookies-session-without-secure-flag-but-protected-by-hsts",
        check: "cookies",
        modifier: -10,
        description: "Session cookie set without the Secure flag, but transmission over HTTP prevented by HSTS",
    },
    ResultDetail {
        code: "cookies-without-secure-flag",
        check: "cookies",
        modifier: -20,
        description: "Cookies set without using the Secure flag or set over HTTP",
    },
    ResultDetail {
        code: "cookies-samesite-flag-invalid",
        check: "cookies",
        modifier: -20,
        description: "Cookies use SameSite flag, but set to something other than Strict, Lax or None",
    },
    ResultDetail {
        code: "cookies-anticsrf-without-samesite-flag",
        check: "cookies",
        modifier: -20,
        description: "Anti-CSRF tokens set without using the SameSite flag",
    },
    ResultDetail {
        code: "cookies-session-without-httponly-flag",
        check: "cookies",
        modifier: -30,
        description: "Session cookie set without using the HttpOnly flag",
    },
    ResultDetail {
        code: "cookies-session-without-secure-flag",
        check: "cookies",
        modifier: -40,
        description: "Session cookie set without using the Secure flag or set over HTTP",
    },
    // --- Redirection ---
    ResultDetail {
        code: "redirection-to-https",
        check: "redirection",
        modifier: 0,
        description: "Initial redirection is to HTTPS on same host, final destination is HTTPS",
    },
    ResultDetail {
        code: "redirection-not-needed-no-http",
        check: "redirection",
        modifier: 0,
        description: "Not able to connect via HTTP, so no redirection necessary",
    },
    ResultDetail {
        code: "redirection-off-host-from-http",
        check: "redirection",
        modifier: -5,
        description: "Initial redirection from HTTP to HTTPS is to a different host, preventing HSTS",
    },
    ResultDetail {
        code: "redirection-not-to-https-on-initial-redirection",
        check: "redirection",
        modifier: -10,
        description: "Redirects to HTTPS eventually, but initial redirection is to another HTTP URL",
    },
    ResultDetail {
        code: "redirection-missing",
        check: "redirection",
        modifier: -20,
        description: "Does not redirect to an HTTPS site",
    },
    ResultDetail {
        code: "redirection-not-to-https",
        check: "redirection",
        modifier: -20,
        description: "Redirects, but final destination is not an HTTPS URL",
    },
    ResultDetail {
        code: "redirection-invalid-cert",
        check: "redirection",
        modifier: -20,
        description: "Invalid certificate chain encountered during redirection",
    },
    // --- Referrer Policy ---
    ResultDetail {
        code: "referrer-policy-private",
        check: "referrer-policy",
        modifier: 5,
        description: "Referrer-Policy header set to \"no-referrer\", \"same-origin\", \"strict-origin\" or \"strict-origin-when-cross-origin\"",
    },
    ResultDetail {
        code: "referrer-policy-no-referrer-when-downgrade",
        check: "referrer-policy",
        modifier: 0,
        description: "Referrer-Policy header set to \"no-referrer-when-downgrade\"",
    },
    ResultDetail {
        code: "referrer-policy-not-implemented",
        check: "referrer-policy",
        modifier: 0,
        description: "Referrer-Policy header not implemented",
    },
    ResultDetail {
        code: "referrer-policy-unsafe",
        check: "referrer-policy",
        modifier: -5,
        description: "Referrer-Policy header set unsafely to \"origin\", \"origin-when-cross-origin\", or \"unsafe-url\"",
    },
    ResultDetail {
        code: "referrer-policy-header-invalid",
        check: "referrer-policy",
        modifier: -5,
        description: "Referrer-Policy header cannot be recognized",
    },
    // --- HTTP Strict Transport Security ---
    ResultDetail {
        code: "hsts-implemented-max-age-at-least-six-months",
        check: "strict-transport-security",
        modifier: 0,
        description: "HTTP Strict Transport Security (HSTS) header set to a minimum of six months (15768000)",
    },
    ResultDetail {
        code: "hsts-implemented-max-age-less-than-six-months",
        check: "strict-transport-security",
        modifier: -10,
        description: "HTTP Strict Transport Security (HSTS) header set to less than six months (15768000)",
    },
    ResultDetail {
        code: "hsts-not-implemented",
        check: "strict-transport-security",
        modifier: -20,
        description: "HTTP Strict Transport Security (HSTS) header not implemented",
    },
    ResultDetail {
        code: "hsts-header-invalid",
        check: "strict-transport-security",
        modifier: -20,
        description: "HTTP Strict Transport Security (HSTS) header cannot be recognized",
    },
    ResultDetail {
        code: "hsts-not-implemented-no-https",
        check: "strict-transport-security",
        modifier: -20,
        description: "HTTP Strict Transport Security (HSTS) header cannot be set for sites not available over HTTPS",
    },
    ResultDetail {
        code: "hsts-invalid-cert",
        check: "strict-transport-security",
        modifier: -20,
        description: "HTTP Strict Transport Security (HSTS) header cannot be set, as site contains an invalid certificate chain",
    },
    // --- Subresource Integrity ---
    ResultDetail {
        code: "sri-implemented-and-external-scripts-loaded-securely",
        check: "subresource-integrity",
        modifier: 5,
        description: "Subresource Integrity (SRI) is implemented and all scripts are loaded from a similar origin",
    },
    ResultDetail {
        code: "sri-not-implemented-response-not-html",
        check: "subresource-integrity",
        modifier: 0,
        description: "Subresource Integrity (SRI) is only needed for HTML resources",
    },
    ResultDetail {
        code: "sri-not-implemented-but-no-scripts-loaded",
        check: "subresource-integrity",
        modifier: 0,
        description: "Subresource Integrity (SRI) is not needed since site contains no script tags",
    },
    ResultDetail {
        code: "sri-not-implemented-but-all-scripts-loaded-from-secure-origin",
        check: "subresource-integrity",
        modifier: 0,
        description: "Subresource Integrity (SRI) not implemented, but all scripts are loaded from a similar origin",
    },
    ResultDetail {
        code: "sri-not-implemented-but-external-scripts-loaded-securely",
        check: "subresource-integrity",
        modifier: -5,
        description: "Subresource Integrity (SRI) not implemented, but all external scripts are loaded over HTTPS",
    },
    ResultDetail {
        code: "sri-implemented-but-external-scripts-not-loaded-securely",
        check: "subresource-integrity",
        modifier: -20,
        description: "Subresource Integrity (SRI) implemented, but external scripts are loaded over HTTP",
    },
    ResultDetail {
        code: "sri-not-implemented-and-external-scripts-not-loaded-securely",
        check: "subresource-integrity",
        modifier: -50,
        description: "Subresource Integrity (SRI) is not implemented, and external scripts are loaded over HTTP",
    },
    // --- X-Content-Type-Options ---
    ResultDetail {
        code: "x-content-type-options-nosniff",
        check: "x-content-type-options",
        modifier: 0,
        description: "X-Content-Type-Options header set to \"nosniff\"",
    },
    ResultDetail {
        code: "x-content-type-options-not-implemented",
        check: "x-content-type-options",
        modifier: -5,
        description: "X-Content-Type-Options header not implemented",
    },
    ResultDetail {
        code: "x-content-type-options-header-invalid",
        check: "x-content-type-options",
        modifier: -5,
        description: "X-Content-Type-Options header cannot be recognized",
    },
    // --- X-Frame-Options ---
    ResultDetail {
        code: "x-frame-options-implemented-via-csp",
        check: "x-frame-options",
        modifier: 5,
        description: "X-Frame-Options (XFO) implemented via the CSP frame-ancestors directive",
    },
    ResultDetail {
        code: "x-frame-options-sameorigin-or-deny",
        check: "x-frame-options",
        modifier: 0,
        description: "X-Frame-Options (XFO) header set to SAMEORIGIN or DENY",
    },
    ResultDetail {
        code: "x-frame-options-allow-from-origin",
        check: "x-frame-options",
        modifier: 0,
        description: "X-Frame-Options (XFO) header uses ALLOW-FROM uri directive",
    },
    ResultDetail {
        code: "x-frame-options-not-implemented",
        check: "x-frame-options",
        modifier: -20,
        description: "X-Frame-Options (XFO) header not implemented",
    },
    ResultDetail {
        code: "x-frame-options-header-invalid",
        check: "x-frame-options",
        modifier: -20,
        description: "X-Frame-Options (XFO) header cannot be recognized",
    },
    // --- X-XSS-Protection ---
    ResultDetail {
        code: "x-xss-protection-enabled-mode-block",
        check: "x-xss-protection",
        modifier: 0,
        description: "X-XSS-Protection header set to \"1; mode=block\"",
    },
    ResultDetail {
        code: "x-xss-protection-enabled",
        check: "x-xss-protection",
        modifier: 0,
        description: "X-XSS-Protection header set to \"1\"",
    },
    ResultDetail {
        code: "x-xss-protection-not-needed-due-to-csp",
        check: "x-xss-protection",
        modifier: 0,
        description: "X-XSS-Protection header not needed due to strong Content Security Policy (CSP) header",
    },
    ResultDetail {
        code: "x-xss-protection-disabled",
        check: "x-xss-protection",
        modifier: -10,
        description: "X-XSS-Protection header set to \"0\" (disabled)",
    },
    ResultDetail {
        code: "x-xss-protection-not-implemented",
        check: "x-xss-protection",
        modifier: -10,
        description: "X-XSS-Protection header not implemented",
    },
    ResultDetail {
        code: "x-xss-protection-header-invalid",
        check: "x-xss-protection",
        modifier: -10,
        description: "X-XSS-Protection header cannot be recognized",
    },
];

/// Looks up a result code.
pub fn get_result_detail(code: &str) -> Option<&'static ResultDetail> {
    RESULTS.iter().find(|r| r.code == code)
}

/// All codes a given check may emit.
pub fn results_for_check(check: &str) -> impl Iterator<Item = &'static ResultDetail> + '_ {
    RESULTS.iter().filter(move |r| r.check == check)
}
