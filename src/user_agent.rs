//! User-Agent string sent with every redirect check request.

/// Project URL for User-Agent identification (RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/fierce/redirect-checker";

/// Default User-Agent for checker requests (identifies the tool and version).
#[must_use]
pub(crate) fn default_checker_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("redirect-checker/{version} (migration-audit; +{PROJECT_UA_URL})")
}
