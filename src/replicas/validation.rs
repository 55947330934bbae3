//! Registration input checks.

use url::Url;

use crate::error::{AdminError, AdminResult};

/// Health endpoints are a single path segment from a restricted charset so a
/// registration cannot point the probe at an arbitrary location.
pub fn is_safe_endpoint(endpoint: &str) -> bool {
    !endpoint.is_empty()
        && endpoint
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Resolve the URL the health probe will hit: `{scheme}://{host[:port]}/{endpoint}`.
pub fn probe_url(replica_url: &str, endpoint: &str) -> AdminResult<Url> {
    if !is_safe_endpoint(endpoint) {
        return Err(AdminError::validation(format!(
            "health check endpoint '{}' may only contain letters, digits, '_' and '-'",
            endpoint
        )));
    }

    let mut url = Url::parse(replica_url)
        .map_err(|e| AdminError::validation(format!("invalid url '{}': {}", replica_url, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AdminError::validation(format!(
            "url '{}' must use http or https",
            replica_url
        )));
    }
    if url.host_str().is_none() {
        return Err(AdminError::validation(format!("url '{}' has no host", replica_url)));
    }

    url.set_path(&format!("/{}", endpoint));
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// All three registration fields must be present.
pub fn require_fields(name: &str, url: &str, health_check_endpoint: &str) -> AdminResult<()> {
    let missing: Vec<&str> = [
        ("name", name),
        ("url", url),
        ("health_check_endpoint", health_check_endpoint),
    ]
    .iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(field, _)| *field)
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AdminError::validation(format!("missing required fields: {}", missing.join(", "))))
    }
}
