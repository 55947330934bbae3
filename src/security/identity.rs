//! Typed caller identity and bearer-key lookup.

use std::collections::HashMap;
use std::fmt;

use crate::config::ApiKeyConfig;

/// Who asked for an operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallerIdentity {
    operator: String,
}

impl CallerIdentity {
    pub fn new(operator: impl Into<String>) -> Self {
        Self { operator: operator.into() }
    }

    /// Identity used for work triggered by inbound fleet events.
    pub fn proxy_fleet() -> Self {
        Self::new("proxy-fleet")
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.operator)
    }
}

/// Configured bearer keys.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyRegistry {
    keys: HashMap<String, CallerIdentity>,
}

impl ApiKeyRegistry {
    pub fn from_config(keys: &[ApiKeyConfig]) -> Self {
        let keys = keys
            .iter()
            .map(|k| (k.key.clone(), CallerIdentity::new(k.operator.clone())))
            .collect();
        Self { keys }
    }

    /// Resolve an `Authorization` header value.
    pub fn authenticate(&self, authorization: Option<&str>) -> Option<CallerIdentity> {
        let key = authorization?.strip_prefix("Bearer ")?.trim();
        self.keys.get(key).cloned()
    }
}
