//! Session identifier lookup.
//!
//! The analytics session id is read from whichever ambient source is present,
//! in a fixed order: the analytics global object, a persisted local value,
//! then the `_clarity` cookie. When none holds a value the lookup yields
//! [`NOT_FOUND`].

/// Identifier reported when no ambient source holds a session id.
pub const NOT_FOUND: &str = "not_found";

/// Name of the persisted value and cookie holding the analytics session id.
pub const CLARITY_KEY: &str = "_clarity";

/// Supplies the session identifier attached to each payload.
///
/// Consulted synchronously, once per submission.
pub trait IdentifierProvider: Send + Sync {
    fn session_id(&self) -> String;
}

impl<F> IdentifierProvider for F
where
    F: Fn() -> String + Send + Sync,
{
    fn session_id(&self) -> String {
        self()
    }
}

/// Provider returning a known identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedIdentifier(String);

impl FixedIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl IdentifierProvider for FixedIdentifier {
    fn session_id(&self) -> String {
        self.0.clone()
    }
}

/// Snapshot of the three ambient sources, resolved by precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmbientSources {
    /// Property of the global analytics object (`clarity.v`).
    pub analytics_global: Option<String>,
    /// Persisted local value under [`CLARITY_KEY`].
    pub local_storage: Option<String>,
    /// Raw cookie header, e.g. `a=1; _clarity=xyz`.
    pub cookie_header: Option<String>,
}

impl AmbientSources {
    /// First non-empty source in precedence order, or [`NOT_FOUND`].
    pub fn resolve(&self) -> String {
        non_empty(self.analytics_global.as_deref())
            .or_else(|| non_empty(self.local_storage.as_deref()))
            .or_else(|| {
                self.cookie_header
                    .as_deref()
                    .and_then(|header| non_empty(cookie_value(header, CLARITY_KEY)))
            })
            .unwrap_or(NOT_FOUND)
            .to_string()
    }
}

impl IdentifierProvider for AmbientSources {
    fn session_id(&self) -> String {
        self.resolve()
    }
}

/// Value of cookie `name` in a `k=v; k2=v2` cookie string.
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key.trim() == name).then(|| value.trim())
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
