use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical location of a value inside a template, as an RFC 6901 JSON pointer.
///
/// Normalization rules are intentionally simple and deterministic:
/// - always rooted (`/Resources/...`), the empty pointer is the document itself
/// - `~` is escaped as `~0`, `/` as `~1`
/// - array positions are plain decimal segments
#[derive(
    Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct PropertyPointer(String);

impl PropertyPointer {
    /// Pointer to the document root.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Pointer to `/Resources/<logical_id>`.
    pub fn resource(logical_id: &str) -> Self {
        Self::root().key("Resources").key(logical_id)
    }

    /// Pointer to `/Resources/<logical_id>/Properties/<segments...>`.
    pub fn property(logical_id: &str, segments: &[&str]) -> Self {
        segments
            .iter()
            .fold(Self::resource(logical_id).key("Properties"), |p, s| p.key(s))
    }

    pub fn key(&self, segment: &str) -> Self {
        let escaped = segment.replace('~', "~0").replace('/', "~1");
        Self(format!("{}/{}", self.0, escaped))
    }

    pub fn index(&self, idx: usize) -> Self {
        Self(format!("{}/{}", self.0, idx))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
