use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Identifier of a view the host shell knows how to render.
///
/// View identifiers are opaque strings at this layer; the view loader maps
/// them to implementations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(Cow<'static, str>);

impl ViewId {
    /// The view rendered for paths no declared route matches.
    pub const NOT_FOUND: ViewId = ViewId::from_static("not-found");

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ViewId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
