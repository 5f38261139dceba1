//! Route tables declared as data (JSON manifests).
//!
//! ```json
//! {
//!   "routes": [
//!     { "path": "/login", "privilege": "public", "view": "login" },
//!     { "path": "/dashboard", "privilege": "authenticated", "view": "dashboard",
//!       "menu": { "label": "Dashboard", "section": "general" } }
//!   ]
//! }
//! ```

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use tonerdesk_auth::Privilege;

use crate::{MenuLink, RouteEntry, RouteTable, ViewId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteManifest {
    pub routes: Vec<ManifestRoute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRoute {
    pub path: String,
    pub privilege: Privilege,
    pub view: ViewId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu: Option<MenuLink>,
}

impl RouteManifest {
    pub fn into_table(self) -> Result<RouteTable, crate::RouteTableError> {
        self.routes
            .into_iter()
            .fold(RouteTable::builder(), |builder, route| {
                let entry = RouteEntry::new(route.path, route.privilege, route.view);
                builder.entry(match route.menu {
                    Some(link) => entry.with_menu(link),
                    None => entry,
                })
            })
            .build()
    }

    pub fn from_table(table: &RouteTable) -> Self {
        Self {
            routes: table
                .entries()
                .map(|entry| ManifestRoute {
                    path: entry.path().to_string(),
                    privilege: entry.required(),
                    view: entry.view().clone(),
                    menu: entry.menu().cloned(),
                })
                .collect(),
        }
    }
}

/// Parse and validate a JSON route manifest.
pub fn parse(json: &str) -> anyhow::Result<RouteTable> {
    let manifest: RouteManifest =
        serde_json::from_str(json).context("failed to parse route manifest")?;
    let table = manifest
        .into_table()
        .context("route manifest failed validation")?;
    tracing::debug!(routes = table.len(), "route manifest loaded");
    Ok(table)
}

/// Read, parse and validate a JSON route manifest from disk.
pub fn load(path: impl AsRef<Path>) -> anyhow::Result<RouteTable> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read route manifest at {:?}", path))?;
    parse(&json).with_context(|| format!("invalid route manifest at {:?}", path))
}
