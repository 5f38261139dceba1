//! Route table: the static path → (privilege, view) declarations.
//!
//! Matching is by whole path segments, case-insensitively, ignoring query
//! strings, fragments and trailing slashes. A declared route matches its own
//! path and every path below it; the most specific (longest) match wins and
//! ties go to the earliest declaration. Paths no declared route matches fall
//! to an implicit public catch-all rendering [`ViewId::NOT_FOUND`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tonerdesk_auth::Privilege;

use crate::ViewId;

/// Pattern of the implicit catch-all entry.
pub const CATCH_ALL: &str = "*";

/// Sidebar grouping of a menu link.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuSection {
    General,
    Administration,
}

/// Menu metadata attached to a route that should appear in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuLink {
    pub label: String,
    pub section: MenuSection,
}

impl MenuLink {
    pub fn new(label: impl Into<String>, section: MenuSection) -> Self {
        Self {
            label: label.into(),
            section,
        }
    }
}

/// One declared route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    path: String,
    required: Privilege,
    view: ViewId,
    menu: Option<MenuLink>,
}

impl RouteEntry {
    pub fn new(path: impl Into<String>, required: Privilege, view: ViewId) -> Self {
        Self {
            path: path.into(),
            required,
            view,
            menu: None,
        }
    }

    pub fn with_menu(mut self, link: MenuLink) -> Self {
        self.menu = Some(link);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn required(&self) -> Privilege {
        self.required
    }

    pub fn view(&self) -> &ViewId {
        &self.view
    }

    pub fn menu(&self) -> Option<&MenuLink> {
        self.menu.as_ref()
    }

    pub fn is_catch_all(&self) -> bool {
        self.path == CATCH_ALL
    }

    fn catch_all() -> Self {
        Self::new(CATCH_ALL, Privilege::Public, ViewId::NOT_FOUND)
    }
}

/// Startup validation failures. A table that fails validation cannot serve
/// navigation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteTableError {
    #[error("route pattern '{0}' is malformed")]
    Malformed(String),

    #[error("route pattern '/' is reserved for the root redirect")]
    ReservedRoot,

    #[error("route pattern '{0}' is declared more than once")]
    Duplicate(String),

    #[error("redirect target '{0}' is not a declared route")]
    UndeclaredRedirectTarget(String),

    #[error("login route '{0}' must be public")]
    GuardedLoginRoute(String),

    #[error("view '{view}' of route '{path}' is unknown to the view loader")]
    UnknownView { path: String, view: ViewId },
}

#[derive(Debug, Clone)]
struct CompiledRoute {
    segments: Vec<String>,
    entry: RouteEntry,
}

/// Immutable, validated set of routes.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
    catch_all: RouteEntry,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// Declared entries in declaration order (the catch-all excluded).
    pub fn entries(&self) -> impl Iterator<Item = &RouteEntry> {
        self.routes.iter().map(|route| &route.entry)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn catch_all(&self) -> &RouteEntry {
        &self.catch_all
    }

    /// Resolve a requested path to exactly one entry.
    pub fn resolve(&self, path: &str) -> &RouteEntry {
        let requested = segments(path);
        let mut best: Option<&CompiledRoute> = None;

        for route in &self.routes {
            if !requested.starts_with(&route.segments) {
                continue;
            }
            if best.is_none_or(|b| route.segments.len() > b.segments.len()) {
                best = Some(route);
            }
        }

        best.map(|route| &route.entry).unwrap_or(&self.catch_all)
    }

    /// The entry declared exactly at `path`, if any.
    pub fn get(&self, path: &str) -> Option<&RouteEntry> {
        let wanted = segments(path);
        self.routes
            .iter()
            .find(|route| route.segments == wanted)
            .map(|route| &route.entry)
    }
}

/// Collects declarations; validation happens in [`RouteTableBuilder::build`].
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    entries: Vec<RouteEntry>,
}

impl RouteTableBuilder {
    pub fn entry(mut self, entry: RouteEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn route(self, path: impl Into<String>, required: Privilege, view: ViewId) -> Self {
        self.entry(RouteEntry::new(path, required, view))
    }

    pub fn menu_route(
        self,
        path: impl Into<String>,
        required: Privilege,
        view: ViewId,
        link: MenuLink,
    ) -> Self {
        self.entry(RouteEntry::new(path, required, view).with_menu(link))
    }

    pub fn build(self) -> Result<RouteTable, RouteTableError> {
        let mut routes: Vec<CompiledRoute> = Vec::with_capacity(self.entries.len());

        for entry in self.entries {
            let segments = compile(entry.path())?;
            if routes.iter().any(|route| route.segments == segments) {
                return Err(RouteTableError::Duplicate(entry.path));
            }
            routes.push(CompiledRoute { segments, entry });
        }

        Ok(RouteTable {
            routes,
            catch_all: RouteEntry::catch_all(),
        })
    }
}

/// Normalized segments of a requested path.
pub(crate) fn segments(path: &str) -> Vec<String> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_ascii_lowercase())
        .collect()
}

/// Whether a requested path addresses the application root.
pub(crate) fn is_root(path: &str) -> bool {
    segments(path).is_empty()
}

fn compile(pattern: &str) -> Result<Vec<String>, RouteTableError> {
    let malformed = !pattern.starts_with('/')
        || (pattern.len() > 1 && pattern.ends_with('/'))
        || pattern.contains("//")
        || pattern
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '?' | '#' | '*'));
    if malformed {
        return Err(RouteTableError::Malformed(pattern.to_string()));
    }

    let segments = segments(pattern);
    if segments.is_empty() {
        return Err(RouteTableError::ReservedRoot);
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn users_table() -> RouteTable {
        RouteTable::builder()
            .route("/admin/users", Privilege::Admin, ViewId::new("user-list"))
            .route("/admin/users/create", Privilege::Admin, ViewId::new("user-form"))
            .route("/dashboard", Privilege::Authenticated, ViewId::new("dashboard"))
            .build()
            .unwrap()
    }

    #[test]
    fn prefix_match_falls_back_to_parent_route() {
        let table = users_table();
        assert_eq!(table.resolve("/admin/users/42").path(), "/admin/users");
        assert_eq!(table.resolve("/admin/users").path(), "/admin/users");
    }

    #[test]
    fn most_specific_route_wins_regardless_of_order() {
        let table = users_table();
        assert_eq!(table.resolve("/admin/users/create").path(), "/admin/users/create");
        assert_eq!(table.resolve("/admin/users/create/draft").path(), "/admin/users/create");
    }

    #[test]
    fn matching_is_by_whole_segments() {
        let table = users_table();
        assert!(table.resolve("/admin/usersx").is_catch_all());
        assert!(table.resolve("/dash").is_catch_all());
    }

    #[test]
    fn query_fragment_case_and_trailing_slash_are_ignored() {
        let table = users_table();
        assert_eq!(table.resolve("/Dashboard/?tab=1").path(), "/dashboard");
        assert_eq!(table.resolve("/dashboard#top").path(), "/dashboard");
    }

    #[test]
    fn unknown_paths_reach_the_public_catch_all() {
        let table = users_table();
        let entry = table.resolve("/totally/unknown");
        assert!(entry.is_catch_all());
        assert_eq!(entry.required(), Privilege::Public);
        assert_eq!(entry.view(), &ViewId::NOT_FOUND);
    }

    #[test]
    fn duplicates_are_rejected_case_insensitively() {
        let err = RouteTable::builder()
            .route("/toners", Privilege::Authenticated, ViewId::new("a"))
            .route("/Toners", Privilege::Admin, ViewId::new("b"))
            .build()
            .unwrap_err();
        assert_eq!(err, RouteTableError::Duplicate("/Toners".to_string()));
    }

    #[test]
    fn root_and_malformed_patterns_are_rejected() {
        let root = RouteTable::builder()
            .route("/", Privilege::Public, ViewId::new("home"))
            .build();
        assert_eq!(root.unwrap_err(), RouteTableError::ReservedRoot);

        for bad in ["toners", "/toners/", "/a//b", "*", "/a b", "/a?x=1"] {
            let result = RouteTable::builder()
                .route(bad, Privilege::Public, ViewId::new("v"))
                .build();
            assert_eq!(result.unwrap_err(), RouteTableError::Malformed(bad.to_string()), "{bad}");
        }
    }

    #[test]
    fn entries_keep_declaration_order() {
        let table = users_table();
        let paths: Vec<_> = table.entries().map(RouteEntry::path).collect();
        assert_eq!(paths, vec!["/admin/users", "/admin/users/create", "/dashboard"]);
        assert_eq!(table.get("/admin/users/").map(RouteEntry::path), Some("/admin/users"));
    }

    proptest! {
        /// Property: every path resolves, and the result is either the catch-all
        /// or a declared route whose segments prefix the request.
        #[test]
        fn every_path_resolves_to_one_entry(path in "(/[a-zA-Z]{1,6}){0,4}[/?#]?") {
            let table = users_table();
            let entry = table.resolve(&path);
            if !entry.is_catch_all() {
                prop_assert!(segments(&path).starts_with(&segments(entry.path())));
            }
        }
    }
}
