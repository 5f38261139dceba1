//! Navigation menu projection.
//!
//! The menu is a pure function of the session's privilege and the route
//! table. [`NavigationMenu`] keeps the last projection and recomputes it when
//! the session reports a change or the held privilege moved (token expiry).

use std::sync::Arc;

use serde::Serialize;

use tonerdesk_auth::{Privilege, Session, SessionEvent, SessionState, Subscription, evaluate};

use crate::{MenuSection, RouteEntry, RouteTable};

/// Entries `session` may navigate to, in declaration order.
pub fn visible_entries<'a>(session: &Session, table: &'a RouteTable) -> Vec<&'a RouteEntry> {
    table
        .entries()
        .filter(|entry| evaluate(session, entry.required()).is_allowed())
        .collect()
}

/// One sidebar link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub label: String,
    pub path: String,
    pub section: MenuSection,
}

/// Visible entries that carry menu metadata, as sidebar links.
pub fn menu_items(session: &Session, table: &RouteTable) -> Vec<MenuItem> {
    visible_entries(session, table)
        .into_iter()
        .filter_map(|entry| {
            entry.menu().map(|link| MenuItem {
                label: link.label.clone(),
                path: entry.path().to_string(),
                section: link.section,
            })
        })
        .collect()
}

/// Sidebar projection kept in step with a session.
#[derive(Debug)]
pub struct NavigationMenu {
    session: SessionState,
    table: Arc<RouteTable>,
    changes: Subscription<SessionEvent>,
    projected_for: Privilege,
    items: Vec<MenuItem>,
}

impl NavigationMenu {
    pub fn new(session: SessionState, table: Arc<RouteTable>) -> Self {
        let changes = session.subscribe();
        let snapshot = session.snapshot();
        let items = menu_items(&snapshot, &table);
        Self {
            session,
            table,
            changes,
            projected_for: snapshot.privilege(),
            items,
        }
    }

    /// Current sidebar links, recomputed if the session changed since the
    /// last call.
    pub fn items(&mut self) -> &[MenuItem] {
        let changed = !self.changes.drain().is_empty();
        let snapshot = self.session.snapshot();
        let privilege = snapshot.privilege();

        if changed || privilege != self.projected_for {
            self.items = menu_items(&snapshot, &self.table);
            self.projected_for = privilege;
            tracing::debug!(%privilege, links = self.items.len(), "menu recomputed");
        }
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConsoleConfig, console_routes};
    use chrono::{Duration, Utc};
    use proptest::prelude::*;
    use tonerdesk_auth::{Identity, Role};
    use tonerdesk_core::UserId;

    fn stock() -> Arc<RouteTable> {
        Arc::new(console_routes(&ConsoleConfig::default()).unwrap())
    }

    fn logged_in(role: Role) -> Session {
        Session::authenticated(Identity::new(UserId::new(), "Kim"), role, None)
    }

    fn paths(entries: Vec<&RouteEntry>) -> Vec<&str> {
        entries.into_iter().map(RouteEntry::path).collect()
    }

    #[test]
    fn anonymous_sees_only_public_entries() {
        let table = stock();
        assert_eq!(paths(visible_entries(&Session::anonymous(), &table)), vec!["/login"]);
        assert!(menu_items(&Session::anonymous(), &table).is_empty());
    }

    #[test]
    fn user_sees_general_links_in_declaration_order() {
        let table = stock();
        let labels: Vec<_> = menu_items(&logged_in(Role::User), &table)
            .into_iter()
            .map(|item| item.label)
            .collect();
        assert_eq!(labels, vec!["Dashboard", "Toners", "CMS Helper"]);
    }

    #[test]
    fn admin_also_sees_administration_links() {
        let table = stock();
        let items = menu_items(&logged_in(Role::Admin), &table);
        let admin: Vec<_> = items
            .iter()
            .filter(|item| item.section == MenuSection::Administration)
            .map(|item| item.path.as_str())
            .collect();
        assert_eq!(admin, vec!["/admin/users", "/admin/toners"]);
        assert_eq!(
            paths(visible_entries(&logged_in(Role::Admin), &table)).len(),
            table.len()
        );
    }

    #[test]
    fn menu_follows_login_and_logout() {
        let session = SessionState::new();
        let mut menu = NavigationMenu::new(session.clone(), stock());
        assert!(menu.items().is_empty());

        session.login(Identity::new(UserId::new(), "Kim"), Role::Admin);
        assert_eq!(menu.items().len(), 5);

        session.logout();
        assert!(menu.items().is_empty());

        session.login(Identity::new(UserId::new(), "Lee"), Role::User);
        assert_eq!(menu.items().len(), 3);
    }

    #[test]
    fn menu_drops_links_when_the_token_expires() {
        let session = SessionState::new();
        session.login_until(
            Identity::new(UserId::new(), "Kim"),
            Role::User,
            Utc::now() + Duration::milliseconds(300),
        );
        let mut menu = NavigationMenu::new(session.clone(), stock());
        assert_eq!(menu.items().len(), 3);

        std::thread::sleep(std::time::Duration::from_millis(400));
        assert!(menu.items().is_empty());
    }

    proptest! {
        /// Property: an unauthenticated session never sees guarded entries,
        /// whatever role or expired token it carries.
        #[test]
        fn unauthenticated_menu_excludes_guarded_entries(
            admin in any::<bool>(),
            expired_for in 1i64..86_400,
        ) {
            let table = stock();
            let role = if admin { Role::Admin } else { Role::User };
            let expired = Session::authenticated(
                Identity::new(UserId::new(), "Kim"),
                role,
                Some(Utc::now() - Duration::seconds(expired_for)),
            );
            for session in [Session::anonymous(), expired] {
                for entry in visible_entries(&session, &table) {
                    prop_assert_eq!(entry.required(), Privilege::Public);
                }
            }
        }
    }
}
