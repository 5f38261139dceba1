//! `tonerdesk-console`: the route authorization gateway of the console.
//!
//! For every navigation request the gateway resolves a route, evaluates the
//! session against the route's privilege and yields a render directive; the
//! menu projector derives the links a session may follow. Rendering itself is
//! left to the host shell.

pub mod config;
pub mod console;
pub mod gateway;
pub mod loader;
pub mod manifest;
pub mod menu;
pub mod routes;
pub mod view;

pub use config::ConsoleConfig;
pub use console::{console_routes, console_views, views};
pub use gateway::{FallbackKind, Navigation, NavigationGateway, NavigationPhase, Navigator, RenderDirective};
pub use loader::{Deferred, LoadError, LoadState, Resolver, ViewLoader, ViewRegistry};
pub use menu::{MenuItem, NavigationMenu, menu_items, visible_entries};
pub use routes::{MenuLink, MenuSection, RouteEntry, RouteTable, RouteTableBuilder, RouteTableError};
pub use view::ViewId;
