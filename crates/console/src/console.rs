//! The stock console route table: toner inventory and user administration.

use tonerdesk_auth::Privilege;

use crate::{ConsoleConfig, MenuLink, MenuSection, RouteTable, RouteTableError, ViewId};

/// View identifiers of the stock console.
pub mod views {
    use crate::ViewId;

    pub const LOGIN: ViewId = ViewId::from_static("login");
    pub const DASHBOARD: ViewId = ViewId::from_static("dashboard");
    pub const TONER_LIST: ViewId = ViewId::from_static("toner-list");
    pub const CMS_HELPER: ViewId = ViewId::from_static("cms-helper");
    pub const USER_LIST_ADMIN: ViewId = ViewId::from_static("user-list-admin");
    pub const USER_FORM: ViewId = ViewId::from_static("user-form");
    pub const TONER_LIST_ADMIN: ViewId = ViewId::from_static("toner-list-admin");
}

/// Build the stock route table, with login and home paths taken from
/// `config`.
pub fn console_routes(config: &ConsoleConfig) -> Result<RouteTable, RouteTableError> {
    RouteTable::builder()
        .route(config.login_path.clone(), Privilege::Public, views::LOGIN)
        .menu_route(
            config.home_path.clone(),
            Privilege::Authenticated,
            views::DASHBOARD,
            MenuLink::new("Dashboard", MenuSection::General),
        )
        .menu_route(
            "/toners",
            Privilege::Authenticated,
            views::TONER_LIST,
            MenuLink::new("Toners", MenuSection::General),
        )
        .menu_route(
            "/tools/cmshelper",
            Privilege::Authenticated,
            views::CMS_HELPER,
            MenuLink::new("CMS Helper", MenuSection::General),
        )
        .menu_route(
            "/admin/users",
            Privilege::Admin,
            views::USER_LIST_ADMIN,
            MenuLink::new("Users", MenuSection::Administration),
        )
        .route("/admin/users/create", Privilege::Admin, views::USER_FORM)
        .menu_route(
            "/admin/toners",
            Privilege::Admin,
            views::TONER_LIST_ADMIN,
            MenuLink::new("Toners", MenuSection::Administration),
        )
        .build()
}

/// Every view the stock table refers to.
pub fn console_views() -> [ViewId; 7] {
    [
        views::LOGIN,
        views::DASHBOARD,
        views::TONER_LIST,
        views::CMS_HELPER,
        views::USER_LIST_ADMIN,
        views::USER_FORM,
        views::TONER_LIST_ADMIN,
    ]
}
