use axum::extract::{Json, Query};
use axum::response::Redirect;
use serde::{Deserialize, Serialize};

use crate::auth::AuthenticatedUser;

pub const LOGIN_PATH: &str = "/login";
pub const SIGNUP_PATH: &str = "/signup";

pub const MENU: [(&str, &str); 7] = [
    ("대시보드", "/dashboard"),
    ("문서 관리", "/documents"),
    ("FAQ 관리", "/faq"),
    ("부서 관리", "/departments"),
    ("챗봇 테스트", "/chatbot-test"),
    ("로그 관리", "/logs"),
    ("마이페이지", "/profile"),
];

#[derive(Deserialize)]
pub struct NavigationQuery {
    pub path: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MenuItem {
    pub label: &'static str,
    pub path: &'static str,
    pub active: bool,
}

#[derive(Serialize)]
pub struct NavigationResponse {
    pub items: Vec<MenuItem>,
    pub public_pages: [&'static str; 2],
    pub user_name: String,
}

/// An item is active only on an exact path match.
pub fn menu_items(current_path: Option<&str>) -> Vec<MenuItem> {
    MENU.iter()
        .map(|&(label, path)| MenuItem {
            label,
            path,
            active: current_path.map(str::trim) == Some(path),
        })
        .collect()
}

pub async fn menu(
    user: AuthenticatedUser,
    Query(params): Query<NavigationQuery>,
) -> Json<NavigationResponse> {
    Json(NavigationResponse {
        items: menu_items(params.path.as_deref()),
        public_pages: [LOGIN_PATH, SIGNUP_PATH],
        user_name: user.name,
    })
}

pub async fn root_redirect() -> Redirect {
    Redirect::to(LOGIN_PATH)
}
