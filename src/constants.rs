/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

/// Key under which the bearer credential is persisted.
pub const CREDENTIAL_STORAGE_KEY: &str = "access_token";

pub(crate) const LOGIN_PATH: &str = "auth/login";
pub(crate) const REFRESH_PATH: &str = "auth/refresh";
pub(crate) const LOGOUT_PATH: &str = "auth/logout";
pub(crate) const REGISTER_PATH: &str = "auth/register";
pub(crate) const CURRENT_USER_PATH: &str = "users/me";

pub(crate) const DEFAULT_PAGE_SIZE: u32 = 10;

pub(crate) const USER_AGENT: &str = concat!("feed-client/", env!("CARGO_PKG_VERSION"));
