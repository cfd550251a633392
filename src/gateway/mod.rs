//! Host-routed gateway: dispatch, login bridge and reverse proxy

pub mod bridge;
pub mod dispatch;
pub mod proxy;
mod router;
pub mod routes;
mod server;

pub use dispatch::{Dispatch, HubDispatch};
pub use proxy::{EMAIL_HEADER, NAME_HEADER};
pub use router::{AppState, create_router};
pub use routes::{AUTH_PATH_PREFIX, LOGOUT_PATH, Route, RouteTable};
pub use server::Gateway;
