pub mod auth;
pub mod gate;
pub mod response;

pub use auth::{CurrentTenant, CurrentUser, SessionUser};
pub use gate::{classify_route, request_gate, RouteAccess, USER_ID_HEADER};
pub use response::{ApiResponse, ApiResult};
