pub mod backend_session;
pub mod dto;
pub mod http_session;
pub mod urls;

pub use backend_session::BackendSession;
pub use dto::UserData;
pub use http_session::HttpSession;
