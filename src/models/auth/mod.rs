pub mod entities;
pub mod requests;
pub mod responses;

pub use entities::{Principal, UserRole};
pub use requests::LoginRequest;
pub use responses::{LoginResponse, SessionResponse};
