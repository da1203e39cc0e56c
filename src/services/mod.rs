pub mod auth;
pub mod dashboard;
pub mod students;

pub use auth::AuthService;
pub use dashboard::DashboardService;
pub use students::StudentService;
