pub mod auth;

pub mod dashboard;

pub mod students;

pub use auth::configure_auth_routes;
pub use dashboard::configure_dashboard_routes;
pub use students::configure_student_routes;

use actix_web::web;

/// 注册全部路由
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_auth_routes)
        .configure(configure_student_routes)
        // 页面路由放在最后
        .configure(configure_dashboard_routes);
}
