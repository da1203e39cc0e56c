use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::models::auth::requests::LoginRequest;
use crate::services::DashboardService;
use crate::services::dashboard::render::serve_static;

// 懒加载的全局 DashboardService 实例
static DASHBOARD_SERVICE: Lazy<DashboardService> = Lazy::new(DashboardService::new_lazy);

pub async fn index(req: HttpRequest) -> ActixResult<HttpResponse> {
    DASHBOARD_SERVICE.index(&req).await
}

pub async fn login(req: HttpRequest, form: web::Form<LoginRequest>) -> ActixResult<HttpResponse> {
    DASHBOARD_SERVICE.login(form.into_inner(), &req).await
}

pub async fn logout(req: HttpRequest) -> ActixResult<HttpResponse> {
    DASHBOARD_SERVICE.logout(&req).await
}

// 配置路由
pub fn configure_dashboard_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/login", web::post().to(login))
        .route("/logout", web::post().to(logout))
        .route("/static/{file:.*}", web::get().to(serve_static));
}
