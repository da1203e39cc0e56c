//! 仪表盘页面
//!
//! 每个页面请求挂载一个 [`SessionGate`]，按其结论渲染登录表单或仪表盘。

pub mod render;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode};
use std::sync::Arc;
use tracing::{error, warn};

use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::auth::LoginRequest;
use crate::services::students::load_students;
use crate::session::{AuthProvider, GateView, SessionGate};
use crate::storage::StorageAdapter;
use crate::utils::jwt::JwtUtils;

use render::DashboardContext;

pub struct DashboardService {
    provider: Option<Arc<dyn AuthProvider>>,
    storage: Option<Arc<dyn StorageAdapter>>,
}

impl DashboardService {
    pub fn new_lazy() -> Self {
        Self {
            provider: None,
            storage: None,
        }
    }

    /// 直接注入认证与存储，不再从 app_data 查找
    pub fn with_parts(provider: Arc<dyn AuthProvider>, storage: Arc<dyn StorageAdapter>) -> Self {
        Self {
            provider: Some(provider),
            storage: Some(storage),
        }
    }

    pub(crate) fn get_provider(&self, request: &HttpRequest) -> Arc<dyn AuthProvider> {
        if let Some(provider) = &self.provider {
            provider.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn AuthProvider>>>()
                .expect("AuthProvider not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn StorageAdapter> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn StorageAdapter>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    // 首页：会话门
    pub async fn index(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let token = JwtUtils::extract_session_token(request);
        let mut gate = SessionGate::mount(self.get_provider(request), token);
        gate.resolve().await;

        let html = self.render_gate(&gate, request).await;
        Ok(html_response(StatusCode::OK, html))
    }

    // 表单登录，成功后直接渲染仪表盘
    pub async fn login(
        &self,
        form: LoginRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let provider = self.get_provider(request);

        match provider.sign_in(&form.username, &form.password).await {
            Ok(session) => {
                let cookie = JwtUtils::create_session_cookie(&session.token, session.expires_in);
                let mut gate = SessionGate::mount(provider, None);
                gate.on_login(session.principal, session.token);

                let html = self.render_gate(&gate, request).await;
                let mut response = html_response(StatusCode::OK, html);
                if let Err(e) = response.add_cookie(&cookie) {
                    error!("Failed to set session cookie: {}", e);
                }
                Ok(response)
            }
            Err(e) => {
                warn!("Form login failed for '{}': {}", form.username, e);
                Ok(html_response(
                    StatusCode::UNAUTHORIZED,
                    render::render_login(Some(e.message())),
                ))
            }
        }
    }

    // 登出后回到登录表单
    pub async fn logout(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let token = JwtUtils::extract_session_token(request);
        let mut gate = SessionGate::mount(self.get_provider(request), token);
        gate.logout().await;

        let html = self.render_gate(&gate, request).await;
        let mut response = html_response(StatusCode::OK, html);
        if let Err(e) = response.add_cookie(&JwtUtils::create_empty_session_cookie()) {
            error!("Failed to clear session cookie: {}", e);
        }
        Ok(response)
    }

    async fn render_gate(&self, gate: &SessionGate, request: &HttpRequest) -> Result<String> {
        let view = gate.view();
        if !matches!(view, GateView::Dashboard(_)) {
            return render::render_view(view, &DashboardContext {
                students: &[],
                notice: None,
            });
        }

        // 仪表盘只读取学生集合
        let storage = self.get_storage(request);
        let key = &AppConfig::get().storage.students_key;
        let (students, notice) = match load_students(storage.as_ref(), key).await {
            Ok(students) => (students, None),
            Err(e) => {
                error!("Failed to load students for dashboard: {}", e);
                (Vec::new(), Some(format!("学生数据无法读取: {}", e.message())))
            }
        };

        render::render_view(view, &DashboardContext {
            students: &students,
            notice,
        })
    }
}

fn html_response(status: StatusCode, html: Result<String>) -> HttpResponse {
    match html {
        Ok(body) => HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .insert_header(("Cache-Control", "no-cache, no-store, must-revalidate"))
            .body(body),
        Err(e) => {
            error!("Failed to render page: {}", e);
            HttpResponse::InternalServerError()
                .content_type("text/plain; charset=utf-8")
                .body(e.format_simple())
        }
    }
}
