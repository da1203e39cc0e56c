pub mod login;
pub mod logout;
pub mod session;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::auth::LoginRequest;
use crate::session::AuthProvider;

pub struct AuthService {
    provider: Option<Arc<dyn AuthProvider>>,
}

impl AuthService {
    pub fn new_lazy() -> Self {
        Self { provider: None }
    }

    pub fn with_provider(provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            provider: Some(provider),
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

    // 登录
    pub async fn login(
        &self,
        login_request: LoginRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        login::handle_login(self, login_request, request).await
    }

    // 登出
    pub async fn logout(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        logout::handle_logout(self, request).await
    }

    // 当前会话
    pub async fn session(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        session::handle_session(self, request).await
    }
}
