use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode};

use crate::models::{
    ApiResponse, ErrorCode,
    auth::{LoginRequest, LoginResponse},
};
use crate::utils::jwt::JwtUtils;

use super::AuthService;

pub async fn handle_login(
    service: &AuthService,
    login_request: LoginRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let provider = service.get_provider(request);

    match provider
        .sign_in(&login_request.username, &login_request.password)
        .await
    {
        Ok(session) => {
            let cookie = JwtUtils::create_session_cookie(&session.token, session.expires_in);
            let response = LoginResponse {
                access_token: session.token,
                expires_in: session.expires_in,
                principal: session.principal,
                created_at: chrono::Utc::now(),
            };

            Ok(HttpResponse::Ok()
                .cookie(cookie)
                .json(ApiResponse::success(response, "登录成功")))
        }
        Err(e) => {
            tracing::debug!("Login failed for '{}': {}", login_request.username, e);
            Ok(
                ApiResponse::error_empty(ErrorCode::AuthFailed, e.message())
                    .respond(StatusCode::UNAUTHORIZED),
            )
        }
    }
}
