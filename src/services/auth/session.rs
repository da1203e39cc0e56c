use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode};

use crate::models::{ApiResponse, auth::SessionResponse};
use crate::utils::jwt::JwtUtils;

use super::AuthService;

/// 查询当前会话，未登录也返回 200
pub async fn handle_session(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let token = JwtUtils::extract_session_token(request);
    let principal = service
        .get_provider(request)
        .current_session(token.as_deref())
        .await;

    let response = SessionResponse {
        authenticated: principal.is_some(),
        principal,
    };
    Ok(ApiResponse::success(response, "获取会话成功").respond(StatusCode::OK))
}
