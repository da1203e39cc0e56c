use actix_web::{HttpRequest, HttpResponse, error, http::StatusCode};
use tracing::debug;

use crate::models::{ApiResponse, ErrorCode};

/// JSON 请求体解析失败时返回统一格式
pub fn json_error_handler(err: error::JsonPayloadError, req: &HttpRequest) -> error::Error {
    debug!("Invalid JSON payload for {}: {}", req.path(), err);
    let response = ApiResponse::error_empty(ErrorCode::BadRequest, format!("请求体格式错误: {err}"))
        .respond(StatusCode::BAD_REQUEST);
    error::InternalError::from_response(err, response).into()
}

/// 查询参数解析失败时返回统一格式
pub fn query_error_handler(err: error::QueryPayloadError, req: &HttpRequest) -> error::Error {
    debug!("Invalid query for {}: {}", req.path(), err);
    let response = ApiResponse::error_empty(ErrorCode::BadRequest, format!("查询参数错误: {err}"))
        .respond(StatusCode::BAD_REQUEST);
    error::InternalError::from_response(err, response).into()
}

/// 表单解析失败时返回统一格式
pub fn form_error_handler(err: error::UrlencodedError, req: &HttpRequest) -> error::Error {
    debug!("Invalid form for {}: {}", req.path(), err);
    let response: HttpResponse =
        ApiResponse::error_empty(ErrorCode::BadRequest, format!("表单格式错误: {err}"))
            .respond(StatusCode::BAD_REQUEST);
    error::InternalError::from_response(err, response).into()
}
