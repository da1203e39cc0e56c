use actix_web::{HttpResponse, Result as ActixResult, http::StatusCode};

use crate::models::ApiResponse;
use crate::models::students::entities::{CLASS_LABELS, MAX_CLASS_COUNT};
use crate::models::students::responses::ClassListResponse;

/// 可导入的班级列表
pub async fn list_classes() -> ActixResult<HttpResponse> {
    let response = ClassListResponse {
        classes: CLASS_LABELS.iter().map(|c| c.to_string()).collect(),
        max_class_count: MAX_CLASS_COUNT,
    };
    Ok(ApiResponse::success(response, "获取班级列表成功").respond(StatusCode::OK))
}
