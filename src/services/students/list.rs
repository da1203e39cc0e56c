use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode};
use tracing::error;

use super::{StudentService, load_students};
use crate::models::students::entities::Student;
use crate::models::students::requests::StudentListParams;
use crate::models::students::responses::StudentListResponse;
use crate::models::{ApiResponse, ErrorCode};

pub async fn list_students(
    service: &StudentService,
    query: StudentListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let students = match load_students(storage.as_ref(), service.students_key()).await {
        Ok(students) => students,
        Err(e) => {
            error!("Failed to load students: {}", e);
            return Ok(ApiResponse::error_empty(
                ErrorCode::StorageDataCorrupted,
                format!("学生数据无法读取: {}", e.message()),
            )
            .respond(StatusCode::INTERNAL_SERVER_ERROR));
        }
    };

    let filtered = filter_students(students, &query);
    let (items, pagination) = query.pagination.paginate(filtered);

    Ok(ApiResponse::success(
        StudentListResponse { items, pagination },
        "获取学生列表成功",
    )
    .respond(StatusCode::OK))
}

/// 按班级精确过滤、按姓名或学号模糊搜索（保留原有顺序）
pub fn filter_students(students: Vec<Student>, query: &StudentListParams) -> Vec<Student> {
    let class_name = query
        .class_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let search = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    students
        .into_iter()
        .filter(|s| class_name.is_none_or(|c| s.class_name == c))
        .filter(|s| {
            search.as_deref().is_none_or(|q| {
                s.name.to_lowercase().contains(q) || s.id.to_lowercase().contains(q)
            })
        })
        .collect()
}
