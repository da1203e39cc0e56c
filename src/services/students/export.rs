//! 学生导出服务

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode};
use tracing::error;

use super::{StudentService, load_students};
use crate::models::students::entities::Student;
use crate::models::{ApiResponse, ErrorCode};

/// 导出学生集合为 CSV
pub async fn export_students(
    service: &StudentService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let students = match load_students(storage.as_ref(), service.students_key()).await {
        Ok(students) => students,
        Err(e) => {
            error!("导出学生失败: {}", e);
            return Ok(ApiResponse::error_empty(
                ErrorCode::StorageDataCorrupted,
                format!("导出学生失败: {}", e.message()),
            )
            .respond(StatusCode::INTERNAL_SERVER_ERROR));
        }
    };

    let data = students_to_csv(&students).map_err(|e| {
        error!("CSV 生成失败: {}", e);
        actix_web::error::ErrorInternalServerError(format!("CSV 生成失败: {e}"))
    })?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(("Content-Disposition", "attachment; filename=\"students.csv\""))
        .body(data))
}

/// 下载导入模板
pub async fn download_template() -> ActixResult<HttpResponse> {
    let data = template_csv().map_err(|e| {
        error!("CSV 生成失败: {}", e);
        actix_web::error::ErrorInternalServerError(format!("CSV 生成失败: {e}"))
    })?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            "attachment; filename=\"student_import_template.csv\"",
        ))
        .body(data))
}

pub fn students_to_csv(students: &[Student]) -> crate::errors::Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    // 写入表头
    wtr.write_record(["id", "name", "class", "completion_rate"])?;

    // 写入数据
    for student in students {
        wtr.write_record([
            student.id.as_str(),
            student.name.as_str(),
            student.class_name.as_str(),
            &student.completion_rate.to_string(),
        ])?;
    }

    wtr.into_inner()
        .map_err(|e| crate::errors::DashboardError::serialization(e.to_string()))
}

fn template_csv() -> crate::errors::Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    // 表头与示例行
    wtr.write_record(["id", "name", "class"])?;
    wtr.write_record(["20240001", "Kim Minji", "A반"])?;

    wtr.into_inner()
        .map_err(|e| crate::errors::DashboardError::serialization(e.to_string()))
}
