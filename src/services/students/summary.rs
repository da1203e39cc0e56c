use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode};
use std::collections::BTreeMap;
use tracing::error;

use super::{StudentService, load_students};
use crate::models::students::entities::Student;
use crate::models::students::responses::{ClassSummary, StudentSummaryResponse};
use crate::models::{ApiResponse, ErrorCode};

pub async fn student_summary(
    service: &StudentService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    match load_students(storage.as_ref(), service.students_key()).await {
        Ok(students) => Ok(
            ApiResponse::success(summarize(&students), "获取统计成功").respond(StatusCode::OK)
        ),
        Err(e) => {
            error!("Failed to load students for summary: {}", e);
            Ok(ApiResponse::error_empty(
                ErrorCode::StorageDataCorrupted,
                format!("学生数据无法读取: {}", e.message()),
            )
            .respond(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

/// 按班级汇总人数与平均完成率
pub fn summarize(students: &[Student]) -> StudentSummaryResponse {
    let mut by_class: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for student in students {
        let entry = by_class.entry(student.class_name.as_str()).or_default();
        entry.0 += 1;
        entry.1 += student.completion_rate;
    }

    let classes = by_class
        .into_iter()
        .map(|(class_name, (count, sum))| ClassSummary {
            class_name: class_name.to_string(),
            student_count: count,
            average_completion_rate: round2(sum / count as f64),
        })
        .collect();

    let total: f64 = students.iter().map(|s| s.completion_rate).sum();
    StudentSummaryResponse {
        student_count: students.len(),
        average_completion_rate: if students.is_empty() {
            0.0
        } else {
            round2(total / students.len() as f64)
        },
        classes,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
