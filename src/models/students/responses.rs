use super::entities::Student;
use crate::models::common::PaginationInfo;
use serde::Serialize;
use ts_rs::TS;

// 学生列表响应（状态表）
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct StudentListResponse {
    pub items: Vec<Student>,
    pub pagination: PaginationInfo,
}

// 导入结果
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct StudentImportResponse {
    /// 本次导入的行数
    pub imported: usize,
    /// 导入后集合总数
    pub total: usize,
    /// 本批次涉及的班级
    pub classes: Vec<String>,
}

// 单个班级的统计
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct ClassSummary {
    #[serde(rename = "class")]
    pub class_name: String,
    pub student_count: usize,
    pub average_completion_rate: f64,
}

// 统计概览
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct StudentSummaryResponse {
    pub student_count: usize,
    pub average_completion_rate: f64,
    pub classes: Vec<ClassSummary>,
}

// 班级列表
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct ClassListResponse {
    pub classes: Vec<String>,
    pub max_class_count: usize,
}
