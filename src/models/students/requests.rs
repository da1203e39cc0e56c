use serde::Deserialize;
use ts_rs::TS;

use crate::models::common::PaginationQuery;

// 学生列表查询参数（来自HTTP请求）
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct StudentListParams {
    #[serde(flatten)]
    pub pagination: PaginationQuery,
    /// 按班级过滤
    #[serde(rename = "class")]
    pub class_name: Option<String>,
    /// 按姓名或学号搜索
    pub search: Option<String>,
}
