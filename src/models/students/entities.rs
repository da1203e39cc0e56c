use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 单次导入允许出现的不同班级数上限
pub const MAX_CLASS_COUNT: usize = 30;

/// 允许的班级名称（编译期固定）
pub const CLASS_LABELS: [&str; 30] = [
    "A반", "B반", "C반", "D반", "E반", "F반", "G반", "H반", "I반", "J반", "K반", "L반", "M반",
    "N반", "O반", "P반", "Q반", "R반", "S반", "T반", "U반", "V반", "W반", "X반", "Y반", "Z반",
    "기초반", "심화반", "보충반", "특강반",
];

/// 以逗号拼接的班级列表，用于提示信息
pub fn class_labels_display() -> String {
    CLASS_LABELS.join(", ")
}

// 学生实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct Student {
    pub id: String,
    pub name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    /// 完成率 0–100
    #[serde(default)]
    pub completion_rate: f64,
}

impl Student {
    /// 导入时创建，完成率默认为 0
    pub fn imported(id: impl Into<String>, name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            class_name: class_name.into(),
            completion_rate: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list_fits_limit() {
        assert!(CLASS_LABELS.len() <= MAX_CLASS_COUNT);
        assert!(CLASS_LABELS.contains(&"A반"));
        assert!(CLASS_LABELS.contains(&"특강반"));
        assert!(!CLASS_LABELS.contains(&"ZZ반"));
        assert!(!CLASS_LABELS.contains(&"a반"));
    }

    #[test]
    fn test_serialized_field_names() {
        let student = Student::imported("1", "Kim", "A반");
        let json = serde_json::to_value(&student).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "1", "name": "Kim", "class": "A반", "completionRate": 0.0})
        );
    }

    #[test]
    fn test_integer_completion_rate_deserializes() {
        let student: Student = serde_json::from_str(
            r#"{"id": "7", "name": "Park", "class": "B반", "completionRate": 85}"#,
        )
        .unwrap();
        assert_eq!(student.completion_rate, 85.0);
    }
}
