//! 学生导入服务
//!
//! 解析 CSV、按允许的班级列表校验，然后整体追加到存储中的学生集合。
//! 任一行校验失败则整批放弃，不写入任何数据。

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode};
use futures_util::StreamExt;
use std::collections::{BTreeSet, HashMap};
use tracing::{error, info, warn};

use super::StudentService;
use crate::config::AppConfig;
use crate::errors::DashboardError;
use crate::models::students::entities::{
    CLASS_LABELS, MAX_CLASS_COUNT, Student, class_labels_display,
};
use crate::models::students::responses::StudentImportResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::StorageAdapter;
use crate::utils::decode_text;

const REQUIRED_COLUMNS: [&str; 3] = ["id", "name", "class"];

/// 导入错误
#[derive(Debug, Clone, PartialEq)]
pub enum ImportError {
    EmptyInput,
    MissingColumn(String),
    InvalidClass { student: String, class_name: String },
    ClassCountExceeded(usize),
    FileRead(String),
    ParseFailed(String),
    StorageCorrupted(String),
    StorageUnavailable(String),
}

impl ImportError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyInput => ErrorCode::ImportFileEmpty,
            Self::MissingColumn(_) => ErrorCode::ImportFileMissingColumn,
            Self::InvalidClass { .. } => ErrorCode::ImportFileInvalidClass,
            Self::ClassCountExceeded(_) => ErrorCode::ImportFileClassCountExceeded,
            Self::FileRead(_) | Self::ParseFailed(_) => ErrorCode::ImportFileReadFailed,
            Self::StorageCorrupted(_) => ErrorCode::StorageDataCorrupted,
            Self::StorageUnavailable(_) => ErrorCode::StorageUnavailable,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::StorageCorrupted(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::EmptyInput => "文件中至少需要表头和一行数据".to_string(),
            Self::MissingColumn(col) => format!("缺少必需列: {col}"),
            Self::InvalidClass {
                student,
                class_name,
            } => format!(
                "学生 {student} 的班级 \"{class_name}\" 不在允许列表中。允许的班级: {}",
                class_labels_display()
            ),
            Self::ClassCountExceeded(count) => {
                format!("导入的班级数量为 {count}，最多允许 {MAX_CLASS_COUNT} 个班级")
            }
            Self::FileRead(msg) => format!("文件读取失败: {msg}"),
            Self::ParseFailed(msg) => format!("文件解析失败: {msg}"),
            Self::StorageCorrupted(msg) => format!("已有学生数据无法解析，导入已取消: {msg}"),
            Self::StorageUnavailable(msg) => format!("已有学生数据读取失败，导入已取消: {msg}"),
        }
    }
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

impl From<ImportError> for DashboardError {
    fn from(err: ImportError) -> Self {
        let message = err.message();
        match err {
            ImportError::EmptyInput => DashboardError::empty_input(message),
            ImportError::MissingColumn(_) => DashboardError::missing_column(message),
            ImportError::InvalidClass { .. } => DashboardError::invalid_class(message),
            ImportError::ClassCountExceeded(_) => DashboardError::class_count_exceeded(message),
            ImportError::FileRead(_) | ImportError::ParseFailed(_) => {
                DashboardError::file_read(message)
            }
            ImportError::StorageCorrupted(_) => DashboardError::serialization(message),
            ImportError::StorageUnavailable(_) => DashboardError::storage_unavailable(message),
        }
    }
}

/// 解析 CSV 文本为学生列表（不做班级校验）
pub fn parse_students(content: &str) -> Result<Vec<Student>, ImportError> {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.len() < 2 {
        return Err(ImportError::EmptyInput);
    }

    let joined = lines.join("\n");
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(joined.as_bytes());
    let mut records = rdr.records();

    // 检查表头，同名列以第一次出现为准
    let headers = records
        .next()
        .ok_or(ImportError::EmptyInput)?
        .map_err(|e| ImportError::ParseFailed(format!("读取表头失败: {e}")))?;
    let mut header_map: HashMap<String, usize> = HashMap::new();
    for (i, h) in headers.iter().enumerate() {
        header_map.entry(h.to_lowercase()).or_insert(i);
    }

    let mut indexes = [0usize; 3];
    for (slot, column) in indexes.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = *header_map
            .get(column)
            .ok_or_else(|| ImportError::MissingColumn(column.to_string()))?;
    }
    let [id_idx, name_idx, class_idx] = indexes;

    let mut students = Vec::with_capacity(lines.len() - 1);
    for (row_num, result) in records.enumerate() {
        let record = result.map_err(|e| {
            ImportError::ParseFailed(format!("第 {} 行解析失败: {e}", row_num + 2))
        })?;
        let field = |idx: usize| record.get(idx).unwrap_or("").to_string();

        students.push(Student::imported(
            field(id_idx),
            field(name_idx),
            field(class_idx),
        ));
    }

    // 带引号的表头可能跨行，行数检查不能代替这里
    if students.is_empty() {
        return Err(ImportError::EmptyInput);
    }

    Ok(students)
}

/// 按固定的班级列表校验整批数据，返回本批次涉及的班级（有序）
pub fn validate_batch(students: &[Student]) -> Result<BTreeSet<String>, ImportError> {
    validate_batch_with(students, &CLASS_LABELS)
}

/// 按给定的班级列表校验
pub fn validate_batch_with(
    students: &[Student],
    allowed: &[&str],
) -> Result<BTreeSet<String>, ImportError> {
    if let Some(invalid) = students
        .iter()
        .find(|s| !allowed.contains(&s.class_name.as_str()))
    {
        return Err(ImportError::InvalidClass {
            student: invalid.name.clone(),
            class_name: invalid.class_name.clone(),
        });
    }

    // 允许列表本身不超过上限，这里仍独立检查
    let classes: BTreeSet<String> = students.iter().map(|s| s.class_name.clone()).collect();
    if classes.len() > MAX_CLASS_COUNT {
        return Err(ImportError::ClassCountExceeded(classes.len()));
    }

    Ok(classes)
}

/// 解析、校验并追加到 `key` 下的学生集合
///
/// 存储只读一次；只有校验通过才写一次。
pub async fn import_students(
    storage: &dyn StorageAdapter,
    key: &str,
    content: &str,
) -> Result<StudentImportResponse, ImportError> {
    let batch = parse_students(content)?;
    let classes = validate_batch(&batch)?;

    // 读取失败不能当作空集合，否则写回会覆盖已有数据
    let mut students: Vec<Student> = match storage.try_get_raw(key).await {
        Ok(Some(raw)) => serde_json::from_str(&raw)
            .map_err(|e| ImportError::StorageCorrupted(format!("'{key}': {e}")))?,
        Ok(None) => Vec::new(),
        Err(e) => return Err(ImportError::StorageUnavailable(e.message().to_string())),
    };

    let imported = batch.len();
    students.extend(batch);

    let value = serde_json::to_value(&students)
        .map_err(|e| ImportError::StorageCorrupted(e.to_string()))?;
    storage.set(key, &value).await;

    Ok(StudentImportResponse {
        imported,
        total: students.len(),
        classes: classes.into_iter().collect(),
    })
}

/// 导入学生（multipart 上传）
pub async fn import_students_upload(
    service: &StudentService,
    mut payload: Multipart,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let key = service.students_key();

    let result = async {
        let file_bytes = read_file_from_multipart(&mut payload).await?;
        let content = decode_text(&file_bytes).map_err(ImportError::FileRead)?;

        // 同一进程内的导入串行执行，避免读改写互相覆盖
        let _guard = service.import_lock.lock().await;
        import_students(storage.as_ref(), key, &content).await
    }
    .await;

    match result {
        Ok(response) => {
            info!(
                "Imported {} student(s) into '{}' via {} storage, {} in total",
                response.imported,
                key,
                storage.name(),
                response.total
            );
            Ok(ApiResponse::success(response, "导入完成").respond(StatusCode::OK))
        }
        Err(e) => {
            let err = DashboardError::from(e.clone());
            match e {
                ImportError::StorageCorrupted(_) | ImportError::StorageUnavailable(_) => {
                    error!("Import aborted [{}]: {}", err.code(), err.format_simple())
                }
                _ => warn!("Import rejected [{}]: {}", err.code(), err.format_simple()),
            }
            Ok(ApiResponse::error_empty(e.error_code(), e.message()).respond(e.status()))
        }
    }
}

async fn read_file_from_multipart(payload: &mut Multipart) -> Result<Vec<u8>, ImportError> {
    let max_size = AppConfig::get().upload.max_size;
    let mut file_bytes = Vec::new();
    let mut found = false;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ImportError::FileRead(format!("读取字段失败: {e}")))?;

        if field.name() == Some("file") {
            found = true;
            while let Some(chunk) = field.next().await {
                let data = chunk.map_err(|e| ImportError::FileRead(format!("读取数据失败: {e}")))?;
                if file_bytes.len() + data.len() > max_size {
                    return Err(ImportError::FileRead(format!(
                        "文件超过大小上限 {max_size} 字节"
                    )));
                }
                file_bytes.extend_from_slice(&data);
            }
        }
    }

    if !found {
        return Err(ImportError::FileRead("未找到文件字段".to_string()));
    }

    Ok(file_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result as DashboardResult;
    use crate::storage::StorageAdapterExt;
    use crate::storage::adapters::memory::MemoryStorage;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const KEY: &str = "students";

    /// 统计读写次数的存储
    #[derive(Default)]
    struct CountingStorage {
        inner: MemoryStorage,
        reads: AtomicUsize,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl StorageAdapter for CountingStorage {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn get_raw(&self, key: &str) -> Option<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get_raw(key).await
        }

        async fn set_raw(&self, key: &str, value: String) {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set_raw(key, value).await
        }

        async fn remove(&self, key: &str) {
            self.inner.remove(key).await
        }

        async fn clear(&self) {
            self.inner.clear().await
        }

        async fn keys(&self) -> Vec<String> {
            self.inner.keys().await
        }
    }

    /// 下一次读取会失败的存储，模拟介质暂时不可用
    #[derive(Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_next_read: AtomicBool,
    }

    #[async_trait]
    impl StorageAdapter for FlakyStorage {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn get_raw(&self, key: &str) -> Option<String> {
            self.try_get_raw(key).await.unwrap_or(None)
        }

        async fn try_get_raw(&self, key: &str) -> DashboardResult<Option<String>> {
            if self.fail_next_read.swap(false, Ordering::SeqCst) {
                return Err(DashboardError::storage_unavailable("connection reset"));
            }
            Ok(self.inner.get_raw(key).await)
        }

        async fn set_raw(&self, key: &str, value: String) {
            self.inner.set_raw(key, value).await
        }

        async fn remove(&self, key: &str) {
            self.inner.remove(key).await
        }

        async fn clear(&self) {
            self.inner.clear().await
        }

        async fn keys(&self) -> Vec<String> {
            self.inner.keys().await
        }
    }

    async fn stored(storage: &dyn StorageAdapter) -> Option<Value> {
        storage.get(KEY).await
    }

    #[tokio::test]
    async fn test_invalid_class_rejects_whole_batch() {
        let storage = MemoryStorage::new();
        let err = import_students(&storage, KEY, "id,name,class\n1,Kim,A반\n2,Lee,ZZ반")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ImportError::InvalidClass {
                student: "Lee".to_string(),
                class_name: "ZZ반".to_string()
            }
        );
        let message = err.message();
        assert!(message.contains("Lee"));
        assert!(message.contains("ZZ반"));
        assert!(message.contains("특강반"));
        assert_eq!(stored(&storage).await, None);
    }

    #[tokio::test]
    async fn test_invalid_class_keeps_previous_collection() {
        let storage = MemoryStorage::new();
        import_students(&storage, KEY, "id,name,class\n1,Kim,A반")
            .await
            .unwrap();
        let before = stored(&storage).await;

        assert!(
            import_students(&storage, KEY, "id,name,class\n2,Park,B반\n3,Lee,ZZ반")
                .await
                .is_err()
        );
        assert_eq!(stored(&storage).await, before);
    }

    #[tokio::test]
    async fn test_reordered_header() {
        let storage = MemoryStorage::new();
        let response = import_students(&storage, KEY, "name,id,class\nKim,1,A반")
            .await
            .unwrap();

        assert_eq!(response.imported, 1);
        assert_eq!(
            stored(&storage).await,
            Some(json!([{"id": "1", "name": "Kim", "class": "A반", "completionRate": 0.0}]))
        );
    }

    #[tokio::test]
    async fn test_same_batch_twice_appends_duplicates() {
        let storage = MemoryStorage::new();
        let csv = "id,name,class\n1,Kim,A반\n2,Lee,B반";
        import_students(&storage, KEY, csv).await.unwrap();
        let response = import_students(&storage, KEY, csv).await.unwrap();
        assert_eq!(response.total, 4);

        let students = storage.get_as::<Vec<Student>>(KEY).await.unwrap().unwrap();
        let ids: Vec<&str> = students.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "1", "2"]);
    }

    #[tokio::test]
    async fn test_missing_columns_leave_state_unchanged() {
        let storage = MemoryStorage::new();
        for (csv, column) in [
            ("name,class\nKim,A반", "id"),
            ("id,class\n1,A반", "name"),
            ("id,name\n1,Kim", "class"),
        ] {
            let err = import_students(&storage, KEY, csv).await.unwrap_err();
            assert_eq!(err, ImportError::MissingColumn(column.to_string()));
            assert_eq!(stored(&storage).await, None);
        }
    }

    #[tokio::test]
    async fn test_header_only_is_empty_input() {
        let storage = MemoryStorage::new();
        for csv in [
            "",
            "id,name,class",
            "\n  id,name,class  \n\n   \n",
            // 表头中的引号字段跨两行，没有数据行
            "\"id\n\",name,class",
        ] {
            assert_eq!(
                import_students(&storage, KEY, csv).await.unwrap_err(),
                ImportError::EmptyInput
            );
            assert_eq!(stored(&storage).await, None);
        }
    }

    #[tokio::test]
    async fn test_single_read_and_write() {
        let storage = CountingStorage::default();
        import_students(&storage, KEY, "id,name,class\n1,Kim,A반")
            .await
            .unwrap();
        assert_eq!(storage.reads.load(Ordering::SeqCst), 1);
        assert_eq!(storage.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejection_never_touches_storage() {
        let storage = CountingStorage::default();
        let _ = import_students(&storage, KEY, "id,name,class\n1,Kim,ZZ반").await;
        assert_eq!(storage.reads.load(Ordering::SeqCst), 0);
        assert_eq!(storage.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_corrupted_collection_aborts_without_write() {
        let storage = CountingStorage::default();
        storage.inner.set_raw(KEY, "legacy text".to_string()).await;

        let err = import_students(&storage, KEY, "id,name,class\n1,Kim,A반")
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::StorageCorrupted(_)));
        assert_eq!(storage.writes.load(Ordering::SeqCst), 0);
        assert_eq!(
            storage.inner.get_raw(KEY).await,
            Some("legacy text".to_string())
        );
    }

    #[tokio::test]
    async fn test_failed_read_aborts_without_overwrite() {
        let storage = FlakyStorage::default();
        import_students(&storage, KEY, "id,name,class\n1,Kim,A반\n2,Lee,B반")
            .await
            .unwrap();

        storage.fail_next_read.store(true, Ordering::SeqCst);
        let err = import_students(&storage, KEY, "id,name,class\n3,Park,C반")
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::StorageUnavailable(_)));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);

        let students = storage.get_as::<Vec<Student>>(KEY).await.unwrap().unwrap();
        let ids: Vec<&str> = students.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);

        // 介质恢复后正常追加
        let response = import_students(&storage, KEY, "id,name,class\n3,Park,C반")
            .await
            .unwrap();
        assert_eq!(response.total, 3);
    }

    #[test]
    fn test_header_case_and_whitespace() {
        let students = parse_students("  ID , Name ,CLASS \n 1 , Kim , A반 \n").unwrap();
        assert_eq!(students, vec![Student::imported("1", "Kim", "A반")]);
    }

    #[test]
    fn test_quoted_field_with_comma() {
        let students = parse_students("id,name,class\n1,\"Kim, Minji\",A반").unwrap();
        assert_eq!(students[0].name, "Kim, Minji");
    }

    #[test]
    fn test_short_row_yields_empty_fields() {
        let students = parse_students("id,name,class\n1,Kim").unwrap();
        assert_eq!(students[0].class_name, "");
        assert_eq!(
            validate_batch(&students).unwrap_err(),
            ImportError::InvalidClass {
                student: "Kim".to_string(),
                class_name: String::new()
            }
        );
    }

    #[test]
    fn test_duplicate_header_first_wins() {
        let students = parse_students("id,name,class,name\n1,Kim,A반,Other").unwrap();
        assert_eq!(students[0].name, "Kim");
    }

    #[test]
    fn test_first_invalid_row_reported() {
        let students =
            parse_students("id,name,class\n1,Kim,A반\n2,Lee,ZZ반\n3,Park,YY반").unwrap();
        match validate_batch(&students).unwrap_err() {
            ImportError::InvalidClass { student, .. } => assert_eq!(student, "Lee"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_class_count_limit_checked_independently() {
        let labels: Vec<String> = (0..=MAX_CLASS_COUNT).map(|i| format!("C{i}")).collect();
        let allowed: Vec<&str> = labels.iter().map(String::as_str).collect();
        let mut students: Vec<Student> = labels
            .iter()
            .enumerate()
            .map(|(i, label)| Student::imported(i.to_string(), format!("S{i}"), label.as_str()))
            .collect();

        let err = validate_batch_with(&students, &allowed).unwrap_err();
        assert_eq!(err, ImportError::ClassCountExceeded(31));
        let message = err.message();
        assert!(message.contains("31"));
        assert!(message.contains("30"));

        students.pop();
        assert_eq!(validate_batch_with(&students, &allowed).unwrap().len(), 30);
    }

    #[test]
    fn test_many_rows_one_class_within_limit() {
        let students: Vec<Student> = (0..31)
            .map(|i| Student::imported(i.to_string(), format!("S{i}"), "A반"))
            .collect();
        assert_eq!(validate_batch(&students).unwrap().len(), 1);
    }

    #[test]
    fn test_batch_classes_sorted_and_distinct() {
        let students = parse_students("id,name,class\n1,A,C반\n2,B,A반\n3,C,C반").unwrap();
        let classes: Vec<String> = validate_batch(&students).unwrap().into_iter().collect();
        assert_eq!(classes, vec!["A반", "C반"]);
    }

    #[test]
    fn test_error_conversion() {
        let err: DashboardError = ImportError::MissingColumn("id".to_string()).into();
        assert_eq!(err.code(), "E006");
        assert!(err.message().contains("id"));

        let err: DashboardError = ImportError::StorageUnavailable("down".to_string()).into();
        assert_eq!(err.code(), "E003");
        assert_eq!(ImportError::EmptyInput.error_code(), ErrorCode::ImportFileEmpty);
    }
}
