pub mod classes;
pub mod export;
pub mod import;
pub mod list;
pub mod summary;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::students::entities::Student;
use crate::models::students::requests::StudentListParams;
use crate::storage::{StorageAdapter, StorageAdapterExt};

pub struct StudentService {
    storage: Option<Arc<dyn StorageAdapter>>,
    import_lock: Mutex<()>,
}

impl StudentService {
    pub fn new_lazy() -> Self {
        Self {
            storage: None,
            import_lock: Mutex::new(()),
        }
    }

    /// 直接注入存储，不再从 app_data 查找
    pub fn with_storage(storage: Arc<dyn StorageAdapter>) -> Self {
        Self {
            storage: Some(storage),
            import_lock: Mutex::new(()),
        }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn StorageAdapter> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn StorageAdapter>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub(crate) fn students_key(&self) -> &'static str {
        &AppConfig::get().storage.students_key
    }

    // 学生状态表
    pub async fn list_students(
        &self,
        query: StudentListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_students(self, query, request).await
    }

    // 统计概览
    pub async fn summary(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        summary::student_summary(self, request).await
    }

    // 导出 CSV
    pub async fn export_students(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        export::export_students(self, request).await
    }

    // 下载导入模板
    pub async fn download_template(&self) -> ActixResult<HttpResponse> {
        export::download_template().await
    }

    // 班级列表
    pub async fn list_classes(&self) -> ActixResult<HttpResponse> {
        classes::list_classes().await
    }

    // 导入 CSV
    pub async fn import_students(
        &self,
        payload: Multipart,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        import::import_students_upload(self, payload, request).await
    }
}

/// 读取学生集合，不存在时为空
pub async fn load_students(storage: &dyn StorageAdapter, key: &str) -> Result<Vec<Student>> {
    Ok(storage.get_as::<Vec<Student>>(key).await?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::adapters::memory::MemoryStorage;
    use actix_web::{http::StatusCode, test};
    use serde_json::Value;

    #[actix_web::test]
    async fn test_injected_storage_without_app_data() {
        let storage: Arc<dyn StorageAdapter> = Arc::new(MemoryStorage::new());
        storage
            .set_as(
                "students",
                &vec![
                    Student::imported("1", "Kim", "A반"),
                    Student::imported("2", "Lee", "B반"),
                ],
            )
            .await
            .unwrap();
        let service = StudentService::with_storage(storage);

        // 请求上没有挂任何 app_data
        let req = test::TestRequest::default().to_http_request();
        let resp = service.summary(&req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["data"]["student_count"], 2);
    }
}
