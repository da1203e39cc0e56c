use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;
use tracing::info;

use crate::middlewares::{self, RequireSession};
use crate::models::students::requests::StudentListParams;
use crate::services::StudentService;

// 懒加载的全局 StudentService 实例
static STUDENT_SERVICE: Lazy<StudentService> = Lazy::new(StudentService::new_lazy);

// HTTP处理程序
pub async fn list_students(
    req: HttpRequest,
    query: web::Query<StudentListParams>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.list_students(query.into_inner(), &req).await
}

pub async fn student_summary(req: HttpRequest) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.summary(&req).await
}

pub async fn export_students(req: HttpRequest) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.export_students(&req).await
}

pub async fn download_template() -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.download_template().await
}

pub async fn import_students(req: HttpRequest, payload: Multipart) -> ActixResult<HttpResponse> {
    if let Some(principal) = RequireSession::extract_principal(&req) {
        info!("Student import requested by {}", principal.username);
    }
    STUDENT_SERVICE.import_students(payload, &req).await
}

pub async fn list_classes() -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.list_classes().await
}

// 配置路由
pub fn configure_student_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/students")
            .wrap(middlewares::RequireSession)
            .route("", web::get().to(list_students))
            .route("/summary", web::get().to(student_summary))
            .route("/export", web::get().to(export_students))
            .route("/import/template", web::get().to(download_template))
            .route("/import", web::post().to(import_students)),
    )
    .service(
        web::scope("/api/v1/classes")
            .wrap(middlewares::RequireSession)
            .route("", web::get().to(list_classes)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::AuthProvider;
    use crate::session::provider::tests::test_provider;
    use crate::storage::StorageAdapter;
    use crate::storage::adapters::memory::MemoryStorage;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::{Value, json};
    use std::sync::Arc;

    const BOUNDARY: &str = "----hwdashboard-test";

    fn multipart_body(content: &str) -> String {
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"students.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        )
    }

    async fn signed_token(provider: &Arc<dyn AuthProvider>) -> String {
        provider
            .sign_in("kim", "correct horse")
            .await
            .unwrap()
            .token
    }

    fn import_request(token: &str, content: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/v1/students/import")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .insert_header((
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(multipart_body(content))
    }

    #[actix_web::test]
    async fn test_requires_session() {
        let storage: Arc<dyn StorageAdapter> = Arc::new(MemoryStorage::new());
        let provider: Arc<dyn AuthProvider> = Arc::new(test_provider());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storage))
                .app_data(web::Data::new(provider))
                .configure(configure_student_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/students").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/v1/classes")
            .insert_header(("Authorization", "Bearer garbage"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_import_then_list_and_summary() {
        let storage: Arc<dyn StorageAdapter> = Arc::new(MemoryStorage::new());
        let provider: Arc<dyn AuthProvider> = Arc::new(test_provider());
        let token = signed_token(&provider).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storage.clone()))
                .app_data(web::Data::new(provider))
                .configure(configure_student_routes),
        )
        .await;

        let req = import_request(&token, "name,id,class\nKim,1,A반\nLee,2,B반").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["imported"], 2);
        assert_eq!(body["data"]["total"], 2);

        let req = test::TestRequest::get()
            .uri("/api/v1/students?class=A%EB%B0%98")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body["data"]["items"],
            json!([{ "id": "1", "name": "Kim", "class": "A반", "completionRate": 0.0 }])
        );
        assert_eq!(body["data"]["pagination"]["total"], 1);

        let req = test::TestRequest::get()
            .uri("/api/v1/students/summary")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["student_count"], 2);
        assert_eq!(body["data"]["classes"].as_array().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn test_rejected_import_leaves_collection_untouched() {
        let storage: Arc<dyn StorageAdapter> = Arc::new(MemoryStorage::new());
        let provider: Arc<dyn AuthProvider> = Arc::new(test_provider());
        let token = signed_token(&provider).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storage.clone()))
                .app_data(web::Data::new(provider))
                .configure(configure_student_routes),
        )
        .await;

        let req = import_request(&token, "id,name,class\n1,Kim,A반\n2,Lee,ZZ반").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], 3002);
        let message = body["message"].as_str().unwrap();
        assert!(message.contains("Lee"));
        assert!(message.contains("ZZ반"));

        assert_eq!(storage.get("students").await, None);
    }

    #[actix_web::test]
    async fn test_classes_and_template() {
        let storage: Arc<dyn StorageAdapter> = Arc::new(MemoryStorage::new());
        let provider: Arc<dyn AuthProvider> = Arc::new(test_provider());
        let token = signed_token(&provider).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storage))
                .app_data(web::Data::new(provider))
                .configure(configure_student_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/classes")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["classes"].as_array().unwrap().len(), 30);
        assert_eq!(body["data"]["max_class_count"], 30);

        let req = test::TestRequest::get()
            .uri("/api/v1/students/import/template")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert!(body.starts_with(b"id,name,class\n"));
    }
}
