/*!
 * 会话认证中间件
 *
 * 保护需要登录的 API 路由。令牌取自 `Authorization: Bearer <TOKEN>` 请求头，
 * 缺失时取会话 Cookie；由 [`AuthProvider`] 判定会话是否有效。
 *
 * ```rust,ignore
 * web::scope("/api/v1/students")
 *     .wrap(RequireSession)
 *     .route("", web::get().to(list_students))
 * ```
 *
 * 处理程序中可通过 [`RequireSession::extract_principal`] 取得当前用户。
 */

use crate::models::auth::Principal;
use crate::models::{ApiResponse, ErrorCode};
use crate::session::AuthProvider;
use crate::utils::jwt::JwtUtils;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, info};

#[derive(Clone)]
pub struct RequireSession;

fn unauthorized(message: &str) -> HttpResponse {
    ApiResponse::<()>::error_empty(ErrorCode::Unauthorized, message)
        .respond(StatusCode::UNAUTHORIZED)
}

// 提取令牌并向认证提供方查询会话
async fn resolve_principal(req: &ServiceRequest) -> Result<Principal, String> {
    let token = JwtUtils::extract_session_token(req.request())
        .ok_or_else(|| "Missing session token".to_string())?;

    let provider = req
        .app_data::<actix_web::web::Data<Arc<dyn AuthProvider>>>()
        .ok_or_else(|| "AuthProvider not configured".to_string())?
        .get_ref()
        .clone();

    provider
        .current_session(Some(&token))
        .await
        .ok_or_else(|| "Session expired or signed out".to_string())
}

impl<S, B> Transform<S, ServiceRequest> for RequireSession
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireSessionMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireSessionMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireSessionMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireSessionMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            // 处理 OPTIONS 请求
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(req.into_response(HttpResponse::NoContent().finish().map_into_right_body()));
            }

            match resolve_principal(&req).await {
                Ok(principal) => {
                    debug!("Session authentication successful for {}", principal.username);
                    req.extensions_mut().insert(principal);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(err) => {
                    info!(
                        "Session authentication failed for request to {}: {}",
                        req.path(),
                        err
                    );
                    Ok(req.into_response(
                        unauthorized(&format!("Unauthorized: {err}")).map_into_right_body(),
                    ))
                }
            }
        })
    }
}

impl RequireSession {
    /// 从请求扩展中提取当前用户
    /// 此函数应该在应用了 RequireSession 中间件的路由处理程序中使用
    pub fn extract_principal(req: &actix_web::HttpRequest) -> Option<Principal> {
        req.extensions().get::<Principal>().cloned()
    }
}
