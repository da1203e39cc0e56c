use actix_web::cookie::{Cookie, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::models::auth::{Principal, UserRole};

// JWT Claims 结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,          // Subject (username)
    pub name: String,         // 显示名称
    pub role: String,         // 用户角色
    pub token_type: String,   // token类型，目前只有 "access"
    pub jti: String,          // 令牌唯一标识，用于注销
    pub exp: usize,           // Expiration time (时间戳)
    pub iat: usize,           // Issued at (签发时间)
}

impl Claims {
    /// 还原出签发时的主体
    pub fn principal(&self) -> Result<Principal, jsonwebtoken::errors::Error> {
        let role = self
            .role
            .parse::<UserRole>()
            .map_err(|_| jsonwebtoken::errors::ErrorKind::InvalidToken)?;
        Ok(Principal {
            username: self.sub.clone(),
            display_name: self.name.clone(),
            role,
        })
    }
}

/// 会话令牌签发与校验
#[derive(Clone)]
pub struct JwtUtils {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry: chrono::Duration,
}

impl JwtUtils {
    pub fn new(secret: &str, access_token_expiry: chrono::Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expiry,
        }
    }

    pub fn access_token_expiry(&self) -> chrono::Duration {
        self.access_token_expiry
    }

    // 生成 Access Token
    pub fn generate_access_token(
        &self,
        principal: &Principal,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        self.generate_token_with_expiry(principal, "access", self.access_token_expiry)
    }

    // 生成带自定义过期时间的 Token
    pub fn generate_token_with_expiry(
        &self,
        principal: &Principal,
        token_type: &str,
        expiry_duration: chrono::Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now();
        let expiration = now + expiry_duration;

        let claims = Claims {
            sub: principal.username.clone(),
            name: principal.display_name.clone(),
            role: principal.role.to_string(),
            token_type: token_type.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            exp: expiration.timestamp().max(0) as usize,
            iat: now.timestamp().max(0) as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    // 验证 JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let validation = Validation::default();
        decode::<Claims>(token, &self.decoding_key, &validation).map(|token_data| token_data.claims)
    }

    // 验证 Access Token
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let claims = self.verify_token(token)?;
        if claims.token_type != "access" {
            return Err(jsonwebtoken::errors::Error::from(
                jsonwebtoken::errors::ErrorKind::InvalidToken,
            ));
        }
        Ok(claims)
    }

    /// 创建会话 Cookie，有效期与令牌一致
    pub fn create_session_cookie(token: &str, max_age_secs: i64) -> Cookie<'static> {
        let config = AppConfig::get();
        Cookie::build(config.session.cookie_name.clone(), token.to_string())
            .path("/")
            .max_age(actix_web::cookie::time::Duration::seconds(max_age_secs))
            .same_site(SameSite::Strict)
            .http_only(true)
            .secure(config.is_production()) // 生产环境下使用 HTTPS
            .finish()
    }

    /// 创建空的会话 Cookie（用于注销）
    pub fn create_empty_session_cookie() -> Cookie<'static> {
        let config = AppConfig::get();
        Cookie::build(config.session.cookie_name.clone(), "")
            .path("/")
            .max_age(actix_web::cookie::time::Duration::seconds(0))
            .same_site(SameSite::Strict)
            .http_only(true)
            .secure(config.is_production())
            .finish()
    }

    /// 从请求中提取会话令牌：优先 Authorization 头，其次 Cookie
    pub fn extract_session_token(req: &actix_web::HttpRequest) -> Option<String> {
        const BEARER_PREFIX: &str = "Bearer ";

        let from_header = req
            .headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix(BEARER_PREFIX))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        from_header.or_else(|| {
            req.cookie(&AppConfig::get().session.cookie_name)
                .map(|cookie| cookie.value().to_string())
                .filter(|s| !s.is_empty())
        })
    }
}
