//! 认证提供方
//!
//! 会话门只依赖 [`AuthProvider`]；默认实现使用配置中的账号、argon2 密码哈希
//! 与 JWT 会话令牌，注销的令牌记录在 moka 缓存中直到其自然过期。

use async_trait::async_trait;
use moka::future::Cache;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::AccountConfig;
use crate::errors::{DashboardError, Result};
use crate::models::auth::{Principal, UserRole};
use crate::utils::jwt::JwtUtils;
use crate::utils::password::verify_password;

/// 登录成功后签发的会话
#[derive(Debug, Clone)]
pub struct SignedSession {
    pub principal: Principal,
    pub token: String,
    pub expires_in: i64,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// 查询当前会话；令牌缺失、无效或已注销时返回 None
    async fn current_session(&self, token: Option<&str>) -> Option<Principal>;

    /// 校验凭据并签发会话
    async fn sign_in(&self, username: &str, password: &str) -> Result<SignedSession>;

    /// 注销令牌
    async fn sign_out(&self, token: &str);
}

/// 可登录的账号
#[derive(Debug, Clone)]
pub struct Account {
    pub username: String,
    pub password_hash: String,
    pub display_name: String,
    pub role: UserRole,
}

impl TryFrom<&AccountConfig> for Account {
    type Error = DashboardError;

    fn try_from(config: &AccountConfig) -> Result<Self> {
        let role = config
            .role
            .parse::<UserRole>()
            .map_err(|e| DashboardError::validation(format!("账号 {} 配置错误: {e}", config.username)))?;

        Ok(Self {
            username: config.username.clone(),
            password_hash: config.password_hash.clone(),
            display_name: config
                .display_name
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| config.username.clone()),
            role,
        })
    }
}

impl Account {
    fn principal(&self) -> Principal {
        Principal {
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
        }
    }
}

pub struct JwtAuthProvider {
    accounts: HashMap<String, Account>,
    jwt: JwtUtils,
    // jti → ()，TTL 与令牌有效期一致
    revoked: Cache<String, ()>,
}

impl JwtAuthProvider {
    pub fn new(accounts: Vec<Account>, jwt: JwtUtils, revocation_capacity: u64) -> Self {
        let ttl = jwt
            .access_token_expiry()
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(3600));
        let revoked = Cache::builder()
            .max_capacity(revocation_capacity)
            .time_to_live(ttl)
            .build();

        debug!("JwtAuthProvider initialized with {} account(s)", accounts.len());
        Self {
            accounts: accounts
                .into_iter()
                .map(|account| (account.username.clone(), account))
                .collect(),
            jwt,
            revoked,
        }
    }
}

#[async_trait]
impl AuthProvider for JwtAuthProvider {
    async fn current_session(&self, token: Option<&str>) -> Option<Principal> {
        let token = token?;
        let claims = match self.jwt.verify_access_token(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!("Session token rejected: {}", e);
                return None;
            }
        };

        if self.revoked.contains_key(&claims.jti) {
            debug!("Session token {} has been signed out", claims.jti);
            return None;
        }

        // 账号被移除后旧令牌失效
        if !self.accounts.contains_key(&claims.sub) {
            warn!("Session token refers to unknown account '{}'", claims.sub);
            return None;
        }

        claims.principal().ok()
    }

    async fn sign_in(&self, username: &str, password: &str) -> Result<SignedSession> {
        let account = self
            .accounts
            .get(username.trim())
            .ok_or_else(|| DashboardError::authentication("用户名或密码错误"))?;

        // 哈希校验放到阻塞线程池
        let password = password.to_string();
        let hash = account.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| DashboardError::authentication(format!("密码校验失败: {e}")))?;
        if !verified {
            info!("Login rejected for '{}'", account.username);
            return Err(DashboardError::authentication("用户名或密码错误"));
        }

        let principal = account.principal();
        let token = self.jwt.generate_access_token(&principal)?;
        info!("User {} logged in successfully", principal.username);

        Ok(SignedSession {
            principal,
            token,
            expires_in: self.jwt.access_token_expiry().num_seconds(),
        })
    }

    async fn sign_out(&self, token: &str) {
        match self.jwt.verify_access_token(token) {
            Ok(claims) => {
                info!("User {} signed out", claims.sub);
                self.revoked.insert(claims.jti, ()).await;
            }
            Err(e) => debug!("Sign-out with invalid token ignored: {}", e),
        }
    }
}
