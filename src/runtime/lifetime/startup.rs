use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::auth::UserRole;
use crate::session::{Account, AuthProvider, JwtAuthProvider};
use crate::storage::StorageAdapter;
use crate::utils::jwt::JwtUtils;
use crate::utils::password::hash_password;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<dyn StorageAdapter>,
    pub auth: Arc<dyn AuthProvider>,
}

/// 生成随机字符串
fn generate_random_password(length: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// 未配置密钥时生成随机密钥，重启后旧会话失效
fn resolve_jwt_secret(config: &AppConfig) -> String {
    if config.jwt.secret.is_empty() {
        warn!("jwt.secret is not set, generating a random secret; sessions will not survive restarts");
        generate_random_password(64)
    } else {
        config.jwt.secret.clone()
    }
}

/// 默认管理员账号
/// 配置中没有任何账号时，使用 ADMIN_PASSWORD 或随机密码创建 admin
fn seed_admin(config: &AppConfig) -> Result<Account> {
    info!("No accounts configured, creating default admin account...");

    // 获取密码：优先从环境变量，否则生成随机密码
    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
        let pwd = generate_random_password(16);
        warn!("==========================================================");
        warn!("  ADMIN PASSWORD NOT SET - USING GENERATED PASSWORD");
        warn!("  Generated admin password: {}", pwd);
        warn!("  Please save this password or set ADMIN_PASSWORD env var");
        warn!("==========================================================");
        pwd
    });

    Ok(Account {
        username: "admin".to_string(),
        password_hash: hash_password(&password, &config.argon2)?,
        display_name: "Administrator".to_string(),
        role: UserRole::Admin,
    })
}

/// 从配置构建账号列表
fn build_accounts(config: &AppConfig) -> Result<Vec<Account>> {
    if config.auth.accounts.is_empty() {
        return Ok(vec![seed_admin(config)?]);
    }

    let accounts = config
        .auth
        .accounts
        .iter()
        .map(Account::try_from)
        .collect::<Result<Vec<_>>>()?;
    debug!("Loaded {} account(s) from configuration", accounts.len());
    Ok(accounts)
}

pub fn create_auth_provider(config: &AppConfig) -> Result<Arc<dyn AuthProvider>> {
    let jwt = JwtUtils::new(
        &resolve_jwt_secret(config),
        chrono::Duration::minutes(config.jwt.access_token_expiry),
    );
    let accounts = build_accounts(config)?;
    Ok(Arc::new(JwtAuthProvider::new(
        accounts,
        jwt,
        config.session.revocation_capacity,
    )))
}

/// 准备服务器启动的上下文
/// 包括存储介质与认证提供方
pub async fn prepare_server_startup() -> StartupContext {
    // Redis TLS 连接需要
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    if cfg!(debug_assertions) {
        crate::storage::register::debug_storage_registry();
        debug!("Debug mode: Storage registry is enabled");
    }

    let storage = crate::storage::create_storage()
        .await
        .expect("Failed to create storage backend");
    warn!("Storage backend '{}' initialized", storage.name());

    let auth = create_auth_provider(AppConfig::get()).expect("Failed to create auth provider");
    warn!("Auth provider initialized");

    StartupContext { storage, auth }
}
