//! 会话门
//!
//! 每次挂载（每个页面请求）创建一个 [`SessionGate`]，向认证提供方最多查询一次当前会话，
//! 据此决定渲染登录表单还是已认证的仪表盘。

pub mod provider;

use std::sync::Arc;
use tracing::debug;

use crate::models::auth::Principal;

pub use provider::{Account, AuthProvider, JwtAuthProvider, SignedSession};

/// 会话状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// 尚未得出结论
    Pending,
    Authenticated { principal: Principal },
    Unauthenticated,
}

/// 会话门应渲染的分支
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateView<'a> {
    Loading,
    LoginForm,
    Dashboard(&'a Principal),
}

pub struct SessionGate {
    provider: Arc<dyn AuthProvider>,
    token: Option<String>,
    state: SessionState,
}

impl SessionGate {
    pub fn mount(provider: Arc<dyn AuthProvider>, token: Option<String>) -> Self {
        Self {
            provider,
            token,
            state: SessionState::Pending,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// 查询当前会话；已有结论时不再查询
    pub async fn resolve(&mut self) -> &SessionState {
        if self.state == SessionState::Pending {
            self.state = match self.provider.current_session(self.token.as_deref()).await {
                Some(principal) => SessionState::Authenticated { principal },
                None => SessionState::Unauthenticated,
            };
            debug!("Session gate resolved: {:?}", self.state);
        }
        &self.state
    }

    /// 登录成功回调，直接进入已认证分支
    pub fn on_login(&mut self, principal: Principal, token: String) {
        self.token = Some(token);
        self.state = SessionState::Authenticated { principal };
    }

    /// 注销并回到登录分支
    pub async fn logout(&mut self) {
        if let Some(token) = self.token.take() {
            self.provider.sign_out(&token).await;
        }
        self.state = SessionState::Unauthenticated;
    }

    pub fn view(&self) -> GateView<'_> {
        match &self.state {
            SessionState::Pending => GateView::Loading,
            SessionState::Authenticated { principal } => GateView::Dashboard(principal),
            SessionState::Unauthenticated => GateView::LoginForm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{DashboardError, Result};
    use crate::models::auth::UserRole;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 记录调用次数的认证提供方
    struct CountingProvider {
        principal: Option<Principal>,
        queries: AtomicUsize,
        signed_out: Mutex<Vec<String>>,
    }

    impl CountingProvider {
        fn new(principal: Option<Principal>) -> Arc<Self> {
            Arc::new(Self {
                principal,
                queries: AtomicUsize::new(0),
                signed_out: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl AuthProvider for CountingProvider {
        async fn current_session(&self, _token: Option<&str>) -> Option<Principal> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.principal.clone()
        }

        async fn sign_in(&self, _username: &str, _password: &str) -> Result<SignedSession> {
            Err(DashboardError::authentication("not used"))
        }

        async fn sign_out(&self, token: &str) {
            self.signed_out.lock().unwrap().push(token.to_string());
        }
    }

    fn principal() -> Principal {
        Principal {
            username: "kim".to_string(),
            display_name: "Kim".to_string(),
            role: UserRole::Teacher,
        }
    }

    #[tokio::test]
    async fn test_pending_until_resolved() {
        let provider = CountingProvider::new(Some(principal()));
        let mut gate = SessionGate::mount(provider.clone(), Some("t".to_string()));
        assert_eq!(gate.view(), GateView::Loading);

        gate.resolve().await;
        assert_eq!(gate.view(), GateView::Dashboard(&principal()));
    }

    #[tokio::test]
    async fn test_at_most_one_query_per_mount() {
        let provider = CountingProvider::new(None);
        let mut gate = SessionGate::mount(provider.clone(), None);

        gate.resolve().await;
        gate.resolve().await;
        assert_eq!(gate.view(), GateView::LoginForm);
        assert_eq!(provider.queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_login_skips_query() {
        let provider = CountingProvider::new(None);
        let mut gate = SessionGate::mount(provider.clone(), None);

        gate.on_login(principal(), "fresh".to_string());
        gate.resolve().await;
        assert_eq!(
            gate.state(),
            &SessionState::Authenticated {
                principal: principal()
            }
        );
        assert_eq!(gate.token(), Some("fresh"));
        assert_eq!(provider.queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_logout_signs_out_and_returns_to_login() {
        let provider = CountingProvider::new(Some(principal()));
        let mut gate = SessionGate::mount(provider.clone(), Some("old".to_string()));
        gate.resolve().await;

        gate.logout().await;
        assert_eq!(gate.view(), GateView::LoginForm);
        assert_eq!(gate.token(), None);
        assert_eq!(*provider.signed_out.lock().unwrap(), vec!["old".to_string()]);

        // 注销后不会再次查询
        gate.resolve().await;
        assert_eq!(provider.queries.load(Ordering::SeqCst), 1);
    }
}
