//! 会话状态：内存中的令牌，只在进程生命周期内有效

/// 登录状态指示器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStatus {
    /// 还没有尝试登录
    #[default]
    Unknown,
    Authenticated,
    Rejected,
}

impl AuthStatus {
    pub fn text(&self) -> &'static str {
        match self {
            AuthStatus::Unknown => "",
            AuthStatus::Authenticated => "✅ Authenticated",
            AuthStatus::Rejected => "❌ Invalid token",
        }
    }
}

/// 由单个控制器持有的会话。
///
/// 空令牌表示未登录；令牌只在服务器接受登录后写入，登录失败时清空。
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: String,
    status: AuthStatus,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }

    /// 当前令牌；未登录时返回 `None`
    pub fn token(&self) -> Option<&str> {
        if self.token.is_empty() {
            None
        } else {
            Some(&self.token)
        }
    }

    pub fn status(&self) -> AuthStatus {
        self.status
    }

    /// 服务器接受了令牌
    pub(crate) fn accept(&mut self, token: String) {
        self.status = if token.is_empty() {
            AuthStatus::Rejected
        } else {
            AuthStatus::Authenticated
        };
        self.token = token;
    }

    /// 登录失败
    pub(crate) fn reject(&mut self) {
        self.token.clear();
        self.status = AuthStatus::Rejected;
    }

    /// 主动退出，回到初始状态
    pub fn logout(&mut self) {
        self.token.clear();
        self.status = AuthStatus::Unknown;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_unauthenticated() {
        let session = Session::new();
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);
        assert_eq!(session.status(), AuthStatus::Unknown);
        assert_eq!(session.status().text(), "");
    }

    #[test]
    fn test_accept_then_reject() {
        let mut session = Session::new();
        session.accept("secret123".to_string());
        assert!(session.is_authenticated());
        assert_eq!(session.token(), Some("secret123"));
        assert_eq!(session.status().text(), "✅ Authenticated");

        session.reject();
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);
        assert_eq!(session.status().text(), "❌ Invalid token");
    }

    #[test]
    fn test_accepting_empty_token_stays_unauthenticated() {
        let mut session = Session::new();
        session.accept(String::new());
        assert!(!session.is_authenticated());
        assert_eq!(session.status(), AuthStatus::Rejected);
    }

    #[test]
    fn test_logout_resets_status() {
        let mut session = Session::new();
        session.accept("t".to_string());
        session.logout();
        assert!(!session.is_authenticated());
        assert_eq!(session.status(), AuthStatus::Unknown);
    }
}
