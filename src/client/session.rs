use std::sync::{PoisonError, RwLock};

/// Credentials for the calculation service. Created on login, dropped on
/// logout or when the service rejects the token.
#[derive(Debug, Default)]
pub struct Session {
    token: RwLock<Option<String>>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::default();
        session.login(token);
        session
    }

    pub fn login(&self, token: impl Into<String>) {
        let token = token.into();
        let token = token.trim();
        let mut slot = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *slot = (!token.is_empty()).then(|| token.to_string());
    }

    pub fn logout(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Called when the service answers 401.
    pub fn invalidate(&self) {
        if self.is_authenticated() {
            tracing::warn!("calculation service rejected credentials; session invalidated");
        }
        self.logout();
    }

    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn bearer(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|token| format!("Bearer {token}"))
    }
}
