//! Session gate: credential verification via AuthPort, role selection, and
//! in-memory login state. Sign-out drops the session; nothing is invalidated
//! server-side.

use crate::domain::{DomainError, Role, Session};
use crate::ports::AuthPort;
use std::sync::Arc;
use tracing::info;

pub struct SessionService {
    auth: Arc<dyn AuthPort>,
    current: Option<Session>,
}

impl SessionService {
    pub fn new(auth: Arc<dyn AuthPort>) -> Self {
        Self {
            auth,
            current: None,
        }
    }

    /// Verify credentials and hold the resulting session. On rejection the
    /// provider's message is returned and the signed-out state is kept.
    pub async fn sign_in(
        &mut self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<&Session, DomainError> {
        let identity = self.auth.sign_in(email, password).await?;
        info!(uid = %identity.uid, role = ?role, "signed in");
        self.current = Some(Session { identity, role });
        Ok(self.current.as_ref().expect("session just set"))
    }

    pub fn sign_out(&mut self) {
        if let Some(session) = self.current.take() {
            info!(uid = %session.identity.uid, "signed out");
        }
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Identity;

    struct FakeAuth {
        reject_with: Option<String>,
    }

    #[async_trait::async_trait]
    impl AuthPort for FakeAuth {
        async fn sign_in(&self, email: &str, _password: &str) -> Result<Identity, DomainError> {
            if let Some(message) = &self.reject_with {
                return Err(DomainError::Auth(message.clone()));
            }
            Ok(Identity {
                uid: "uid_1".to_string(),
                email: email.to_string(),
                token: "tok".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn sign_in_holds_session_with_role() {
        let mut gate = SessionService::new(Arc::new(FakeAuth { reject_with: None }));
        assert!(!gate.is_signed_in());

        gate.sign_in("a@b.com", "pw", Role::Provider).await.unwrap();
        let session = gate.current().unwrap();
        assert_eq!(session.role, Role::Provider);
        assert_eq!(session.identity.email, "a@b.com");
    }

    #[tokio::test]
    async fn rejection_surfaces_provider_message_and_stays_signed_out() {
        let mut gate = SessionService::new(Arc::new(FakeAuth {
            reject_with: Some("INVALID_PASSWORD".to_string()),
        }));

        let err = gate
            .sign_in("a@b.com", "wrong", Role::Patient)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("INVALID_PASSWORD"));
        assert!(!gate.is_signed_in());
    }

    #[tokio::test]
    async fn sign_out_clears_session() {
        let mut gate = SessionService::new(Arc::new(FakeAuth { reject_with: None }));
        gate.sign_in("a@b.com", "pw", Role::Patient).await.unwrap();
        gate.sign_out();
        assert!(gate.current().is_none());
    }
}
