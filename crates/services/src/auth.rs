use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};

use backend::BackendError;
use backend::store::AuthStore;
use study_core::Clock;
use study_core::model::{Credentials, Registration, UserProfile};

use crate::error::AuthError;

/// How long a verified profile stays fresh before `refresh_due` fires again.
const REFRESH_INTERVAL_MINUTES: i64 = 5;

#[derive(Debug, Default)]
struct AuthState {
    user: Option<UserProfile>,
    verified_at: Option<DateTime<Utc>>,
}

/// Tracks the signed-in user and re-verifies the backend session.
///
/// The cookie that actually authenticates requests lives in the backend
/// store; this type only mirrors who the backend currently believes we are,
/// so callers can gate screens without a round trip.
#[derive(Clone)]
pub struct AuthSession {
    auth: Arc<dyn AuthStore>,
    clock: Clock,
    state: Arc<Mutex<AuthState>>,
}

impl AuthSession {
    #[must_use]
    pub fn new(clock: Clock, auth: Arc<dyn AuthStore>) -> Self {
        Self {
            auth,
            clock,
            state: Arc::new(Mutex::new(AuthState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, AuthState> {
        self.state.lock().expect("auth state lock poisoned")
    }

    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.state().user.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state().user.is_some()
    }

    /// True when the cached profile is stale and `refresh` should be called.
    #[must_use]
    pub fn refresh_due(&self) -> bool {
        let now = self.clock.now();
        match self.state().verified_at {
            Some(at) => now - at >= Duration::minutes(REFRESH_INTERVAL_MINUTES),
            None => true,
        }
    }

    /// Signs in and fetches the resulting profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Backend` when the credentials are rejected or the
    /// profile fetch fails.
    pub async fn login(&self, credentials: &Credentials) -> Result<UserProfile, AuthError> {
        self.auth.login(credentials).await?;
        let profile = self.auth.current_user().await?;
        log::info!("signed in as {}", profile.username);

        let mut state = self.state();
        state.user = Some(profile.clone());
        state.verified_at = Some(self.clock.now());
        Ok(profile)
    }

    /// Validates registration input, creates the account, and signs in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Registration` for invalid input and
    /// `AuthError::Backend` for backend failures.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, AuthError> {
        let registration = Registration::new(username, email, password)?;
        self.auth.register(&registration).await?;
        self.login(&Credentials {
            email: registration.email().to_owned(),
            password: password.to_owned(),
        })
        .await
    }

    /// Re-verifies the backend session, syncing the cached profile.
    ///
    /// An expired session (401) clears the cached user and returns
    /// `Ok(None)`; it is a state, not an error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Backend` for transport failures.
    pub async fn refresh(&self) -> Result<Option<UserProfile>, AuthError> {
        match self.auth.current_user().await {
            Ok(profile) => {
                let mut state = self.state();
                state.user = Some(profile.clone());
                state.verified_at = Some(self.clock.now());
                Ok(Some(profile))
            }
            Err(BackendError::Unauthorized) => {
                log::info!("backend session expired, signing out locally");
                *self.state() = AuthState::default();
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Signs out on the backend and clears the cached profile.
    ///
    /// The local state is cleared even when the backend call fails.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Backend` if the backend logout fails.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let result = self.auth.logout().await;
        *self.state() = AuthState::default();
        result?;
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use backend::InMemoryBackend;
    use study_core::time::{fixed_clock, fixed_now};

    fn credentials() -> Credentials {
        Credentials {
            email: "sam@example.com".into(),
            password: "longenough".into(),
        }
    }

    #[tokio::test]
    async fn register_signs_in_and_caches_the_profile() {
        let store = InMemoryBackend::new();
        let session = AuthSession::new(fixed_clock(), Arc::new(store));

        assert!(!session.is_authenticated());
        let profile = session
            .register("sam", "sam@example.com", "longenough")
            .await
            .unwrap();
        assert_eq!(profile.username, "sam");
        assert!(session.is_authenticated());
        assert_eq!(session.user().unwrap().email, "sam@example.com");
    }

    #[tokio::test]
    async fn register_rejects_invalid_input_before_the_backend() {
        let store = InMemoryBackend::new();
        let session = AuthSession::new(fixed_clock(), Arc::new(store));

        let err = session
            .register("sam", "not-an-email", "longenough")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Registration(_)));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn refresh_clears_state_on_expired_session() {
        let store = InMemoryBackend::new();
        let session = AuthSession::new(fixed_clock(), Arc::new(store.clone()));
        session.login(&credentials()).await.unwrap();

        // Kill the backend session behind our back.
        store.logout().await.unwrap();

        assert_eq!(session.refresh().await.unwrap(), None);
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn refresh_due_honors_the_interval() {
        let store = InMemoryBackend::new();

        let session = AuthSession::new(fixed_clock(), Arc::new(store.clone()));
        assert!(session.refresh_due());
        session.login(&credentials()).await.unwrap();
        assert!(!session.refresh_due());

        let later = fixed_now() + Duration::minutes(REFRESH_INTERVAL_MINUTES);
        let session = AuthSession::new(Clock::fixed(later), Arc::new(store));
        session.refresh().await.unwrap();
        assert!(!session.refresh_due());
    }

    #[tokio::test]
    async fn logout_clears_local_state() {
        let store = InMemoryBackend::new();
        let session = AuthSession::new(fixed_clock(), Arc::new(store));
        session.login(&credentials()).await.unwrap();

        session.logout().await.unwrap();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
    }
}
