//! Session store: the signed-in user and their token.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use shelfmark_core::{CurrencyCode, Email, UserProfile, UserType};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::api::{AuthApi, SignUpRequest, UserUpdate};
use crate::error::{ClientError, Result, clear_sentry_user, set_sentry_user};
use crate::storage::{self, Storage, keys};

/// Observable session state.
///
/// `token` is set exactly when `user` is.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: Option<UserProfile>,
    pub token: Option<SecretString>,
    /// `true` until the persisted session has been restored.
    pub loading: bool,
}

impl Session {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            user: None,
            token: None,
            loading: true,
        }
    }
}

/// Profile fields to change. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Where a profile update is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Merge locally only; nothing is sent to the backend.
    VisualOnly,
    /// Send to the backend and adopt the user it returns.
    Remote,
}

/// Owns the authenticated user and token.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    api: Arc<dyn AuthApi>,
    storage: Arc<dyn Storage>,
    state: watch::Sender<Session>,
}

impl SessionStore {
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, storage: Arc<dyn Storage>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                api,
                storage,
                state: watch::Sender::new(Session::default()),
            }),
        }
    }

    /// Watch session changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// Current session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    /// Current user, if signed in.
    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.inner.state.borrow().user.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    /// Currency for prices: the user's preference, else `fallback`.
    #[must_use]
    pub fn currency_or(&self, fallback: &CurrencyCode) -> CurrencyCode {
        self.inner
            .state
            .borrow()
            .user
            .as_ref()
            .and_then(|u| u.preferred_currency.clone())
            .unwrap_or_else(|| fallback.clone())
    }

    /// Load the persisted session. A missing or corrupt session leaves the
    /// store signed out. Returns whether a session was restored.
    #[instrument(skip(self))]
    pub fn restore(&self) -> bool {
        let storage = self.inner.storage.as_ref();
        let user: Option<UserProfile> = storage::load_json(storage, keys::AUTH_USER);
        let token = match storage.get(keys::AUTH_TOKEN) {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read persisted token");
                None
            }
        };

        let restored = match (user, token) {
            (Some(user), Some(token)) => {
                set_sentry_user(user.id.as_ref(), &user.email);
                Some((user, SecretString::from(token)))
            }
            (Some(_), None) | (None, Some(_)) => {
                warn!("Ignoring incomplete persisted session");
                None
            }
            (None, None) => None,
        };

        let found = restored.is_some();
        self.inner.state.send_modify(|session| {
            match restored {
                Some((user, token)) => {
                    session.user = Some(user);
                    session.token = Some(token);
                }
                None => {
                    session.user = None;
                    session.token = None;
                }
            }
            session.loading = false;
        });
        info!(restored = found, "Session restored");
        found
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a malformed email, the backend error if the
    /// request fails, or `InvalidResponse` if the backend answers without a
    /// user or token. State is unchanged on error.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &SecretString) -> Result<UserProfile> {
        let email = Email::parse(email)?;
        let response = self.inner.api.sign_in(&email, password).await?;

        let (Some(user), Some(token)) = (response.user, response.token) else {
            return Err(ClientError::InvalidResponse(
                "sign-in response is missing the user or token".to_string(),
            )
            .report());
        };

        let storage = self.inner.storage.as_ref();
        storage::save_json(storage, keys::AUTH_USER, &user);
        storage::save_raw(storage, keys::AUTH_TOKEN, &token);
        set_sentry_user(user.id.as_ref(), &user.email);

        self.inner.state.send_replace(Session {
            user: Some(user.clone()),
            token: Some(SecretString::from(token)),
            loading: false,
        });
        info!("Signed in");
        Ok(user)
    }

    /// Register an account, then sign in with the same credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is malformed, registration fails, or the
    /// follow-up sign-in fails.
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
        currency: CurrencyCode,
        user_type: UserType,
    ) -> Result<UserProfile> {
        let parsed = Email::parse(email)?;
        if name.trim().is_empty() {
            return Err(ClientError::InvalidInput("Name cannot be empty".to_string()));
        }

        let request = SignUpRequest {
            name: name.trim().to_lowercase(),
            email: parsed,
            password: password.clone(),
            user_type,
            preferred_currency: currency,
        };
        self.inner.api.sign_up(&request).await?;
        info!("Registered account");

        self.sign_in(request.email.as_str(), password).await
    }

    /// Clear the session locally and in storage. Never fails; storage errors
    /// are logged.
    #[instrument(skip(self))]
    pub fn sign_out(&self) {
        let storage = self.inner.storage.as_ref();
        storage::remove_logged(storage, keys::AUTH_USER);
        storage::remove_logged(storage, keys::AUTH_TOKEN);
        clear_sentry_user();

        self.inner.state.send_replace(Session {
            user: None,
            token: None,
            loading: false,
        });
        info!("Signed out");
    }

    /// Change the user's name and/or email.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` without a user, `InvalidInput` for a
    /// malformed email, and in `Remote` mode the backend error or
    /// `InvalidResponse` when no user comes back.
    #[instrument(skip(self, update))]
    pub async fn update_profile(
        &self,
        update: ProfileUpdate,
        mode: UpdateMode,
    ) -> Result<UserProfile> {
        let current = self.user().ok_or(ClientError::Unauthenticated)?;
        let email = update.email.as_deref().map(Email::parse).transpose()?;
        let name = update
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let user = match mode {
            UpdateMode::VisualOnly => {
                let mut user = current;
                if let Some(name) = name {
                    user.name = name;
                }
                if let Some(email) = email {
                    user.email = email.into_inner();
                }
                user
            }
            UpdateMode::Remote => {
                let response = self
                    .inner
                    .api
                    .update_user(&UserUpdate {
                        name,
                        email,
                        preferred_currency: None,
                    })
                    .await?;
                response.user.ok_or_else(|| {
                    ClientError::InvalidResponse(
                        "profile update response is missing the user".to_string(),
                    )
                    .report()
                })?
            }
        };

        storage::save_json(self.inner.storage.as_ref(), keys::AUTH_USER, &user);
        self.inner.state.send_modify(|session| {
            session.user = Some(user.clone());
        });
        Ok(user)
    }

    /// Change the preferred currency. No request is made when it is already
    /// the user's currency.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` without a user, or the backend error.
    #[instrument(skip(self), fields(currency = %currency))]
    pub async fn update_preferred_currency(&self, currency: CurrencyCode) -> Result<()> {
        let current = self.user().ok_or(ClientError::Unauthenticated)?;
        if current.preferred_currency.as_ref() == Some(&currency) {
            return Ok(());
        }

        self.inner
            .api
            .update_user(&UserUpdate {
                preferred_currency: Some(currency.clone()),
                ..UserUpdate::default()
            })
            .await?;

        let mut patched = None;
        self.inner.state.send_modify(|session| {
            if let Some(user) = session.user.as_mut() {
                user.preferred_currency = Some(currency);
                patched = Some(user.clone());
            }
        });
        if let Some(user) = patched {
            storage::save_json(self.inner.storage.as_ref(), keys::AUTH_USER, &user);
        }
        Ok(())
    }

    /// Whether a non-empty token is held.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.inner
            .state
            .borrow()
            .token
            .as_ref()
            .is_some_and(|t| !t.expose_secret().is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::storage::MemoryStorage;
    use crate::testing::{FailingStorage, FakeBackend, Op};

    fn store(backend: &Arc<FakeBackend>) -> (SessionStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (SessionStore::new(backend.clone(), storage.clone()), storage)
    }

    fn password(p: &str) -> SecretString {
        SecretString::from(p.to_string())
    }

    #[tokio::test]
    async fn test_sign_in_persists_session() {
        let backend = Arc::new(FakeBackend::new());
        backend.register_user("Ana", "ana@example.com", "pw");
        let (session, storage) = store(&backend);

        let user = session
            .sign_in("  ANA@Example.com ", &password("pw"))
            .await
            .unwrap();
        assert_eq!(user.email, "ana@example.com");
        assert!(session.is_authenticated());
        assert!(storage.get(keys::AUTH_TOKEN).unwrap().is_some());
        assert!(storage.get(keys::AUTH_USER).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sign_in_rejects_invalid_email_without_request() {
        let backend = Arc::new(FakeBackend::new());
        let (session, _) = store(&backend);

        let err = session.sign_in("not-an-email", &password("pw")).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
        assert_eq!(backend.calls(Op::SignIn), 0);
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_in_failure_leaves_state_unchanged() {
        let backend = Arc::new(FakeBackend::new());
        backend.register_user("Ana", "ana@example.com", "pw");
        let (session, storage) = store(&backend);

        let err = session
            .sign_in("ana@example.com", &password("wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Api(ApiError::Unauthorized(401))));
        assert!(!session.is_authenticated());
        assert!(storage.get(keys::AUTH_TOKEN).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_without_token_is_invalid_response() {
        let backend = Arc::new(FakeBackend::new());
        backend.register_user("Ana", "ana@example.com", "pw");
        backend.omit_token_on_sign_in(true);
        let (session, _) = store(&backend);

        let err = session
            .sign_in("ana@example.com", &password("pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
        assert!(session.user().is_none());
    }

    #[tokio::test]
    async fn test_sign_up_then_signs_in() {
        let backend = Arc::new(FakeBackend::new());
        let (session, _) = store(&backend);

        let user = session
            .sign_up(
                "Ana Souza",
                "Ana@Example.com",
                &password("pw"),
                CurrencyCode::parse("USD").unwrap(),
                UserType::READER,
            )
            .await
            .unwrap();

        assert_eq!(user.name, "ana souza");
        assert_eq!(user.currency().as_str(), "USD");
        assert_eq!(backend.calls(Op::SignUp), 1);
        assert_eq!(backend.calls(Op::SignIn), 1);
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_restore_requires_both_halves() {
        let backend = Arc::new(FakeBackend::new());
        let (session, storage) = store(&backend);
        storage.set(keys::AUTH_TOKEN, "tok").unwrap();

        assert!(!session.restore());
        assert!(!session.is_authenticated());
        assert!(!session.snapshot().loading);
    }

    #[tokio::test]
    async fn test_restore_round_trip() {
        let backend = Arc::new(FakeBackend::new());
        backend.register_user("Ana", "ana@example.com", "pw");
        let storage = Arc::new(MemoryStorage::new());

        let first = SessionStore::new(backend.clone(), storage.clone());
        first.sign_in("ana@example.com", &password("pw")).await.unwrap();

        let second = SessionStore::new(backend.clone(), storage);
        assert!(second.snapshot().loading);
        assert!(second.restore());
        assert_eq!(second.user().unwrap().email, "ana@example.com");
        assert!(second.has_token());
    }

    #[tokio::test]
    async fn test_restore_with_corrupt_user_stays_signed_out() {
        let backend = Arc::new(FakeBackend::new());
        let (session, storage) = store(&backend);
        storage.set(keys::AUTH_USER, "{broken").unwrap();
        storage.set(keys::AUTH_TOKEN, "tok").unwrap();

        assert!(!session.restore());
        assert!(session.user().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_survives_storage_failure() {
        let backend = Arc::new(FakeBackend::new());
        backend.register_user("Ana", "ana@example.com", "pw");
        let session = SessionStore::new(backend.clone(), Arc::new(FailingStorage));

        session.sign_in("ana@example.com", &password("pw")).await.unwrap();
        assert!(session.is_authenticated());

        session.sign_out();
        assert!(!session.is_authenticated());
        assert!(session.snapshot().token.is_none());
    }

    #[tokio::test]
    async fn test_update_profile_modes() {
        let backend = Arc::new(FakeBackend::new());
        backend.register_user("Ana", "ana@example.com", "pw");
        let (session, _) = store(&backend);
        session.sign_in("ana@example.com", &password("pw")).await.unwrap();

        let visual = session
            .update_profile(
                ProfileUpdate {
                    name: Some("Aninha".to_string()),
                    email: None,
                },
                UpdateMode::VisualOnly,
            )
            .await
            .unwrap();
        assert_eq!(visual.name, "Aninha");
        assert_eq!(backend.calls(Op::UpdateUser), 0);
        assert_eq!(backend.user("ana@example.com").unwrap().name, "Ana");

        let remote = session
            .update_profile(
                ProfileUpdate {
                    name: Some("Ana Maria".to_string()),
                    email: None,
                },
                UpdateMode::Remote,
            )
            .await
            .unwrap();
        assert_eq!(remote.name, "Ana Maria");
        assert_eq!(backend.calls(Op::UpdateUser), 1);
        assert_eq!(session.user().unwrap().name, "Ana Maria");
    }

    #[tokio::test]
    async fn test_update_requires_authentication() {
        let backend = Arc::new(FakeBackend::new());
        let (session, _) = store(&backend);

        let err = session
            .update_preferred_currency(CurrencyCode::parse("USD").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Unauthenticated));

        let err = session
            .update_profile(ProfileUpdate::default(), UpdateMode::VisualOnly)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_update_currency_patches_only_currency() {
        let backend = Arc::new(FakeBackend::new());
        backend.register_user("Ana", "ana@example.com", "pw");
        let (session, _) = store(&backend);
        session.sign_in("ana@example.com", &password("pw")).await.unwrap();

        // Already BRL: no request
        session
            .update_preferred_currency(CurrencyCode::fallback())
            .await
            .unwrap();
        assert_eq!(backend.calls(Op::UpdateUser), 0);

        session
            .update_preferred_currency(CurrencyCode::parse("EUR").unwrap())
            .await
            .unwrap();
        let user = session.user().unwrap();
        assert_eq!(user.currency().as_str(), "EUR");
        assert_eq!(user.name, "Ana");
        assert_eq!(
            session.currency_or(&CurrencyCode::fallback()).as_str(),
            "EUR"
        );
    }

    #[tokio::test]
    async fn test_update_currency_failure_keeps_old_value() {
        let backend = Arc::new(FakeBackend::new());
        backend.register_user("Ana", "ana@example.com", "pw");
        let (session, _) = store(&backend);
        session.sign_in("ana@example.com", &password("pw")).await.unwrap();
        backend.fail_once(Op::UpdateUser);

        assert!(
            session
                .update_preferred_currency(CurrencyCode::parse("USD").unwrap())
                .await
                .is_err()
        );
        assert_eq!(session.user().unwrap().currency().as_str(), "BRL");
    }
}
