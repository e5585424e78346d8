use std::sync::Arc;

use super::registry::ResetCodeRegistry;
use super::ResetError;
use crate::auth::hash_password;
use crate::email::{password_reset_message, DeliveryResult, EmailDispatcher};
use crate::store::UserStore;

/// What the request step reports back to the HTTP layer.
#[derive(Debug, Clone)]
pub struct ResetRequestOutcome {
    /// The issued code, present only when code disclosure is enabled.
    pub dev_code: Option<String>,
    pub delivery: DeliveryResult,
}

/// Orchestrates the two-step reset: request a code by email, confirm it with a new password.
pub struct PasswordResetService {
    registry: Arc<ResetCodeRegistry>,
    users: Arc<dyn UserStore>,
    mailer: Arc<EmailDispatcher>,
    expose_codes: bool,
}

impl PasswordResetService {
    pub fn new(
        registry: Arc<ResetCodeRegistry>,
        users: Arc<dyn UserStore>,
        mailer: Arc<EmailDispatcher>,
    ) -> Self {
        Self {
            registry,
            users,
            mailer,
            expose_codes: false,
        }
    }

    /// Echo issued codes back to the caller. Development builds only.
    pub fn exposing_codes(mut self, expose: bool) -> Self {
        self.expose_codes = expose;
        self
    }

    /// Issues a code for an existing account and attempts to email it.
    ///
    /// Delivery is best-effort: a failed send is logged and the request still succeeds.
    pub async fn request_reset(&self, email: &str) -> Result<ResetRequestOutcome, ResetError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(ResetError::AccountNotFound)?;

        let code = self.registry.issue(&user.email).await?;
        let message = password_reset_message(
            &user.email,
            &user.name,
            &code,
            self.registry.ttl().num_minutes(),
        );

        let delivery = self.mailer.send(&message).await;
        if !delivery.is_delivered() {
            log::warn!(
                "password reset code for {} was issued but not delivered: {:?}",
                user.email,
                delivery
            );
        }

        Ok(ResetRequestOutcome {
            dev_code: self.expose_codes.then_some(code),
            delivery,
        })
    }

    /// Replaces the account password if `code` is the live code for `email`, then burns the code.
    pub async fn confirm_reset(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), ResetError> {
        if !self.registry.validate(email, code).await? {
            return Err(ResetError::InvalidOrExpiredCode);
        }

        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(ResetError::AccountNotFound)?;

        let password_hash = hash_password(new_password)?;
        self.users
            .update_password_hash(user.id, &password_hash)
            .await?;

        self.registry.consume(&user.email).await?;
        log::info!("password reset completed for {}", user.email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::email::{EmailError, EmailMessage, EmailSender};
    use crate::error::AppError;
    use crate::models::{NewUser, User};
    use uuid::Uuid;
    use crate::reset::clock::ManualClock;
    use crate::reset::store::InMemoryResetCodeStore;
    use crate::store::memory::InMemoryUserStore;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Outbox {
        sent: Mutex<Vec<EmailMessage>>,
    }

    #[async_trait]
    impl EmailSender for Outbox {
        fn name(&self) -> &str {
            "outbox"
        }

        async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    struct Broken;

    #[async_trait]
    impl EmailSender for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn send(&self, _message: &EmailMessage) -> Result<(), EmailError> {
            Err(EmailError::Transport("unreachable".to_string()))
        }
    }

    struct Fixture {
        service: PasswordResetService,
        users: Arc<InMemoryUserStore>,
        store: Arc<InMemoryResetCodeStore>,
        clock: Arc<ManualClock>,
    }

    async fn fixture(mailer: EmailDispatcher) -> Fixture {
        let users = Arc::new(InMemoryUserStore::new());
        users
            .create(NewUser {
                name: "Ada".to_string(),
                email: "a@b.com".to_string(),
                password_hash: hash_password("old-password").unwrap(),
            })
            .await
            .unwrap();
        let store = Arc::new(InMemoryResetCodeStore::new());
        let clock = Arc::new(ManualClock::default());
        let registry = Arc::new(
            ResetCodeRegistry::new(store.clone(), clock.clone(), Duration::minutes(10))
                .with_code_generator(|| "482913".to_string()),
        );
        let service = PasswordResetService::new(registry, users.clone(), Arc::new(mailer));
        Fixture {
            service,
            users,
            store,
            clock,
        }
    }

    #[actix_rt::test]
    async fn test_unknown_account_gets_no_code() {
        let f = fixture(EmailDispatcher::default()).await;

        let err = f.service.request_reset("nouser@x.com").await.unwrap_err();

        assert_eq!(err, ResetError::AccountNotFound);
        assert!(f.store.is_empty().await);
    }

    #[actix_rt::test]
    async fn test_request_emails_code_and_hides_it_by_default() {
        let outbox = Arc::new(Outbox::default());
        let f = fixture(EmailDispatcher::default().with_sender(outbox.clone())).await;

        let outcome = f.service.request_reset("a@b.com").await.unwrap();

        assert!(outcome.dev_code.is_none());
        assert!(outcome.delivery.is_delivered());
        let sent = outbox.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@b.com");
        assert!(sent[0].text.contains("482913"));
    }

    #[actix_rt::test]
    async fn test_delivery_failure_does_not_fail_request() {
        let mut f = fixture(EmailDispatcher::default().with_sender(Arc::new(Broken))).await;
        f.service = f.service.exposing_codes(true);

        let outcome = f.service.request_reset("a@b.com").await.unwrap();

        assert!(matches!(
            outcome.delivery,
            DeliveryResult::AllProvidersFailed { .. }
        ));
        assert_eq!(outcome.dev_code.as_deref(), Some("482913"));
    }

    #[actix_rt::test]
    async fn test_confirm_replaces_password_and_consumes_code() {
        let f = fixture(EmailDispatcher::default()).await;
        f.service.request_reset("a@b.com").await.unwrap();

        f.service
            .confirm_reset("a@b.com", "482913", "new-password")
            .await
            .unwrap();

        let user = f.users.find_by_email("a@b.com").await.unwrap().unwrap();
        assert!(verify_password("new-password", &user.password_hash).unwrap());
        assert!(!verify_password("old-password", &user.password_hash).unwrap());

        let again = f
            .service
            .confirm_reset("a@b.com", "482913", "another-password")
            .await;
        assert_eq!(again, Err(ResetError::InvalidOrExpiredCode));
    }

    #[actix_rt::test]
    async fn test_confirm_after_expiry_fails() {
        let f = fixture(EmailDispatcher::default()).await;
        f.service.request_reset("a@b.com").await.unwrap();
        f.clock.advance(Duration::minutes(10));

        let result = f
            .service
            .confirm_reset("a@b.com", "482913", "new-password")
            .await;
        assert_eq!(result, Err(ResetError::InvalidOrExpiredCode));
    }

    /// Reads from memory but refuses every password write.
    struct ReadOnlyUsers(InMemoryUserStore);

    #[async_trait]
    impl UserStore for ReadOnlyUsers {
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
            self.0.find_by_email(email).await
        }

        async fn create(&self, input: NewUser) -> Result<User, AppError> {
            self.0.create(input).await
        }

        async fn update_password_hash(&self, _id: Uuid, _hash: &str) -> Result<(), AppError> {
            Err(AppError::DatabaseError("read-only replica".into()))
        }
    }

    #[actix_rt::test]
    async fn test_confirm_for_missing_account_is_not_found() {
        let f = fixture(EmailDispatcher::default()).await;
        let registry = f.service.registry.clone();
        registry.issue("ghost@b.com").await.unwrap();

        let result = f
            .service
            .confirm_reset("ghost@b.com", "482913", "new-password")
            .await;

        assert_eq!(result, Err(ResetError::AccountNotFound));
    }

    #[actix_rt::test]
    async fn test_failed_password_write_keeps_code() {
        let inner = InMemoryUserStore::new();
        inner
            .create(NewUser {
                name: "Ada".to_string(),
                email: "a@b.com".to_string(),
                password_hash: hash_password("old-password").unwrap(),
            })
            .await
            .unwrap();
        let store = Arc::new(InMemoryResetCodeStore::new());
        let registry = Arc::new(
            ResetCodeRegistry::new(
                store.clone(),
                Arc::new(ManualClock::default()),
                Duration::minutes(10),
            )
            .with_code_generator(|| "482913".to_string()),
        );
        let service = PasswordResetService::new(
            registry.clone(),
            Arc::new(ReadOnlyUsers(inner)),
            Arc::new(EmailDispatcher::default()),
        );
        service.request_reset("a@b.com").await.unwrap();

        let result = service
            .confirm_reset("a@b.com", "482913", "new-password")
            .await;

        assert!(matches!(result, Err(ResetError::Persistence(_))));
        assert!(registry.validate("a@b.com", "482913").await.unwrap());
    }

    #[actix_rt::test]
    async fn test_account_deleted_during_confirm_is_not_found() {
        struct VanishingUsers(InMemoryUserStore);

        #[async_trait]
        impl UserStore for VanishingUsers {
            async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
                self.0.find_by_email(email).await
            }

            async fn create(&self, input: NewUser) -> Result<User, AppError> {
                self.0.create(input).await
            }

            async fn update_password_hash(&self, _id: Uuid, _hash: &str) -> Result<(), AppError> {
                Err(AppError::NotFound("User not found".into()))
            }
        }

        let inner = InMemoryUserStore::new();
        inner
            .create(NewUser {
                name: "Ada".to_string(),
                email: "a@b.com".to_string(),
                password_hash: hash_password("old-password").unwrap(),
            })
            .await
            .unwrap();
        let registry = Arc::new(
            ResetCodeRegistry::new(
                Arc::new(InMemoryResetCodeStore::new()),
                Arc::new(ManualClock::default()),
                Duration::minutes(10),
            )
            .with_code_generator(|| "482913".to_string()),
        );
        let service = PasswordResetService::new(
            registry,
            Arc::new(VanishingUsers(inner)),
            Arc::new(EmailDispatcher::default()),
        );
        service.request_reset("a@b.com").await.unwrap();

        let result = service
            .confirm_reset("a@b.com", "482913", "new-password")
            .await;
        assert_eq!(result, Err(ResetError::AccountNotFound));
    }
}
