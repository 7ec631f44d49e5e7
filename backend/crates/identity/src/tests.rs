//! Scenario tests for the credential lifecycle
//!
//! Runs the use cases against the in-memory repository and a recording
//! mail transport, covering the end-to-end flows the crate promises:
//! registration, login, rotation with reuse detection, password change,
//! and the one-time-code reset protocol.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::application::config::AuthConfig;
use crate::application::authenticate::AuthenticateUseCase;
use crate::application::change_password::ChangePasswordUseCase;
use crate::application::forgot_password::ForgotPasswordUseCase;
use crate::application::login::LoginUseCase;
use crate::application::logout::LogoutUseCase;
use crate::application::refresh_session::RefreshSessionUseCase;
use crate::application::register::{RegisterInput, RegisterUseCase};
use crate::application::reset_password::ResetPasswordUseCase;
use crate::application::update_account::{UpdateAccountInput, UpdateAccountUseCase};
use crate::domain::entity::identity::Identity;
use crate::domain::mailer::Mailer;
use crate::domain::repository::IdentityRepository;
use crate::domain::value_object::email::Email;
use crate::error::AuthError;
use crate::infra::memory::InMemoryIdentityRepository;

// ============================================================================
// Test fixtures
// ============================================================================

struct SentMail {
    to: String,
    subject: String,
    html_body: String,
}

/// Mail transport that records messages; can be switched to fail
#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn last_mail<T>(&self, f: impl FnOnce(&SentMail) -> T) -> T {
        let sent = self.sent.lock().unwrap();
        f(sent.last().expect("no mail recorded"))
    }
}

impl Mailer for RecordingMailer {
    async fn send(&self, to: &Email, subject: &str, html_body: &str) -> bool {
        if self.failing.load(Ordering::SeqCst) {
            return false;
        }
        self.sent.lock().unwrap().push(SentMail {
            to: to.as_str().to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        });
        true
    }
}

fn test_config() -> Arc<AuthConfig> {
    Arc::new(AuthConfig::with_random_secrets())
}

fn test_repo() -> Arc<InMemoryIdentityRepository> {
    Arc::new(InMemoryIdentityRepository::new())
}

async fn register_alice(repo: &Arc<InMemoryIdentityRepository>) {
    RegisterUseCase::new(repo.clone())
        .execute(RegisterInput {
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            full_name: "Alice Example".to_string(),
            password: "secret123".to_string(),
        })
        .await
        .expect("registration failed");
}

async fn stored_alice(repo: &Arc<InMemoryIdentityRepository>) -> Identity {
    repo.find_by_email(&Email::new("alice@x.com").unwrap())
        .await
        .unwrap()
        .expect("alice not stored")
}

// ============================================================================
// Registration and login
// ============================================================================

mod registration {
    use super::*;

    #[tokio::test]
    async fn register_returns_identity_without_secrets() {
        let repo = test_repo();
        let register = RegisterUseCase::new(repo.clone());

        let public = register
            .execute(RegisterInput {
                username: "Alice".to_string(),
                email: "Alice@X.com".to_string(),
                full_name: "Alice Example".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap();

        // Case-normalized on the way in
        assert_eq!(public.username, "alice");
        assert_eq!(public.email, "alice@x.com");

        let json = serde_json::to_string(&public).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("refresh"));
    }

    #[tokio::test]
    async fn duplicate_username_fails() {
        let repo = test_repo();
        register_alice(&repo).await;

        let result = RegisterUseCase::new(repo.clone())
            .execute(RegisterInput {
                username: "alice".to_string(),
                email: "other@x.com".to_string(),
                full_name: "Other".to_string(),
                password: "password-two".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::AlreadyExists)));
    }

    #[tokio::test]
    async fn duplicate_email_fails() {
        let repo = test_repo();
        register_alice(&repo).await;

        let result = RegisterUseCase::new(repo.clone())
            .execute(RegisterInput {
                username: "bob".to_string(),
                email: "ALICE@x.com".to_string(),
                full_name: "Bob".to_string(),
                password: "password-two".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::AlreadyExists)));
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_hashing() {
        let repo = test_repo();
        let register = RegisterUseCase::new(repo.clone());

        let result = register
            .execute(RegisterInput {
                username: "a".to_string(), // too short
                email: "alice@x.com".to_string(),
                full_name: "Alice".to_string(),
                password: "secret123".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthError::Validation(_))));

        let result = register
            .execute(RegisterInput {
                username: "alice".to_string(),
                email: "not-an-email".to_string(),
                full_name: "Alice".to_string(),
                password: "secret123".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthError::Validation(_))));

        let result = register
            .execute(RegisterInput {
                username: "alice".to_string(),
                email: "alice@x.com".to_string(),
                full_name: "   ".to_string(),
                password: "secret123".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthError::Validation(_))));
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn login_with_username_and_email() {
        let repo = test_repo();
        let config = test_config();
        register_alice(&repo).await;

        let login = LoginUseCase::new(repo.clone(), config.clone());

        let by_username = login.execute("alice", "secret123").await.unwrap();
        assert_eq!(by_username.identity.username, "alice");
        assert!(!by_username.tokens.access_token.is_empty());
        assert!(!by_username.tokens.refresh_token.is_empty());

        let by_email = login.execute("alice@x.com", "secret123").await.unwrap();
        assert_eq!(by_email.identity.username, "alice");
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let repo = test_repo();
        let config = test_config();
        register_alice(&repo).await;

        let login = LoginUseCase::new(repo.clone(), config.clone());
        let result = login.execute("alice", "wrongpw").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn unknown_identifier_is_not_found() {
        let repo = test_repo();
        let config = test_config();
        register_alice(&repo).await;

        let login = LoginUseCase::new(repo.clone(), config.clone());
        assert!(matches!(
            login.execute("mallory", "secret123").await,
            Err(AuthError::IdentityNotFound)
        ));
        assert!(matches!(
            login.execute("mallory@x.com", "secret123").await,
            Err(AuthError::IdentityNotFound)
        ));
    }

    #[tokio::test]
    async fn login_stores_exactly_the_returned_refresh_token() {
        let repo = test_repo();
        let config = test_config();
        register_alice(&repo).await;

        let login = LoginUseCase::new(repo.clone(), config.clone());
        let output = login.execute("alice", "secret123").await.unwrap();

        let stored = stored_alice(&repo).await;
        assert_eq!(
            stored.active_refresh_token.as_deref(),
            Some(output.tokens.refresh_token.as_str())
        );
        assert!(stored.last_login_at.is_some());
    }

    #[tokio::test]
    async fn second_login_invalidates_first_session() {
        let repo = test_repo();
        let config = test_config();
        register_alice(&repo).await;

        let login = LoginUseCase::new(repo.clone(), config.clone());
        let first = login.execute("alice", "secret123").await.unwrap();
        let _second = login.execute("alice", "secret123").await.unwrap();

        // The single-slot design allows one active session only
        let refresh = RefreshSessionUseCase::new(repo.clone(), config.clone());
        let result = refresh.execute(&first.tokens.refresh_token).await;
        assert!(matches!(result, Err(AuthError::RefreshTokenReuseDetected)));
    }
}

// ============================================================================
// Rotation and reuse detection
// ============================================================================

mod rotation {
    use super::*;

    #[tokio::test]
    async fn rotate_returns_a_fresh_pair_and_reuse_is_detected() {
        let repo = test_repo();
        let config = test_config();
        register_alice(&repo).await;

        let login = LoginUseCase::new(repo.clone(), config.clone());
        let output = login.execute("alice", "secret123").await.unwrap();
        let original = output.tokens.refresh_token.clone();

        let refresh = RefreshSessionUseCase::new(repo.clone(), config.clone());

        let rotated = refresh.execute(&original).await.unwrap();
        assert_ne!(rotated.refresh_token, original);

        // The new token is now the stored one
        let stored = stored_alice(&repo).await;
        assert_eq!(
            stored.active_refresh_token.as_deref(),
            Some(rotated.refresh_token.as_str())
        );

        // Replaying the consumed token is a reuse, not a plain failure
        let result = refresh.execute(&original).await;
        assert!(matches!(result, Err(AuthError::RefreshTokenReuseDetected)));

        // The fresh token still rotates fine afterwards
        assert!(refresh.execute(&rotated.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn rotate_rejects_invalid_tokens() {
        let repo = test_repo();
        let config = test_config();
        register_alice(&repo).await;

        let refresh = RefreshSessionUseCase::new(repo.clone(), config.clone());

        assert!(matches!(
            refresh.execute("garbage").await,
            Err(AuthError::InvalidToken)
        ));

        // Signed with different secrets
        let other_config = test_config();
        let other_login = LoginUseCase::new(repo.clone(), other_config.clone());
        let foreign = other_login.execute("alice", "secret123").await.unwrap();
        assert!(matches!(
            refresh.execute(&foreign.tokens.refresh_token).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn rotate_rejects_expired_refresh_token() {
        let repo = test_repo();
        let config = Arc::new(AuthConfig {
            refresh_token_ttl: Duration::ZERO,
            ..AuthConfig::with_random_secrets()
        });
        register_alice(&repo).await;

        let login = LoginUseCase::new(repo.clone(), config.clone());
        let output = login.execute("alice", "secret123").await.unwrap();

        let refresh = RefreshSessionUseCase::new(repo.clone(), config.clone());
        let result = refresh.execute(&output.tokens.refresh_token).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn concurrent_rotations_have_exactly_one_winner() {
        let repo = test_repo();
        let config = test_config();
        register_alice(&repo).await;

        let login = LoginUseCase::new(repo.clone(), config.clone());
        let output = login.execute("alice", "secret123").await.unwrap();
        let token = output.tokens.refresh_token.clone();

        let refresh = Arc::new(RefreshSessionUseCase::new(repo.clone(), config.clone()));

        let a = tokio::spawn({
            let refresh = refresh.clone();
            let token = token.clone();
            async move { refresh.execute(&token).await }
        });
        let b = tokio::spawn({
            let refresh = refresh.clone();
            let token = token.clone();
            async move { refresh.execute(&token).await }
        });

        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1, "exactly one concurrent rotation may succeed");

        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(loser, Err(AuthError::RefreshTokenReuseDetected)));
    }

    #[tokio::test]
    async fn logout_revokes_and_is_idempotent() {
        let repo = test_repo();
        let config = test_config();
        register_alice(&repo).await;

        let login = LoginUseCase::new(repo.clone(), config.clone());
        let output = login.execute("alice", "secret123").await.unwrap();

        let identity = stored_alice(&repo).await;
        let logout = LogoutUseCase::new(repo.clone(), config.clone());
        logout.execute(&identity.identity_id).await.unwrap();
        logout.execute(&identity.identity_id).await.unwrap(); // idempotent

        assert!(stored_alice(&repo).await.active_refresh_token.is_none());

        // The signed-but-revoked token now reads as reuse
        let refresh = RefreshSessionUseCase::new(repo.clone(), config.clone());
        let result = refresh.execute(&output.tokens.refresh_token).await;
        assert!(matches!(result, Err(AuthError::RefreshTokenReuseDetected)));
    }
}

// ============================================================================
// Password change
// ============================================================================

mod password_change {
    use super::*;

    #[tokio::test]
    async fn change_password_rotates_credentials_and_revokes_session() {
        let repo = test_repo();
        let config = test_config();
        register_alice(&repo).await;

        let login = LoginUseCase::new(repo.clone(), config.clone());
        let output = login.execute("alice", "secret123").await.unwrap();

        let identity = stored_alice(&repo).await;
        let change = ChangePasswordUseCase::new(repo.clone(), config.clone());
        change
            .execute(&identity.identity_id, "secret123", "newpw12345")
            .await
            .unwrap();

        // Old password no longer verifies, new one does
        assert!(matches!(
            login.execute("alice", "secret123").await,
            Err(AuthError::InvalidCredentials)
        ));
        login.execute("alice", "newpw12345").await.unwrap();

        // The previously active refresh token is dead
        let refresh = RefreshSessionUseCase::new(repo.clone(), config.clone());
        let result = refresh.execute(&output.tokens.refresh_token).await;
        assert!(matches!(result, Err(AuthError::RefreshTokenReuseDetected)));
    }

    #[tokio::test]
    async fn wrong_old_password_is_rejected() {
        let repo = test_repo();
        let config = test_config();
        register_alice(&repo).await;

        let identity = stored_alice(&repo).await;
        let change = ChangePasswordUseCase::new(repo.clone(), config.clone());

        let result = change
            .execute(&identity.identity_id, "not-the-password", "newpw12345")
            .await;
        assert!(matches!(result, Err(AuthError::InvalidOldPassword)));

        // Nothing changed
        let login = LoginUseCase::new(repo.clone(), config.clone());
        login.execute("alice", "secret123").await.unwrap();
    }
}

// ============================================================================
// Password reset protocol
// ============================================================================

mod password_reset {
    use super::*;

    #[tokio::test]
    async fn forgot_password_stores_code_and_emails_it() {
        let repo = test_repo();
        let config = test_config();
        let mailer = Arc::new(RecordingMailer::default());
        register_alice(&repo).await;

        let forgot = ForgotPasswordUseCase::new(repo.clone(), mailer.clone(), config.clone());
        forgot.execute("alice@x.com").await.unwrap();

        let stored = stored_alice(&repo).await;
        let pending = stored.pending_reset.expect("no pending reset stored");
        assert_eq!(pending.code.as_str().len(), 6);
        assert!(!pending.is_expired());

        assert_eq!(mailer.sent_count(), 1);
        mailer.last_mail(|mail| {
            assert_eq!(mail.to, "alice@x.com");
            assert_eq!(mail.subject, "Reset Password");
            assert!(mail.html_body.contains(pending.code.as_str()));
            assert!(mail.html_body.contains("15 minutes"));
        });
    }

    #[tokio::test]
    async fn forgot_password_unknown_email() {
        let repo = test_repo();
        let config = test_config();
        let mailer = Arc::new(RecordingMailer::default());

        let forgot = ForgotPasswordUseCase::new(repo.clone(), mailer.clone(), config.clone());
        let result = forgot.execute("nobody@x.com").await;
        assert!(matches!(result, Err(AuthError::IdentityNotFound)));
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn delivery_failure_keeps_the_stored_code() {
        let repo = test_repo();
        let config = test_config();
        let mailer = Arc::new(RecordingMailer::default());
        register_alice(&repo).await;

        mailer.set_failing(true);
        let forgot = ForgotPasswordUseCase::new(repo.clone(), mailer.clone(), config.clone());
        let result = forgot.execute("alice@x.com").await;
        assert!(matches!(result, Err(AuthError::DeliveryFailed)));

        // The code survived the failed send and is consumable
        let code = stored_alice(&repo).await.pending_reset.unwrap().code;
        let reset = ResetPasswordUseCase::new(repo.clone());
        reset.execute(code.as_str(), "newpw12345").await.unwrap();
    }

    #[tokio::test]
    async fn reissue_supersedes_previous_code() {
        let repo = test_repo();
        let config = test_config();
        let mailer = Arc::new(RecordingMailer::default());
        register_alice(&repo).await;

        let forgot = ForgotPasswordUseCase::new(repo.clone(), mailer.clone(), config.clone());
        forgot.execute("alice@x.com").await.unwrap();
        let first = stored_alice(&repo).await.pending_reset.unwrap().code;

        forgot.execute("alice@x.com").await.unwrap();
        let second = stored_alice(&repo).await.pending_reset.unwrap().code;

        let reset = ResetPasswordUseCase::new(repo.clone());
        if first != second {
            let result = reset.execute(first.as_str(), "newpw12345").await;
            assert!(matches!(result, Err(AuthError::InvalidOrExpiredCode)));
        }
        reset.execute(second.as_str(), "newpw12345").await.unwrap();
    }

    #[tokio::test]
    async fn wrong_code_is_rejected() {
        let repo = test_repo();
        let config = test_config();
        let mailer = Arc::new(RecordingMailer::default());
        register_alice(&repo).await;

        let forgot = ForgotPasswordUseCase::new(repo.clone(), mailer.clone(), config.clone());
        forgot.execute("alice@x.com").await.unwrap();
        let code = stored_alice(&repo).await.pending_reset.unwrap().code;

        // A different six-digit code
        let wrong = if code.as_str() == "123456" { "654321" } else { "123456" };

        let reset = ResetPasswordUseCase::new(repo.clone());
        assert!(matches!(
            reset.execute(wrong, "newpw12345").await,
            Err(AuthError::InvalidOrExpiredCode)
        ));
        assert!(matches!(
            reset.execute("nonsense", "newpw12345").await,
            Err(AuthError::InvalidOrExpiredCode)
        ));
    }

    #[tokio::test]
    async fn expired_code_is_rejected_and_cleared() {
        let repo = test_repo();
        let config = Arc::new(AuthConfig {
            reset_code_ttl: Duration::ZERO,
            ..AuthConfig::with_random_secrets()
        });
        let mailer = Arc::new(RecordingMailer::default());
        register_alice(&repo).await;

        let forgot = ForgotPasswordUseCase::new(repo.clone(), mailer.clone(), config.clone());
        forgot.execute("alice@x.com").await.unwrap();
        let code = stored_alice(&repo).await.pending_reset.unwrap().code;

        let reset = ResetPasswordUseCase::new(repo.clone());
        let result = reset.execute(code.as_str(), "newpw12345").await;
        assert!(matches!(result, Err(AuthError::InvalidOrExpiredCode)));

        // First failed consumption discarded the pending reset
        assert!(stored_alice(&repo).await.pending_reset.is_none());
    }

    #[tokio::test]
    async fn reset_consumes_code_and_revokes_session() {
        let repo = test_repo();
        let config = test_config();
        let mailer = Arc::new(RecordingMailer::default());
        register_alice(&repo).await;

        let login = LoginUseCase::new(repo.clone(), config.clone());
        let output = login.execute("alice", "secret123").await.unwrap();

        let forgot = ForgotPasswordUseCase::new(repo.clone(), mailer.clone(), config.clone());
        forgot.execute("alice@x.com").await.unwrap();
        let code = stored_alice(&repo).await.pending_reset.unwrap().code;

        let reset = ResetPasswordUseCase::new(repo.clone());
        reset.execute(code.as_str(), "newpw12345").await.unwrap();

        // Old password dead, new password works
        assert!(matches!(
            login.execute("alice", "secret123").await,
            Err(AuthError::InvalidCredentials)
        ));
        login.execute("alice", "newpw12345").await.unwrap();

        // Pending reset cleared, single-use
        assert!(stored_alice(&repo).await.pending_reset.is_none());
        assert!(matches!(
            reset.execute(code.as_str(), "another-pw1").await,
            Err(AuthError::InvalidOrExpiredCode)
        ));

        // Pre-reset session is revoked
        let refresh = RefreshSessionUseCase::new(repo.clone(), config.clone());
        assert!(matches!(
            refresh.execute(&output.tokens.refresh_token).await,
            Err(AuthError::RefreshTokenReuseDetected)
        ));
    }
}

// ============================================================================
// Authenticated requests and account updates
// ============================================================================

mod authenticated {
    use super::*;

    #[tokio::test]
    async fn authenticate_resolves_the_access_token() {
        let repo = test_repo();
        let config = test_config();
        register_alice(&repo).await;

        let login = LoginUseCase::new(repo.clone(), config.clone());
        let output = login.execute("alice", "secret123").await.unwrap();

        let authenticate = AuthenticateUseCase::new(repo.clone(), config.clone());
        let public = authenticate
            .execute(&output.tokens.access_token)
            .await
            .unwrap();
        assert_eq!(public.username, "alice");
        assert_eq!(public.email, "alice@x.com");
    }

    #[tokio::test]
    async fn authenticate_rejects_refresh_tokens_and_garbage() {
        let repo = test_repo();
        let config = test_config();
        register_alice(&repo).await;

        let login = LoginUseCase::new(repo.clone(), config.clone());
        let output = login.execute("alice", "secret123").await.unwrap();

        let authenticate = AuthenticateUseCase::new(repo.clone(), config.clone());
        assert!(matches!(
            authenticate.execute(&output.tokens.refresh_token).await,
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            authenticate.execute("not.a.token").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn authenticate_rejects_expired_access_token() {
        let repo = test_repo();
        let config = Arc::new(AuthConfig {
            access_token_ttl: Duration::ZERO,
            ..AuthConfig::with_random_secrets()
        });
        register_alice(&repo).await;

        let login = LoginUseCase::new(repo.clone(), config.clone());
        let output = login.execute("alice", "secret123").await.unwrap();

        let authenticate = AuthenticateUseCase::new(repo.clone(), config.clone());
        let result = authenticate.execute(&output.tokens.access_token).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn update_account_changes_profile_fields() {
        let repo = test_repo();
        register_alice(&repo).await;
        let identity = stored_alice(&repo).await;

        let update = UpdateAccountUseCase::new(repo.clone());
        let public = update
            .execute(
                &identity.identity_id,
                UpdateAccountInput {
                    full_name: Some("Alice B. Example".to_string()),
                    email: Some("alice.b@x.com".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(public.full_name, "Alice B. Example");
        assert_eq!(public.email, "alice.b@x.com");
    }

    #[tokio::test]
    async fn update_account_rejects_taken_email() {
        let repo = test_repo();
        register_alice(&repo).await;

        RegisterUseCase::new(repo.clone())
            .execute(RegisterInput {
                username: "bob".to_string(),
                email: "bob@x.com".to_string(),
                full_name: "Bob".to_string(),
                password: "bobs-password".to_string(),
            })
            .await
            .unwrap();

        let identity = stored_alice(&repo).await;
        let update = UpdateAccountUseCase::new(repo.clone());
        let result = update
            .execute(
                &identity.identity_id,
                UpdateAccountInput {
                    full_name: None,
                    email: Some("bob@x.com".to_string()),
                },
            )
            .await;
        assert!(matches!(result, Err(AuthError::AlreadyExists)));
    }
}
