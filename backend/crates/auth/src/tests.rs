//! Use case and HTTP tests for the auth crate
//!
//! Routers run against an in-memory repository and a capturing mailer.

#[cfg(test)]
mod support {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use chrono::{DateTime, Utc};
    use kernel::id::UserId;
    use platform::mail::{MailError, Mailer, OutgoingMail};
    use serde_json::Value;
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    use crate::domain::entity::user::User;
    use crate::domain::repository::UserRepository;
    use crate::domain::value_object::{
        email::Email,
        user_name::UserName,
        user_password::{RawPassword, UserPassword},
    };
    use crate::error::{AuthError, AuthResult};

    #[derive(Clone, Default)]
    pub struct InMemoryUserRepository {
        users: Arc<RwLock<HashMap<UserId, User>>>,
        /// Hash committed right after the next user-name lookup returns
        reset_after_lookup: Arc<Mutex<Option<UserPassword>>>,
    }

    impl InMemoryUserRepository {
        pub async fn insert(&self, user: User) {
            self.users.write().await.insert(user.user_id, user);
        }

        pub async fn get(&self, user_id: &UserId) -> Option<User> {
            self.users.read().await.get(user_id).cloned()
        }

        pub async fn modify(&self, user_id: &UserId, f: impl FnOnce(&mut User)) {
            if let Some(user) = self.users.write().await.get_mut(user_id) {
                f(user);
            }
        }

        /// Simulate a password reset landing while a login is verifying
        pub fn reset_password_after_next_lookup(&self, password: UserPassword) {
            *self.reset_after_lookup.lock().unwrap() = Some(password);
        }
    }

    impl UserRepository for InMemoryUserRepository {
        async fn create(&self, user: &User) -> AuthResult<()> {
            let mut users = self.users.write().await;
            let clash = users.values().any(|u| {
                u.user_name.canonical() == user.user_name.canonical() || u.email == user.email
            });
            if clash {
                return Err(AuthError::AccountConflict);
            }
            users.insert(user.user_id, user.clone());
            Ok(())
        }

        async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
            Ok(self.users.read().await.get(user_id).cloned())
        }

        async fn find_by_user_name(&self, user_name: &UserName) -> AuthResult<Option<User>> {
            let found = self
                .users
                .read()
                .await
                .values()
                .find(|u| u.user_name.canonical() == user_name.canonical())
                .cloned();

            let pending = self.reset_after_lookup.lock().unwrap().take();
            if let (Some(user), Some(password)) = (&found, pending) {
                self.set_password(&user.user_id, &password, Utc::now()).await?;
            }

            Ok(found)
        }

        async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
            Ok(self
                .users
                .read()
                .await
                .values()
                .find(|u| &u.email == email)
                .cloned())
        }

        async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool> {
            Ok(self.find_by_user_name(user_name).await?.is_some())
        }

        async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
            Ok(self.find_by_email(email).await?.is_some())
        }

        async fn record_login(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<()> {
            self.modify(user_id, |u| {
                u.last_login_at = Some(at);
                u.updated_at = at;
            })
            .await;
            Ok(())
        }

        async fn set_password(
            &self,
            user_id: &UserId,
            password: &UserPassword,
            at: DateTime<Utc>,
        ) -> AuthResult<()> {
            self.modify(user_id, |u| {
                u.password = password.clone();
                u.updated_at = at;
            })
            .await;
            Ok(())
        }

        async fn update_profile(&self, user: &User) -> AuthResult<()> {
            let mut users = self.users.write().await;
            let clash = users.values().any(|u| {
                u.user_id != user.user_id
                    && (u.user_name.canonical() == user.user_name.canonical()
                        || u.email == user.email)
            });
            if clash {
                return Err(AuthError::AccountConflict);
            }
            if let Some(stored) = users.get_mut(&user.user_id) {
                stored.user_name = user.user_name.clone();
                stored.email = user.email.clone();
                stored.updated_at = user.updated_at;
            }
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    pub struct CapturingMailer {
        sent: Arc<Mutex<Vec<OutgoingMail>>>,
    }

    impl CapturingMailer {
        pub fn sent(&self) -> Vec<OutgoingMail> {
            self.sent.lock().unwrap().clone()
        }

        /// `(uid, token)` from the last mailed reset link
        pub fn last_reset_link(&self) -> (String, String) {
            let mail = self.sent().pop().expect("no mail sent");
            let link = mail
                .body
                .split_whitespace()
                .find(|w| w.starts_with("http"))
                .expect("no link in mail")
                .to_string();
            let mut parts = link.rsplit('/');
            let token = parts.next().unwrap().to_string();
            let uid = parts.next().unwrap().to_string();
            (uid, token)
        }
    }

    impl Mailer for CapturingMailer {
        async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
            self.sent.lock().unwrap().push(mail);
            Ok(())
        }
    }

    pub fn make_user(name: &str, password: &str, is_staff: bool) -> User {
        let raw = RawPassword::new(password.to_string()).unwrap();
        let mut user = User::new(
            UserName::new(name).unwrap(),
            Email::new(format!("{}@example.com", name.to_lowercase())).unwrap(),
            UserPassword::from_raw(&raw, None).unwrap(),
        );
        user.is_staff = is_staff;
        user
    }

    pub async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }
}

#[cfg(test)]
mod register_tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::support::*;
    use crate::application::config::AuthConfig;
    use crate::presentation::router::auth_router_generic;

    fn app(repo: InMemoryUserRepository) -> axum::Router {
        auth_router_generic(repo, CapturingMailer::default(), AuthConfig::development())
    }

    #[tokio::test]
    async fn test_register_creates_user() {
        let repo = InMemoryUserRepository::default();
        let app = app(repo.clone());

        let (status, body) = send(
            &app,
            Method::POST,
            "/register",
            Some(json!({
                "username": "Alice",
                "email": "Alice@Example.com",
                "password": "Tolkien#Reader7"
            })),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["username"], "Alice");
        assert_eq!(body["email"], "alice@example.com");
        assert_eq!(body["is_staff"], false);
        assert!(body.get("password").is_none());

        let id = body["id"].as_str().unwrap().parse().unwrap();
        assert!(repo.get(&id).await.is_some());
    }

    #[tokio::test]
    async fn test_register_reports_every_missing_field() {
        let app = app(InMemoryUserRepository::default());

        let (status, body) = send(&app, Method::POST, "/register", Some(json!({})), None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        for field in ["username", "email", "password"] {
            assert_eq!(
                body["errors"][field][0], "This field is required.",
                "missing error for {field}"
            );
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_is_case_insensitive() {
        let repo = InMemoryUserRepository::default();
        repo.insert(make_user("alice", "Tolkien#Reader7", false)).await;
        let app = app(repo);

        let (status, body) = send(
            &app,
            Method::POST,
            "/register",
            Some(json!({
                "username": "ALICE",
                "email": "alice@example.com",
                "password": "Another#Shelf42"
            })),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["errors"]["username"][0],
            "A user with that username already exists."
        );
        assert_eq!(
            body["errors"]["email"][0],
            "A user with that email already exists."
        );
    }

    #[tokio::test]
    async fn test_register_rejects_weak_and_similar_passwords() {
        let app = app(InMemoryUserRepository::default());

        for password in ["short", "12345678", "password123", "bob-the-bookworm"] {
            let (status, body) = send(
                &app,
                Method::POST,
                "/register",
                Some(json!({
                    "username": "bob",
                    "email": "bob@example.com",
                    "password": password
                })),
                None,
            )
            .await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "{password}");
            assert!(body["errors"]["password"].is_array(), "{password}");
            assert!(body["errors"].get("username").is_none());
        }
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_username_and_email() {
        let app = app(InMemoryUserRepository::default());

        let (status, body) = send(
            &app,
            Method::POST,
            "/register",
            Some(json!({
                "username": "no spaces",
                "email": "not-an-email",
                "password": "Tolkien#Reader7"
            })),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"]["username"][0]
            .as_str()
            .unwrap()
            .starts_with("Enter a valid username"));
        assert_eq!(body["errors"]["email"][0], "Enter a valid email address.");
    }
}

#[cfg(test)]
mod login_tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::support::*;
    use crate::application::config::AuthConfig;
    use crate::presentation::router::auth_router_generic;

    async fn app_with_alice() -> (axum::Router, InMemoryUserRepository) {
        let repo = InMemoryUserRepository::default();
        repo.insert(make_user("Alice", "Tolkien#Reader7", false)).await;
        let app = auth_router_generic(
            repo.clone(),
            CapturingMailer::default(),
            AuthConfig::development(),
        );
        (app, repo)
    }

    #[tokio::test]
    async fn test_login_with_username() {
        let (app, _) = app_with_alice().await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/login",
            Some(json!({"username": "alice", "password": "Tolkien#Reader7"})),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["access"].as_str().is_some_and(|t| !t.is_empty()));
        assert!(body["refresh"].as_str().is_some_and(|t| !t.is_empty()));
        assert_eq!(body["user"]["username"], "Alice");
        assert_eq!(body["user"]["email"], "alice@example.com");
    }

    #[tokio::test]
    async fn test_login_with_email_in_either_field() {
        let (app, _) = app_with_alice().await;

        for body in [
            json!({"username": "alice@example.com", "password": "Tolkien#Reader7"}),
            json!({"email": "ALICE@example.com", "password": "Tolkien#Reader7"}),
        ] {
            let (status, body) = send(&app, Method::POST, "/login", Some(body), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["user"]["username"], "Alice");
        }
    }

    #[tokio::test]
    async fn test_login_records_last_login() {
        let (app, repo) = app_with_alice().await;

        let (_, body) = send(
            &app,
            Method::POST,
            "/login",
            Some(json!({"username": "alice", "password": "Tolkien#Reader7"})),
            None,
        )
        .await;

        let id = body["user"]["id"].as_str().unwrap().parse().unwrap();
        assert!(repo.get(&id).await.unwrap().last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_unauthorized() {
        let (app, _) = app_with_alice().await;

        for body in [
            json!({"username": "alice", "password": "wrong"}),
            json!({"email": "alice@example.com", "password": "Wrong#Password1"}),
            json!({"username": "nobody", "password": "Tolkien#Reader7"}),
        ] {
            let (status, body) = send(&app, Method::POST, "/login", Some(body), None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["detail"], "Invalid credentials");
            assert!(body.get("errors").is_none());
        }
    }

    #[tokio::test]
    async fn test_login_missing_fields() {
        let (app, _) = app_with_alice().await;

        for body in [
            json!({"username": "alice"}),
            json!({"password": "Tolkien#Reader7"}),
            json!({}),
        ] {
            let (status, _) = send(&app, Method::POST, "/login", Some(body), None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_login() {
        let repo = InMemoryUserRepository::default();
        let mut user = make_user("carol", "Tolkien#Reader7", false);
        user.is_active = false;
        repo.insert(user).await;
        let app = auth_router_generic(repo, CapturingMailer::default(), AuthConfig::development());

        let (status, _) = send(
            &app,
            Method::POST,
            "/login",
            Some(json!({"username": "carol", "password": "Tolkien#Reader7"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[cfg(test)]
mod token_tests {
    use axum::Router;
    use axum::http::{Method, StatusCode};
    use axum::middleware;
    use axum::routing::get;
    use serde_json::{Value, json};

    use super::support::*;
    use crate::application::config::AuthConfig;
    use crate::presentation::middleware::{AccessGuard, require_access_token, require_staff};
    use crate::presentation::router::auth_router_generic;

    async fn login(app: &Router, name: &str) -> Value {
        let (status, body) = send(
            app,
            Method::POST,
            "/login",
            Some(json!({"username": name, "password": "Tolkien#Reader7"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    #[tokio::test]
    async fn test_current_user_requires_access_token() {
        let repo = InMemoryUserRepository::default();
        repo.insert(make_user("alice", "Tolkien#Reader7", false)).await;
        let app = auth_router_generic(repo, CapturingMailer::default(), AuthConfig::development());
        let tokens = login(&app, "alice").await;

        let (status, body) = send(
            &app,
            Method::GET,
            "/user",
            None,
            tokens["access"].as_str(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");
        assert!(body["last_login"].is_string());

        let (status, _) = send(&app, Method::GET, "/user", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, Method::GET, "/user", None, tokens["refresh"].as_str()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, Method::GET, "/user", None, Some("garbage")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_issues_new_access_token() {
        let repo = InMemoryUserRepository::default();
        repo.insert(make_user("alice", "Tolkien#Reader7", false)).await;
        let app = auth_router_generic(repo, CapturingMailer::default(), AuthConfig::development());
        let tokens = login(&app, "alice").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/token/refresh",
            Some(json!({"refresh": tokens["refresh"]})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::GET, "/user", None, body["access"].as_str()).await;
        assert_eq!(status, StatusCode::OK);

        // Access tokens cannot be used to refresh
        let (status, _) = send(
            &app,
            Method::POST,
            "/token/refresh",
            Some(json!({"refresh": tokens["access"]})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(&app, Method::POST, "/token/refresh", Some(json!({})), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"]["refresh"][0], "This field is required.");
    }

    fn admin_app(config: &AuthConfig, repo: InMemoryUserRepository) -> Router {
        Router::new()
            .route("/admin", get(|| async { "ok" }))
            .route_layer(middleware::from_fn(require_staff))
            .route_layer(middleware::from_fn_with_state(
                AccessGuard::new(config, repo),
                require_access_token::<InMemoryUserRepository>,
            ))
    }

    #[tokio::test]
    async fn test_staff_guard() {
        let config = AuthConfig::development();
        let repo = InMemoryUserRepository::default();
        repo.insert(make_user("reader", "Tolkien#Reader7", false)).await;
        repo.insert(make_user("curator", "Tolkien#Reader7", true)).await;
        let auth = auth_router_generic(repo.clone(), CapturingMailer::default(), config.clone());
        let admin = admin_app(&config, repo);

        let reader = login(&auth, "reader").await;
        let curator = login(&auth, "curator").await;

        let (status, _) = send(&admin, Method::GET, "/admin", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&admin, Method::GET, "/admin", None, reader["access"].as_str()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) =
            send(&admin, Method::GET, "/admin", None, curator["access"].as_str()).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_demoted_staff_loses_admin_with_live_token() {
        let config = AuthConfig::development();
        let repo = InMemoryUserRepository::default();
        let curator = make_user("curator", "Tolkien#Reader7", true);
        let curator_id = curator.user_id;
        repo.insert(curator).await;
        let auth = auth_router_generic(repo.clone(), CapturingMailer::default(), config.clone());
        let admin = admin_app(&config, repo.clone());

        let tokens = login(&auth, "curator").await;
        let access = tokens["access"].as_str();

        repo.modify(&curator_id, |u| u.is_staff = false).await;
        let (status, _) = send(&admin, Method::GET, "/admin", None, access).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        repo.modify(&curator_id, |u| u.is_active = false).await;
        let (status, _) = send(&admin, Method::GET, "/admin", None, access).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_promotion_applies_to_live_token() {
        let config = AuthConfig::development();
        let repo = InMemoryUserRepository::default();
        let reader = make_user("reader", "Tolkien#Reader7", false);
        let reader_id = reader.user_id;
        repo.insert(reader).await;
        let auth = auth_router_generic(repo.clone(), CapturingMailer::default(), config.clone());
        let admin = admin_app(&config, repo.clone());

        let tokens = login(&auth, "reader").await;
        repo.modify(&reader_id, |u| u.is_staff = true).await;

        let (status, _) = send(&admin, Method::GET, "/admin", None, tokens["access"].as_str()).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_deactivated_user_token_is_rejected() {
        let repo = InMemoryUserRepository::default();
        let alice = make_user("alice", "Tolkien#Reader7", false);
        let alice_id = alice.user_id;
        repo.insert(alice).await;
        let app = auth_router_generic(repo.clone(), CapturingMailer::default(), AuthConfig::development());
        let tokens = login(&app, "alice").await;

        repo.modify(&alice_id, |u| u.is_active = false).await;

        let (status, _) = send(&app, Method::GET, "/user", None, tokens["access"].as_str()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[cfg(test)]
mod password_reset_tests {
    use axum::Router;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::support::*;
    use crate::application::config::AuthConfig;
    use crate::domain::value_object::user_password::{RawPassword, UserPassword};
    use crate::presentation::router::auth_router_generic;

    async fn setup() -> (Router, CapturingMailer) {
        let repo = InMemoryUserRepository::default();
        repo.insert(make_user("alice", "Tolkien#Reader7", false)).await;
        repo.insert(make_user("bob", "Tolkien#Reader7", false)).await;
        let mailer = CapturingMailer::default();
        let app = auth_router_generic(repo, mailer.clone(), AuthConfig::development());
        (app, mailer)
    }

    async fn request_reset(app: &Router, email: &str) -> StatusCode {
        send(
            app,
            Method::POST,
            "/password-reset",
            Some(json!({"email": email})),
            None,
        )
        .await
        .0
    }

    async fn confirm(app: &Router, uid: &str, token: &str, password: &str) -> StatusCode {
        send(
            app,
            Method::POST,
            &format!("/password-reset/confirm/{uid}/{token}"),
            Some(json!({"password": password})),
            None,
        )
        .await
        .0
    }

    #[tokio::test]
    async fn test_reset_flow() {
        let (app, mailer) = setup().await;

        assert_eq!(request_reset(&app, "alice@example.com").await, StatusCode::OK);
        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "alice@example.com");

        let (uid, token) = mailer.last_reset_link();
        assert_eq!(confirm(&app, &uid, &token, "Brand#New#Shelf9").await, StatusCode::OK);

        let (status, _) = send(
            &app,
            Method::POST,
            "/login",
            Some(json!({"username": "alice", "password": "Brand#New#Shelf9"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Link is single-use
        assert_eq!(
            confirm(&app, &uid, &token, "Another#Shelf42").await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_reset_request_errors() {
        let (app, mailer) = setup().await;

        assert_eq!(request_reset(&app, "ghost@example.com").await, StatusCode::NOT_FOUND);

        let (status, body) =
            send(&app, Method::POST, "/password-reset", Some(json!({})), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"]["email"][0], "This field is required.");

        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_token_for_other_user_fails() {
        let (app, mailer) = setup().await;

        request_reset(&app, "alice@example.com").await;
        let (alice_uid, _) = mailer.last_reset_link();
        request_reset(&app, "bob@example.com").await;
        let (_, bob_token) = mailer.last_reset_link();

        assert_eq!(
            confirm(&app, &alice_uid, &bob_token, "Brand#New#Shelf9").await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_login_invalidates_link() {
        let (app, mailer) = setup().await;

        request_reset(&app, "alice@example.com").await;
        let (uid, token) = mailer.last_reset_link();

        send(
            &app,
            Method::POST,
            "/login",
            Some(json!({"username": "alice", "password": "Tolkien#Reader7"})),
            None,
        )
        .await;

        assert_eq!(
            confirm(&app, &uid, &token, "Brand#New#Shelf9").await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_malformed_links_share_one_error() {
        let (app, _) = setup().await;

        for (uid, token) in [("!!!", "abc-123"), ("bm90LWEtdXVpZA", "abc-123")] {
            let (status, body) = send(
                &app,
                Method::POST,
                &format!("/password-reset/confirm/{uid}/{token}"),
                Some(json!({"password": "Brand#New#Shelf9"})),
                None,
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["detail"], "Invalid or expired token");
        }
    }

    #[tokio::test]
    async fn test_login_does_not_undo_concurrent_reset() {
        let repo = InMemoryUserRepository::default();
        let alice = make_user("alice", "Tolkien#Reader7", false);
        let alice_id = alice.user_id;
        repo.insert(alice).await;
        let app = auth_router_generic(repo.clone(), CapturingMailer::default(), AuthConfig::development());

        let fresh = RawPassword::new("Brand#New#Shelf9".to_string()).unwrap();
        repo.reset_password_after_next_lookup(UserPassword::from_raw(&fresh, None).unwrap());

        // Login verified against the row it read before the reset landed
        let (status, _) = send(
            &app,
            Method::POST,
            "/login",
            Some(json!({"username": "alice", "password": "Tolkien#Reader7"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let stored = repo.get(&alice_id).await.unwrap();
        assert!(stored.password.verify(&fresh, None));
        assert!(stored.last_login_at.is_some());

        let (status, _) = send(
            &app,
            Method::POST,
            "/login",
            Some(json!({"username": "alice", "password": "Tolkien#Reader7"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_reset_keeps_last_login() {
        let repo = InMemoryUserRepository::default();
        let alice = make_user("alice", "Tolkien#Reader7", false);
        let alice_id = alice.user_id;
        repo.insert(alice).await;
        let mailer = CapturingMailer::default();
        let app = auth_router_generic(repo.clone(), mailer.clone(), AuthConfig::development());

        send(
            &app,
            Method::POST,
            "/login",
            Some(json!({"username": "alice", "password": "Tolkien#Reader7"})),
            None,
        )
        .await;
        let logged_in_at = repo.get(&alice_id).await.unwrap().last_login_at;
        assert!(logged_in_at.is_some());

        request_reset(&app, "alice@example.com").await;
        let (uid, token) = mailer.last_reset_link();
        assert_eq!(confirm(&app, &uid, &token, "Brand#New#Shelf9").await, StatusCode::OK);

        assert_eq!(repo.get(&alice_id).await.unwrap().last_login_at, logged_in_at);
    }

    #[tokio::test]
    async fn test_confirm_validates_new_password() {
        let (app, mailer) = setup().await;

        request_reset(&app, "alice@example.com").await;
        let (uid, token) = mailer.last_reset_link();

        assert_eq!(confirm(&app, &uid, &token, "short").await, StatusCode::BAD_REQUEST);
        // Rejected password leaves the link usable
        assert_eq!(confirm(&app, &uid, &token, "Brand#New#Shelf9").await, StatusCode::OK);
    }
}

#[cfg(test)]
mod profile_tests {
    use axum::Router;
    use axum::http::{Method, StatusCode};
    use serde_json::{Value, json};

    use super::support::*;
    use crate::application::config::AuthConfig;
    use crate::presentation::router::auth_router_generic;

    async fn setup() -> (Router, InMemoryUserRepository, String) {
        let repo = InMemoryUserRepository::default();
        repo.insert(make_user("alice", "Tolkien#Reader7", false)).await;
        repo.insert(make_user("bob", "Tolkien#Reader7", false)).await;
        let app = auth_router_generic(repo.clone(), CapturingMailer::default(), AuthConfig::development());

        let (_, body) = send(
            &app,
            Method::POST,
            "/login",
            Some(json!({"username": "alice", "password": "Tolkien#Reader7"})),
            None,
        )
        .await;
        let access = body["access"].as_str().unwrap().to_string();
        (app, repo, access)
    }

    async fn put_profile(app: &Router, access: &str, body: Value) -> (StatusCode, Value) {
        send(app, Method::PUT, "/profile", Some(body), Some(access)).await
    }

    #[tokio::test]
    async fn test_get_profile() {
        let (app, _, access) = setup().await;

        let (status, body) = send(&app, Method::GET, "/profile", None, Some(&access)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");

        let (status, _) = send(&app, Method::GET, "/profile", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_update_profile() {
        let (app, repo, access) = setup().await;

        let (status, body) = put_profile(
            &app,
            &access,
            json!({"username": "Alicia", "email": "Alicia@Books.test"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "Alicia");
        assert_eq!(body["email"], "alicia@books.test");

        let id = body["id"].as_str().unwrap().parse().unwrap();
        let stored = repo.get(&id).await.unwrap();
        assert_eq!(stored.user_name.canonical(), "alicia");

        // Password untouched; new name logs in
        let (status, _) = send(
            &app,
            Method::POST,
            "/login",
            Some(json!({"username": "alicia", "password": "Tolkien#Reader7"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let (app, _, access) = setup().await;

        let (status, body) = put_profile(&app, &access, json!({"email": "a.new@example.com"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");
        assert_eq!(body["email"], "a.new@example.com");

        // Re-submitting own values is not a duplicate
        let (status, _) = put_profile(
            &app,
            &access,
            json!({"username": "ALICE", "email": "a.new@example.com"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_update_profile_field_errors() {
        let (app, _, access) = setup().await;

        let (status, body) = put_profile(
            &app,
            &access,
            json!({"username": "BOB", "email": "bob@example.com"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["errors"]["username"][0],
            "A user with that username already exists."
        );
        assert_eq!(
            body["errors"]["email"][0],
            "A user with that email already exists."
        );

        let (status, body) = put_profile(
            &app,
            &access,
            json!({"username": "no spaces", "email": "nope"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"]["username"].is_array());
        assert_eq!(body["errors"]["email"][0], "Enter a valid email address.");
    }
}
