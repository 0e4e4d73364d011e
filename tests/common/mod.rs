// ABOUTME: Shared helpers for integration tests
// ABOUTME: In-memory database setup plus scripted gateway and chat implementations

#![allow(dead_code, missing_docs, clippy::unwrap_used)]

use async_trait::async_trait;
use fitflow_server::auth::AuthManager;
use fitflow_server::billing::gateway::{
    CheckoutParams, CheckoutSession, Coupon, GatewaySubscription, PaymentGateway,
};
use fitflow_server::config::{
    AuthConfig, BillingConfig, DatabaseConfig, Environment, LlmConfig, MediaConfig, ServerConfig,
};
use fitflow_server::database::profiles::CreateProfileRequest;
use fitflow_server::database::Database;
use fitflow_server::errors::{AppError, AppResult};
use fitflow_server::llm::{ChatCompletion, ChatRequest};
use fitflow_server::models::{Profile, UserRole};
use fitflow_server::resources::ServerResources;
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test";

/// Create a migrated in-memory database.
///
/// Single connection, because each `:memory:` connection is its own db.
pub async fn setup_database() -> Database {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let db = Database::from_pool(pool);
    db.migrate().await.unwrap();
    db
}

/// Insert a student profile with a referral code derived from the email
pub async fn create_student(db: &Database, email: &str) -> Profile {
    let code = email
        .split('@')
        .next()
        .unwrap_or("code")
        .to_uppercase()
        .chars()
        .chain("XXXXXXXXXXXX".chars())
        .take(12)
        .collect::<String>();

    db.profiles()
        .create(&CreateProfileRequest {
            email: email.to_owned(),
            password_hash: AuthManager::hash_password("password123").unwrap(),
            full_name: Some("Test Student".into()),
            phone: None,
            role: UserRole::Student,
            referral_code: Some(code),
            referred_by: None,
        })
        .await
        .unwrap()
}

/// Insert a coach profile
pub async fn create_coach(db: &Database, email: &str) -> Profile {
    db.profiles()
        .create(&CreateProfileRequest {
            email: email.to_owned(),
            password_hash: AuthManager::hash_password("password123").unwrap(),
            full_name: Some("Test Coach".into()),
            phone: None,
            role: UserRole::Coach,
            referral_code: None,
            referred_by: None,
        })
        .await
        .unwrap()
}

/// Scripted chat completion provider
#[derive(Default)]
pub struct MockChat {
    replies: Mutex<VecDeque<String>>,
    pub calls: AtomicU64,
}

impl MockChat {
    pub fn with_replies(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(ToOwned::to_owned).collect()),
            calls: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl ChatCompletion for MockChat {
    async fn complete(&self, _request: &ChatRequest) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::external_service("llm", "No scripted reply left"))
    }
}

/// Scripted payment gateway
#[derive(Default)]
pub struct MockGateway {
    pub coupons: Mutex<HashMap<String, Coupon>>,
    pub subscriptions: Mutex<HashMap<String, GatewaySubscription>>,
    customer_counter: AtomicU64,
}

impl MockGateway {
    pub fn add_coupon(&self, coupon: Coupon) {
        self.coupons
            .lock()
            .unwrap()
            .insert(coupon.id.clone(), coupon);
    }

    pub fn add_subscription(&self, sub: GatewaySubscription) {
        self.subscriptions.lock().unwrap().insert(sub.id.clone(), sub);
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_customer(&self, _email: &str, _name: Option<&str>) -> AppResult<String> {
        let n = self.customer_counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("cus_test_{n}"))
    }

    async fn create_checkout_session(
        &self,
        params: &CheckoutParams,
    ) -> AppResult<CheckoutSession> {
        Ok(CheckoutSession {
            id: format!("cs_test_{}", params.user_id),
            url: "https://checkout.test/session".into(),
        })
    }

    async fn retrieve_coupon(&self, code: &str) -> AppResult<Option<Coupon>> {
        Ok(self.coupons.lock().unwrap().get(code).cloned())
    }

    async fn retrieve_subscription(&self, subscription_id: &str) -> AppResult<GatewaySubscription> {
        self.subscriptions
            .lock()
            .unwrap()
            .get(subscription_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Subscription {subscription_id}")))
    }
}

/// Test server configuration with fixed secrets
pub fn test_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        environment: Environment::Testing,
        database: DatabaseConfig {
            url: "sqlite::memory:".into(),
        },
        auth: AuthConfig {
            jwt_secret: TEST_JWT_SECRET.into(),
            jwt_expiry_hours: 24,
        },
        billing: BillingConfig {
            secret_key: "sk_test".into(),
            webhook_secret: TEST_WEBHOOK_SECRET.into(),
            checkout_success_url: "http://localhost/success".into(),
            checkout_cancel_url: "http://localhost/cancel".into(),
        },
        llm: LlmConfig {
            base_url: "http://localhost:9999/v1".into(),
            model: "test-model".into(),
            api_key: "test-key".into(),
        },
        media: MediaConfig {
            base_url: "http://localhost/media".into(),
            signing_secret: "media-secret".into(),
            url_expiry_secs: 3600,
        },
    }
}

/// Bundle a database and mocks into server resources
pub fn test_resources(
    db: Database,
    gateway: Arc<MockGateway>,
    chat: Arc<MockChat>,
) -> Arc<ServerResources> {
    let config = Arc::new(test_config());
    Arc::new(ServerResources::new(
        db,
        AuthManager::new(TEST_JWT_SECRET.as_bytes().to_vec(), 24),
        gateway,
        chat,
        config,
    ))
}

/// Issue a bearer token for a profile against the test JWT secret
pub fn bearer_token(profile: &Profile) -> String {
    let manager = AuthManager::new(TEST_JWT_SECRET.as_bytes().to_vec(), 24);
    format!("Bearer {}", manager.generate_token(profile).unwrap())
}
