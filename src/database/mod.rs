// ABOUTME: Database management for the FitFlow platform
// ABOUTME: Connection handling, idempotent schema creation, and per-table manager accessors
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

//! # Database Management
//!
//! `SQLite`-backed persistence for profiles, onboarding data, plans,
//! referrals, notifications, and audit records. Each table group has a
//! dedicated manager struct owning a pool handle; [`Database`] wires them
//! together and creates the schema idempotently at startup.

pub mod anamnese;
pub mod audit;
pub mod evaluations;
pub mod exercises;
pub mod notifications;
pub mod plans;
pub mod profiles;
pub mod referrals;
pub mod webhook_events;

use anyhow::Result;
use sqlx::{Pool, Sqlite, SqlitePool};

use anamnese::AnamneseManager;
use audit::AuditManager;
use evaluations::EvaluationsManager;
use exercises::ExercisesManager;
use notifications::NotificationsManager;
use plans::PlansManager;
use profiles::ProfilesManager;
use referrals::ReferralsManager;
use webhook_events::WebhookEventsManager;

/// Database manager for the platform's relational state
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run schema migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or any migration statement fails.
    pub async fn new(database_url: &str) -> Result<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:")
            && !database_url.contains(":memory:")
        {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options).await?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Wrap an existing pool (used by tests)
    #[must_use]
    pub const fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Access the underlying pool
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Profiles manager
    #[must_use]
    pub fn profiles(&self) -> ProfilesManager {
        ProfilesManager::new(self.pool.clone())
    }

    /// Anamnese (intake questionnaire) manager
    #[must_use]
    pub fn anamnese(&self) -> AnamneseManager {
        AnamneseManager::new(self.pool.clone())
    }

    /// Evaluations manager
    #[must_use]
    pub fn evaluations(&self) -> EvaluationsManager {
        EvaluationsManager::new(self.pool.clone())
    }

    /// Plans manager
    #[must_use]
    pub fn plans(&self) -> PlansManager {
        PlansManager::new(self.pool.clone())
    }

    /// Referrals manager
    #[must_use]
    pub fn referrals(&self) -> ReferralsManager {
        ReferralsManager::new(self.pool.clone())
    }

    /// Notifications manager
    #[must_use]
    pub fn notifications(&self) -> NotificationsManager {
        NotificationsManager::new(self.pool.clone())
    }

    /// Audit log manager
    #[must_use]
    pub fn audit(&self) -> AuditManager {
        AuditManager::new(self.pool.clone())
    }

    /// Webhook event log manager
    #[must_use]
    pub fn webhook_events(&self) -> WebhookEventsManager {
        WebhookEventsManager::new(self.pool.clone())
    }

    /// Exercise library manager
    #[must_use]
    pub fn exercises(&self) -> ExercisesManager {
        ExercisesManager::new(self.pool.clone())
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any schema statement fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                full_name TEXT,
                phone TEXT,
                role TEXT NOT NULL DEFAULT 'student',
                avatar_url TEXT,
                subscription_status TEXT NOT NULL DEFAULT 'none',
                plan_status TEXT,
                stripe_customer_id TEXT,
                stripe_subscription_id TEXT,
                current_period_end TEXT,
                discount_remaining INTEGER NOT NULL DEFAULT 0,
                referral_code TEXT UNIQUE,
                referred_by TEXT REFERENCES profiles(id) ON DELETE SET NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_profiles_email ON profiles(email)")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_profiles_subscription
             ON profiles(stripe_subscription_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS anamnese (
                user_id TEXT PRIMARY KEY REFERENCES profiles(id) ON DELETE CASCADE,
                main_goal TEXT,
                activity_level TEXT,
                birth_date TEXT,
                gender TEXT,
                height REAL,
                current_weight REAL,
                target_weight REAL,
                injuries TEXT,
                diabetes INTEGER NOT NULL DEFAULT 0,
                hypertension INTEGER NOT NULL DEFAULT 0,
                cardiovascular INTEGER NOT NULL DEFAULT 0,
                diet_preference TEXT,
                intolerances TEXT,
                allergies TEXT,
                meals_per_day TEXT,
                sleep_hours REAL,
                supplements TEXT,
                training_duration TEXT,
                availability TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS evaluations (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
                weight REAL,
                height REAL,
                bmi REAL,
                body_fat_percentage REAL,
                chest_circumference REAL,
                waist_circumference REAL,
                hip_circumference REAL,
                arm_circumference REAL,
                leg_circumference REAL,
                blood_pressure TEXT,
                heart_rate INTEGER,
                notes TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_evaluations_user ON evaluations(user_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS plans (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
                type TEXT NOT NULL,
                content TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                approved_by TEXT,
                approved_at TEXT,
                notes TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_plans_user ON plans(user_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_plans_status ON plans(status)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS referrals (
                id TEXT PRIMARY KEY,
                referrer_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
                referred_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
                status TEXT NOT NULL DEFAULT 'pending',
                discount_applied INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                UNIQUE(referrer_id, referred_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS notifications (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
                type TEXT NOT NULL,
                message TEXT NOT NULL,
                read INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, read)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS audit_log (
                id TEXT PRIMARY KEY,
                action TEXT NOT NULL,
                actor_id TEXT,
                target_user_id TEXT,
                reason TEXT,
                metadata TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS webhook_events (
                id TEXT PRIMARY KEY,
                event_type TEXT NOT NULL,
                event_data TEXT NOT NULL,
                processed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS exercises (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                category TEXT,
                level TEXT,
                description TEXT,
                muscle_groups TEXT,
                equipment TEXT,
                video_path TEXT,
                video_url TEXT,
                thumbnail_path TEXT,
                created_by TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
