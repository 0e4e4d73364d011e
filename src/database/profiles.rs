// ABOUTME: Database operations for user profiles and subscription state
// ABOUTME: Handles account creation, lookups, and webhook-driven status updates
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::errors::{AppError, AppResult};
use crate::models::{PlanStatus, Profile, SubscriptionStatus, UserRole};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Request to create a new profile
#[derive(Debug, Clone)]
pub struct CreateProfileRequest {
    /// Login email (unique)
    pub email: String,
    /// Bcrypt password hash
    pub password_hash: String,
    /// Display name
    pub full_name: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Authorization role
    pub role: UserRole,
    /// Generated shareable referral code
    pub referral_code: Option<String>,
    /// Referrer profile id when signed up through a referral link
    pub referred_by: Option<Uuid>,
}

/// Profile database operations manager
pub struct ProfilesManager {
    pool: SqlitePool,
}

impl ProfilesManager {
    /// Create a new profiles manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new profile
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already registered or the insert fails.
    pub async fn create(&self, request: &CreateProfileRequest) -> AppResult<Profile> {
        let now = Utc::now();
        let id = Uuid::new_v4();

        let result = sqlx::query(
            r"
            INSERT INTO profiles (
                id, email, password_hash, full_name, phone, role, subscription_status,
                discount_remaining, referral_code, referred_by, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8, $9, $10, $10)
            ",
        )
        .bind(id.to_string())
        .bind(&request.email)
        .bind(&request.password_hash)
        .bind(&request.full_name)
        .bind(&request.phone)
        .bind(request.role.as_str())
        .bind(SubscriptionStatus::None.as_str())
        .bind(&request.referral_code)
        .bind(request.referred_by.map(|u| u.to_string()))
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(Profile {
                id,
                email: request.email.clone(),
                password_hash: request.password_hash.clone(),
                full_name: request.full_name.clone(),
                phone: request.phone.clone(),
                role: request.role,
                avatar_url: None,
                subscription_status: SubscriptionStatus::None,
                plan_status: None,
                stripe_customer_id: None,
                stripe_subscription_id: None,
                current_period_end: None,
                discount_remaining: 0,
                referral_code: request.referral_code.clone(),
                referred_by: request.referred_by,
                created_at: now,
                updated_at: now,
            }),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                AppError::already_exists(format!("Account for {}", request.email)),
            ),
            Err(e) => Err(AppError::database(format!("Failed to create profile: {e}"))),
        }
    }

    /// Get a profile by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get(&self, id: Uuid) -> AppResult<Option<Profile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get profile: {e}")))?;

        row.map(|r| row_to_profile(&r)).transpose()
    }

    /// Get a profile by email
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<Profile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get profile by email: {e}")))?;

        row.map(|r| row_to_profile(&r)).transpose()
    }

    /// Get a profile by its shareable referral code
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_by_referral_code(&self, code: &str) -> AppResult<Option<Profile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE referral_code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get profile by code: {e}")))?;

        row.map(|r| row_to_profile(&r)).transpose()
    }

    /// Get a profile by its payment gateway subscription id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_by_subscription_id(&self, subscription_id: &str) -> AppResult<Option<Profile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE stripe_subscription_id = $1")
            .bind(subscription_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::database(format!("Failed to get profile by subscription: {e}"))
            })?;

        row.map(|r| row_to_profile(&r)).transpose()
    }

    /// Update contact details on a profile
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_contact(
        &self,
        id: Uuid,
        full_name: Option<&str>,
        phone: Option<&str>,
        avatar_url: Option<&str>,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE profiles SET
                full_name = COALESCE($2, full_name),
                phone = COALESCE($3, phone),
                avatar_url = COALESCE($4, avatar_url),
                updated_at = $5
            WHERE id = $1
            ",
        )
        .bind(id.to_string())
        .bind(full_name)
        .bind(phone)
        .bind(avatar_url)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update profile: {e}")))?;

        Ok(())
    }

    /// Persist the payment gateway customer id
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn set_stripe_customer(&self, id: Uuid, customer_id: &str) -> AppResult<()> {
        sqlx::query("UPDATE profiles SET stripe_customer_id = $2, updated_at = $3 WHERE id = $1")
            .bind(id.to_string())
            .bind(customer_id)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to store customer id: {e}")))?;

        Ok(())
    }

    /// Mark a checkout as completed: activate the subscription and store its id
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn mark_checkout_completed(
        &self,
        id: Uuid,
        subscription_id: Option<&str>,
        period_end: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE profiles SET
                subscription_status = $2,
                stripe_subscription_id = $3,
                current_period_end = $4,
                updated_at = $5
            WHERE id = $1
            ",
        )
        .bind(id.to_string())
        .bind(SubscriptionStatus::Active.as_str())
        .bind(subscription_id)
        .bind(period_end.to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to activate subscription: {e}")))?;

        Ok(())
    }

    /// Mark a subscription renewal: keep it active and advance the period end
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn mark_subscription_renewed(
        &self,
        id: Uuid,
        period_end: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE profiles SET
                subscription_status = $2,
                current_period_end = COALESCE($3, current_period_end),
                updated_at = $4
            WHERE id = $1
            ",
        )
        .bind(id.to_string())
        .bind(SubscriptionStatus::Active.as_str())
        .bind(period_end.map(|t| t.to_rfc3339()))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to renew subscription: {e}")))?;

        Ok(())
    }

    /// Set the subscription status and optionally the period end
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn set_subscription_status(
        &self,
        id: Uuid,
        status: SubscriptionStatus,
        period_end: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE profiles SET
                subscription_status = $2,
                current_period_end = COALESCE($3, current_period_end),
                updated_at = $4
            WHERE id = $1
            ",
        )
        .bind(id.to_string())
        .bind(status.as_str())
        .bind(period_end.map(|t| t.to_rfc3339()))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to set subscription status: {e}")))?;

        Ok(())
    }

    /// Cancel the subscription and forget the stored subscription id
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn clear_subscription(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE profiles SET
                subscription_status = $2,
                stripe_subscription_id = NULL,
                updated_at = $3
            WHERE id = $1
            ",
        )
        .bind(id.to_string())
        .bind(SubscriptionStatus::Canceled.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to cancel subscription: {e}")))?;

        Ok(())
    }

    /// Set the aggregate plan status (NULL clears it)
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn set_plan_status(&self, id: Uuid, status: Option<PlanStatus>) -> AppResult<()> {
        sqlx::query("UPDATE profiles SET plan_status = $2, updated_at = $3 WHERE id = $1")
            .bind(id.to_string())
            .bind(status.map(|s| s.as_str()))
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to set plan status: {e}")))?;

        Ok(())
    }

    /// Consume one referral-discounted billing cycle when any remain.
    ///
    /// Plain read-then-write, no transaction; concurrent invoice webhooks
    /// for the same profile can race.
    ///
    /// # Errors
    ///
    /// Returns an error if either query fails.
    pub async fn decrement_discount(&self, id: Uuid) -> AppResult<()> {
        let Some(profile) = self.get(id).await? else {
            return Ok(());
        };

        if profile.discount_remaining > 0 {
            sqlx::query(
                "UPDATE profiles SET discount_remaining = $2, updated_at = $3 WHERE id = $1",
            )
            .bind(id.to_string())
            .bind(profile.discount_remaining - 1)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to decrement discount: {e}")))?;
        }

        Ok(())
    }

    /// Grant one referral-discounted billing cycle to a referrer
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn increment_discount(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE profiles SET
                discount_remaining = discount_remaining + 1,
                updated_at = $2
            WHERE id = $1
            ",
        )
        .bind(id.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to increment discount: {e}")))?;

        Ok(())
    }

    /// List student profiles (coach dashboard)
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_students(&self) -> AppResult<Vec<Profile>> {
        let rows = sqlx::query(
            "SELECT * FROM profiles WHERE role = 'student' ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list students: {e}")))?;

        rows.iter().map(row_to_profile).collect()
    }

    /// Delete a profile; dependent rows cascade
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete profile: {e}")))?;

        Ok(())
    }
}

/// Map a database row onto a [`Profile`]
fn row_to_profile(row: &SqliteRow) -> AppResult<Profile> {
    let id_str: String = row.get("id");
    let role_str: String = row.get("role");
    let subscription_str: String = row.get("subscription_status");
    let plan_status_str: Option<String> = row.get("plan_status");
    let referred_by_str: Option<String> = row.get("referred_by");
    let period_end_str: Option<String> = row.get("current_period_end");
    let created_at_str: String = row.get("created_at");
    let updated_at_str: String = row.get("updated_at");

    Ok(Profile {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| AppError::database(format!("Corrupt profile id: {e}")))?,
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        full_name: row.get("full_name"),
        phone: row.get("phone"),
        role: UserRole::parse(&role_str),
        avatar_url: row.get("avatar_url"),
        subscription_status: SubscriptionStatus::parse(&subscription_str),
        plan_status: plan_status_str.as_deref().and_then(PlanStatus::parse),
        stripe_customer_id: row.get("stripe_customer_id"),
        stripe_subscription_id: row.get("stripe_subscription_id"),
        current_period_end: period_end_str
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc)),
        discount_remaining: row.get("discount_remaining"),
        referral_code: row.get("referral_code"),
        referred_by: referred_by_str.as_deref().and_then(|s| Uuid::parse_str(s).ok()),
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        updated_at: DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}
