// ABOUTME: Database operations for referral tracking between profiles
// ABOUTME: Rows are created at signup and activated when the referred subscription starts
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::errors::{AppError, AppResult};
use crate::models::Referral;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// A referral joined with both parties' identities (coach overview)
#[derive(Debug, Clone, serde::Serialize)]
pub struct ReferralOverview {
    /// The referral row
    #[serde(flatten)]
    pub referral: Referral,
    /// Referrer display name
    pub referrer_name: Option<String>,
    /// Referred user display name
    pub referred_name: Option<String>,
    /// Referred user subscription status string
    pub referred_subscription_status: String,
}

/// Referral database operations manager
pub struct ReferralsManager {
    pool: SqlitePool,
}

impl ReferralsManager {
    /// Create a new referrals manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a referral link at signup time, in `pending` status
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(&self, referrer_id: Uuid, referred_id: Uuid) -> AppResult<Referral> {
        let now = Utc::now();
        let id = Uuid::new_v4();

        sqlx::query(
            r"
            INSERT INTO referrals (id, referrer_id, referred_id, status, discount_applied, created_at)
            VALUES ($1, $2, $3, 'pending', 0, $4)
            ",
        )
        .bind(id.to_string())
        .bind(referrer_id.to_string())
        .bind(referred_id.to_string())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create referral: {e}")))?;

        Ok(Referral {
            id,
            referrer_id,
            referred_id,
            status: "pending".into(),
            discount_applied: false,
            created_at: now,
        })
    }

    /// Activate the pending referral for a referred user, if one exists.
    ///
    /// Returns the activated row so the caller can credit the referrer;
    /// returns `None` when the user has no pending referral (already
    /// activated rows are left alone).
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn activate_for_referred(&self, referred_id: Uuid) -> AppResult<Option<Referral>> {
        let row = sqlx::query(
            "SELECT * FROM referrals WHERE referred_id = $1 AND status = 'pending' LIMIT 1",
        )
        .bind(referred_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to look up referral: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut referral = row_to_referral(&row)?;

        sqlx::query("UPDATE referrals SET status = 'active', discount_applied = 1 WHERE id = $1")
            .bind(referral.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to activate referral: {e}")))?;

        referral.status = "active".into();
        referral.discount_applied = true;
        Ok(Some(referral))
    }

    /// List referrals made by a given referrer, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_referrer(&self, referrer_id: Uuid) -> AppResult<Vec<Referral>> {
        let rows = sqlx::query(
            "SELECT * FROM referrals WHERE referrer_id = $1 ORDER BY created_at DESC",
        )
        .bind(referrer_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list referrals: {e}")))?;

        rows.iter().map(row_to_referral).collect()
    }

    /// List all referrals with both parties' identities (coach overview)
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_overview(&self) -> AppResult<Vec<ReferralOverview>> {
        let rows = sqlx::query(
            r"
            SELECT r.*,
                   referrer.full_name AS referrer_name,
                   referred.full_name AS referred_name,
                   referred.subscription_status AS referred_subscription_status
            FROM referrals r
            JOIN profiles referrer ON referrer.id = r.referrer_id
            JOIN profiles referred ON referred.id = r.referred_id
            ORDER BY r.created_at DESC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list referral overview: {e}")))?;

        rows.iter()
            .map(|r| {
                Ok(ReferralOverview {
                    referral: row_to_referral(r)?,
                    referrer_name: r.get("referrer_name"),
                    referred_name: r.get("referred_name"),
                    referred_subscription_status: r.get("referred_subscription_status"),
                })
            })
            .collect()
    }
}

/// Map a database row onto a [`Referral`]
fn row_to_referral(row: &SqliteRow) -> AppResult<Referral> {
    let id_str: String = row.get("id");
    let referrer_str: String = row.get("referrer_id");
    let referred_str: String = row.get("referred_id");
    let discount_applied: i64 = row.get("discount_applied");
    let created_at_str: String = row.get("created_at");

    Ok(Referral {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| AppError::database(format!("Corrupt referral id: {e}")))?,
        referrer_id: Uuid::parse_str(&referrer_str)
            .map_err(|e| AppError::database(format!("Corrupt referrer id: {e}")))?,
        referred_id: Uuid::parse_str(&referred_str)
            .map_err(|e| AppError::database(format!("Corrupt referred id: {e}")))?,
        status: row.get("status"),
        discount_applied: discount_applied != 0,
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}
