// ABOUTME: Core domain models for the FitFlow platform
// ABOUTME: Profiles, anamnese, evaluations, plans, referrals, notifications, and status enums
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

//! # Domain Models
//!
//! Shared data structures for the fitness-coaching domain. Status enums carry
//! `as_str`/`parse` pairs for their database string representations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Application role for authorization checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular paying student
    #[default]
    Student,
    /// Coach reviewing and approving plans
    Coach,
    /// Platform administrator
    Admin,
}

impl UserRole {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Coach => "coach",
            Self::Admin => "admin",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "coach" => Self::Coach,
            "admin" => Self::Admin,
            _ => Self::Student,
        }
    }

    /// Whether this role can act on student plans and accounts
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        matches!(self, Self::Coach | Self::Admin)
    }
}

/// Subscription lifecycle state, driven by payment gateway webhooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// No subscription yet
    #[default]
    None,
    /// Subscription active and paid
    Active,
    /// Last payment failed, grace period
    PastDue,
    /// Subscription canceled by the customer or gateway
    Canceled,
}

impl SubscriptionStatus {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            "past_due" => Self::PastDue,
            "canceled" => Self::Canceled,
            _ => Self::None,
        }
    }

    /// Map a payment gateway subscription status string onto the local enum.
    ///
    /// Returns `None` for vocabulary the gateway may emit that has no local
    /// counterpart (`trialing`, `incomplete`, ...) so callers can skip the
    /// update instead of guessing.
    #[must_use]
    pub fn from_gateway(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "past_due" | "unpaid" => Some(Self::PastDue),
            "canceled" => Some(Self::Canceled),
            _ => None,
        }
    }
}

/// Aggregate plan state mirrored on the student profile.
///
/// Stored denormalized: every write path that touches plan rows is
/// responsible for keeping this in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    /// Plans requested but not yet generated (or generation failed)
    Pending,
    /// Generation in flight or awaiting coach review
    Generating,
    /// Coach approved the plans
    Approved,
    /// Coach rejected the plans
    Rejected,
}

impl PlanStatus {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Generating => "generating",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "generating" => Some(Self::Generating),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Review state of an individual plan row.
///
/// Monotone: `pending` moves to `approved` or `rejected` and no defined
/// handler writes `pending` back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanReviewStatus {
    /// Waiting for coach review
    #[default]
    Pending,
    /// Approved and visible to the student
    Approved,
    /// Rejected, reason stored in notes
    Rejected,
}

impl PlanReviewStatus {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            _ => Self::Pending,
        }
    }

    /// Whether this is a terminal review state
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

/// Plan document kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    /// Workout / training plan
    Workout,
    /// Nutrition / meal plan
    Nutrition,
}

impl PlanType {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Workout => "workout",
            Self::Nutrition => "nutrition",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "workout" => Some(Self::Workout),
            "nutrition" => Some(Self::Nutrition),
            _ => None,
        }
    }
}

/// A user account with its subscription and plan state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Unique identifier
    pub id: Uuid,
    /// Login email (unique)
    pub email: String,
    /// Bcrypt password hash, never serialized out
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Display name
    pub full_name: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Authorization role
    pub role: UserRole,
    /// Profile photo URL
    pub avatar_url: Option<String>,
    /// Subscription lifecycle state
    pub subscription_status: SubscriptionStatus,
    /// Aggregate plan state (NULL until checkout or onboarding completes)
    pub plan_status: Option<PlanStatus>,
    /// Payment gateway customer id
    pub stripe_customer_id: Option<String>,
    /// Payment gateway subscription id
    pub stripe_subscription_id: Option<String>,
    /// End of the current paid period
    pub current_period_end: Option<DateTime<Utc>>,
    /// Remaining referral-discounted billing cycles
    pub discount_remaining: i64,
    /// This user's shareable referral code
    pub referral_code: Option<String>,
    /// Referrer profile id, when signed up through a referral link
    pub referred_by: Option<Uuid>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Intake questionnaire (one per student, updatable)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Anamnese {
    /// Owning student
    pub user_id: Uuid,
    /// Main training goal
    pub main_goal: Option<String>,
    /// Self-reported activity level
    pub activity_level: Option<String>,
    /// Birth date
    pub birth_date: Option<NaiveDate>,
    /// Gender
    pub gender: Option<String>,
    /// Height in centimeters
    pub height: Option<f64>,
    /// Current weight in kilograms
    pub current_weight: Option<f64>,
    /// Target weight in kilograms
    pub target_weight: Option<f64>,
    /// Injury description, if any
    pub injuries: Option<String>,
    /// Diabetes flag
    pub diabetes: bool,
    /// Hypertension flag
    pub hypertension: bool,
    /// Cardiovascular condition flag
    pub cardiovascular: bool,
    /// Dietary preference
    pub diet_preference: Option<String>,
    /// Food intolerances
    pub intolerances: Option<String>,
    /// Allergies
    pub allergies: Option<String>,
    /// Meals per day preference
    pub meals_per_day: Option<String>,
    /// Average sleep hours
    pub sleep_hours: Option<f64>,
    /// Current supplements
    pub supplements: Option<String>,
    /// Preferred training session duration
    pub training_duration: Option<String>,
    /// Weekly availability
    pub availability: Option<String>,
}

/// One body-measurement assessment session (append-only history)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    /// Unique identifier
    pub id: Uuid,
    /// Owning student
    pub user_id: Uuid,
    /// Weight in kilograms
    pub weight: Option<f64>,
    /// Height in centimeters
    pub height: Option<f64>,
    /// Body mass index, computed on insert from weight and height
    pub bmi: Option<f64>,
    /// Body fat percentage
    pub body_fat_percentage: Option<f64>,
    /// Chest circumference in centimeters
    pub chest_circumference: Option<f64>,
    /// Waist circumference in centimeters
    pub waist_circumference: Option<f64>,
    /// Hip circumference in centimeters
    pub hip_circumference: Option<f64>,
    /// Arm circumference in centimeters
    pub arm_circumference: Option<f64>,
    /// Leg circumference in centimeters
    pub leg_circumference: Option<f64>,
    /// Blood pressure reading
    pub blood_pressure: Option<String>,
    /// Resting heart rate
    pub heart_rate: Option<i64>,
    /// Assessor notes
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// A generated workout or nutrition plan awaiting or past coach review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Unique identifier
    pub id: Uuid,
    /// Owning student
    pub user_id: Uuid,
    /// Workout or nutrition
    pub plan_type: PlanType,
    /// Semi-structured plan document
    pub content: serde_json::Value,
    /// Review state
    pub status: PlanReviewStatus,
    /// Coach who approved or rejected the plan
    pub approved_by: Option<Uuid>,
    /// When the review action happened
    pub approved_at: Option<DateTime<Utc>>,
    /// Review notes (rejection reason)
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// A referral link between two profiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Referral {
    /// Unique identifier
    pub id: Uuid,
    /// Profile whose code was used
    pub referrer_id: Uuid,
    /// Profile that signed up with the code
    pub referred_id: Uuid,
    /// `pending` until the referred user's subscription activates
    pub status: String,
    /// Whether the referrer discount was granted
    pub discount_applied: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// In-app notification row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier
    pub id: Uuid,
    /// Recipient
    pub user_id: Uuid,
    /// Notification type tag (`payment_success`, `plan_approve`, ...)
    pub notification_type: String,
    /// User-facing message
    pub message: String,
    /// Whether the client marked it read
    pub read: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Audit log entry for administrative actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Unique identifier
    pub id: Uuid,
    /// Action tag (`delete_user`, ...)
    pub action: String,
    /// Staff member who performed the action
    pub actor_id: Option<Uuid>,
    /// Affected user
    pub target_user_id: Option<Uuid>,
    /// Free-text reason
    pub reason: Option<String>,
    /// Structured metadata
    pub metadata: serde_json::Value,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Exercise library entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Category (strength, cardio, mobility, ...)
    pub category: Option<String>,
    /// Difficulty level
    pub level: Option<String>,
    /// Description and cues
    pub description: Option<String>,
    /// Targeted muscle groups
    pub muscle_groups: Vec<String>,
    /// Required equipment
    pub equipment: Vec<String>,
    /// Storage path of the demo video, if uploaded
    pub video_path: Option<String>,
    /// External video URL, if linked instead of uploaded
    pub video_url: Option<String>,
    /// Thumbnail storage path
    pub thumbnail_path: Option<String>,
    /// Coach who created the entry
    pub created_by: Option<Uuid>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
