// ABOUTME: Coach review workflow for generated plans
// ABOUTME: Applies approve, edit, and reject decisions across plan, profile, and notifications
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{Plan, PlanStatus};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

/// A coach's decision on a pending plan
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlanReviewAction {
    /// Approve the plan as generated
    Approve,
    /// Replace the content and approve in one step
    Edit {
        /// Replacement plan document
        content: serde_json::Value,
    },
    /// Reject the plan with a reason for the student
    Reject {
        /// Why the plan was rejected
        reason: String,
    },
}

/// Apply a coach's review decision to a plan.
///
/// Approval (plain or via edit) also flips the student profile's
/// aggregate plan status to approved. Rejection records the reason on
/// the plan row and notifies the student but leaves the profile's
/// aggregate status alone, so the student keeps seeing their previous
/// overall state until new plans arrive.
///
/// # Errors
///
/// Returns an error when the plan does not exist or a write fails.
pub async fn apply_review(
    database: &Database,
    plan_id: Uuid,
    coach_id: Uuid,
    action: &PlanReviewAction,
) -> AppResult<Plan> {
    let plan = database
        .plans()
        .get(plan_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Plan {plan_id}")))?;

    match action {
        PlanReviewAction::Approve => {
            database.plans().approve(plan_id, coach_id).await?;
            database
                .profiles()
                .set_plan_status(plan.user_id, Some(PlanStatus::Approved))
                .await?;
            database
                .notifications()
                .create(
                    plan.user_id,
                    "plan_approve",
                    "Seu plano foi aprovado pelo seu coach!",
                )
                .await?;
            info!("Coach {coach_id} approved plan {plan_id}");
        }
        PlanReviewAction::Edit { content } => {
            database
                .plans()
                .approve_with_content(plan_id, coach_id, content)
                .await?;
            database
                .profiles()
                .set_plan_status(plan.user_id, Some(PlanStatus::Approved))
                .await?;
            database
                .notifications()
                .create(
                    plan.user_id,
                    "plan_edit",
                    "Seu coach ajustou e aprovou seu plano.",
                )
                .await?;
            info!("Coach {coach_id} edited and approved plan {plan_id}");
        }
        PlanReviewAction::Reject { reason } => {
            if reason.trim().is_empty() {
                return Err(AppError::missing_field("reason"));
            }
            database.plans().reject(plan_id, coach_id, reason).await?;
            database
                .notifications()
                .create(
                    plan.user_id,
                    "plan_reject",
                    "Seu plano precisa de ajustes e está sendo revisado.",
                )
                .await?;
            info!("Coach {coach_id} rejected plan {plan_id}");
        }
    }

    database
        .plans()
        .get(plan_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Plan {plan_id}")))
}
