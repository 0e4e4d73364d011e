// ABOUTME: Plan generation and coach review workflow
// ABOUTME: LLM-backed plan drafting plus the approve/edit/reject state machine
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

//! # Plans
//!
//! Workout and nutrition plan lifecycle. [`generator::PlanGenerator`]
//! drafts both plan documents from the student's intake data and stores
//! them pending review; [`approval`] applies the coach's decision to the
//! plan row, the student profile, and the notification feed.

pub mod approval;
pub mod generator;
