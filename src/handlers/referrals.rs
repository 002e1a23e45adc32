//! Storefront-side visit tracking.
//!
//! The storefront posts here when a visitor lands with a referral code so the
//! webhook pipeline can fall back to recent visits when an order carries no
//! code of its own.

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde::Serialize;

use crate::db::{AppState, ReferralVisitRepository};
use crate::error::{AppError, Result};
use crate::models::RecordVisit;

const MAX_REFERRAL_CODE_LEN: usize = 64;

#[derive(Debug, Serialize)]
pub struct RecordVisitResponse {
    pub id: String,
    pub referral_code: String,
    pub created_at: i64,
}

/// Trim and validate a referral code taken from a storefront link.
pub fn normalize_referral_code(raw: &str) -> Result<String> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(AppError::BadRequest("Referral code cannot be empty".into()));
    }
    if code.len() > MAX_REFERRAL_CODE_LEN {
        return Err(AppError::BadRequest(format!(
            "Referral code cannot exceed {} characters",
            MAX_REFERRAL_CODE_LEN
        )));
    }
    if code.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(AppError::BadRequest(
            "Referral code cannot contain whitespace".into(),
        ));
    }
    Ok(code.to_string())
}

pub async fn record_visit(
    State(state): State<AppState>,
    Json(input): Json<RecordVisit>,
) -> Result<(StatusCode, Json<RecordVisitResponse>)> {
    let code = normalize_referral_code(&input.code)?;
    let visit = state
        .store
        .record_visit(&code, chrono::Utc::now().timestamp())?;

    tracing::debug!("Recorded referral visit {} for code {}", visit.id, visit.referral_code);

    Ok((
        StatusCode::CREATED,
        Json(RecordVisitResponse {
            id: visit.id,
            referral_code: visit.referral_code,
            created_at: visit.created_at,
        }),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/referrals/visits", post(record_visit))
}
