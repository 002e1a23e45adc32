use chrono::Utc;
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

use super::from_row::{ATTRIBUTION_COLS, PARTNER_COLS, REFERRAL_VISIT_COLS, query_all, query_one};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

// ============ Users ============

pub fn user_exists_by_email(conn: &Connection, email: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE email = ?1",
        params![email.trim()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

// ============ Partners ============

pub fn create_partner(conn: &Connection, input: &CreatePartner) -> Result<Partner> {
    let id = gen_id();
    let now = now();
    let tiers_json = serde_json::to_string(&input.tiers)?;

    conn.execute(
        "INSERT INTO partners (id, name, referral_code, status, base_rate_bps, tiers, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            &id,
            &input.name,
            &input.referral_code,
            input.status.as_ref(),
            input.base_rate_bps,
            &tiers_json,
            now
        ],
    )?;

    Ok(Partner {
        id,
        name: input.name.clone(),
        referral_code: input.referral_code.clone(),
        status: input.status,
        base_rate_bps: input.base_rate_bps,
        tiers: input.tiers.clone(),
        created_at: now,
    })
}

pub fn get_partner_by_code(conn: &Connection, code: &str) -> Result<Option<Partner>> {
    query_one(
        conn,
        &format!("SELECT {} FROM partners WHERE referral_code = ?1", PARTNER_COLS),
        &[&code],
    )
}

// ============ Referral Visits ============

pub fn create_referral_visit(conn: &Connection, code: &str, created_at: i64) -> Result<ReferralVisit> {
    let id = gen_id();

    conn.execute(
        "INSERT INTO referral_visits (id, referral_code, created_at) VALUES (?1, ?2, ?3)",
        params![&id, code, created_at],
    )?;

    Ok(ReferralVisit {
        id,
        referral_code: code.to_string(),
        created_at,
        converted_at: None,
        order_id: None,
    })
}

pub fn get_referral_visit(conn: &Connection, id: &str) -> Result<Option<ReferralVisit>> {
    query_one(
        conn,
        &format!("SELECT {} FROM referral_visits WHERE id = ?1", REFERRAL_VISIT_COLS),
        &[&id],
    )
}

/// Most recently created unconverted visit with `created_at >= since`, any code.
pub fn latest_unconverted_visit(conn: &Connection, since: i64) -> Result<Option<ReferralVisit>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM referral_visits
             WHERE converted_at IS NULL AND created_at >= ?1
             ORDER BY created_at DESC, rowid DESC LIMIT 1",
            REFERRAL_VISIT_COLS
        ),
        &[&since],
    )
}

/// Most recently created unconverted visit for one referral code with `created_at >= since`.
pub fn latest_unconverted_visit_for_code(
    conn: &Connection,
    code: &str,
    since: i64,
) -> Result<Option<ReferralVisit>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM referral_visits
             WHERE converted_at IS NULL AND referral_code = ?1 AND created_at >= ?2
             ORDER BY created_at DESC, rowid DESC LIMIT 1",
            REFERRAL_VISIT_COLS
        ),
        &[&code, &since],
    )
}

/// Atomically mark a visit converted. Returns false if it was already converted
/// (or does not exist), so a visit is converted at most once.
pub fn mark_visit_converted(
    conn: &Connection,
    visit_id: &str,
    order_id: &str,
    converted_at: i64,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE referral_visits SET converted_at = ?1, order_id = ?2
         WHERE id = ?3 AND converted_at IS NULL",
        params![converted_at, order_id, visit_id],
    )?;
    Ok(affected > 0)
}

// ============ Partner Attributions ============

/// Insert a PENDING attribution unless the order already has an active one.
///
/// The partial unique index on (order_id) for non-cancelled rows makes this
/// safe under concurrent deliveries: the losing insert does nothing and `None`
/// is returned. Any other constraint violation is still an error.
pub fn try_create_attribution(
    conn: &Connection,
    input: &CreateAttribution,
) -> Result<Option<PartnerAttribution>> {
    let id = gen_id();
    let now = now();

    let affected = conn.execute(
        "INSERT INTO partner_attributions
            (id, partner_id, order_id, order_total_cents, commission_cents, rate_bps, tier, status, customer_email, customer_name, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT(order_id) WHERE status != 'cancelled' DO NOTHING",
        params![
            &id,
            &input.partner_id,
            &input.order_id,
            input.order_total_cents,
            input.commission_cents,
            input.rate_bps,
            &input.tier,
            AttributionStatus::Pending.as_ref(),
            &input.customer_email,
            &input.customer_name,
            now
        ],
    )?;

    if affected == 0 {
        return Ok(None);
    }

    Ok(Some(PartnerAttribution {
        id,
        partner_id: input.partner_id.clone(),
        order_id: input.order_id.clone(),
        order_total_cents: input.order_total_cents,
        commission_cents: input.commission_cents,
        rate_bps: input.rate_bps,
        tier: input.tier.clone(),
        status: AttributionStatus::Pending,
        customer_email: input.customer_email.clone(),
        customer_name: input.customer_name.clone(),
        created_at: now,
    }))
}

pub fn get_active_attribution_for_order(
    conn: &Connection,
    order_id: &str,
) -> Result<Option<PartnerAttribution>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM partner_attributions WHERE order_id = ?1 AND status != 'cancelled'",
            ATTRIBUTION_COLS
        ),
        &[&order_id],
    )
}

pub fn list_attributions_for_order(conn: &Connection, order_id: &str) -> Result<Vec<PartnerAttribution>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM partner_attributions WHERE order_id = ?1 ORDER BY created_at, rowid",
            ATTRIBUTION_COLS
        ),
        &[&order_id],
    )
}

/// Cancel every attribution for the order that is neither PAID nor already CANCELLED.
/// Returns the number of rows transitioned.
pub fn cancel_attributions_for_order(conn: &Connection, order_id: &str) -> Result<usize> {
    let affected = conn.execute(
        "UPDATE partner_attributions SET status = 'cancelled'
         WHERE order_id = ?1 AND status NOT IN ('paid', 'cancelled')",
        params![order_id],
    )?;
    Ok(affected)
}

/// Mark an attribution as paid. Used by the payout side and by tests.
pub fn mark_attribution_paid(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE partner_attributions SET status = 'paid' WHERE id = ?1 AND status = 'pending'",
        params![id],
    )?;
    Ok(affected > 0)
}
