//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to rusqlite errors.
///
/// A corrupted status value surfaces as a query error instead of a panic.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const PARTNER_COLS: &str =
    "id, name, referral_code, status, base_rate_bps, tiers, created_at";

pub const REFERRAL_VISIT_COLS: &str = "id, referral_code, created_at, converted_at, order_id";

pub const ATTRIBUTION_COLS: &str = "id, partner_id, order_id, order_total_cents, commission_cents, rate_bps, tier, status, customer_email, customer_name, created_at";

// ============ FromRow Implementations ============

impl FromRow for Partner {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let tiers_str: String = row.get(5)?;
        let tiers = serde_json::from_str(&tiers_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(Partner {
            id: row.get(0)?,
            name: row.get(1)?,
            referral_code: row.get(2)?,
            status: parse_enum(row, 3, "status")?,
            base_rate_bps: row.get(4)?,
            tiers,
            created_at: row.get(6)?,
        })
    }
}

impl FromRow for ReferralVisit {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ReferralVisit {
            id: row.get(0)?,
            referral_code: row.get(1)?,
            created_at: row.get(2)?,
            converted_at: row.get(3)?,
            order_id: row.get(4)?,
        })
    }
}

impl FromRow for PartnerAttribution {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(PartnerAttribution {
            id: row.get(0)?,
            partner_id: row.get(1)?,
            order_id: row.get(2)?,
            order_total_cents: row.get(3)?,
            commission_cents: row.get(4)?,
            rate_bps: row.get(5)?,
            tier: row.get(6)?,
            status: parse_enum(row, 7, "status")?,
            customer_email: row.get(8)?,
            customer_name: row.get(9)?,
            created_at: row.get(10)?,
        })
    }
}
