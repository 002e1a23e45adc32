use rusqlite::Connection;

/// Initialize the database schema
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Storefront customer accounts (existence check only)
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE COLLATE NOCASE,
            name TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        -- Affiliate partners (onboarded elsewhere, read-only here)
        -- tiers: JSON array of {label, min_order_cents, rate_bps}
        CREATE TABLE IF NOT EXISTS partners (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            referral_code TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL CHECK (status IN ('pending', 'approved', 'rejected', 'suspended')),
            base_rate_bps INTEGER NOT NULL CHECK (base_rate_bps >= 0),
            tiers TEXT NOT NULL DEFAULT '[]',
            created_at INTEGER NOT NULL
        );

        -- Tracked visits carrying a referral code (append-only)
        -- converted_at and order_id are both NULL or both set
        CREATE TABLE IF NOT EXISTS referral_visits (
            id TEXT PRIMARY KEY,
            referral_code TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            converted_at INTEGER,
            order_id TEXT,
            CHECK ((converted_at IS NULL) = (order_id IS NULL))
        );
        CREATE INDEX IF NOT EXISTS idx_referral_visits_unconverted
            ON referral_visits(created_at) WHERE converted_at IS NULL;
        CREATE INDEX IF NOT EXISTS idx_referral_visits_code ON referral_visits(referral_code);

        -- Commission claims, one active row per platform order
        CREATE TABLE IF NOT EXISTS partner_attributions (
            id TEXT PRIMARY KEY,
            partner_id TEXT NOT NULL REFERENCES partners(id),
            order_id TEXT NOT NULL,
            order_total_cents INTEGER NOT NULL CHECK (order_total_cents > 0),
            commission_cents INTEGER NOT NULL CHECK (commission_cents >= 0),
            rate_bps INTEGER NOT NULL CHECK (rate_bps >= 0),
            tier TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('pending', 'paid', 'cancelled')),
            customer_email TEXT NOT NULL,
            customer_name TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_partner_attributions_partner ON partner_attributions(partner_id);
        CREATE INDEX IF NOT EXISTS idx_partner_attributions_order ON partner_attributions(order_id);
        -- Idempotency boundary: concurrent or repeated deliveries cannot create a second active row
        CREATE UNIQUE INDEX IF NOT EXISTS idx_partner_attributions_active_order
            ON partner_attributions(order_id) WHERE status != 'cancelled';
        "#,
    )
}
