//! Ledger schema migration.
//!
//! Creates the account type enum, the company, gift card, account and
//! ledger tables, their indexes, and the triggers that keep the ledger
//! balanced and append-only.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: OWNERS
        // ============================================================
        db.execute_unprepared(COMPANIES_SQL).await?;
        db.execute_unprepared(GIFT_CARDS_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 3: LEDGER
        // ============================================================
        db.execute_unprepared(LEDGER_SQL).await?;
        db.execute_unprepared(LEDGER_ENTRIES_SQL).await?;

        // ============================================================
        // PART 4: INVARIANT TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE account_type AS ENUM ('company', 'gift_card', 'generic_in', 'generic_out');
";

const COMPANIES_SQL: &str = r"
CREATE TABLE companies (
    id SERIAL PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    metadata JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    deleted_at TIMESTAMPTZ
);
";

const GIFT_CARDS_SQL: &str = r"
CREATE TABLE gift_cards (
    id BIGSERIAL PRIMARY KEY,
    code VARCHAR(64) NOT NULL,
    company_id INTEGER NOT NULL REFERENCES companies(id),
    name VARCHAR(255) NOT NULL,
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    deleted_at TIMESTAMPTZ,

    CONSTRAINT gift_cards_code_key UNIQUE (code)
);

CREATE INDEX idx_gift_cards_company ON gift_cards(company_id, created_at DESC, id DESC)
    WHERE deleted_at IS NULL;
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id BIGSERIAL PRIMARY KEY,
    type account_type NOT NULL,
    company_id INTEGER NOT NULL REFERENCES companies(id),
    gift_card_id BIGINT REFERENCES gift_cards(id),
    allowed_credit NUMERIC(18, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    deleted_at TIMESTAMPTZ,

    CONSTRAINT chk_accounts_gift_card_ref CHECK ((type = 'gift_card') = (gift_card_id IS NOT NULL)),
    CONSTRAINT chk_accounts_allowed_credit CHECK (allowed_credit >= 0)
);

-- One account per gift card, ever
CREATE UNIQUE INDEX uq_accounts_gift_card ON accounts(gift_card_id)
    WHERE gift_card_id IS NOT NULL;

-- At most one live company / generic_in / generic_out account per company
CREATE UNIQUE INDEX uq_accounts_company_fixed_type ON accounts(company_id, type)
    WHERE type <> 'gift_card' AND deleted_at IS NULL;

CREATE INDEX idx_accounts_company ON accounts(company_id)
    WHERE deleted_at IS NULL;
";

const LEDGER_SQL: &str = r"
CREATE TABLE ledger (
    id BIGSERIAL NOT NULL,
    time TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp(),
    company_id INTEGER NOT NULL REFERENCES companies(id),
    description TEXT,

    PRIMARY KEY (id, time)
);

CREATE INDEX idx_ledger_company_time ON ledger(company_id, time DESC);
CREATE INDEX idx_ledger_time ON ledger(time DESC);
";

const LEDGER_ENTRIES_SQL: &str = r"
CREATE TABLE ledger_entries (
    id BIGSERIAL PRIMARY KEY,
    ledger_id BIGINT NOT NULL,
    ledger_time TIMESTAMPTZ NOT NULL,
    account_id BIGINT NOT NULL REFERENCES accounts(id),
    amount NUMERIC(18, 2) NOT NULL,

    CONSTRAINT fk_ledger_entries_ledger
        FOREIGN KEY (ledger_id, ledger_time) REFERENCES ledger(id, time),
    CONSTRAINT chk_ledger_entries_nonzero CHECK (amount <> 0)
);

CREATE INDEX idx_ledger_entries_account ON ledger_entries(account_id);
CREATE INDEX idx_ledger_entries_ledger ON ledger_entries(ledger_id);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: check_ledger_balance
-- Every ledger has at least two entries summing to zero, checked at commit
-- ============================================================
CREATE OR REPLACE FUNCTION check_ledger_balance()
RETURNS TRIGGER AS $$
DECLARE
    target_id BIGINT;
    target_time TIMESTAMPTZ;
    entry_count BIGINT;
    entry_sum NUMERIC(18, 2);
BEGIN
    IF TG_TABLE_NAME = 'ledger' THEN
        target_id := NEW.id;
        target_time := NEW.time;
    ELSE
        target_id := NEW.ledger_id;
        target_time := NEW.ledger_time;
    END IF;

    SELECT COUNT(*), COALESCE(SUM(amount), 0)
    INTO entry_count, entry_sum
    FROM ledger_entries
    WHERE ledger_id = target_id AND ledger_time = target_time;

    IF entry_count < 2 THEN
        RAISE EXCEPTION 'Ledger % must have at least 2 entries, has %',
            target_id, entry_count;
    END IF;

    IF entry_sum <> 0 THEN
        RAISE EXCEPTION 'Ledger % is not balanced, entries sum to %',
            target_id, entry_sum;
    END IF;

    RETURN NULL;
END;
$$ LANGUAGE plpgsql;

CREATE CONSTRAINT TRIGGER trg_check_ledger_balance
AFTER INSERT ON ledger
DEFERRABLE INITIALLY DEFERRED
FOR EACH ROW
EXECUTE FUNCTION check_ledger_balance();

CREATE CONSTRAINT TRIGGER trg_check_entry_balance
AFTER INSERT ON ledger_entries
DEFERRABLE INITIALLY DEFERRED
FOR EACH ROW
EXECUTE FUNCTION check_ledger_balance();

-- ============================================================
-- FUNCTION: prevent_ledger_modification
-- Ledger rows are append-only; corrections are new offsetting events
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_ledger_modification()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION '% is append-only, % rejected', TG_TABLE_NAME, TG_OP;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_ledger_immutable
BEFORE UPDATE OR DELETE ON ledger
FOR EACH ROW
EXECUTE FUNCTION prevent_ledger_modification();

CREATE TRIGGER trg_ledger_no_truncate
BEFORE TRUNCATE ON ledger
FOR EACH STATEMENT
EXECUTE FUNCTION prevent_ledger_modification();

CREATE TRIGGER trg_ledger_entries_immutable
BEFORE UPDATE OR DELETE ON ledger_entries
FOR EACH ROW
EXECUTE FUNCTION prevent_ledger_modification();

CREATE TRIGGER trg_ledger_entries_no_truncate
BEFORE TRUNCATE ON ledger_entries
FOR EACH STATEMENT
EXECUTE FUNCTION prevent_ledger_modification();

-- ============================================================
-- FUNCTION: check_entry_account
-- Entries may only post to live accounts of the ledger's company
-- ============================================================
CREATE OR REPLACE FUNCTION check_entry_account()
RETURNS TRIGGER AS $$
DECLARE
    account_deleted_at TIMESTAMPTZ;
    account_company INTEGER;
    ledger_company INTEGER;
BEGIN
    SELECT a.deleted_at, a.company_id
    INTO account_deleted_at, account_company
    FROM accounts a
    WHERE a.id = NEW.account_id;

    IF account_deleted_at IS NOT NULL THEN
        RAISE EXCEPTION 'Account % is deleted', NEW.account_id;
    END IF;

    SELECT l.company_id INTO ledger_company
    FROM ledger l
    WHERE l.id = NEW.ledger_id AND l.time = NEW.ledger_time;

    IF account_company IS DISTINCT FROM ledger_company THEN
        RAISE EXCEPTION 'Account % does not belong to company of ledger %',
            NEW.account_id, NEW.ledger_id;
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_check_entry_account
BEFORE INSERT ON ledger_entries
FOR EACH ROW
EXECUTE FUNCTION check_entry_account();
";

const DROP_ALL_SQL: &str = r"
-- Drop triggers
DROP TRIGGER IF EXISTS trg_check_entry_account ON ledger_entries;
DROP TRIGGER IF EXISTS trg_ledger_entries_no_truncate ON ledger_entries;
DROP TRIGGER IF EXISTS trg_ledger_entries_immutable ON ledger_entries;
DROP TRIGGER IF EXISTS trg_ledger_no_truncate ON ledger;
DROP TRIGGER IF EXISTS trg_ledger_immutable ON ledger;
DROP TRIGGER IF EXISTS trg_check_entry_balance ON ledger_entries;
DROP TRIGGER IF EXISTS trg_check_ledger_balance ON ledger;

-- Drop functions
DROP FUNCTION IF EXISTS check_entry_account();
DROP FUNCTION IF EXISTS prevent_ledger_modification();
DROP FUNCTION IF EXISTS check_ledger_balance();

-- Drop tables (reverse order of creation)
DROP TABLE IF EXISTS ledger_entries CASCADE;
DROP TABLE IF EXISTS ledger CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP TABLE IF EXISTS gift_cards CASCADE;
DROP TABLE IF EXISTS companies CASCADE;

-- Drop enums
DROP TYPE IF EXISTS account_type CASCADE;
";
