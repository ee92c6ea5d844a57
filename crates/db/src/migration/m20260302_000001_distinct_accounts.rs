//! Ledger account distinctness migration.
//!
//! Replaces the commit-time balance check so that a ledger must also touch
//! at least two distinct accounts.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(CHECK_DISTINCT_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(CHECK_BALANCE_ONLY_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const CHECK_DISTINCT_SQL: &str = r"
-- Every ledger has at least two entries on at least two accounts,
-- summing to zero, checked at commit
CREATE OR REPLACE FUNCTION check_ledger_balance()
RETURNS TRIGGER AS $$
DECLARE
    target_id BIGINT;
    target_time TIMESTAMPTZ;
    entry_count BIGINT;
    account_count BIGINT;
    entry_sum NUMERIC(18, 2);
BEGIN
    IF TG_TABLE_NAME = 'ledger' THEN
        target_id := NEW.id;
        target_time := NEW.time;
    ELSE
        target_id := NEW.ledger_id;
        target_time := NEW.ledger_time;
    END IF;

    SELECT COUNT(*), COUNT(DISTINCT account_id), COALESCE(SUM(amount), 0)
    INTO entry_count, account_count, entry_sum
    FROM ledger_entries
    WHERE ledger_id = target_id AND ledger_time = target_time;

    IF entry_count < 2 THEN
        RAISE EXCEPTION 'Ledger % must have at least 2 entries, has %',
            target_id, entry_count;
    END IF;

    IF account_count < 2 THEN
        RAISE EXCEPTION 'Ledger % must touch at least 2 accounts, touches %',
            target_id, account_count;
    END IF;

    IF entry_sum <> 0 THEN
        RAISE EXCEPTION 'Ledger % is not balanced, entries sum to %',
            target_id, entry_sum;
    END IF;

    RETURN NULL;
END;
$$ LANGUAGE plpgsql;
";

const CHECK_BALANCE_ONLY_SQL: &str = r"
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
";
