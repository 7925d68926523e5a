//! Initial migration: the four ledger tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(INITIAL_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS transactions;
             DROP TABLE IF EXISTS journals;
             DROP TABLE IF EXISTS accounts;
             DROP TABLE IF EXISTS currencies;",
        )
        .await?;
        Ok(())
    }
}

const INITIAL_SQL: &str = r"
CREATE TABLE currencies (
    code VARCHAR(10) PRIMARY KEY,
    name VARCHAR(30) NOT NULL,
    exchange DOUBLE PRECISION NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    created_by VARCHAR(16) NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_by VARCHAR(16) NOT NULL,
    is_deleted BOOLEAN NOT NULL DEFAULT false
);

CREATE TABLE accounts (
    account_number VARCHAR(20) PRIMARY KEY,
    name VARCHAR(128) NOT NULL,
    currency_code VARCHAR(10) NOT NULL REFERENCES currencies(code),
    description VARCHAR(255) NOT NULL,
    alignment VARCHAR(6) NOT NULL CHECK (alignment IN ('DEBIT', 'CREDIT')),
    balance BIGINT NOT NULL DEFAULT 0,
    coa VARCHAR(10) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    created_by VARCHAR(16) NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_by VARCHAR(16) NOT NULL,
    is_deleted BOOLEAN NOT NULL DEFAULT false
);

CREATE INDEX idx_accounts_name ON accounts(name) WHERE is_deleted = false;
CREATE INDEX idx_accounts_coa ON accounts(coa) WHERE is_deleted = false;

CREATE TABLE journals (
    journal_id VARCHAR(32) PRIMARY KEY,
    journaling_time TIMESTAMPTZ NOT NULL,
    description VARCHAR(255) NOT NULL,
    is_reversal BOOLEAN NOT NULL DEFAULT false,
    reversed_journal_id VARCHAR(32) REFERENCES journals(journal_id),
    total_amount BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    created_by VARCHAR(16) NOT NULL,
    is_deleted BOOLEAN NOT NULL DEFAULT false
);

-- A journal can be the target of at most one reversal.
CREATE UNIQUE INDEX uq_journals_reversed ON journals(reversed_journal_id)
    WHERE reversed_journal_id IS NOT NULL;
CREATE INDEX idx_journals_time ON journals(journaling_time) WHERE is_deleted = false;

CREATE TABLE transactions (
    transaction_id VARCHAR(32) PRIMARY KEY,
    transaction_time TIMESTAMPTZ NOT NULL,
    account_number VARCHAR(20) NOT NULL REFERENCES accounts(account_number),
    journal_id VARCHAR(32) NOT NULL REFERENCES journals(journal_id),
    description VARCHAR(255) NOT NULL,
    alignment VARCHAR(6) NOT NULL CHECK (alignment IN ('DEBIT', 'CREDIT')),
    -- Amount sign is rejected in the posting pipeline; the CHECK is a backstop.
    amount BIGINT NOT NULL CHECK (amount >= 0),
    balance BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    created_by VARCHAR(16) NOT NULL,
    is_deleted BOOLEAN NOT NULL DEFAULT false,
    seq BIGSERIAL
);

CREATE INDEX idx_transactions_account_time
    ON transactions(account_number, transaction_time) WHERE is_deleted = false;
CREATE INDEX idx_transactions_journal ON transactions(journal_id) WHERE is_deleted = false;
";
