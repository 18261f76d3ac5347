//! Initial database migration.
//!
//! Creates the workflow enums, core tables, indexes, and the
//! `updated_at` trigger.

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
        // PART 2: BUDGET LEDGER
        // ============================================================
        db.execute_unprepared(BUDGETS_SQL).await?;

        // ============================================================
        // PART 3: EXPENSE REPORTS & ITEMS
        // ============================================================
        db.execute_unprepared(EXPENSE_REPORTS_SQL).await?;
        db.execute_unprepared(EXPENSE_ITEMS_SQL).await?;

        // ============================================================
        // PART 4: APPROVAL TRAIL
        // ============================================================
        db.execute_unprepared(APPROVALS_SQL).await?;

        // ============================================================
        // PART 5: REIMBURSEMENT PAYMENTS
        // ============================================================
        db.execute_unprepared(REIMBURSEMENT_PAYMENTS_SQL).await?;

        // ============================================================
        // PART 6: TRIGGERS & FUNCTIONS
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
-- Report workflow status
CREATE TYPE report_status AS ENUM (
    'submitted',
    'approved',
    'rejected',
    'pending_ceo_approval'
);

-- Budget check verdict
CREATE TYPE budget_check_status AS ENUM (
    'within_budget',
    'over_budget'
);

-- Approval pipeline stage
CREATE TYPE approval_stage AS ENUM (
    'manager',
    'ceo',
    'finance'
);

-- Approval decision
CREATE TYPE approval_decision AS ENUM (
    'pending',
    'approved',
    'rejected'
);
";

const BUDGETS_SQL: &str = r"
CREATE TABLE budgets (
    id UUID PRIMARY KEY,
    category TEXT NOT NULL UNIQUE,
    allocated NUMERIC(18,2) NOT NULL CHECK (allocated >= 0),
    spent NUMERIC(18,2) NOT NULL DEFAULT 0 CHECK (spent >= 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const EXPENSE_REPORTS_SQL: &str = r"
CREATE TABLE expense_reports (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL,
    submission_date TIMESTAMPTZ NOT NULL DEFAULT now(),
    status report_status NOT NULL DEFAULT 'submitted',
    budget_check budget_check_status NOT NULL DEFAULT 'within_budget',
    total_amount NUMERIC(18,2) NOT NULL DEFAULT 0,
    forwarded_to_ceo BOOLEAN NOT NULL DEFAULT FALSE,
    ceo_approved BOOLEAN NOT NULL DEFAULT FALSE,
    reimbursed BOOLEAN NOT NULL DEFAULT FALSE,
    spend_posted BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_expense_reports_user ON expense_reports(user_id);
CREATE INDEX idx_expense_reports_status ON expense_reports(status);
-- Reimbursement queue scan: approved, unreimbursed reports.
CREATE INDEX idx_expense_reports_queue
    ON expense_reports(status, reimbursed)
    WHERE status = 'approved' AND reimbursed = FALSE;
";

const EXPENSE_ITEMS_SQL: &str = r"
CREATE TABLE expense_items (
    id UUID PRIMARY KEY,
    report_id UUID NOT NULL REFERENCES expense_reports(id) ON DELETE CASCADE,
    category TEXT NOT NULL,
    amount NUMERIC(18,2) NOT NULL CHECK (amount > 0),
    expense_date DATE NOT NULL,
    description TEXT,
    receipt_ref TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_expense_items_report ON expense_items(report_id);
-- Monthly category spend query.
CREATE INDEX idx_expense_items_category_date ON expense_items(category, expense_date);
";

const APPROVALS_SQL: &str = r"
CREATE TABLE approvals (
    id UUID PRIMARY KEY,
    report_id UUID NOT NULL REFERENCES expense_reports(id) ON DELETE CASCADE,
    approver_id UUID NOT NULL,
    stage approval_stage NOT NULL,
    decision approval_decision NOT NULL,
    remarks TEXT,
    decided_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    superseded BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_approvals_report ON approvals(report_id, superseded, decided_at);
";

const REIMBURSEMENT_PAYMENTS_SQL: &str = r"
CREATE TABLE reimbursement_payments (
    id UUID PRIMARY KEY,
    report_id UUID NOT NULL REFERENCES expense_reports(id) ON DELETE CASCADE,
    session_id TEXT NOT NULL,
    checkout_url TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'unpaid',
    amount NUMERIC(18,2) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    paid_at TIMESTAMPTZ,
    processed_by UUID,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_reimbursement_payments_report ON reimbursement_payments(report_id);
CREATE INDEX idx_reimbursement_payments_session ON reimbursement_payments(session_id);
-- One active session per report.
CREATE UNIQUE INDEX idx_reimbursement_payments_active
    ON reimbursement_payments(report_id)
    WHERE status <> 'expired';
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_budgets_updated_at
    BEFORE UPDATE ON budgets
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_expense_reports_updated_at
    BEFORE UPDATE ON expense_reports
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_reimbursement_payments_updated_at
    BEFORE UPDATE ON reimbursement_payments
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS reimbursement_payments CASCADE;
DROP TABLE IF EXISTS approvals CASCADE;
DROP TABLE IF EXISTS expense_items CASCADE;
DROP TABLE IF EXISTS expense_reports CASCADE;
DROP TABLE IF EXISTS budgets CASCADE;

DROP FUNCTION IF EXISTS set_updated_at CASCADE;

DROP TYPE IF EXISTS approval_decision;
DROP TYPE IF EXISTS approval_stage;
DROP TYPE IF EXISTS budget_check_status;
DROP TYPE IF EXISTS report_status;
";
