//! Property-based tests for the budget ledger classifier.

use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::budget::ledger::BudgetLedger;
use crate::budget::types::CategoryProjection;
use crate::report::types::BudgetCheckStatus;

/// Strategy for non-negative currency amounts (2 decimal places).
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for optional allocations.
fn arb_allocation() -> impl Strategy<Value = Option<Decimal>> {
    prop_oneof![Just(None), arb_amount().prop_map(Some)]
}

/// Strategy for a single category projection.
fn arb_projection() -> impl Strategy<Value = CategoryProjection> {
    ("[A-Za-z]{1,12}", arb_allocation(), arb_amount(), arb_amount()).prop_map(
        |(category, allocated, month_spent, report_amount)| CategoryProjection {
            category,
            allocated,
            month_spent,
            report_amount,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The report classification agrees with the per-category predicate.
    #[test]
    fn prop_classification_matches_any_exceeding_category(
        projections in prop::collection::vec(arb_projection(), 0..8)
    ) {
        let expected = if projections.iter().any(BudgetLedger::would_exceed) {
            BudgetCheckStatus::OverBudget
        } else {
            BudgetCheckStatus::WithinBudget
        };
        prop_assert_eq!(BudgetLedger::classify(&projections), expected);
    }

    /// Categories without a budget row never trip the check.
    #[test]
    fn prop_no_limit_never_exceeds(
        month_spent in arb_amount(),
        report_amount in arb_amount()
    ) {
        let p = CategoryProjection {
            category: "Anything".to_string(),
            allocated: None,
            month_spent,
            report_amount,
        };
        prop_assert!(!BudgetLedger::would_exceed(&p));
    }

    /// Exactly consuming the allocation stays within budget (strict inequality).
    #[test]
    fn prop_boundary_equality_is_within(allocated in arb_amount(), month_spent in arb_amount()) {
        prop_assume!(month_spent <= allocated);
        let p = CategoryProjection {
            category: "Fuel".to_string(),
            allocated: Some(allocated),
            month_spent,
            report_amount: allocated - month_spent,
        };
        prop_assert!(!BudgetLedger::would_exceed(&p));
    }

    /// One extra cent over the allocation flips the check.
    #[test]
    fn prop_one_cent_over_exceeds(allocated in arb_amount(), month_spent in arb_amount()) {
        prop_assume!(month_spent <= allocated);
        let p = CategoryProjection {
            category: "Fuel".to_string(),
            allocated: Some(allocated),
            month_spent,
            report_amount: allocated - month_spent + Decimal::new(1, 2),
        };
        prop_assert!(BudgetLedger::would_exceed(&p));
    }

    /// The exceedance breakdown preserves order and the classifier verdict.
    #[test]
    fn prop_exceedance_consistent_with_classify(
        projections in prop::collection::vec(arb_projection(), 0..8)
    ) {
        let verdict = BudgetLedger::classify(&projections);
        let rows = BudgetLedger::exceedance(projections.clone());

        prop_assert_eq!(rows.len(), projections.len());
        for (row, p) in rows.iter().zip(projections.iter()) {
            prop_assert_eq!(&row.category, &p.category);
            prop_assert_eq!(row.projected_total, p.month_spent + p.report_amount);
        }

        let any_over = rows.iter().any(|r| r.over_budget);
        prop_assert_eq!(any_over, verdict == BudgetCheckStatus::OverBudget);
    }
}
