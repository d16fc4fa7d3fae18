//! Property-based tests for ledgerfmt-core.
//!
//! Run with: cargo test -p ledgerfmt-core --test `property_tests`

use ledgerfmt_core::{Amount, Balance};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn arb_decimal() -> impl Strategy<Value = Decimal> {
    (-1_000_000i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_commodity() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("$".to_string()),
        Just("EUR".to_string()),
        Just("AAPL".to_string()),
        Just(String::new()),
    ]
}

fn arb_amount() -> impl Strategy<Value = Amount> {
    (arb_decimal(), arb_commodity()).prop_map(|(n, c)| Amount::new(n, c))
}

proptest! {
    #[test]
    fn balance_never_holds_zero_buckets(amounts in prop::collection::vec(arb_amount(), 0..20)) {
        let balance = Balance::from_amounts(&amounts).unwrap();
        for amount in balance.amounts() {
            prop_assert!(!amount.is_zero());
        }
    }

    #[test]
    fn balance_add_then_subtract_is_identity(
        start in prop::collection::vec(arb_amount(), 0..10),
        delta in prop::collection::vec(arb_amount(), 0..10),
    ) {
        let original = Balance::from_amounts(&start).unwrap();
        let delta = Balance::from_amounts(&delta).unwrap();

        let balance = original.checked_add(&delta).unwrap().checked_sub(&delta).unwrap();
        prop_assert_eq!(balance, original);
    }

    #[test]
    fn balance_sum_is_order_independent(amounts in prop::collection::vec(arb_amount(), 0..20)) {
        let forward = Balance::from_amounts(&amounts).unwrap();
        let backward = Balance::from_amounts(amounts.iter().rev()).unwrap();
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn amount_display_parses_back(amount in arb_amount()) {
        let parsed: Amount = amount.to_string().parse().unwrap();
        prop_assert_eq!(parsed, amount);
    }

    #[test]
    fn to_text_first_line_is_at_least_width(
        amounts in prop::collection::vec(arb_amount(), 0..5),
        width in 0usize..30,
    ) {
        let balance = Balance::from_amounts(&amounts).unwrap();
        let text = balance.to_text(width, width);
        let first = text.lines().next().unwrap_or("");
        prop_assert!(first.chars().count() >= width);
    }
}
