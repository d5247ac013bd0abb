//! Property-based tests for the distribution calculator.

use proptest::prelude::*;

use super::distribution::{
    Distribution, LineItem, PaidFraction, compute_line_distribution, prorate, prorate_increment,
};

/// A line priced at or above cost plus freight, amounts up to 100,000.00.
fn profitable_line() -> impl Strategy<Value = LineItem> {
    (0i64..5_000_000, 0i64..100_000, 0i64..5_000_000, 1i64..1_000).prop_map(
        |(unit_cost, unit_freight, markup, quantity)| LineItem {
            unit_sale_price: unit_cost + unit_freight + markup,
            unit_cost,
            unit_freight,
            quantity,
        },
    )
}

fn non_negative_distribution() -> impl Strategy<Value = Distribution> {
    (0i64..100_000_000, 0i64..100_000_000, 0i64..100_000_000).prop_map(
        |(cost_recovery, freight, profit)| Distribution {
            cost_recovery,
            freight,
            profit,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The split always adds back up to the revenue, with or without freight.
    #[test]
    fn prop_split_sums_to_revenue(item in profitable_line(), include_freight in any::<bool>()) {
        let line = compute_line_distribution(&item, include_freight);
        prop_assert_eq!(line.distribution.total(), line.total_revenue);
        prop_assert_eq!(line.total_revenue, item.unit_sale_price * item.quantity);
        prop_assert!(line.distribution.profit >= 0);
    }

    /// Halving the fraction halves every component when the components are even.
    #[test]
    fn prop_prorate_is_linear(half in (0i64..50_000_000, 0i64..50_000_000, 0i64..50_000_000)) {
        let full = Distribution {
            cost_recovery: half.0 * 2,
            freight: half.1 * 2,
            profit: half.2 * 2,
        };
        let whole = prorate(&full, PaidFraction::new(1, 1));
        let halved = prorate(&full, PaidFraction::new(1, 2));

        prop_assert_eq!(whole, full);
        prop_assert_eq!(halved.cost_recovery * 2, whole.cost_recovery);
        prop_assert_eq!(halved.freight * 2, whole.freight);
        prop_assert_eq!(halved.profit * 2, whole.profit);
    }

    /// Prorated parts sum to the exact prorated total and never exceed their component.
    #[test]
    fn prop_prorate_sums_exactly(
        full in non_negative_distribution(),
        paid in 0i64..1_000_000,
        extra in 0i64..1_000_000,
    ) {
        let total = paid + extra + 1;
        let part = prorate(&full, PaidFraction::new(paid, total));

        let expected = i128::from(full.total()) * i128::from(paid) / i128::from(total);
        prop_assert_eq!(i128::from(part.total()), expected);
        prop_assert!(part.cost_recovery >= 0 && part.cost_recovery <= full.cost_recovery);
        prop_assert!(part.freight >= 0 && part.freight <= full.freight);
        prop_assert!(part.profit >= 0 && part.profit <= full.profit);
    }

    /// Any sequence of instalments that settles the sale credits the full split exactly.
    #[test]
    fn prop_instalments_settle_exactly(
        item in profitable_line(),
        cuts in proptest::collection::vec(1u32..100, 1..8),
    ) {
        let line = compute_line_distribution(&item, true);
        let total = line.total_revenue;
        let weight: i64 = cuts.iter().map(|c| i64::from(*c)).sum();

        let mut paid = 0;
        let mut credited = Distribution::default();
        for (i, cut) in cuts.iter().enumerate() {
            let next = if i + 1 == cuts.len() {
                total
            } else {
                (paid + total * i64::from(*cut) / weight).min(total)
            };
            let step = prorate_increment(&line.distribution, total, paid, next);
            prop_assert_eq!(step.total(), next - paid);
            credited.cost_recovery += step.cost_recovery;
            credited.freight += step.freight;
            credited.profit += step.profit;
            paid = next;
        }
        prop_assert_eq!(credited, line.distribution);
    }

    /// Each one-cent step credits one cent to exactly one component and takes from none.
    #[test]
    fn prop_increments_never_negative(
        item in profitable_line(),
        start in 0u32..=1_000,
        steps in 1i64..200,
    ) {
        let line = compute_line_distribution(&item, true);
        let total = line.total_revenue;
        let mut paid = total * i64::from(start) / 1_000;
        for _ in 0..steps {
            if paid >= total {
                break;
            }
            let step = prorate_increment(&line.distribution, total, paid, paid + 1);
            prop_assert!(step.cost_recovery >= 0);
            prop_assert!(step.freight >= 0);
            prop_assert!(step.profit >= 0);
            prop_assert_eq!(step.total(), 1);
            paid += 1;
        }
    }

    /// Prorating is monotone: paying more never lowers any component.
    #[test]
    fn prop_prorate_is_monotone(
        full in non_negative_distribution(),
        total in 1i64..10_000_000,
        a in 0i64..10_000_000,
        b in 0i64..10_000_000,
    ) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let less = prorate(&full, PaidFraction::new(low, total));
        let more = prorate(&full, PaidFraction::new(high, total));
        prop_assert!(less.cost_recovery <= more.cost_recovery);
        prop_assert!(less.freight <= more.freight);
        prop_assert!(less.profit <= more.profit);
    }
}
