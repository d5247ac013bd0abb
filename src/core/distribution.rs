//! Distribution calculator - Splits sale revenue into cost recovery, freight and profit.
//!
//! Everything here is pure integer arithmetic on cents. Proration of a partial
//! payment is proportional across the three components (never "cost first"). The
//! rounding cents are handed out with a divisor rule, so the prorated parts always
//! add up to the prorated total and no part ever shrinks as more is paid.

use serde::{Deserialize, Serialize};

use super::Amount;

/// One commercial line: what a unit sold for, what it cost, and its freight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Price per unit charged to the client
    pub unit_sale_price: Amount,
    /// Cost per unit
    pub unit_cost: Amount,
    /// Freight per unit
    pub unit_freight: Amount,
    /// Units
    pub quantity: i64,
}

/// The three-way split of revenue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    /// Goes to the vault
    pub cost_recovery: Amount,
    /// Goes to the freight account
    pub freight: Amount,
    /// Goes to the profit account
    pub profit: Amount,
}

impl Distribution {
    /// Sum of the three components.
    #[must_use]
    pub const fn total(&self) -> Amount {
        self.cost_recovery + self.freight + self.profit
    }

    /// Component-wise difference, used to turn two cumulative prorations into one increment.
    #[must_use]
    pub const fn minus(&self, other: &Self) -> Self {
        Self {
            cost_recovery: self.cost_recovery - other.cost_recovery,
            freight: self.freight - other.freight,
            profit: self.profit - other.profit,
        }
    }

    const fn components(&self) -> [Amount; 3] {
        [self.cost_recovery, self.freight, self.profit]
    }

    const fn from_components(parts: [Amount; 3]) -> Self {
        Self {
            cost_recovery: parts[0],
            freight: parts[1],
            profit: parts[2],
        }
    }
}

/// Distribution of a single line plus its revenue figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineDistribution {
    /// The split
    pub distribution: Distribution,
    /// `unit_sale_price × quantity`
    pub total_revenue: Amount,
    /// `profit / total_revenue × 100`, zero when there is no revenue
    pub margin_percent: f64,
}

/// Sum over several lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateDistribution {
    /// Summed split
    pub distribution: Distribution,
    /// Summed revenue
    pub total_revenue: Amount,
    /// Summed units
    pub quantity: i64,
}

/// Fraction of a total that has been paid, kept as an exact ratio.
///
/// Construction clamps the paid amount into `[0, total]`; a zero or negative
/// total yields a fraction of zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaidFraction {
    paid: Amount,
    total: Amount,
}

impl PaidFraction {
    /// `paid / total`, clamped to `[0, 1]`.
    #[must_use]
    pub fn new(paid: Amount, total: Amount) -> Self {
        if total <= 0 {
            return Self { paid: 0, total: 1 };
        }
        Self {
            paid: paid.clamp(0, total),
            total,
        }
    }

    /// Fully paid.
    #[must_use]
    pub const fn whole() -> Self {
        Self { paid: 1, total: 1 }
    }

    /// Numerator after clamping.
    #[must_use]
    pub const fn paid(&self) -> Amount {
        self.paid
    }

    /// Denominator.
    #[must_use]
    pub const fn total(&self) -> Amount {
        self.total
    }

    /// Approximate value for display.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        self.paid as f64 / self.total as f64
    }
}

/// Splits one line into cost recovery, freight and profit.
///
/// When `include_freight` is false the freight component is zero and the unit
/// freight is not deducted from profit.
#[must_use]
pub fn compute_line_distribution(item: &LineItem, include_freight: bool) -> LineDistribution {
    let unit_freight = if include_freight { item.unit_freight } else { 0 };
    let distribution = Distribution {
        cost_recovery: item.unit_cost * item.quantity,
        freight: unit_freight * item.quantity,
        profit: (item.unit_sale_price - item.unit_cost - unit_freight) * item.quantity,
    };
    let total_revenue = item.unit_sale_price * item.quantity;

    LineDistribution {
        distribution,
        total_revenue,
        margin_percent: margin_percent(distribution.profit, total_revenue),
    }
}

/// Sums the split, revenue and quantity of several lines.
#[must_use]
pub fn compute_aggregate_distribution(
    items: &[LineItem],
    include_freight: bool,
) -> AggregateDistribution {
    items
        .iter()
        .fold(AggregateDistribution::default(), |mut acc, item| {
            let line = compute_line_distribution(item, include_freight);
            acc.distribution.cost_recovery += line.distribution.cost_recovery;
            acc.distribution.freight += line.distribution.freight;
            acc.distribution.profit += line.distribution.profit;
            acc.total_revenue += line.total_revenue;
            acc.quantity += item.quantity;
            acc
        })
}

/// Scales every component by `fraction`.
///
/// Each component is first rounded down. Then the cents lost to rounding are handed
/// out one at a time to the component with the largest `component / (share + 1)`;
/// ties go to cost recovery, then freight, then profit. This is the D'Hondt
/// allocation of `floor(distribution.total() × fraction)` cents. Every component
/// is non-decreasing in the paid amount, and a whole fraction returns
/// `distribution` unchanged. Negative components are treated as zero.
#[must_use]
pub fn prorate(distribution: &Distribution, fraction: PaidFraction) -> Distribution {
    let paid = i128::from(fraction.paid());
    let total = i128::from(fraction.total());
    let parts = distribution.components().map(|part| i128::from(part.max(0)));

    let target = parts.iter().sum::<i128>() * paid / total;
    let mut shares = parts.map(|part| part * paid / total);

    // At most two cents are left after flooring three components
    let mut leftover = target - shares.iter().sum::<i128>();
    while leftover > 0 {
        let mut best = 0;
        for candidate in 1..shares.len() {
            // parts[c] / (shares[c] + 1) > parts[best] / (shares[best] + 1)
            if parts[candidate] * (shares[best] + 1) > parts[best] * (shares[candidate] + 1) {
                best = candidate;
            }
        }
        shares[best] += 1;
        leftover -= 1;
    }

    // Bounded by the input components, so narrowing back cannot overflow.
    #[allow(clippy::cast_possible_truncation)]
    Distribution::from_components(shares.map(|part| part as Amount))
}

/// The part of `full` that a payment moving the paid amount from `paid_before`
/// to `paid_after` (out of `total`) should credit.
///
/// Computed as the difference of two cumulative prorations, so a sale paid in
/// any number of instalments credits exactly `full` once settled.
#[must_use]
pub fn prorate_increment(
    full: &Distribution,
    total: Amount,
    paid_before: Amount,
    paid_after: Amount,
) -> Distribution {
    let after = prorate(full, PaidFraction::new(paid_after, total));
    let before = prorate(full, PaidFraction::new(paid_before, total));
    after.minus(&before)
}

#[allow(clippy::cast_precision_loss)]
fn margin_percent(profit: Amount, total_revenue: Amount) -> f64 {
    if total_revenue == 0 {
        return 0.0;
    }
    (profit as f64 * 100.0) / total_revenue as f64
}
