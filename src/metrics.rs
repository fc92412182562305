use crate::types::Row;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BillingCycle {
    Monthly,
    Annual,
    Other,
}

impl BillingCycle {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "monthly" => Self::Monthly,
            "annual" => Self::Annual,
            _ => Self::Other,
        }
    }

    /// Portion of a stored recurring amount that counts toward one month.
    /// Annual amounts are spread over twelve months; anything else is taken
    /// as already monthly.
    pub fn monthly_equivalent(self: &Self, amount: f64) -> f64 {
        match self {
            Self::Annual => amount / 12.0,
            Self::Monthly | Self::Other => amount,
        }
    }
}

/// `numerator / denominator * 100`, with an empty denominator yielding 0.
pub fn percentage(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator * 100.0 / denominator
    }
}

/// Sums `amount` over rows of `(billing_cycle, amount)`, normalizing each
/// cycle to a monthly figure. Null amounts contribute nothing.
pub fn monthly_recurring_revenue(rows: &[Row]) -> f64 {
    rows.iter()
        .map(|row: &Row| {
            let cycle = row
                .get("billing_cycle")
                .and_then(|value| value.as_text())
                .map(BillingCycle::from_label)
                .unwrap_or(BillingCycle::Other);
            let amount = row
                .get("amount")
                .and_then(|value| value.as_f64())
                .unwrap_or(0.0);

            cycle.monthly_equivalent(amount)
        })
        .sum()
}

pub fn annual_recurring_revenue(monthly: f64) -> f64 {
    monthly * 12.0
}
