use chrono::NaiveDateTime;
use heck::ToTitleCase;

/// Inserts `,` between every group of three digits.
fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    grouped
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    match value {
        Some(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// `$1,234.50`; missing values render as `$0.00`.
pub fn format_currency(amount: Option<f64>) -> String {
    let amount = finite_or_zero(amount);
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };

    format!("${}{}.{}", sign, group_thousands(whole), cents)
}

/// `12.34%`; missing values render as `0.00%`.
pub fn format_percentage(value: Option<f64>) -> String {
    format!("{:.2}%", finite_or_zero(value))
}

/// `12,345`; missing values render as `0`.
pub fn format_number(value: Option<i64>) -> String {
    let value = value.unwrap_or(0);
    let digits = value.unsigned_abs().to_string();

    if value < 0 {
        format!("-{}", group_thousands(&digits))
    } else {
        group_thousands(&digits)
    }
}

/// `paid_search` -> `Paid Search`, `b2b_partners` -> `B2B Partners`.
///
/// A letter that follows a digit starts a new capitalized run, so
/// alphanumeric words keep the casing readers expect.
pub fn humanize_label(label: &str) -> String {
    let title = label.replace('_', " ").to_title_case();

    let mut humanized = String::with_capacity(title.len());
    let mut after_letter = false;
    for c in title.chars() {
        if c.is_alphabetic() && !after_letter {
            humanized.extend(c.to_uppercase());
        } else {
            humanized.push(c);
        }
        after_letter = c.is_alphabetic();
    }

    humanized
}

pub fn format_month(month: NaiveDateTime) -> String {
    month.format("%Y-%m").to_string()
}
