//! Display formatting for prices, percentages and metric values.

/// Placeholder for a missing value.
pub const MISSING: &str = "-";

/// Two fraction digits with thousands separators, e.g. `1,234.50`.
pub fn price(value: f64) -> String {
    if !value.is_finite() {
        return MISSING.to_string();
    }

    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Ratio rendered as a percentage, e.g. `0.0667` becomes `6.67%`.
pub fn percentage(ratio: f64) -> String {
    if !ratio.is_finite() {
        return MISSING.to_string();
    }
    format!("{:.2}%", ratio * 100.0)
}

/// Optional metric value with two fraction digits.
pub fn metric_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}", v),
        _ => MISSING.to_string(),
    }
}
