//! Display formatting. Everything is rounded to two decimals here and
//! nowhere else.

/// `"207.00 SAR"`.
pub fn money(amount: f64, currency: &str) -> String {
    if currency.is_empty() {
        format!("{:.2}", amount)
    } else {
        format!("{:.2} {}", amount, currency)
    }
}

/// `"15.00%"`.
pub fn percent(value: f64) -> String {
    format!("{:.2}%", value)
}

/// Whole quantities print without decimals; fractional ones keep up
/// to three.
pub fn quantity(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let s = format!("{:.3}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
