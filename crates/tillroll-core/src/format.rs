//! Display formatting shared by the CLI views

use chrono::NaiveDate;

use crate::models::PaymentMethod;

/// Format an amount in rupees with en-IN grouping: ₹1,23,456.78
///
/// The last three integer digits form one group, every group before that
/// has two digits.
pub fn currency(val: f64) -> String {
    let negative = val < 0.0;
    let fixed = format!("{:.2}", val.abs());
    let (int_part, dec_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::new();
    let head_len = digits.len().saturating_sub(3);
    for (i, c) in digits[..head_len].iter().enumerate() {
        if i > 0 && (head_len - i) % 2 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }
    if head_len > 0 {
        grouped.push(',');
    }
    grouped.extend(&digits[head_len..]);

    if negative {
        format!("-₹{grouped}.{dec_part}")
    } else {
        format!("₹{grouped}.{dec_part}")
    }
}

/// Human label for a payment method: CREDIT_CARD → "Credit Card"
pub fn payment_method_label(method: PaymentMethod) -> String {
    title_case(method.as_str())
}

/// Turn a SCREAMING_SNAKE wire name into title case words
pub fn title_case(wire: &str) -> String {
    wire.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Short date: Jan 5, 2024
pub fn date(d: NaiveDate) -> String {
    d.format("%b %-d, %Y").to_string()
}

/// Signed percentage with one decimal: +12.5% / -3.0%
pub fn percent(val: f64) -> String {
    format!("{:+.1}%", val)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_indian_grouping() {
        assert_eq!(currency(123456.78), "₹1,23,456.78");
        assert_eq!(currency(1234567.0), "₹12,34,567.00");
        assert_eq!(currency(999.5), "₹999.50");
        assert_eq!(currency(1000.0), "₹1,000.00");
        assert_eq!(currency(0.0), "₹0.00");
        assert_eq!(currency(-50000.0), "-₹50,000.00");
    }

    #[test]
    fn test_payment_method_label() {
        assert_eq!(payment_method_label(PaymentMethod::CreditCard), "Credit Card");
        assert_eq!(payment_method_label(PaymentMethod::Upi), "Upi");
        assert_eq!(title_case("DIGITAL_WALLET"), "Digital Wallet");
    }

    #[test]
    fn test_date_and_percent() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(date(d), "Jan 5, 2024");
        assert_eq!(percent(12.5), "+12.5%");
        assert_eq!(percent(-3.0), "-3.0%");
    }
}
