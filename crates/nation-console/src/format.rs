//! pt-BR display formatting. Rounding goes through `Decimal` so halves round
//! away from zero regardless of binary representation.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

fn decimal(v: f64) -> Decimal {
    // NaN, infinities and values beyond the decimal range display as zero
    Decimal::from_f64(v).unwrap_or(Decimal::ZERO)
}

fn round(v: f64, dp: u32) -> Decimal {
    decimal(v).round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Group the integer digits with '.' and use ',' as decimal separator.
fn pt_br(d: Decimal) -> String {
    let negative = d.is_sign_negative() && !d.is_zero();
    let text = d.abs().to_string();
    let (int, frac) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };
    let mut out = String::with_capacity(text.len() + int.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    if let Some(f) = frac {
        out.push(',');
        out.push_str(f);
    }
    out
}

/// Number with thousands grouping and at most three fraction digits.
pub fn format_number(v: f64) -> String {
    pt_br(round(v, 3).normalize())
}

/// Currency amount with exactly two fraction digits, e.g. `US$ 1.234.567,89`.
pub fn format_currency(v: f64) -> String {
    let mut d = round(v, 2);
    d.rescale(2);
    let text = pt_br(d);
    match text.strip_prefix('-') {
        Some(abs) => format!("-US$ {abs}"),
        None => format!("US$ {text}"),
    }
}

/// Badge shown next to a signed balance such as food.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BalanceLabel {
    Surplus,
    Deficit,
}

impl BalanceLabel {
    /// Zero counts as a surplus.
    pub fn of(balance: f64) -> Self {
        if balance < 0.0 {
            BalanceLabel::Deficit
        } else {
            BalanceLabel::Surplus
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BalanceLabel::Surplus => "Surplus",
            BalanceLabel::Deficit => "Deficit",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn numbers_group_and_trim() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(999.0), "999");
        assert_eq!(format_number(1000.0), "1.000");
        assert_eq!(format_number(1_234_567.0), "1.234.567");
        assert_eq!(format_number(400.0), "400");
        assert_eq!(format_number(12.5), "12,5");
        assert_eq!(format_number(-70.1234), "-70,123");
        assert_eq!(format_number(0.0005), "0,001");
        assert_eq!(format_number(-0.0001), "0");
        assert_eq!(format_number(f64::NAN), "0");
    }

    #[test]
    fn currency_has_two_places() {
        assert_eq!(format_currency(1_234_567.891), "US$ 1.234.567,89");
        assert_eq!(format_currency(5.0), "US$ 5,00");
        assert_eq!(format_currency(0.125), "US$ 0,13");
        assert_eq!(format_currency(-1500.0), "-US$ 1.500,00");
    }

    #[test]
    fn balance_labels() {
        assert_eq!(BalanceLabel::of(-0.5), BalanceLabel::Deficit);
        assert_eq!(BalanceLabel::of(0.0), BalanceLabel::Surplus);
        assert_eq!(BalanceLabel::of(12.0).label(), "Surplus");
    }

    proptest! {
        #[test]
        fn grouped_integers_parse_back(v in 0u64..1_000_000_000_000) {
            let text = format_number(v as f64);
            prop_assert_eq!(text.replace('.', "").parse::<u64>().unwrap(), v);
        }
    }
}
