//! Fail-soft numeric coercion.
//!
//! Values reach the core as form text or as loosely typed store fields
//! ("US$ 1.234.567,00", "45%", "1234.5", numbers). Nothing here fails:
//! anything that cannot be read as a finite number becomes 0.

/// Parse a number typed by a narrator or stored as text.
///
/// Accepted shapes:
/// - plain numbers: `"1234.5"`, `"-3"`, `"1e6"`
/// - percentages: `"45%"`
/// - pt-BR money: `"US$ 1.234.567,00"`, `"R$ 10,5"`, `"1.234.567"`
///
/// Example:
/// assert_eq!(number("US$ 1.234.567,00"), 1_234_567.0);
pub fn number(text: &str) -> f64 {
    let s = text.trim();
    if s.is_empty() {
        return 0.0;
    }
    if let Some(pct) = s.strip_suffix('%') {
        return finite(pct.trim().parse::<f64>().unwrap_or(0.0));
    }

    let unprefixed = ["US$", "R$", "$"]
        .iter()
        .find_map(|p| s.strip_prefix(p))
        .unwrap_or(s);
    let compact: String = unprefixed.chars().filter(|c| !c.is_whitespace()).collect();

    // A comma marks pt-BR notation: dots group thousands, the comma is the
    // decimal point. Without a comma, several dots can only be grouping.
    let normalized = if compact.contains(',') {
        compact.replace('.', "").replacen(',', ".", 1)
    } else if compact.matches('.').count() > 1 {
        compact.replace('.', "")
    } else {
        compact
    };
    finite(normalized.parse::<f64>().unwrap_or(0.0))
}

/// Replace NaN and infinities with 0.
pub fn finite(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Clamp a percentage-typed value (technology, stability, ...) to [0, 100].
pub fn percent(v: f64) -> f64 {
    finite(v).clamp(0.0, 100.0)
}

/// Quantities (GDP, population, site sizes) are never negative.
pub fn quantity(v: f64) -> f64 {
    finite(v).max(0.0)
}

/// Integer counter (unit counts, turn numbers), rounded and saturating.
pub fn count(v: f64) -> u64 {
    // float-to-int `as` casts saturate
    quantity(v).round() as u64
}

/// Truthy form text: "SIM", "S", "true", "yes", "1".
pub fn flag(text: &str) -> bool {
    matches!(
        text.trim().to_ascii_lowercase().as_str(),
        "sim" | "s" | "true" | "yes" | "y" | "1"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn plain_numbers() {
        assert_eq!(number("1234.5"), 1234.5);
        assert_eq!(number("  42 "), 42.0);
        assert_eq!(number("-3"), -3.0);
        assert_eq!(number("1e6"), 1_000_000.0);
    }

    #[test]
    fn localized_money() {
        assert_eq!(number("US$ 1.234.567,00"), 1_234_567.0);
        assert_eq!(number("R$ 10,5"), 10.5);
        assert_eq!(number("1.234.567"), 1_234_567.0);
        assert_eq!(number("$ 99"), 99.0);
    }

    #[test]
    fn percentages() {
        assert_eq!(number("45%"), 45.0);
        assert_eq!(number(" 12.5 % "), 12.5);
        assert_eq!(number("abc%"), 0.0);
    }

    #[test]
    fn garbage_is_zero() {
        assert_eq!(number(""), 0.0);
        assert_eq!(number("abc"), 0.0);
        assert_eq!(number("NaN"), 0.0);
        assert_eq!(number("inf"), 0.0);
        assert_eq!(number("1,2,3"), 0.0);
    }

    #[test]
    fn clamps() {
        assert_eq!(percent(150.0), 100.0);
        assert_eq!(percent(-1.0), 0.0);
        assert_eq!(percent(f64::NAN), 0.0);
        assert_eq!(quantity(-5.0), 0.0);
        assert_eq!(count(2.6), 3);
        assert_eq!(count(-2.0), 0);
        assert_eq!(count(f64::INFINITY), 0);
    }

    #[test]
    fn war_flag_text() {
        assert!(flag("SIM"));
        assert!(flag("true"));
        assert!(!flag("NAO"));
        assert!(!flag(""));
    }

    proptest! {
        #[test]
        fn number_is_always_finite(s in ".{0,24}") {
            prop_assert!(number(&s).is_finite());
        }

        #[test]
        fn percent_stays_in_range(v in proptest::num::f64::ANY) {
            let p = percent(v);
            prop_assert!((0.0..=100.0).contains(&p));
        }
    }
}
