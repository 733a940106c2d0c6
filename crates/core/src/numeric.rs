//! Lenient numeric coercion for values typed into the UI.
//!
//! Nothing in this module fails: unparsable input becomes `0.0`, and so do
//! NaN and infinities, so totals never carry a NaN.

/// Replace NaN and ±∞ with `0.0`.
#[must_use]
pub fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Parse the longest valid decimal prefix of `input`.
///
/// Leading whitespace is skipped, `"12abc"` yields `12.0`, `".5"` yields
/// `0.5`, and anything without a leading number yields `0.0`.
#[must_use]
pub fn parse_number(input: &str) -> f64 {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }

    if digits == 0 {
        return 0.0;
    }

    // Exponent only counts when at least one digit follows it.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    let candidate = s[..end].trim_end_matches('.');
    sanitize(candidate.parse::<f64>().unwrap_or(0.0))
}

/// Parse a quantity: the numeric prefix truncated toward zero.
#[must_use]
pub fn parse_quantity(input: &str) -> i64 {
    parse_number(input).trunc() as i64
}

