//! Permissive numeric parsing for text form fields.
//!
//! Both parsers accept the longest numeric prefix of the input after leading
//! whitespace and return `f64::NAN` when there is none. Nothing here rejects
//! input: a field that fails to parse feeds not-a-number into the formulas,
//! and the formulas pass it through.

/// Integer-prefix parse: `"42px"` is 42, `"-7.9"` is -7, `"abc"` is NaN.
pub fn parse_int(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let (negative, rest) = split_sign(trimmed);
    let digits = leading_digits(rest);
    if digits == 0 {
        return f64::NAN;
    }
    let value = rest[..digits].parse::<f64>().unwrap_or(f64::NAN);
    if negative {
        -value
    } else {
        value
    }
}

/// Decimal-prefix parse: `"1.25x"` is 1.25, `".5"` is 0.5, `"1e3"` is 1000,
/// `"Infinity"` is infinite, `""` is NaN.
pub fn parse_float(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let (negative, rest) = split_sign(trimmed);
    let sign = if negative { -1.0 } else { 1.0 };

    if rest.starts_with("Infinity") {
        return sign * f64::INFINITY;
    }

    let bytes = rest.as_bytes();
    let integer = leading_digits(rest);
    let mut end = integer;
    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = leading_digits(&rest[end + 1..]);
        end += 1 + fraction;
    }
    if integer == 0 && fraction == 0 {
        return f64::NAN;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let (_, exp_rest) = split_sign(&rest[end + 1..]);
        let exp_digits = leading_digits(exp_rest);
        if exp_digits > 0 {
            let sign_len = rest[end + 1..].len() - exp_rest.len();
            end += 1 + sign_len + exp_digits;
        }
    }

    // A trailing "." with no fraction digits is fine for `str::parse`.
    rest[..end]
        .parse::<f64>()
        .map(|value| sign * value)
        .unwrap_or(f64::NAN)
}

fn split_sign(text: &str) -> (bool, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = text.strip_prefix('+') {
        (false, rest)
    } else {
        (false, text)
    }
}

fn leading_digits(text: &str) -> usize {
    text.bytes().take_while(u8::is_ascii_digit).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_takes_leading_digits() {
        assert_eq!(parse_int("42"), 42.0);
        assert_eq!(parse_int("  42px"), 42.0);
        assert_eq!(parse_int("-7.9"), -7.0);
        assert_eq!(parse_int("+3"), 3.0);
    }

    #[test]
    fn int_without_digits_is_nan() {
        assert!(parse_int("").is_nan());
        assert!(parse_int("abc").is_nan());
        assert!(parse_int("-").is_nan());
        assert!(parse_int(".5").is_nan());
    }

    #[test]
    fn float_takes_decimal_prefix() {
        assert_eq!(parse_float("1.25"), 1.25);
        assert_eq!(parse_float("1.25x"), 1.25);
        assert_eq!(parse_float(".5"), 0.5);
        assert_eq!(parse_float("5."), 5.0);
        assert_eq!(parse_float("-0.75"), -0.75);
        assert_eq!(parse_float("1e3"), 1000.0);
        assert_eq!(parse_float("2.5E-1"), 0.25);
        assert_eq!(parse_float("7e"), 7.0);
        assert_eq!(parse_float("-Infinity"), f64::NEG_INFINITY);
    }

    #[test]
    fn float_without_digits_is_nan() {
        assert!(parse_float("").is_nan());
        assert!(parse_float(".").is_nan());
        assert!(parse_float("e5").is_nan());
        assert!(parse_float("growth").is_nan());
    }
}
