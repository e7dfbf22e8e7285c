use serde_json::Value;

const PERSIAN_DIGITS: [char; 10] = ['۰', '۱', '۲', '۳', '۴', '۵', '۶', '۷', '۸', '۹'];
const GROUP_SEPARATOR: char = '٬';
const DECIMAL_SEPARATOR: char = '٫';
const MAX_FRACTION_DIGITS: usize = 3;

/// Formats a server-provided number with fa-IR digits and grouping.
///
/// Never fails: booleans count as 1 and 0, other values that are not finite
/// numbers come back as their raw string form, and `null` becomes an empty string.
pub fn format_number(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => format_f64(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.is_finite() => format_f64(f),
            _ => n.to_string(),
        },
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return format_f64(0.0);
            }
            match trimmed.parse::<f64>() {
                Ok(f) if f.is_finite() => format_f64(f),
                _ => s.clone(),
            }
        }
        other => other.to_string(),
    }
}

/// JS-style truthiness fallback for totals: missing, zero-ish or falsy becomes 0.
pub fn format_total(value: &Value) -> String {
    let falsy = match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f == 0.0 || f.is_nan()),
        Value::String(s) => s.is_empty(),
        _ => false,
    };
    if falsy {
        format_f64(0.0)
    } else {
        format_number(value)
    }
}

pub fn format_f64(value: f64) -> String {
    let fixed = format!("{:.*}", MAX_FRACTION_DIGITS, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, f.trim_end_matches('0')),
        None => (fixed.as_str(), ""),
    };

    let mut out = String::new();
    if value < 0.0 && (int_part != "0" || !frac_part.is_empty()) {
        out.push('-');
    }
    let len = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(GROUP_SEPARATOR);
        }
        out.push(persian_digit(ch));
    }
    if !frac_part.is_empty() {
        out.push(DECIMAL_SEPARATOR);
        out.extend(frac_part.chars().map(persian_digit));
    }
    out
}

fn persian_digit(ch: char) -> char {
    ch.to_digit(10).map_or(ch, |d| PERSIAN_DIGITS[d as usize])
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn groups_thousands_with_persian_digits() {
        assert_eq!(format_number(&json!(1000)), "۱٬۰۰۰");
        assert_eq!(format_number(&json!(1234567)), "۱٬۲۳۴٬۵۶۷");
        assert_eq!(format_number(&json!(12)), "۱۲");
        assert_eq!(format_number(&json!(0)), "۰");
    }

    #[test]
    fn keeps_up_to_three_fraction_digits() {
        assert_eq!(format_number(&json!(2.5)), "۲٫۵");
        assert_eq!(format_number(&json!(1.23456)), "۱٫۲۳۵");
        assert_eq!(format_number(&json!(-1500)), "-۱٬۵۰۰");
    }

    #[test]
    fn numeric_strings_are_formatted() {
        assert_eq!(format_number(&json!("2500")), "۲٬۵۰۰");
        assert_eq!(format_number(&json!(" ")), "۰");
    }

    #[test]
    fn garbage_falls_back_to_raw_text() {
        assert_eq!(format_number(&json!("lots")), "lots");
        assert_eq!(format_number(&json!("Infinity")), "Infinity");
        assert_eq!(format_number(&json!([1, 2])), "[1,2]");
        assert_eq!(format_number(&Value::Null), "");
    }

    #[test]
    fn booleans_format_as_one_and_zero() {
        assert_eq!(format_number(&json!(true)), "۱");
        assert_eq!(format_number(&json!(false)), "۰");
        assert_eq!(format_total(&json!(true)), "۱");
    }

    #[test]
    fn total_treats_falsy_values_as_zero() {
        assert_eq!(format_total(&Value::Null), "۰");
        assert_eq!(format_total(&json!(0)), "۰");
        assert_eq!(format_total(&json!(1000)), "۱٬۰۰۰");
    }
}
