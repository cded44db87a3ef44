//! Amount formatting for terminal output

/// Format `value` with `precision` decimals, thousands separators and a currency symbol.
///
/// `format_amount(-1234.5, 2, "$")` → `-$1,234.50`
pub fn format_amount(value: f64, precision: usize, symbol: &str) -> String {
    let formatted = format!("{:.*}", precision, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (formatted.as_str(), None),
    };

    // "-0.00" is noise, only print the sign for amounts that survive rounding
    let sign = if value < 0.0 && formatted.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };

    let grouped = group_thousands(int_part);
    match frac_part {
        Some(frac) => format!("{sign}{symbol}{grouped}.{frac}"),
        None => format!("{sign}{symbol}{grouped}"),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
