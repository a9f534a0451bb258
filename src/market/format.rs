//! Display strings for prices on the board.

/// Groups the integer digits of `formatted` (a plain `{:.N}` rendering)
/// with `thousands` and swaps the decimal point for `decimal`.
fn localize(formatted: &str, thousands: char, decimal: char) -> String {
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(thousands);
        }
        grouped.push(digit);
    }

    match fraction {
        Some(f) => format!("{}{}{}{}", sign, grouped, decimal, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// Turkish-lira amount: `2.345,67 ₺`.
pub fn try_amount(value: f64) -> String {
    format!("{} ₺", localize(&format!("{:.2}", value), '.', ','))
}

/// US-dollar amount: `$104,250.50`.
pub fn usd_amount(value: f64) -> String {
    format!("${}", localize(&format!("{:.2}", value), ',', '.'))
}

/// Half-away-from-zero rounding to two decimals, for chart values.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
