use alloy_primitives::U256;

/// Render `value / 10^decimals` as an exact decimal string.
///
/// The result always carries a fractional part with trailing zeros trimmed,
/// so `1_000_000` at 6 decimals is `"1.0"` and `1` is `"0.000001"`.
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals - digits.len() + 1), digits)
    } else {
        digits
    };

    let (integer, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    let fraction = if fraction.is_empty() { "0" } else { fraction };

    format!("{}.{}", integer, fraction)
}

/// Inverse of [`format_units`]. Returns `None` for malformed input, more
/// fractional digits than `decimals`, or a result that overflows 256 bits.
pub fn parse_units(amount: &str, decimals: u8) -> Option<U256> {
    let decimals = decimals as usize;
    let (integer, fraction) = match amount.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (amount, ""),
    };

    if integer.is_empty() || !integer.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > decimals {
        return None;
    }

    let digits = format!("{}{}{}", integer, fraction, "0".repeat(decimals - fraction.len()));
    U256::from_str_radix(&digits, 10).ok()
}
