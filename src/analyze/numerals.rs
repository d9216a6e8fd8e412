//! Page-number helpers.

/// Check that every element is strictly greater than the one before.
///
/// Empty and single-element slices are increasing.
pub fn is_increasing<T: PartialOrd>(values: &[T]) -> bool {
    values.windows(2).all(|pair| pair[0] < pair[1])
}

fn roman_value(c: char) -> Option<u32> {
    match c.to_ascii_lowercase() {
        'i' => Some(1),
        'v' => Some(5),
        'x' => Some(10),
        'l' => Some(50),
        'c' => Some(100),
        'd' => Some(500),
        'm' => Some(1000),
        _ => None,
    }
}

/// Decode a Roman numeral, case-insensitively.
///
/// Archaic additive forms such as `iiii` or `viiii` are accepted. Subtractive
/// pairs must use a power of ten no less than a tenth of the larger numeral,
/// so `ix` and `xc` decode but `vx`, `il` and `ic` do not.
pub fn decode_roman(text: &str) -> Option<u32> {
    let values: Vec<u32> = text.trim().chars().map(roman_value).collect::<Option<_>>()?;
    if values.is_empty() {
        return None;
    }

    let mut total: i64 = 0;
    for (i, &value) in values.iter().enumerate() {
        match values.get(i + 1) {
            Some(&next) if value < next => {
                if matches!(value, 5 | 50 | 500) || next > value * 10 {
                    return None;
                }
                total -= i64::from(value);
            }
            _ => total += i64::from(value),
        }
    }

    u32::try_from(total).ok().filter(|n| *n > 0)
}
