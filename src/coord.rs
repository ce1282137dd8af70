//! Coordinate token decoding
//!
//! Converts one signed numeric token into an integer scaled by
//! 10^fraction_digits of the active [`NumericFormat`]. Output coordinates are
//! always written with leading zeros omitted, so the decoded integer is used
//! directly in the Gerber file.

use crate::format::NumericFormat;

/// Result of decoding one coordinate token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    /// Scaled integer value
    pub value: i64,

    /// Characters consumed from the line, never zero
    pub consumed: usize,

    /// False when no numeric characters were found at the token start
    pub valid: bool,
}

/// Decode the token starting at `start`.
///
/// The token is an optional sign followed by digits with at most one decimal
/// point. A token of zero length reports `valid: false` with one character
/// consumed so that callers scanning a line always make progress.
pub fn decode_coordinate(bytes: &[u8], start: usize, format: NumericFormat) -> Decoded {
    let mut value: i64 = 0;
    let mut digits: u32 = 0;
    let mut point_pos: u32 = 0;
    let mut negative = false;
    let mut explicit_point = false;

    let mut index = start;
    match bytes.get(index) {
        Some(b'+') => index += 1,
        Some(b'-') => {
            negative = true;
            index += 1;
        }
        _ => {}
    }

    while let Some(&c) = bytes.get(index) {
        match c {
            b'0'..=b'9' => {
                value = value.saturating_mul(10).saturating_add(i64::from(c - b'0'));
                digits += 1;
                point_pos += 1;
            }
            b'.' => {
                explicit_point = true;
                point_pos = 0;
            }
            _ => break,
        }
        index += 1;
    }

    if explicit_point {
        while point_pos < format.fraction_digits {
            value = value.saturating_mul(10);
            point_pos += 1;
        }
    } else if format.leading_zeros {
        // Leading zeros present means trailing ones were dropped
        while digits < format.total_digits() {
            value = value.saturating_mul(10);
            digits += 1;
        }
    }

    let consumed = index - start;
    let value = if negative { -value } else { value };

    if consumed == 0 {
        return Decoded {
            value,
            consumed: 1,
            valid: false,
        };
    }

    Decoded {
        value,
        consumed,
        valid: true,
    }
}

/// Decode a whole token, returning `None` if it has no numeric content
pub fn decode_token(token: &str, format: NumericFormat) -> Option<i64> {
    let decoded = decode_coordinate(token.as_bytes(), 0, format);
    decoded.valid.then_some(decoded.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LZ_24: NumericFormat = NumericFormat::new(2, 4, true);
    const TZ_24: NumericFormat = NumericFormat::new(2, 4, false);

    #[test]
    fn test_leading_zero_padding() {
        assert_eq!(decode_token("015000", LZ_24), Some(15000));
        assert_eq!(decode_token("0250", LZ_24), Some(25000));
        assert_eq!(decode_token("01", LZ_24), Some(10000));
    }

    #[test]
    fn test_trailing_zero_used_as_is() {
        assert_eq!(decode_token("0250", TZ_24), Some(250));
        assert_eq!(decode_token("15000", TZ_24), Some(15000));
    }

    #[test]
    fn test_explicit_point() {
        assert_eq!(decode_token("1.5", LZ_24), Some(15000));
        assert_eq!(decode_token("1.5", TZ_24), Some(15000));
        assert_eq!(decode_token("1.5", LZ_24), decode_token("1.5000", LZ_24));
        assert_eq!(decode_token(".25", LZ_24), Some(2500));
        assert_eq!(decode_token("3.", LZ_24), Some(30000));
    }

    #[test]
    fn test_excess_precision_is_kept() {
        assert_eq!(decode_token("1.23456", LZ_24), Some(123456));
    }

    #[test]
    fn test_signs() {
        assert_eq!(decode_token("-1.5", LZ_24), Some(-15000));
        assert_eq!(decode_token("+0250", TZ_24), Some(250));
        assert_eq!(decode_token("-0250", LZ_24), Some(-25000));
    }

    #[test]
    fn test_token_stops_at_next_axis() {
        let line = b"X0250Y0500";
        let x = decode_coordinate(line, 1, LZ_24);
        assert_eq!(x, Decoded { value: 25000, consumed: 4, valid: true });

        let y = decode_coordinate(line, 6, LZ_24);
        assert_eq!(y.value, 50000);
        assert_eq!(y.consumed, 4);
    }

    #[test]
    fn test_zero_length_token_forces_progress() {
        let line = b"XY100";
        let decoded = decode_coordinate(line, 1, LZ_24);
        assert!(!decoded.valid);
        assert_eq!(decoded.consumed, 1);

        let at_end = decode_coordinate(b"X", 1, LZ_24);
        assert!(!at_end.valid);
        assert_eq!(at_end.consumed, 1);
    }

    #[test]
    fn test_lone_sign_is_a_token() {
        let decoded = decode_coordinate(b"-Y", 0, TZ_24);
        assert!(decoded.valid);
        assert_eq!(decoded.value, 0);
        assert_eq!(decoded.consumed, 1);
    }
}
