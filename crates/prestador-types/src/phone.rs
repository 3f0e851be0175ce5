//! Phone mask: `(DD) DDDDD-DDDD`.
//!
//! Records store phones as bare digits (2 area-code + 9 subscriber digits);
//! forms display the masked rendering. `format` renders progressively, so a
//! partially typed number shows the mask only up to its last digit.

/// Mask template. `D` is a digit slot; everything else is a literal.
pub const PHONE_MASK: &str = "(DD) DDDDD-DDDD";

/// Digits in a complete phone number.
pub const PHONE_DIGITS: usize = 11;

/// Render digits through the mask.
///
/// Non-digit characters in the input are ignored and digits beyond the mask
/// are dropped. Literals are only emitted while digits remain, so
/// `format("119")` is `"(11) 9"`.
pub fn format(digits: &str) -> String {
    let mut digits = digits.chars().filter(char::is_ascii_digit).peekable();
    let mut out = String::with_capacity(PHONE_MASK.len());

    for slot in PHONE_MASK.chars() {
        if digits.peek().is_none() {
            break;
        }
        if slot == 'D' {
            if let Some(d) = digits.next() {
                out.push(d);
            }
        } else {
            out.push(slot);
        }
    }
    out
}

/// Strip the mask, keeping ASCII digits only.
pub fn unformat(masked: &str) -> String {
    masked.chars().filter(char::is_ascii_digit).collect()
}

/// Whether `digits` is a complete, unformatted phone number.
pub fn is_complete(digits: &str) -> bool {
    digits.len() == PHONE_DIGITS && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_full_number() {
        assert_eq!(format("11987654321"), "(11) 98765-4321");
    }

    #[test]
    fn test_format_partial_number() {
        assert_eq!(format(""), "");
        assert_eq!(format("1"), "(1");
        assert_eq!(format("11"), "(11");
        assert_eq!(format("119"), "(11) 9");
        assert_eq!(format("1198765"), "(11) 98765");
        assert_eq!(format("11987654"), "(11) 98765-4");
    }

    #[test]
    fn test_format_ignores_noise_and_overflow() {
        assert_eq!(format("(11) 98765-4321"), "(11) 98765-4321");
        assert_eq!(format("119876543210000"), "(11) 98765-4321");
    }

    #[test]
    fn test_unformat() {
        assert_eq!(unformat("(11) 98765-4321"), "11987654321");
        assert_eq!(unformat(""), "");
    }

    #[test]
    fn test_round_trip_over_many_numbers() {
        // Walk a spread of 11-digit strings, including leading zeros.
        let mut n: u64 = 0;
        while n < 100_000_000_000 {
            let digits = std::format!("{n:011}");
            assert_eq!(unformat(&format(&digits)), digits);
            n += 7_919_393;
        }
        assert_eq!(unformat(&format("00000000000")), "00000000000");
        assert_eq!(unformat(&format("99999999999")), "99999999999");
    }

    #[test]
    fn test_is_complete() {
        assert!(is_complete("11987654321"));
        assert!(!is_complete("1198765432"));
        assert!(!is_complete("(11) 98765-4321"));
    }
}
