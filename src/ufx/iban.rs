//! Icelandic IBAN synthesis (ISO 13616, mod-97).
//!
//! `IS kk AAAAAAAAAAAA KKKKKKKKKK`: a 12-digit domestic account (bank, ledger,
//! account) followed by the owner's 10-digit kennitala.

use super::error::IbanError;

const COUNTRY: &str = "IS";
/// `I`=18, `S`=28, check digits `00`
const COUNTRY_DIGITS: &str = "182800";
const ACCOUNT_LEN: usize = 12;
const KENNITALA_LEN: usize = 10;

fn all_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}

/// Remainder of an arbitrarily long decimal string modulo 97
pub fn mod97(digits: &str) -> u32 {
    digits.bytes().fold(0u32, |acc, b| {
        (acc * 10 + u32::from(b.wrapping_sub(b'0'))) % 97
    })
}

pub fn icelandic_iban(account: &str, kennitala: &str) -> Result<String, IbanError> {
    let account = account.trim();
    let kennitala = kennitala.trim();
    if !all_digits(kennitala, KENNITALA_LEN) {
        return Err(IbanError::InvalidKennitala(kennitala.to_string()));
    }
    if !all_digits(account, ACCOUNT_LEN) {
        return Err(IbanError::InvalidAccount(account.to_string()));
    }

    let bban = format!("{}{}", account, kennitala);
    let checksum = 98 - mod97(&format!("{}{}", bban, COUNTRY_DIGITS));
    Ok(format!("{}{:02}{}", COUNTRY, checksum, bban))
}

/// Standard IBAN check: rotated numeric form is congruent to 1 mod 97
pub fn is_valid(iban: &str) -> bool {
    if iban.len() < 5 || !iban.is_ascii() {
        return false;
    }
    let rotated = format!("{}{}", &iban[4..], &iban[..4]);
    let mut numeric = String::with_capacity(rotated.len() * 2);
    for c in rotated.chars() {
        match c {
            '0'..='9' => numeric.push(c),
            'A'..='Z' => numeric.push_str(&(c as u32 - 'A' as u32 + 10).to_string()),
            _ => return false,
        }
    }
    mod97(&numeric) == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_iban() {
        assert_eq!(
            icelandic_iban("050026000000", "4000000000").unwrap(),
            "IS310500260000004000000000"
        );
        assert!(is_valid("IS310500260000004000000000"));
        assert!(is_valid("IS140159260076545510730339"));
    }

    #[test]
    fn test_rejects_malformed_inputs() {
        assert_eq!(
            icelandic_iban("0500260000", "4000000000"),
            Err(IbanError::InvalidAccount("0500260000".to_string()))
        );
        assert_eq!(
            icelandic_iban("05002600000X", "4000000000"),
            Err(IbanError::InvalidAccount("05002600000X".to_string()))
        );
        assert!(matches!(
            icelandic_iban("050026000000", "400000000"),
            Err(IbanError::InvalidKennitala(_))
        ));
        assert!(matches!(
            icelandic_iban("SAXODKKK", "4000000000"),
            Err(IbanError::InvalidAccount(_))
        ));
    }

    #[test]
    fn test_checksum_is_zero_padded() {
        // every synthesized IBAN is 26 chars, including single-digit checksums
        for n in 0..200u64 {
            let account = format!("{:012}", n * 7919);
            let iban = icelandic_iban(&account, "0101302989").unwrap();
            assert_eq!(iban.len(), 26);
            assert!(is_valid(&iban), "{}", iban);
        }
    }

    #[test]
    fn test_is_valid_rejects_garbage() {
        assert!(!is_valid(""));
        assert!(!is_valid("IS31"));
        assert!(!is_valid("IS320500260000004000000000"));
        assert!(!is_valid("is310500260000004000000000"));
    }
}
