//! Currency codes and their ISO 4217 numeric mapping.
//!
//! UFX billing records carry the numeric code; HTTP submissions carry the
//! alphabetic one. ISK is the domestic currency: its balance check is skipped.

pub const DOMESTIC_CURRENCY: &str = "ISK";

const ISO_4217: &[(&str, &str)] = &[
    ("AUD", "036"),
    ("CAD", "124"),
    ("CHF", "756"),
    ("CZK", "203"),
    ("DKK", "208"),
    ("EUR", "978"),
    ("GBP", "826"),
    ("HUF", "348"),
    ("ISK", "352"),
    ("JPY", "392"),
    ("NOK", "578"),
    ("PLN", "985"),
    ("SEK", "752"),
    ("USD", "840"),
];

/// ISO numeric code for an alphabetic currency code (case-insensitive)
pub fn iso_number_for(code: &str) -> Option<&'static str> {
    let code = code.trim();
    ISO_4217
        .iter()
        .find(|(alpha, _)| alpha.eq_ignore_ascii_case(code))
        .map(|(_, number)| *number)
}

/// Alphabetic code for an ISO numeric code; tolerates missing leading zeros ("36" → AUD)
pub fn code_for_iso_number(number: &str) -> Option<&'static str> {
    let number = number.trim();
    let parsed: u16 = number.parse().ok()?;
    ISO_4217
        .iter()
        .find(|(_, n)| n.parse::<u16>().ok() == Some(parsed))
        .map(|(alpha, _)| *alpha)
}

pub fn is_known(code: &str) -> bool {
    iso_number_for(code).is_some()
}

#[inline]
pub fn is_domestic(code: &str) -> bool {
    code.trim().eq_ignore_ascii_case(DOMESTIC_CURRENCY)
}

/// Sort key placing the domestic currency ahead of everything else
#[inline]
pub fn priority(code: &str) -> u8 {
    if is_domestic(code) { 0 } else { 1 }
}
