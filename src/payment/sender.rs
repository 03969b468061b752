//! Sender classification. The UFX `FileHeader.Sender` drives post-processing:
//! Icelandic senders get IBAN synthesis, SAXO gets country-from-SWIFT extraction.

const ICELANDIC_SENDERS: &[&str] = &["ISL", "RB"];
const SAXO_SENDER: &str = "SAXO";

pub fn is_icelandic_sender(sender: &str) -> bool {
    let sender = sender.trim();
    ICELANDIC_SENDERS
        .iter()
        .any(|s| s.eq_ignore_ascii_case(sender))
}

pub fn is_saxo_sender(sender: &str) -> bool {
    sender.trim().eq_ignore_ascii_case(SAXO_SENDER)
}
