//! One-pass UFX decoder.
//!
//! The event reader walks the document once. `FileHeader` and every `Doc` are
//! cut out as raw slices and handed to serde; everything else is skipped.
//! The raw slices are kept so `filter_currency` can re-emit the original
//! markup of the docs it keeps.

use chrono::NaiveDate;
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, warn};

use super::error::UfxError;
use super::iban;
use super::model::{Doc, FileHeader, parm_code};
use crate::payment::currency;
use crate::payment::sender::{is_icelandic_sender, is_saxo_sender};
use crate::payment::{
    Account, Address, Currency, IncomingInstruction, Merchant, Metadata, Payment,
};

const HIGH_RISK_MARKER: &str = "_HR_";
const PHASE_DATE_FORMAT: &str = "%Y-%m-%d";
pub const SOURCE: &str = "ufx";
pub const FILE_TYPE: &str = "UFX";

struct RawDoc<'a> {
    raw: &'a str,
    doc: Doc,
}

struct ParsedFile<'a> {
    header_raw: &'a str,
    header: FileHeader,
    docs: Vec<RawDoc<'a>>,
}

fn parse(xml: &str) -> Result<ParsedFile<'_>, UfxError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut header: Option<(&str, FileHeader)> = None;
    let mut docs = Vec::new();

    loop {
        let start = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"FileHeader" => {
                    reader.read_to_end(e.name())?;
                    let raw = &xml[start..reader.buffer_position() as usize];
                    header = Some((raw, deserialize("FileHeader", raw)?));
                }
                b"Doc" => {
                    reader.read_to_end(e.name())?;
                    let raw = &xml[start..reader.buffer_position() as usize];
                    docs.push(RawDoc {
                        raw,
                        doc: deserialize("Doc", raw)?,
                    });
                }
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"FileHeader" => {
                    let raw = &xml[start..reader.buffer_position() as usize];
                    header = Some((raw, FileHeader::default()));
                }
                b"Doc" => {
                    let raw = &xml[start..reader.buffer_position() as usize];
                    docs.push(RawDoc {
                        raw,
                        doc: Doc::default(),
                    });
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    let (header_raw, header) = header.ok_or(UfxError::MissingHeader)?;
    Ok(ParsedFile {
        header_raw,
        header,
        docs,
    })
}

fn deserialize<T: serde::de::DeserializeOwned>(
    element: &'static str,
    raw: &str,
) -> Result<T, UfxError> {
    quick_xml::de::from_str(raw).map_err(|e| UfxError::element(element, e))
}

/// Decode a UFX batch into normalized instructions, domestic currency first
pub fn decode(bytes: &[u8], filename: &str) -> Result<Vec<IncomingInstruction>, UfxError> {
    let xml = std::str::from_utf8(bytes)?;
    let parsed = parse(xml)?;
    let sender = parsed.header.sender.trim();
    let high_risk = filename.contains(HIGH_RISK_MARKER);

    let mut instructions = parsed
        .docs
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let mut incoming = to_incoming(&raw.doc, index, sender, filename, high_risk)?;
            post_process(&mut incoming, sender);
            Ok(incoming)
        })
        .collect::<Result<Vec<_>, UfxError>>()?;

    // stable: file order is kept within a priority class
    instructions.sort_by_key(|i| currency::priority(&i.payment.currency.iso_code));

    debug!(
        filename = %filename,
        sender = %sender,
        docs = instructions.len(),
        high_risk,
        "UFX file decoded"
    );
    Ok(instructions)
}

/// Re-serialize the file keeping the header and only the docs billed in `currency_code`.
/// The trailer is dropped since its checksum no longer matches.
pub fn filter_currency(bytes: &[u8], currency_code: &str) -> Result<Vec<u8>, UfxError> {
    let wanted = currency::iso_number_for(currency_code)
        .and_then(|n| n.parse::<u16>().ok())
        .ok_or_else(|| UfxError::UnknownCurrency(currency_code.to_string()))?;

    let xml = std::str::from_utf8(bytes)?;
    let parsed = parse(xml)?;

    let mut out = String::with_capacity(xml.len());
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<DocFile>");
    out.push_str(parsed.header_raw.trim());
    out.push_str("<DocList>");
    let mut kept = 0usize;
    for raw in &parsed.docs {
        if raw.doc.billing.currency.trim().parse::<u16>().ok() == Some(wanted) {
            out.push_str(raw.raw.trim());
            kept += 1;
        }
    }
    out.push_str("</DocList></DocFile>");

    debug!(
        currency = %currency_code,
        kept,
        total = parsed.docs.len(),
        "UFX file filtered by currency"
    );
    Ok(out.into_bytes())
}

fn to_incoming(
    doc: &Doc,
    index: usize,
    sender: &str,
    filename: &str,
    high_risk: bool,
) -> Result<IncomingInstruction, UfxError> {
    let phase_date = doc.billing.phase_date.trim();
    let execution_date = NaiveDate::parse_from_str(phase_date, PHASE_DATE_FORMAT).map_err(|_| {
        UfxError::InvalidField {
            field: "PhaseDate",
            value: phase_date.to_string(),
            index,
        }
    })?;

    let iso_number = doc.billing.currency.trim();
    let iso_code = currency::code_for_iso_number(iso_number).unwrap_or_default();

    Ok(IncomingInstruction {
        merchant: Merchant {
            contract_number: doc.originator.contract_number.trim().to_string(),
            reg_number: doc.contract_for.client.client_info.reg_number.trim().to_string(),
            name: doc.parm(parm_code::NAME).to_string(),
            email: doc.parm(parm_code::EMAIL).to_string(),
            address: Address {
                country: doc.parm(parm_code::OWNER_COUNTRY).to_string(),
                city: doc.parm(parm_code::CITY).to_string(),
                line1: doc.parm(parm_code::ADDRESS_LINE1).to_string(),
                line2: doc.parm(parm_code::ADDRESS_LINE2).to_string(),
            },
            account: Account {
                account_number: doc.parm(parm_code::IBAN).to_string(),
                swift: doc.parm(parm_code::SWIFT).to_string(),
                country: String::new(),
                swift_reference_number: doc.parm(parm_code::SWIFT_REFERENCE).to_string(),
                bank_country: doc.parm(parm_code::BANK_COUNTRY).to_string(),
            },
            high_risk,
        },
        payment: Payment {
            sender: sender.to_string(),
            amount: doc.billing.amount.trim().to_string(),
            currency: Currency {
                iso_code: iso_code.to_string(),
                iso_number: iso_number.to_string(),
            },
            execution_date,
        },
        metadata: Metadata {
            source: SOURCE.to_string(),
            file_type: FILE_TYPE.to_string(),
            filename: filename.to_string(),
            sender: sender.to_string(),
        },
        payment_correlation_id: String::new(),
    })
}

fn post_process(incoming: &mut IncomingInstruction, sender: &str) {
    let merchant = &mut incoming.merchant;
    if is_icelandic_sender(sender) && merchant.account.account_number.is_empty() {
        match iban::icelandic_iban(&merchant.account.swift, &merchant.reg_number) {
            Ok(synthesized) => merchant.account.account_number = synthesized,
            Err(e) => warn!(
                mid = %merchant.contract_number,
                error = %e,
                "Cannot synthesize IBAN, account number left empty"
            ),
        }
    }
    if is_saxo_sender(sender) {
        merchant.account.country = country_from_swift(&merchant.account.swift);
    }
}

/// Characters 5-6 of a BIC are its ISO 3166 country code
fn country_from_swift(swift: &str) -> String {
    swift
        .get(4..6)
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or_default()
}
