//! Serde shapes of the UFX elements the decoder reads.
//!
//! Only `FileHeader` and individual `Doc` elements are deserialized; every
//! field defaults to empty so absent elements decode as "".

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileHeader {
    #[serde(rename = "Sender")]
    pub sender: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Doc {
    #[serde(rename = "Originator")]
    pub originator: Originator,
    #[serde(rename = "ContractFor")]
    pub contract_for: ContractFor,
    #[serde(rename = "Transaction")]
    pub transaction: Transaction,
    #[serde(rename = "Billing")]
    pub billing: Billing,
}

impl Doc {
    /// Value of the first `Parm` with the given code, or ""
    pub fn parm(&self, code: &str) -> &str {
        self.transaction
            .extra
            .add_data
            .parms
            .iter()
            .find(|p| p.code.trim() == code)
            .map(|p| p.value.trim())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Originator {
    #[serde(rename = "ContractNumber")]
    pub contract_number: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContractFor {
    #[serde(rename = "Client")]
    pub client: Client,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Client {
    #[serde(rename = "ClientInfo")]
    pub client_info: ClientInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientInfo {
    #[serde(rename = "RegNumber")]
    pub reg_number: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Transaction {
    #[serde(rename = "Extra")]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Extra {
    #[serde(rename = "AddData")]
    pub add_data: AddData,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddData {
    #[serde(rename = "Parm")]
    pub parms: Vec<Parm>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Parm {
    #[serde(rename = "ParmCode")]
    pub code: String,
    #[serde(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Billing {
    /// YYYY-MM-DD
    #[serde(rename = "PhaseDate")]
    pub phase_date: String,
    /// ISO 4217 numeric
    #[serde(rename = "Currency")]
    pub currency: String,
    #[serde(rename = "Amount")]
    pub amount: String,
}

/// `ParmCode` values mapped onto the merchant record
pub mod parm_code {
    pub const NAME: &str = "Name";
    pub const EMAIL: &str = "Email";
    pub const ADDRESS_LINE1: &str = "Address1";
    pub const ADDRESS_LINE2: &str = "Address2";
    pub const CITY: &str = "City";
    pub const OWNER_COUNTRY: &str = "OwnerCountry";
    pub const IBAN: &str = "IBAN";
    pub const SWIFT: &str = "SWIFT";
    pub const SWIFT_REFERENCE: &str = "SwiftRef";
    pub const BANK_COUNTRY: &str = "BankCountry";
}
