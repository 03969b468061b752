use thiserror::Error;

/// Whole-file decode failure. Any of these dead-letters the batch.
#[derive(Error, Debug)]
pub enum UfxError {
    #[error("File is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("XML syntax error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed <{element}> element: {reason}")]
    Element { element: &'static str, reason: String },

    #[error("Invalid {field} {value:?} in Doc {index}")]
    InvalidField {
        field: &'static str,
        value: String,
        index: usize,
    },

    #[error("Missing FileHeader")]
    MissingHeader,

    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
}

impl UfxError {
    pub(crate) fn element(element: &'static str, e: impl std::fmt::Display) -> Self {
        UfxError::Element {
            element,
            reason: e.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IbanError {
    #[error("Kennitala must be 10 digits, got {0:?}")]
    InvalidKennitala(String),

    #[error("Domestic account number must be 12 digits, got {0:?}")]
    InvalidAccount(String),
}
