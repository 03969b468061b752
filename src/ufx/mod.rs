//! UFX batch format
//!
//! XML batches delivered by the upstream card-processing system:
//!
//! ```text
//! DocFile
//! ├── FileHeader/Sender
//! ├── DocList/Doc*
//! │   ├── Originator/ContractNumber
//! │   ├── ContractFor/Client/ClientInfo/RegNumber
//! │   ├── Transaction/Extra/AddData/Parm* (ParmCode, Value)
//! │   └── Billing/{PhaseDate, Currency, Amount}
//! └── FileTrailer/CheckSum
//! ```

pub mod decoder;
pub mod error;
pub mod iban;
pub mod model;

pub use decoder::{decode, filter_currency};
pub use error::{IbanError, UfxError};
