//! Core DICOM data model for DCMflow: data element tags, value
//! representations, tag paths, transfer syntaxes, character set observation,
//! and the data element dictionary.

pub mod character_set;
pub mod data_element_tag;
pub mod dictionary;
pub mod error;
pub mod tag_path;
pub mod transfer_syntax;
pub mod uids;
pub mod value_representation;

pub use character_set::SpecificCharacterSets;
pub use data_element_tag::DataElementTag;
pub use error::DcmflowError;
pub use tag_path::{TagPath, TagPathEntry};
pub use transfer_syntax::TransferSyntax;
pub use value_representation::ValueRepresentation;
