//! Transforms that operate on a stream of DICOM P10 bytes or parts and
//! validate it, alter its content, or extract data from it.

pub mod p10_collect_transform;
pub mod p10_modify_transform;
pub mod p10_validate_transform;
