//! The error type used by all DICOM P10 streaming operations.

use dcmflow_core::{DataElementTag, DcmflowError, TagPath};

use crate::P10Part;

/// An error that occurred when reading, validating, or transforming a stream
/// of DICOM P10 data.
///
#[derive(Clone, Debug, PartialEq)]
pub enum P10Error {
  /// More data is required before the next part can be produced. This is not
  /// a terminal error: write further bytes and try again.
  DataRequired { when: String },

  /// The end of the incoming data was reached when further bytes were still
  /// required.
  DataEndedUnexpectedly {
    when: String,
    path: TagPath,
    offset: u64,
  },

  /// The incoming data is not valid DICOM P10 data.
  DataInvalid {
    when: String,
    details: String,
    path: TagPath,
    offset: u64,
  },

  /// The transfer syntax specified in the File Meta Information is not
  /// supported.
  TransferSyntaxNotSupported { transfer_syntax_uid: String },

  /// A configured maximum was exceeded while streaming, e.g. the maximum
  /// sequence depth or a transform's buffer cap.
  MaximumExceeded {
    details: String,
    path: TagPath,
    offset: u64,
  },

  /// The stream did not satisfy its validation gate, e.g. its File Meta
  /// Information did not match any of the allowed presentation contexts.
  ValidationFailed { details: String },

  /// A data element insertion targeted a tag that is not in the dictionary,
  /// so no VR is available to serialize a header for it.
  InsertionTagNotRecognized { tag: DataElementTag },

  /// A data element insertion targeted a tag whose VR is SQ. Sequences
  /// cannot be synthesized into a part stream.
  InsertionOfSequenceNotSupported { path: TagPath },

  /// A stream of parts fed into a transform was itself malformed, e.g. a
  /// delimiter arrived with no open sequence.
  PartStreamInvalid {
    when: String,
    details: String,
    part: Box<P10Part>,
  },

  /// Data was supplied after the incoming stream was marked complete.
  WriteAfterCompletion,

  /// An error occurred when reading or writing an underlying file or stream.
  FileError { when: String, details: String },
}

impl P10Error {
  /// Returns the name of an error as a human-readable string.
  ///
  pub fn name(&self) -> String {
    match self {
      P10Error::DataRequired { .. } => "Data required".to_string(),
      P10Error::DataEndedUnexpectedly { .. } => {
        "Unexpected end of data".to_string()
      }
      P10Error::DataInvalid { .. } => "Invalid data".to_string(),
      P10Error::TransferSyntaxNotSupported {
        transfer_syntax_uid,
      } => {
        format!("Unsupported transfer syntax: {}", transfer_syntax_uid)
      }
      P10Error::MaximumExceeded { .. } => "Maximum exceeded".to_string(),
      P10Error::ValidationFailed { .. } => "Validation failed".to_string(),
      P10Error::InsertionTagNotRecognized { tag } => {
        format!("Insertion tag not recognized: {}", tag)
      }
      P10Error::InsertionOfSequenceNotSupported { path } => {
        format!("Insertion of sequence not supported: {}", path)
      }
      P10Error::PartStreamInvalid { .. } => "Part stream invalid".to_string(),
      P10Error::WriteAfterCompletion => {
        "Write after completion".to_string()
      }
      P10Error::FileError { .. } => "File error".to_string(),
    }
  }
}

impl DcmflowError for P10Error {
  /// Returns lines of text that describe a P10 error in a human-readable
  /// format.
  ///
  fn to_lines(&self, task_description: &str) -> Vec<String> {
    let mut lines = vec![
      format!("DICOM P10 error {}", task_description),
      "".to_string(),
      format!("  Error: {}", self.name()),
    ];

    match self {
      P10Error::DataRequired { when }
      | P10Error::FileError { when, .. } => {
        lines.push(format!("  When: {}", when));
      }

      P10Error::DataEndedUnexpectedly { when, path, offset } => {
        lines.push(format!("  When: {}", when));
        lines.push(format!("  Path: {}", path));
        lines.push(format!("  Offset: 0x{:X}", offset));
      }

      P10Error::DataInvalid {
        when,
        details,
        path,
        offset,
      } => {
        lines.push(format!("  When: {}", when));
        lines.push(format!("  Details: {}", details));
        lines.push(format!("  Path: {}", path));
        lines.push(format!("  Offset: 0x{:X}", offset));
      }

      P10Error::MaximumExceeded {
        details,
        path,
        offset,
      } => {
        lines.push(format!("  Details: {}", details));
        lines.push(format!("  Path: {}", path));
        lines.push(format!("  Offset: 0x{:X}", offset));
      }

      P10Error::ValidationFailed { details } => {
        lines.push(format!("  Details: {}", details));
      }

      P10Error::PartStreamInvalid { when, details, part } => {
        lines.push(format!("  When: {}", when));
        lines.push(format!("  Details: {}", details));
        lines.push(format!("  Part: {}", part));
      }

      _ => (),
    };

    lines
  }
}

impl core::fmt::Display for P10Error {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    f.write_str(&self.name())
  }
}
