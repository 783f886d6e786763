//! Streaming engine for the DICOM Part 10 (P10) binary format.
//!
//! Raw DICOM P10 bytes are parsed into a stream of [`P10Part`] values that
//! carry their exact on-the-wire bytes, so a part stream can be validated,
//! rewritten, and harvested without ever materializing the data set, and
//! serializing the parts back out reproduces the input byte for byte.

pub mod p10_error;
pub mod p10_part;
pub mod p10_read;
pub mod p10_read_config;
pub mod pipeline;
pub mod tag_path_tracker;
pub mod transforms;

mod internal;

use std::path::Path;

pub use p10_error::P10Error;
pub use p10_part::{CollectedElement, P10Part};
pub use p10_read::P10ReadContext;
pub use p10_read_config::P10ReadConfig;
pub use pipeline::P10Pipeline;
pub use tag_path_tracker::TagPathTracker;
pub use transforms::p10_collect_transform::P10CollectTransform;
pub use transforms::p10_modify_transform::{
  P10ModifyTransform, TagModification, ValueTransform,
};
pub use transforms::p10_validate_transform::{
  P10ValidateTransform, ValidationContext,
};

/// Returns whether a file contains DICOM P10 data by checking for the
/// presence of the "DICM" prefix at offset 128.
///
pub fn is_valid_file<P: AsRef<Path>>(filename: P) -> bool {
  use std::io::Read;

  match std::fs::File::open(filename) {
    Ok(mut file) => {
      let mut buffer = [0u8; 132];
      match file.read_exact(&mut buffer) {
        Ok(_) => is_valid_bytes(&buffer),
        Err(_) => false,
      }
    }

    Err(_) => false,
  }
}

/// Returns whether the given bytes contain DICOM P10 data by checking for
/// the presence of the "DICM" prefix at offset 128.
///
pub fn is_valid_bytes(bytes: &[u8]) -> bool {
  bytes.len() >= 132 && bytes[128..132] == *b"DICM"
}

/// Reads the next DICOM P10 parts from a read stream. This repeatedly reads
/// chunks of bytes from the read stream until at least one DICOM P10 part is
/// made available by the pipeline or an error occurs.
///
/// The chunk size defaults to 256 KiB if not specified.
///
pub fn read_parts_from_stream<S: std::io::Read>(
  stream: &mut S,
  pipeline: &mut P10Pipeline,
  chunk_size: Option<usize>,
) -> Result<Vec<P10Part>, P10Error> {
  let chunk_size = chunk_size.unwrap_or(256 * 1024);

  loop {
    match pipeline.read_parts() {
      Ok(parts) => {
        if parts.is_empty() {
          continue;
        } else {
          return Ok(parts);
        }
      }

      // If the pipeline needs more data then read bytes from the stream,
      // write them to the pipeline, and try again
      Err(P10Error::DataRequired { .. }) => {
        let mut buffer = vec![0u8; chunk_size];

        let read_bytes_count =
          stream.read(&mut buffer).map_err(|e| P10Error::FileError {
            when: "Reading from stream".to_string(),
            details: e.to_string(),
          })?;

        if read_bytes_count == 0 {
          pipeline.write_bytes(vec![], true)?;
        } else {
          buffer.truncate(read_bytes_count);
          pipeline.write_bytes(buffer, false)?;
        }
      }

      e => return e,
    }
  }
}

/// Reads all DICOM P10 parts from a read stream, through the given
/// pipeline, until the end of the data is reached.
///
pub fn parse_stream<S: std::io::Read>(
  stream: &mut S,
  pipeline: &mut P10Pipeline,
) -> Result<Vec<P10Part>, P10Error> {
  let mut parts = vec![];

  loop {
    let next_parts = read_parts_from_stream(stream, pipeline, None)?;

    let is_at_end = next_parts.last() == Some(&P10Part::End);

    parts.extend(next_parts);

    if is_at_end {
      return Ok(parts);
    }
  }
}

/// Reads all DICOM P10 parts from a vector of bytes.
///
pub fn parse_bytes(
  bytes: Vec<u8>,
  config: Option<P10ReadConfig>,
) -> Result<Vec<P10Part>, P10Error> {
  let mut context = P10ReadContext::new(config);
  context.write_bytes(bytes, true)?;

  let mut parts = vec![];

  loop {
    let next_parts = context.read_parts()?;

    let is_at_end = next_parts.last() == Some(&P10Part::End);

    parts.extend(next_parts);

    if is_at_end {
      return Ok(parts);
    }
  }
}

/// Reads all DICOM P10 parts from a file.
///
pub fn parse_file<P: AsRef<Path>>(
  filename: P,
) -> Result<Vec<P10Part>, P10Error> {
  match std::fs::File::open(filename) {
    Ok(mut file) => {
      parse_stream(&mut file, &mut P10Pipeline::new(None))
    }

    Err(e) => Err(P10Error::FileError {
      when: "Opening file".to_string(),
      details: e.to_string(),
    }),
  }
}
