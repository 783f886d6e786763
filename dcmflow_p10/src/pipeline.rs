//! Wires the validate, read, modify, and collect stages into a single
//! streaming pipeline.

use crate::{
  P10CollectTransform, P10Error, P10ModifyTransform, P10Part,
  P10ReadConfig, P10ReadContext, P10ValidateTransform,
};

/// A complete DICOM P10 streaming pipeline: an optional byte-level
/// validation gate ahead of the parser, followed by optional modify and
/// collect transforms over the resulting parts.
///
/// Bytes are pushed in with [`Self::write_bytes`] and parts are pulled out
/// with [`Self::read_parts`], so the pipeline is driven entirely by
/// downstream demand. The stages run in a fixed order: validate, read,
/// modify, collect.
///
pub struct P10Pipeline {
  validate: Option<P10ValidateTransform>,
  context: P10ReadContext,
  modify: Option<P10ModifyTransform>,
  collect: Option<P10CollectTransform>,
}

impl P10Pipeline {
  /// Creates a new pipeline that parses DICOM P10 data into parts.
  ///
  pub fn new(config: Option<P10ReadConfig>) -> Self {
    Self {
      validate: None,
      context: P10ReadContext::new(config),
      modify: None,
      collect: None,
    }
  }

  /// Adds a validation gate ahead of the parser.
  ///
  pub fn validate(mut self, transform: P10ValidateTransform) -> Self {
    self.validate = Some(transform);
    self
  }

  /// Adds a modify transform over the parsed parts.
  ///
  pub fn modify(mut self, transform: P10ModifyTransform) -> Self {
    self.modify = Some(transform);
    self
  }

  /// Adds a collect transform over the parsed parts. It runs after the
  /// modify transform when both are present.
  ///
  pub fn collect(mut self, transform: P10CollectTransform) -> Self {
    self.collect = Some(transform);
    self
  }

  /// Writes the next chunk of raw DICOM P10 bytes into the pipeline. `done`
  /// is true on the final chunk.
  ///
  pub fn write_bytes(
    &mut self,
    bytes: Vec<u8>,
    done: bool,
  ) -> Result<(), P10Error> {
    let Some(validate) = self.validate.as_mut() else {
      return self.context.write_bytes(bytes, done);
    };

    let chunks = validate.add_bytes(&bytes, done)?;

    let chunk_count = chunks.len();
    for (i, chunk) in chunks.into_iter().enumerate() {
      self.context.write_bytes(chunk, done && i + 1 == chunk_count)?;
    }

    // The gate held everything back, but the end of the stream must still
    // be signalled to the parser
    if chunk_count == 0 && done {
      self.context.write_bytes(vec![], true)?;
    }

    Ok(())
  }

  /// Reads the next DICOM P10 parts from the pipeline, with all configured
  /// transforms applied. A [`P10Error::DataRequired`] error means more bytes
  /// must be written first.
  ///
  pub fn read_parts(&mut self) -> Result<Vec<P10Part>, P10Error> {
    let mut parts = self.context.read_parts()?;

    if let Some(modify) = self.modify.as_mut() {
      let mut transformed = Vec::with_capacity(parts.len());
      for part in &parts {
        transformed.append(&mut modify.add_part(part)?);
      }
      parts = transformed;
    }

    if let Some(collect) = self.collect.as_mut() {
      let mut transformed = Vec::with_capacity(parts.len());
      for part in &parts {
        transformed.append(&mut collect.add_part(part)?);
      }
      parts = transformed;
    }

    Ok(parts)
  }
}
