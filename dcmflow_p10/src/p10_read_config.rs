//! Configuration used when reading DICOM P10 data.

/// Configuration used when reading DICOM P10 data.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct P10ReadConfig {
  pub(crate) max_part_size: u32,
  pub(crate) max_sequence_depth: usize,
  pub(crate) require_ordered_data_elements: bool,
  pub(crate) assume_big_endian: bool,
  pub(crate) assume_explicit_vr: bool,
  pub(crate) inflate_deflated: bool,
}

impl Default for P10ReadConfig {
  fn default() -> Self {
    Self {
      max_part_size: 256 * 1024,
      max_sequence_depth: 10_000,
      require_ordered_data_elements: true,
      assume_big_endian: false,
      assume_explicit_vr: true,
      inflate_deflated: true,
    }
  }
}

impl P10ReadConfig {
  /// The maximum size in bytes of the data carried by a single
  /// [`crate::P10Part::DataElementValueBytes`] part. Values longer than this
  /// are split across multiple parts, bounding the memory used by a
  /// streaming read regardless of value lengths in the data. Rounded down to
  /// a multiple of 8.
  ///
  /// Default: 256 KiB.
  ///
  pub fn max_part_size(mut self, value: u32) -> Self {
    self.max_part_size = (value / 8).max(1) * 8;
    self
  }

  /// The maximum sequence nesting depth that can be read. Exceeding it
  /// errors the read, which protects against malformed or malicious data
  /// that nests sequences unboundedly.
  ///
  /// Default: ten thousand, i.e. no meaningful maximum is enforced.
  ///
  pub fn max_sequence_depth(mut self, value: usize) -> Self {
    self.max_sequence_depth = value;
    self
  }

  /// Whether to error if data elements are not in ascending tag order within
  /// their enclosing scope. Such data is malformed but can still be read
  /// when this is disabled.
  ///
  /// Default: enforced.
  ///
  pub fn require_ordered_data_elements(mut self, value: bool) -> Self {
    self.require_ordered_data_elements = value;
    self
  }

  /// The byte order assumed for data that has no File Preamble and no File
  /// Meta Information to declare its transfer syntax. This assumption is
  /// revisited if the first data element header is implausible in the
  /// assumed byte order.
  ///
  /// Default: little endian.
  ///
  pub fn assume_big_endian(mut self, value: bool) -> Self {
    self.assume_big_endian = value;
    self
  }

  /// The VR serialization mode assumed for data that has no File Preamble
  /// and no File Meta Information to declare its transfer syntax.
  ///
  /// Default: explicit VR.
  ///
  pub fn assume_explicit_vr(mut self, value: bool) -> Self {
    self.assume_explicit_vr = value;
    self
  }

  /// Whether data using a deflated transfer syntax is transparently inflated
  /// as it is read, continuing the part stream as normal. When disabled, the
  /// raw deflated bytes are emitted as [`crate::P10Part::DeflatedChunk`]
  /// parts instead.
  ///
  /// Default: enabled.
  ///
  pub fn inflate_deflated(mut self, value: bool) -> Self {
    self.inflate_deflated = value;
    self
  }
}
