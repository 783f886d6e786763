//! Defines the parts of a DICOM P10 stream that are read out of raw DICOM
//! P10 data by the `p10_read` module.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use dcmflow_core::{
  dictionary, DataElementTag, SpecificCharacterSets, ValueRepresentation,
};

use crate::internal::value_length::UNDEFINED_LENGTH;

/// A DICOM P10 part is the smallest piece of structured DICOM P10 data, and
/// a stream of these parts is the result of progressive reading of raw DICOM
/// P10 bytes.
///
/// Every part that originates from the wire carries its exact on-the-wire
/// bytes, so concatenating the bytes of all parts in a stream reproduces the
/// original data.
///
#[derive(Clone, Debug, PartialEq)]
pub enum P10Part {
  /// The 128-byte File Preamble and the "DICM" prefix that follows it. Only
  /// emitted when the preamble is present in the input. 132 bytes.
  FilePreambleAndDICMPrefix { bytes: Vec<u8> },

  /// The header of a data element, either in the File Meta Information
  /// (`is_fmi` is true) or in the main data set. This part is always
  /// followed by one or more [`P10Part::DataElementValueBytes`] parts
  /// containing the element's value.
  DataElementHeader {
    tag: DataElementTag,
    vr: ValueRepresentation,
    length: u32,
    is_fmi: bool,
    big_endian: bool,
    explicit_vr: bool,
    bytes: Vec<u8>,
  },

  /// A slice of the value of the current data element or pixel data
  /// fragment. Values longer than the configured maximum part size are split
  /// across multiple of these parts; `bytes_remaining` is zero on the final
  /// part of a value.
  DataElementValueBytes {
    data: Vec<u8>,
    bytes_remaining: u32,
    big_endian: bool,
  },

  /// The header of a sequence. A `length` of `0xFFFFFFFF` means the
  /// sequence has undefined length and is closed by a
  /// [`P10Part::SequenceDelimiter`].
  SequenceStart {
    tag: DataElementTag,
    length: u32,
    big_endian: bool,
    explicit_vr: bool,
    bytes: Vec<u8>,
  },

  /// The end of the current sequence or of an encapsulated pixel data
  /// stream. `bytes` is empty when the sequence had a defined length and was
  /// closed implicitly.
  SequenceDelimiter { big_endian: bool, bytes: Vec<u8> },

  /// The start of an item in the current sequence or encapsulated pixel
  /// data stream. Item indices are one-based and strictly increasing within
  /// a sequence.
  SequenceItemStart {
    index: u32,
    length: u32,
    big_endian: bool,
    bytes: Vec<u8>,
  },

  /// The end of the current sequence item. `bytes` is empty when the item
  /// had a defined length and was closed implicitly.
  SequenceItemDelimiter {
    index: u32,
    big_endian: bool,
    bytes: Vec<u8>,
  },

  /// The start of an encapsulated pixel data stream. The fragments that
  /// follow arrive as [`P10Part::SequenceItemStart`] parts whose data
  /// arrives as [`P10Part::DataElementValueBytes`] parts.
  FragmentsStart {
    tag: DataElementTag,
    vr: ValueRepresentation,
    big_endian: bool,
    bytes: Vec<u8>,
  },

  /// A chunk of raw deflated bytes following the File Meta Information of
  /// data using a deflated transfer syntax, emitted when transparent
  /// inflation is disabled.
  DeflatedChunk { data: Vec<u8>, big_endian: bool },

  /// A part of the stream that was framed correctly but could not be
  /// interpreted. Parsing continues after it.
  Unknown { big_endian: bool, bytes: Vec<u8> },

  /// The elements harvested by a collect transform, emitted ahead of the
  /// parts they were harvested from. Synthetic: carries no wire bytes.
  CollectedElements {
    label: String,
    character_sets: SpecificCharacterSets,
    elements: Vec<CollectedElement>,
  },

  /// The end of the DICOM P10 data has been reached with all provided data
  /// successfully parsed.
  End,
}

/// A single data element harvested from a part stream by a collect
/// transform. `bytes` holds the element's complete value.
///
#[derive(Clone, Debug, PartialEq)]
pub struct CollectedElement {
  pub tag: DataElementTag,
  pub vr: ValueRepresentation,
  pub length: u32,
  pub big_endian: bool,
  pub explicit_vr: bool,
  pub bytes: Vec<u8>,
}

impl P10Part {
  /// Returns the exact on-the-wire bytes for a part. Synthetic parts such as
  /// [`P10Part::End`] and implicit delimiters return an empty slice, so the
  /// concatenation of all parts' bytes always reproduces the input data.
  ///
  pub fn bytes(&self) -> &[u8] {
    match self {
      P10Part::FilePreambleAndDICMPrefix { bytes }
      | P10Part::DataElementHeader { bytes, .. }
      | P10Part::SequenceStart { bytes, .. }
      | P10Part::SequenceDelimiter { bytes, .. }
      | P10Part::SequenceItemStart { bytes, .. }
      | P10Part::SequenceItemDelimiter { bytes, .. }
      | P10Part::FragmentsStart { bytes, .. }
      | P10Part::Unknown { bytes, .. } => bytes,

      P10Part::DataElementValueBytes { data, .. }
      | P10Part::DeflatedChunk { data, .. } => data,

      P10Part::CollectedElements { .. } | P10Part::End => &[],
    }
  }

  /// Returns whether a part uses big endian byte order. Synthetic parts
  /// report little endian.
  ///
  pub fn is_big_endian(&self) -> bool {
    match self {
      P10Part::DataElementHeader { big_endian, .. }
      | P10Part::DataElementValueBytes { big_endian, .. }
      | P10Part::SequenceStart { big_endian, .. }
      | P10Part::SequenceDelimiter { big_endian, .. }
      | P10Part::SequenceItemStart { big_endian, .. }
      | P10Part::SequenceItemDelimiter { big_endian, .. }
      | P10Part::FragmentsStart { big_endian, .. }
      | P10Part::DeflatedChunk { big_endian, .. }
      | P10Part::Unknown { big_endian, .. } => *big_endian,

      P10Part::FilePreambleAndDICMPrefix { .. }
      | P10Part::CollectedElements { .. }
      | P10Part::End => false,
    }
  }

  /// Returns a copy of a [`P10Part::DataElementHeader`] part with its value
  /// length changed to the given value, with the length field of its wire
  /// bytes rewritten accordingly. Other parts are returned unchanged.
  ///
  pub fn with_updated_length(&self, new_length: u32) -> P10Part {
    match self {
      P10Part::DataElementHeader {
        tag,
        vr,
        is_fmi,
        big_endian,
        explicit_vr,
        bytes,
        ..
      } => {
        let mut bytes = bytes.clone();

        // The length field is the final two or four bytes of the header
        // depending on its layout
        match (*explicit_vr, bytes.len()) {
          (true, 8) => {
            if *big_endian {
              BigEndian::write_u16(&mut bytes[6..8], new_length as u16);
            } else {
              LittleEndian::write_u16(&mut bytes[6..8], new_length as u16);
            }
          }

          (true, _) => {
            if *big_endian {
              BigEndian::write_u32(&mut bytes[8..12], new_length);
            } else {
              LittleEndian::write_u32(&mut bytes[8..12], new_length);
            }
          }

          (false, _) => {
            if *big_endian {
              BigEndian::write_u32(&mut bytes[4..8], new_length);
            } else {
              LittleEndian::write_u32(&mut bytes[4..8], new_length);
            }
          }
        }

        P10Part::DataElementHeader {
          tag: *tag,
          vr: *vr,
          length: new_length,
          is_fmi: *is_fmi,
          big_endian: *big_endian,
          explicit_vr: *explicit_vr,
          bytes,
        }
      }

      _ => self.clone(),
    }
  }
}

impl core::fmt::Display for P10Part {
  /// Converts a DICOM P10 part to a human-readable string.
  ///
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    let s = match self {
      P10Part::FilePreambleAndDICMPrefix { .. } => {
        "FilePreambleAndDICMPrefix".to_string()
      }

      P10Part::DataElementHeader {
        tag, vr, length, ..
      } => format!(
        "DataElementHeader: {}, name: {}, vr: {}, length: {} bytes",
        tag,
        dictionary::tag_name(*tag),
        vr,
        length
      ),

      P10Part::DataElementValueBytes {
        data,
        bytes_remaining,
        ..
      } => format!(
        "DataElementValueBytes: {} bytes of data, {} bytes remaining",
        data.len(),
        bytes_remaining
      ),

      P10Part::SequenceStart { tag, length, .. } => format!(
        "SequenceStart: {}, name: {}, length: {}",
        tag,
        dictionary::tag_name(*tag),
        if *length == UNDEFINED_LENGTH {
          "UNDEFINED".to_string()
        } else {
          format!("{} bytes", length)
        }
      ),

      P10Part::SequenceDelimiter { .. } => "SequenceDelimiter".to_string(),

      P10Part::SequenceItemStart { index, length, .. } => format!(
        "SequenceItemStart: item {}, length: {}",
        index,
        if *length == UNDEFINED_LENGTH {
          "UNDEFINED".to_string()
        } else {
          format!("{} bytes", length)
        }
      ),

      P10Part::SequenceItemDelimiter { index, .. } => {
        format!("SequenceItemDelimiter: item {}", index)
      }

      P10Part::FragmentsStart { tag, vr, .. } => format!(
        "FragmentsStart: {}, name: {}, vr: {}",
        tag,
        dictionary::tag_name(*tag),
        vr
      ),

      P10Part::DeflatedChunk { data, .. } => {
        format!("DeflatedChunk: {} bytes", data.len())
      }

      P10Part::Unknown { bytes, .. } => {
        format!("Unknown: {} bytes", bytes.len())
      }

      P10Part::CollectedElements {
        label, elements, ..
      } => format!(
        "CollectedElements: label: {}, {} elements",
        label,
        elements.len()
      ),

      P10Part::End => "End".to_string(),
    };

    f.write_str(&s)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn with_updated_length_explicit_short_test() {
    let part = P10Part::DataElementHeader {
      tag: DataElementTag::new(0x0010, 0x0010),
      vr: ValueRepresentation::PersonName,
      length: 8,
      is_fmi: false,
      big_endian: false,
      explicit_vr: true,
      bytes: vec![0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x08, 0x00],
    };

    assert_eq!(
      part.with_updated_length(4),
      P10Part::DataElementHeader {
        tag: DataElementTag::new(0x0010, 0x0010),
        vr: ValueRepresentation::PersonName,
        length: 4,
        is_fmi: false,
        big_endian: false,
        explicit_vr: true,
        bytes: vec![0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x04, 0x00],
      }
    );
  }

  #[test]
  fn with_updated_length_explicit_long_test() {
    let part = P10Part::DataElementHeader {
      tag: DataElementTag::new(0x7FE0, 0x0010),
      vr: ValueRepresentation::OtherByteString,
      length: 0,
      is_fmi: false,
      big_endian: true,
      explicit_vr: true,
      bytes: vec![
        0x7F, 0xE0, 0x00, 0x10, b'O', b'B', 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00,
      ],
    };

    let updated = part.with_updated_length(0x0102_0304);

    assert_eq!(
      updated.bytes(),
      &[
        0x7F, 0xE0, 0x00, 0x10, b'O', b'B', 0x00, 0x00, 0x01, 0x02, 0x03,
        0x04
      ]
    );
  }

  #[test]
  fn with_updated_length_implicit_test() {
    let part = P10Part::DataElementHeader {
      tag: DataElementTag::new(0x0008, 0x0020),
      vr: ValueRepresentation::Date,
      length: 8,
      is_fmi: false,
      big_endian: false,
      explicit_vr: false,
      bytes: vec![0x08, 0x00, 0x20, 0x00, 0x08, 0x00, 0x00, 0x00],
    };

    assert_eq!(
      part.with_updated_length(2).bytes(),
      &[0x08, 0x00, 0x20, 0x00, 0x02, 0x00, 0x00, 0x00]
    );
  }
}
