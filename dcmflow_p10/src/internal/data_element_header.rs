//! A parsed data element header: its tag, VR, and value length, along with
//! the serialization layouts used by the different transfer encodings.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use dcmflow_core::{dictionary, DataElementTag, ValueRepresentation};

use crate::internal::value_length::ValueLength;

/// The header for a data element as read off or written onto the wire. The VR
/// is `None` for the item and delimitation tags, which never carry one.
///
#[derive(Clone, Debug, PartialEq)]
pub struct DataElementHeader {
  pub tag: DataElementTag,
  pub vr: Option<ValueRepresentation>,
  pub length: ValueLength,
}

/// The number of bytes the value length of a data element occupies when
/// serialized with an explicit VR.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ValueLengthSize {
  U16,
  U32,
}

impl ValueLengthSize {
  /// The largest value length representable at this size. `0xFFFFFFFF` is
  /// excluded because it denotes an undefined length.
  ///
  pub fn max_length(self) -> usize {
    match self {
      ValueLengthSize::U16 => 0xFFFF,
      ValueLengthSize::U32 => 0xFFFF_FFFE,
    }
  }
}

impl DataElementHeader {
  /// Returns the size of the value length for a VR when serialized with
  /// explicit VRs. VRs with a 32-bit length have a 12-byte header that
  /// includes two reserved bytes.
  ///
  pub fn value_length_size(vr: ValueRepresentation) -> ValueLengthSize {
    match vr {
      ValueRepresentation::AgeString
      | ValueRepresentation::ApplicationEntity
      | ValueRepresentation::AttributeTag
      | ValueRepresentation::CodeString
      | ValueRepresentation::Date
      | ValueRepresentation::DateTime
      | ValueRepresentation::DecimalString
      | ValueRepresentation::FloatingPointDouble
      | ValueRepresentation::FloatingPointSingle
      | ValueRepresentation::IntegerString
      | ValueRepresentation::LongString
      | ValueRepresentation::LongText
      | ValueRepresentation::PersonName
      | ValueRepresentation::ShortString
      | ValueRepresentation::ShortText
      | ValueRepresentation::SignedLong
      | ValueRepresentation::SignedShort
      | ValueRepresentation::Time
      | ValueRepresentation::UniqueIdentifier
      | ValueRepresentation::UnsignedLong
      | ValueRepresentation::UnsignedShort => ValueLengthSize::U16,

      ValueRepresentation::OtherByteString
      | ValueRepresentation::OtherDoubleString
      | ValueRepresentation::OtherFloatString
      | ValueRepresentation::OtherLongString
      | ValueRepresentation::OtherVeryLongString
      | ValueRepresentation::OtherWordString
      | ValueRepresentation::Sequence
      | ValueRepresentation::SignedVeryLong
      | ValueRepresentation::UniversalResourceIdentifier
      | ValueRepresentation::Unknown
      | ValueRepresentation::UnlimitedCharacters
      | ValueRepresentation::UnlimitedText
      | ValueRepresentation::UnsignedVeryLong => ValueLengthSize::U32,
    }
  }

  /// Serializes a data element header to its on-the-wire bytes. This is
  /// either 8 or 12 bytes depending on the VR serialization mode and, for
  /// explicit VRs, on the VR's value length size.
  ///
  pub fn to_bytes(&self, big_endian: bool, explicit_vr: bool) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(12);

    let put_u16 = |bytes: &mut Vec<u8>, value: u16| {
      let mut buffer = [0u8; 2];
      if big_endian {
        BigEndian::write_u16(&mut buffer, value);
      } else {
        LittleEndian::write_u16(&mut buffer, value);
      }
      bytes.extend_from_slice(&buffer);
    };

    let put_u32 = |bytes: &mut Vec<u8>, value: u32| {
      let mut buffer = [0u8; 4];
      if big_endian {
        BigEndian::write_u32(&mut buffer, value);
      } else {
        LittleEndian::write_u32(&mut buffer, value);
      }
      bytes.extend_from_slice(&buffer);
    };

    put_u16(&mut bytes, self.tag.group);
    put_u16(&mut bytes, self.tag.element);

    match self.vr {
      Some(vr) if explicit_vr => {
        bytes.extend_from_slice(&vr.to_bytes());

        match Self::value_length_size(vr) {
          ValueLengthSize::U16 => {
            put_u16(&mut bytes, self.length.to_int() as u16);
          }
          ValueLengthSize::U32 => {
            bytes.extend_from_slice(&[0, 0]);
            put_u32(&mut bytes, self.length.to_int());
          }
        }
      }

      _ => put_u32(&mut bytes, self.length.to_int()),
    }

    bytes
  }
}

impl core::fmt::Display for DataElementHeader {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    write!(
      f,
      "{}, vr: {}, length: {}",
      dictionary::tag_with_name(self.tag),
      self
        .vr
        .map(|vr| vr.to_string())
        .unwrap_or_else(|| "none".to_string()),
      self.length
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn to_bytes_explicit_short_test() {
    let header = DataElementHeader {
      tag: DataElementTag::new(0x0010, 0x0010),
      vr: Some(ValueRepresentation::PersonName),
      length: ValueLength::new(4),
    };

    assert_eq!(
      header.to_bytes(false, true),
      vec![0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x04, 0x00]
    );

    assert_eq!(
      header.to_bytes(true, true),
      vec![0x00, 0x10, 0x00, 0x10, b'P', b'N', 0x00, 0x04]
    );
  }

  #[test]
  fn to_bytes_explicit_long_test() {
    let header = DataElementHeader {
      tag: DataElementTag::new(0x7FE0, 0x0010),
      vr: Some(ValueRepresentation::OtherByteString),
      length: ValueLength::Undefined,
    };

    assert_eq!(
      header.to_bytes(false, true),
      vec![
        0xE0, 0x7F, 0x10, 0x00, b'O', b'B', 0x00, 0x00, 0xFF, 0xFF, 0xFF,
        0xFF
      ]
    );
  }

  #[test]
  fn very_long_vrs_use_32_bit_lengths_test() {
    assert_eq!(
      DataElementHeader::value_length_size(
        ValueRepresentation::SignedVeryLong
      ),
      ValueLengthSize::U32
    );
    assert_eq!(
      DataElementHeader::value_length_size(
        ValueRepresentation::UnsignedVeryLong
      ),
      ValueLengthSize::U32
    );
  }

  #[test]
  fn to_bytes_implicit_test() {
    let header = DataElementHeader {
      tag: DataElementTag::new(0x0008, 0x0020),
      vr: Some(ValueRepresentation::Date),
      length: ValueLength::new(8),
    };

    assert_eq!(
      header.to_bytes(false, false),
      vec![0x08, 0x00, 0x20, 0x00, 0x08, 0x00, 0x00, 0x00]
    );
  }
}
