//! DICOM value representations (VRs).

/// All DICOM value representations (VRs) as defined in DICOM PS3.5 6.2.
///
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ValueRepresentation {
  AgeString,
  ApplicationEntity,
  AttributeTag,
  CodeString,
  Date,
  DateTime,
  DecimalString,
  FloatingPointDouble,
  FloatingPointSingle,
  IntegerString,
  LongString,
  LongText,
  OtherByteString,
  OtherDoubleString,
  OtherFloatString,
  OtherLongString,
  OtherVeryLongString,
  OtherWordString,
  PersonName,
  Sequence,
  ShortString,
  ShortText,
  SignedLong,
  SignedShort,
  SignedVeryLong,
  Time,
  UniqueIdentifier,
  UniversalResourceIdentifier,
  Unknown,
  UnlimitedCharacters,
  UnlimitedText,
  UnsignedLong,
  UnsignedShort,
  UnsignedVeryLong,
}

impl ValueRepresentation {
  /// Converts the two bytes of a VR as stored in explicit VR transfer syntaxes
  /// into a [`ValueRepresentation`].
  ///
  pub fn from_bytes(bytes: &[u8]) -> Result<ValueRepresentation, ()> {
    match bytes {
      b"AE" => Ok(ValueRepresentation::ApplicationEntity),
      b"AS" => Ok(ValueRepresentation::AgeString),
      b"AT" => Ok(ValueRepresentation::AttributeTag),
      b"CS" => Ok(ValueRepresentation::CodeString),
      b"DA" => Ok(ValueRepresentation::Date),
      b"DS" => Ok(ValueRepresentation::DecimalString),
      b"DT" => Ok(ValueRepresentation::DateTime),
      b"FD" => Ok(ValueRepresentation::FloatingPointDouble),
      b"FL" => Ok(ValueRepresentation::FloatingPointSingle),
      b"IS" => Ok(ValueRepresentation::IntegerString),
      b"LO" => Ok(ValueRepresentation::LongString),
      b"LT" => Ok(ValueRepresentation::LongText),
      b"OB" => Ok(ValueRepresentation::OtherByteString),
      b"OD" => Ok(ValueRepresentation::OtherDoubleString),
      b"OF" => Ok(ValueRepresentation::OtherFloatString),
      b"OL" => Ok(ValueRepresentation::OtherLongString),
      b"OV" => Ok(ValueRepresentation::OtherVeryLongString),
      b"OW" => Ok(ValueRepresentation::OtherWordString),
      b"PN" => Ok(ValueRepresentation::PersonName),
      b"SH" => Ok(ValueRepresentation::ShortString),
      b"SL" => Ok(ValueRepresentation::SignedLong),
      b"SQ" => Ok(ValueRepresentation::Sequence),
      b"SS" => Ok(ValueRepresentation::SignedShort),
      b"ST" => Ok(ValueRepresentation::ShortText),
      b"SV" => Ok(ValueRepresentation::SignedVeryLong),
      b"TM" => Ok(ValueRepresentation::Time),
      b"UC" => Ok(ValueRepresentation::UnlimitedCharacters),
      b"UI" => Ok(ValueRepresentation::UniqueIdentifier),
      b"UL" => Ok(ValueRepresentation::UnsignedLong),
      b"UN" => Ok(ValueRepresentation::Unknown),
      b"UR" => Ok(ValueRepresentation::UniversalResourceIdentifier),
      b"US" => Ok(ValueRepresentation::UnsignedShort),
      b"UT" => Ok(ValueRepresentation::UnlimitedText),
      b"UV" => Ok(ValueRepresentation::UnsignedVeryLong),
      _ => Err(()),
    }
  }

  /// Returns the two bytes of a VR as stored in explicit VR transfer
  /// syntaxes.
  ///
  pub fn to_bytes(self) -> [u8; 2] {
    let s = match self {
      ValueRepresentation::AgeString => b"AS",
      ValueRepresentation::ApplicationEntity => b"AE",
      ValueRepresentation::AttributeTag => b"AT",
      ValueRepresentation::CodeString => b"CS",
      ValueRepresentation::Date => b"DA",
      ValueRepresentation::DateTime => b"DT",
      ValueRepresentation::DecimalString => b"DS",
      ValueRepresentation::FloatingPointDouble => b"FD",
      ValueRepresentation::FloatingPointSingle => b"FL",
      ValueRepresentation::IntegerString => b"IS",
      ValueRepresentation::LongString => b"LO",
      ValueRepresentation::LongText => b"LT",
      ValueRepresentation::OtherByteString => b"OB",
      ValueRepresentation::OtherDoubleString => b"OD",
      ValueRepresentation::OtherFloatString => b"OF",
      ValueRepresentation::OtherLongString => b"OL",
      ValueRepresentation::OtherVeryLongString => b"OV",
      ValueRepresentation::OtherWordString => b"OW",
      ValueRepresentation::PersonName => b"PN",
      ValueRepresentation::Sequence => b"SQ",
      ValueRepresentation::ShortString => b"SH",
      ValueRepresentation::ShortText => b"ST",
      ValueRepresentation::SignedLong => b"SL",
      ValueRepresentation::SignedShort => b"SS",
      ValueRepresentation::SignedVeryLong => b"SV",
      ValueRepresentation::Time => b"TM",
      ValueRepresentation::UniqueIdentifier => b"UI",
      ValueRepresentation::UniversalResourceIdentifier => b"UR",
      ValueRepresentation::Unknown => b"UN",
      ValueRepresentation::UnlimitedCharacters => b"UC",
      ValueRepresentation::UnlimitedText => b"UT",
      ValueRepresentation::UnsignedLong => b"UL",
      ValueRepresentation::UnsignedShort => b"US",
      ValueRepresentation::UnsignedVeryLong => b"UV",
    };

    *s
  }

  /// Returns whether a VR stores string data.
  ///
  pub fn is_string(self) -> bool {
    matches!(
      self,
      ValueRepresentation::AgeString
        | ValueRepresentation::ApplicationEntity
        | ValueRepresentation::CodeString
        | ValueRepresentation::Date
        | ValueRepresentation::DateTime
        | ValueRepresentation::DecimalString
        | ValueRepresentation::IntegerString
        | ValueRepresentation::LongString
        | ValueRepresentation::LongText
        | ValueRepresentation::PersonName
        | ValueRepresentation::ShortString
        | ValueRepresentation::ShortText
        | ValueRepresentation::Time
        | ValueRepresentation::UniqueIdentifier
        | ValueRepresentation::UniversalResourceIdentifier
        | ValueRepresentation::UnlimitedCharacters
        | ValueRepresentation::UnlimitedText
    )
  }

  /// Returns whether a VR stores string data that is interpreted through the
  /// Specific Character Set of the enclosing data set, as opposed to string
  /// data that is always in the default character repertoire.
  ///
  pub fn is_encoded_string(self) -> bool {
    matches!(
      self,
      ValueRepresentation::LongString
        | ValueRepresentation::LongText
        | ValueRepresentation::PersonName
        | ValueRepresentation::ShortString
        | ValueRepresentation::ShortText
        | ValueRepresentation::UnlimitedCharacters
        | ValueRepresentation::UnlimitedText
    )
  }
}

impl core::fmt::Display for ValueRepresentation {
  /// Formats a VR as its two-letter code, e.g. `"PN"`.
  ///
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    let bytes = self.to_bytes();

    f.write_str(core::str::from_utf8(&bytes).unwrap_or("??"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_bytes_test() {
    assert_eq!(
      ValueRepresentation::from_bytes(b"PN"),
      Ok(ValueRepresentation::PersonName)
    );
    assert_eq!(ValueRepresentation::from_bytes(b"XX"), Err(()));
    assert_eq!(ValueRepresentation::from_bytes(b"P"), Err(()));
  }

  #[test]
  fn bytes_round_trip_test() {
    for vr in [
      ValueRepresentation::AgeString,
      ValueRepresentation::ApplicationEntity,
      ValueRepresentation::AttributeTag,
      ValueRepresentation::CodeString,
      ValueRepresentation::Date,
      ValueRepresentation::DateTime,
      ValueRepresentation::DecimalString,
      ValueRepresentation::FloatingPointDouble,
      ValueRepresentation::FloatingPointSingle,
      ValueRepresentation::IntegerString,
      ValueRepresentation::LongString,
      ValueRepresentation::LongText,
      ValueRepresentation::OtherByteString,
      ValueRepresentation::OtherDoubleString,
      ValueRepresentation::OtherFloatString,
      ValueRepresentation::OtherLongString,
      ValueRepresentation::OtherVeryLongString,
      ValueRepresentation::OtherWordString,
      ValueRepresentation::PersonName,
      ValueRepresentation::Sequence,
      ValueRepresentation::ShortString,
      ValueRepresentation::ShortText,
      ValueRepresentation::SignedLong,
      ValueRepresentation::SignedShort,
      ValueRepresentation::SignedVeryLong,
      ValueRepresentation::Time,
      ValueRepresentation::UniqueIdentifier,
      ValueRepresentation::UniversalResourceIdentifier,
      ValueRepresentation::Unknown,
      ValueRepresentation::UnlimitedCharacters,
      ValueRepresentation::UnlimitedText,
      ValueRepresentation::UnsignedLong,
      ValueRepresentation::UnsignedShort,
      ValueRepresentation::UnsignedVeryLong,
    ] {
      assert_eq!(ValueRepresentation::from_bytes(&vr.to_bytes()), Ok(vr));
    }
  }

  #[test]
  fn to_string_test() {
    assert_eq!(ValueRepresentation::PersonName.to_string(), "PN");
    assert_eq!(ValueRepresentation::Sequence.to_string(), "SQ");
  }
}
