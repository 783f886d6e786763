//! The transfer syntaxes relevant to streaming DICOM data, along with the
//! byte order and VR serialization mode each one implies.

/// Describes a single transfer syntax.
///
#[derive(Debug, Eq, PartialEq)]
pub struct TransferSyntax {
  pub uid: &'static str,
  pub name: &'static str,
  pub vr_serialization: VrSerialization,
  pub endianness: Endianness,
  pub is_deflated: bool,
  pub is_encapsulated: bool,
}

/// Whether VRs are serialized explicitly or implicitly by a transfer syntax.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VrSerialization {
  VrExplicit,
  VrImplicit,
}

/// The byte order used by a transfer syntax.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Endianness {
  LittleEndian,
  BigEndian,
}

impl Endianness {
  /// Returns whether this is big endian byte order.
  ///
  pub fn is_big(&self) -> bool {
    *self == Endianness::BigEndian
  }
}

/// The 'Implicit VR Little Endian' transfer syntax.
///
pub static IMPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax {
  uid: "1.2.840.10008.1.2",
  name: "Implicit VR Little Endian",
  vr_serialization: VrSerialization::VrImplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: false,
  is_encapsulated: false,
};

/// The 'Explicit VR Little Endian' transfer syntax.
///
pub static EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax {
  uid: "1.2.840.10008.1.2.1",
  name: "Explicit VR Little Endian",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: false,
  is_encapsulated: false,
};

/// The 'Encapsulated Uncompressed Explicit VR Little Endian' transfer syntax.
///
pub static ENCAPSULATED_UNCOMPRESSED_EXPLICIT_VR_LITTLE_ENDIAN:
  TransferSyntax = TransferSyntax {
  uid: "1.2.840.10008.1.2.1.98",
  name: "Encapsulated Uncompressed Explicit VR Little Endian",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: false,
  is_encapsulated: true,
};

/// The 'Deflated Explicit VR Little Endian' transfer syntax.
///
pub static DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax =
  TransferSyntax {
    uid: "1.2.840.10008.1.2.1.99",
    name: "Deflated Explicit VR Little Endian",
    vr_serialization: VrSerialization::VrExplicit,
    endianness: Endianness::LittleEndian,
    is_deflated: true,
    is_encapsulated: false,
  };

/// The retired 'Explicit VR Big Endian' transfer syntax.
///
pub static EXPLICIT_VR_BIG_ENDIAN: TransferSyntax = TransferSyntax {
  uid: "1.2.840.10008.1.2.2",
  name: "Explicit VR Big Endian",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::BigEndian,
  is_deflated: false,
  is_encapsulated: false,
};

/// The 'JPEG Baseline (Process 1)' transfer syntax.
///
pub static JPEG_BASELINE_8BIT: TransferSyntax = TransferSyntax {
  uid: "1.2.840.10008.1.2.4.50",
  name: "JPEG Baseline (Process 1)",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: false,
  is_encapsulated: true,
};

/// The 'JPEG 2000 Image Compression (Lossless Only)' transfer syntax.
///
pub static JPEG_2000_LOSSLESS_ONLY: TransferSyntax = TransferSyntax {
  uid: "1.2.840.10008.1.2.4.90",
  name: "JPEG 2000 Image Compression (Lossless Only)",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: false,
  is_encapsulated: true,
};

/// The 'JPEG 2000 Image Compression' transfer syntax.
///
pub static JPEG_2000: TransferSyntax = TransferSyntax {
  uid: "1.2.840.10008.1.2.4.91",
  name: "JPEG 2000 Image Compression",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: false,
  is_encapsulated: true,
};

/// The 'RLE Lossless' transfer syntax.
///
pub static RLE_LOSSLESS: TransferSyntax = TransferSyntax {
  uid: "1.2.840.10008.1.2.5",
  name: "RLE Lossless",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: false,
  is_encapsulated: true,
};

/// All supported transfer syntaxes.
///
pub static ALL: &[&TransferSyntax] = &[
  &IMPLICIT_VR_LITTLE_ENDIAN,
  &EXPLICIT_VR_LITTLE_ENDIAN,
  &ENCAPSULATED_UNCOMPRESSED_EXPLICIT_VR_LITTLE_ENDIAN,
  &DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN,
  &EXPLICIT_VR_BIG_ENDIAN,
  &RLE_LOSSLESS,
  &JPEG_BASELINE_8BIT,
  &JPEG_2000_LOSSLESS_ONLY,
  &JPEG_2000,
];

impl TransferSyntax {
  /// Returns the transfer syntax with the given UID. Returns an error if the
  /// UID is not recognized.
  ///
  pub fn from_uid(uid: &str) -> Result<&'static TransferSyntax, ()> {
    ALL
      .iter()
      .find(|transfer_syntax| transfer_syntax.uid == uid)
      .copied()
      .ok_or(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_uid_test() {
    assert_eq!(
      TransferSyntax::from_uid("1.2.840.10008.1.2.1"),
      Ok(&EXPLICIT_VR_LITTLE_ENDIAN)
    );
    assert_eq!(TransferSyntax::from_uid("1.2.3.4"), Err(()));
  }

  #[test]
  fn dataset_encoding_test() {
    assert_eq!(
      IMPLICIT_VR_LITTLE_ENDIAN.vr_serialization,
      VrSerialization::VrImplicit
    );
    assert!(EXPLICIT_VR_BIG_ENDIAN.endianness.is_big());
    assert!(DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN.is_deflated);
  }
}
