//! The value length of a data element header, which is either defined or
//! undefined.

/// The value `0xFFFFFFFF` that marks an undefined length on the wire.
///
pub const UNDEFINED_LENGTH: u32 = 0xFFFF_FFFF;

/// The length of the value of a data element. A length of `0xFFFFFFFF` on the
/// wire means the length is undefined and the value's extent is given by a
/// delimitation item instead.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueLength {
  Defined { length: u32 },
  Undefined,
}

impl ValueLength {
  pub const ZERO: ValueLength = ValueLength::Defined { length: 0 };

  /// Creates a [`ValueLength`] from the raw length value stored in a data
  /// element header.
  ///
  pub fn new(length: u32) -> ValueLength {
    if length == UNDEFINED_LENGTH {
      ValueLength::Undefined
    } else {
      ValueLength::Defined { length }
    }
  }

  /// Returns the raw length value for this value length as stored in a data
  /// element header.
  ///
  pub fn to_int(self) -> u32 {
    match self {
      ValueLength::Defined { length } => length,
      ValueLength::Undefined => UNDEFINED_LENGTH,
    }
  }
}

impl core::fmt::Display for ValueLength {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    match self {
      ValueLength::Defined { length } => write!(f, "{} bytes", length),
      ValueLength::Undefined => f.write_str("UNDEFINED"),
    }
  }
}
