//! Observation of the *'(0008,0005) Specific Character Set'* data element.
//!
//! Decoding of non-UTF-8 string data is not performed here. This module only
//! records the character sets declared by a data set so that a downstream
//! string decoder can be configured correctly.

/// The character sets declared by a data set's *'(0008,0005) Specific
/// Character Set'* data element. The first term is the primary character set
/// and any further terms are the code extensions it allows switching to.
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpecificCharacterSets(Vec<String>);

impl SpecificCharacterSets {
  /// The character sets in effect when a data set does not declare any, i.e.
  /// the default character repertoire.
  ///
  pub fn default_repertoire() -> Self {
    Self(vec![])
  }

  /// Constructs the declared character sets from the raw value bytes of a
  /// *'(0008,0005) Specific Character Set'* data element. Terms are separated
  /// by backslashes and have insignificant leading and trailing spaces.
  ///
  pub fn from_value_bytes(bytes: &[u8]) -> Self {
    let terms = String::from_utf8_lossy(bytes)
      .split('\\')
      .map(|term| term.trim_matches([' ', '\0']).to_string())
      .collect::<Vec<_>>();

    // A single empty term means nothing was declared
    if terms.iter().all(String::is_empty) {
      Self(vec![])
    } else {
      Self(terms)
    }
  }

  /// Returns the declared character set terms, e.g. `["ISO 2022 IR 13",
  /// "ISO 2022 IR 87"]`. Empty when the default character repertoire is in
  /// effect.
  ///
  pub fn terms(&self) -> &[String] {
    &self.0
  }

  /// Returns whether string data under these character sets is valid UTF-8
  /// as-is and needs no decoding.
  ///
  pub fn is_utf8_compatible(&self) -> bool {
    self.0.is_empty() || self.0 == ["ISO_IR 192"]
  }
}

impl Default for SpecificCharacterSets {
  fn default() -> Self {
    Self::default_repertoire()
  }
}

impl core::fmt::Display for SpecificCharacterSets {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    if self.0.is_empty() {
      f.write_str("ISO_IR 6")
    } else {
      f.write_str(&self.0.join("\\"))
    }
  }
}
