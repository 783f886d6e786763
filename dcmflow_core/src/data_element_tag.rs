//! The tag that uniquely identifies a data element.

/// A data element tag is comprised of 16-bit `group` and `element` values.
///
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct DataElementTag {
  pub group: u16,
  pub element: u16,
}

impl DataElementTag {
  /// The data element tag with a group and element of zero.
  ///
  pub const ZERO: DataElementTag = DataElementTag {
    group: 0,
    element: 0,
  };

  /// Creates a new data element tag with the given group and element values.
  ///
  pub const fn new(group: u16, element: u16) -> Self {
    Self { group, element }
  }

  /// Returns a data element tag as a single 32-bit integer where the group is
  /// in the high 16 bits. All tag comparisons go through this value so that
  /// tags with the high bit set, which is common for private tags, order
  /// correctly.
  ///
  pub const fn to_int(self) -> u32 {
    ((self.group as u32) << 16) | self.element as u32
  }

  /// Returns whether a data element tag is private, which is the case when its
  /// group is odd.
  ///
  pub fn is_private(self) -> bool {
    self.group % 2 == 1
  }

  /// Returns whether a data element tag is for a private creator, which is the
  /// case when its group is odd and its element is in the range 0x10-0xFF.
  ///
  pub fn is_private_creator(self) -> bool {
    self.is_private() && self.element >= 0x10 && self.element <= 0xFF
  }

  /// Returns whether a data element tag is part of the File Meta Information,
  /// i.e. whether its group is 0x0002.
  ///
  pub fn is_file_meta_information(self) -> bool {
    self.group == 0x0002
  }

  /// Returns whether a data element tag specifies a group length, which is the
  /// case when its element is zero.
  ///
  pub fn is_group_length(self) -> bool {
    self.element == 0x0000
  }

  /// Parses a data element tag from a hex string formatted as `"ggggeeee"`.
  ///
  pub fn from_hex_string(tag: &str) -> Result<Self, ()> {
    if tag.len() != 8 || !tag.is_ascii() {
      return Err(());
    }

    let group = u16::from_str_radix(&tag[0..4], 16).map_err(|_| ())?;
    let element = u16::from_str_radix(&tag[4..8], 16).map_err(|_| ())?;

    Ok(Self { group, element })
  }

  /// Formats a data element tag as a hex string `"ggggeeee"`.
  ///
  pub fn to_hex_string(self) -> String {
    format!("{:04X}{:04X}", self.group, self.element)
  }
}

impl PartialOrd for DataElementTag {
  fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for DataElementTag {
  fn cmp(&self, other: &Self) -> core::cmp::Ordering {
    self.to_int().cmp(&other.to_int())
  }
}

impl core::fmt::Display for DataElementTag {
  /// Formats a data element tag as `"(gggg,eeee)"`.
  ///
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    write!(f, "({:04X},{:04X})", self.group, self.element)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ordering_is_unsigned_test() {
    // Tags with the high bit set must sort after all other tags
    let private_tag = DataElementTag::new(0xFFFF, 0xFFFF);
    let pixel_data = DataElementTag::new(0x7FE0, 0x0010);

    assert!(pixel_data < private_tag);
    assert!(DataElementTag::ZERO < private_tag);
  }

  #[test]
  fn hex_string_test() {
    let tag = DataElementTag::new(0x0010, 0x0010);

    assert_eq!(tag.to_hex_string(), "00100010");
    assert_eq!(DataElementTag::from_hex_string("00100010"), Ok(tag));
    assert_eq!(DataElementTag::from_hex_string("0010001"), Err(()));
    assert_eq!(DataElementTag::from_hex_string("0010001G"), Err(()));
  }

  #[test]
  fn to_string_test() {
    assert_eq!(
      DataElementTag::new(0x7FE0, 0x0010).to_string(),
      "(7FE0,0010)"
    );
  }
}
