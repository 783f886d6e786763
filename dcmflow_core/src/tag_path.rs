//! A tag path pinpoints a data element or sequence item in a possibly nested
//! data set.

use crate::{dictionary, DataElementTag};

/// A path from the root of a data set to a specific data element or sequence
/// item. Entries are separated by a forward slash when a tag path is
/// represented as a string, and a sequence item index of `[*]` is a wildcard
/// that matches any item in that sequence.
///
/// Examples:
///
/// - `""`: path to the root data set.
/// - `"00100010"`: path to the *'(0010,0010) Patient's Name'* data element.
/// - `"00089215/[1]/00080020"`: path to the *'(0008,0020) Study Date'* data
///   element in the second item of the *'(0008,9215) Derivation Code
///   Sequence'* sequence.
/// - `"00089215/[*]/00080020"`: the same data element in every item of that
///   sequence.
///
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct TagPath(Vec<TagPathEntry>);

/// An individual entry in a [`TagPath`].
///
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TagPathEntry {
  /// A data element at the current level of the data set.
  DataElement { tag: DataElementTag },

  /// An item of a sequence at the current level of the data set. An index of
  /// `None` is a wildcard that matches any item index.
  SequenceItem {
    tag: DataElementTag,
    index: Option<usize>,
  },
}

impl TagPathEntry {
  /// Returns the data element tag of a tag path entry.
  ///
  pub fn tag(&self) -> DataElementTag {
    match self {
      TagPathEntry::DataElement { tag } => *tag,
      TagPathEntry::SequenceItem { tag, .. } => *tag,
    }
  }

  /// Returns whether this entry, treated as a pattern, matches the given
  /// concrete entry. A wildcard item index matches any item index.
  ///
  fn matches(&self, other: &TagPathEntry) -> bool {
    match (self, other) {
      (
        TagPathEntry::DataElement { tag },
        TagPathEntry::DataElement { tag: other_tag },
      ) => tag == other_tag,

      (
        TagPathEntry::SequenceItem { tag, index },
        TagPathEntry::SequenceItem {
          tag: other_tag,
          index: other_index,
        },
      ) => tag == other_tag && (index.is_none() || index == other_index),

      _ => false,
    }
  }
}

impl TagPath {
  /// Constructs a new tag path with no entries, i.e. a path to the root data
  /// set.
  ///
  pub fn new() -> Self {
    Self(vec![])
  }

  /// Constructs a new tag path to a data element at the root of the data set.
  ///
  pub fn from_tag(tag: DataElementTag) -> Self {
    Self(vec![TagPathEntry::DataElement { tag }])
  }

  /// Constructs a new tag path to an item of a sequence at the root of the
  /// data set.
  ///
  pub fn from_item(tag: DataElementTag, index: usize) -> Self {
    Self(vec![TagPathEntry::SequenceItem {
      tag,
      index: Some(index),
    }])
  }

  /// Extends a tag path with a data element at the current level.
  ///
  pub fn then_tag(mut self, tag: DataElementTag) -> Self {
    self.0.push(TagPathEntry::DataElement { tag });
    self
  }

  /// Extends a tag path with a specific item of a nested sequence.
  ///
  pub fn then_item(mut self, tag: DataElementTag, index: usize) -> Self {
    self.0.push(TagPathEntry::SequenceItem {
      tag,
      index: Some(index),
    });
    self
  }

  /// Extends a tag path with a wildcard item of a nested sequence, matching
  /// every item of that sequence.
  ///
  pub fn then_wildcard_item(mut self, tag: DataElementTag) -> Self {
    self.0.push(TagPathEntry::SequenceItem { tag, index: None });
    self
  }

  /// Returns the entries of a tag path.
  ///
  pub fn entries(&self) -> &[TagPathEntry] {
    &self.0
  }

  /// Returns the number of entries in a tag path.
  ///
  pub fn depth(&self) -> usize {
    self.0.len()
  }

  /// Returns whether a tag path has no entries.
  ///
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Returns whether a tag path is empty or points to a data element or
  /// sequence at the root of the data set.
  ///
  pub fn is_root(&self) -> bool {
    self.0.len() <= 1
  }

  /// Returns the data element tag of the first entry in a tag path.
  ///
  pub fn head_tag(&self) -> Option<DataElementTag> {
    self.0.first().map(TagPathEntry::tag)
  }

  /// Returns the data element tag of the last entry in a tag path.
  ///
  pub fn last_tag(&self) -> Option<DataElementTag> {
    self.0.last().map(TagPathEntry::tag)
  }

  /// Removes and returns the last entry in a tag path.
  ///
  pub fn pop(&mut self) -> Option<TagPathEntry> {
    self.0.pop()
  }

  /// Returns a tag path with the last entry removed.
  ///
  pub fn parent(&self) -> Self {
    let mut entries = self.0.clone();
    entries.pop();

    Self(entries)
  }

  /// Returns whether this tag path, treated as a pattern, matches the given
  /// concrete tag path exactly. Wildcard item indices match any index.
  ///
  pub fn matches(&self, other: &TagPath) -> bool {
    self.0.len() == other.0.len() && self.is_prefix_of(other)
  }

  /// Returns whether a tag path starts with the given prefix. Wildcard item
  /// indices in the prefix match any index.
  ///
  pub fn starts_with(&self, prefix: &TagPath) -> bool {
    prefix.is_prefix_of(self)
  }

  /// Returns whether a tag path starts with the given prefix when all item
  /// indices are ignored, i.e. whether the prefix matches in every item of
  /// the sequences it steps through.
  ///
  pub fn starts_with_super_path(&self, prefix: &TagPath) -> bool {
    prefix.0.len() <= self.0.len()
      && prefix.0.iter().zip(self.0.iter()).all(|(pattern, entry)| {
        match (pattern, entry) {
          (
            TagPathEntry::SequenceItem { tag, .. },
            TagPathEntry::SequenceItem {
              tag: other_tag, ..
            },
          ) => tag == other_tag,

          _ => pattern.matches(entry),
        }
      })
  }

  /// Returns whether the tail of a tag path matches the given suffix,
  /// regardless of the entries above it. Wildcard item indices in the suffix
  /// match any index.
  ///
  pub fn ends_with(&self, suffix: &TagPath) -> bool {
    suffix.0.len() <= self.0.len()
      && suffix
        .0
        .iter()
        .rev()
        .zip(self.0.iter().rev())
        .all(|(pattern, entry)| pattern.matches(entry))
  }

  fn is_prefix_of(&self, other: &TagPath) -> bool {
    self.0.len() <= other.0.len()
      && self
        .0
        .iter()
        .zip(other.0.iter())
        .all(|(pattern, entry)| pattern.matches(entry))
  }

  /// Parses a tag path from a string such as `"00089215/[1]/00080020"`. An
  /// item index of `"[*]"` parses to a wildcard.
  ///
  pub fn from_string(s: &str) -> Result<Self, String> {
    let mut entries = vec![];
    let mut pending_tag: Option<DataElementTag> = None;

    if s.is_empty() {
      return Ok(Self::new());
    }

    for part in s.split('/') {
      if let Ok(tag) = DataElementTag::from_hex_string(part) {
        if let Some(tag) = pending_tag.take() {
          entries.push(TagPathEntry::DataElement { tag });
        }

        pending_tag = Some(tag);
        continue;
      }

      if part.starts_with('[') && part.ends_with(']') {
        let tag = pending_tag
          .take()
          .ok_or_else(|| format!("Item index with no sequence tag: {}", part))?;

        let index = &part[1..part.len() - 1];

        let index = if index == "*" {
          None
        } else {
          Some(
            index
              .parse::<usize>()
              .map_err(|_| format!("Invalid tag path entry: {}", part))?,
          )
        };

        entries.push(TagPathEntry::SequenceItem { tag, index });
        continue;
      }

      return Err(format!("Invalid tag path entry: {}", part));
    }

    if let Some(tag) = pending_tag {
      entries.push(TagPathEntry::DataElement { tag });
    }

    Ok(Self(entries))
  }

  /// Formats a tag path with full details on each of its entries, including
  /// the names of its data element tags.
  ///
  pub fn to_detailed_string(&self) -> String {
    self
      .0
      .iter()
      .map(|entry| match entry {
        TagPathEntry::DataElement { tag } => dictionary::tag_with_name(*tag),
        TagPathEntry::SequenceItem {
          tag,
          index: Some(index),
        } => format!("{}, Item {}", dictionary::tag_with_name(*tag), index),
        TagPathEntry::SequenceItem { tag, index: None } => {
          format!("{}, all items", dictionary::tag_with_name(*tag))
        }
      })
      .collect::<Vec<_>>()
      .join(" / ")
  }
}

impl PartialOrd for TagPath {
  fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for TagPath {
  /// Tag paths order lexicographically by entry, consistent with the order in
  /// which the underlying data elements appear in a data set. Entries compare
  /// by tag, then by item index, with a wildcard index ordering before all
  /// concrete indices.
  ///
  fn cmp(&self, other: &Self) -> core::cmp::Ordering {
    let entry_key = |entry: &TagPathEntry| match entry {
      TagPathEntry::DataElement { tag } => (tag.to_int(), 0usize),
      TagPathEntry::SequenceItem { tag, index } => {
        (tag.to_int(), index.map(|i| i + 1).unwrap_or(0))
      }
    };

    self.0.iter().map(entry_key).cmp(other.0.iter().map(entry_key))
  }
}

impl core::fmt::Display for TagPath {
  /// Formats a tag path with its entries separated by forward slashes.
  ///
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    let path = self
      .0
      .iter()
      .map(|entry| match entry {
        TagPathEntry::DataElement { tag } => tag.to_hex_string(),
        TagPathEntry::SequenceItem {
          tag,
          index: Some(index),
        } => format!("{}/[{}]", tag.to_hex_string(), index),
        TagPathEntry::SequenceItem { tag, index: None } => {
          format!("{}/[*]", tag.to_hex_string())
        }
      })
      .collect::<Vec<_>>()
      .join("/");

    f.write_str(&path)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sequence_tag() -> DataElementTag {
    DataElementTag::new(0x0008, 0x9215)
  }

  fn study_date() -> DataElementTag {
    DataElementTag::new(0x0008, 0x0020)
  }

  #[test]
  fn string_round_trip_test() {
    let path = TagPath::from_item(sequence_tag(), 1).then_tag(study_date());

    assert_eq!(path.to_string(), "00089215/[1]/00080020");
    assert_eq!(TagPath::from_string("00089215/[1]/00080020"), Ok(path));

    let wildcard =
      TagPath::new().then_wildcard_item(sequence_tag()).then_tag(study_date());

    assert_eq!(wildcard.to_string(), "00089215/[*]/00080020");
    assert_eq!(TagPath::from_string("00089215/[*]/00080020"), Ok(wildcard));

    assert_eq!(TagPath::from_string(""), Ok(TagPath::new()));
    assert!(TagPath::from_string("bogus").is_err());
    assert!(TagPath::from_string("[1]").is_err());
  }

  #[test]
  fn matches_test() {
    let concrete =
      TagPath::from_item(sequence_tag(), 2).then_tag(study_date());
    let wildcard =
      TagPath::new().then_wildcard_item(sequence_tag()).then_tag(study_date());

    assert!(wildcard.matches(&concrete));
    assert!(concrete.matches(&concrete));
    assert!(!concrete.matches(&wildcard.parent()));
    assert!(
      !TagPath::from_item(sequence_tag(), 1)
        .then_tag(study_date())
        .matches(&concrete)
    );
  }

  #[test]
  fn starts_with_test() {
    let path = TagPath::from_item(sequence_tag(), 1).then_tag(study_date());

    assert!(path.starts_with(&TagPath::from_item(sequence_tag(), 1)));
    assert!(!path.starts_with(&TagPath::from_item(sequence_tag(), 2)));
    assert!(path.starts_with(&TagPath::new()));

    // A super path prefix ignores item indices entirely
    assert!(path.starts_with_super_path(&TagPath::from_item(sequence_tag(), 7)));
    assert!(!path.starts_with_super_path(&TagPath::from_tag(sequence_tag())));
  }

  #[test]
  fn ends_with_test() {
    let path = TagPath::from_item(sequence_tag(), 1).then_tag(study_date());

    assert!(path.ends_with(&TagPath::from_tag(study_date())));
    assert!(!path.ends_with(&TagPath::from_tag(sequence_tag())));
    assert!(path.ends_with(&path.clone()));
  }

  #[test]
  fn ordering_test() {
    let a = TagPath::from_tag(study_date());
    let b = TagPath::from_tag(DataElementTag::new(0x0010, 0x0010));
    let c = TagPath::from_item(sequence_tag(), 0).then_tag(study_date());
    let d = TagPath::from_item(sequence_tag(), 1).then_tag(study_date());

    assert!(a < b);
    assert!(a < c);
    assert!(c < d);
    assert!(c < b);
  }
}
