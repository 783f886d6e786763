//! Maintains the tag path of the current position in a stream of DICOM P10
//! parts as they fly by.

use dcmflow_core::{DataElementTag, TagPath, TagPathEntry};

use crate::P10Part;

/// Tracks the tag path of the current position in a stream of DICOM P10
/// parts. Feed every part to [`Self::advance`] in stream order; the path
/// returned by [`Self::path`] then identifies the data element or sequence
/// item the stream is positioned at.
///
/// File Meta Information parts do not move the path, which always refers to
/// a position in the main data set.
///
#[derive(Debug, Default)]
pub struct TagPathTracker {
  path: TagPath,
  in_fragments: bool,
}

impl TagPathTracker {
  /// Creates a new tracker positioned at the root of the main data set.
  ///
  pub fn new() -> Self {
    Self {
      path: TagPath::new(),
      in_fragments: false,
    }
  }

  /// Returns the tag path of the current position.
  ///
  pub fn path(&self) -> &TagPath {
    &self.path
  }

  /// Advances the tracker over the given part.
  ///
  pub fn advance(&mut self, part: &P10Part) {
    match part {
      P10Part::DataElementHeader { tag, is_fmi, .. } => {
        if !is_fmi {
          self.replace_leaf_element(*tag);
        }
      }

      P10Part::SequenceStart { tag, .. } => {
        self.replace_leaf_element(*tag);
      }

      P10Part::FragmentsStart { tag, .. } => {
        self.replace_leaf_element(*tag);
        self.in_fragments = true;
      }

      P10Part::SequenceItemStart { index, .. } => {
        // The innermost entry names the sequence this item belongs to,
        // either as an open sequence or as its previous item
        if let Some(entry) = self.path.entries().last() {
          let tag = entry.tag();

          self.path.pop();
          self.path =
            core::mem::take(&mut self.path).then_item(tag, *index as usize);
        }
      }

      P10Part::SequenceItemDelimiter { .. } => {
        // Drop the last element of the item, then reopen the sequence
        if matches!(
          self.path.entries().last(),
          Some(TagPathEntry::DataElement { .. })
        ) && matches!(
          self.path.entries().iter().rev().nth(1),
          Some(TagPathEntry::SequenceItem { .. })
        ) {
          self.path.pop();
        }

        if let Some(TagPathEntry::SequenceItem { tag, .. }) =
          self.path.entries().last().copied()
        {
          self.path.pop();
          self.path = core::mem::take(&mut self.path).then_tag(tag);
        }
      }

      P10Part::SequenceDelimiter { .. } => {
        self.path.pop();
        self.in_fragments = false;
      }

      P10Part::FilePreambleAndDICMPrefix { .. }
      | P10Part::DataElementValueBytes { .. }
      | P10Part::DeflatedChunk { .. }
      | P10Part::Unknown { .. }
      | P10Part::CollectedElements { .. }
      | P10Part::End => (),
    }
  }

  /// Points the path at a new data element or sequence at the current
  /// level, replacing the previous element if the path points at one.
  ///
  fn replace_leaf_element(&mut self, tag: DataElementTag) {
    if matches!(
      self.path.entries().last(),
      Some(TagPathEntry::DataElement { .. })
    ) {
      self.path.pop();
    }

    self.path = core::mem::take(&mut self.path).then_tag(tag);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use dcmflow_core::{DataElementTag, ValueRepresentation};

  fn header(tag: DataElementTag) -> P10Part {
    P10Part::DataElementHeader {
      tag,
      vr: ValueRepresentation::LongString,
      length: 0,
      is_fmi: false,
      big_endian: false,
      explicit_vr: true,
      bytes: vec![],
    }
  }

  #[test]
  fn tracks_root_elements_test() {
    let study_date = DataElementTag::new(0x0008, 0x0020);
    let patient_name = DataElementTag::new(0x0010, 0x0010);

    let mut tracker = TagPathTracker::new();

    tracker.advance(&header(study_date));
    assert_eq!(tracker.path(), &TagPath::from_tag(study_date));

    tracker.advance(&header(patient_name));
    assert_eq!(tracker.path(), &TagPath::from_tag(patient_name));
  }

  #[test]
  fn tracks_sequence_items_test() {
    let sequence_tag = DataElementTag::new(0x0008, 0x9215);
    let study_date = DataElementTag::new(0x0008, 0x0020);

    let mut tracker = TagPathTracker::new();

    tracker.advance(&P10Part::SequenceStart {
      tag: sequence_tag,
      length: 0xFFFF_FFFF,
      big_endian: false,
      explicit_vr: true,
      bytes: vec![],
    });
    assert_eq!(tracker.path(), &TagPath::from_tag(sequence_tag));

    tracker.advance(&P10Part::SequenceItemStart {
      index: 1,
      length: 0xFFFF_FFFF,
      big_endian: false,
      bytes: vec![],
    });
    assert_eq!(tracker.path(), &TagPath::from_item(sequence_tag, 1));

    tracker.advance(&header(study_date));
    assert_eq!(
      tracker.path(),
      &TagPath::from_item(sequence_tag, 1).then_tag(study_date)
    );

    tracker.advance(&P10Part::SequenceItemDelimiter {
      index: 1,
      big_endian: false,
      bytes: vec![],
    });
    assert_eq!(tracker.path(), &TagPath::from_tag(sequence_tag));

    tracker.advance(&P10Part::SequenceItemStart {
      index: 2,
      length: 0xFFFF_FFFF,
      big_endian: false,
      bytes: vec![],
    });
    assert_eq!(tracker.path(), &TagPath::from_item(sequence_tag, 2));

    tracker.advance(&P10Part::SequenceItemDelimiter {
      index: 2,
      big_endian: false,
      bytes: vec![],
    });
    tracker.advance(&P10Part::SequenceDelimiter {
      big_endian: false,
      bytes: vec![],
    });
    assert_eq!(tracker.path(), &TagPath::new());
  }
}
