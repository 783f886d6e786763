//! Tracks the current position within the sequence and item structure of
//! DICOM data as it is read, including where defined-length sequences and
//! items end.

use dcmflow_core::{DataElementTag, TagPath};

/// The nesting location of an in-progress DICOM read. The root entry is
/// always present; sequences and items are pushed and popped as they open
/// and close.
///
#[derive(Debug)]
pub struct P10Location {
  entries: Vec<LocationEntry>,
}

#[derive(Debug)]
enum LocationEntry {
  Root {
    last_tag: Option<DataElementTag>,
  },
  Sequence {
    tag: DataElementTag,
    is_implicit_vr: bool,
    ends_at: Option<u64>,
    item_count: u32,
  },
  Item {
    index: u32,
    ends_at: Option<u64>,
    last_tag: Option<DataElementTag>,
  },
}

/// A delimiter that closes the innermost open sequence or item.
///
#[derive(Debug, PartialEq)]
pub enum PendingDelimiter {
  Item { index: u32 },
  Sequence { tag: DataElementTag },
}

impl P10Location {
  /// Creates a new location at the root of a data set.
  ///
  pub fn new() -> Self {
    Self {
      entries: vec![LocationEntry::Root { last_tag: None }],
    }
  }

  /// Returns the number of sequences currently open at this location.
  ///
  pub fn sequence_depth(&self) -> usize {
    self
      .entries
      .iter()
      .filter(|entry| matches!(entry, LocationEntry::Sequence { .. }))
      .count()
  }

  /// Returns whether reading is forced to use implicit VRs because an
  /// enclosing sequence had an explicit VR of UN with undefined length,
  /// which requires its content to be read as 'Implicit VR Little Endian'.
  ///
  /// Ref: DICOM Correction Proposal CP-246.
  ///
  pub fn is_implicit_vr_forced(&self) -> bool {
    self
      .entries
      .iter()
      .rev()
      .find_map(|entry| match entry {
        LocationEntry::Sequence { is_implicit_vr, .. } => {
          Some(*is_implicit_vr)
        }
        _ => None,
      })
      .unwrap_or(false)
  }

  /// Opens a new sequence at this location.
  ///
  pub fn add_sequence(
    &mut self,
    tag: DataElementTag,
    is_implicit_vr: bool,
    ends_at: Option<u64>,
  ) -> Result<(), String> {
    match self.entries.last() {
      Some(LocationEntry::Root { .. }) | Some(LocationEntry::Item { .. }) => {
        self.entries.push(LocationEntry::Sequence {
          tag,
          is_implicit_vr,
          ends_at,
          item_count: 0,
        });

        Ok(())
      }

      _ => Err(format!("Sequence {} is not valid at this location", tag)),
    }
  }

  /// Opens a new item in the innermost open sequence and returns its
  /// one-based index.
  ///
  pub fn add_item(&mut self, ends_at: Option<u64>) -> Result<u32, String> {
    match self.entries.last_mut() {
      Some(LocationEntry::Sequence { item_count, .. }) => {
        *item_count += 1;
        let index = *item_count;

        self.entries.push(LocationEntry::Item {
          index,
          ends_at,
          last_tag: None,
        });

        Ok(index)
      }

      _ => Err("Item is not valid at this location".to_string()),
    }
  }

  /// Returns the one-based index for the next item of an encapsulated pixel
  /// data stream. Pixel data items close implicitly when their bytes have
  /// been consumed, so no entry is opened for them.
  ///
  pub fn add_fragments_item(&mut self) -> Result<u32, String> {
    match self.entries.last_mut() {
      Some(LocationEntry::Sequence { item_count, .. }) => {
        *item_count += 1;

        Ok(*item_count)
      }

      _ => Err("Item is not valid at this location".to_string()),
    }
  }

  /// Closes the innermost open item and returns its one-based index.
  ///
  pub fn end_item(&mut self) -> Result<u32, String> {
    match self.entries.last() {
      Some(LocationEntry::Item { index, .. }) => {
        let index = *index;
        self.entries.pop();

        Ok(index)
      }

      _ => Err("Item delimiter is not valid at this location".to_string()),
    }
  }

  /// Closes the innermost open sequence and returns its tag.
  ///
  pub fn end_sequence(&mut self) -> Result<DataElementTag, String> {
    match self.entries.last() {
      Some(LocationEntry::Sequence { tag, .. }) => {
        let tag = *tag;
        self.entries.pop();

        Ok(tag)
      }

      _ => {
        Err("Sequence delimiter is not valid at this location".to_string())
      }
    }
  }

  /// Returns the delimiter for the innermost defined-length sequence or item
  /// that ends at the given stream position, if there is one, and closes it.
  ///
  pub fn next_delimiter(&mut self, bytes_read: u64) -> Option<PendingDelimiter> {
    match self.entries.last() {
      Some(LocationEntry::Sequence {
        tag,
        ends_at: Some(ends_at),
        ..
      }) if bytes_read >= *ends_at => {
        let delimiter = PendingDelimiter::Sequence { tag: *tag };
        self.entries.pop();

        Some(delimiter)
      }

      Some(LocationEntry::Item {
        index,
        ends_at: Some(ends_at),
        ..
      }) if bytes_read >= *ends_at => {
        let delimiter = PendingDelimiter::Item { index: *index };
        self.entries.pop();

        Some(delimiter)
      }

      _ => None,
    }
  }

  /// Returns the delimiters needed to close every sequence and item that is
  /// still open, innermost first. Used when the end of the incoming data is
  /// reached.
  ///
  pub fn pending_delimiters(&mut self) -> Vec<PendingDelimiter> {
    let mut delimiters = vec![];

    while let Some(entry) = self.entries.last() {
      match entry {
        LocationEntry::Root { .. } => break,

        LocationEntry::Sequence { tag, .. } => {
          delimiters.push(PendingDelimiter::Sequence { tag: *tag });
        }

        LocationEntry::Item { index, .. } => {
          delimiters.push(PendingDelimiter::Item { index: *index });
        }
      }

      self.entries.pop();
    }

    delimiters
  }

  /// Checks that a data element tag is greater than the previous one seen in
  /// the current scope, and records it as the latest tag in that scope.
  ///
  pub fn check_ordering(&mut self, tag: DataElementTag) -> Result<(), ()> {
    let last_tag = self
      .entries
      .iter_mut()
      .rev()
      .find_map(|entry| match entry {
        LocationEntry::Root { last_tag } => Some(last_tag),
        LocationEntry::Item { last_tag, .. } => Some(last_tag),
        LocationEntry::Sequence { .. } => None,
      });

    match last_tag {
      Some(last_tag) => {
        if let Some(previous) = last_tag {
          if *previous >= tag {
            return Err(());
          }
        }

        *last_tag = Some(tag);

        Ok(())
      }

      None => Ok(()),
    }
  }

  /// Builds the tag path for the current location, with an optional final
  /// data element appended.
  ///
  pub fn path(&self, leaf: Option<DataElementTag>) -> TagPath {
    let mut path = TagPath::new();
    let mut open_sequence: Option<DataElementTag> = None;

    for entry in self.entries.iter() {
      match entry {
        LocationEntry::Root { .. } => (),

        LocationEntry::Sequence { tag, .. } => {
          open_sequence = Some(*tag);
        }

        LocationEntry::Item { index, .. } => {
          if let Some(tag) = open_sequence.take() {
            path = path.then_item(tag, *index as usize);
          }
        }
      }
    }

    if let Some(tag) = open_sequence {
      path = path.then_tag(tag);
    } else if let Some(tag) = leaf {
      path = path.then_tag(tag);
    }

    path
  }
}
