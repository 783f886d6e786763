//! Transform that replaces, inserts, and deletes data elements in a stream
//! of DICOM P10 parts while preserving the stream's well-formedness.

use std::collections::VecDeque;

use dcmflow_core::{dictionary, DataElementTag, TagPath, ValueRepresentation};

use crate::internal::data_element_header::DataElementHeader;
use crate::internal::value_length::ValueLength;
use crate::tag_path_tracker::TagPathTracker;
use crate::{P10Error, P10Part};

/// A function that maps the current value bytes of a data element to its new
/// value bytes. Replacements receive the element's existing value;
/// insertions receive an empty value. Returning an empty value deletes the
/// element's content.
///
pub type ValueTransform = Box<dyn FnMut(Vec<u8>) -> Vec<u8>>;

/// A single modification to apply to a stream of DICOM P10 parts: a tag path
/// matcher paired with a function that produces the new value bytes.
///
pub struct TagModification {
  path: TagPath,
  matcher: Matcher,
  transform: ValueTransform,
  insert: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Matcher {
  Equals,
  EndsWith,
}

impl TagModification {
  /// Creates a modification that replaces the value of the data elements
  /// whose tag path matches the given path exactly. Wildcard item indices in
  /// the path match every item of that sequence.
  ///
  pub fn equals(path: TagPath, transform: ValueTransform) -> Self {
    Self {
      path,
      matcher: Matcher::Equals,
      transform,
      insert: false,
    }
  }

  /// Creates a modification that replaces the value of the data elements
  /// whose tag path ends with the given path, at any nesting depth.
  ///
  pub fn ends_with(path: TagPath, transform: ValueTransform) -> Self {
    Self {
      path,
      matcher: Matcher::EndsWith,
      transform,
      insert: false,
    }
  }

  /// Creates a modification that inserts a data element at the given path
  /// when the stream does not contain one, and replaces its value when it
  /// does. Insertion happens in tag order within the path's enclosing scope,
  /// and only when that scope is actually present in the stream.
  ///
  pub fn insert(path: TagPath, transform: ValueTransform) -> Self {
    Self {
      path,
      matcher: Matcher::Equals,
      transform,
      insert: true,
    }
  }

  fn matches(&self, path: &TagPath) -> bool {
    match self.matcher {
      Matcher::Equals => self.path.matches(path),
      Matcher::EndsWith => path.ends_with(&self.path),
    }
  }
}

/// Transform that applies an ordered set of [`TagModification`]s to a stream
/// of DICOM P10 parts.
///
/// Replaced elements have their header re-emitted with the new value length
/// and their value re-emitted as a single final chunk. Inserted elements are
/// synthesized in tag order using the dictionary VR and the endianness and
/// VR mode of the surrounding stream. All other parts pass through
/// bitwise-identical and in their original order.
///
pub struct P10ModifyTransform {
  modifications: Vec<TagModification>,
  insert_guards: bool,
  tracker: TagPathTracker,
  scopes: Vec<Scope>,
  replacement: Option<Replacement>,
  in_fragments: bool,
  big_endian: bool,
  explicit_vr: bool,
}

/// The data element insertions still pending for one open scope: the root
/// data set or a single sequence item. Indexes into `modifications`, in tag
/// order.
///
struct Scope {
  pending: VecDeque<usize>,
}

/// A matched data element being buffered until its final value chunk
/// arrives, at which point its new value is computed and emitted.
///
struct Replacement {
  modification: usize,
  header: P10Part,
  value: Vec<u8>,
}

impl P10ModifyTransform {
  /// Creates a new transform that applies the given modifications to a
  /// stream of DICOM P10 parts.
  ///
  pub fn new(mut modifications: Vec<TagModification>) -> Self {
    modifications.sort_by(|a, b| a.path.cmp(&b.path));

    let root_pending = modifications
      .iter()
      .enumerate()
      .filter(|(_, m)| m.insert && m.path.depth() == 1)
      .map(|(index, _)| index)
      .collect();

    Self {
      modifications,
      insert_guards: true,
      tracker: TagPathTracker::new(),
      scopes: vec![Scope {
        pending: root_pending,
      }],
      replacement: None,
      in_fragments: false,
      big_endian: false,
      explicit_vr: true,
    }
  }

  /// Whether insertions targeting tags that are not in the dictionary are
  /// rejected with an error. When disabled such insertions are synthesized
  /// with a VR of UN instead.
  ///
  /// Default: enabled.
  ///
  pub fn insert_guards(mut self, value: bool) -> Self {
    self.insert_guards = value;
    self
  }

  /// Adds the next part of the stream to the transform and returns the
  /// resulting parts.
  ///
  pub fn add_part(&mut self, part: &P10Part) -> Result<Vec<P10Part>, P10Error> {
    self.tracker.advance(part);

    let mut output = vec![];

    match part {
      P10Part::DataElementHeader {
        tag,
        is_fmi: false,
        big_endian,
        explicit_vr,
        ..
      } => {
        self.big_endian = *big_endian;
        self.explicit_vr = *explicit_vr;

        if !self.in_fragments {
          self.flush_insertions_before(*tag, &mut output)?;

          let path = self.tracker.path().clone();

          if let Some(index) = self.find_matching_modification(&path) {
            self.replacement = Some(Replacement {
              modification: index,
              header: part.clone(),
              value: vec![],
            });

            // The header is withheld until the new value, and with it the
            // new value length, is known
            return Ok(output);
          }
        }

        output.push(part.clone());
      }

      P10Part::SequenceStart {
        tag,
        big_endian,
        explicit_vr,
        ..
      } => {
        self.big_endian = *big_endian;
        self.explicit_vr = *explicit_vr;

        self.flush_insertions_before(*tag, &mut output)?;

        output.push(part.clone());
      }

      P10Part::FragmentsStart {
        tag, big_endian, ..
      } => {
        self.big_endian = *big_endian;
        self.in_fragments = true;

        self.flush_insertions_before(*tag, &mut output)?;

        output.push(part.clone());
      }

      P10Part::SequenceItemStart { .. } => {
        if !self.in_fragments {
          self.open_item_scope();
        }

        output.push(part.clone());
      }

      P10Part::SequenceItemDelimiter { .. } => {
        // Insertions into this item that haven't fired yet go in ahead of
        // its delimiter. The root scope stays open for the whole stream.
        if self.scopes.len() > 1 {
          let scope = self.scopes.pop().unwrap();
          for index in scope.pending {
            self.emit_insertion(index, &mut output)?;
          }
        }

        output.push(part.clone());
      }

      P10Part::SequenceDelimiter { .. } => {
        self.in_fragments = false;

        output.push(part.clone());
      }

      P10Part::DataElementValueBytes {
        data,
        bytes_remaining,
        ..
      } if self.replacement.is_some() => {
        let replacement = self.replacement.as_mut().unwrap();
        replacement.value.extend_from_slice(data);

        if *bytes_remaining == 0 {
          let Replacement {
            modification,
            header,
            value,
          } = self.replacement.take().unwrap();

          let new_value =
            (self.modifications[modification].transform)(value);

          let big_endian = header.is_big_endian();

          output.push(header.with_updated_length(new_value.len() as u32));
          output.push(P10Part::DataElementValueBytes {
            data: new_value,
            bytes_remaining: 0,
            big_endian,
          });
        }
      }

      P10Part::End => {
        // Any insertions still pending for the root data set go in ahead of
        // the end of the stream
        let pending: Vec<usize> = self.scopes[0].pending.drain(..).collect();
        for index in pending {
          self.emit_insertion(index, &mut output)?;
        }

        output.push(P10Part::End);
      }

      _ => output.push(part.clone()),
    }

    Ok(output)
  }

  /// Returns the first modification whose matcher matches the given tag
  /// path.
  ///
  fn find_matching_modification(&self, path: &TagPath) -> Option<usize> {
    self
      .modifications
      .iter()
      .position(|modification| modification.matches(path))
  }

  /// Emits the insertions pending in the innermost open scope whose target
  /// tags sort before the given tag. A pending insertion whose target tag
  /// equals the given tag is dropped: the element is present in the stream
  /// and the modification applies as a replacement instead.
  ///
  fn flush_insertions_before(
    &mut self,
    tag: DataElementTag,
    output: &mut Vec<P10Part>,
  ) -> Result<(), P10Error> {
    loop {
      let next = match self.scopes.last().unwrap().pending.front() {
        Some(&index) => index,
        None => return Ok(()),
      };

      let target_tag = self.modifications[next].path.last_tag().unwrap();

      if target_tag > tag {
        return Ok(());
      }

      self.scopes.last_mut().unwrap().pending.pop_front();

      if target_tag < tag {
        self.emit_insertion(next, output)?;
      }
    }
  }

  /// Opens a pending-insertion scope for the sequence item the stream just
  /// entered, holding the insertions that target that item.
  ///
  fn open_item_scope(&mut self) {
    let item_path = self.tracker.path().clone();

    let pending = self
      .modifications
      .iter()
      .enumerate()
      .filter(|(_, m)| {
        m.insert
          && m.path.depth() == item_path.depth() + 1
          && m.path.parent().matches(&item_path)
      })
      .map(|(index, _)| index)
      .collect();

    self.scopes.push(Scope { pending });
  }

  /// Synthesizes the data element for a pending insertion: a header built
  /// from the dictionary VR in the encoding of the surrounding stream,
  /// followed by the new value as a single chunk.
  ///
  fn emit_insertion(
    &mut self,
    index: usize,
    output: &mut Vec<P10Part>,
  ) -> Result<(), P10Error> {
    let tag = self.modifications[index].path.last_tag().unwrap();

    let vr = match dictionary::find(tag) {
      Some(item) if item.vr == ValueRepresentation::Sequence => {
        return Err(P10Error::InsertionOfSequenceNotSupported {
          path: self.modifications[index].path.clone(),
        });
      }

      Some(item) => item.vr,

      None if !self.insert_guards => ValueRepresentation::Unknown,

      None => return Err(P10Error::InsertionTagNotRecognized { tag }),
    };

    let value = (self.modifications[index].transform)(vec![]);

    let header = DataElementHeader {
      tag,
      vr: Some(vr),
      length: ValueLength::new(value.len() as u32),
    };

    output.push(P10Part::DataElementHeader {
      tag,
      vr,
      length: value.len() as u32,
      is_fmi: false,
      big_endian: self.big_endian,
      explicit_vr: self.explicit_vr,
      bytes: header.to_bytes(self.big_endian, self.explicit_vr),
    });

    output.push(P10Part::DataElementValueBytes {
      data: value,
      bytes_remaining: 0,
      big_endian: self.big_endian,
    });

    Ok(())
  }
}
