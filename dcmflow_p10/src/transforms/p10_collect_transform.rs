//! Transform that buffers a stream of DICOM P10 parts while harvesting a
//! set of data elements from it, then emits the harvested elements as a
//! single composite part ahead of the buffered originals.

use dcmflow_core::{
  dictionary, DataElementTag, SpecificCharacterSets, TagPath,
};

use crate::p10_part::CollectedElement;
use crate::tag_path_tracker::TagPathTracker;
use crate::{P10Error, P10Part};

/// Transform that harvests selected data elements from a stream of DICOM P10
/// parts.
///
/// Incoming parts are buffered while elements whose tag path satisfies the
/// tag condition are accumulated. When a part arrives whose tag path
/// satisfies the stop condition, or the stream ends, a
/// [`P10Part::CollectedElements`] part is emitted first, followed by all
/// buffered parts in their original order, after which the transform becomes
/// a pass-through.
///
/// The *'(0008,0005) Specific Character Set'* data element is always
/// observed, even when not requested, so the harvested string values can be
/// decoded correctly downstream.
///
pub struct P10CollectTransform {
  tag_condition: Box<dyn Fn(&TagPath) -> bool>,
  stop_condition: Box<dyn Fn(&TagPath) -> bool>,
  label: String,
  max_buffer_size: usize,
  tracker: TagPathTracker,
  buffer: Vec<P10Part>,
  buffered_byte_count: usize,
  elements: Vec<CollectedElement>,
  pending_element: Option<PendingElement>,
  character_sets: SpecificCharacterSets,
  is_collecting: bool,
}

/// A matched data element whose value chunks are still arriving.
///
struct PendingElement {
  element: CollectedElement,
  is_requested: bool,
}

impl P10CollectTransform {
  /// The default cap on the number of bytes buffered while collecting.
  ///
  pub const DEFAULT_MAX_BUFFER_SIZE: usize = 1_000_000;

  /// Creates a new collect transform from explicit tag and stop conditions.
  /// A `max_buffer_size` of zero means the buffer is unbounded.
  ///
  pub fn new(
    tag_condition: Box<dyn Fn(&TagPath) -> bool>,
    stop_condition: Box<dyn Fn(&TagPath) -> bool>,
    label: &str,
    max_buffer_size: usize,
  ) -> Self {
    Self {
      tag_condition,
      stop_condition,
      label: label.to_string(),
      max_buffer_size,
      tracker: TagPathTracker::new(),
      buffer: vec![],
      buffered_byte_count: 0,
      elements: vec![],
      pending_element: None,
      character_sets: SpecificCharacterSets::default_repertoire(),
      is_collecting: true,
    }
  }

  /// Creates a new collect transform that harvests the elements at the
  /// given tag paths and stops at the first root data element past the
  /// largest of them.
  ///
  pub fn from_tags(tags: Vec<TagPath>, label: &str) -> Self {
    let max_tag = tags
      .iter()
      .filter_map(TagPath::head_tag)
      .max()
      .unwrap_or(DataElementTag::ZERO);

    let tag_condition = {
      let tags = tags.clone();

      move |path: &TagPath| {
        tags.iter().any(|tag_path| path.starts_with_super_path(tag_path))
      }
    };

    let stop_condition = move |path: &TagPath| {
      path.depth() == 1 && path.head_tag().map(|t| t > max_tag).unwrap_or(false)
    };

    Self::new(
      Box::new(tag_condition),
      Box::new(stop_condition),
      label,
      Self::DEFAULT_MAX_BUFFER_SIZE,
    )
  }

  /// Adds the next part of the stream to the transform and returns the
  /// resulting parts. While collecting, parts are held back and an empty
  /// result is returned.
  ///
  pub fn add_part(&mut self, part: &P10Part) -> Result<Vec<P10Part>, P10Error> {
    if !self.is_collecting {
      return Ok(vec![part.clone()]);
    }

    self.tracker.advance(part);

    // The stop condition is evaluated against the parts that open data
    // elements and sequences in the main data set
    let is_element_start = matches!(
      part,
      P10Part::DataElementHeader { is_fmi: false, .. }
        | P10Part::SequenceStart { .. }
        | P10Part::FragmentsStart { .. }
    );

    if is_element_start && (self.stop_condition)(self.tracker.path()) {
      let mut output = self.finish();
      output.push(part.clone());

      return Ok(output);
    }

    if *part == P10Part::End {
      let mut output = self.finish();
      output.push(P10Part::End);

      return Ok(output);
    }

    self.accumulate_element(part);

    self.buffered_byte_count += part.bytes().len();
    if self.max_buffer_size > 0
      && self.buffered_byte_count > self.max_buffer_size
    {
      return Err(P10Error::MaximumExceeded {
        details: format!(
          "Collect transform exceeded its buffer cap of {} bytes",
          self.max_buffer_size
        ),
        path: self.tracker.path().clone(),
        offset: 0,
      });
    }

    self.buffer.push(part.clone());

    Ok(vec![])
  }

  /// Harvests the given part into the pending element or the character set
  /// record.
  ///
  fn accumulate_element(&mut self, part: &P10Part) {
    match part {
      P10Part::DataElementHeader {
        tag,
        vr,
        length,
        is_fmi: false,
        big_endian,
        explicit_vr,
        ..
      } => {
        let is_requested = (self.tag_condition)(self.tracker.path());
        let is_character_set = *tag == dictionary::SPECIFIC_CHARACTER_SET.tag
          && self.tracker.path().depth() == 1;

        if is_requested || is_character_set {
          self.pending_element = Some(PendingElement {
            element: CollectedElement {
              tag: *tag,
              vr: *vr,
              length: *length,
              big_endian: *big_endian,
              explicit_vr: *explicit_vr,
              bytes: vec![],
            },
            is_requested,
          });
        }
      }

      P10Part::DataElementValueBytes {
        data,
        bytes_remaining,
        ..
      } => {
        if let Some(pending) = self.pending_element.as_mut() {
          pending.element.bytes.extend_from_slice(data);

          if *bytes_remaining == 0 {
            let PendingElement {
              element,
              is_requested,
            } = self.pending_element.take().unwrap();

            if element.tag == dictionary::SPECIFIC_CHARACTER_SET.tag {
              self.character_sets =
                SpecificCharacterSets::from_value_bytes(&element.bytes);
            }

            if is_requested {
              self.elements.push(element);
            }
          }
        }
      }

      // Sequences interrupt any element harvest in progress
      P10Part::SequenceStart { .. } | P10Part::FragmentsStart { .. } => {
        self.pending_element = None;
      }

      _ => (),
    }
  }

  /// Emits the collected elements part followed by the buffered parts, and
  /// turns the transform into a pass-through.
  ///
  fn finish(&mut self) -> Vec<P10Part> {
    self.is_collecting = false;

    let mut output = Vec::with_capacity(self.buffer.len() + 1);

    output.push(P10Part::CollectedElements {
      label: core::mem::take(&mut self.label),
      character_sets: self.character_sets.clone(),
      elements: core::mem::take(&mut self.elements),
    });

    output.append(&mut self.buffer);

    output
  }
}
