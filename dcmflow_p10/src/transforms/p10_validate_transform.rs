//! Transform that gates a stream of raw DICOM P10 bytes on whether its File
//! Meta Information matches a set of allowed presentation contexts.

use byteorder::{ByteOrder, LittleEndian};

use dcmflow_core::{
  dictionary, transfer_syntax, DataElementTag, ValueRepresentation,
};

use crate::internal::data_element_header::{
  DataElementHeader, ValueLengthSize,
};
use crate::P10Error;

/// A `(SOP Class UID, Transfer Syntax UID)` pair that a stream is allowed to
/// match.
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidationContext {
  pub sop_class_uid: String,
  pub transfer_syntax_uid: String,
}

impl ValidationContext {
  /// Creates a new validation context for the given SOP class and transfer
  /// syntax.
  ///
  pub fn new(sop_class_uid: &str, transfer_syntax_uid: &str) -> Self {
    Self {
      sop_class_uid: sop_class_uid.to_string(),
      transfer_syntax_uid: transfer_syntax_uid.to_string(),
    }
  }
}

/// The File Meta Information of a DICOM P10 stream is guaranteed to fit
/// within this many leading bytes, which is all this gate ever buffers.
///
const LOOKAHEAD_SIZE: usize = 512;

/// The number of leading bytes needed to check for a File Preamble and
/// "DICM" prefix.
///
const PREAMBLE_SIZE: usize = 132;

/// Transform that validates a stream of raw DICOM P10 bytes before it is
/// parsed, by buffering its leading bytes and checking them against a set of
/// allowed [`ValidationContext`]s.
///
/// With contexts configured, the stream's `(MediaStorageSOPClassUID,
/// TransferSyntaxUID)` pair must match one of them. Without contexts, the
/// stream merely has to open with a valid File Preamble or a plausible first
/// data element header.
///
/// On success the buffered bytes are released downstream unchanged, followed
/// by all subsequent bytes as they arrive. On failure the behavior depends
/// on `drain_incoming`: when false the error is returned immediately, when
/// true incoming bytes are silently consumed until the stream completes and
/// only then is the error returned. The latter protects producers that can't
/// tolerate abrupt cancellation.
///
pub struct P10ValidateTransform {
  contexts: Option<Vec<ValidationContext>>,
  drain_incoming: bool,
  buffer: Vec<u8>,
  state: State,
}

enum State {
  Buffering,
  PassThrough,
  Draining { error: P10Error },
}

impl P10ValidateTransform {
  /// Creates a new validation transform. `contexts` of `None` checks only
  /// that the stream opens like DICOM P10 data.
  ///
  pub fn new(
    contexts: Option<Vec<ValidationContext>>,
    drain_incoming: bool,
  ) -> Self {
    Self {
      contexts,
      drain_incoming,
      buffer: vec![],
      state: State::Buffering,
    }
  }

  /// Adds the next chunk of the incoming stream to the transform. `done` is
  /// true on the final chunk. Returns the chunks to pass downstream, which
  /// are empty while the gate is still buffering.
  ///
  pub fn add_bytes(
    &mut self,
    bytes: &[u8],
    done: bool,
  ) -> Result<Vec<Vec<u8>>, P10Error> {
    match &self.state {
      State::PassThrough => Ok(vec![bytes.to_vec()]),

      State::Draining { error } => {
        if done {
          Err(error.clone())
        } else {
          Ok(vec![])
        }
      }

      State::Buffering => {
        self.buffer.extend_from_slice(bytes);

        let lookahead = if self.contexts.is_some() {
          LOOKAHEAD_SIZE
        } else {
          PREAMBLE_SIZE
        };

        if self.buffer.len() < lookahead && !done {
          return Ok(vec![]);
        }

        match self.validate_buffer() {
          Ok(()) => {
            self.state = State::PassThrough;

            Ok(vec![core::mem::take(&mut self.buffer)])
          }

          Err(error) => {
            if self.drain_incoming && !done {
              self.buffer = vec![];
              self.state = State::Draining { error };

              Ok(vec![])
            } else {
              Err(error)
            }
          }
        }
      }
    }
  }

  fn validate_buffer(&self) -> Result<(), P10Error> {
    match &self.contexts {
      Some(contexts) => self.validate_against_contexts(contexts),
      None => self.validate_stream_opening(),
    }
  }

  /// Checks that the stream's `(SOP Class UID, Transfer Syntax UID)` pair
  /// matches one of the allowed contexts.
  ///
  fn validate_against_contexts(
    &self,
    contexts: &[ValidationContext],
  ) -> Result<(), P10Error> {
    let (sop_class_uid, transfer_syntax_uid) = if self.has_preamble() {
      self.read_file_meta_information()?
    } else {
      // Without a preamble the data set is expected to open with small
      // leading elements, in ascending tag order, that include the SOP
      // Class UID. The transfer syntax pairs as explicit VR little endian.
      let sop_class_uid = self.read_leading_sop_class_uid()?;

      (
        sop_class_uid,
        transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN.uid.to_string(),
      )
    };

    let is_accepted = contexts.iter().any(|context| {
      context.sop_class_uid == sop_class_uid
        && context.transfer_syntax_uid == transfer_syntax_uid
    });

    if is_accepted {
      Ok(())
    } else {
      Err(P10Error::ValidationFailed {
        details: format!(
          "No allowed context matches SOP class '{}' and transfer syntax \
           '{}'",
          sop_class_uid, transfer_syntax_uid
        ),
      })
    }
  }

  /// Checks that the stream opens with a valid File Preamble or a plausible
  /// first data element header.
  ///
  fn validate_stream_opening(&self) -> Result<(), P10Error> {
    if self.has_preamble() {
      return Ok(());
    }

    if self.buffer.len() >= 8 {
      let tag = DataElementTag::new(
        LittleEndian::read_u16(&self.buffer[0..2]),
        LittleEndian::read_u16(&self.buffer[2..4]),
      );

      let tag_is_plausible =
        dictionary::find(tag).is_some() || (tag.group > 0 && tag.group <= 0x0008);

      let vr_is_plausible =
        ValueRepresentation::from_bytes(&self.buffer[4..6]).is_ok();

      if tag_is_plausible && vr_is_plausible {
        return Ok(());
      }
    }

    Err(P10Error::ValidationFailed {
      details: "Stream does not start with a File Preamble or a valid data \
                element header"
        .to_string(),
    })
  }

  fn has_preamble(&self) -> bool {
    self.buffer.len() >= PREAMBLE_SIZE
      && self.buffer[128..132] == *b"DICM"
  }

  /// Reads the File Meta Information data elements in the buffered bytes
  /// and returns the values of *'(0002,0002) Media Storage SOP Class UID'*
  /// and *'(0002,0010) Transfer Syntax UID'*.
  ///
  fn read_file_meta_information(&self) -> Result<(String, String), P10Error> {
    let mut offset = PREAMBLE_SIZE;
    let mut previous_tag: Option<DataElementTag> = None;

    let mut sop_class_uid = None;
    let mut transfer_syntax_uid = None;

    while offset + 8 <= self.buffer.len() {
      let tag = DataElementTag::new(
        LittleEndian::read_u16(&self.buffer[offset..offset + 2]),
        LittleEndian::read_u16(&self.buffer[offset + 2..offset + 4]),
      );

      if tag.group != 0x0002 {
        break;
      }

      if let Some(previous) = previous_tag {
        if tag <= previous {
          return Err(P10Error::ValidationFailed {
            details: format!(
              "File Meta Information data element '{}' is out of order",
              tag
            ),
          });
        }
      }
      previous_tag = Some(tag);

      let vr =
        ValueRepresentation::from_bytes(&self.buffer[offset + 4..offset + 6])
          .map_err(|_| P10Error::ValidationFailed {
            details: format!(
              "File Meta Information data element '{}' has an invalid VR",
              tag
            ),
          })?;

      let (value_offset, length) =
        match DataElementHeader::value_length_size(vr) {
          ValueLengthSize::U16 => (
            offset + 8,
            LittleEndian::read_u16(&self.buffer[offset + 6..offset + 8])
              as usize,
          ),

          ValueLengthSize::U32 => {
            if offset + 12 > self.buffer.len() {
              break;
            }

            (
              offset + 12,
              LittleEndian::read_u32(&self.buffer[offset + 8..offset + 12])
                as usize,
            )
          }
        };

      if value_offset + length > self.buffer.len() {
        break;
      }

      let value = &self.buffer[value_offset..value_offset + length];

      if tag == dictionary::MEDIA_STORAGE_SOP_CLASS_UID.tag {
        sop_class_uid = Some(trim_uid(value));
      } else if tag == dictionary::TRANSFER_SYNTAX_UID.tag {
        transfer_syntax_uid = Some(trim_uid(value));
      }

      offset = value_offset + length;
    }

    match (sop_class_uid, transfer_syntax_uid) {
      (Some(sop_class_uid), Some(transfer_syntax_uid)) => {
        Ok((sop_class_uid, transfer_syntax_uid))
      }

      _ => Err(P10Error::ValidationFailed {
        details: "File Meta Information is missing the SOP class UID or \
                  transfer syntax UID"
          .to_string(),
      }),
    }
  }

  /// Reads the leading data elements of a data set that has no preamble,
  /// expecting explicit VR little endian and ascending tags, and returns the
  /// value of *'(0008,0016) SOP Class UID'*.
  ///
  fn read_leading_sop_class_uid(&self) -> Result<String, P10Error> {
    let mut offset = 0;
    let mut previous_tag: Option<DataElementTag> = None;

    while offset + 8 <= self.buffer.len() {
      let tag = DataElementTag::new(
        LittleEndian::read_u16(&self.buffer[offset..offset + 2]),
        LittleEndian::read_u16(&self.buffer[offset + 2..offset + 4]),
      );

      if tag.group != 0x0008 {
        return Err(P10Error::ValidationFailed {
          details: format!(
            "Data element '{}' is not valid ahead of the SOP class UID",
            tag
          ),
        });
      }

      if tag > dictionary::SOP_CLASS_UID.tag {
        break;
      }

      if let Some(previous) = previous_tag {
        if tag <= previous {
          return Err(P10Error::ValidationFailed {
            details: format!("Data element '{}' is out of order", tag),
          });
        }
      }
      previous_tag = Some(tag);

      let Ok(vr) =
        ValueRepresentation::from_bytes(&self.buffer[offset + 4..offset + 6])
      else {
        return Err(P10Error::ValidationFailed {
          details: format!("Data element '{}' has an invalid VR", tag),
        });
      };

      let (value_offset, length) =
        match DataElementHeader::value_length_size(vr) {
          ValueLengthSize::U16 => (
            offset + 8,
            LittleEndian::read_u16(&self.buffer[offset + 6..offset + 8])
              as usize,
          ),

          ValueLengthSize::U32 => {
            if offset + 12 > self.buffer.len() {
              break;
            }

            (
              offset + 12,
              LittleEndian::read_u32(&self.buffer[offset + 8..offset + 12])
                as usize,
            )
          }
        };

      if value_offset + length > self.buffer.len() {
        break;
      }

      if tag == dictionary::SOP_CLASS_UID.tag {
        return Ok(trim_uid(&self.buffer[value_offset..value_offset + length]));
      }

      offset = value_offset + length;
    }

    Err(P10Error::ValidationFailed {
      details: "SOP class UID not found in the stream's leading data \
                elements"
        .to_string(),
    })
  }
}

/// Strips the padding that UI values carry to an even length.
///
fn trim_uid(value: &[u8]) -> String {
  String::from_utf8_lossy(value)
    .trim_matches([' ', '\0'])
    .to_string()
}
