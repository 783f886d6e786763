//! Converts incoming chunks of binary DICOM P10 data into DICOM P10 parts.
//!
//! This conversion is done in a streaming fashion, where chunks of incoming
//! raw binary data are added to a read context, and DICOM P10 parts are then
//! progressively made available as their data comes in. See the [`P10Part`]
//! type for details on the different parts that are emitted.
//!
//! Every emitted part carries its exact on-the-wire bytes, so the
//! concatenation of all parts' bytes reproduces the incoming data.
//!
//! If DICOM P10 data already exists fully in memory it can be added to a new
//! read context as one complete and final chunk and have its parts read out,
//! i.e. there is no requirement to use a read context in a streaming fashion.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use dcmflow_core::{
  dictionary, transfer_syntax, DataElementTag, TagPath, TransferSyntax,
  ValueRepresentation,
};

use crate::internal::byte_stream::{ByteStream, ByteStreamError};
use crate::internal::data_element_header::{
  DataElementHeader, ValueLengthSize,
};
use crate::internal::p10_location::{P10Location, PendingDelimiter};
use crate::internal::value_length::{ValueLength, UNDEFINED_LENGTH};
use crate::{P10Error, P10Part, P10ReadConfig};

/// A read context holds the current state of an in-progress DICOM P10 read.
/// Raw DICOM P10 data is added to a read context with [`Self::write_bytes`],
/// and DICOM P10 parts are then read out with [`Self::read_parts`].
///
#[derive(Debug)]
pub struct P10ReadContext {
  config: P10ReadConfig,
  stream: ByteStream,
  next_action: NextAction,
  big_endian: bool,
  explicit_vr: bool,
  declared_transfer_syntax: Option<&'static TransferSyntax>,
  location: P10Location,
  is_complete: bool,
}

/// The next action specifies what will be attempted to be read next from a
/// read context by `read_parts`.
///
#[derive(Debug)]
enum NextAction {
  ReadFilePreambleAndDICMPrefix,

  ReadFileMetaInformationHeader {
    ends_at: Option<u64>,
  },

  ReadFileMetaInformationValueBytes {
    tag: DataElementTag,
    bytes_remaining: u32,
    ends_at: Option<u64>,
    // The value is accumulated only for the group length and transfer
    // syntax UID data elements, which steer the rest of the read
    value: Vec<u8>,
  },

  ReadDataElementHeader,

  ReadDataElementValueBytes {
    vr: ValueRepresentation,
    bytes_remaining: u32,
    in_fragments: bool,
  },

  ReadPixelDataItemHeader {
    vr: ValueRepresentation,
  },

  ReadDeflatedChunk,
}

impl P10ReadContext {
  /// Creates a new read context for reading DICOM P10 data.
  ///
  pub fn new(config: Option<P10ReadConfig>) -> P10ReadContext {
    let config = config.unwrap_or_default();

    P10ReadContext {
      config,
      stream: ByteStream::new(),
      next_action: NextAction::ReadFilePreambleAndDICMPrefix,
      big_endian: config.assume_big_endian,
      explicit_vr: config.assume_explicit_vr,
      declared_transfer_syntax: None,
      location: P10Location::new(),
      is_complete: false,
    }
  }

  /// Returns the transfer syntax declared in the File Meta Information of
  /// the data being read, if it declared one.
  ///
  pub fn transfer_syntax(&self) -> Option<&'static TransferSyntax> {
    self.declared_transfer_syntax
  }

  /// Writes raw DICOM P10 bytes to a read context that will be parsed into
  /// DICOM P10 parts by subsequent calls to [`Self::read_parts`]. If `done`
  /// is true this indicates the end of the incoming data, after which any
  /// further call to this function will error.
  ///
  pub fn write_bytes(
    &mut self,
    bytes: Vec<u8>,
    done: bool,
  ) -> Result<(), P10Error> {
    self.stream.write(bytes, done).map_err(|e| {
      map_byte_stream_error(
        e,
        "Writing data to DICOM P10 read context",
        &self.stream,
        &self.location,
      )
    })
  }

  /// Reads the next DICOM P10 parts from a read context. On success, zero or
  /// more parts are returned and the function can be called again to read
  /// further parts.
  ///
  /// On error, a value of [`P10Error::DataRequired`] means the read context
  /// does not have enough data to produce the next part, i.e. further calls
  /// to [`Self::write_bytes`] are required before the next part is able to
  /// be read.
  ///
  pub fn read_parts(&mut self) -> Result<Vec<P10Part>, P10Error> {
    if self.is_complete {
      return Ok(vec![]);
    }

    match self.next_action {
      NextAction::ReadFilePreambleAndDICMPrefix => {
        self.read_file_preamble_and_dicm_prefix_part()
      }

      NextAction::ReadFileMetaInformationHeader { .. } => {
        self.read_file_meta_information_header_part()
      }

      NextAction::ReadFileMetaInformationValueBytes { .. } => {
        self.read_file_meta_information_value_bytes_part()
      }

      NextAction::ReadDataElementHeader => {
        // If a defined-length sequence or item ends at the current position
        // then its delimiter is the next part
        let bytes_read = self.stream.bytes_read();
        if let Some(delimiter) = self.location.next_delimiter(bytes_read) {
          return Ok(vec![self.delimiter_part(delimiter)]);
        }

        // Detect the end of the DICOM data. Sequences and items that are
        // still open are closed with delimiter parts, which means data
        // truncated on a data element boundary reads without error.
        if self.stream.is_fully_consumed() {
          let mut parts: Vec<P10Part> = self
            .location
            .pending_delimiters()
            .into_iter()
            .map(|delimiter| self.delimiter_part(delimiter))
            .collect();

          parts.push(P10Part::End);

          self.is_complete = true;

          return Ok(parts);
        }

        self.read_data_element_header_part()
      }

      NextAction::ReadDataElementValueBytes { .. } => {
        self.read_data_element_value_bytes_part()
      }

      NextAction::ReadPixelDataItemHeader { .. } => {
        self.read_pixel_data_item_header_part()
      }

      NextAction::ReadDeflatedChunk => self.read_deflated_chunk_part(),
    }
  }

  /// Returns the byte order and VR serialization mode in effect at the
  /// current location. An enclosing UN sequence with undefined length forces
  /// 'Implicit VR Little Endian' per DICOM Correction Proposal CP-246.
  ///
  fn active_encoding(&self) -> (bool, bool) {
    if self.location.is_implicit_vr_forced() {
      (false, false)
    } else {
      (self.big_endian, self.explicit_vr)
    }
  }

  fn delimiter_part(&self, delimiter: PendingDelimiter) -> P10Part {
    let (big_endian, _) = self.active_encoding();

    match delimiter {
      PendingDelimiter::Item { index } => P10Part::SequenceItemDelimiter {
        index,
        big_endian,
        bytes: vec![],
      },

      PendingDelimiter::Sequence { .. } => P10Part::SequenceDelimiter {
        big_endian,
        bytes: vec![],
      },
    }
  }

  /// Reads the 128-byte File Preamble and the 4-byte "DICM" prefix that
  /// follows it. If the "DICM" bytes aren't present at the expected offset
  /// then the input has no preamble and the data set starts immediately,
  /// using the configured encoding assumptions.
  ///
  fn read_file_preamble_and_dicm_prefix_part(
    &mut self,
  ) -> Result<Vec<P10Part>, P10Error> {
    match self.stream.peek(132) {
      Ok(data) if data[128..132] == *b"DICM" => {
        let bytes = self.stream.read(132).map_err(|e| {
          map_byte_stream_error(
            e,
            "Reading file header",
            &self.stream,
            &self.location,
          )
        })?;

        self.next_action =
          NextAction::ReadFileMetaInformationHeader { ends_at: None };

        Ok(vec![P10Part::FilePreambleAndDICMPrefix { bytes }])
      }

      // No "DICM" prefix, or the stream ended inside the first 132 bytes:
      // there is no File Preamble and the data starts at offset zero
      Ok(_) | Err(ByteStreamError::DataEnd) => {
        self.prepare_for_dataset_start();

        Ok(vec![])
      }

      Err(e) => Err(map_byte_stream_error(
        e,
        "Reading file header",
        &self.stream,
        &self.location,
      )),
    }
  }

  /// Sets up reading of data that has no File Preamble. File Meta
  /// Information without a preamble is detected by its group number, and the
  /// assumed byte order is corrected if the first data element header is
  /// implausible in it.
  ///
  fn prepare_for_dataset_start(&mut self) {
    if let Ok(data) = self.stream.peek(8) {
      // Group 0x0002 in little endian means File Meta Information follows,
      // since the FMI is always encoded in explicit VR little endian
      if LittleEndian::read_u16(&data[0..2]) == 0x0002 {
        self.next_action =
          NextAction::ReadFileMetaInformationHeader { ends_at: None };

        return;
      }

      // The assumed byte order is revisited when the first header only
      // makes sense in the opposite one
      if !Self::is_plausible_header(&data, self.big_endian, self.explicit_vr)
        && Self::is_plausible_header(&data, !self.big_endian, self.explicit_vr)
      {
        self.big_endian = !self.big_endian;
      }
    }

    self.next_action = NextAction::ReadDataElementHeader;
  }

  /// Returns whether the given 8 bytes are plausible as the first data
  /// element header of a data set in the given encoding: a recognized or
  /// early-group tag, a valid VR when VRs are explicit, and a sane length
  /// when they are not.
  ///
  fn is_plausible_header(
    data: &[u8],
    big_endian: bool,
    explicit_vr: bool,
  ) -> bool {
    let (group, length) = if big_endian {
      (
        BigEndian::read_u16(&data[0..2]),
        BigEndian::read_u32(&data[4..8]),
      )
    } else {
      (
        LittleEndian::read_u16(&data[0..2]),
        LittleEndian::read_u32(&data[4..8]),
      )
    };

    let tag = if big_endian {
      DataElementTag::new(group, BigEndian::read_u16(&data[2..4]))
    } else {
      DataElementTag::new(group, LittleEndian::read_u16(&data[2..4]))
    };

    let tag_is_plausible =
      dictionary::find(tag).is_some() || (group > 0 && group <= 0x0008);

    if !tag_is_plausible {
      return false;
    }

    if explicit_vr {
      ValueRepresentation::from_bytes(&data[4..6]).is_ok()
    } else {
      length == UNDEFINED_LENGTH || length < 0x1000_0000
    }
  }

  /// Reads the header of the next File Meta Information data element. The
  /// File Meta Information is always encoded in explicit VR little endian.
  /// Reaching the group length's declared end, or a data element with a
  /// group other than 0x0002, moves reading on to the main data set.
  ///
  fn read_file_meta_information_header_part(
    &mut self,
  ) -> Result<Vec<P10Part>, P10Error> {
    let ends_at = match self.next_action {
      NextAction::ReadFileMetaInformationHeader { ends_at } => ends_at,
      _ => unreachable!(),
    };

    if let Some(ends_at) = ends_at {
      if self.stream.bytes_read() >= ends_at {
        return self.start_dataset();
      }
    }

    let data = match self.stream.peek(8) {
      Ok(data) => data,

      // The stream ending cleanly here means there is no main data set
      Err(ByteStreamError::DataEnd) => return self.start_dataset(),

      Err(e) => {
        return Err(map_byte_stream_error(
          e,
          "Reading File Meta Information",
          &self.stream,
          &self.location,
        ));
      }
    };

    let group = LittleEndian::read_u16(&data[0..2]);
    let element = LittleEndian::read_u16(&data[2..4]);
    let tag = DataElementTag::new(group, element);

    if group != 0x0002 {
      if ends_at.is_some() {
        return Err(P10Error::DataInvalid {
          when: "Reading File Meta Information".to_string(),
          details: format!(
            "Data element '{}' does not have the group 0x0002",
            tag
          ),
          path: TagPath::from_tag(tag),
          offset: self.stream.bytes_read(),
        });
      }

      return self.start_dataset();
    }

    let vr = ValueRepresentation::from_bytes(&data[4..6]).map_err(|_| {
      P10Error::DataInvalid {
        when: "Reading File Meta Information".to_string(),
        details: "Data element has invalid VR".to_string(),
        path: TagPath::from_tag(tag),
        offset: self.stream.bytes_read(),
      }
    })?;

    if vr == ValueRepresentation::Sequence {
      return Err(P10Error::DataInvalid {
        when: "Reading File Meta Information".to_string(),
        details: "Data element in File Meta Information is a sequence"
          .to_string(),
        path: TagPath::from_tag(tag),
        offset: self.stream.bytes_read(),
      });
    }

    let header_size = match DataElementHeader::value_length_size(vr) {
      ValueLengthSize::U16 => 8,
      ValueLengthSize::U32 => 12,
    };

    let bytes = self.stream.read(header_size).map_err(|e| {
      map_byte_stream_error(
        e,
        "Reading File Meta Information",
        &self.stream,
        &self.location,
      )
    })?;

    let length = match header_size {
      8 => u32::from(LittleEndian::read_u16(&bytes[6..8])),
      _ => LittleEndian::read_u32(&bytes[8..12]),
    };

    self.next_action = NextAction::ReadFileMetaInformationValueBytes {
      tag,
      bytes_remaining: length,
      ends_at,
      value: vec![],
    };

    Ok(vec![P10Part::DataElementHeader {
      tag,
      vr,
      length,
      is_fmi: true,
      big_endian: false,
      explicit_vr: true,
      bytes,
    }])
  }

  /// Reads the next chunk of the value of the current File Meta Information
  /// data element. On completion of the group length value the end offset of
  /// the File Meta Information becomes known, and on completion of the
  /// transfer syntax UID value the encoding of the main data set is set.
  ///
  fn read_file_meta_information_value_bytes_part(
    &mut self,
  ) -> Result<Vec<P10Part>, P10Error> {
    let (tag, bytes_remaining) = match &self.next_action {
      NextAction::ReadFileMetaInformationValueBytes {
        tag,
        bytes_remaining,
        ..
      } => (*tag, *bytes_remaining),
      _ => unreachable!(),
    };

    let bytes_to_read =
      core::cmp::min(bytes_remaining, self.config.max_part_size);

    let data = self.stream.read(bytes_to_read as usize).map_err(|e| {
      map_byte_stream_error(
        e,
        "Reading File Meta Information data element value",
        &self.stream,
        &self.location,
      )
    })?;

    let bytes_remaining = bytes_remaining - bytes_to_read;

    let is_steering_element = tag
      == dictionary::FILE_META_INFORMATION_GROUP_LENGTH.tag
      || tag == dictionary::TRANSFER_SYNTAX_UID.tag;

    let (ends_at, value) = match &mut self.next_action {
      NextAction::ReadFileMetaInformationValueBytes {
        ends_at, value, ..
      } => {
        if is_steering_element {
          value.extend_from_slice(&data);
        }

        (*ends_at, core::mem::take(value))
      }
      _ => unreachable!(),
    };

    let part = P10Part::DataElementValueBytes {
      data,
      bytes_remaining,
      big_endian: false,
    };

    if bytes_remaining > 0 {
      self.next_action = NextAction::ReadFileMetaInformationValueBytes {
        tag,
        bytes_remaining,
        ends_at,
        value,
      };

      return Ok(vec![part]);
    }

    // The group length value gives the offset at which the File Meta
    // Information ends
    let mut ends_at = ends_at;
    if tag == dictionary::FILE_META_INFORMATION_GROUP_LENGTH.tag
      && ends_at.is_none()
    {
      if value.len() != 4 {
        return Err(P10Error::DataInvalid {
          when: "Reading File Meta Information".to_string(),
          details: "Group length value is invalid".to_string(),
          path: TagPath::from_tag(tag),
          offset: self.stream.bytes_read(),
        });
      }

      ends_at = Some(
        self.stream.bytes_read() + u64::from(LittleEndian::read_u32(&value)),
      );
    }

    if tag == dictionary::TRANSFER_SYNTAX_UID.tag {
      let uid = String::from_utf8_lossy(&value);
      let uid = uid.trim_matches([' ', '\0']);

      self.declared_transfer_syntax =
        Some(TransferSyntax::from_uid(uid).map_err(|_| {
          P10Error::TransferSyntaxNotSupported {
            transfer_syntax_uid: uid.to_string(),
          }
        })?);
    }

    self.next_action = NextAction::ReadFileMetaInformationHeader { ends_at };

    Ok(vec![part])
  }

  /// Moves reading on to the main data set, applying the transfer syntax
  /// declared in the File Meta Information.
  ///
  fn start_dataset(&mut self) -> Result<Vec<P10Part>, P10Error> {
    if let Some(transfer_syntax) = self.declared_transfer_syntax {
      self.big_endian = transfer_syntax.endianness.is_big();
      self.explicit_vr = transfer_syntax.vr_serialization
        == transfer_syntax::VrSerialization::VrExplicit;

      if transfer_syntax.is_deflated {
        if self.config.inflate_deflated {
          self.stream.start_zlib_inflate();
        } else {
          self.next_action = NextAction::ReadDeflatedChunk;

          return Ok(vec![]);
        }
      }
    }

    self.next_action = NextAction::ReadDataElementHeader;

    Ok(vec![])
  }

  /// Reads a data element header in the main data set and emits the part
  /// that opens it: a plain data element, a sequence, a sequence item, an
  /// encapsulated pixel data stream, or a delimiter.
  ///
  fn read_data_element_header_part(
    &mut self,
  ) -> Result<Vec<P10Part>, P10Error> {
    let (big_endian, explicit_vr) = self.active_encoding();

    let data = self.stream.peek(4).map_err(|e| {
      map_byte_stream_error(
        e,
        "Reading data element header",
        &self.stream,
        &self.location,
      )
    })?;

    let tag = read_tag(&data, big_endian);

    // The item and delimitation tags carry a 4-byte length and no VR
    if tag == dictionary::ITEM.tag
      || tag == dictionary::ITEM_DELIMITATION_ITEM.tag
      || tag == dictionary::SEQUENCE_DELIMITATION_ITEM.tag
    {
      return self.read_structural_tag(tag, big_endian);
    }

    // File Meta Information data elements aren't allowed in the root of the
    // main data set. They are tolerated in sequence items because such data
    // has been observed in the wild.
    if tag.group == 0x0002 && self.location.sequence_depth() == 0 {
      return Err(P10Error::DataInvalid {
        when: "Reading data element header".to_string(),
        details: format!(
          "File Meta Information data element '{}' found in the main data \
           set",
          tag
        ),
        path: TagPath::from_tag(tag),
        offset: self.stream.bytes_read(),
      });
    }

    let (vr, length, bytes) = if explicit_vr {
      self.read_explicit_vr_and_length(tag, big_endian)?
    } else {
      self.read_implicit_vr_and_length(tag, big_endian)?
    };

    match (vr, length) {
      // An encapsulated pixel data stream
      (
        ValueRepresentation::OtherByteString
        | ValueRepresentation::OtherWordString,
        ValueLength::Undefined,
      ) if tag == dictionary::PIXEL_DATA.tag => {
        self.check_data_element_ordering(tag)?;

        self
          .location
          .add_sequence(tag, false, None)
          .map_err(|details| self.data_invalid(details))?;

        self.next_action = NextAction::ReadPixelDataItemHeader { vr };

        Ok(vec![P10Part::FragmentsStart {
          tag,
          vr,
          big_endian,
          bytes,
        }])
      }

      // The start of a sequence. A VR of UN with undefined length is read
      // as a sequence whose content is 'Implicit VR Little Endian', per
      // DICOM Correction Proposal CP-246.
      (ValueRepresentation::Sequence, _)
      | (ValueRepresentation::Unknown, ValueLength::Undefined) => {
        self.check_data_element_ordering(tag)?;

        if self.location.sequence_depth() >= self.config.max_sequence_depth {
          return Err(P10Error::MaximumExceeded {
            details: "Maximum allowed sequence depth reached".to_string(),
            path: self.location.path(Some(tag)),
            offset: self.stream.bytes_read(),
          });
        }

        let ends_at = match length {
          ValueLength::Defined { length } => {
            Some(self.stream.bytes_read() + u64::from(length))
          }
          ValueLength::Undefined => None,
        };

        let is_implicit_vr = vr == ValueRepresentation::Unknown
          || self.location.is_implicit_vr_forced();

        self
          .location
          .add_sequence(tag, is_implicit_vr, ends_at)
          .map_err(|details| self.data_invalid(details))?;

        Ok(vec![P10Part::SequenceStart {
          tag,
          length: length.to_int(),
          big_endian,
          explicit_vr,
          bytes,
        }])
      }

      // A standard data element whose value bytes follow
      (vr, ValueLength::Defined { length }) => {
        self.check_data_element_ordering(tag)?;

        self.next_action = NextAction::ReadDataElementValueBytes {
          vr,
          bytes_remaining: length,
          in_fragments: false,
        };

        Ok(vec![P10Part::DataElementHeader {
          tag,
          vr,
          length,
          is_fmi: false,
          big_endian,
          explicit_vr,
          bytes,
        }])
      }

      (_, _) => Err(P10Error::DataInvalid {
        when: "Reading data element header".to_string(),
        details: format!(
          "Data element '{}' with VR {} has undefined length",
          tag, vr
        ),
        path: self.location.path(Some(tag)),
        offset: self.stream.bytes_read(),
      }),
    }
  }

  /// Reads an item, item delimitation, or sequence delimitation tag in the
  /// main data set.
  ///
  fn read_structural_tag(
    &mut self,
    tag: DataElementTag,
    big_endian: bool,
  ) -> Result<Vec<P10Part>, P10Error> {
    let bytes = self.stream.read(8).map_err(|e| {
      map_byte_stream_error(
        e,
        "Reading data element header",
        &self.stream,
        &self.location,
      )
    })?;

    let length = read_u32(&bytes[4..8], big_endian);

    if tag == dictionary::ITEM.tag {
      let ends_at = if length == UNDEFINED_LENGTH {
        None
      } else {
        Some(self.stream.bytes_read() + u64::from(length))
      };

      let index = self
        .location
        .add_item(ends_at)
        .map_err(|details| self.data_invalid(details))?;

      return Ok(vec![P10Part::SequenceItemStart {
        index,
        length,
        big_endian,
        bytes,
      }]);
    }

    if length != 0 {
      return Err(P10Error::DataInvalid {
        when: "Reading data element header".to_string(),
        details: format!("Delimitation item '{}' has a nonzero length", tag),
        path: self.location.path(None),
        offset: self.stream.bytes_read(),
      });
    }

    if tag == dictionary::ITEM_DELIMITATION_ITEM.tag {
      let index = self
        .location
        .end_item()
        .map_err(|details| self.data_invalid(details))?;

      return Ok(vec![P10Part::SequenceItemDelimiter {
        index,
        big_endian,
        bytes,
      }]);
    }

    // A sequence delimiter with no open sequence has been observed in the
    // wild. It is passed through as an unknown part and parsing continues.
    match self.location.end_sequence() {
      Ok(_) => Ok(vec![P10Part::SequenceDelimiter { big_endian, bytes }]),
      Err(_) => Ok(vec![P10Part::Unknown { big_endian, bytes }]),
    }
  }

  /// Reads the explicit VR and value length following a data element tag.
  /// The header is 8 or 12 bytes in total depending on the VR.
  ///
  fn read_explicit_vr_and_length(
    &mut self,
    tag: DataElementTag,
    big_endian: bool,
  ) -> Result<(ValueRepresentation, ValueLength, Vec<u8>), P10Error> {
    let data = self.stream.peek(6).map_err(|e| {
      map_byte_stream_error(
        e,
        "Reading explicit VR data element header",
        &self.stream,
        &self.location,
      )
    })?;

    let vr_bytes = &data[4..6];

    let vr = match ValueRepresentation::from_bytes(vr_bytes) {
      Ok(vr) => vr,

      // A VR of two spaces or two NUL characters is treated as UN. This is
      // not part of the DICOM P10 spec, but such data has been observed in
      // the wild.
      _ => match vr_bytes {
        [0x00, 0x00] | [0x20, 0x20] => ValueRepresentation::Unknown,

        _ => {
          return Err(P10Error::DataInvalid {
            when: "Reading data element VR".to_string(),
            details: format!(
              "Unrecognized VR {:?} for tag '{}'",
              vr_bytes,
              dictionary::tag_with_name(tag)
            ),
            path: self.location.path(Some(tag)),
            offset: self.stream.bytes_read(),
          });
        }
      },
    };

    let header_size = match DataElementHeader::value_length_size(vr) {
      ValueLengthSize::U16 => 8,
      ValueLengthSize::U32 => 12,
    };

    let bytes = self.stream.read(header_size).map_err(|e| {
      map_byte_stream_error(
        e,
        "Reading explicit VR data element header",
        &self.stream,
        &self.location,
      )
    })?;

    let length = match header_size {
      8 => u32::from(read_u16(&bytes[6..8], big_endian)),
      _ => read_u32(&bytes[8..12], big_endian),
    };

    Ok((vr, ValueLength::new(length), bytes))
  }

  /// Reads the value length following a data element tag when VRs are
  /// implicit. The VR is taken from the dictionary, defaulting to UN.
  ///
  fn read_implicit_vr_and_length(
    &mut self,
    tag: DataElementTag,
    big_endian: bool,
  ) -> Result<(ValueRepresentation, ValueLength, Vec<u8>), P10Error> {
    let bytes = self.stream.read(8).map_err(|e| {
      map_byte_stream_error(
        e,
        "Reading data element header",
        &self.stream,
        &self.location,
      )
    })?;

    let length = read_u32(&bytes[4..8], big_endian);

    let vr = match dictionary::find(tag) {
      Some(item) => item.vr,
      None if tag.is_group_length() => ValueRepresentation::UnsignedLong,
      None => ValueRepresentation::Unknown,
    };

    Ok((vr, ValueLength::new(length), bytes))
  }

  /// Reads the next chunk of the value of the current data element or pixel
  /// data fragment.
  ///
  fn read_data_element_value_bytes_part(
    &mut self,
  ) -> Result<Vec<P10Part>, P10Error> {
    let (vr, bytes_remaining, in_fragments) = match self.next_action {
      NextAction::ReadDataElementValueBytes {
        vr,
        bytes_remaining,
        in_fragments,
      } => (vr, bytes_remaining, in_fragments),
      _ => unreachable!(),
    };

    let bytes_to_read =
      core::cmp::min(bytes_remaining, self.config.max_part_size);

    let data = self.stream.read(bytes_to_read as usize).map_err(|e| {
      let when =
        format!("Reading {} data element value bytes, VR: {}", bytes_to_read, vr);

      map_byte_stream_error(e, &when, &self.stream, &self.location)
    })?;

    let bytes_remaining = bytes_remaining - bytes_to_read;

    let (big_endian, _) = self.active_encoding();

    self.next_action = if bytes_remaining > 0 {
      NextAction::ReadDataElementValueBytes {
        vr,
        bytes_remaining,
        in_fragments,
      }
    } else if in_fragments {
      NextAction::ReadPixelDataItemHeader { vr }
    } else {
      NextAction::ReadDataElementHeader
    };

    Ok(vec![P10Part::DataElementValueBytes {
      data,
      bytes_remaining,
      big_endian,
    }])
  }

  /// Reads the header of the next item in an encapsulated pixel data
  /// stream, or the sequence delimitation that closes it.
  ///
  fn read_pixel_data_item_header_part(
    &mut self,
  ) -> Result<Vec<P10Part>, P10Error> {
    let vr = match self.next_action {
      NextAction::ReadPixelDataItemHeader { vr } => vr,
      _ => unreachable!(),
    };

    let (big_endian, _) = self.active_encoding();

    let bytes = self.stream.read(8).map_err(|e| {
      map_byte_stream_error(
        e,
        "Reading encapsulated pixel data item",
        &self.stream,
        &self.location,
      )
    })?;

    let tag = read_tag(&bytes, big_endian);
    let length = read_u32(&bytes[4..8], big_endian);

    if tag == dictionary::ITEM.tag && length != UNDEFINED_LENGTH {
      let index = self
        .location
        .add_fragments_item()
        .map_err(|details| self.data_invalid(details))?;

      self.next_action = NextAction::ReadDataElementValueBytes {
        vr,
        bytes_remaining: length,
        in_fragments: true,
      };

      return Ok(vec![P10Part::SequenceItemStart {
        index,
        length,
        big_endian,
        bytes,
      }]);
    }

    if tag == dictionary::SEQUENCE_DELIMITATION_ITEM.tag && length == 0 {
      self
        .location
        .end_sequence()
        .map_err(|details| self.data_invalid(details))?;

      self.next_action = NextAction::ReadDataElementHeader;

      return Ok(vec![P10Part::SequenceDelimiter { big_endian, bytes }]);
    }

    Err(P10Error::DataInvalid {
      when: "Reading encapsulated pixel data item".to_string(),
      details: format!("Invalid data element '{}' in pixel data stream", tag),
      path: self.location.path(None),
      offset: self.stream.bytes_read(),
    })
  }

  /// Passes through the raw bytes that follow the File Meta Information of
  /// data using a deflated transfer syntax when transparent inflation is
  /// disabled.
  ///
  fn read_deflated_chunk_part(&mut self) -> Result<Vec<P10Part>, P10Error> {
    if self.stream.is_fully_consumed() {
      self.is_complete = true;

      return Ok(vec![P10Part::End]);
    }

    let data = self
      .stream
      .read_up_to(self.config.max_part_size as usize)
      .map_err(|e| {
        map_byte_stream_error(
          e,
          "Reading deflated data",
          &self.stream,
          &self.location,
        )
      })?;

    if data.is_empty() {
      return Err(P10Error::DataRequired {
        when: "Reading deflated data".to_string(),
      });
    }

    Ok(vec![P10Part::DeflatedChunk {
      data,
      big_endian: false,
    }])
  }

  /// Checks that the given tag is greater than the previous data element's
  /// tag in the current scope, when ordered data elements are required.
  ///
  fn check_data_element_ordering(
    &mut self,
    tag: DataElementTag,
  ) -> Result<(), P10Error> {
    if !self.config.require_ordered_data_elements {
      return Ok(());
    }

    self.location.check_ordering(tag).map_err(|_| {
      P10Error::DataInvalid {
        when: "Reading data element header".to_string(),
        details: format!(
          "Data element '{}' is not in ascending order",
          dictionary::tag_with_name(tag)
        ),
        path: self.location.path(Some(tag)),
        offset: self.stream.bytes_read(),
      }
    })
  }

  fn data_invalid(&self, details: String) -> P10Error {
    P10Error::DataInvalid {
      when: "Reading data element header".to_string(),
      details,
      path: self.location.path(None),
      offset: self.stream.bytes_read(),
    }
  }
}

impl Default for P10ReadContext {
  fn default() -> Self {
    Self::new(None)
  }
}

fn read_u16(data: &[u8], big_endian: bool) -> u16 {
  if big_endian {
    BigEndian::read_u16(data)
  } else {
    LittleEndian::read_u16(data)
  }
}

fn read_u32(data: &[u8], big_endian: bool) -> u32 {
  if big_endian {
    BigEndian::read_u32(data)
  } else {
    LittleEndian::read_u32(data)
  }
}

fn read_tag(data: &[u8], big_endian: bool) -> DataElementTag {
  DataElementTag::new(
    read_u16(&data[0..2], big_endian),
    read_u16(&data[2..4], big_endian),
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn is_plausible_header_test() {
    // (0008,0020) StudyDate, VR DA, in explicit VR little endian
    let header = [0x08, 0x00, 0x20, 0x00, b'D', b'A', 0x08, 0x00];

    assert!(P10ReadContext::is_plausible_header(&header, false, true));
    assert!(!P10ReadContext::is_plausible_header(&header, true, true));

    // The same header in big endian
    let header = [0x00, 0x08, 0x00, 0x20, b'D', b'A', 0x00, 0x08];

    assert!(P10ReadContext::is_plausible_header(&header, true, true));
    assert!(!P10ReadContext::is_plausible_header(&header, false, true));
  }

  #[test]
  fn empty_input_reads_to_end_test() {
    let mut context = P10ReadContext::new(None);
    context.write_bytes(vec![], true).unwrap();

    assert_eq!(context.read_parts(), Ok(vec![]));
    assert_eq!(context.read_parts(), Ok(vec![P10Part::End]));
    assert_eq!(context.read_parts(), Ok(vec![]));
  }
}

/// Takes an error from the byte stream and maps it through to a P10 error.
///
fn map_byte_stream_error(
  error: ByteStreamError,
  when: &str,
  stream: &ByteStream,
  location: &P10Location,
) -> P10Error {
  let offset = stream.bytes_read();

  match error {
    ByteStreamError::DataRequired => P10Error::DataRequired {
      when: when.to_string(),
    },

    ByteStreamError::DataEnd => P10Error::DataEndedUnexpectedly {
      when: when.to_string(),
      path: location.path(None),
      offset,
    },

    ByteStreamError::ZlibDataError => P10Error::DataInvalid {
      when: when.to_string(),
      details: "Zlib data is invalid".to_string(),
      path: location.path(None),
      offset,
    },

    ByteStreamError::WriteAfterCompletion => P10Error::WriteAfterCompletion,
  }
}
