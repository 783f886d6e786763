//! End-to-end tests that build encoded DICOM P10 streams and drive them
//! through the full parse, validate, modify, and collect pipeline.

use dcmflow_core::{dictionary, uids, DataElementTag, TagPath};
use dcmflow_p10::{
  parse_bytes, parse_stream, P10Error, P10Part, P10Pipeline,
  P10CollectTransform, P10ModifyTransform, P10ReadConfig,
  P10ValidateTransform, TagModification, ValidationContext,
};

/// Serializes a data element with an explicit VR in the given byte order.
///
fn explicit_element(
  tag: DataElementTag,
  vr: &[u8; 2],
  value: &[u8],
  big_endian: bool,
) -> Vec<u8> {
  let mut bytes = vec![];

  let put_u16 = |bytes: &mut Vec<u8>, value: u16| {
    if big_endian {
      bytes.extend_from_slice(&value.to_be_bytes());
    } else {
      bytes.extend_from_slice(&value.to_le_bytes());
    }
  };

  put_u16(&mut bytes, tag.group);
  put_u16(&mut bytes, tag.element);
  bytes.extend_from_slice(vr);

  match vr {
    b"OB" | b"OD" | b"OF" | b"OL" | b"OV" | b"OW" | b"SQ" | b"SV" | b"UC"
    | b"UN" | b"UR" | b"UT" | b"UV" => {
      bytes.extend_from_slice(&[0, 0]);
      if big_endian {
        bytes.extend_from_slice(&(value.len() as u32).to_be_bytes());
      } else {
        bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
      }
    }

    _ => put_u16(&mut bytes, value.len() as u16),
  }

  bytes.extend_from_slice(value);

  bytes
}

/// Serializes a data element with an implicit VR in little endian.
///
fn implicit_element(tag: DataElementTag, value: &[u8]) -> Vec<u8> {
  let mut bytes = vec![];

  bytes.extend_from_slice(&tag.group.to_le_bytes());
  bytes.extend_from_slice(&tag.element.to_le_bytes());
  bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
  bytes.extend_from_slice(value);

  bytes
}

/// Serializes an explicit VR little endian sequence header with the given
/// raw length value.
///
fn sequence_header(tag: DataElementTag, length: u32) -> Vec<u8> {
  let mut bytes = vec![];

  bytes.extend_from_slice(&tag.group.to_le_bytes());
  bytes.extend_from_slice(&tag.element.to_le_bytes());
  bytes.extend_from_slice(b"SQ");
  bytes.extend_from_slice(&[0, 0]);
  bytes.extend_from_slice(&length.to_le_bytes());

  bytes
}

/// Serializes an item header with the given raw length value.
///
fn item_header(length: u32) -> Vec<u8> {
  let mut bytes = vec![0xFE, 0xFF, 0x00, 0xE0];
  bytes.extend_from_slice(&length.to_le_bytes());

  bytes
}

fn item_delimitation() -> Vec<u8> {
  vec![0xFE, 0xFF, 0x0D, 0xE0, 0, 0, 0, 0]
}

fn sequence_delimitation() -> Vec<u8> {
  vec![0xFE, 0xFF, 0xDD, 0xE0, 0, 0, 0, 0]
}

/// Pads a UID string with a NUL to an even length, as stored on the wire.
///
fn padded_uid(uid: &str) -> Vec<u8> {
  let mut value = uid.as_bytes().to_vec();
  if value.len() % 2 == 1 {
    value.push(0);
  }

  value
}

/// Builds a File Preamble, "DICM" prefix, and File Meta Information group
/// declaring the given SOP class and transfer syntax.
///
fn file_header(sop_class_uid: &str, transfer_syntax_uid: &str) -> Vec<u8> {
  let fmi_elements = [
    explicit_element(
      dictionary::MEDIA_STORAGE_SOP_CLASS_UID.tag,
      b"UI",
      &padded_uid(sop_class_uid),
      false,
    ),
    explicit_element(
      dictionary::TRANSFER_SYNTAX_UID.tag,
      b"UI",
      &padded_uid(transfer_syntax_uid),
      false,
    ),
  ]
  .concat();

  let mut bytes = vec![0u8; 128];
  bytes.extend_from_slice(b"DICM");
  bytes.extend_from_slice(&explicit_element(
    dictionary::FILE_META_INFORMATION_GROUP_LENGTH.tag,
    b"UL",
    &(fmi_elements.len() as u32).to_le_bytes(),
    false,
  ));
  bytes.extend_from_slice(&fmi_elements);

  bytes
}

/// Concatenates the on-the-wire bytes of the given parts.
///
fn concat_bytes(parts: &[P10Part]) -> Vec<u8> {
  parts.iter().flat_map(|part| part.bytes().to_vec()).collect()
}

fn parse_pipeline(
  bytes: &[u8],
  mut pipeline: P10Pipeline,
) -> Result<Vec<P10Part>, P10Error> {
  parse_stream(&mut std::io::Cursor::new(bytes.to_vec()), &mut pipeline)
}

#[test]
fn round_trip_identity_test() {
  let input = [
    file_header(
      uids::CT_IMAGE_STORAGE,
      "1.2.840.10008.1.2.1",
    ),
    explicit_element(
      dictionary::SPECIFIC_CHARACTER_SET.tag,
      b"CS",
      b"ISO_IR 192",
      false,
    ),
    explicit_element(dictionary::STUDY_DATE.tag, b"DA", b"20240102", false),
    explicit_element(
      dictionary::PATIENT_NAME.tag,
      b"PN",
      b"John^Doe",
      false,
    ),
    explicit_element(
      dictionary::PIXEL_DATA.tag,
      b"OB",
      &[0u8; 64],
      false,
    ),
  ]
  .concat();

  let parts = parse_bytes(input.clone(), None).unwrap();

  assert_eq!(concat_bytes(&parts), input);
  assert_eq!(parts.last(), Some(&P10Part::End));

  // The same input written one byte at a time produces the same parts
  let mut pipeline = P10Pipeline::new(None);
  let mut byte_at_a_time = vec![];
  let mut seen_end = false;
  let byte_count = input.len();

  for (i, byte) in input.iter().enumerate() {
    pipeline.write_bytes(vec![*byte], i + 1 == byte_count).unwrap();

    while !seen_end {
      match pipeline.read_parts() {
        Ok(next_parts) => {
          seen_end = next_parts.last() == Some(&P10Part::End);
          byte_at_a_time.extend(next_parts);
        }
        Err(P10Error::DataRequired { .. }) => break,
        Err(e) => panic!("Unexpected error: {}", e),
      }
    }
  }

  assert_eq!(byte_at_a_time, parts);
}

#[test]
fn monotone_root_tags_test() {
  let input = [
    explicit_element(dictionary::STUDY_DATE.tag, b"DA", b"20240102", false),
    explicit_element(dictionary::MODALITY.tag, b"CS", b"CT", false),
    explicit_element(dictionary::PATIENT_NAME.tag, b"PN", b"Jane", false),
  ]
  .concat();

  let parts = parse_bytes(input, None).unwrap();

  let root_tags: Vec<DataElementTag> = parts
    .iter()
    .filter_map(|part| match part {
      P10Part::DataElementHeader { tag, .. } => Some(*tag),
      _ => None,
    })
    .collect();

  for window in root_tags.windows(2) {
    assert!(window[0].to_int() < window[1].to_int());
  }
}

#[test]
fn out_of_order_tags_are_rejected_test() {
  let input = [
    explicit_element(dictionary::PATIENT_NAME.tag, b"PN", b"Jane", false),
    explicit_element(dictionary::STUDY_DATE.tag, b"DA", b"20240102", false),
  ]
  .concat();

  assert!(matches!(
    parse_bytes(input.clone(), None),
    Err(P10Error::DataInvalid { .. })
  ));

  // The strict ordering check can be disabled
  let config = P10ReadConfig::default().require_ordered_data_elements(false);
  assert!(parse_bytes(input, Some(config)).is_ok());
}

#[test]
fn implicit_vr_uses_dictionary_test() {
  let input = [
    implicit_element(dictionary::STUDY_DATE.tag, b"20240102"),
    implicit_element(dictionary::PATIENT_NAME.tag, b"John^Doe"),
  ]
  .concat();

  let config = P10ReadConfig::default().assume_explicit_vr(false);
  let parts = parse_bytes(input.clone(), Some(config)).unwrap();

  assert!(matches!(
    parts[0],
    P10Part::DataElementHeader {
      tag,
      vr: dcmflow_core::ValueRepresentation::Date,
      length: 8,
      explicit_vr: false,
      ..
    } if tag == dictionary::STUDY_DATE.tag
  ));

  assert_eq!(concat_bytes(&parts), input);
}

#[test]
fn big_endian_without_preamble_is_detected_test() {
  // Explicit VR big endian data parsed with the default little endian
  // assumption: the first header is implausible in little endian, so the
  // byte order is corrected
  let input = [
    explicit_element(dictionary::STUDY_DATE.tag, b"DA", b"20240102", true),
    explicit_element(dictionary::PATIENT_NAME.tag, b"PN", b"Jane", true),
  ]
  .concat();

  let parts = parse_bytes(input.clone(), None).unwrap();

  assert!(matches!(
    parts[0],
    P10Part::DataElementHeader {
      tag,
      big_endian: true,
      ..
    } if tag == dictionary::STUDY_DATE.tag
  ));

  assert_eq!(concat_bytes(&parts), input);
}

#[test]
fn big_endian_transfer_syntax_test() {
  let input = [
    file_header(uids::CT_IMAGE_STORAGE, "1.2.840.10008.1.2.2"),
    explicit_element(dictionary::STUDY_DATE.tag, b"DA", b"20240102", true),
  ]
  .concat();

  let parts = parse_bytes(input.clone(), None).unwrap();

  assert!(parts.iter().any(|part| matches!(
    part,
    P10Part::DataElementHeader {
      tag,
      big_endian: true,
      is_fmi: false,
      ..
    } if *tag == dictionary::STUDY_DATE.tag
  )));

  assert_eq!(concat_bytes(&parts), input);
}

#[test]
fn sequences_with_defined_and_undefined_lengths_test() {
  let undefined = 0xFFFF_FFFFu32;

  // An undefined-length sequence holding one undefined-length item, and a
  // defined-length sequence holding one defined-length item
  let inner_element =
    explicit_element(dictionary::STUDY_DATE.tag, b"DA", b"20240102", false);

  let undefined_form = [
    sequence_header(dictionary::REFERENCED_IMAGE_SEQUENCE.tag, undefined),
    item_header(undefined),
    inner_element.clone(),
    item_delimitation(),
    sequence_delimitation(),
  ]
  .concat();

  let defined_item =
    [item_header(inner_element.len() as u32), inner_element].concat();

  let defined_form = [
    sequence_header(
      dictionary::SOURCE_IMAGE_SEQUENCE.tag,
      defined_item.len() as u32,
    ),
    defined_item,
  ]
  .concat();

  let input = [undefined_form, defined_form].concat();

  let parts = parse_bytes(input.clone(), None).unwrap();

  assert_eq!(concat_bytes(&parts), input);

  // Both length forms produce the same shape of parts: sequence start, item
  // start, element, item delimiter, sequence delimiter
  let shape: Vec<&'static str> = parts
    .iter()
    .map(|part| match part {
      P10Part::SequenceStart { .. } => "sequence",
      P10Part::SequenceItemStart { .. } => "item",
      P10Part::DataElementHeader { .. } => "header",
      P10Part::DataElementValueBytes { .. } => "value",
      P10Part::SequenceItemDelimiter { .. } => "item-end",
      P10Part::SequenceDelimiter { .. } => "sequence-end",
      P10Part::End => "end",
      _ => "other",
    })
    .collect();

  assert_eq!(
    shape,
    vec![
      "sequence", "item", "header", "value", "item-end", "sequence-end",
      "sequence", "item", "header", "value", "item-end", "sequence-end",
      "end",
    ]
  );
}

#[test]
fn encapsulated_pixel_data_test() {
  let undefined = 0xFFFF_FFFFu32;

  let mut input = vec![];

  // Pixel data header: OB with undefined length
  input.extend_from_slice(&0x7FE0u16.to_le_bytes());
  input.extend_from_slice(&0x0010u16.to_le_bytes());
  input.extend_from_slice(b"OB");
  input.extend_from_slice(&[0, 0]);
  input.extend_from_slice(&undefined.to_le_bytes());

  // Basic offset table item, empty
  input.extend_from_slice(&[0xFE, 0xFF, 0x00, 0xE0, 0, 0, 0, 0]);

  // One fragment of 6 bytes
  input.extend_from_slice(&[0xFE, 0xFF, 0x00, 0xE0]);
  input.extend_from_slice(&6u32.to_le_bytes());
  input.extend_from_slice(&[1, 2, 3, 4, 5, 6]);

  // Sequence delimitation
  input.extend_from_slice(&[0xFE, 0xFF, 0xDD, 0xE0, 0, 0, 0, 0]);

  let parts = parse_bytes(input.clone(), None).unwrap();

  assert_eq!(concat_bytes(&parts), input);

  assert!(matches!(parts[0], P10Part::FragmentsStart { tag, .. }
    if tag == dictionary::PIXEL_DATA.tag));
  assert!(
    matches!(parts[1], P10Part::SequenceItemStart { index: 1, length: 0, .. })
  );
  assert!(
    matches!(parts[3], P10Part::SequenceItemStart { index: 2, length: 6, .. })
  );
  assert!(matches!(
    &parts[4],
    P10Part::DataElementValueBytes { data, bytes_remaining: 0, .. }
      if data == &vec![1, 2, 3, 4, 5, 6]
  ));
  assert!(matches!(parts[5], P10Part::SequenceDelimiter { .. }));
}

#[test]
fn truncated_value_errors_test() {
  let mut input =
    explicit_element(dictionary::PATIENT_NAME.tag, b"PN", b"John^Doe", false);
  input.truncate(input.len() - 3);

  assert!(matches!(
    parse_bytes(input, None),
    Err(P10Error::DataEndedUnexpectedly { .. })
  ));
}

#[test]
fn modify_through_pipeline_test() {
  let input = [
    file_header(uids::CT_IMAGE_STORAGE, "1.2.840.10008.1.2.1"),
    explicit_element(dictionary::STUDY_DATE.tag, b"DA", b"20240102", false),
    explicit_element(
      dictionary::PATIENT_NAME.tag,
      b"PN",
      b"John^Doe",
      false,
    ),
  ]
  .concat();

  let modify = P10ModifyTransform::new(vec![
    TagModification::equals(
      TagPath::from_tag(dictionary::PATIENT_NAME.tag),
      Box::new(|_| b"Mike".to_vec()),
    ),
    TagModification::insert(
      TagPath::from_tag(dictionary::PATIENT_ID.tag),
      Box::new(|_| b"pat1".to_vec()),
    ),
  ]);

  let parts =
    parse_pipeline(&input, P10Pipeline::new(None).modify(modify)).unwrap();

  let output = concat_bytes(&parts);

  let expected = [
    file_header(uids::CT_IMAGE_STORAGE, "1.2.840.10008.1.2.1"),
    explicit_element(dictionary::STUDY_DATE.tag, b"DA", b"20240102", false),
    explicit_element(dictionary::PATIENT_NAME.tag, b"PN", b"Mike", false),
    explicit_element(dictionary::PATIENT_ID.tag, b"LO", b"pat1", false),
  ]
  .concat();

  assert_eq!(output, expected);
}

#[test]
fn modify_preserves_unrelated_parts_test() {
  let input = [
    explicit_element(dictionary::STUDY_DATE.tag, b"DA", b"20240102", false),
    explicit_element(dictionary::MODALITY.tag, b"CS", b"CT", false),
    explicit_element(
      dictionary::PATIENT_NAME.tag,
      b"PN",
      b"John^Doe",
      false,
    ),
  ]
  .concat();

  let modify = P10ModifyTransform::new(vec![TagModification::equals(
    TagPath::from_tag(dictionary::MODALITY.tag),
    Box::new(|_| b"MR".to_vec()),
  )]);

  let parts =
    parse_pipeline(&input, P10Pipeline::new(None).modify(modify)).unwrap();

  let output = concat_bytes(&parts);

  assert_eq!(
    output,
    [
      explicit_element(dictionary::STUDY_DATE.tag, b"DA", b"20240102", false),
      explicit_element(dictionary::MODALITY.tag, b"CS", b"MR", false),
      explicit_element(
        dictionary::PATIENT_NAME.tag,
        b"PN",
        b"John^Doe",
        false
      ),
    ]
    .concat()
  );
}

#[test]
fn validate_with_matching_context_test() {
  let input = [
    file_header(uids::CT_IMAGE_STORAGE, "1.2.840.10008.1.2.1"),
    explicit_element(dictionary::STUDY_DATE.tag, b"DA", b"20240102", false),
  ]
  .concat();

  let validate = P10ValidateTransform::new(
    Some(vec![ValidationContext::new(
      uids::CT_IMAGE_STORAGE,
      "1.2.840.10008.1.2.1",
    )]),
    false,
  );

  let parts =
    parse_pipeline(&input, P10Pipeline::new(None).validate(validate))
      .unwrap();

  assert_eq!(concat_bytes(&parts), input);
}

#[test]
fn validate_with_non_matching_context_test() {
  let input = [
    file_header(uids::CT_IMAGE_STORAGE, "1.2.840.10008.1.2.1"),
    explicit_element(dictionary::STUDY_DATE.tag, b"DA", b"20240102", false),
  ]
  .concat();

  // The allowed context requires explicit VR big endian
  let contexts = Some(vec![ValidationContext::new(
    uids::CT_IMAGE_STORAGE,
    "1.2.840.10008.1.2.2",
  )]);

  // Fail-fast: the error surfaces as soon as the lookahead is complete
  let mut validate = P10ValidateTransform::new(contexts.clone(), false);
  assert!(matches!(
    validate.add_bytes(&input, true),
    Err(P10Error::ValidationFailed { .. })
  ));

  // Draining: incoming bytes are consumed silently and the error surfaces
  // only once the stream completes
  let mut validate = P10ValidateTransform::new(contexts, true);
  assert_eq!(validate.add_bytes(&input, false), Ok(vec![]));
  assert_eq!(validate.add_bytes(&[1, 2, 3], false), Ok(vec![]));
  assert!(matches!(
    validate.add_bytes(&[], true),
    Err(P10Error::ValidationFailed { .. })
  ));
}

#[test]
fn validate_without_contexts_test() {
  // A valid preamble passes
  let mut validate = P10ValidateTransform::new(None, false);
  let input = file_header(uids::CT_IMAGE_STORAGE, "1.2.840.10008.1.2.1");
  assert_eq!(validate.add_bytes(&input, true), Ok(vec![input]));

  // A bare data set with a plausible first header passes
  let mut validate = P10ValidateTransform::new(None, false);
  let input =
    explicit_element(dictionary::STUDY_DATE.tag, b"DA", b"20240102", false);
  assert_eq!(validate.add_bytes(&input, true), Ok(vec![input]));

  // Arbitrary bytes fail
  let mut validate = P10ValidateTransform::new(None, false);
  assert!(matches!(
    validate.add_bytes(&[0x55; 200], true),
    Err(P10Error::ValidationFailed { .. })
  ));
}

#[test]
fn validate_without_preamble_pairs_explicit_vr_little_endian_test() {
  let input = [
    explicit_element(
      dictionary::INSTANCE_CREATOR_UID.tag,
      b"UI",
      &padded_uid("1.2.3.4"),
      false,
    ),
    explicit_element(
      dictionary::SOP_CLASS_UID.tag,
      b"UI",
      &padded_uid(uids::CT_IMAGE_STORAGE),
      false,
    ),
    explicit_element(dictionary::STUDY_DATE.tag, b"DA", b"20240102", false),
  ]
  .concat();

  let mut validate = P10ValidateTransform::new(
    Some(vec![ValidationContext::new(
      uids::CT_IMAGE_STORAGE,
      "1.2.840.10008.1.2.1",
    )]),
    false,
  );

  assert_eq!(validate.add_bytes(&input, true), Ok(vec![input]));

  // The same stream is rejected when only implicit VR is allowed
  let input = explicit_element(
    dictionary::INSTANCE_CREATOR_UID.tag,
    b"UI",
    &padded_uid("1.2.3.4"),
    false,
  );

  let mut validate = P10ValidateTransform::new(
    Some(vec![ValidationContext::new(
      uids::CT_IMAGE_STORAGE,
      "1.2.840.10008.1.2",
    )]),
    false,
  );

  assert!(matches!(
    validate.add_bytes(&input, true),
    Err(P10Error::ValidationFailed { .. })
  ));
}

#[test]
fn collect_through_pipeline_test() {
  let input = [
    explicit_element(dictionary::STUDY_DATE.tag, b"DA", b"20240102", false),
    explicit_element(
      dictionary::PATIENT_NAME.tag,
      b"PN",
      b"John^Doe",
      false,
    ),
    explicit_element(dictionary::PIXEL_DATA.tag, b"OB", &[0u8; 8], false),
  ]
  .concat();

  let collect = P10CollectTransform::from_tags(
    vec![TagPath::from_tag(dictionary::PATIENT_NAME.tag)],
    "routing",
  );

  let parts =
    parse_pipeline(&input, P10Pipeline::new(None).collect(collect)).unwrap();

  match &parts[0] {
    P10Part::CollectedElements {
      label, elements, ..
    } => {
      assert_eq!(label, "routing");
      assert_eq!(elements.len(), 1);
      assert_eq!(elements[0].tag, dictionary::PATIENT_NAME.tag);
      assert_eq!(elements[0].bytes, b"John^Doe".to_vec());
    }

    part => panic!("Unexpected part: {}", part),
  }

  // The buffered parts follow unchanged, so the byte stream is intact
  assert_eq!(concat_bytes(&parts), input);
}

#[test]
fn deflated_transfer_syntax_test() {
  use std::io::Write;

  let dataset = [
    explicit_element(dictionary::STUDY_DATE.tag, b"DA", b"20240102", false),
    explicit_element(dictionary::PATIENT_NAME.tag, b"PN", b"Jane", false),
  ]
  .concat();

  let mut encoder = flate2::write::DeflateEncoder::new(
    Vec::new(),
    flate2::Compression::default(),
  );
  encoder.write_all(&dataset).unwrap();
  let deflated = encoder.finish().unwrap();

  let input = [
    file_header(uids::CT_IMAGE_STORAGE, "1.2.840.10008.1.2.1.99"),
    deflated.clone(),
  ]
  .concat();

  // Transparent inflation continues the part stream as normal
  let parts = parse_bytes(input.clone(), None).unwrap();

  assert!(parts.iter().any(|part| matches!(
    part,
    P10Part::DataElementHeader { tag, is_fmi: false, .. }
      if *tag == dictionary::PATIENT_NAME.tag
  )));

  // With inflation disabled the raw deflated bytes pass through as chunks
  let config = P10ReadConfig::default().inflate_deflated(false);
  let parts = parse_bytes(input, Some(config)).unwrap();

  let deflated_bytes: Vec<u8> = parts
    .iter()
    .filter_map(|part| match part {
      P10Part::DeflatedChunk { data, .. } => Some(data.clone()),
      _ => None,
    })
    .flatten()
    .collect();

  assert_eq!(deflated_bytes, deflated);
}

#[test]
fn parse_file_test() {
  use std::io::Write;

  let input = [
    file_header(uids::CT_IMAGE_STORAGE, "1.2.840.10008.1.2.1"),
    explicit_element(dictionary::PATIENT_NAME.tag, b"PN", b"Jane", false),
  ]
  .concat();

  let temp_dir = tempfile::TempDir::new().unwrap();
  let path = temp_dir.path().join("test.dcm");

  let mut file = std::fs::File::create(&path).unwrap();
  file.write_all(&input).unwrap();
  drop(file);

  assert!(dcmflow_p10::is_valid_file(&path));

  let parts = dcmflow_p10::parse_file(&path).unwrap();
  assert_eq!(concat_bytes(&parts), input);
}
