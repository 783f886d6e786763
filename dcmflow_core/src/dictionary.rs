//! The dictionary of registered data elements and their standard VRs.

use crate::{DataElementTag, ValueRepresentation};

/// A single entry in the data element dictionary.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Item {
  pub tag: DataElementTag,
  pub name: &'static str,
  pub vr: ValueRepresentation,
}

macro_rules! dictionary_item {
  ($name:ident, $group:literal, $element:literal, $display:literal, $vr:ident) => {
    pub const $name: Item = Item {
      tag: DataElementTag::new($group, $element),
      name: $display,
      vr: ValueRepresentation::$vr,
    };
  };
}

dictionary_item!(FILE_META_INFORMATION_GROUP_LENGTH, 0x0002, 0x0000, "File Meta Information Group Length", UnsignedLong);
dictionary_item!(FILE_META_INFORMATION_VERSION, 0x0002, 0x0001, "File Meta Information Version", OtherByteString);
dictionary_item!(MEDIA_STORAGE_SOP_CLASS_UID, 0x0002, 0x0002, "Media Storage SOP Class UID", UniqueIdentifier);
dictionary_item!(MEDIA_STORAGE_SOP_INSTANCE_UID, 0x0002, 0x0003, "Media Storage SOP Instance UID", UniqueIdentifier);
dictionary_item!(TRANSFER_SYNTAX_UID, 0x0002, 0x0010, "Transfer Syntax UID", UniqueIdentifier);
dictionary_item!(IMPLEMENTATION_CLASS_UID, 0x0002, 0x0012, "Implementation Class UID", UniqueIdentifier);
dictionary_item!(IMPLEMENTATION_VERSION_NAME, 0x0002, 0x0013, "Implementation Version Name", ShortString);
dictionary_item!(SOURCE_APPLICATION_ENTITY_TITLE, 0x0002, 0x0016, "Source Application Entity Title", ApplicationEntity);

dictionary_item!(SPECIFIC_CHARACTER_SET, 0x0008, 0x0005, "Specific Character Set", CodeString);
dictionary_item!(IMAGE_TYPE, 0x0008, 0x0008, "Image Type", CodeString);
dictionary_item!(INSTANCE_CREATOR_UID, 0x0008, 0x0014, "Instance Creator UID", UniqueIdentifier);
dictionary_item!(SOP_CLASS_UID, 0x0008, 0x0016, "SOP Class UID", UniqueIdentifier);
dictionary_item!(SOP_INSTANCE_UID, 0x0008, 0x0018, "SOP Instance UID", UniqueIdentifier);
dictionary_item!(STUDY_DATE, 0x0008, 0x0020, "Study Date", Date);
dictionary_item!(SERIES_DATE, 0x0008, 0x0021, "Series Date", Date);
dictionary_item!(ACQUISITION_DATE, 0x0008, 0x0022, "Acquisition Date", Date);
dictionary_item!(CONTENT_DATE, 0x0008, 0x0023, "Content Date", Date);
dictionary_item!(STUDY_TIME, 0x0008, 0x0030, "Study Time", Time);
dictionary_item!(SERIES_TIME, 0x0008, 0x0031, "Series Time", Time);
dictionary_item!(ACQUISITION_TIME, 0x0008, 0x0032, "Acquisition Time", Time);
dictionary_item!(CONTENT_TIME, 0x0008, 0x0033, "Content Time", Time);
dictionary_item!(ACCESSION_NUMBER, 0x0008, 0x0050, "Accession Number", ShortString);
dictionary_item!(MODALITY, 0x0008, 0x0060, "Modality", CodeString);
dictionary_item!(CONVERSION_TYPE, 0x0008, 0x0064, "Conversion Type", CodeString);
dictionary_item!(MANUFACTURER, 0x0008, 0x0070, "Manufacturer", LongString);
dictionary_item!(INSTITUTION_NAME, 0x0008, 0x0080, "Institution Name", LongString);
dictionary_item!(REFERRING_PHYSICIAN_NAME, 0x0008, 0x0090, "Referring Physician's Name", PersonName);
dictionary_item!(STUDY_DESCRIPTION, 0x0008, 0x1030, "Study Description", LongString);
dictionary_item!(SERIES_DESCRIPTION, 0x0008, 0x103E, "Series Description", LongString);
dictionary_item!(MANUFACTURER_MODEL_NAME, 0x0008, 0x1090, "Manufacturer's Model Name", LongString);
dictionary_item!(REFERENCED_IMAGE_SEQUENCE, 0x0008, 0x1140, "Referenced Image Sequence", Sequence);
dictionary_item!(SOURCE_IMAGE_SEQUENCE, 0x0008, 0x2112, "Source Image Sequence", Sequence);
dictionary_item!(DERIVATION_CODE_SEQUENCE, 0x0008, 0x9215, "Derivation Code Sequence", Sequence);

dictionary_item!(PATIENT_NAME, 0x0010, 0x0010, "Patient's Name", PersonName);
dictionary_item!(PATIENT_ID, 0x0010, 0x0020, "Patient ID", LongString);
dictionary_item!(PATIENT_BIRTH_DATE, 0x0010, 0x0030, "Patient's Birth Date", Date);
dictionary_item!(PATIENT_SEX, 0x0010, 0x0040, "Patient's Sex", CodeString);
dictionary_item!(PATIENT_AGE, 0x0010, 0x1010, "Patient's Age", AgeString);
dictionary_item!(PATIENT_SIZE, 0x0010, 0x1020, "Patient's Size", DecimalString);
dictionary_item!(PATIENT_WEIGHT, 0x0010, 0x1030, "Patient's Weight", DecimalString);
dictionary_item!(PATIENT_COMMENTS, 0x0010, 0x4000, "Patient Comments", LongText);

dictionary_item!(BODY_PART_EXAMINED, 0x0018, 0x0015, "Body Part Examined", CodeString);
dictionary_item!(SLICE_THICKNESS, 0x0018, 0x0050, "Slice Thickness", DecimalString);
dictionary_item!(KVP, 0x0018, 0x0060, "KVP", DecimalString);
dictionary_item!(SOFTWARE_VERSIONS, 0x0018, 0x1020, "Software Versions", LongString);
dictionary_item!(PROTOCOL_NAME, 0x0018, 0x1030, "Protocol Name", LongString);
dictionary_item!(PATIENT_POSITION, 0x0018, 0x5100, "Patient Position", CodeString);
dictionary_item!(SEQUENCE_OF_ULTRASOUND_REGIONS, 0x0018, 0x6011, "Sequence of Ultrasound Regions", Sequence);

dictionary_item!(STUDY_INSTANCE_UID, 0x0020, 0x000D, "Study Instance UID", UniqueIdentifier);
dictionary_item!(SERIES_INSTANCE_UID, 0x0020, 0x000E, "Series Instance UID", UniqueIdentifier);
dictionary_item!(STUDY_ID, 0x0020, 0x0010, "Study ID", ShortString);
dictionary_item!(SERIES_NUMBER, 0x0020, 0x0011, "Series Number", IntegerString);
dictionary_item!(INSTANCE_NUMBER, 0x0020, 0x0013, "Instance Number", IntegerString);
dictionary_item!(IMAGE_POSITION_PATIENT, 0x0020, 0x0032, "Image Position (Patient)", DecimalString);
dictionary_item!(IMAGE_ORIENTATION_PATIENT, 0x0020, 0x0037, "Image Orientation (Patient)", DecimalString);
dictionary_item!(FRAME_OF_REFERENCE_UID, 0x0020, 0x0052, "Frame of Reference UID", UniqueIdentifier);
dictionary_item!(SLICE_LOCATION, 0x0020, 0x1041, "Slice Location", DecimalString);
dictionary_item!(IMAGE_COMMENTS, 0x0020, 0x4000, "Image Comments", LongText);

dictionary_item!(SAMPLES_PER_PIXEL, 0x0028, 0x0002, "Samples per Pixel", UnsignedShort);
dictionary_item!(PHOTOMETRIC_INTERPRETATION, 0x0028, 0x0004, "Photometric Interpretation", CodeString);
dictionary_item!(NUMBER_OF_FRAMES, 0x0028, 0x0008, "Number of Frames", IntegerString);
dictionary_item!(ROWS, 0x0028, 0x0010, "Rows", UnsignedShort);
dictionary_item!(COLUMNS, 0x0028, 0x0011, "Columns", UnsignedShort);
dictionary_item!(PIXEL_SPACING, 0x0028, 0x0030, "Pixel Spacing", DecimalString);
dictionary_item!(BITS_ALLOCATED, 0x0028, 0x0100, "Bits Allocated", UnsignedShort);
dictionary_item!(BITS_STORED, 0x0028, 0x0101, "Bits Stored", UnsignedShort);
dictionary_item!(HIGH_BIT, 0x0028, 0x0102, "High Bit", UnsignedShort);
dictionary_item!(PIXEL_REPRESENTATION, 0x0028, 0x0103, "Pixel Representation", UnsignedShort);
dictionary_item!(WINDOW_CENTER, 0x0028, 0x1050, "Window Center", DecimalString);
dictionary_item!(WINDOW_WIDTH, 0x0028, 0x1051, "Window Width", DecimalString);
dictionary_item!(RESCALE_INTERCEPT, 0x0028, 0x1052, "Rescale Intercept", DecimalString);
dictionary_item!(RESCALE_SLOPE, 0x0028, 0x1053, "Rescale Slope", DecimalString);
dictionary_item!(LOSSY_IMAGE_COMPRESSION, 0x0028, 0x2110, "Lossy Image Compression", CodeString);

dictionary_item!(PERFORMED_PROCEDURE_STEP_START_DATE, 0x0040, 0x0244, "Performed Procedure Step Start Date", Date);
dictionary_item!(PERFORMED_PROCEDURE_STEP_DESCRIPTION, 0x0040, 0x0254, "Performed Procedure Step Description", LongString);
dictionary_item!(CONTENT_SEQUENCE, 0x0040, 0xA730, "Content Sequence", Sequence);

dictionary_item!(FLOAT_PIXEL_DATA, 0x7FE0, 0x0008, "Float Pixel Data", OtherFloatString);
dictionary_item!(DOUBLE_FLOAT_PIXEL_DATA, 0x7FE0, 0x0009, "Double Float Pixel Data", OtherDoubleString);
dictionary_item!(PIXEL_DATA, 0x7FE0, 0x0010, "Pixel Data", OtherWordString);

dictionary_item!(DATA_SET_TRAILING_PADDING, 0xFFFC, 0xFFFC, "Data Set Trailing Padding", OtherByteString);

dictionary_item!(ITEM, 0xFFFE, 0xE000, "Item", Unknown);
dictionary_item!(ITEM_DELIMITATION_ITEM, 0xFFFE, 0xE00D, "Item Delimitation Item", Unknown);
dictionary_item!(SEQUENCE_DELIMITATION_ITEM, 0xFFFE, 0xE0DD, "Sequence Delimitation Item", Unknown);

/// All dictionary entries, ordered by tag. The item and delimitation tags are
/// excluded because they are structural markers rather than data elements.
///
static DATA_ELEMENTS: &[Item] = &[
  FILE_META_INFORMATION_GROUP_LENGTH,
  FILE_META_INFORMATION_VERSION,
  MEDIA_STORAGE_SOP_CLASS_UID,
  MEDIA_STORAGE_SOP_INSTANCE_UID,
  TRANSFER_SYNTAX_UID,
  IMPLEMENTATION_CLASS_UID,
  IMPLEMENTATION_VERSION_NAME,
  SOURCE_APPLICATION_ENTITY_TITLE,
  SPECIFIC_CHARACTER_SET,
  IMAGE_TYPE,
  INSTANCE_CREATOR_UID,
  SOP_CLASS_UID,
  SOP_INSTANCE_UID,
  STUDY_DATE,
  SERIES_DATE,
  ACQUISITION_DATE,
  CONTENT_DATE,
  STUDY_TIME,
  SERIES_TIME,
  ACQUISITION_TIME,
  CONTENT_TIME,
  ACCESSION_NUMBER,
  MODALITY,
  CONVERSION_TYPE,
  MANUFACTURER,
  INSTITUTION_NAME,
  REFERRING_PHYSICIAN_NAME,
  STUDY_DESCRIPTION,
  SERIES_DESCRIPTION,
  MANUFACTURER_MODEL_NAME,
  REFERENCED_IMAGE_SEQUENCE,
  SOURCE_IMAGE_SEQUENCE,
  DERIVATION_CODE_SEQUENCE,
  PATIENT_NAME,
  PATIENT_ID,
  PATIENT_BIRTH_DATE,
  PATIENT_SEX,
  PATIENT_AGE,
  PATIENT_SIZE,
  PATIENT_WEIGHT,
  PATIENT_COMMENTS,
  BODY_PART_EXAMINED,
  SLICE_THICKNESS,
  KVP,
  SOFTWARE_VERSIONS,
  PROTOCOL_NAME,
  PATIENT_POSITION,
  SEQUENCE_OF_ULTRASOUND_REGIONS,
  STUDY_INSTANCE_UID,
  SERIES_INSTANCE_UID,
  STUDY_ID,
  SERIES_NUMBER,
  INSTANCE_NUMBER,
  IMAGE_POSITION_PATIENT,
  IMAGE_ORIENTATION_PATIENT,
  FRAME_OF_REFERENCE_UID,
  SLICE_LOCATION,
  IMAGE_COMMENTS,
  SAMPLES_PER_PIXEL,
  PHOTOMETRIC_INTERPRETATION,
  NUMBER_OF_FRAMES,
  ROWS,
  COLUMNS,
  PIXEL_SPACING,
  BITS_ALLOCATED,
  BITS_STORED,
  HIGH_BIT,
  PIXEL_REPRESENTATION,
  WINDOW_CENTER,
  WINDOW_WIDTH,
  RESCALE_INTERCEPT,
  RESCALE_SLOPE,
  LOSSY_IMAGE_COMPRESSION,
  PERFORMED_PROCEDURE_STEP_START_DATE,
  PERFORMED_PROCEDURE_STEP_DESCRIPTION,
  CONTENT_SEQUENCE,
  FLOAT_PIXEL_DATA,
  DOUBLE_FLOAT_PIXEL_DATA,
  PIXEL_DATA,
  DATA_SET_TRAILING_PADDING,
];

/// Looks up the dictionary entry for the given data element tag.
///
pub fn find(tag: DataElementTag) -> Option<&'static Item> {
  DATA_ELEMENTS
    .binary_search_by_key(&tag.to_int(), |item| item.tag.to_int())
    .ok()
    .map(|index| &DATA_ELEMENTS[index])
}

/// Returns the display name for the given data element tag. Unrecognized
/// private tags and group lengths are named generically.
///
pub fn tag_name(tag: DataElementTag) -> &'static str {
  match find(tag) {
    Some(item) => item.name,
    None if tag.is_group_length() => "Group Length",
    None if tag.is_private_creator() => "Private Creator",
    None => "Unknown Tag",
  }
}

/// Formats the given data element tag along with its display name, e.g.
/// `"(0010,0010) Patient's Name"`.
///
pub fn tag_with_name(tag: DataElementTag) -> String {
  format!("{} {}", tag, tag_name(tag))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn find_test() {
    assert_eq!(
      find(DataElementTag::new(0x0010, 0x0010)),
      Some(&PATIENT_NAME)
    );
    assert_eq!(find(DataElementTag::new(0x0011, 0x0010)), None);
  }

  #[test]
  fn table_is_sorted_test() {
    for window in DATA_ELEMENTS.windows(2) {
      assert!(window[0].tag < window[1].tag);
    }
  }

  #[test]
  fn tag_with_name_test() {
    assert_eq!(
      tag_with_name(DataElementTag::new(0x7FE0, 0x0010)),
      "(7FE0,0010) Pixel Data"
    );
    assert_eq!(
      tag_with_name(DataElementTag::new(0x0009, 0x0000)),
      "(0009,0000) Group Length"
    );
  }
}
