//! Well-known DICOM unique identifiers.

/// The SOP Class UID for 'Computed Radiography Image Storage'.
///
pub const COMPUTED_RADIOGRAPHY_IMAGE_STORAGE: &str =
  "1.2.840.10008.5.1.4.1.1.1";

/// The SOP Class UID for 'CT Image Storage'.
///
pub const CT_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.2";

/// The SOP Class UID for 'Ultrasound Image Storage'.
///
pub const ULTRASOUND_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.6.1";

/// The SOP Class UID for 'Secondary Capture Image Storage'.
///
pub const SECONDARY_CAPTURE_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.7";

/// The SOP Class UID for 'MR Image Storage'.
///
pub const MR_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.4";

/// The SOP Class UID for 'Digital X-Ray Image Storage - For Presentation'.
///
pub const DIGITAL_X_RAY_IMAGE_STORAGE_FOR_PRESENTATION: &str =
  "1.2.840.10008.5.1.4.1.1.1.1";
