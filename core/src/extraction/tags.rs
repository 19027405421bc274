use dicom_core::Tag;
use dicom_object::InMemDicomObject;

// Study/Series Identification Tags
pub use dicom_dictionary_std::tags::{
    SERIES_INSTANCE_UID, SERIES_NUMBER, SOP_INSTANCE_UID, STUDY_DATE, STUDY_INSTANCE_UID,
};

// Description Tags
pub use dicom_dictionary_std::tags::{SERIES_DESCRIPTION, STUDY_DESCRIPTION};

// Image Tags
pub use dicom_dictionary_std::tags::{MODALITY, NUMBER_OF_FRAMES, PIXEL_DATA};

// Patient Tags
pub use dicom_dictionary_std::tags::PATIENT_ID;

/// Helper to get string value from DICOM tag
///
/// Returns `None` if the tag is not present, cannot be converted to string,
/// or is blank after trimming
pub fn get_string_value(dcm: &InMemDicomObject, tag: Tag) -> Option<String> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Returns whether the instance carries pixel data
pub fn has_pixel_data(dcm: &InMemDicomObject) -> bool {
    dcm.element(PIXEL_DATA).is_ok()
}

/// Helper to get integer value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to i32
pub fn get_int_value(dcm: &InMemDicomObject, tag: Tag) -> Option<i32> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_int::<i32>().ok())
}
