use crate::error::{HangingProtocolError, Result};
use crate::extraction::tags::{
    get_int_value, get_string_value, has_pixel_data, MODALITY, NUMBER_OF_FRAMES, PATIENT_ID,
    SERIES_DESCRIPTION, SERIES_INSTANCE_UID, SERIES_NUMBER, SOP_INSTANCE_UID, STUDY_DATE,
    STUDY_DESCRIPTION, STUDY_INSTANCE_UID,
};
use dicom_object::{open_file, InMemDicomObject};
use std::path::PathBuf;

/// Matching-relevant header fields of one DICOM instance
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceRecord {
    /// Path to the DICOM file, when read from disk
    pub file_path: Option<PathBuf>,

    pub study_instance_uid: String,
    pub series_instance_uid: String,
    pub sop_instance_uid: Option<String>,

    /// StudyDate as YYYYMMDD
    pub study_date: Option<String>,
    pub study_description: Option<String>,
    pub patient_id: Option<String>,

    pub series_description: Option<String>,
    pub modality: Option<String>,
    pub series_number: Option<i32>,

    /// Image frames in this instance: 1 for single-frame images, 0 when
    /// there is no PixelData (SR, KO, PR)
    pub number_of_frames: i32,
}

impl InstanceRecord {
    /// Creates a record from a DICOM file path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or lacks study/series UIDs
    pub fn from_file(path: PathBuf) -> Result<Self> {
        let dcm = open_file(&path)?;
        let mut record = Self::from_dicom(&dcm)?;
        record.file_path = Some(path);
        Ok(record)
    }

    /// Creates a record from an already-opened DICOM object
    ///
    /// # Errors
    ///
    /// Returns an error if StudyInstanceUID or SeriesInstanceUID is absent
    pub fn from_dicom(dcm: &InMemDicomObject) -> Result<Self> {
        let study_instance_uid = get_string_value(dcm, STUDY_INSTANCE_UID)
            .ok_or_else(|| HangingProtocolError::DicomError("missing StudyInstanceUID".into()))?;
        let series_instance_uid = get_string_value(dcm, SERIES_INSTANCE_UID)
            .ok_or_else(|| HangingProtocolError::DicomError("missing SeriesInstanceUID".into()))?;

        Ok(Self {
            file_path: None,
            study_instance_uid,
            series_instance_uid,
            sop_instance_uid: get_string_value(dcm, SOP_INSTANCE_UID),
            study_date: get_string_value(dcm, STUDY_DATE),
            study_description: get_string_value(dcm, STUDY_DESCRIPTION),
            patient_id: get_string_value(dcm, PATIENT_ID),
            series_description: get_string_value(dcm, SERIES_DESCRIPTION),
            modality: get_string_value(dcm, MODALITY),
            series_number: get_int_value(dcm, SERIES_NUMBER),
            number_of_frames: if has_pixel_data(dcm) {
                get_int_value(dcm, NUMBER_OF_FRAMES).unwrap_or(1).max(1)
            } else {
                0
            },
        })
    }
}
