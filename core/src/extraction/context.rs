use crate::error::Result;
use crate::extraction::instance::InstanceRecord;
use crate::types::{AttributeValue, MatchContext, Series, Study};
use log::{debug, info, warn};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Default)]
struct SeriesAccumulator {
    description: Option<String>,
    modality: Option<String>,
    series_number: Option<i32>,
    frames: i64,
    instances: usize,
}

#[derive(Default)]
struct StudyAccumulator {
    study_date: Option<String>,
    description: Option<String>,
    patient_id: Option<String>,
    series: BTreeMap<String, SeriesAccumulator>,
}

impl StudyAccumulator {
    fn add(&mut self, record: &InstanceRecord) {
        fill(&mut self.study_date, &record.study_date);
        fill(&mut self.description, &record.study_description);
        fill(&mut self.patient_id, &record.patient_id);

        let series = self
            .series
            .entry(record.series_instance_uid.clone())
            .or_default();
        fill(&mut series.description, &record.series_description);
        fill(&mut series.modality, &record.modality);
        if series.series_number.is_none() {
            series.series_number = record.series_number;
        }
        series.frames += i64::from(record.number_of_frames);
        series.instances += 1;
    }

    fn into_study(self, uid: String) -> Study {
        let modalities: BTreeSet<String> = self
            .series
            .values()
            .filter_map(|s| s.modality.clone())
            .collect();

        let mut series: Vec<(String, SeriesAccumulator)> = self.series.into_iter().collect();
        // Unnumbered series sort after numbered ones
        series.sort_by(|(a_uid, a), (b_uid, b)| {
            match (a.series_number, b.series_number) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
            .then_with(|| a_uid.cmp(b_uid))
        });

        let mut study = Study::new(uid.clone()).with_attribute("StudyInstanceUID", uid);
        if let Some(date) = self.study_date {
            study = study.with_attribute("StudyDate", date);
        }
        if let Some(description) = self.description {
            study = study.with_attribute("StudyDescription", description);
        }
        if let Some(patient_id) = self.patient_id {
            study = study.with_attribute("PatientID", patient_id);
        }
        study = study.with_attribute(
            "ModalitiesInStudy",
            modalities.into_iter().collect::<Vec<_>>(),
        );

        for (series_uid, acc) in series {
            study = study.with_series(acc.into_series(series_uid));
        }
        study
    }
}

impl SeriesAccumulator {
    fn into_series(self, uid: String) -> Series {
        let mut series = Series::new(uid.clone())
            .with_attribute("SeriesInstanceUID", uid)
            .with_attribute("numImageFrames", self.frames)
            .with_attribute("numInstances", self.instances);
        if let Some(description) = self.description {
            series = series.with_attribute("SeriesDescription", description);
        }
        if let Some(modality) = self.modality {
            series = series.with_attribute("Modality", modality);
        }
        if let Some(number) = self.series_number {
            series = series.with_attribute("SeriesNumber", AttributeValue::from(number));
        }
        series
    }
}

fn fill(slot: &mut Option<String>, value: &Option<String>) {
    if slot.is_none() {
        slot.clone_from(value);
    }
}

/// Groups instances into a match context
///
/// Studies are ordered most recent StudyDate first, so index 0 is the
/// current study and later indices are priors. Undated studies come last.
/// Ties fall back to StudyInstanceUID. Series are ordered by SeriesNumber,
/// then SeriesInstanceUID.
pub fn build_context(records: &[InstanceRecord]) -> MatchContext {
    let mut studies: BTreeMap<String, StudyAccumulator> = BTreeMap::new();
    for record in records {
        studies
            .entry(record.study_instance_uid.clone())
            .or_default()
            .add(record);
    }

    let mut studies: Vec<(String, StudyAccumulator)> = studies.into_iter().collect();
    studies.sort_by(|(a_uid, a), (b_uid, b)| {
        match (&a.study_date, &b.study_date) {
            (Some(x), Some(y)) => y.cmp(x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| a_uid.cmp(b_uid))
    });

    let context = MatchContext::new(
        studies
            .into_iter()
            .map(|(uid, acc)| acc.into_study(uid))
            .collect(),
    );
    debug!(
        "Built context with {} studies and {} series from {} instances",
        context.studies.len(),
        context.series_count(),
        records.len()
    );
    context
}

/// Reads each file and groups the readable ones into a context
///
/// Files that fail to parse are skipped with a warning.
pub fn context_from_files(paths: Vec<PathBuf>) -> MatchContext {
    let mut records = Vec::with_capacity(paths.len());
    for path in paths {
        match InstanceRecord::from_file(path.clone()) {
            Ok(record) => {
                debug!("Read instance: {}", path.display());
                records.push(record);
            }
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }
    build_context(&records)
}

/// Builds a context from the DICOM files directly inside `directory`
///
/// # Errors
///
/// Returns an error if the directory cannot be listed
pub fn context_from_directory(directory: &Path) -> Result<MatchContext> {
    let files = collect_dicom_files(directory)?;
    info!(
        "Found {} DICOM files in {}",
        files.len(),
        directory.display()
    );
    Ok(context_from_files(files))
}

/// Lists `.dcm`/`.dicom` files, plus extensionless files with a DICOM header
pub fn collect_dicom_files(directory: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        match path.extension() {
            Some(ext) => {
                if ext.eq_ignore_ascii_case("dcm") || ext.eq_ignore_ascii_case("dicom") {
                    files.push(path);
                }
            }
            None => {
                if is_dicom_file(&path) {
                    debug!("Found extensionless DICOM file: {}", path.display());
                    files.push(path);
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Checks for the "DICM" magic after the 128-byte preamble
fn is_dicom_file(path: &Path) -> bool {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };

    let mut buffer = [0u8; 132];
    match file.read_exact(&mut buffer) {
        Ok(()) => &buffer[128..132] == b"DICM",
        Err(_) => false,
    }
}
