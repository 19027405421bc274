use super::{AttributeValue, Attributes};

/// Option key bound to a study's position in the context during study matching
pub const STUDY_INDEX_OPTION: &str = "studyInstanceUIDsIndex";

/// A series (display set candidate) inside a study
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "camelCase"))]
pub struct Series {
    /// Series identifier (SeriesInstanceUID or display set id)
    pub id: String,

    /// Series attributes (SeriesDescription, Modality, numImageFrames, ...)
    #[cfg_attr(feature = "json", serde(default))]
    pub attributes: Attributes,
}

impl Series {
    /// Creates a series with no attributes
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Attributes::new(),
        }
    }

    /// Builder: set an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// A study with its ordered series
///
/// The study's index in [`MatchContext::studies`] is its role: 0 is the
/// current study, 1 the first prior, and so on.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "camelCase"))]
pub struct Study {
    /// Study identifier (StudyInstanceUID)
    pub id: String,

    /// Study attributes
    #[cfg_attr(feature = "json", serde(default))]
    pub attributes: Attributes,

    /// Series in display order
    #[cfg_attr(feature = "json", serde(default))]
    pub series: Vec<Series>,
}

impl Study {
    /// Creates a study with no attributes and no series
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Attributes::new(),
            series: Vec::new(),
        }
    }

    /// Builder: set an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder: append a series
    pub fn with_series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }
}

/// Immutable snapshot of the studies available to one resolution pass
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "camelCase"))]
pub struct MatchContext {
    #[cfg_attr(feature = "json", serde(default))]
    pub studies: Vec<Study>,
}

impl MatchContext {
    /// Creates a context from studies in priority order
    pub fn new(studies: Vec<Study>) -> Self {
        Self { studies }
    }

    /// Returns whether the context holds no studies
    pub fn is_empty(&self) -> bool {
        self.studies.is_empty()
    }

    /// Looks up a series by study and series position
    pub fn series(&self, study_index: usize, series_index: usize) -> Option<&Series> {
        self.studies
            .get(study_index)
            .and_then(|study| study.series.get(series_index))
    }

    /// Total number of series across all studies
    pub fn series_count(&self) -> usize {
        self.studies.iter().map(|study| study.series.len()).sum()
    }

    /// Parses a context from a JSON document
    #[cfg(feature = "json")]
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Caller-supplied option bindings consumed by rules with `from: "options"`
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(transparent))]
pub struct MatchOptions {
    values: Attributes,
}

impl MatchOptions {
    /// Creates an empty option map
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: bind an option
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Binds an option
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Looks up an option
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.values.get(name)
    }

    /// Options as seen while matching the study at `index`
    pub fn for_study(&self, index: usize) -> Self {
        self.clone().with(STUDY_INDEX_OPTION, index)
    }
}
