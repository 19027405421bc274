use super::AttributeValue;
use std::fmt;

/// A constraint applied to one attribute value
///
/// Protocol documents key constraints by operator name
/// (`{"containsI": "bitewing"}`, `{"greaterThan": {"value": 0}}`). Operators
/// the evaluator does not implement decode into [`Constraint::Unsupported`]
/// so that protocol validation can reject them with location context.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "json",
    serde(from = "document::ConstraintDocument", into = "document::ConstraintDocument")
)]
pub enum Constraint {
    Equals(AttributeValue),
    DoesNotEqual(AttributeValue),
    GreaterThan(f64),
    LessThan(f64),
    /// Inclusive numeric range
    Range { min: f64, max: f64 },
    Contains(String),
    DoesNotContain(String),
    ContainsInsensitive(String),
    DoesNotContainInsensitive(String),
    StartsWith(String),
    EndsWith(String),
    NotNull,
    /// Every inner constraint must pass
    All(Vec<Constraint>),
    /// Operator name not known to the evaluator
    Unsupported { operator: String },
    /// Known operator with an unusable payload
    Malformed { operator: String, reason: String },
}

impl Constraint {
    /// Operator name as written in protocol documents
    pub fn operator(&self) -> &str {
        match self {
            Constraint::Equals(_) => "equals",
            Constraint::DoesNotEqual(_) => "doesNotEqual",
            Constraint::GreaterThan(_) => "greaterThan",
            Constraint::LessThan(_) => "lessThan",
            Constraint::Range { .. } => "range",
            Constraint::Contains(_) => "contains",
            Constraint::DoesNotContain(_) => "doesNotContain",
            Constraint::ContainsInsensitive(_) => "containsI",
            Constraint::DoesNotContainInsensitive(_) => "doesNotContainI",
            Constraint::StartsWith(_) => "startsWith",
            Constraint::EndsWith(_) => "endsWith",
            Constraint::NotNull => "notNull",
            Constraint::All(_) => "all",
            Constraint::Unsupported { operator } | Constraint::Malformed { operator, .. } => {
                operator
            }
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Equals(v) | Constraint::DoesNotEqual(v) => {
                write!(f, "{} {}", self.operator(), v)
            }
            Constraint::GreaterThan(n) | Constraint::LessThan(n) => {
                write!(f, "{} {}", self.operator(), n)
            }
            Constraint::Range { min, max } => write!(f, "range [{}, {}]", min, max),
            Constraint::Contains(s)
            | Constraint::DoesNotContain(s)
            | Constraint::ContainsInsensitive(s)
            | Constraint::DoesNotContainInsensitive(s)
            | Constraint::StartsWith(s)
            | Constraint::EndsWith(s) => write!(f, "{} '{}'", self.operator(), s),
            Constraint::NotNull => write!(f, "notNull"),
            Constraint::All(inner) => {
                let parts: Vec<String> = inner.iter().map(|c| c.to_string()).collect();
                write!(f, "{}", parts.join(" and "))
            }
            Constraint::Unsupported { operator } => write!(f, "unsupported '{}'", operator),
            Constraint::Malformed { operator, reason } => {
                write!(f, "malformed '{}': {}", operator, reason)
            }
        }
    }
}

/// Where a rule reads its target value from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "lowercase"))]
pub enum RuleSource {
    /// Attributes of the candidate study/series
    #[default]
    Context,
    /// Caller-supplied options (e.g. `studyInstanceUIDsIndex`)
    Options,
}

/// A weighted, possibly required, constraint on one attribute
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "camelCase"))]
pub struct Rule {
    pub attribute: String,

    #[cfg_attr(feature = "json", serde(rename = "from", alias = "source", default))]
    pub source: RuleSource,

    /// Failing a required rule excludes the candidate
    #[cfg_attr(feature = "json", serde(default))]
    pub required: bool,

    /// Score contributed when the rule passes
    #[cfg_attr(feature = "json", serde(default = "default_weight"))]
    pub weight: f64,

    pub constraint: Constraint,
}

fn default_weight() -> f64 {
    1.0
}

impl Rule {
    /// Creates an optional context rule with weight 1
    pub fn new(attribute: impl Into<String>, constraint: Constraint) -> Self {
        Self {
            attribute: attribute.into(),
            source: RuleSource::Context,
            required: false,
            weight: default_weight(),
            constraint,
        }
    }

    /// Builder: mark the rule as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Builder: set the weight
    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Builder: read the value from the options map
    pub fn from_options(mut self) -> Self {
        self.source = RuleSource::Options;
        self
    }
}

/// Study and series rules naming the candidates for one logical slot
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "camelCase"))]
pub struct DisplaySetSelector {
    #[cfg_attr(feature = "json", serde(default))]
    pub study_matching_rules: Vec<Rule>,

    #[cfg_attr(feature = "json", serde(default))]
    pub series_matching_rules: Vec<Rule>,
}

impl DisplaySetSelector {
    /// Creates a selector with no rules (matches everything with score 0)
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a study rule
    pub fn with_study_rule(mut self, rule: Rule) -> Self {
        self.study_matching_rules.push(rule);
        self
    }

    /// Builder: add a series rule
    pub fn with_series_rule(mut self, rule: Rule) -> Self {
        self.series_matching_rules.push(rule);
        self
    }
}

#[cfg(feature = "json")]
mod document {
    use super::{AttributeValue, Constraint};
    use serde_json::{Map, Value};

    /// Operator-keyed constraint object as written in protocol documents
    #[derive(serde::Serialize, serde::Deserialize)]
    #[serde(transparent)]
    pub struct ConstraintDocument(Map<String, Value>);

    impl From<ConstraintDocument> for Constraint {
        fn from(doc: ConstraintDocument) -> Self {
            let mut constraints: Vec<Constraint> = doc
                .0
                .iter()
                .map(|(operator, payload)| decode(operator, payload))
                .collect();

            match constraints.len() {
                0 => Constraint::Malformed {
                    operator: String::new(),
                    reason: "constraint names no operator".to_string(),
                },
                1 => constraints.remove(0),
                _ => Constraint::All(constraints),
            }
        }
    }

    impl From<Constraint> for ConstraintDocument {
        fn from(constraint: Constraint) -> Self {
            let mut map = Map::new();
            encode(&constraint, &mut map);
            ConstraintDocument(map)
        }
    }

    /// Payloads may be bare (`"bitewing"`) or wrapped (`{"value": 0}`)
    fn unwrap_payload(payload: &Value) -> &Value {
        match payload {
            Value::Object(map) => map.get("value").unwrap_or(payload),
            other => other,
        }
    }

    fn malformed(operator: &str, reason: &str) -> Constraint {
        Constraint::Malformed {
            operator: operator.to_string(),
            reason: reason.to_string(),
        }
    }

    fn decode(operator: &str, payload: &Value) -> Constraint {
        let value = unwrap_payload(payload);

        let number = || value.as_f64().ok_or("expected a number");
        let text = || value.as_str().map(str::to_string).ok_or("expected a string");
        let attribute = || {
            serde_json::from_value::<AttributeValue>(value.clone())
                .map_err(|_| "expected a scalar or list value")
        };

        let decoded = match operator {
            "equals" => attribute().map(Constraint::Equals),
            "doesNotEqual" => attribute().map(Constraint::DoesNotEqual),
            "greaterThan" => number().map(Constraint::GreaterThan),
            "lessThan" => number().map(Constraint::LessThan),
            "range" => decode_range(value),
            "contains" => text().map(Constraint::Contains),
            "doesNotContain" => text().map(Constraint::DoesNotContain),
            "containsI" => text().map(Constraint::ContainsInsensitive),
            "doesNotContainI" => text().map(Constraint::DoesNotContainInsensitive),
            "startsWith" => text().map(Constraint::StartsWith),
            "endsWith" => text().map(Constraint::EndsWith),
            "notNull" => Ok(Constraint::NotNull),
            _ => {
                return Constraint::Unsupported {
                    operator: operator.to_string(),
                }
            }
        };

        decoded.unwrap_or_else(|reason| malformed(operator, reason))
    }

    fn decode_range(value: &Value) -> Result<Constraint, &'static str> {
        let bounds = value.as_array().ok_or("expected [min, max]")?;
        match bounds.as_slice() {
            [min, max] => {
                let min = min.as_f64().ok_or("range bounds must be numbers")?;
                let max = max.as_f64().ok_or("range bounds must be numbers")?;
                if min > max {
                    Err("range minimum exceeds maximum")
                } else {
                    Ok(Constraint::Range { min, max })
                }
            }
            _ => Err("expected [min, max]"),
        }
    }

    fn wrap(value: Value) -> Value {
        let mut map = Map::new();
        map.insert("value".to_string(), value);
        Value::Object(map)
    }

    fn number(n: f64) -> Value {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }

    fn encode(constraint: &Constraint, map: &mut Map<String, Value>) {
        let operator = constraint.operator().to_string();
        let payload = match constraint {
            Constraint::Equals(v) | Constraint::DoesNotEqual(v) => {
                wrap(serde_json::to_value(v).unwrap_or(Value::Null))
            }
            Constraint::GreaterThan(n) | Constraint::LessThan(n) => wrap(number(*n)),
            Constraint::Range { min, max } => wrap(Value::Array(vec![number(*min), number(*max)])),
            Constraint::Contains(s)
            | Constraint::DoesNotContain(s)
            | Constraint::ContainsInsensitive(s)
            | Constraint::DoesNotContainInsensitive(s)
            | Constraint::StartsWith(s)
            | Constraint::EndsWith(s) => Value::String(s.clone()),
            Constraint::NotNull => Value::Bool(true),
            Constraint::All(inner) => {
                for c in inner {
                    encode(c, map);
                }
                return;
            }
            Constraint::Unsupported { .. } | Constraint::Malformed { .. } => Value::Null,
        };
        map.insert(operator, payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_builder_defaults() {
        let rule = Rule::new("numImageFrames", Constraint::GreaterThan(0.0));
        assert_eq!(rule.source, RuleSource::Context);
        assert!(!rule.required);
        assert_eq!(rule.weight, 1.0);

        let rule = rule.required().weight(10.0).from_options();
        assert!(rule.required);
        assert_eq!(rule.weight, 10.0);
        assert_eq!(rule.source, RuleSource::Options);
    }

    #[test]
    fn test_constraint_display() {
        assert_eq!(
            Constraint::ContainsInsensitive("bitewing".to_string()).to_string(),
            "containsI 'bitewing'"
        );
        assert_eq!(Constraint::GreaterThan(0.0).to_string(), "greaterThan 0");
        assert_eq!(
            Constraint::All(vec![Constraint::NotNull, Constraint::LessThan(5.0)]).to_string(),
            "notNull and lessThan 5"
        );
    }

    #[cfg(feature = "json")]
    mod json {
        use super::super::*;

        fn parse(json: &str) -> Constraint {
            serde_json::from_str(json).unwrap()
        }

        #[test]
        fn test_decode_wrapped_and_bare_payloads() {
            assert_eq!(
                parse(r#"{"equals": {"value": 0}}"#),
                Constraint::Equals(AttributeValue::Number(0.0))
            );
            assert_eq!(
                parse(r#"{"containsI": "bitewing"}"#),
                Constraint::ContainsInsensitive("bitewing".to_string())
            );
            assert_eq!(parse(r#"{"greaterThan": {"value": 0}}"#), Constraint::GreaterThan(0.0));
        }

        #[test]
        fn test_decode_range() {
            assert_eq!(
                parse(r#"{"range": {"value": [1, 4]}}"#),
                Constraint::Range { min: 1.0, max: 4.0 }
            );
            assert!(matches!(
                parse(r#"{"range": [4, 1]}"#),
                Constraint::Malformed { .. }
            ));
        }

        #[test]
        fn test_decode_unknown_operator() {
            assert_eq!(
                parse(r#"{"looksLike": "molar"}"#),
                Constraint::Unsupported {
                    operator: "looksLike".to_string()
                }
            );
        }

        #[test]
        fn test_decode_malformed_payload() {
            let constraint = parse(r#"{"greaterThan": "many"}"#);
            assert!(matches!(constraint, Constraint::Malformed { ref operator, .. } if operator == "greaterThan"));
        }

        #[test]
        fn test_decode_multiple_operators_is_conjunction() {
            match parse(r#"{"greaterThan": 1, "lessThan": 5}"#) {
                Constraint::All(inner) => {
                    assert_eq!(inner.len(), 2);
                    assert!(inner.contains(&Constraint::GreaterThan(1.0)));
                    assert!(inner.contains(&Constraint::LessThan(5.0)));
                }
                other => panic!("expected conjunction, got {:?}", other),
            }
        }

        #[test]
        fn test_rule_document_fields() {
            let rule: Rule = serde_json::from_str(
                r#"{
                    "attribute": "studyInstanceUIDsIndex",
                    "from": "options",
                    "required": true,
                    "constraint": { "equals": { "value": 1 } }
                }"#,
            )
            .unwrap();

            assert_eq!(rule.source, RuleSource::Options);
            assert!(rule.required);
            assert_eq!(rule.weight, 1.0);
            assert_eq!(rule.constraint, Constraint::Equals(AttributeValue::Number(1.0)));
        }

        #[test]
        fn test_rule_serializes_back_to_document_shape() {
            let rule = Rule::new("SeriesDescription", Constraint::ContainsInsensitive("bitewing".into()))
                .weight(10.0);
            let value = serde_json::to_value(&rule).unwrap();

            assert_eq!(value["from"], "context");
            assert_eq!(value["weight"], 10.0);
            assert_eq!(value["constraint"]["containsI"], "bitewing");
        }
    }
}
