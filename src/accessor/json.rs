use super::{FieldValue, PropertyAccessError, PropertyAccessor};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;

/// Structural lookup over JSON documents.
///
/// Path segments are separated by `.`; a segment may carry array indices
/// (`items[0]`) and a bare numeric segment indexes into an array
/// (`items.0`). When date detection is on, strings shaped like ISO dates
/// resolve to date values so they pick up the exporter's date style.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonAccessor {
    detect_dates: bool,
}

impl JsonAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_detection(mut self, detect_dates: bool) -> Self {
        self.detect_dates = detect_dates;
        self
    }

    fn to_field(&self, value: &JsonValue) -> FieldValue {
        match value {
            JsonValue::Null => FieldValue::Null,
            JsonValue::Bool(b) => FieldValue::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => n.as_f64().map_or_else(|| FieldValue::Text(n.to_string()), FieldValue::Float),
            },
            JsonValue::String(s) if self.detect_dates => parse_temporal(s).unwrap_or_else(|| FieldValue::Text(s.clone())),
            JsonValue::String(s) => FieldValue::Text(s.clone()),
            other => FieldValue::Text(other.to_string()),
        }
    }
}

fn parse_temporal(s: &str) -> Option<FieldValue> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(FieldValue::Date(d));
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(FieldValue::DateTime(dt.naive_local()));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(FieldValue::DateTime)
}

enum Step<'a> {
    Key(&'a str),
    Index(usize),
}

fn split_path(path: &str) -> Result<Vec<Step<'_>>, PropertyAccessError> {
    let malformed = |reason: &str| PropertyAccessError::Failed {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let mut steps = Vec::new();
    for segment in path.split('.') {
        let (name, mut rest) = match segment.find('[') {
            Some(pos) => segment.split_at(pos),
            None => (segment, ""),
        };
        if name.is_empty() && rest.is_empty() {
            return Err(malformed("empty path segment"));
        }
        if !name.is_empty() {
            steps.push(match name.parse::<usize>() {
                Ok(i) => Step::Index(i),
                Err(_) => Step::Key(name),
            });
        }
        while !rest.is_empty() {
            let close = rest.find(']').ok_or_else(|| malformed("unclosed '['"))?;
            let index = rest[1..close]
                .trim()
                .parse::<usize>()
                .map_err(|_| malformed("array index must be a non-negative integer"))?;
            steps.push(Step::Index(index));
            rest = &rest[close + 1..];
            if !rest.is_empty() && !rest.starts_with('[') {
                return Err(malformed("unexpected text after ']'"));
            }
        }
    }
    Ok(steps)
}

impl PropertyAccessor<JsonValue> for JsonAccessor {
    fn resolve(&self, row: &JsonValue, path: &str) -> Result<FieldValue, PropertyAccessError> {
        let mut current = row;
        for step in split_path(path)? {
            current = match (step, current) {
                (Step::Key(key), JsonValue::Object(map)) => map.get(key),
                (Step::Index(i), JsonValue::Array(items)) => items.get(i),
                (Step::Index(i), JsonValue::Object(map)) => map.get(&i.to_string()),
                (step, _) => {
                    let segment = match step {
                        Step::Key(key) => key.to_string(),
                        Step::Index(i) => i.to_string(),
                    };
                    return Err(PropertyAccessError::NotTraversable {
                        path: path.to_string(),
                        segment,
                    });
                }
            }
            .ok_or_else(|| PropertyAccessError::missing(path))?;
        }
        Ok(self.to_field(current))
    }
}
