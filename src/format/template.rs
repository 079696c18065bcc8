use super::{is_valid_pattern, render_pattern, ValueFormatter};
use crate::accessor::FieldValue;
use crate::utils::{CodecError, FieldRenderError, Result};

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Value,
    Date(String),
}

/// Message-style template with a single argument.
///
/// `{0}` is replaced by the value, `{0,date,PATTERN}` renders a date value
/// with a strftime pattern. Text between single quotes is literal and `''`
/// stands for one quote, so `'{0}'` prints the braces verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateFormatter {
    source: String,
    segments: Vec<Segment>,
}

impl TemplateFormatter {
    pub fn parse(template: &str) -> Result<Self> {
        let invalid = |reason: &str| CodecError::InvalidTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '\'' => {
                    if chars.peek() == Some(&'\'') {
                        chars.next();
                        literal.push('\'');
                        continue;
                    }
                    // quoted section runs to the next lone quote or end of template
                    while let Some(q) = chars.next() {
                        if q == '\'' {
                            if chars.peek() == Some(&'\'') {
                                chars.next();
                                literal.push('\'');
                            } else {
                                break;
                            }
                        } else {
                            literal.push(q);
                        }
                    }
                }
                '{' => {
                    let mut body = String::new();
                    let mut closed = false;
                    for b in chars.by_ref() {
                        if b == '}' {
                            closed = true;
                            break;
                        }
                        body.push(b);
                    }
                    if !closed {
                        return Err(invalid("unmatched '{'"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(parse_placeholder(&body).map_err(|reason| invalid(&reason))?);
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

fn parse_placeholder(body: &str) -> std::result::Result<Segment, String> {
    let mut parts = body.splitn(3, ',').map(str::trim);
    match parts.next() {
        Some("0") => {}
        Some(other) => return Err(format!("unsupported argument {:?}, only {{0}} is available", other)),
        None => return Err("empty placeholder".to_string()),
    }
    match (parts.next(), parts.next()) {
        (None, _) => Ok(Segment::Value),
        (Some("date"), Some(pattern)) if !pattern.is_empty() => {
            if is_valid_pattern(pattern) {
                Ok(Segment::Date(pattern.to_string()))
            } else {
                Err(format!("invalid date pattern {:?}", pattern))
            }
        }
        (Some("date"), _) => Err("date placeholder needs a pattern".to_string()),
        (Some(kind), _) => Err(format!("unsupported format type {:?}", kind)),
    }
}

impl ValueFormatter for TemplateFormatter {
    fn format(&self, value: &FieldValue) -> std::result::Result<String, FieldRenderError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Value => out.push_str(&value.to_string()),
                Segment::Date(pattern) => {
                    let rendered = match value {
                        FieldValue::Date(d) => render_pattern(d.format(pattern))?,
                        FieldValue::DateTime(dt) => render_pattern(dt.format(pattern))?,
                        other => {
                            return Err(FieldRenderError::Format(format!(
                                "cannot format {} as a date",
                                other.type_name()
                            )))
                        }
                    };
                    out.push_str(&rendered);
                }
            }
        }
        Ok(out)
    }
}
