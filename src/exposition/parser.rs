//! Prometheus text exposition parser
//!
//! Parses exposition text (format 0.0.4) into [`Metric`] samples.
//! `# HELP` and `# TYPE` metadata is attached to samples with exactly the
//! same name; other comment lines are ignored.

use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::ParseError;
use crate::relabel::{Metric, MetricType};

/// Parser result type
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse exposition text into samples, in input order
///
/// # Errors
///
/// Returns a `ParseError` naming the 1-based line number of the first
/// malformed sample line.
pub fn parse_exposition(text: &str) -> ParseResult<Vec<Metric>> {
    let mut metrics = Vec::new();
    let mut help: HashMap<String, String> = HashMap::new();
    let mut types: HashMap<String, MetricType> = HashMap::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(comment) = line.strip_prefix('#') {
            parse_comment(comment, &mut help, &mut types);
            continue;
        }

        metrics.push(parse_sample(line, index + 1)?);
    }

    for metric in &mut metrics {
        if let Some(metric_type) = types.get(&metric.name) {
            metric.metric_type = *metric_type;
        }
        if let Some(text) = help.get(&metric.name) {
            metric.help = Some(text.clone());
        }
    }

    tracing::debug!(samples = metrics.len(), "Parsed exposition text");

    Ok(metrics)
}

/// Record `# HELP` / `# TYPE` metadata; anything else is a plain comment
fn parse_comment(
    comment: &str,
    help: &mut HashMap<String, String>,
    types: &mut HashMap<String, MetricType>,
) {
    let mut parts = comment.trim_start().splitn(3, char::is_whitespace);
    let keyword = parts.next().unwrap_or("");
    let Some(name) = parts.next() else {
        return;
    };
    let rest = parts.next().unwrap_or("").trim();

    match keyword {
        "HELP" => {
            help.insert(name.to_string(), unescape_help(rest));
        }
        "TYPE" => match MetricType::parse(rest) {
            Some(metric_type) => {
                types.insert(name.to_string(), metric_type);
            }
            None => {
                tracing::warn!(metric = %name, metric_type = %rest, "Ignoring unknown metric type");
            }
        },
        _ => {}
    }
}

fn parse_sample(line: &str, line_no: usize) -> ParseResult<Metric> {
    let name_end = line
        .find(|c: char| c == '{' || c.is_whitespace())
        .unwrap_or(line.len());
    let name = &line[..name_end];
    let mut rest = &line[name_end..];

    let mut labels = HashMap::new();
    if rest.starts_with('{') {
        let mut chars = rest[1..].chars().peekable();
        labels = parse_labels(&mut chars, line_no)?;
        let consumed: usize = rest.len() - 1 - chars.map(char::len_utf8).sum::<usize>();
        rest = &rest[1 + consumed..];
    }

    let mut fields = rest.split_whitespace();
    let value_text = fields
        .next()
        .ok_or(ParseError::MissingValue { line: line_no })?;
    let value = parse_value(value_text).ok_or_else(|| ParseError::InvalidValue {
        line: line_no,
        value: value_text.to_string(),
    })?;

    let timestamp = match fields.next() {
        Some(ts) => Some(ts.parse::<i64>().map_err(|_| ParseError::InvalidTimestamp {
            line: line_no,
            value: ts.to_string(),
        })?),
        None => None,
    };

    if let Some(extra) = fields.next() {
        return Err(ParseError::TrailingContent {
            line: line_no,
            content: extra.to_string(),
        });
    }

    let mut metric = Metric::new(name, value);
    metric.labels = labels;
    metric.timestamp = timestamp;
    Ok(metric)
}

/// Parse `name="value",...}`; the opening brace is already consumed
fn parse_labels(
    chars: &mut Peekable<Chars<'_>>,
    line_no: usize,
) -> ParseResult<HashMap<String, String>> {
    let malformed = |reason: &str| ParseError::MalformedLabels {
        line: line_no,
        reason: reason.to_string(),
    };
    let mut labels = HashMap::new();

    loop {
        skip_whitespace(chars);
        match chars.peek() {
            Some('}') => {
                chars.next();
                return Ok(labels);
            }
            None => return Err(malformed("missing closing '}'")),
            _ => {}
        }

        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c.is_whitespace() {
                break;
            }
            name.push(c);
            chars.next();
        }
        if name.is_empty() {
            return Err(malformed("empty label name"));
        }

        skip_whitespace(chars);
        if chars.next() != Some('=') {
            return Err(malformed(&format!("expected '=' after label '{}'", name)));
        }
        skip_whitespace(chars);
        if chars.next() != Some('"') {
            return Err(malformed(&format!("expected '\"' for label '{}'", name)));
        }

        let mut value = String::new();
        loop {
            match chars.next() {
                Some('"') => break,
                Some('\\') => match chars.next() {
                    Some('n') => value.push('\n'),
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => return Err(malformed("unterminated label value")),
                },
                Some(c) => value.push(c),
                None => return Err(malformed("unterminated label value")),
            }
        }
        labels.insert(name, value);

        skip_whitespace(chars);
        match chars.next() {
            Some(',') => {}
            Some('}') => return Ok(labels),
            _ => return Err(malformed("expected ',' or '}' after label value")),
        }
    }
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

fn parse_value(text: &str) -> Option<f64> {
    match text {
        "NaN" => Some(f64::NAN),
        "+Inf" | "Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        _ => text.parse().ok(),
    }
}

fn unescape_help(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('\\') => result.push('\\'),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }
    result
}
