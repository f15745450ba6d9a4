use nom::bytes::complete::take_until;
use nom::character::complete::char;
use nom::sequence::delimited;

use crate::common::error::ProfileError;
use crate::common::parser::NomResult;
use crate::submit::jobscript::{JobProperties, value_to_text};
use crate::submit::options::OptionMap;

#[derive(Debug, Eq, PartialEq)]
pub enum StringPart<'a> {
    Verbatim(&'a str),
    Placeholder(&'a str),
}

fn parse_placeholder(data: &str) -> NomResult<&str> {
    delimited(char('{'), take_until("}"), char('}'))(data)
}

/// Parses strings containing `{name}` placeholders. Literal braces are written as `{{` and `}}`.
///
/// # Example
/// ```rust
/// use slurm_profile::submit::placeholders::{parse_format_string, StringPart};
///
/// assert_eq!(parse_format_string("logs/{rule}.{{out}}").unwrap(), vec![
///     StringPart::Verbatim("logs/"),
///     StringPart::Placeholder("rule"),
///     StringPart::Verbatim(".{"),
///     StringPart::Verbatim("out}"),
/// ]);
/// ```
pub fn parse_format_string(data: &str) -> Result<Vec<StringPart<'_>>, String> {
    let mut parts = vec![];
    let mut start = 0;
    let mut input = data;

    while start < input.len() {
        let rest = &input[start..];
        if rest.starts_with("{{") || rest.starts_with("}}") {
            parts.push(StringPart::Verbatim(&input[..start + 1]));
            input = &rest[2..];
            start = 0;
        } else if let Ok((remaining, placeholder)) = parse_placeholder(rest) {
            if start > 0 {
                parts.push(StringPart::Verbatim(&input[..start]));
            }
            parts.push(StringPart::Placeholder(placeholder.trim()));
            input = remaining;
            start = 0;
        } else if rest.starts_with(['{', '}']) {
            return Err(format!("single `{}` in `{data}`", &rest[..1]));
        } else {
            start += rest.chars().next().map_or(1, char::len_utf8);
        }
    }

    if start > 0 {
        parts.push(StringPart::Verbatim(&input[..start]));
    }

    Ok(parts)
}

fn resolve(name: &str, job: &JobProperties) -> Option<String> {
    match name.split_once('.') {
        None => match name {
            "rule" => job.rule.clone(),
            "jobid" => job.jobid.as_ref().map(value_to_text),
            _ => None,
        },
        Some(("wildcards", key)) => job.wildcards.get(key).map(value_to_text),
        Some(("params", key)) => job.params.get(key).map(value_to_text),
        Some(_) => None,
    }
}

/// Replaces placeholders in `value` with the rule name, job id, wildcards or params of `job`.
pub fn format_value(value: &str, job: &JobProperties) -> Result<String, String> {
    let mut buffer = String::with_capacity(value.len());
    for part in parse_format_string(value)? {
        match part {
            StringPart::Verbatim(text) => buffer.push_str(text),
            StringPart::Placeholder(name) => {
                let resolved = resolve(name, job).ok_or_else(|| {
                    format!(
                        "the name `{name}` is unknown in this context, \
                         braces not used for placeholders have to be doubled"
                    )
                })?;
                buffer.push_str(&resolved);
            }
        }
    }
    Ok(buffer)
}

pub fn format_options(options: &OptionMap, job: &JobProperties) -> crate::Result<OptionMap> {
    options
        .iter()
        .map(|(key, value)| {
            let value = value
                .as_deref()
                .map(|value| format_value(value, job))
                .transpose()
                .map_err(|reason| ProfileError::Format {
                    job: job.name().to_string(),
                    key: key.clone(),
                    reason,
                })?;
            Ok((key.clone(), value))
        })
        .collect()
}
