use std::time::Duration;

use nom::Parser;
use nom::branch::alt;
use nom::character::complete::{alpha0, char, digit0, digit1, multispace0};
use nom::combinator::{map, opt};
use nom::sequence::{pair, preceded, tuple};
use nom_supreme::ParserExt;

use crate::common::error::ProfileError;
use crate::common::parser::{NomResult, consume_all, p_u64};

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;
const SECONDS_PER_WEEK: u64 = 7 * SECONDS_PER_DAY;

/// Fixed-point scale of fractional token amounts (nine decimal places).
const AMOUNT_SCALE: u128 = 1_000_000_000;
const AMOUNT_DIGITS: usize = 9;

/// Time written in one of the forms accepted by Slurm.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SlurmTime {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl SlurmTime {
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(
            self.days * SECONDS_PER_DAY
                + self.hours * SECONDS_PER_HOUR
                + self.minutes * SECONDS_PER_MINUTE
                + self.seconds,
        )
    }

    /// Whole minutes, a started minute counts as a full one.
    pub fn as_minutes(&self) -> u64 {
        self.days * 24 * 60 + self.hours * 60 + self.minutes + self.seconds.div_ceil(60)
    }
}

/// `days-hours[:minutes[:seconds]]`
fn p_time_with_days(input: &str) -> NomResult<SlurmTime> {
    map(
        tuple((
            p_u64,
            preceded(char('-'), p_u64),
            opt(preceded(char(':'), p_u64)),
            opt(preceded(char(':'), p_u64)),
        )),
        |(days, hours, minutes, seconds)| SlurmTime {
            days,
            hours,
            minutes: minutes.unwrap_or(0),
            seconds: seconds.unwrap_or(0),
        },
    )(input)
}

/// `minutes`, `minutes:seconds` or `hours:minutes:seconds`
fn p_time_without_days(input: &str) -> NomResult<SlurmTime> {
    map(
        tuple((
            p_u64,
            opt(pair(
                preceded(char(':'), p_u64),
                opt(preceded(char(':'), p_u64)),
            )),
        )),
        |parsed| match parsed {
            (minutes, None) => SlurmTime {
                minutes,
                ..Default::default()
            },
            (minutes, Some((seconds, None))) => SlurmTime {
                minutes,
                seconds,
                ..Default::default()
            },
            (hours, Some((minutes, Some(seconds)))) => SlurmTime {
                hours,
                minutes,
                seconds,
                ..Default::default()
            },
        },
    )(input)
}

fn p_slurm_time(input: &str) -> NomResult<SlurmTime> {
    alt((p_time_with_days, p_time_without_days))
        .context("Slurm time")
        .parse(input)
}

/// Parses a time written in Slurm's own notation, e.g. `1-12:00:00`, `10:00` or `20`.
pub fn parse_slurm_time(input: &str) -> anyhow::Result<SlurmTime> {
    consume_all(p_slurm_time, input.trim())
}

pub fn is_slurm_time(input: &str) -> bool {
    parse_slurm_time(input).is_ok()
}

/// Parses the time limit column of `sinfo`. Returns `None` for partitions without a limit.
pub fn parse_slurm_duration(input: &str) -> anyhow::Result<Option<Duration>> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("infinite") || input.eq_ignore_ascii_case("unlimited") {
        return Ok(None);
    }
    Ok(Some(parse_slurm_time(input)?.as_duration()))
}

/// Converts a Slurm time into minutes.
///
/// Returns `None` when the input is not written in any of the Slurm time forms.
pub fn time_to_minutes(input: &str) -> Option<u64> {
    parse_slurm_time(input).ok().map(|time| time.as_minutes())
}

/// `<integer>[.<fraction>]`
fn p_amount(input: &str) -> NomResult<(&str, Option<&str>)> {
    pair(digit1, opt(preceded(char('.'), digit0)))(input)
}

/// Amount of a time token scaled by [`AMOUNT_SCALE`], `None` if it does not fit.
fn scaled_amount(integer: &str, fraction: Option<&str>) -> Option<u128> {
    let integer = u128::from(integer.parse::<u64>().ok()?);
    let fraction = fraction.unwrap_or("");
    let fraction = &fraction[..fraction.len().min(AMOUNT_DIGITS)];
    let fraction = if fraction.is_empty() {
        0
    } else {
        fraction.parse::<u128>().ok()? * 10u128.pow((AMOUNT_DIGITS - fraction.len()) as u32)
    };
    Some(integer * AMOUNT_SCALE + fraction)
}

fn p_time_token(input: &str) -> NomResult<((&str, Option<&str>), &str)> {
    pair(p_amount, preceded(multispace0, alpha0))(input)
}

fn unit_seconds(unit: &str) -> Option<u64> {
    let seconds = match unit.to_ascii_lowercase().as_str() {
        "w" | "week" | "weeks" => SECONDS_PER_WEEK,
        "d" | "day" | "days" => SECONDS_PER_DAY,
        "h" | "hour" | "hours" => SECONDS_PER_HOUR,
        "m" | "min" | "mins" | "minute" | "minutes" => SECONDS_PER_MINUTE,
        "s" | "sec" | "secs" | "second" | "seconds" => 1,
        _ => return None,
    };
    Some(seconds)
}

fn format_hms(total_seconds: u64) -> String {
    let hours = total_seconds / SECONDS_PER_HOUR;
    let minutes = (total_seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let seconds = total_seconds % SECONDS_PER_MINUTE;
    format!("{hours}:{minutes:02}:{seconds:02}")
}

/// Normalizes a time request into a form understood by Slurm.
///
/// Inputs already written in Slurm notation are returned unchanged. Otherwise the input is
/// scanned for `<number><unit>` tokens (`1d 4h`, `1.5h`, `30m20s`, ...) which are summed up and
/// formatted as `H:MM:SS`. Numbers without a unit are ignored. Returns `None` if no token was
/// found.
pub fn parse_time(input: &str) -> crate::Result<Option<String>> {
    if is_slurm_time(input) {
        return Ok(Some(input.to_string()));
    }

    let mut total: u128 = 0;
    let mut found = false;
    let mut rest = input;
    while !rest.is_empty() {
        match p_time_token(rest) {
            Ok((remaining, ((integer, fraction), unit))) => {
                rest = remaining;
                if unit.is_empty() {
                    continue;
                }
                let seconds = unit_seconds(unit).ok_or_else(|| ProfileError::InvalidTimeUnit {
                    input: input.to_string(),
                    unit: unit.to_string(),
                })?;
                total = scaled_amount(integer, fraction)
                    .and_then(|amount| amount.checked_mul(u128::from(seconds)))
                    .and_then(|amount| total.checked_add(amount))
                    .ok_or_else(|| time_out_of_range(input))?;
                found = true;
            }
            Err(_) => {
                let mut chars = rest.chars();
                chars.next();
                rest = chars.as_str();
            }
        }
    }

    if !found {
        log::debug!("No time specification found in `{input}`");
        return Ok(None);
    }
    let seconds = u64::try_from(total.div_ceil(AMOUNT_SCALE))
        .map_err(|_| time_out_of_range(input))?;
    Ok(Some(format_hms(seconds)))
}

fn time_out_of_range(input: &str) -> ProfileError {
    ProfileError::InvalidOption {
        key: "time".to_string(),
        value: input.to_string(),
        reason: "time is out of range".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_slurm_duration, parse_slurm_time, parse_time, time_to_minutes};
    use crate::common::error::ProfileError;
    use std::time::Duration;

    fn parse(input: &str) -> String {
        parse_time(input).unwrap().unwrap()
    }

    #[test]
    fn test_slurm_forms_pass_through() {
        for input in ["0", "20", "100:00", "10:00:00", "10-00:00:10", "2-12", "1-00:30"] {
            assert_eq!(parse(input), input);
        }
    }

    #[test]
    fn test_time_to_minutes() {
        assert_eq!(time_to_minutes("foo"), None);
        assert_eq!(time_to_minutes("10-00:00:10"), Some(14401));
        assert_eq!(time_to_minutes("10:00:00"), Some(600));
        assert_eq!(time_to_minutes("100:00"), Some(100));
        assert_eq!(time_to_minutes("20"), Some(20));
        assert_eq!(time_to_minutes("2-12"), Some(3600));
        assert_eq!(time_to_minutes("1-00:30"), Some(1470));
    }

    #[test]
    fn test_time_to_minutes_invalid() {
        assert_eq!(time_to_minutes(""), None);
        assert_eq!(time_to_minutes("1:2:3:4"), None);
        assert_eq!(time_to_minutes("1d"), None);
    }

    #[test]
    fn test_units_any_order() {
        assert_eq!(parse("1d4s"), "24:00:04");
        assert_eq!(parse("4s1d"), "24:00:04");
        assert_eq!(parse("1w"), "168:00:00");
        assert_eq!(parse("2h 30m"), "2:30:00");
        assert_eq!(parse("1H30M"), "1:30:00");
    }

    #[test]
    fn test_long_unit_names() {
        assert_eq!(parse("2 hours 5 minutes"), "2:05:00");
        assert_eq!(parse("1 day"), "24:00:00");
    }

    #[test]
    fn test_fractional_units() {
        assert_eq!(parse("1.5d"), "36:00:00");
        assert_eq!(parse("0.1h"), "0:06:00");
        assert_eq!(parse("0.5s"), "0:00:01");
    }

    #[test]
    fn test_trailing_number_ignored() {
        assert_eq!(parse("5m3"), "0:05:00");
    }

    #[test]
    fn test_no_tokens() {
        assert_eq!(parse_time("foo").unwrap(), None);
        assert_eq!(parse_time("").unwrap(), None);
    }

    #[test]
    fn test_invalid_unit() {
        match parse_time("5x") {
            Err(ProfileError::InvalidTimeUnit { unit, .. }) => assert_eq!(unit, "x"),
            result => panic!("Unexpected result {result:?}"),
        }
    }

    #[test]
    fn test_amount_out_of_range() {
        for input in ["99999999999999999999h", "18446744073709551615w"] {
            match parse_time(input) {
                Err(ProfileError::InvalidOption { key, value, .. }) => {
                    assert_eq!(key, "time");
                    assert_eq!(value, input);
                }
                result => panic!("Unexpected result {result:?}"),
            }
        }
    }

    #[test]
    fn test_parse_slurm_time() {
        let time = parse_slurm_time("17-01:00:11").unwrap();
        assert_eq!(
            time.as_duration(),
            Duration::from_secs(17 * 24 * 3600 + 3600 + 11)
        );
    }

    #[test]
    fn test_parse_slurm_duration() {
        assert_eq!(
            parse_slurm_duration("10:20:30").unwrap(),
            Some(Duration::from_secs(10 * 3600 + 20 * 60 + 30))
        );
        assert_eq!(
            parse_slurm_duration("1-00:00:00").unwrap(),
            Some(Duration::from_secs(24 * 3600))
        );
        assert_eq!(parse_slurm_duration("infinite").unwrap(), None);
        assert!(parse_slurm_duration("x").is_err());
    }
}
