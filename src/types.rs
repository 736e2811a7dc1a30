use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// A duration written the way people type it: `"20s"`, `"500ms"`, `"2m"`,
/// `"1h"`.
///
/// Used for the grace period both in the config file and on the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct HumanDuration(pub Duration);

impl From<HumanDuration> for Duration {
    fn from(d: HumanDuration) -> Self {
        d.0
    }
}

impl TryFrom<String> for HumanDuration {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty duration string".to_string());
        }

        // Find the boundary between digits and suffix.
        let idx = s
            .chars()
            .position(|c| !c.is_ascii_digit())
            .ok_or_else(|| format!("duration '{s}' is missing a unit suffix (ms, s, m or h)"))?;

        let (num_part, unit_part) = s.split_at(idx);
        let value: u64 = num_part
            .parse()
            .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;

        let duration = match unit_part.trim().to_lowercase().as_str() {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(scale(value, 60, s)?),
            "h" => Duration::from_secs(scale(value, 60 * 60, s)?),
            unit => {
                return Err(format!(
                    "unsupported duration unit '{}'; expected ms, s, m, or h",
                    unit
                ));
            }
        };

        Ok(HumanDuration(duration))
    }
}

fn scale(value: u64, factor: u64, input: &str) -> Result<u64, String> {
    value
        .checked_mul(factor)
        .ok_or_else(|| format!("duration '{input}' is too large"))
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.0.as_millis();
        if ms % 1000 != 0 {
            write!(f, "{ms}ms")
        } else {
            write!(f, "{}s", self.0.as_secs())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_units() {
        assert_eq!("250ms".parse(), Ok(HumanDuration(Duration::from_millis(250))));
        assert_eq!("20s".parse(), Ok(HumanDuration(Duration::from_secs(20))));
        assert_eq!(" 2m ".parse(), Ok(HumanDuration(Duration::from_secs(120))));
        assert_eq!("1h".parse(), Ok(HumanDuration(Duration::from_secs(3600))));
    }

    #[test]
    fn rejects_bad_input() {
        assert!("".parse::<HumanDuration>().is_err());
        assert!("20".parse::<HumanDuration>().is_err());
        assert!("s".parse::<HumanDuration>().is_err());
        assert!("5d".parse::<HumanDuration>().unwrap_err().contains("unsupported"));
    }

    #[test]
    fn rejects_overflowing_minutes_and_hours() {
        let err = "9999999999999999h".parse::<HumanDuration>().unwrap_err();
        assert!(err.contains("too large"), "{err}");
        assert!(format!("{}m", u64::MAX).parse::<HumanDuration>().is_err());
        assert_eq!(
            format!("{}s", u64::MAX).parse(),
            Ok(HumanDuration(Duration::from_secs(u64::MAX)))
        );
    }

    #[test]
    fn display_round_trips_common_values() {
        assert_eq!(HumanDuration(Duration::from_secs(20)).to_string(), "20s");
        assert_eq!(HumanDuration(Duration::from_millis(1500)).to_string(), "1500ms");
    }
}
