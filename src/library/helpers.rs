//! Various small helper functions

use std::num::ParseIntError;
use std::time::Duration;

/// Splits the input string into two parts at the first occurence of the separator
pub fn split_into_two(input: &str, separator: &'static str) -> Option<(String, String)> {
    let parts: Vec<&str> = input.splitn(2, separator).collect();

    if parts.len() != 2 {
        return None;
    }

    Some((parts[0].to_string(), parts[1].to_string()))
}

/// Parses a Duration from a string containing seconds.
/// Useful for command line parsing
pub fn parse_seconds(src: &str) -> Result<Duration, ParseIntError> {
    let seconds = src.parse::<u64>()?;
    Ok(Duration::from_secs(seconds))
}

#[cfg(test)]
mod does {
    use super::*;

    #[test]
    fn split_at_first_separator() {
        assert_eq!(
            split_into_two("meeting--user--suffix", "--"),
            Some(("meeting".to_string(), "user--suffix".to_string()))
        );
    }

    #[test]
    fn reject_missing_separator() {
        assert_eq!(split_into_two("meeting", "--"), None);
    }

    #[test]
    fn parse_seconds_into_duration() {
        assert_eq!(parse_seconds("42"), Ok(Duration::from_secs(42)));
        assert!(parse_seconds("forever").is_err());
    }
}
