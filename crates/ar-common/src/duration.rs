use once_cell::sync::Lazy;
use regex::Regex;

/// Sentinel returned for a candidate without any parsable duration.
/// Sorts after every known duration but never excludes the candidate.
pub const UNKNOWN_DURATION_MINUTES: u32 = 999;

static RE_QUERY_MINUTES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)\s*(?:min|minute|minutes)").unwrap());
static RE_QUERY_HOURS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)\s*(?:hr|hour|hours)").unwrap());
static RE_QUERY_BARE_H: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+)\s*h").unwrap());

static RE_CANDIDATE_HOURS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)\s*(?:hr|hour)").unwrap());
static RE_CANDIDATE_MINUTES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)\s*(?:min|minute)").unwrap());

fn first_number(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Duration constraint expressed in a free-text query, in minutes.
///
/// Pattern types are tried in order: minutes, hours, bare `h`. The first type
/// that matches anywhere in the text wins. `None` means "no constraint".
pub fn parse_query_duration(text: &str) -> Option<u32> {
    let lowered = text.to_lowercase();

    if let Some(minutes) = first_number(&RE_QUERY_MINUTES, &lowered) {
        return Some(minutes);
    }

    [&*RE_QUERY_HOURS, &*RE_QUERY_BARE_H]
        .into_iter()
        .find_map(|re| first_number(re, &lowered).and_then(|hours| hours.checked_mul(60)))
}

/// Duration of a candidate's textual duration field, in minutes.
///
/// Hour and minute mentions are summed ("1 hour 30 minutes" = 90).
/// Returns [`UNKNOWN_DURATION_MINUTES`] when nothing numeric is found.
pub fn parse_candidate_duration(text: &str) -> u32 {
    if text.trim().is_empty() {
        return UNKNOWN_DURATION_MINUTES;
    }

    let lowered = text.to_lowercase();
    let hours = first_number(&RE_CANDIDATE_HOURS, &lowered)
        .and_then(|h| h.checked_mul(60))
        .unwrap_or(0);
    let minutes = first_number(&RE_CANDIDATE_MINUTES, &lowered).unwrap_or(0);

    match hours.saturating_add(minutes) {
        0 => UNKNOWN_DURATION_MINUTES,
        total => total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_hours_are_converted_to_minutes() {
        assert_eq!(parse_query_duration("finish within 1 hour"), Some(60));
        assert_eq!(parse_query_duration("about 2 hrs total"), Some(120));
        assert_eq!(parse_query_duration("budget of 3h"), Some(180));
    }

    #[test]
    fn query_minutes_pattern_wins_over_hours() {
        assert_eq!(
            parse_query_duration("1 hour at most, ideally 40 minutes"),
            Some(40)
        );
        assert_eq!(parse_query_duration("30 mins"), Some(30));
        assert_eq!(parse_query_duration("Completed in 45 Minutes"), Some(45));
    }

    #[test]
    fn query_without_duration_is_none() {
        assert_eq!(parse_query_duration("Java developer with SQL"), None);
        assert_eq!(parse_query_duration(""), None);
        assert_eq!(parse_query_duration("about an hour"), None);
    }

    #[test]
    fn candidate_duration_parses_minutes() {
        assert_eq!(
            parse_candidate_duration("Approximate completion time: 45 minutes"),
            45
        );
        assert_eq!(parse_candidate_duration("20 min"), 20);
    }

    #[test]
    fn candidate_duration_sums_hours_and_minutes() {
        assert_eq!(parse_candidate_duration("1 hour 30 minutes"), 90);
        assert_eq!(parse_candidate_duration("2 hr"), 120);
    }

    #[test]
    fn candidate_duration_unknown_is_sentinel() {
        assert_eq!(parse_candidate_duration(""), UNKNOWN_DURATION_MINUTES);
        assert_eq!(parse_candidate_duration("   "), UNKNOWN_DURATION_MINUTES);
        assert_eq!(parse_candidate_duration("untimed"), UNKNOWN_DURATION_MINUTES);
        assert_eq!(parse_candidate_duration("0 minutes"), UNKNOWN_DURATION_MINUTES);
    }

    #[test]
    fn non_ascii_digits_are_not_numbers() {
        assert_eq!(parse_query_duration("٣٠ minutes, or 20 minutes"), Some(20));
        assert_eq!(parse_query_duration("３０ minutes"), None);
        assert_eq!(parse_candidate_duration("١ hour 30 minutes"), 30);
        assert_eq!(parse_candidate_duration("४५ min"), UNKNOWN_DURATION_MINUTES);
    }

    #[test]
    fn overflowing_numbers_do_not_panic() {
        assert_eq!(parse_query_duration("99999999999 minutes"), None);
        assert_eq!(
            parse_candidate_duration("99999999999 minutes"),
            UNKNOWN_DURATION_MINUTES
        );
    }
}
