//! US state FIPS code utilities.
//!
//! County identifiers in the mobility panel are numeric five-digit FIPS
//! codes whose leading digits are the state code. Study states may be
//! configured either by code or by two-letter abbreviation.

/// `(code, abbreviation)` for the 50 US states + DC.
const STATES: &[(u32, &str)] = &[
    (1, "AL"),
    (2, "AK"),
    (4, "AZ"),
    (5, "AR"),
    (6, "CA"),
    (8, "CO"),
    (9, "CT"),
    (10, "DE"),
    (11, "DC"),
    (12, "FL"),
    (13, "GA"),
    (15, "HI"),
    (16, "ID"),
    (17, "IL"),
    (18, "IN"),
    (19, "IA"),
    (20, "KS"),
    (21, "KY"),
    (22, "LA"),
    (23, "ME"),
    (24, "MD"),
    (25, "MA"),
    (26, "MI"),
    (27, "MN"),
    (28, "MS"),
    (29, "MO"),
    (30, "MT"),
    (31, "NE"),
    (32, "NV"),
    (33, "NH"),
    (34, "NJ"),
    (35, "NM"),
    (36, "NY"),
    (37, "NC"),
    (38, "ND"),
    (39, "OH"),
    (40, "OK"),
    (41, "OR"),
    (42, "PA"),
    (44, "RI"),
    (45, "SC"),
    (46, "SD"),
    (47, "TN"),
    (48, "TX"),
    (49, "UT"),
    (50, "VT"),
    (51, "VA"),
    (53, "WA"),
    (54, "WV"),
    (55, "WI"),
    (56, "WY"),
];

/// Returns the two-letter abbreviation for a numeric state FIPS code.
#[must_use]
fn state_abbr(code: u32) -> Option<&'static str> {
    STATES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, abbr)| *abbr)
}

/// Resolves a configured state reference to its numeric FIPS code.
///
/// Accepts a numeric code with or without zero padding (`"22"`, `"05"`,
/// `"5"`) or a two-letter abbreviation in any case (`"la"`). Returns
/// `None` when the reference does not name a known state.
#[must_use]
pub fn parse_state(reference: &str) -> Option<u32> {
    let trimmed = reference.trim();

    if let Ok(code) = trimmed.parse::<u32>() {
        return state_abbr(code).map(|_| code);
    }

    let upper = trimmed.to_uppercase();
    STATES
        .iter()
        .find(|(_, abbr)| *abbr == upper)
        .map(|(code, _)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_count() {
        assert_eq!(STATES.len(), 51);
    }

    #[test]
    fn codes_are_sorted_and_unique() {
        assert!(STATES.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn abbreviation_parses_back_to_code() {
        for (code, abbr) in STATES {
            assert_eq!(parse_state(abbr), Some(*code), "roundtrip failed for {abbr}");
        }
    }

    #[test]
    fn parses_padded_and_bare_codes() {
        assert_eq!(parse_state("05"), Some(5));
        assert_eq!(parse_state("5"), Some(5));
        assert_eq!(parse_state(" 22 "), Some(22));
        assert_eq!(parse_state("la"), Some(22));
    }

    #[test]
    fn unknown_references() {
        assert_eq!(state_abbr(3), None);
        assert_eq!(state_abbr(99), None);
        assert_eq!(parse_state("XX"), None);
        assert_eq!(parse_state("3"), None);
    }

    #[test]
    fn gulf_states() {
        assert_eq!(state_abbr(22), Some("LA"));
        assert_eq!(parse_state("tx"), Some(48));
    }
}
