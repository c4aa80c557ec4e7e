use crate::domain::MatchStrategy;

/// Compare an extracted value against the expected baseline. Comparison is
/// always case-insensitive, whatever the strategy.
pub fn value_matches(extracted: &str, expected: &str, strategy: MatchStrategy) -> bool {
    let extracted = extracted.to_lowercase();
    let expected = expected.to_lowercase();
    match strategy {
        MatchStrategy::Contains => extracted.contains(&expected),
        MatchStrategy::Exact => extracted == expected,
        MatchStrategy::StartsWith => extracted.starts_with(&expected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_case_insensitive() {
        assert!(value_matches(
            "Leo will have a GREAT day",
            "great day",
            MatchStrategy::Contains
        ));
        assert!(!value_matches("Leo will travel", "great day", MatchStrategy::Contains));
    }

    #[test]
    fn exact_requires_full_equality() {
        assert!(value_matches("Great Day", "great day", MatchStrategy::Exact));
        assert!(!value_matches("a great day", "great day", MatchStrategy::Exact));
    }

    #[test]
    fn starts_with_anchors_at_the_front() {
        assert!(value_matches("GREAT day ahead", "great", MatchStrategy::StartsWith));
        assert!(!value_matches("a GREAT day", "great", MatchStrategy::StartsWith));
    }

    #[test]
    fn empty_expected_always_matches() {
        assert!(value_matches("anything", "", MatchStrategy::Contains));
        assert!(value_matches("", "", MatchStrategy::Exact));
    }
}
