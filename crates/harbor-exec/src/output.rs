//! Output bounding.

/// Marker appended to output that exceeded the configured maximum length.
pub const TRUNCATION_MARKER: &str = "... [output truncated]";

/// Bounds `output` to at most `max_chars` characters, appending
/// [`TRUNCATION_MARKER`] when anything was cut.
///
/// Truncation counts characters rather than bytes so multi-byte output is
/// never split mid-character. Output at or under the bound is returned
/// unchanged, without the marker.
pub(crate) fn bound(output: String, max_chars: usize) -> String {
    if output.chars().count() <= max_chars {
        return output;
    }
    let mut bounded: String = output.chars().take(max_chars).collect();
    bounded.push_str(TRUNCATION_MARKER);
    bounded
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::under_limit("short", 10, "short")]
    #[case::at_limit("exact", 5, "exact")]
    #[case::empty("", 0, "")]
    fn bound_leaves_compliant_output_unchanged(
        #[case] output: &str,
        #[case] max_chars: usize,
        #[case] expected: &str,
    ) {
        assert_eq!(bound(output.to_owned(), max_chars), expected);
    }

    #[rstest]
    fn bound_truncates_and_appends_marker() {
        let bounded = bound(String::from("0123456789"), 4);
        assert_eq!(bounded, format!("0123{TRUNCATION_MARKER}"));
        assert_eq!(bounded.chars().count(), 4 + TRUNCATION_MARKER.chars().count());
    }

    #[rstest]
    fn bound_counts_characters_not_bytes() {
        let bounded = bound(String::from("ééééé"), 3);
        assert_eq!(bounded, format!("ééé{TRUNCATION_MARKER}"));
    }
}
