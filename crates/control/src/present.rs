//! Plain-text rendering of gateway results for chat replies.

use scriptgate_core::scripting::{Classification, InvocationResult};

/// Appended to output cut by [`cap_output`].
pub const TRUNCATION_MARKER: &str = "\n…[truncated]";

/// Decode `bytes` lossily and cut the text to at most `cap` bytes.
///
/// The cut lands on a char boundary at or below `cap`. Returns the text and
/// whether anything was cut; the marker is appended only when it was.
pub fn cap_output(bytes: &[u8], cap: usize) -> (String, bool) {
    let text = String::from_utf8_lossy(bytes);
    if text.len() <= cap {
        return (text.into_owned(), false);
    }

    let mut end = cap;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let mut capped = text[..end].to_string();
    capped.push_str(TRUNCATION_MARKER);
    (capped, true)
}

/// Apply the cap to a gateway result, marking it truncated when cut.
pub fn cap_result(result: InvocationResult, cap: usize) -> (String, InvocationResult) {
    let (text, truncated) = cap_output(&result.output, cap);
    (text, InvocationResult { truncated, ..result })
}

/// One-line heading for a test run.
pub fn outcome_label(classification: Classification) -> &'static str {
    match classification {
        Classification::Success => "Test run succeeded",
        Classification::ScriptError => "Test run failed",
        Classification::Timeout => "Test run timed out",
        Classification::NotFound => "Test run could not find the script",
        Classification::ServerError => "Test run could not start the interpreter",
    }
}

/// Render a capped test-run report.
pub fn render_test_run(result: InvocationResult, cap: usize) -> String {
    let label = outcome_label(result.classification);
    let (text, _) = cap_result(result, cap);
    if text.is_empty() {
        format!("{label} (no output).")
    } else {
        format!("{label}:\n{text}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_output_is_untouched() {
        let (text, truncated) = cap_output(b"hello", 4000);
        assert_eq!(text, "hello");
        assert!(!truncated);
    }

    #[test]
    fn output_at_cap_is_untouched() {
        let (text, truncated) = cap_output(&[b'a'; 10], 10);
        assert_eq!(text.len(), 10);
        assert!(!truncated);
    }

    #[test]
    fn long_output_is_cut_with_marker() {
        let (text, truncated) = cap_output(&[b'a'; 5000], 4000);
        assert!(truncated);
        assert!(text.ends_with(TRUNCATION_MARKER));
        assert_eq!(text.len(), 4000 + TRUNCATION_MARKER.len());
    }

    #[test]
    fn cut_respects_char_boundaries() {
        // "é" is two bytes; a cap of 3 must not split the second one.
        let (text, truncated) = cap_output("éé".as_bytes(), 3);
        assert!(truncated);
        assert_eq!(text, format!("é{TRUNCATION_MARKER}"));
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let (text, truncated) = cap_output(&[0x66, 0xff, 0x6f], 100);
        assert_eq!(text, "f\u{fffd}o");
        assert!(!truncated);
    }

    #[test]
    fn cap_result_sets_truncated_flag() {
        let result = InvocationResult::new(Classification::Success, vec![b'x'; 20]);
        let (_, capped) = cap_result(result, 5);
        assert!(capped.truncated);
        assert_eq!(capped.output.len(), 20);
    }

    #[test]
    fn test_run_report() {
        let report = render_test_run(InvocationResult::new(Classification::Success, "hi"), 4000);
        assert_eq!(report, "Test run succeeded:\nhi");

        let empty = render_test_run(InvocationResult::new(Classification::Success, ""), 4000);
        assert_eq!(empty, "Test run succeeded (no output).");
    }
}
