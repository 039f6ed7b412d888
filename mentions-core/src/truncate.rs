pub const DEFAULT_MAX_CHARS: usize = 1500;

/// Bounds a body to `max_chars` characters, preferring a paragraph or
/// sentence break in the back half of the window, and appends a link to
/// the full content. Bodies that already fit are returned unchanged.
pub fn truncate(body: &str, reference_url: &str, max_chars: usize) -> String {
    let window_end = match body.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => byte_idx,
        None => return body.to_string(),
    };
    let window = &body[..window_end];
    let threshold = max_chars as f64 * 0.5;
    let past_threshold = |byte_pos: usize| window[..byte_pos].chars().count() as f64 > threshold;

    let cut = match window.rfind("\n\n") {
        Some(pos) if past_threshold(pos) => &window[..pos],
        _ => {
            let sentence_end = [". ", "! ", "? "]
                .iter()
                .filter_map(|mark| window.rfind(mark))
                .max();
            match sentence_end {
                // Keep the punctuation, drop the space.
                Some(pos) if past_threshold(pos) => &window[..pos + 1],
                _ => window,
            }
        }
    };

    format!(
        "{}\n\n*[... Click to read whole post/comment]({})*",
        cut.trim_end(),
        reference_url
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://reddit.com/r/mysql/comments/abc";

    fn without_pointer(truncated: &str) -> &str {
        match truncated.rfind("\n\n*[... Click to read whole post/comment](") {
            Some(pos) => &truncated[..pos],
            None => truncated,
        }
    }

    #[test]
    fn empty_body_is_unchanged() {
        assert_eq!(truncate("", URL, DEFAULT_MAX_CHARS), "");
    }

    #[test]
    fn short_body_is_identity() {
        let body = "Short question about replication.";
        assert_eq!(truncate(body, URL, DEFAULT_MAX_CHARS), body);
        let exact = "x".repeat(DEFAULT_MAX_CHARS);
        assert_eq!(truncate(&exact, URL, DEFAULT_MAX_CHARS), exact);
    }

    #[test]
    fn unbroken_text_is_cut_raw() {
        let body = "a".repeat(2000);
        let out = truncate(&body, URL, 1500);
        assert_eq!(
            out,
            format!(
                "{}\n\n*[... Click to read whole post/comment]({})*",
                "a".repeat(1500),
                URL
            )
        );
    }

    #[test]
    fn prefers_late_paragraph_break() {
        let body = format!("{}\n\n{}", "a".repeat(80), "b".repeat(100));
        let out = truncate(&body, URL, 100);
        assert_eq!(without_pointer(&out), "a".repeat(80));
    }

    #[test]
    fn early_paragraph_break_falls_back_to_sentence() {
        let body = format!("{}\n\n{}. {}", "a".repeat(10), "b".repeat(60), "c".repeat(100));
        let out = truncate(&body, URL, 100);
        assert_eq!(without_pointer(&out), format!("{}\n\n{}.", "a".repeat(10), "b".repeat(60)));
    }

    #[test]
    fn early_sentence_break_uses_raw_cut() {
        let body = format!("{}! {}", "a".repeat(20), "b".repeat(200));
        let out = truncate(&body, URL, 100);
        assert_eq!(without_pointer(&out).chars().count(), 100);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let body = "é".repeat(120);
        let out = truncate(&body, URL, 100);
        assert_eq!(without_pointer(&out), "é".repeat(100));
        assert!(out.ends_with(&format!("({})*", URL)));
    }

    #[test]
    fn pre_pointer_portion_never_exceeds_limit() {
        let body = "Lorem ipsum dolor sit amet. Consectetur adipiscing!\n\nElit sed do? ".repeat(60);
        for max in [1, 10, 37, 100, 500, 1500] {
            let out = truncate(&body, URL, max);
            assert!(without_pointer(&out).chars().count() <= max, "max={max}");
        }
    }

    #[test]
    fn break_exactly_at_half_is_rejected() {
        let at_half = format!("{}\n\n{}", "a".repeat(50), "b".repeat(100));
        let out = truncate(&at_half, URL, 100);
        assert_eq!(
            without_pointer(&out),
            format!("{}\n\n{}", "a".repeat(50), "b".repeat(48))
        );

        let one_past = format!("{}\n\n{}", "a".repeat(51), "b".repeat(100));
        let out = truncate(&one_past, URL, 100);
        assert_eq!(without_pointer(&out), "a".repeat(51));
    }

    #[test]
    fn sentence_break_exactly_at_half_is_rejected() {
        let at_half = format!("{}. {}", "a".repeat(50), "b".repeat(100));
        let out = truncate(&at_half, URL, 100);
        assert_eq!(without_pointer(&out).chars().count(), 100);

        let one_past = format!("{}. {}", "a".repeat(51), "b".repeat(100));
        let out = truncate(&one_past, URL, 100);
        assert_eq!(without_pointer(&out), format!("{}.", "a".repeat(51)));
    }

    #[test]
    fn question_and_exclamation_marks_end_sentences() {
        let question = format!("{}? {}", "a".repeat(70), "b".repeat(100));
        assert_eq!(
            without_pointer(&truncate(&question, URL, 100)),
            format!("{}?", "a".repeat(70))
        );

        let exclamation = format!("{}! {}", "a".repeat(70), "b".repeat(100));
        assert_eq!(
            without_pointer(&truncate(&exclamation, URL, 100)),
            format!("{}!", "a".repeat(70))
        );

        // The latest sentence end wins regardless of its mark.
        let mixed = format!("{}! {}? {}", "a".repeat(60), "b".repeat(20), "c".repeat(100));
        assert_eq!(
            without_pointer(&truncate(&mixed, URL, 100)),
            format!("{}! {}?", "a".repeat(60), "b".repeat(20))
        );
    }
}
