// ChatKeeper - core/classify.rs
//
// Line classification and filtering.
//
// Two mutually exclusive modes share one inclusion rule:
//   - category mode tests every non-blank line against the criteria;
//   - word mode first gates lines on a case-insensitive term search, then
//     applies the same criteria logic to the survivors.
//
// Inclusion rule: criteria are evaluated in declared order against the line
// with its leading timestamp stripped; evaluation stops at the FIRST
// matching criterion, and the line is kept only if that criterion is
// enabled. A line matching a disabled category is dropped even when a later
// enabled category would also match. Lines matching no category are kept
// only when the catch-all flag is set.
//
// Pure logic: no I/O, no UI dependencies.

use crate::core::extract::strip_line_timestamps;
use crate::core::model::CriteriaSet;
use crate::util::error::ClassifyError;

/// Options applied after the line-by-line pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterOptions {
    /// Strip leading line timestamps from the returned text. Display-only:
    /// matching always runs against stripped lines regardless.
    pub remove_timestamps: bool,

    /// When no line survives the pass, return empty output instead of
    /// falling back to the original input.
    pub suppress_no_match_fallback: bool,
}

/// Result of a filtering pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    pub text: String,

    /// False when nothing matched and the output is the fallback (or empty).
    pub matched: bool,
}

/// Filter a chat log.
///
/// `words` selects the mode: `None` runs category mode, `Some` runs word
/// mode with the given free-form word-list input (one term per nonblank
/// line).
pub fn filter_log(
    log: &str,
    criteria: &CriteriaSet,
    words: Option<&str>,
    opts: &FilterOptions,
) -> Result<FilterOutcome, ClassifyError> {
    let terms = match words {
        Some(input) => Some(parse_word_list(input)?),
        None => None,
    };

    let mut kept: Vec<&str> = Vec::new();
    for line in log.split('\n') {
        if line.trim().is_empty() {
            continue;
        }

        let stripped = strip_line_timestamps(line);

        if let Some(ref terms) = terms {
            let lowered = stripped.to_lowercase();
            if !terms.iter().any(|t| lowered.contains(&t.to_lowercase())) {
                continue;
            }
        }

        if line_included(&stripped, criteria) {
            kept.push(line);
        }
    }

    if kept.is_empty() {
        // Deliberate fallback: an unmatched filter shows the whole log
        // rather than nothing, unless configured otherwise.
        if opts.suppress_no_match_fallback {
            return Ok(FilterOutcome {
                text: String::new(),
                matched: false,
            });
        }
        let text = if opts.remove_timestamps {
            strip_line_timestamps(log)
        } else {
            log.to_string()
        };
        return Ok(FilterOutcome {
            text,
            matched: false,
        });
    }

    let mut text = kept.join("\n");
    text = text.trim_end_matches(['\r', '\n']).to_string();
    if opts.remove_timestamps {
        text = strip_line_timestamps(&text);
    }

    Ok(FilterOutcome {
        text,
        matched: true,
    })
}

/// Apply the inclusion rule to one timestamp-stripped line.
fn line_included(stripped: &str, criteria: &CriteriaSet) -> bool {
    for criterion in criteria
        .criteria()
        .iter()
        .filter(|c| !c.pattern.as_str().is_empty())
    {
        if criterion.pattern.is_match(stripped) {
            // First match decides: enabled keeps the line, disabled drops
            // it. Later criteria are not consulted.
            return criterion.enabled;
        }
    }
    criteria.other_enabled
}

/// Split free-form word-list input into literal search terms: every
/// nonblank line, trimmed, becomes one term. No further validation.
pub fn parse_word_list(input: &str) -> Result<Vec<String>, ClassifyError> {
    let terms: Vec<String> = input
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.trim().to_string())
        .collect();

    if terms.is_empty() {
        return Err(if input.trim().is_empty() {
            ClassifyError::NoWordsProvided
        } else {
            ClassifyError::NoUsableTerms
        });
    }

    Ok(terms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::CriteriaSet;

    fn criteria(flags: [bool; 7], other: bool) -> CriteriaSet {
        CriteriaSet::from_flags(flags, other)
    }

    const LOG: &str = "[12:00:00] John Doe says: hi\nrandom unmatched line";

    #[test]
    fn test_only_ic_enabled_keeps_ic_line_with_timestamp() {
        let set = criteria([false, true, false, false, false, false, false], false);
        let out = filter_log(LOG, &set, None, &FilterOptions::default()).unwrap();
        assert!(out.matched);
        assert_eq!(out.text, "[12:00:00] John Doe says: hi");
    }

    #[test]
    fn test_all_disabled_other_enabled_keeps_uncategorised_lines() {
        let set = criteria([false; 7], true);
        let log = "random unmatched line\nanother line of notes";
        let out = filter_log(log, &set, None, &FilterOptions::default()).unwrap();
        assert!(out.matched);
        assert_eq!(out.text, log);
    }

    #[test]
    fn test_other_does_not_rescue_a_disabled_category_match() {
        // The catch-all only covers lines matching NO category; a line
        // matching a disabled one stays excluded.
        let set = criteria([false; 7], true);
        let out = filter_log(LOG, &set, None, &FilterOptions::default()).unwrap();
        assert!(out.matched);
        assert_eq!(out.text, "random unmatched line");
    }

    #[test]
    fn test_all_disabled_other_disabled_suppressed_is_empty() {
        let set = criteria([false; 7], false);
        let opts = FilterOptions {
            suppress_no_match_fallback: true,
            ..Default::default()
        };
        let out = filter_log(LOG, &set, None, &opts).unwrap();
        assert!(!out.matched);
        assert_eq!(out.text, "");
    }

    #[test]
    fn test_no_match_falls_back_to_original() {
        let set = criteria([false; 7], false);
        let out = filter_log(LOG, &set, None, &FilterOptions::default()).unwrap();
        assert!(!out.matched);
        assert_eq!(out.text, LOG);
    }

    #[test]
    fn test_no_match_fallback_respects_timestamp_stripping() {
        let set = criteria([false; 7], false);
        let opts = FilterOptions {
            remove_timestamps: true,
            ..Default::default()
        };
        let out = filter_log(LOG, &set, None, &opts).unwrap();
        assert!(!out.matched);
        assert_eq!(out.text, "John Doe says: hi\nrandom unmatched line");
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let set = criteria([false; 7], true);
        let log = "first\n\n   \nsecond";
        let out = filter_log(log, &set, None, &FilterOptions::default()).unwrap();
        assert_eq!(out.text, "first\nsecond");
    }

    #[test]
    fn test_first_matching_criterion_decides_even_when_disabled() {
        // The fixture matches both Emote (declared first) and Action. With
        // Emote disabled and Action enabled the line is still dropped:
        // evaluation stops at the first match.
        let line = "* waves slowly ((John Doe))*";
        let emote_set = criteria([false, false, false, true, false, false, false], false);
        let emote = &emote_set.criteria()[2];
        let action = &emote_set.criteria()[3];
        assert!(
            emote.pattern.is_match(line) && action.pattern.is_match(line),
            "fixture must match both Emote and Action"
        );

        let out = filter_log(line, &emote_set, None, &FilterOptions::default()).unwrap();
        assert!(!out.matched, "line must be dropped by the disabled Emote");
    }

    #[test]
    fn test_timestamps_preserved_in_output_but_ignored_for_matching() {
        // IC pattern is anchored at line start; matching only works
        // because the timestamp is stripped before the test. The output
        // still carries the timestamp.
        let set = criteria([false, true, false, false, false, false, false], false);
        let out = filter_log("[9:5:3] Jane Doe shouts: here", &set, None, &FilterOptions::default())
            .unwrap();
        assert_eq!(out.text, "[9:5:3] Jane Doe shouts: here");
    }

    #[test]
    fn test_display_timestamp_stripping() {
        let set = criteria([false, true, false, false, false, false, false], false);
        let opts = FilterOptions {
            remove_timestamps: true,
            ..Default::default()
        };
        let out = filter_log("[12:00:00] John Doe says: hi", &set, None, &opts).unwrap();
        assert_eq!(out.text, "John Doe says: hi");
    }

    // -------------------------------------------------------------------
    // Word mode
    // -------------------------------------------------------------------

    #[test]
    fn test_word_mode_gates_lines_before_criteria() {
        let set = criteria([false, true, false, false, false, false, false], false);
        let log = "[1:2:3] John Doe says: hello\n[1:2:4] Jane Roe says: goodbye";
        let out = filter_log(log, &set, Some("john doe"), &FilterOptions::default()).unwrap();
        assert!(out.matched);
        assert_eq!(out.text, "[1:2:3] John Doe says: hello");
    }

    #[test]
    fn test_word_mode_applies_criteria_to_survivors() {
        // Both lines contain the term, but only the IC line passes the
        // criteria with Other disabled.
        let set = criteria([false, true, false, false, false, false, false], false);
        let log = "John Doe says: hello\nJohn Doe discarded note";
        let out = filter_log(log, &set, Some("John"), &FilterOptions::default()).unwrap();
        assert_eq!(out.text, "John Doe says: hello");
    }

    #[test]
    fn test_word_mode_blank_input_errors() {
        let set = criteria([false; 7], true);
        let result = filter_log(LOG, &set, Some("   \n  "), &FilterOptions::default());
        assert!(matches!(result, Err(ClassifyError::NoWordsProvided)));
    }

    #[test]
    fn test_parse_word_list_trims_terms() {
        let terms = parse_word_list("  John Doe  \n\n  bank  \n").unwrap();
        assert_eq!(terms, vec!["John Doe".to_string(), "bank".to_string()]);
    }

    #[test]
    fn test_word_match_is_case_insensitive() {
        let set = criteria([false; 7], true);
        let out = filter_log(
            "JOHN shouted something",
            &set,
            Some("john"),
            &FilterOptions::default(),
        )
        .unwrap();
        assert!(out.matched);
    }
}
