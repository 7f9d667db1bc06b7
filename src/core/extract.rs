// ChatKeeper - core/extract.rs
//
// Extracts the embedded chat log from a storage blob.
//
// The storage file is a JSON-like object, but only one field matters, so the
// fragment is pulled out with a regex instead of a full parser. That keeps a
// multi-megabyte blob read fast and tolerates whatever else the client
// decides to store around it. The trade-off is a hard dependency on the
// field's exact textual shape, including the terminating `\n` escape: a chat
// log with zero lines has no `\n` token and therefore fails extraction.

use crate::core::model::ParsedLog;
use crate::util::constants;
use crate::util::error::ExtractError;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

fn chat_log_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(constants::CHAT_LOG_PATTERN).expect("chat log pattern"))
}

fn line_timestamp_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(constants::LINE_TIMESTAMP_PATTERN).expect("timestamp pattern"))
}

/// Read a storage file and extract its chat log.
///
/// Surfacing policy belongs to the caller: an explicit user-triggered parse
/// reports the error, a background poll treats it as "nothing to do".
pub fn extract(storage_path: &Path, remove_timestamps: bool) -> Result<ParsedLog, ExtractError> {
    let raw = std::fs::read_to_string(storage_path).map_err(|e| ExtractError::Io {
        path: storage_path.to_path_buf(),
        source: e,
    })?;

    extract_from_text(&raw, remove_timestamps).ok_or_else(|| ExtractError::NoChatLog {
        path: storage_path.to_path_buf(),
    })
}

/// Extract and decode the chat log fragment from raw storage text.
///
/// Returns `None` when the text has no `chat_log` field in the expected
/// shape.
pub fn extract_from_text(raw: &str, remove_timestamps: bool) -> Option<ParsedLog> {
    let fragment = chat_log_regex().find(raw)?.as_str();

    // Strip the field prefix and the closing quote; the regex guarantees
    // both are present.
    let body = &fragment[constants::CHAT_LOG_PREFIX.len()..fragment.len() - 1];

    // Literal `\n` escapes become real line breaks, then entity decoding
    // restores characters the client HTML-encoded (`&apos;` and friends).
    let unescaped = body.replace("\\n", "\n");
    let decoded = html_escape::decode_html_entities(&unescaped);
    let mut text = decoded.trim_end_matches(['\r', '\n']).to_string();

    if remove_timestamps {
        text = line_timestamp_regex().replace_all(&text, "").into_owned();
    }

    Some(ParsedLog {
        text,
        timestamps_removed: remove_timestamps,
    })
}

/// Strip a leading `[H:MM:SS] ` token from every line. Used by filtering
/// for match-time comparisons and display-time stripping.
pub fn strip_line_timestamps(text: &str) -> String {
    line_timestamp_regex().replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_extracts_simple_log() {
        let raw = r#"{"server_version":"GTA World (EU#1)","chat_log":"[01:02:03] Hello\n"}"#;
        let parsed = extract_from_text(raw, false).unwrap();
        assert_eq!(parsed.text, "[01:02:03] Hello");
        assert!(!parsed.timestamps_removed);
    }

    #[test]
    fn test_multi_line_log_round_trips() {
        let original = "[01:02:03] First line\n[01:02:04] Second line";
        let wrapped = format!(
            r#"{{"server_version":"GTA World (EU#1)","chat_log":"{}\n"}}"#,
            original.replace('\n', r"\n")
        );
        let parsed = extract_from_text(&wrapped, false).unwrap();
        assert_eq!(parsed.text, original);
    }

    #[test]
    fn test_html_entities_are_decoded() {
        let raw = r#"{"chat_log":"John says: it&apos;s &quot;fine&quot; &amp; done\n"}"#;
        let parsed = extract_from_text(raw, false).unwrap();
        assert_eq!(parsed.text, "John says: it's \"fine\" & done");
    }

    #[test]
    fn test_log_without_newline_escape_fails() {
        // A zero-line chat log has no `\n` token; the field shape requires
        // one, so extraction fails rather than returning an empty log.
        let raw = r#"{"chat_log":""}"#;
        assert!(extract_from_text(raw, false).is_none());

        let raw_no_field = r#"{"server_version":"GTA World (EU#1)"}"#;
        assert!(extract_from_text(raw_no_field, false).is_none());
    }

    #[test]
    fn test_trailing_line_breaks_trimmed() {
        let raw = r#"{"chat_log":"line one\nline two\n"}"#;
        let parsed = extract_from_text(raw, false).unwrap();
        assert_eq!(parsed.text, "line one\nline two");
    }

    #[test]
    fn test_remove_timestamps() {
        let raw = r#"{"chat_log":"[1:02:03] one\n[12:34:56] two\n"}"#;
        let parsed = extract_from_text(raw, true).unwrap();
        assert_eq!(parsed.text, "one\ntwo");
        assert!(parsed.timestamps_removed);
    }

    #[test]
    fn test_timestamp_mid_line_is_kept() {
        let raw = r#"{"chat_log":"[1:02:03] meet at [12:00:00] sharp\n"}"#;
        let parsed = extract_from_text(raw, true).unwrap();
        assert_eq!(parsed.text, "meet at [12:00:00] sharp");
    }

    #[test]
    fn test_extract_from_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = extract(&dir.path().join(".storage"), false);
        assert!(matches!(result, Err(ExtractError::Io { .. })));
    }

    #[test]
    fn test_extract_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".storage");
        fs::write(
            &path,
            r#"{"server_version":"GTA World (EU#1)","chat_log":"[01:02:03] Hello\n"}"#,
        )
        .unwrap();

        let parsed = extract(&path, false).unwrap();
        assert_eq!(parsed.text, "[01:02:03] Hello");
    }

    #[test]
    fn test_malformed_file_is_no_chat_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".storage");
        fs::write(&path, "not a storage blob at all").unwrap();

        let result = extract(&path, false);
        assert!(matches!(result, Err(ExtractError::NoChatLog { .. })));
    }
}
