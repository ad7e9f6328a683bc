//! Hand-written codec for `workflow.md`.
//!
//! ```text
//! ---
//! state: shaping
//! schema_version: 3
//! checksum: 1a2b3c4d
//! started_at: 2024-01-15T10:30:00Z
//! history:
//!   - state: thinking
//!     at: 2024-01-15T10:30:00Z
//!   - state: shaping
//!     at: 2024-01-15T11:00:00Z
//!     note: "looks good"
//! ---
//!
//! # Intent
//! Add rate limiting
//!
//! ## Notes
//! - first note
//! ```
//!
//! The header is a small line-oriented subset of YAML, scanned by hand rather
//! than through a general YAML parser so that older and hand-edited files keep
//! loading. Unknown header keys are ignored.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use tracing::warn;

use super::{HistoryEntry, Workflow, checksum::compute_checksum, migrate::LEGACY_SCHEMA_VERSION};
use crate::error::WorkflowError;
use crate::state::{ParseStateError, WorkflowState};

const HEADER_OPEN: &str = "---\n";
const HEADER_CLOSE: &str = "\n---\n";

const KEY_STATE: &str = "state";
const KEY_SCHEMA_VERSION: &str = "schema_version";
const KEY_CHECKSUM: &str = "checksum";
const KEY_STARTED_AT: &str = "started_at";
const HISTORY_MARKER: &str = "history:";
const ENTRY_MARKER: &str = "- state:";
const FIELD_STATE: &str = "state:";
const FIELD_AT: &str = "at:";
const FIELD_NOTE: &str = "note:";

const INTENT_HEADING: &str = "# Intent";
const NOTES_HEADING: &str = "## Notes";
const NOTE_BULLET: &str = "- ";
const NO_NOTES: &str = "(none)";

// Stand-in for an escaped backslash while unescaping quotes.
const BACKSLASH_SENTINEL: &str = "\0";

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Serialize `workflow`, computing and caching its checksum.
///
/// The checksum covers the document rendered without a checksum line; the
/// returned text is the same document with `checksum:` inserted after
/// `schema_version:`.
pub fn encode(workflow: &mut Workflow) -> String {
    let checksum = compute_checksum(render(workflow, None).as_bytes());
    let text = render(workflow, Some(&checksum));
    workflow.checksum = checksum;
    text
}

/// The exact bytes the checksum is computed over.
#[must_use]
pub fn render_for_checksum(workflow: &Workflow) -> String {
    render(workflow, None)
}

fn render(workflow: &Workflow, checksum: Option<&str>) -> String {
    let mut header = vec![
        format!("{KEY_STATE}: {}", workflow.state),
        format!("{KEY_SCHEMA_VERSION}: {}", workflow.schema_version),
    ];
    if let Some(checksum) = checksum {
        header.push(format!("{KEY_CHECKSUM}: {checksum}"));
    }
    if let Some(started_at) = workflow.started_at {
        header.push(format!("{KEY_STARTED_AT}: {}", format_timestamp(started_at)));
    }
    if !workflow.history.is_empty() {
        header.push(HISTORY_MARKER.to_string());
        for entry in &workflow.history {
            header.push(format!("  {ENTRY_MARKER} {}", entry.state));
            header.push(format!("    {FIELD_AT} {}", format_timestamp(entry.at)));
            if !entry.note.is_empty() {
                header.push(format!("    {FIELD_NOTE} \"{}\"", escape_note(&entry.note)));
            }
        }
    }

    let notes = if workflow.notes.is_empty() {
        NO_NOTES.to_string()
    } else {
        workflow
            .notes
            .iter()
            .map(|note| format!("{NOTE_BULLET}{note}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "{HEADER_OPEN}{}{HEADER_CLOSE}\n{INTENT_HEADING}\n{}\n\n{NOTES_HEADING}\n{notes}\n",
        header.join("\n"),
        workflow.intent,
    )
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// History notes must stay on one header line.
fn escape_note(note: &str) -> String {
    note.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Parse a workflow document.
///
/// Lenient where files are commonly hand-edited: unknown keys are skipped, a
/// missing or unparsable `schema_version` means v1, and an unparsable
/// `started_at` is treated as absent.
///
/// # Errors
///
/// - [`WorkflowError::MalformedDocument`] if the text does not start with
///   `---\n` or the closing `\n---\n` is missing.
/// - [`WorkflowError::InvalidState`] if the top-level `state` or any history
///   entry's state is missing or unknown.
pub fn decode(text: &str) -> Result<Workflow, WorkflowError> {
    let (front, body) = split_header(text)?;
    let header = Header::parse(front)?;
    let state = header.state.parse::<WorkflowState>()?;
    let (intent, notes) = parse_body(body);

    Ok(Workflow {
        state,
        schema_version: header.schema_version,
        checksum: header.checksum,
        started_at: header.started_at,
        history: header.history,
        intent,
        notes,
    })
}

fn split_header(text: &str) -> Result<(&str, &str), WorkflowError> {
    let rest = text
        .strip_prefix(HEADER_OPEN)
        .ok_or(WorkflowError::MalformedDocument("missing front matter"))?;
    rest.split_once(HEADER_CLOSE)
        .ok_or(WorkflowError::MalformedDocument("malformed front matter"))
}

struct Header {
    state: String,
    schema_version: u32,
    checksum: String,
    started_at: Option<DateTime<Utc>>,
    history: Vec<HistoryEntry>,
}

impl Header {
    fn parse(front: &str) -> Result<Self, ParseStateError> {
        let mut header = Self {
            state: String::new(),
            schema_version: LEGACY_SCHEMA_VERSION,
            checksum: String::new(),
            started_at: None,
            history: Vec::new(),
        };
        let mut in_history = false;
        let mut pending: Option<PendingEntry> = None;

        for line in front.lines() {
            let trimmed = line.trim();

            if trimmed == HISTORY_MARKER {
                in_history = true;
                continue;
            }

            if in_history {
                if trimmed.is_empty() {
                    continue;
                }
                if let Some(raw) = trimmed.strip_prefix(ENTRY_MARKER) {
                    if let Some(entry) = pending.take() {
                        header.history.push(entry.finish());
                    }
                    pending = Some(PendingEntry::start(raw.trim())?);
                    continue;
                }
                if !is_indented(line) {
                    // Dedent: history is over, treat the line as a top-level key.
                    if let Some(entry) = pending.take() {
                        header.history.push(entry.finish());
                    }
                    in_history = false;
                } else if let Some(entry) = pending.as_mut() {
                    entry.apply(trimmed)?;
                    continue;
                }
                // An indented line before the first entry is read as a
                // top-level key.
            }

            let Some((key, value)) = trimmed.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                KEY_STATE => header.state = value.to_string(),
                KEY_SCHEMA_VERSION => {
                    header.schema_version = value.parse().unwrap_or(LEGACY_SCHEMA_VERSION);
                }
                KEY_CHECKSUM => header.checksum = value.to_string(),
                KEY_STARTED_AT => header.started_at = parse_timestamp(KEY_STARTED_AT, value),
                _ => {}
            }
        }

        if let Some(entry) = pending.take() {
            header.history.push(entry.finish());
        }
        Ok(header)
    }
}

struct PendingEntry {
    state: WorkflowState,
    at: Option<DateTime<Utc>>,
    note: String,
}

impl PendingEntry {
    fn start(raw_state: &str) -> Result<Self, ParseStateError> {
        Ok(Self {
            state: raw_state.parse()?,
            at: None,
            note: String::new(),
        })
    }

    fn apply(&mut self, field: &str) -> Result<(), ParseStateError> {
        if let Some(raw) = field.strip_prefix(FIELD_AT) {
            self.at = parse_timestamp("history.at", raw.trim());
        } else if let Some(raw) = field.strip_prefix(FIELD_NOTE) {
            self.note = unescape_note(raw.trim());
        } else if let Some(raw) = field.strip_prefix(FIELD_STATE) {
            self.state = raw.trim().parse()?;
        }
        Ok(())
    }

    fn finish(self) -> HistoryEntry {
        let at = self.at.unwrap_or_else(|| {
            warn!(state = %self.state, "history entry has no usable timestamp, using epoch");
            DateTime::<Utc>::UNIX_EPOCH
        });
        HistoryEntry::new(self.state, at, self.note)
    }
}

fn is_indented(line: &str) -> bool {
    line.starts_with("  ") || line.starts_with('\t')
}

fn parse_timestamp(field: &str, raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(at) => Some(at.with_timezone(&Utc).trunc_subsecs(0)),
        Err(err) => {
            warn!(field, value = raw, error = %err, "ignoring unparsable timestamp");
            None
        }
    }
}

fn unescape_note(raw: &str) -> String {
    let inner = raw
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(raw);
    inner
        .replace("\\\\", BACKSLASH_SENTINEL)
        .replace("\\\"", "\"")
        .replace("\\n", "\n")
        .replace("\\r", "\r")
        .replace(BACKSLASH_SENTINEL, "\\")
}

#[derive(Clone, Copy)]
enum Section {
    Preamble,
    Intent,
    Notes,
}

fn parse_body(body: &str) -> (String, Vec<String>) {
    let mut section = Section::Preamble;
    let mut intent = Vec::new();
    let mut notes = Vec::new();

    for line in body.lines() {
        let trimmed = line.trim();
        match trimmed {
            INTENT_HEADING => section = Section::Intent,
            NOTES_HEADING => section = Section::Notes,
            _ => match section {
                Section::Intent if !trimmed.is_empty() => intent.push(trimmed),
                Section::Notes => {
                    if let Some(note) = trimmed.strip_prefix(NOTE_BULLET) {
                        notes.push(note.to_string());
                    }
                }
                _ => {}
            },
        }
    }

    (intent.join(" "), notes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::CURRENT_SCHEMA_VERSION;
    use chrono::TimeZone;

    fn t(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, h, m, 0)
            .single()
            .expect("valid timestamp")
    }

    fn shaped() -> Workflow {
        let mut w = Workflow::new_at("Add rate limiting", t(10, 30));
        w.transition_at(WorkflowState::Shaping, "looks good", t(11, 0))
            .expect("thinking -> shaping");
        w.add_note("first note");
        w
    }

    #[test]
    fn encode_layout() {
        let mut w = shaped();
        let text = encode(&mut w);
        let expected = format!(
            "---\n\
             state: shaping\n\
             schema_version: 3\n\
             checksum: {}\n\
             started_at: 2024-01-15T10:30:00Z\n\
             history:\n  \
             - state: thinking\n    \
             at: 2024-01-15T10:30:00Z\n  \
             - state: shaping\n    \
             at: 2024-01-15T11:00:00Z\n    \
             note: \"looks good\"\n\
             ---\n\
             \n\
             # Intent\n\
             Add rate limiting\n\
             \n\
             ## Notes\n\
             - first note\n",
            w.checksum
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn checksum_line_is_the_only_difference() {
        let mut w = shaped();
        let with = encode(&mut w);
        let without = render_for_checksum(&w);
        let stripped: String = with
            .lines()
            .filter(|l| !l.starts_with("checksum: "))
            .map(|l| format!("{l}\n"))
            .collect();
        assert_eq!(stripped, without);
        assert_eq!(w.checksum, compute_checksum(without.as_bytes()));
    }

    #[test]
    fn empty_notes_render_as_none() {
        let mut w = Workflow::new_at("x", t(9, 0));
        let text = encode(&mut w);
        assert!(text.ends_with("## Notes\n(none)\n"));
        let back = decode(&text).expect("decode");
        assert!(back.notes.is_empty());
    }

    #[test]
    fn decode_reverses_encode() {
        let mut w = shaped();
        let text = encode(&mut w);
        assert_eq!(decode(&text).expect("decode"), w);
    }

    #[test]
    fn tricky_notes_survive_roundtrip() {
        let notes = [
            "plain",
            "has \"quotes\" inside",
            "trailing backslash \\",
            "C:\\path\\to\\file",
            "already \\\"escaped\\\"",
            "\"",
            "\\",
            "  padded  ",
            "note: looks like a key",
            "line one\nline two",
            "ok\nstate: oops",
            "crlf\r\nending",
            "literal \\n is not a newline",
            "backslash then newline \\\n",
        ];
        for note in notes {
            let mut w = Workflow::new_at("x", t(9, 0));
            w.transition_at(WorkflowState::Building, note, t(9, 1))
                .expect("thinking -> building");
            let back = decode(&encode(&mut w)).expect("decode");
            assert_eq!(back.history[1].note, note);
        }
    }

    #[test]
    fn multiline_note_stays_on_one_header_line() {
        let mut w = Workflow::new_at("x", t(9, 0));
        w.transition_at(WorkflowState::Building, "ok\nstate: oops", t(9, 1))
            .expect("thinking -> building");
        let text = encode(&mut w);
        assert!(text.contains("    note: \"ok\\nstate: oops\"\n"));

        let back = decode(&text).expect("decode");
        assert_eq!(back.state, WorkflowState::Building);
        assert_eq!(back, w);
    }

    #[test]
    fn indented_line_before_first_entry_is_a_top_level_key() {
        let text = "---\n\
                    state: shaping\n\
                    history:\n  \
                    schema_version: 3\n  \
                    - state: thinking\n    \
                    at: 2024-01-15T10:30:00Z\n\
                    ---\n";
        let w = decode(text).expect("decode");
        assert_eq!(w.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(w.history.len(), 1);
        assert_eq!(w.history[0].at, t(10, 30));
    }

    #[test]
    fn rejects_missing_opening_marker() {
        let err = decode("state: thinking\n").expect_err("no header");
        assert!(matches!(err, WorkflowError::MalformedDocument(_)));
        assert!(err.to_string().contains("missing front matter"));
    }

    #[test]
    fn rejects_missing_closing_marker() {
        let err = decode("---\nstate: thinking\n").expect_err("unterminated");
        assert!(matches!(err, WorkflowError::MalformedDocument(_)));
        assert!(err.to_string().contains("malformed front matter"));
    }

    #[test]
    fn rejects_unknown_state() {
        let err = decode("---\nstate: invalid\n---\n").expect_err("bad state");
        assert!(matches!(err, WorkflowError::InvalidState(_)));
    }

    #[test]
    fn rejects_missing_state() {
        let err = decode("---\nschema_version: 3\n---\n").expect_err("no state");
        assert!(matches!(err, WorkflowError::InvalidState(ref e) if e.got.is_empty()));
    }

    #[test]
    fn rejects_unknown_history_state() {
        let text = "---\nstate: thinking\nhistory:\n  - state: pondering\n    at: 2024-01-15T10:30:00Z\n---\n";
        let err = decode(text).expect_err("bad history state");
        assert!(matches!(err, WorkflowError::InvalidState(ref e) if e.got == "pondering"));
    }

    #[test]
    fn legacy_header_defaults() {
        let text = "---\nstate: building\n---\n\n# Intent\nOld\n\n## Notes\n(none)\n";
        let w = decode(text).expect("decode");
        assert_eq!(w.state, WorkflowState::Building);
        assert_eq!(w.schema_version, LEGACY_SCHEMA_VERSION);
        assert_eq!(w.started_at, None);
        assert!(w.history.is_empty());
        assert!(w.checksum.is_empty());
        assert_eq!(w.intent, "Old");
    }

    #[test]
    fn unparsable_scalars_fall_back() {
        let text = "---\nstate: thinking\nschema_version: three\nstarted_at: yesterday\n---\n";
        let w = decode(text).expect("decode");
        assert_eq!(w.schema_version, LEGACY_SCHEMA_VERSION);
        assert_eq!(w.started_at, None);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let text = "---\nstate: thinking\nowner: alice\nschema_version: 3\n---\n";
        let w = decode(text).expect("decode");
        assert_eq!(w.schema_version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn history_ends_at_dedent() {
        let text = "---\n\
                    state: shaping\n\
                    history:\n  \
                    - state: thinking\n    \
                    at: 2024-01-15T10:30:00Z\n\
                    schema_version: 3\n\
                    ---\n";
        let w = decode(text).expect("decode");
        assert_eq!(w.history.len(), 1);
        assert_eq!(w.history[0].at, t(10, 30));
        assert_eq!(w.schema_version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn history_entry_without_timestamp_uses_epoch() {
        let text = "---\nstate: thinking\nhistory:\n  - state: thinking\n---\n";
        let w = decode(text).expect("decode");
        assert_eq!(w.history[0].at, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn tab_indented_history_fields() {
        let text = "---\nstate: thinking\nhistory:\n\t- state: thinking\n\t\tat: 2024-01-15T10:30:00Z\n\t\tnote: \"tabbed\"\n---\n";
        let w = decode(text).expect("decode");
        assert_eq!(w.history[0].note, "tabbed");
        assert_eq!(w.history[0].at, t(10, 30));
    }

    #[test]
    fn intent_lines_are_joined_until_notes() {
        let text = "---\nstate: thinking\n---\n\n# Intent\n  first line  \n\nsecond line\n## Notes\n- a\nnot a bullet\n-  b\n";
        let w = decode(text).expect("decode");
        assert_eq!(w.intent, "first line second line");
        assert_eq!(w.notes, ["a", " b"]);
    }

    #[test]
    fn body_without_sections_is_empty() {
        let w = decode("---\nstate: thinking\n---\nfree text\n").expect("decode");
        assert!(w.intent.is_empty());
        assert!(w.notes.is_empty());
    }

    #[test]
    fn fractional_timestamps_are_truncated() {
        let text = "---\nstate: thinking\nstarted_at: 2024-01-15T10:30:00.750+00:00\n---\n";
        let w = decode(text).expect("decode");
        assert_eq!(w.started_at, Some(t(10, 30)));
    }
}
