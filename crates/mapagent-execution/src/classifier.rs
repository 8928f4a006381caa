//! Classification of raw pipeline diagnostics into structured trace events.
//!
//! The pipeline's only record of which tool ran and what it returned is its
//! semi-structured log output. Three marker families are recognised; every
//! other line is dropped without error.
//!
//! Rules, first match wins, applied after colour escapes are stripped:
//!
//! 1. `>>>>>>>> EXECUTING FUNCTION <name>...` → `FunctionCallStarted`
//! 2. `... Response from calling function ... ***** <response> *****` → `FunctionCallResult`
//! 3. `<assistant> (to <proxy>): <text>` → `AssistantUtterance`, unless the
//!    remainder is tool-call metadata starting with `*****`

use mapagent_core::{SessionConfig, TraceEvent};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

pub const EXECUTING_FUNCTION_MARKER: &str = ">>>>>>>> EXECUTING FUNCTION";
pub const RESPONSE_MARKER: &str = "Response from calling function";
const RESPONSE_FROM_CALLING: &str = "Response from calling";
const SUGGESTED_CALL_MARKER: &str = "Suggested function call";
const SEGMENT_DELIMITER: &str = "*****";
const NAME_TERMINATOR: &str = "...";

// Real SGR sequences, plus the bare `[32m` / `[0m` fragments left behind when
// the escape byte itself was already eaten by an intermediate writer.
static COLOR_ESCAPES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*m|\[(?:32|0)m").expect("color escape pattern"));

/// Removes terminal colour escapes from a diagnostic line.
pub fn strip_color_escapes(line: &str) -> Cow<'_, str> {
    COLOR_ESCAPES.replace_all(line, "")
}

/// Pure line classifier.
///
/// Holds only the assistant speaker prefix; classification never depends on
/// earlier lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceClassifier {
    speaker_prefix: String,
}

impl Default for TraceClassifier {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

impl TraceClassifier {
    /// Creates a classifier for `"<assistant_name> (to <proxy_name>):"` lines.
    pub fn new(assistant_name: &str, proxy_name: &str) -> Self {
        Self {
            speaker_prefix: format!("{} (to {}):", assistant_name, proxy_name),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            speaker_prefix: config.speaker_prefix(),
        }
    }

    pub fn speaker_prefix(&self) -> &str {
        &self.speaker_prefix
    }

    /// Classifies one raw line into at most one event.
    ///
    /// A speaker-prefixed line with nothing after the prefix yields no
    /// event rather than an empty `AssistantUtterance`; the pipeline prints
    /// such bare headers before every tool-call block.
    pub fn classify_line(&self, raw: &str) -> Option<TraceEvent> {
        let line = strip_color_escapes(raw);
        let line = line.as_ref();

        if let Some(start) = line.find(EXECUTING_FUNCTION_MARKER) {
            let rest = &line[start + EXECUTING_FUNCTION_MARKER.len()..];
            let name = rest.split(NAME_TERMINATOR).next().unwrap_or(rest).trim();
            return Some(TraceEvent::FunctionCallStarted {
                name: name.to_string(),
            });
        }

        if line.contains(RESPONSE_MARKER) {
            return Some(TraceEvent::FunctionCallResult {
                response_text: extract_response(line).to_string(),
            });
        }

        if line.contains(&self.speaker_prefix)
            && !line.contains(SUGGESTED_CALL_MARKER)
            && !line.contains(RESPONSE_FROM_CALLING)
        {
            let remainder = line.replace(&self.speaker_prefix, "");
            let text = remainder.trim();
            if text.is_empty() || text.starts_with(SEGMENT_DELIMITER) {
                return None;
            }
            return Some(TraceEvent::AssistantUtterance {
                text: text.to_string(),
            });
        }

        None
    }

    /// Classifies a turn's lines in order, dropping unrecognised ones.
    pub fn classify_lines<I, S>(&self, lines: I) -> Vec<TraceEvent>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .filter_map(|line| self.classify_line(line.as_ref()))
            .collect()
    }
}

/// Picks the response body out of a `Response from calling function` line.
///
/// The body is the first non-blank `*****`-delimited segment after the one
/// holding the response header. Without such a segment the second segment is
/// used, and a line with no delimiter at all is taken whole.
fn extract_response(line: &str) -> &str {
    let segments: Vec<&str> = line.split(SEGMENT_DELIMITER).collect();
    if segments.len() < 2 {
        return line.trim();
    }

    let body = segments
        .iter()
        .position(|segment| segment.contains(RESPONSE_MARKER))
        .and_then(|header| {
            segments[header + 1..]
                .iter()
                .map(|segment| segment.trim())
                .find(|segment| !segment.is_empty())
        });

    body.unwrap_or_else(|| segments[1].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> TraceClassifier {
        TraceClassifier::default()
    }

    #[test]
    fn test_reference_turn_classifies_in_order() {
        let lines = [
            ">>>>>>>> EXECUTING FUNCTION add_marker...",
            "map_assistant (to user_proxy): ***** Response from calling function 'add_marker' ***** marker added *****",
            "map_assistant (to user_proxy): Done! I added a marker at (1,2).",
        ];

        let events = classifier().classify_lines(lines);

        assert_eq!(
            events,
            vec![
                TraceEvent::FunctionCallStarted {
                    name: "add_marker".to_string()
                },
                TraceEvent::FunctionCallResult {
                    response_text: "marker added".to_string()
                },
                TraceEvent::AssistantUtterance {
                    text: "Done! I added a marker at (1,2).".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_strips_color_escapes_before_matching() {
        let event = classifier()
            .classify_line("\x1b[32m>>>>>>>> EXECUTING FUNCTION set_zoom...\x1b[0m")
            .unwrap();
        assert_eq!(
            event,
            TraceEvent::FunctionCallStarted {
                name: "set_zoom".to_string()
            }
        );

        let event = classifier()
            .classify_line("[32m>>>>>>>> EXECUTING FUNCTION pan_map...[0m")
            .unwrap();
        assert_eq!(
            event,
            TraceEvent::FunctionCallStarted {
                name: "pan_map".to_string()
            }
        );
    }

    #[test]
    fn test_function_name_without_terminator_takes_rest_of_line() {
        let event = classifier()
            .classify_line(">>>>>>>> EXECUTING FUNCTION  query_flood_db ")
            .unwrap();
        assert_eq!(
            event,
            TraceEvent::FunctionCallStarted {
                name: "query_flood_db".to_string()
            }
        );
    }

    #[test]
    fn test_response_body_after_header_segment() {
        let event = classifier()
            .classify_line("Response from calling function get_weather ***** sunny, 21C")
            .unwrap();
        assert_eq!(
            event,
            TraceEvent::FunctionCallResult {
                response_text: "sunny, 21C".to_string()
            }
        );
    }

    #[test]
    fn test_response_header_only_falls_back_to_second_segment() {
        let event = classifier()
            .classify_line("***** Response from calling function 'add_marker' *****")
            .unwrap();
        assert_eq!(
            event,
            TraceEvent::FunctionCallResult {
                response_text: "Response from calling function 'add_marker'".to_string()
            }
        );
    }

    #[test]
    fn test_response_without_delimiter_uses_whole_line() {
        let event = classifier()
            .classify_line("  Response from calling function: ok  ")
            .unwrap();
        assert_eq!(
            event,
            TraceEvent::FunctionCallResult {
                response_text: "Response from calling function: ok".to_string()
            }
        );
    }

    #[test]
    fn test_assistant_metadata_lines_are_dropped() {
        let c = classifier();
        assert!(
            c.classify_line("map_assistant (to user_proxy): ***** Suggested function call: add_marker *****")
                .is_none()
        );
        assert!(c.classify_line("map_assistant (to user_proxy): ***** tool output *****").is_none());
        assert!(c.classify_line("map_assistant (to user_proxy):").is_none());
    }

    #[test]
    fn test_unrecognised_lines_are_dropped() {
        let c = classifier();
        assert!(c.classify_line("").is_none());
        assert!(c.classify_line("user_proxy (to map_assistant):").is_none());
        assert!(c.classify_line("--------------------------------").is_none());
        assert!(c.classify_lines(["noise", "more noise"]).is_empty());
    }

    #[test]
    fn test_custom_speaker_prefix() {
        let c = TraceClassifier::new("geo_bot", "operator");
        assert_eq!(c.speaker_prefix(), "geo_bot (to operator):");
        assert_eq!(
            c.classify_line("geo_bot (to operator): Zoomed in."),
            Some(TraceEvent::AssistantUtterance {
                text: "Zoomed in.".to_string()
            })
        );
        assert!(c.classify_line("map_assistant (to user_proxy): hi").is_none());
    }

    #[test]
    fn test_classification_is_referentially_transparent() {
        let c = classifier();
        let lines = [
            ">>>>>>>> EXECUTING FUNCTION a...",
            "Response from calling function ***** x *****",
            "map_assistant (to user_proxy): hello",
            "irrelevant",
        ];
        for line in lines {
            assert_eq!(c.classify_line(line), c.classify_line(line));
        }
    }
}
