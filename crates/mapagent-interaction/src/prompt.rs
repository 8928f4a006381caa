//! Prompt flattening and reply extraction.
//!
//! The pipeline has no notion of turns, so the whole transcript is flattened
//! into one string per call. Its reply has to be picked back out of the
//! pipeline's own message list afterwards.

use mapagent_core::{Message, PipelineMessage};

/// Placed between the flattened history and the new input.
pub const PROMPT_SEPARATOR: &str = " Human: ";

/// Pipeline role whose messages carry the reply back to the user.
const REPLY_ROLE: &str = "user";

/// Renders every message as `"<Role>: <content>"`, each followed by a blank
/// line, in transcript order.
pub fn format_history(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|msg| format!("{}: {}\n\n", msg.role.transcript_label(), msg.content))
        .collect()
}

/// Builds the single prompt string handed to the pipeline.
///
/// `history` must not contain the message for `input` itself.
pub fn build_prompt(history: &[Message], input: &str) -> String {
    format!("{}{}{}", format_history(history), PROMPT_SEPARATOR, input)
}

/// Picks the assistant reply out of the pipeline's message list.
///
/// The reply is the first `"user"`-role message with non-empty content that
/// is neither the flattened prompt nor the raw input echoed back. `None`
/// means the turn produced no reply, which is not an error.
pub fn extract_reply(messages: &[PipelineMessage], prompt: &str, input: &str) -> Option<String> {
    messages
        .iter()
        .filter(|msg| msg.role == REPLY_ROLE)
        .filter_map(|msg| msg.content.as_deref())
        .find(|content| !content.is_empty() && *content != prompt && *content != input)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript() -> Vec<Message> {
        vec![
            Message::user("add a marker at 10,20"),
            Message::assistant("Marker added."),
        ]
    }

    #[test]
    fn test_format_history_preserves_roles_and_order() {
        assert_eq!(
            format_history(&transcript()),
            "Human: add a marker at 10,20\n\nAssistant: Marker added.\n\n"
        );
        assert_eq!(format_history(&[]), "");
    }

    #[test]
    fn test_build_prompt_appends_input_once() {
        let prompt = build_prompt(&transcript(), "zoom in");
        assert_eq!(
            prompt,
            "Human: add a marker at 10,20\n\nAssistant: Marker added.\n\n Human: zoom in"
        );
        assert_eq!(prompt.matches("zoom in").count(), 1);
        assert_eq!(prompt.matches("add a marker at 10,20").count(), 1);
    }

    #[test]
    fn test_extract_reply_skips_echoes_and_empty_content() {
        let prompt = build_prompt(&[], "hello");
        let messages = vec![
            PipelineMessage::new("assistant", prompt.clone()),
            PipelineMessage::new("user", prompt.clone()),
            PipelineMessage::new("user", "hello"),
            PipelineMessage::empty("user"),
            PipelineMessage::new("user", ""),
            PipelineMessage::new("tool", "marker added"),
            PipelineMessage::new("user", "Hi! What should I show on the map?"),
            PipelineMessage::new("user", "a later reply"),
        ];

        assert_eq!(
            extract_reply(&messages, &prompt, "hello").as_deref(),
            Some("Hi! What should I show on the map?")
        );
    }

    #[test]
    fn test_extract_reply_none_when_nothing_qualifies() {
        let messages = vec![
            PipelineMessage::new("assistant", "thinking"),
            PipelineMessage::empty("user"),
        ];
        assert!(extract_reply(&messages, "p", "p").is_none());
        assert!(extract_reply(&[], "p", "p").is_none());
    }
}
