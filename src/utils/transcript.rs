use crate::models::message::Message;

/// Renders messages as `role: content` lines in the order given.
/// An empty conversation yields an empty transcript.
pub fn assemble(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}
