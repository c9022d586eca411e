use std::slice;

use serde::{Deserialize, Serialize};

/// The author of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking questions.
    User,
    /// The question-answering service.
    Assistant,
}

/// A single message in a conversation.
///
/// Messages are immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    /// Creates a message with the given role.
    #[inline]
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Returns the author of this message.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the text of this message.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// The ordered message history of one page.
///
/// Insertion order is conversation order. A transcript only grows by
/// appending; it is never edited in the middle. It serializes as a plain
/// array of messages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Creates an empty transcript.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message to the end of the transcript.
    #[inline]
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Returns the number of messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if the transcript has no messages.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the most recent message, if any.
    #[inline]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Returns the messages as a slice.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns an iterator over the messages in order.
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

impl From<Vec<Message>> for Transcript {
    #[inline]
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

impl FromIterator<Message> for Transcript {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = slice::Iter<'a, Message>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_transcript_wire_format() {
        let transcript = Transcript::from(vec![
            Message::assistant("Hi"),
            Message::user("What is this?"),
        ]);
        let value = serde_json::to_value(&transcript).unwrap();
        assert_eq!(
            value,
            json!([
                { "role": "assistant", "content": "Hi" },
                { "role": "user", "content": "What is this?" }
            ])
        );

        let parsed: Transcript = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, transcript);
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let result = serde_json::from_value::<Transcript>(json!([
            { "role": "system", "content": "nope" }
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_push_keeps_order() {
        let mut transcript = Transcript::new();
        assert!(transcript.is_empty());
        transcript.push(Message::user("first"));
        transcript.push(Message::assistant("second"));
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.messages()[0].content(), "first");
        assert_eq!(transcript.last().map(Message::role), Some(Role::Assistant));
    }
}
