use serde::{Deserialize, Serialize};

/// How the client must treat the text of a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Directive {
    /// Display as-is.
    #[default]
    Message,
    /// Display as a bare prompt (multi-step flows).
    Prompt,
    /// Clear the client display, then show the message.
    ClearLog,
    /// Display with chat formatting.
    Chat,
    /// Display the message, then close the connection.
    Disconnect,
    /// Acknowledges successful account creation.
    ServCreateAccount,
    LoginTrue,
    LoginFalse,
}

/// One framed message in either direction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Packet {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub directive: Directive,
}

impl Packet {
    pub fn new(message: impl Into<String>, directive: Directive) -> Self {
        Self {
            message: message.into(),
            directive,
        }
    }

    /// Plain `MESSAGE` packet.
    pub fn text(message: impl Into<String>) -> Self {
        Self::new(message, Directive::Message)
    }

    pub fn prompt(message: impl Into<String>) -> Self {
        Self::new(message, Directive::Prompt)
    }

    pub fn chat(message: impl Into<String>) -> Self {
        Self::new(message, Directive::Chat)
    }

    pub fn disconnect(message: impl Into<String>) -> Self {
        Self::new(message, Directive::Disconnect)
    }

    pub fn is_disconnect(&self) -> bool {
        self.directive == Directive::Disconnect
    }
}
