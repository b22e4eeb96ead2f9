//! Append-only chat message records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mode tag stored on every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageMode {
    System,
    Local,
    Remote,
}

impl MessageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageMode::System => "system",
            MessageMode::Local => "local",
            MessageMode::Remote => "remote",
        }
    }
}

impl fmt::Display for MessageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who produced a message. Stored values are `User`, `Assistance` and `system`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Assistance,
    #[serde(rename = "system")]
    System,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "User",
            Sender::Assistance => "Assistance",
            Sender::System => "system",
        }
    }
}

impl FromStr for Sender {
    type Err = String;

    /// Accepts only the stored spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(Sender::User),
            "Assistance" => Ok(Sender::Assistance),
            "system" => Ok(Sender::System),
            other => Err(format!("unknown sender '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub ip: String,
    pub session_id: String,
    pub mode: MessageMode,
    pub sender: Sender,
    pub message: String,
    #[serde(with = "chrono::serde::ts_milliseconds", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl MessageRecord {
    pub fn new(
        ip: impl Into<String>,
        session_id: impl Into<String>,
        mode: MessageMode,
        sender: Sender,
        message: impl Into<String>,
    ) -> Self {
        Self {
            ip: ip.into(),
            session_id: session_id.into(),
            mode,
            sender,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}
