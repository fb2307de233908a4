use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Metadata attached to an assistant reply.
///
/// The named fields are the ones the client reads back; anything else the
/// server sends in its `metadata` object lands in `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MessageMetadata {
    pub fn with_status<S: Into<String>>(status: S) -> Self {
        Self {
            status: Some(status.into()),
            ..Default::default()
        }
    }

    /// Overlay `other` onto this metadata. Later keys win.
    pub fn merge(&mut self, other: &Map<String, Value>) {
        for (key, value) in other {
            match key.as_str() {
                "model" => self.model = Some(value_as_string(value)),
                "status" => self.status = Some(value_as_string(value)),
                "tools_used" => self.tools_used = Some(tools_as_string(value)),
                "message_id" => self.message_id = Some(value_as_string(value)),
                "citations" => self.citations = Some(value.clone()),
                _ => {
                    self.extra.insert(key.clone(), value.clone());
                }
            }
        }
    }

    pub fn is_error(&self) -> bool {
        self.status.as_deref() == Some("error")
    }
}

fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Tool lists are stored comma-joined; arrays from the server are joined the same way.
fn tools_as_string(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(value_as_string)
            .collect::<Vec<_>>()
            .join(","),
        other => value_as_string(other),
    }
}

/// A source document the agent cited in its reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub s3_uri: Option<String>,
    #[serde(default)]
    pub relevance_score: Option<Value>,
}

impl Citation {
    pub fn source_name(&self) -> &str {
        self.source.as_deref().unwrap_or("Unknown")
    }

    /// Relevance may arrive as a number or as a numeric string.
    pub fn relevance(&self) -> Option<f64> {
        match self.relevance_score.as_ref()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// A single entry in the visible conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl Message {
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Assistant, content)
    }

    fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Message {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn is_error(&self) -> bool {
        self.metadata.as_ref().is_some_and(MessageMetadata::is_error)
    }

    /// Identifier used as the run id when submitting feedback.
    pub fn message_id(&self) -> String {
        if let Some(id) = self
            .metadata
            .as_ref()
            .and_then(|metadata| metadata.message_id.clone())
        {
            return id;
        }
        let prefix: String = self.content.chars().take(10).collect();
        format!("{}_{}", self.timestamp.timestamp_millis(), prefix)
    }

    pub fn tools(&self) -> Vec<&str> {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.tools_used.as_deref())
            .map(|tools| {
                tools
                    .split(',')
                    .map(str::trim)
                    .filter(|tool| !tool.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Citations may be stored either as a JSON array or as a string holding one.
    /// Anything malformed yields no citations.
    pub fn citations(&self) -> Vec<Citation> {
        let Some(raw) = self
            .metadata
            .as_ref()
            .and_then(|metadata| metadata.citations.as_ref())
        else {
            return Vec::new();
        };

        let parsed = match raw {
            Value::String(s) => serde_json::from_str::<Vec<Citation>>(s),
            other => serde_json::from_value::<Vec<Citation>>(other.clone()),
        };
        parsed.unwrap_or_default()
    }

    /// Pretty-printed metadata for the details view.
    pub fn details(&self) -> String {
        match &self.metadata {
            Some(metadata) => {
                serde_json::to_string_pretty(metadata).unwrap_or_else(|_| "{}".to_string())
            }
            None => "{}".to_string(),
        }
    }
}
