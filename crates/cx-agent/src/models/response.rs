use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

/// The reply handed back to the chat view, whichever backend produced it.
///
/// Raw upstream bodies pass through this type unchanged: unknown keys are kept
/// in `extra` and unset fields are omitted when serialized again.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_used: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiResponse {
    pub fn success<S: Into<String>>(text: S) -> Self {
        Self {
            response: Some(text.into()),
            status: Some(STATUS_SUCCESS.to_string()),
            tools_used: Some(Vec::new()),
            ..Default::default()
        }
    }

    pub fn error<S: Into<String>>(text: S) -> Self {
        Self {
            response: Some(text.into()),
            status: Some(STATUS_ERROR.to_string()),
            tools_used: Some(Vec::new()),
            ..Default::default()
        }
    }

    /// Reply text: `response`, then `message`, then empty.
    pub fn text(&self) -> &str {
        self.response
            .as_deref()
            .or(self.message.as_deref())
            .unwrap_or_default()
    }

    pub fn tools(&self) -> &[String] {
        self.tools_used.as_deref().unwrap_or_default()
    }

    pub fn is_error(&self) -> bool {
        self.status.as_deref() == Some(STATUS_ERROR)
    }
}

impl ApiResponse {
    /// Read a body that is already in the client-facing shape.
    ///
    /// Known keys are taken only when they have the expected type; every other
    /// key stays in `extra`, so the body serializes back unchanged. A bare JSON
    /// string becomes the reply text.
    pub fn from_raw(body: Value) -> Self {
        match body {
            Value::Object(map) => Self::from_object(map),
            Value::String(text) => Self {
                response: Some(text),
                ..Default::default()
            },
            _ => Self::default(),
        }
    }

    fn from_object(map: Map<String, Value>) -> Self {
        let text = |key: &str| map.get(key).and_then(Value::as_str).map(String::from);
        let response = text("response");
        let message = text("message");
        let status = text("status");
        let metadata = map.get("metadata").and_then(Value::as_object).cloned();
        let tools_used = map
            .get("tools_used")
            .and_then(Value::as_array)
            .filter(|items| items.iter().all(Value::is_string))
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect::<Vec<_>>()
            });

        let mut extra = map;
        let taken = [
            ("response", response.is_some()),
            ("message", message.is_some()),
            ("status", status.is_some()),
            ("metadata", metadata.is_some()),
            ("tools_used", tools_used.is_some()),
        ];
        for (key, present) in taken {
            if present {
                extra.remove(key);
            }
        }

        Self {
            response,
            message,
            status,
            tools_used,
            metadata,
            extra,
        }
    }
}

/// Contents of the `output` wrapper the invocation endpoints reply with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputPayload {
    pub message: Option<String>,
    pub metadata: Option<Map<String, Value>>,
    pub tools_used: Option<Vec<String>>,
}

impl OutputPayload {
    /// Fields of the wrong type are dropped rather than failing the reply.
    fn from_map(output: &Map<String, Value>) -> Self {
        Self {
            message: output.get("message").and_then(value_text),
            metadata: output.get("metadata").and_then(Value::as_object).cloned(),
            tools_used: output.get("tools_used").map(tool_names),
        }
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn tool_names(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(value_text).collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|tool| !tool.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

/// The two body shapes the conversation endpoint is known to return.
///
/// A body is `Wrapped` exactly when it is an object with an `output` object;
/// anything else, including non-object JSON, is kept verbatim as `Raw`.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamReply {
    Wrapped(OutputPayload),
    Raw(Value),
}

impl From<Value> for UpstreamReply {
    fn from(body: Value) -> Self {
        match body.get("output") {
            Some(Value::Object(output)) => UpstreamReply::Wrapped(OutputPayload::from_map(output)),
            _ => UpstreamReply::Raw(body),
        }
    }
}

impl<'de> Deserialize<'de> for UpstreamReply {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(UpstreamReply::from)
    }
}

impl UpstreamReply {
    pub fn normalize(self) -> ApiResponse {
        match self {
            UpstreamReply::Wrapped(output) => ApiResponse {
                response: Some(output.message.unwrap_or_default()),
                metadata: Some(output.metadata.unwrap_or_default()),
                tools_used: Some(output.tools_used.unwrap_or_default()),
                ..Default::default()
            },
            UpstreamReply::Raw(body) => ApiResponse::from_raw(body),
        }
    }
}

impl From<UpstreamReply> for ApiResponse {
    fn from(reply: UpstreamReply) -> Self {
        reply.normalize()
    }
}

/// Body of a successful agent runtime invocation. Tool usage is not surfaced.
#[derive(Debug, Clone, Default)]
pub struct AgentRuntimeReply {
    pub output: Option<OutputPayload>,
}

impl<'de> Deserialize<'de> for AgentRuntimeReply {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let output = match UpstreamReply::deserialize(deserializer)? {
            UpstreamReply::Wrapped(output) => Some(output),
            UpstreamReply::Raw(_) => None,
        };
        Ok(Self { output })
    }
}

impl AgentRuntimeReply {
    pub fn into_response(self) -> ApiResponse {
        let text = self
            .output
            .and_then(|output| output.message)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| "No response".to_string());
        ApiResponse::success(text)
    }
}
