// # -----------------------------
// # crates/common/src/lib.rs
// # -----------------------------
// Shared configuration, wire types for the assistant backend, and the
// transcript records exchanged between the controllers and the TUI.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendCfg,
    #[serde(default)]
    pub ui: UiCfg,
    #[serde(default)]
    pub editor: EditorCfg,
    /// Directory holding sessions.json and the theme key.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

// Kept in sync with the serde field defaults by hand; a derived Default
// would leave state_dir empty.
impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendCfg::default(),
            ui: UiCfg::default(),
            editor: EditorCfg::default(),
            state_dir: default_state_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendCfg {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiCfg {
    pub theme: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorCfg {
    /// Milliseconds between streamed characters.
    pub stream_interval_ms: u64,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".codepal")
}

impl Default for BackendCfg {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
        }
    }
}

impl Default for UiCfg {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
        }
    }
}

impl Default for EditorCfg {
    fn default() -> Self {
        Self {
            stream_interval_ms: 5,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Missing or unparsable config is a soft failure: defaults win.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                if path.exists() {
                    tracing::warn!("config parse error in {}: {err}", path.display());
                }
                Self::default()
            }
        }
    }
}

// ---- wire types (§ backend HTTP endpoints) ----

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ChatResponse {
    #[serde(default)]
    pub response: String,
    pub error: Option<String>,
    pub action_data: Option<ActionData>,
    pub pending_action: Option<PendingAction>,
    #[serde(default)]
    pub needs_clarification: bool,
    #[serde(default)]
    pub mcp_logs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingAction {
    StreamToEditor,
    Delete,
    RunPython,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ActionData {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Human-readable change summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<String>,
    /// Character-paced delivery into the editor instead of a diff review.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmRequest {
    pub action: ConfirmVerdict,
    pub action_data: ActionData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmVerdict {
    Accept,
    Reject,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfirmResponse {
    #[serde(default)]
    pub success: bool,
    pub response: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileReadResponse {
    pub content: Option<String>,
    pub filename: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileWriteRequest {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct FileWriteResponse {
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct FileListing {
    #[serde(rename = "currentPath", default)]
    pub current_path: String,
    #[serde(rename = "parentPath")]
    pub parent_path: Option<String>,
    #[serde(default)]
    pub items: Vec<FileEntry>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "isDirectory")]
    pub is_directory: bool,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DrivesResponse {
    #[serde(default)]
    pub drives: Vec<DriveEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DriveEntry {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct McpToolsResponse {
    #[serde(default)]
    pub tools: Vec<McpTool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct McpTool {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

// ---- transcript records ----

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One conversation turn. Inline accept/reject affordances ride on the
/// message as a structured descriptor instead of rendered controls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mcp_logs: Vec<String>,
    pub timestamp_ms: u64,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            action: None,
            mcp_logs: Vec::new(),
            timestamp_ms: now_millis(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            action: None,
            mcp_logs: Vec::new(),
            timestamp_ms: now_millis(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub kind: ActionKind,
    pub data: ActionData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    CodeEdit,
    Delete,
    RunPython,
}

impl ActionDescriptor {
    /// Classifies a response's action payload. Delete/run_python may be
    /// signalled either by `pending_action` or by `action_data.type`.
    pub fn classify(pending: Option<&PendingAction>, data: &ActionData) -> Option<Self> {
        let kind = match (pending, data.kind.as_deref()) {
            (Some(PendingAction::Delete), _) | (_, Some("delete")) => ActionKind::Delete,
            (Some(PendingAction::RunPython), _) | (_, Some("run_python")) => ActionKind::RunPython,
            _ if data.code.is_some() => ActionKind::CodeEdit,
            _ => return None,
        };
        Some(Self {
            kind,
            data: data.clone(),
        })
    }
}

// ---- notices (the toast analogue) ----

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
