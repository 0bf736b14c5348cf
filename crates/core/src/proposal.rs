// Proposal lifecycle and chat orchestration. One proposal is live at a
// time; a newer one silently replaces it. Acceptance applies the code to
// the editor buffer even when the backend confirmation fails — the local
// apply is optimistic and never rolled back.

use std::sync::Arc;

use codepal_api::BackendApi;
use codepal_common::{
    now_millis, ActionData, ActionDescriptor, ActionKind, ChatMessage, ChatRequest,
    ConfirmRequest, ConfirmVerdict, Notice, PendingAction,
};

use crate::diff::{diff_lines, DiffRow};
use crate::editor::{CodeStream, EditorController, StreamStep};
use crate::session::SessionStore;

#[derive(Debug, Clone)]
pub struct PendingProposal {
    pub target_path: Option<String>,
    pub original_code: String,
    pub new_code: String,
    pub summary: String,
}

pub enum ProposalState {
    Idle,
    /// Character-paced delivery into the editor; no review while active.
    Streaming { stream: CodeStream },
    /// Diff on display, waiting for the user's verdict.
    DiffPresented {
        proposal: PendingProposal,
        rows: Vec<DiffRow>,
    },
}

impl ProposalState {
    pub fn is_idle(&self) -> bool {
        matches!(self, ProposalState::Idle)
    }
}

pub struct ChatController {
    api: Arc<dyn BackendApi>,
    pub editor: EditorController,
    pub transcript: Vec<ChatMessage>,
    pub session_id: String,
    pub store: SessionStore,
    pub proposal: ProposalState,
    /// A chat exchange is in flight; submissions are ignored meanwhile.
    pub busy: bool,
    notices: Vec<Notice>,
}

impl ChatController {
    pub fn new(api: Arc<dyn BackendApi>, store: SessionStore) -> Self {
        Self {
            editor: EditorController::new(api.clone()),
            api,
            transcript: Vec::new(),
            session_id: now_millis().to_string(),
            store,
            proposal: ProposalState::Idle,
            busy: false,
            notices: Vec::new(),
        }
    }

    /// Drains queued notices for rendering.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Sends one user message and dispatches the response. Empty input or
    /// an in-flight exchange is silently skipped.
    pub async fn submit(&mut self, text: &str) {
        let message = text.trim();
        if message.is_empty() || self.busy {
            return;
        }
        self.busy = true;
        self.transcript.push(ChatMessage::user(message));

        let req = ChatRequest {
            message: message.to_string(),
            file_content: (!self.editor.buffer.content().is_empty())
                .then(|| self.editor.buffer.content().to_string()),
            file_path: self.editor.buffer.path.clone(),
        };
        let result = self.api.chat(req).await;
        self.busy = false;

        let resp = match result {
            Ok(resp) => resp,
            Err(err) => {
                self.transcript
                    .push(ChatMessage::assistant("Error: connection failed. Please try again."));
                self.notify(Notice::error(format!("Connection error: {err}")));
                return;
            }
        };
        if let Some(err) = resp.error {
            self.transcript
                .push(ChatMessage::assistant(format!("Error: {err}")));
            self.notify(Notice::error(err));
            return;
        }

        let action = resp
            .action_data
            .as_ref()
            .and_then(|data| ActionDescriptor::classify(resp.pending_action.as_ref(), data));
        let mut msg = ChatMessage::assistant(resp.response);
        msg.action = action;
        msg.mcp_logs = resp.mcp_logs;
        self.transcript.push(msg);

        if resp.needs_clarification {
            self.notify(Notice::info("Agent needs clarification"));
        }

        match resp.pending_action {
            Some(PendingAction::StreamToEditor) => {
                if let Some(data) = resp.action_data {
                    if data.code.is_some() {
                        if self.editor.synced {
                            self.open_proposal(&data).await;
                        } else {
                            self.notify(Notice::info(
                                "Editor disconnected - changes shown in chat only",
                            ));
                        }
                    }
                }
            }
            Some(PendingAction::Delete) => {
                self.notify(Notice::warning("Accept to confirm deletion"));
            }
            Some(PendingAction::RunPython) => {
                self.notify(Notice::warning("Accept to run the Python code"));
            }
            _ => {}
        }

        self.save_session();
    }

    /// Turns a code action into a live proposal: loads the target file
    /// first when it differs from the open one, then either streams or
    /// presents the diff. Replaces any pending proposal silently.
    async fn open_proposal(&mut self, data: &ActionData) {
        let code = data.code.clone().unwrap_or_default();
        if let Some(path) = &data.path {
            if self.editor.buffer.path.as_deref() != Some(path.as_str()) {
                match self.editor.load(path).await {
                    Ok(filename) => self.notify(Notice::success(format!("Opened {filename}"))),
                    Err(err) => {
                        self.notify(Notice::error(format!("Could not open {path}: {err}")));
                        return;
                    }
                }
            }
        }

        if data.stream {
            self.editor.buffer.begin_stream();
            self.proposal = ProposalState::Streaming {
                stream: CodeStream::new(&code),
            };
        } else {
            let original_code = self.editor.buffer.content().to_string();
            let rows = diff_lines(&original_code, &code);
            self.proposal = ProposalState::DiffPresented {
                proposal: PendingProposal {
                    target_path: data.path.clone().or_else(|| self.editor.buffer.path.clone()),
                    original_code,
                    new_code: code,
                    summary: data
                        .changes
                        .clone()
                        .unwrap_or_else(|| "Code changes".to_string()),
                },
                rows,
            };
        }
    }

    /// Advances an active stream by one character. Returns false when no
    /// stream is running.
    pub fn tick_stream(&mut self) -> bool {
        let step = match &mut self.proposal {
            ProposalState::Streaming { stream } => Some(stream.step(&mut self.editor.buffer)),
            _ => None,
        };
        match step {
            Some(StreamStep::Done) => {
                self.proposal = ProposalState::Idle;
                self.notify(Notice::success("Code streamed to editor"));
                true
            }
            Some(StreamStep::Appended { .. }) => true,
            None => false,
        }
    }

    /// Accepts the presented diff. The buffer takes the candidate code and
    /// stays modified whatever the confirmation call returns.
    pub async fn accept(&mut self) {
        if !matches!(self.proposal, ProposalState::DiffPresented { .. }) {
            return;
        }
        let ProposalState::DiffPresented { proposal, .. } =
            std::mem::replace(&mut self.proposal, ProposalState::Idle)
        else {
            return;
        };

        let req = ConfirmRequest {
            action: ConfirmVerdict::Accept,
            action_data: ActionData {
                path: proposal.target_path.clone(),
                code: Some(proposal.new_code.clone()),
                ..Default::default()
            },
        };
        let confirm = self.api.confirm(req).await;

        self.editor.apply_proposal(&proposal.new_code);
        self.transcript.push(ChatMessage::assistant(
            "Changes applied to editor. Save to write to file.",
        ));
        self.save_session();

        match confirm {
            Ok(_) => self.notify(Notice::success("Changes applied to editor")),
            Err(err) => {
                tracing::warn!("accept confirmation failed: {err}");
                self.notify(Notice::success(
                    "Changes applied to editor (confirmation not delivered)",
                ));
            }
        }
    }

    /// Rejects the presented diff: best-effort confirmation, buffer
    /// untouched.
    pub async fn reject(&mut self) {
        if !matches!(self.proposal, ProposalState::DiffPresented { .. }) {
            return;
        }
        self.proposal = ProposalState::Idle;
        let req = ConfirmRequest {
            action: ConfirmVerdict::Reject,
            action_data: ActionData::default(),
        };
        if let Err(err) = self.api.confirm(req).await {
            tracing::warn!("reject confirmation failed: {err}");
        }
        self.notify(Notice::info("Changes rejected"));
    }

    /// Closes the diff view without a verdict; nothing is sent.
    pub fn dismiss(&mut self) {
        if matches!(self.proposal, ProposalState::DiffPresented { .. }) {
            self.proposal = ProposalState::Idle;
        }
    }

    /// Inline accept/reject for a message-attached action. Delete and
    /// run_python bypass the diff path entirely; their outcome lands in
    /// the transcript, never in the editor.
    pub async fn confirm_action(&mut self, message_idx: usize, verdict: ConfirmVerdict) {
        let Some(descriptor) = self
            .transcript
            .get(message_idx)
            .and_then(|m| m.action.clone())
        else {
            return;
        };

        match descriptor.kind {
            ActionKind::CodeEdit => {
                if verdict == ConfirmVerdict::Accept {
                    if self.editor.synced {
                        self.open_proposal(&descriptor.data).await;
                    } else {
                        self.notify(Notice::info(
                            "Editor disconnected - changes shown in chat only",
                        ));
                    }
                } else {
                    self.notify(Notice::info("Action rejected"));
                }
            }
            ActionKind::Delete | ActionKind::RunPython => {
                if verdict == ConfirmVerdict::Reject {
                    self.notify(Notice::info("Action rejected"));
                    return;
                }
                let req = ConfirmRequest {
                    action: ConfirmVerdict::Accept,
                    action_data: descriptor.data.clone(),
                };
                match self.api.confirm(req).await {
                    Ok(resp) if resp.success => {
                        let fallback = match descriptor.kind {
                            ActionKind::Delete => "File deleted successfully.",
                            _ => "Code executed.",
                        };
                        let text = resp.response.unwrap_or_else(|| fallback.to_string());
                        self.transcript.push(ChatMessage::assistant(text));
                        self.notify(Notice::success(
                            resp.message.unwrap_or_else(|| "Done".to_string()),
                        ));
                        self.save_session();
                    }
                    Ok(resp) => {
                        let err = resp.error.unwrap_or_else(|| "Action failed".to_string());
                        self.transcript
                            .push(ChatMessage::assistant(format!("Error: {err}")));
                        self.notify(Notice::error(err));
                    }
                    Err(err) => {
                        self.notify(Notice::error(format!("Error: {err}")));
                    }
                }
            }
        }
    }

    pub fn save_session(&mut self) {
        if let Err(err) = self.store.save(&self.session_id, &self.transcript) {
            tracing::warn!("session save failed: {err}");
        }
    }

    /// Saves the outgoing transcript, then starts an empty session.
    pub fn new_session(&mut self) {
        self.save_session();
        self.transcript.clear();
        self.session_id = fresh_session_id(&self.session_id);
        self.notify(Notice::success("New chat started"));
    }

    /// Save-then-load convention: the outgoing session is always
    /// persisted before the target replaces the transcript.
    pub fn switch_session(&mut self, id: &str) -> bool {
        self.save_session();
        match self.store.load(id) {
            Some(messages) => {
                self.session_id = id.to_string();
                self.transcript = messages;
                true
            }
            None => false,
        }
    }

    /// Clears the visible transcript without persisting the wipe.
    pub fn clear_transcript(&mut self) {
        self.transcript.clear();
    }

    pub fn api(&self) -> &Arc<dyn BackendApi> {
        &self.api
    }
}

fn fresh_session_id(previous: &str) -> String {
    let mut id = now_millis();
    if id.to_string() == previous {
        id += 1;
    }
    id.to_string()
}
