// Editor buffer and sync controller. The buffer is the single source of
// truth for what the user sees; `modified` is derived from the baseline,
// never stored. Sync mode gates whether proposals may touch the buffer.

use std::sync::Arc;

use codepal_api::{ApiResult, BackendApi};

/// Derived metadata shown in the editor footer. Cached so the streaming
/// loop can refresh it every 10 characters instead of per character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditorInfo {
    pub lines: usize,
    pub chars: usize,
}

#[derive(Debug, Default)]
pub struct EditorBuffer {
    pub path: Option<String>,
    content: String,
    baseline: String,
    info: EditorInfo,
}

impl EditorBuffer {
    pub fn new() -> Self {
        let mut buf = Self::default();
        buf.refresh_info();
        buf
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// True whenever the buffer diverges from the last loaded or saved
    /// content.
    pub fn modified(&self) -> bool {
        self.content != self.baseline
    }

    pub fn info(&self) -> EditorInfo {
        self.info
    }

    pub fn refresh_info(&mut self) {
        self.info = EditorInfo {
            lines: self.content.split('\n').count(),
            chars: self.content.chars().count(),
        };
    }

    /// User edit: replaces content, keeps the baseline.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.refresh_info();
    }

    /// Successful load: content and baseline move together.
    fn apply_load(&mut self, path: &str, content: String) {
        self.path = Some(path.to_string());
        self.content = content;
        self.baseline = self.content.clone();
        self.refresh_info();
    }

    /// Successful save: the buffer becomes the new clean state.
    fn mark_saved(&mut self) {
        self.baseline = self.content.clone();
    }

    /// Empties the buffer before a stream re-fills it; the baseline keeps
    /// the pre-stream content so the result reads as modified.
    pub fn begin_stream(&mut self) {
        self.content.clear();
        self.refresh_info();
    }

    fn push_char(&mut self, ch: char) {
        self.content.push(ch);
    }

    fn reset(&mut self) {
        self.path = None;
        self.content.clear();
        self.baseline.clear();
        self.refresh_info();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    /// The buffer is modified and the caller has not confirmed.
    NeedsConfirm,
    Cleared,
}

pub struct EditorController {
    pub buffer: EditorBuffer,
    /// Connected: proposals may auto-populate the buffer. Disconnected:
    /// proposals stay chat-only.
    pub synced: bool,
    api: Arc<dyn BackendApi>,
}

impl EditorController {
    pub fn new(api: Arc<dyn BackendApi>) -> Self {
        Self {
            buffer: EditorBuffer::new(),
            synced: true,
            api,
        }
    }

    /// Loads a file into the buffer. On failure the buffer is untouched
    /// and the error is returned for the caller to surface.
    pub async fn load(&mut self, path: &str) -> ApiResult<String> {
        let file = self.api.read_file(path).await?;
        self.buffer.apply_load(path, file.content);
        tracing::debug!("loaded {} into editor", path);
        Ok(file.filename)
    }

    /// Writes the buffer back. Skipped (Ok(false)) when unmodified or
    /// path-less; on failure the buffer stays modified — no retry.
    pub async fn save(&mut self) -> ApiResult<bool> {
        let Some(path) = self.buffer.path.clone() else {
            return Ok(false);
        };
        if !self.buffer.modified() {
            return Ok(false);
        }
        self.api.write_file(&path, self.buffer.content()).await?;
        self.buffer.mark_saved();
        tracing::debug!("saved {}", path);
        Ok(true)
    }

    pub fn clear(&mut self, confirmed: bool) -> ClearOutcome {
        if self.buffer.modified() && !confirmed {
            return ClearOutcome::NeedsConfirm;
        }
        self.buffer.reset();
        ClearOutcome::Cleared
    }

    /// Advisory only: affects future proposals, never a pending one.
    pub fn toggle_sync(&mut self) -> bool {
        self.synced = !self.synced;
        self.synced
    }

    /// Optimistic application of accepted proposal code: content changes,
    /// baseline does not, so the buffer reads as modified until saved.
    pub fn apply_proposal(&mut self, code: &str) {
        self.buffer.content = code.to_string();
        self.buffer.refresh_info();
    }
}

/// Finite character-paced delivery of proposal code into the buffer.
/// Dropping it mid-way cancels: appended characters stay, no rollback.
#[derive(Debug)]
pub struct CodeStream {
    chars: Vec<char>,
    index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStep {
    Appended { refreshed: bool },
    Done,
}

impl CodeStream {
    pub fn new(code: &str) -> Self {
        Self {
            chars: code.chars().collect(),
            index: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.chars.len() - self.index
    }

    pub fn is_done(&self) -> bool {
        self.index >= self.chars.len()
    }

    /// Appends one character; editor metadata refreshes every 10 appended
    /// characters and once more on completion.
    pub fn step(&mut self, buffer: &mut EditorBuffer) -> StreamStep {
        if let Some(ch) = self.chars.get(self.index).copied() {
            buffer.push_char(ch);
            self.index += 1;
            let refreshed = self.index % 10 == 0;
            if refreshed {
                buffer.refresh_info();
            }
            StreamStep::Appended { refreshed }
        } else {
            buffer.refresh_info();
            StreamStep::Done
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use codepal_api::{ApiError, DirListing, FileContent};
    use codepal_common::{
        ChatRequest, ChatResponse, ConfirmRequest, ConfirmResponse, DriveEntry, McpTool,
    };
    use std::sync::Mutex;

    /// Only the file endpoints matter here; the rest are unreachable.
    struct FakeFiles {
        read: Mutex<Option<Result<FileContent, String>>>,
        fail_write: bool,
        writes: Mutex<Vec<(String, String)>>,
    }

    impl FakeFiles {
        fn reading(content: &str) -> Arc<Self> {
            Arc::new(Self {
                read: Mutex::new(Some(Ok(FileContent {
                    content: content.to_string(),
                    filename: "file.py".to_string(),
                }))),
                fail_write: false,
                writes: Mutex::new(Vec::new()),
            })
        }

        fn read_error(msg: &str) -> Arc<Self> {
            Arc::new(Self {
                read: Mutex::new(Some(Err(msg.to_string()))),
                fail_write: false,
                writes: Mutex::new(Vec::new()),
            })
        }

        fn failing_writes(content: &str) -> Arc<Self> {
            Arc::new(Self {
                read: Mutex::new(Some(Ok(FileContent {
                    content: content.to_string(),
                    filename: "file.py".to_string(),
                }))),
                fail_write: true,
                writes: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl BackendApi for FakeFiles {
        async fn chat(&self, _req: ChatRequest) -> ApiResult<ChatResponse> {
            unimplemented!("not exercised")
        }
        async fn confirm(&self, _req: ConfirmRequest) -> ApiResult<ConfirmResponse> {
            unimplemented!("not exercised")
        }
        async fn read_file(&self, _path: &str) -> ApiResult<FileContent> {
            match self.read.lock().unwrap().take() {
                Some(Ok(file)) => Ok(file),
                Some(Err(msg)) => Err(ApiError::Server(msg)),
                None => Err(ApiError::Server("exhausted".to_string())),
            }
        }
        async fn write_file(&self, path: &str, content: &str) -> ApiResult<()> {
            if self.fail_write {
                return Err(ApiError::Server("disk full".to_string()));
            }
            self.writes
                .lock()
                .unwrap()
                .push((path.to_string(), content.to_string()));
            Ok(())
        }
        async fn list_files(&self, _path: Option<&str>) -> ApiResult<DirListing> {
            unimplemented!("not exercised")
        }
        async fn list_drives(&self) -> ApiResult<Vec<DriveEntry>> {
            unimplemented!("not exercised")
        }
        async fn mcp_tools(&self) -> ApiResult<Vec<McpTool>> {
            unimplemented!("not exercised")
        }
    }

    #[tokio::test]
    async fn load_resets_baseline_and_modified() {
        let mut editor = EditorController::new(FakeFiles::reading("print(1)\n"));
        let filename = editor.load("app.py").await.unwrap();
        assert_eq!(filename, "file.py");
        assert_eq!(editor.buffer.content(), "print(1)\n");
        assert!(!editor.buffer.modified());
        assert_eq!(editor.buffer.path.as_deref(), Some("app.py"));
    }

    #[tokio::test]
    async fn failed_load_leaves_buffer_untouched() {
        let mut editor = EditorController::new(FakeFiles::reading("original"));
        editor.load("app.py").await.unwrap();

        let api = FakeFiles::read_error("File not found");
        editor.api = api;
        assert!(editor.load("missing.py").await.is_err());
        assert_eq!(editor.buffer.content(), "original");
        assert_eq!(editor.buffer.path.as_deref(), Some("app.py"));
    }

    #[tokio::test]
    async fn save_requires_modification_and_resets_baseline() {
        let api = FakeFiles::reading("v1");
        let mut editor = EditorController::new(api.clone());
        editor.load("app.py").await.unwrap();

        // Unmodified: skipped.
        assert!(!editor.save().await.unwrap());
        assert!(api.writes.lock().unwrap().is_empty());

        editor.buffer.set_content("v2");
        assert!(editor.buffer.modified());
        assert!(editor.save().await.unwrap());
        assert!(!editor.buffer.modified());
        assert_eq!(
            api.writes.lock().unwrap()[0],
            ("app.py".to_string(), "v2".to_string())
        );
    }

    #[tokio::test]
    async fn failed_save_keeps_buffer_modified() {
        let mut editor = EditorController::new(FakeFiles::failing_writes("v1"));
        editor.load("app.py").await.unwrap();
        editor.buffer.set_content("v2");
        assert!(editor.save().await.is_err());
        assert!(editor.buffer.modified());
    }

    #[test]
    fn clear_guards_modified_buffer() {
        let mut editor = EditorController::new(FakeFiles::reading(""));
        editor.buffer.set_content("dirty");
        assert_eq!(editor.clear(false), ClearOutcome::NeedsConfirm);
        assert_eq!(editor.buffer.content(), "dirty");

        assert_eq!(editor.clear(true), ClearOutcome::Cleared);
        assert_eq!(editor.buffer.content(), "");
        assert!(editor.buffer.path.is_none());
        assert!(!editor.buffer.modified());
    }

    #[test]
    fn toggle_sync_flips_only_the_flag() {
        let mut editor = EditorController::new(FakeFiles::reading(""));
        assert!(editor.synced);
        assert!(!editor.toggle_sync());
        assert!(editor.toggle_sync());
    }

    #[test]
    fn stream_refreshes_info_every_ten_chars() {
        let mut buffer = EditorBuffer::new();
        buffer.begin_stream();
        let mut stream = CodeStream::new(&"x".repeat(25));
        let mut refresh_points = Vec::new();
        for step in 1..=25 {
            match stream.step(&mut buffer) {
                StreamStep::Appended { refreshed } => {
                    if refreshed {
                        refresh_points.push(step);
                    }
                }
                StreamStep::Done => panic!("exhausted early"),
            }
        }
        assert_eq!(refresh_points, vec![10, 20]);
        // Cached info lags until the completion refresh.
        assert_eq!(buffer.info().chars, 20);
        assert_eq!(stream.step(&mut buffer), StreamStep::Done);
        assert_eq!(buffer.info().chars, 25);
    }

    #[test]
    fn cancelled_stream_keeps_partial_content() {
        let mut buffer = EditorBuffer::new();
        buffer.set_content("before");
        buffer.begin_stream();
        let mut stream = CodeStream::new("after");
        for _ in 0..3 {
            stream.step(&mut buffer);
        }
        drop(stream);
        assert_eq!(buffer.content(), "aft");
        assert!(buffer.modified());
    }
}
