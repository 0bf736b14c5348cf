use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{cursor::Show, execute};
use ratatui::backend::{Backend, CrosstermBackend, TestBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block as UiBlock, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use tokio::runtime::Runtime;

use codepal_api::HttpApi;
use codepal_common::{
    ActionKind, ConfirmVerdict, Config, Notice, NoticeLevel, Role,
};
use codepal_core::{
    format_message, render_plain, ChatController, ClearOutcome, DiffKind, DiffRow, ProposalState,
    SessionStore,
};

#[derive(Parser, Debug, Clone)]
#[command(name = "codepal-tui", version, about = "CodePal TUI: chat + editor sync")]
struct Args {
    /// Backend base URL (overrides the config file)
    #[arg(long = "base-url", value_name = "URL")]
    base_url: Option<String>,

    /// Path to codepal.toml
    #[arg(long, value_name = "PATH", default_value = "codepal.toml")]
    config: PathBuf,

    /// Directory for sessions and theme state (overrides the config file)
    #[arg(long = "state-dir", value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// Open a file in the editor pane at startup
    #[arg(long = "open", value_name = "PATH")]
    open: Option<String>,

    /// Send one message and print the reply (headless helper)
    #[arg(long = "send", value_name = "MESSAGE")]
    send: Option<String>,
}

enum Overlay {
    None,
    Help,
    Sessions {
        entries: Vec<codepal_core::SessionMeta>,
        selected: usize,
    },
    Files {
        current: String,
        parent: Option<String>,
        entries: Vec<codepal_common::FileEntry>,
        selected: usize,
    },
    McpTools(Vec<codepal_common::McpTool>),
}

struct App {
    ctl: ChatController,
    input: String,
    overlay: Overlay,
    theme: String,
    status: Option<Notice>,
    pending_clear: bool,
    stream_interval: Duration,
}

impl App {
    fn new(ctl: ChatController, theme: String, stream_interval: Duration) -> Self {
        Self {
            ctl,
            input: String::new(),
            overlay: Overlay::None,
            theme,
            status: None,
            pending_clear: false,
            stream_interval,
        }
    }

    fn absorb_notices(&mut self) {
        if let Some(notice) = self.ctl.drain_notices().into_iter().last() {
            self.status = Some(notice);
        }
    }

    fn set_status(&mut self, notice: Notice) {
        self.status = Some(notice);
    }

    /// Index of the most recent transcript entry carrying an inline
    /// action, used for Ctrl+Y / Ctrl+N.
    fn latest_action_idx(&self) -> Option<usize> {
        self.ctl
            .transcript
            .iter()
            .rposition(|m| m.action.is_some())
    }

    fn toggle_theme(&mut self) {
        self.theme = if self.theme == "dark" { "light" } else { "dark" }.to_string();
        if let Err(err) = self.ctl.store.save_theme(&self.theme) {
            tracing::warn!("theme save failed: {err}");
        }
        self.set_status(Notice::info(format!("Theme: {}", self.theme)));
    }

    fn open_sessions(&mut self) {
        self.ctl.save_session();
        let entries = self.ctl.store.list();
        if entries.is_empty() {
            self.set_status(Notice::info("No saved sessions"));
            return;
        }
        self.overlay = Overlay::Sessions {
            entries,
            selected: 0,
        };
    }

    fn open_files(&mut self, rt: &Runtime, path: Option<&str>) {
        match rt.block_on(self.ctl.api().list_files(path)) {
            Ok(listing) => {
                self.overlay = Overlay::Files {
                    current: listing.current_path,
                    parent: listing.parent_path,
                    entries: listing.items,
                    selected: 0,
                };
            }
            Err(err) => self.set_status(Notice::error(format!("Browse failed: {err}"))),
        }
    }

    fn open_drives(&mut self, rt: &Runtime) {
        match rt.block_on(self.ctl.api().list_drives()) {
            Ok(drives) => {
                let entries = drives
                    .into_iter()
                    .map(|d| codepal_common::FileEntry {
                        name: d.name,
                        path: d.path,
                        is_directory: true,
                        size: 0,
                    })
                    .collect();
                self.overlay = Overlay::Files {
                    current: "Drives".to_string(),
                    parent: None,
                    entries,
                    selected: 0,
                };
            }
            Err(err) => self.set_status(Notice::error(format!("Drive list failed: {err}"))),
        }
    }

    fn open_mcp_tools(&mut self, rt: &Runtime) {
        match rt.block_on(self.ctl.api().mcp_tools()) {
            Ok(tools) => self.overlay = Overlay::McpTools(tools),
            Err(err) => self.set_status(Notice::error(format!("MCP tools failed: {err}"))),
        }
    }

    fn submit_input(&mut self, rt: &Runtime) {
        let text = std::mem::take(&mut self.input);
        rt.block_on(self.ctl.submit(&text));
        self.absorb_notices();
    }

    fn request_clear(&mut self) {
        let confirmed = self.pending_clear;
        match self.ctl.editor.clear(confirmed) {
            ClearOutcome::NeedsConfirm => {
                self.pending_clear = true;
                self.set_status(Notice::warning(
                    "Unsaved changes. Ctrl+L again to discard",
                ));
            }
            ClearOutcome::Cleared => {
                self.pending_clear = false;
                self.set_status(Notice::info("Editor cleared"));
            }
        }
    }

    fn save_editor(&mut self, rt: &Runtime) {
        match rt.block_on(self.ctl.editor.save()) {
            Ok(true) => self.set_status(Notice::success("File saved")),
            Ok(false) => self.set_status(Notice::info("Nothing to save")),
            Err(err) => self.set_status(Notice::error(format!("Save failed: {err}"))),
        }
    }

    fn headless_output(&self) -> String {
        let reply = self
            .ctl
            .transcript
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| render_plain(&format_message(&m.text)))
            .unwrap_or_else(|| "No messages".to_string());
        match &self.ctl.proposal {
            ProposalState::DiffPresented { proposal, .. } => {
                format!("{}\n[proposal] {}", reply, proposal.summary)
            }
            _ => reply,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    run(args)
}

fn run(args: Args) -> Result<()> {
    let cfg = Config::load_or_default(&args.config);
    let base_url = args
        .base_url
        .clone()
        .unwrap_or_else(|| cfg.backend.base_url.clone());
    let state_dir = args.state_dir.clone().unwrap_or_else(|| cfg.state_dir.clone());

    let api = Arc::new(HttpApi::new(base_url));
    let store = SessionStore::new(&state_dir);
    let theme = store.load_theme(&cfg.ui.theme);
    let ctl = ChatController::new(api, store);
    let stream_interval = Duration::from_millis(cfg.editor.stream_interval_ms.max(1));

    let rt = Runtime::new().context("start async runtime")?;
    let mut app = App::new(ctl, theme, stream_interval);

    if let Some(path) = &args.open {
        match rt.block_on(app.ctl.editor.load(path)) {
            Ok(filename) => app.set_status(Notice::success(format!("Opened {filename}"))),
            Err(err) => app.set_status(Notice::error(format!("Could not open {path}: {err}"))),
        }
    }

    if let Some(message) = &args.send {
        rt.block_on(app.ctl.submit(message));
        app.absorb_notices();
        // Drain any streaming delivery so the buffer is complete.
        while app.ctl.tick_stream() {}
        println!("{}", app.headless_output());
        return Ok(());
    }

    if headless_mode() {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend)?;
        draw_frame(&mut terminal, &mut app)?;
        println!("{}", app.headless_output());
        return Ok(());
    }

    let guard = TerminalGuard::enter()?;
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;
    let result = run_app(&mut terminal, &mut app, &rt);
    terminal.show_cursor().ok();
    drop(guard);
    app.ctl.save_session();
    result
}

fn headless_mode() -> bool {
    std::env::var("CODEPAL_TUI_HEADLESS")
        .ok()
        .map(|value| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return true;
            }
            matches!(
                trimmed.to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(false)
}

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        execute!(std::io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        disable_raw_mode().ok();
        let mut stdout = std::io::stdout();
        execute!(stdout, LeaveAlternateScreen, Show).ok();
    }
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, rt: &Runtime) -> Result<()> {
    let tick_rate = Duration::from_millis(150);
    let mut last_tick = Instant::now();

    loop {
        draw_frame(terminal, app)?;

        let streaming = matches!(app.ctl.proposal, ProposalState::Streaming { .. });
        let wait = if streaming {
            app.stream_interval
        } else {
            tick_rate.saturating_sub(last_tick.elapsed())
        };

        if event::poll(wait)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
                if ctrl && key.code == KeyCode::Char('q') {
                    return Ok(());
                }
                if handle_overlay_key(app, rt, key.code) {
                    continue;
                }
                if handle_diff_key(app, rt, key.code) {
                    continue;
                }
                if ctrl {
                    handle_ctrl_key(app, rt, key.code);
                    continue;
                }
                match key.code {
                    KeyCode::F(1) => app.overlay = Overlay::Help,
                    KeyCode::F(2) => app.toggle_theme(),
                    KeyCode::Enter => app.submit_input(rt),
                    KeyCode::Backspace => {
                        app.input.pop();
                    }
                    KeyCode::Char(c) => app.input.push(c),
                    _ => {}
                }
            }
        }

        if streaming && app.ctl.tick_stream() {
            app.absorb_notices();
        }
        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
}

fn handle_ctrl_key(app: &mut App, rt: &Runtime, code: KeyCode) {
    match code {
        KeyCode::Char('s') => app.save_editor(rt),
        KeyCode::Char('e') => {
            let synced = app.ctl.editor.toggle_sync();
            app.set_status(if synced {
                Notice::success("Editor connected")
            } else {
                Notice::info("Editor disconnected")
            });
        }
        KeyCode::Char('l') => app.request_clear(),
        KeyCode::Char('n') => {
            app.ctl.new_session();
            app.absorb_notices();
        }
        KeyCode::Char('o') => app.open_sessions(),
        KeyCode::Char('f') => app.open_files(rt, None),
        KeyCode::Char('t') => app.open_mcp_tools(rt),
        KeyCode::Char('y') => {
            if let Some(idx) = app.latest_action_idx() {
                rt.block_on(app.ctl.confirm_action(idx, ConfirmVerdict::Accept));
                app.absorb_notices();
            }
        }
        KeyCode::Char('r') => {
            if let Some(idx) = app.latest_action_idx() {
                rt.block_on(app.ctl.confirm_action(idx, ConfirmVerdict::Reject));
                app.absorb_notices();
            }
        }
        _ => {}
    }
}

/// Diff verdict keys take precedence over typing while a proposal is on
/// display. Returns true when the key was consumed.
fn handle_diff_key(app: &mut App, rt: &Runtime, code: KeyCode) -> bool {
    if !matches!(app.ctl.proposal, ProposalState::DiffPresented { .. }) {
        return false;
    }
    match code {
        KeyCode::Char('a') => {
            rt.block_on(app.ctl.accept());
            app.absorb_notices();
            true
        }
        KeyCode::Char('r') => {
            rt.block_on(app.ctl.reject());
            app.absorb_notices();
            true
        }
        KeyCode::Esc => {
            app.ctl.dismiss();
            app.set_status(Notice::info("Review dismissed"));
            true
        }
        _ => false,
    }
}

fn handle_overlay_key(app: &mut App, rt: &Runtime, code: KeyCode) -> bool {
    match &mut app.overlay {
        Overlay::None => false,
        Overlay::Help => {
            if matches!(code, KeyCode::Esc | KeyCode::F(1)) {
                app.overlay = Overlay::None;
            }
            true
        }
        Overlay::McpTools(_) => {
            if matches!(code, KeyCode::Esc) {
                app.overlay = Overlay::None;
            }
            true
        }
        Overlay::Sessions { entries, selected } => {
            match code {
                KeyCode::Esc => app.overlay = Overlay::None,
                KeyCode::Up => *selected = selected.saturating_sub(1),
                KeyCode::Down => {
                    *selected = (*selected + 1).min(entries.len().saturating_sub(1));
                }
                KeyCode::Enter => {
                    let id = entries[*selected].id.clone();
                    app.overlay = Overlay::None;
                    if app.ctl.switch_session(&id) {
                        app.set_status(Notice::success("Session loaded"));
                    } else {
                        app.set_status(Notice::error("Session not found"));
                    }
                }
                _ => {}
            }
            true
        }
        Overlay::Files {
            parent,
            entries,
            selected,
            ..
        } => {
            match code {
                KeyCode::Esc => app.overlay = Overlay::None,
                KeyCode::Up => *selected = selected.saturating_sub(1),
                KeyCode::Down => {
                    *selected = (*selected + 1).min(entries.len().saturating_sub(1));
                }
                KeyCode::Char('d') => app.open_drives(rt),
                KeyCode::Backspace => {
                    if let Some(parent) = parent.clone() {
                        app.open_files(rt, Some(&parent));
                    }
                }
                KeyCode::Enter => {
                    if let Some(entry) = entries.get(*selected).cloned() {
                        if entry.is_directory {
                            app.open_files(rt, Some(&entry.path));
                        } else {
                            app.overlay = Overlay::None;
                            match rt.block_on(app.ctl.editor.load(&entry.path)) {
                                Ok(filename) => {
                                    app.set_status(Notice::success(format!("Opened {filename}")))
                                }
                                Err(err) => app.set_status(Notice::error(format!(
                                    "Could not open {}: {err}",
                                    entry.path
                                ))),
                            }
                        }
                    }
                }
                _ => {}
            }
            true
        }
    }
}

fn draw_frame<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    terminal.draw(|f| {
        let size = f.area();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                [
                    Constraint::Min(3),
                    Constraint::Length(3),
                    Constraint::Length(1),
                ]
                .as_ref(),
            )
            .split(size);
        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
            .split(rows[0]);

        draw_chat(f, panes[0], app);
        draw_editor(f, panes[1], app);

        let input = Paragraph::new(app.input.as_str()).block(
            UiBlock::default()
                .borders(Borders::ALL)
                .title(Span::raw("Message (Enter to send)")),
        );
        f.render_widget(input, rows[1]);

        let status_line = match &app.status {
            Some(notice) => Line::from(Span::styled(
                notice.text.clone(),
                notice_style(notice.level),
            )),
            None => Line::from(format!(
                "codepal | session {} | {} messages | F1 help",
                app.ctl.session_id,
                app.ctl.transcript.len()
            )),
        };
        f.render_widget(Paragraph::new(status_line), rows[2]);

        match &app.overlay {
            Overlay::None => {}
            Overlay::Help => draw_help(f, size),
            Overlay::Sessions { entries, selected } => {
                draw_sessions(f, size, entries, *selected)
            }
            Overlay::Files {
                current,
                entries,
                selected,
                ..
            } => draw_files(f, size, current, entries, *selected),
            Overlay::McpTools(tools) => draw_mcp_tools(f, size, tools),
        }

        if let ProposalState::DiffPresented {
            proposal,
            rows: diff_rows,
        } = &app.ctl.proposal
        {
            draw_diff(f, size, &proposal.summary, diff_rows);
        }
    })?;
    Ok(())
}

fn notice_style(level: NoticeLevel) -> Style {
    match level {
        NoticeLevel::Info => Style::default().fg(Color::Cyan),
        NoticeLevel::Success => Style::default().fg(Color::Green),
        NoticeLevel::Warning => Style::default().fg(Color::Yellow),
        NoticeLevel::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

fn draw_chat(frame: &mut ratatui::Frame<'_>, area: Rect, app: &App) {
    let mut lines: Vec<Line> = Vec::new();
    for msg in &app.ctl.transcript {
        let (label, style) = match msg.role {
            Role::User => ("you", Style::default().fg(Color::Blue)),
            Role::Assistant => ("codepal", Style::default().fg(Color::Magenta)),
        };
        lines.push(Line::from(Span::styled(
            format!("{label}:"),
            style.add_modifier(Modifier::BOLD),
        )));
        append_message_lines(&mut lines, &msg.text);
        if let Some(action) = &msg.action {
            let hint = match action.kind {
                ActionKind::CodeEdit => "code change (Ctrl+Y apply, Ctrl+R reject)",
                ActionKind::Delete => "delete request (Ctrl+Y confirm, Ctrl+R reject)",
                ActionKind::RunPython => "run request (Ctrl+Y confirm, Ctrl+R reject)",
            };
            lines.push(Line::from(Span::styled(
                format!("  [{hint}]"),
                Style::default().fg(Color::Yellow),
            )));
        }
        for log in &msg.mcp_logs {
            lines.push(Line::from(Span::styled(
                format!("  mcp: {log}"),
                Style::default().add_modifier(Modifier::DIM),
            )));
        }
        lines.push(Line::from(""));
    }
    if lines.is_empty() {
        lines.push(Line::from("Ask for a code change to get started."));
    }

    // Keep the tail visible; ratatui clips from the top.
    let visible = area.height.saturating_sub(2) as usize;
    let scroll = lines.len().saturating_sub(visible) as u16;
    let chat = Paragraph::new(lines)
        .scroll((scroll, 0))
        .wrap(Wrap { trim: false })
        .block(UiBlock::default().title("Chat").borders(Borders::ALL));
    frame.render_widget(chat, area);
}

fn append_message_lines(lines: &mut Vec<Line>, text: &str) {
    for block in format_message(text) {
        match block {
            codepal_core::Block::Paragraph(para_lines) => {
                for inlines in para_lines {
                    let spans: Vec<Span> = inlines
                        .into_iter()
                        .map(|inline| match inline {
                            codepal_core::Inline::Text(t) => Span::raw(t),
                            codepal_core::Inline::Code(t) => {
                                Span::styled(t, Style::default().fg(Color::Cyan))
                            }
                            codepal_core::Inline::Strong(t) => {
                                Span::styled(t, Style::default().add_modifier(Modifier::BOLD))
                            }
                            codepal_core::Inline::Emph(t) => {
                                Span::styled(t, Style::default().add_modifier(Modifier::ITALIC))
                            }
                        })
                        .collect();
                    lines.push(Line::from(spans));
                }
            }
            codepal_core::Block::Code { lang, text } => {
                lines.push(Line::from(Span::styled(
                    format!("  [{lang}]"),
                    Style::default().add_modifier(Modifier::DIM),
                )));
                for code_line in text.lines() {
                    lines.push(Line::from(Span::styled(
                        format!("  {code_line}"),
                        Style::default().fg(Color::Green),
                    )));
                }
            }
        }
    }
}

fn draw_editor(frame: &mut ratatui::Frame<'_>, area: Rect, app: &App) {
    let buffer = &app.ctl.editor.buffer;
    let title = match &buffer.path {
        Some(path) if buffer.modified() => format!("Editor: {path} *"),
        Some(path) => format!("Editor: {path}"),
        None if buffer.modified() => "Editor: (untitled) *".to_string(),
        None => "Editor: (untitled)".to_string(),
    };

    let mut lines: Vec<Line> = buffer
        .content()
        .split('\n')
        .enumerate()
        .map(|(i, text)| {
            Line::from(vec![
                Span::styled(
                    format!("{:>4} ", i + 1),
                    Style::default().add_modifier(Modifier::DIM),
                ),
                Span::raw(text.to_string()),
            ])
        })
        .collect();
    let info = buffer.info();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(
            "Ln {} Ch {} | sync {}",
            info.lines,
            info.chars,
            if app.ctl.editor.synced { "on" } else { "off" }
        ),
        Style::default().add_modifier(Modifier::DIM),
    )));

    let editor = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(UiBlock::default().title(title).borders(Borders::ALL));
    frame.render_widget(editor, area);
}

fn draw_diff(frame: &mut ratatui::Frame<'_>, area: Rect, summary: &str, rows: &[DiffRow]) {
    let popup = centered_rect(80, 80, area);
    let mut lines: Vec<Line> = Vec::new();
    for row in rows {
        match row {
            DiffRow::Line(line) => {
                let (gutter, style) = match line.kind {
                    DiffKind::Added => ("+", Style::default().fg(Color::Green)),
                    DiffKind::Removed => ("-", Style::default().fg(Color::Red)),
                    DiffKind::Unchanged => (" ", Style::default()),
                };
                lines.push(Line::from(Span::styled(
                    format!("{gutter}{:>4} {}", line.line_number, line.text),
                    style,
                )));
            }
            DiffRow::Truncated { omitted } => {
                lines.push(Line::from(Span::styled(
                    format!("({omitted} more lines)"),
                    Style::default().add_modifier(Modifier::DIM),
                )));
            }
        }
    }

    let title = format!("{summary} — a accept, r reject, Esc dismiss");
    let diff = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(UiBlock::default().title(title).borders(Borders::ALL));
    frame.render_widget(ratatui::widgets::Clear, popup);
    frame.render_widget(diff, popup);
}

fn draw_help(frame: &mut ratatui::Frame<'_>, area: Rect) {
    let popup = centered_rect(60, 50, area);
    let text = "Enter send | Ctrl+Q quit\n\
                Ctrl+S save file | Ctrl+E toggle sync | Ctrl+L clear editor\n\
                Ctrl+N new chat | Ctrl+O sessions | Ctrl+F files | Ctrl+T tools\n\
                Ctrl+Y / Ctrl+R confirm or reject the latest action\n\
                Diff view: a accept, r reject, Esc dismiss\n\
                F2 theme | F1 close help";
    let help =
        Paragraph::new(text).block(UiBlock::default().title("Help").borders(Borders::ALL));
    frame.render_widget(ratatui::widgets::Clear, popup);
    frame.render_widget(help, popup);
}

fn draw_sessions(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    entries: &[codepal_core::SessionMeta],
    selected: usize,
) {
    let popup = centered_rect(60, 60, area);
    let items: Vec<ListItem> = entries
        .iter()
        .map(|meta| ListItem::new(Line::from(meta.title.clone())))
        .collect();
    let list = List::new(items)
        .block(
            UiBlock::default()
                .title("Sessions (Enter to load)")
                .borders(Borders::ALL),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    if !entries.is_empty() {
        state.select(Some(selected.min(entries.len() - 1)));
    }
    frame.render_widget(ratatui::widgets::Clear, popup);
    frame.render_stateful_widget(list, popup, &mut state);
}

fn draw_files(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    current: &str,
    entries: &[codepal_common::FileEntry],
    selected: usize,
) {
    let popup = centered_rect(70, 70, area);
    let items: Vec<ListItem> = if entries.is_empty() {
        vec![ListItem::new(Line::from("(empty)"))]
    } else {
        entries
            .iter()
            .map(|entry| {
                let text = if entry.is_directory {
                    format!("{}/", entry.name)
                } else {
                    entry.name.clone()
                };
                ListItem::new(Line::from(text))
            })
            .collect()
    };
    let list = List::new(items)
        .block(
            UiBlock::default()
                .title(format!("{current} (Enter open, Backspace up, d drives)"))
                .borders(Borders::ALL),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    if !entries.is_empty() {
        state.select(Some(selected.min(entries.len() - 1)));
    }
    frame.render_widget(ratatui::widgets::Clear, popup);
    frame.render_stateful_widget(list, popup, &mut state);
}

fn draw_mcp_tools(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    tools: &[codepal_common::McpTool],
) {
    let popup = centered_rect(60, 60, area);
    let mut lines: Vec<Line> = Vec::new();
    if tools.is_empty() {
        lines.push(Line::from("No MCP tools available"));
    }
    for tool in tools {
        lines.push(Line::from(Span::styled(
            tool.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        if !tool.description.trim().is_empty() {
            lines.push(Line::from(format!("  {}", tool.description.trim())));
        }
    }
    let view = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(UiBlock::default().title("MCP Tools").borders(Borders::ALL));
    frame.render_widget(ratatui::widgets::Clear, popup);
    frame.render_widget(view, popup);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}
