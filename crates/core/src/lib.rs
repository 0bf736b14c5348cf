// # -----------------------------
// # crates/core/src/lib.rs
// # -----------------------------
// Core subsystem: line differencer, session store, proposal state
// machine, editor sync controller, and the message formatter. The TUI is
// a projection of the state owned here.

pub mod diff;
pub mod editor;
pub mod format;
pub mod proposal;
pub mod session;

pub use diff::{diff_lines, render_diff, DiffKind, DiffLine, DiffRow, MAX_DIFF_LINES};
pub use editor::{ClearOutcome, CodeStream, EditorBuffer, EditorController, EditorInfo, StreamStep};
pub use format::{format_message, render_plain, Block, Inline};
pub use proposal::{ChatController, PendingProposal, ProposalState};
pub use session::{ChatSession, SessionMeta, SessionStore, StoreError, MAX_SESSIONS};
