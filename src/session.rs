//! Editing session: applies input events to the store, keeps the mounted
//! preview in sync, and launches exports.

use crate::event::{Command, EventError};
use crate::export::{ExportOutcome, Exporter};
use crate::form::FormStore;
use crate::preview::{render, PreviewTree};
use crate::surface::{Page, SurfaceLayout, PREVIEW_SURFACE_ID};
use futures::FutureExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, warn};

/// Result of handling one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Updated,
    Preview(String),
    ExportStarted,
}

pub struct Session {
    store: FormStore,
    page: Page,
    layout: SurfaceLayout,
    exporter: Exporter,
    exports: Vec<JoinHandle<Option<ExportOutcome>>>,
    completed: Vec<ExportOutcome>,
}

impl Session {
    /// Creates a session and mounts the initial preview.
    pub fn new(store: FormStore, layout: SurfaceLayout, exporter: Exporter) -> Self {
        let mut session = Self {
            store,
            page: Page::new(),
            layout,
            exporter,
            exports: Vec::new(),
            completed: Vec::new(),
        };
        session.refresh();
        session
    }

    pub fn store(&self) -> &FormStore {
        &self.store
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn preview(&self) -> PreviewTree {
        render(&self.store.snapshot())
    }

    /// Parses and handles one input line.
    pub fn handle_line(&mut self, line: &str) -> Result<Reply, EventError> {
        let command = line.parse::<Command>()?;
        self.handle(command)
    }

    /// Reads commands line by line until EOF, passing each reply to
    /// `on_reply`.
    ///
    /// Invalid UTF-8 is replaced rather than ending the session. Blank lines
    /// and `#` comments are skipped; rejected commands are logged.
    pub async fn run<R>(&mut self, mut reader: R, mut on_reply: impl FnMut(Reply))
    where
        R: AsyncBufRead + Unpin,
    {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "Failed to read input");
                    break;
                }
            }

            let decoded = String::from_utf8_lossy(&buf);
            let line = decoded.trim_end_matches(&['\n', '\r'][..]);
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }
            match self.handle_line(line) {
                Ok(reply) => on_reply(reply),
                Err(e) => warn!(line = %line, error = %e, "Command rejected"),
            }
        }
    }

    /// Handles a command. `Export` must be called within a tokio runtime.
    pub fn handle(&mut self, command: Command) -> Result<Reply, EventError> {
        match command {
            Command::Edit(event) => {
                debug!(?event, "Applying form event");
                event.apply(&mut self.store)?;
                self.refresh();
                Ok(Reply::Updated)
            }
            Command::Show => Ok(Reply::Preview(self.preview().text_content())),
            Command::Export => {
                self.collect_finished();
                self.exports.push(self.exporter.spawn_export(&self.page));
                Ok(Reply::ExportStarted)
            }
        }
    }

    /// Waits for every launched export and returns the successful outcomes,
    /// including those that finished earlier.
    pub async fn finish_exports(&mut self) -> Vec<ExportOutcome> {
        let mut outcomes = std::mem::take(&mut self.completed);
        for handle in self.exports.drain(..) {
            outcomes.extend(export_result(handle.await));
        }
        outcomes
    }

    /// Moves outcomes of finished exports out of the pending list.
    fn collect_finished(&mut self) {
        let mut running = Vec::with_capacity(self.exports.len());
        for mut handle in self.exports.drain(..) {
            if !handle.is_finished() {
                running.push(handle);
                continue;
            }
            match (&mut handle).now_or_never() {
                Some(result) => self.completed.extend(export_result(result)),
                None => running.push(handle),
            }
        }
        self.exports = running;
    }

    /// Tears the preview down; later exports are no-ops.
    pub fn unmount(&mut self) {
        self.page.unmount(PREVIEW_SURFACE_ID);
    }

    fn refresh(&mut self) {
        let surface = self.layout.layout(&self.preview());
        self.page.mount(PREVIEW_SURFACE_ID, surface);
    }
}

fn export_result(result: Result<Option<ExportOutcome>, JoinError>) -> Option<ExportOutcome> {
    match result {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(error = %e, "Export task did not complete");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::SvgToPngConverter;
    use crate::export::DirectorySink;
    use std::sync::Arc;

    fn session(dir: &std::path::Path) -> Session {
        let exporter = Exporter::new(
            Arc::new(SvgToPngConverter::new()),
            Arc::new(DirectorySink::new(dir)),
        );
        Session::new(FormStore::new(), SurfaceLayout::default(), exporter)
    }

    #[tokio::test]
    async fn test_edit_remounts_preview() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        let before = session.page().find(PREVIEW_SURFACE_ID).cloned().unwrap();

        assert_eq!(
            session.handle_line("set personal name Ada").unwrap(),
            Reply::Updated
        );

        let after = session.page().find(PREVIEW_SURFACE_ID).unwrap();
        assert_ne!(&before, after);
        assert!(after.svg().contains("Ada"));
    }

    #[tokio::test]
    async fn test_show_returns_text_content() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        session.handle_line("set skill 0 Rust").unwrap();

        let Reply::Preview(text) = session.handle_line("show").unwrap() else {
            panic!("show should return the preview");
        };
        assert!(text.ends_with("Skills\nRust"));
    }

    #[tokio::test]
    async fn test_failed_edit_keeps_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        let before = session.store().snapshot();

        assert!(session.handle_line("remove experience 4").is_err());
        assert_eq!(session.store().snapshot(), before);
    }

    #[tokio::test]
    async fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        session.handle_line("set personal name Ada").unwrap();

        assert_eq!(session.handle_line("export").unwrap(), Reply::ExportStarted);
        let outcomes = session.finish_exports().await;

        assert_eq!(
            outcomes,
            vec![ExportOutcome::Saved(dir.path().join("my_cv.png"))]
        );
        assert!(dir.path().join("my_cv.png").exists());
    }

    #[tokio::test]
    async fn test_finished_export_outcome_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());

        session.handle_line("export").unwrap();
        while session.exports.iter().any(|h| !h.is_finished()) {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        session.handle_line("export").unwrap();

        let outcomes = session.finish_exports().await;
        assert_eq!(
            outcomes,
            vec![ExportOutcome::Saved(dir.path().join("my_cv.png")); 2]
        );
        assert!(session.finish_exports().await.is_empty());
    }

    #[tokio::test]
    async fn test_run_replaces_invalid_utf8_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        let input: &[u8] = b"set personal name Ada\r\n\n# comment\nset skill 0 caf\xe9\nbogus\nshow\n";

        let mut replies = Vec::new();
        session.run(input, |reply| replies.push(reply)).await;

        assert_eq!(replies.len(), 3);
        let Some(Reply::Preview(text)) = replies.last() else {
            panic!("show should be handled after the invalid line");
        };
        assert!(text.contains("\nAda\n"));
        assert!(text.ends_with("Skills\ncaf\u{FFFD}"));
    }

    #[tokio::test]
    async fn test_export_after_unmount_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        session.unmount();

        session.handle_line("export").unwrap();

        assert_eq!(session.finish_exports().await, vec![ExportOutcome::Skipped]);
        assert!(!dir.path().join("my_cv.png").exists());
    }
}
