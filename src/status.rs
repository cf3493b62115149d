//! Status and error text.
//!
//! Two independent strings. Setting one never touches the other; callers
//! that want a clean slate clear both explicitly.

use std::time::Duration;
use tokio::time::Instant;

/// The status line and the error line shown to the user.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    status: String,
    /// When set, `status` reads back as empty from this instant on.
    status_expires_at: Option<Instant>,
    error: String,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the status text. `None` and `""` both clear it.
    pub fn set_status<'a>(&mut self, text: impl Into<Option<&'a str>>) {
        self.status = text.into().unwrap_or_default().to_string();
        self.status_expires_at = None;
    }

    /// Overwrite the status text and clear it again after `ttl`.
    ///
    /// A later [`set_status`](Self::set_status) replaces the text and
    /// cancels the pending clear.
    pub fn set_status_for(&mut self, text: &str, ttl: Duration) {
        self.status = text.to_string();
        self.status_expires_at = Some(Instant::now() + ttl);
    }

    /// Overwrite the error text. `None` and `""` both clear it.
    pub fn set_error<'a>(&mut self, text: impl Into<Option<&'a str>>) {
        self.error = text.into().unwrap_or_default().to_string();
    }

    /// Current status text; empty once a transient status has expired.
    pub fn status(&self) -> &str {
        match self.status_expires_at {
            Some(deadline) if Instant::now() >= deadline => "",
            _ => &self.status,
        }
    }

    pub fn error(&self) -> &str {
        &self.error
    }

    /// When a live transient status will clear; `None` for a permanent or
    /// already expired one.
    ///
    /// Expiry is not announced, so a host mirroring the status should
    /// redraw at this instant.
    pub fn status_expires_at(&self) -> Option<Instant> {
        self.status_expires_at
            .filter(|deadline| Instant::now() < *deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_overwrite_and_are_independent() {
        let mut board = StatusBoard::new();
        board.set_status("Uploading a.pdf...");
        board.set_error("Error: boom");
        board.set_status("OK • a.pdf");
        assert_eq!(board.status(), "OK • a.pdf");
        assert_eq!(board.error(), "Error: boom");

        board.set_error("");
        assert_eq!(board.error(), "");
        assert_eq!(board.status(), "OK • a.pdf");
    }

    #[test]
    fn absent_text_clears() {
        let mut board = StatusBoard::new();
        board.set_status("x");
        board.set_error("y");
        board.set_status(None);
        board.set_error(None);
        assert_eq!(board.status(), "");
        assert_eq!(board.error(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn transient_status_expires() {
        let mut board = StatusBoard::new();
        board.set_status_for("Copied to clipboard.", Duration::from_millis(1200));
        assert_eq!(board.status(), "Copied to clipboard.");

        tokio::time::advance(Duration::from_millis(1199)).await;
        assert_eq!(board.status(), "Copied to clipboard.");

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(board.status(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_deadline_is_exposed_until_it_passes() {
        let mut board = StatusBoard::new();
        board.set_status("OK • a.pdf");
        assert_eq!(board.status_expires_at(), None);

        let start = Instant::now();
        board.set_status_for("Copied to clipboard.", Duration::from_millis(1200));
        assert_eq!(
            board.status_expires_at(),
            Some(start + Duration::from_millis(1200))
        );

        tokio::time::advance(Duration::from_millis(1200)).await;
        assert_eq!(board.status_expires_at(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn later_status_cancels_pending_clear() {
        let mut board = StatusBoard::new();
        board.set_status_for("Copied to clipboard.", Duration::from_millis(1200));
        board.set_status("OK • b.pdf");
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(board.status(), "OK • b.pdf");
    }
}
