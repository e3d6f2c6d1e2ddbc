use crate::runtime::{SharedStatus, StatusSnapshot};

pub struct App {
    status: SharedStatus,
    pub error: Option<String>,
}

impl App {
    pub fn new(status: SharedStatus) -> Self {
        Self {
            status,
            error: None,
        }
    }

    /// Copy out the current runtime state with a short-lived lock.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.status
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn paused(&self) -> bool {
        self.snapshot().paused
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn shared_status() -> SharedStatus {
        let snapshot = StatusSnapshot {
            positions: vec![0.25, 0.75],
            queue: vec!["sine_wave(start=0)".to_string()],
            frames_sent: 7,
            frames_skipped: 0,
            paused: false,
        };
        Arc::new(Mutex::new(snapshot))
    }

    #[test]
    fn test_snapshot_reflects_runtime_state() {
        let app = App::new(shared_status());
        let snapshot = app.snapshot();
        assert_eq!(snapshot.positions.len(), 2);
        assert_eq!(snapshot.frames_sent, 7);
        assert!(!app.paused());
    }

    #[test]
    fn test_error_lifecycle() {
        let mut app = App::new(shared_status());
        assert!(app.error.is_none());
        app.set_error("port vanished");
        assert_eq!(app.error.as_deref(), Some("port vanished"));
        app.clear_error();
        assert!(app.error.is_none());
    }
}
