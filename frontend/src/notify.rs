// frontend/src/notify.rs
//
// The single user-visible notification surface: an info modal, an error
// modal and a one-line log text.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modal {
    pub shown: bool,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct Notifications {
    pub info: Modal,
    pub error: Modal,
    pub log_line: String,
    history: Vec<Notice>,
}

impl Notifications {
    pub fn on_info(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("[UI] {message}");
        self.info = Modal {
            shown: true,
            text: message.clone(),
        };
        self.history.push(Notice {
            severity: Severity::Info,
            message,
        });
    }

    pub fn on_info_hide(&mut self) {
        self.info.shown = false;
    }

    pub fn on_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("[UI] {message}");
        self.error = Modal {
            shown: true,
            text: message.clone(),
        };
        self.history.push(Notice {
            severity: Severity::Error,
            message,
        });
    }

    pub fn on_error_hide(&mut self) {
        self.error.shown = false;
    }

    pub fn log_text(&mut self, msg: impl Into<String>) {
        self.log_line = msg.into();
    }

    /// Everything shown since the last drain, oldest first.
    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.history)
    }

    /// Error messages raised since the last drain. The error modal counts as
    /// dismissed once they are handed out.
    pub fn take_errors(&mut self) -> Vec<String> {
        let errors: Vec<String> = self
            .drain()
            .into_iter()
            .filter(|n| n.severity == Severity::Error)
            .map(|n| n.message)
            .collect();
        if !errors.is_empty() {
            self.on_error_hide();
        }
        errors
    }

    pub fn last_error(&self) -> Option<&str> {
        self.error.shown.then_some(self.error.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_and_error_are_separate_surfaces() {
        let mut n = Notifications::default();
        n.on_info("Connecting, please wait...");
        n.on_error("Failed to start devices");
        assert!(n.info.shown);
        assert_eq!(n.last_error(), Some("Failed to start devices"));

        n.on_info_hide();
        assert!(!n.info.shown);
        assert!(n.error.shown);

        let drained = n.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].severity, Severity::Info);
        assert!(n.drain().is_empty());
    }

    #[test]
    fn taken_errors_dismiss_the_modal() {
        let mut n = Notifications::default();
        n.on_info("Connecting, please wait...");
        n.on_error("Failed to stop devices: busy");
        assert_eq!(n.take_errors(), vec!["Failed to stop devices: busy".to_string()]);
        assert!(!n.error.shown);
        assert_eq!(n.last_error(), None);
        assert!(n.take_errors().is_empty());
    }
}
