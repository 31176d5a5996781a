use std::sync::mpsc::Sender;

use super::{ReportEvent, Reporter};

/// Forwards events to another thread, typically the one drawing output while
/// a workflow runs in the background.
#[derive(Clone)]
pub struct ChannelReporter {
    tx: Sender<ReportEvent>,
}

impl ChannelReporter {
    pub fn new(tx: Sender<ReportEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: ReportEvent) {
        // receiver gone means nobody is listening any more
        let _ = self.tx.send(event);
    }
}

impl Reporter for ChannelReporter {
    fn log(&mut self, line: &str) {
        self.send(ReportEvent::Log {
            line: line.to_string(),
        });
    }

    fn progress(&mut self, percent: u8) {
        self.send(ReportEvent::Progress { percent });
    }

    fn error(&mut self, title: &str, message: &str) {
        self.send(ReportEvent::Error {
            title: title.to_string(),
            message: message.to_string(),
        });
    }

    fn info(&mut self, title: &str, message: &str) {
        self.send(ReportEvent::Info {
            title: title.to_string(),
            message: message.to_string(),
        });
    }
}
