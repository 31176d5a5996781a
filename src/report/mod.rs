mod channel;
mod events;

use std::fmt;

pub use channel::ChannelReporter;
pub use events::ReportEvent;

/// Presentation layer seen by the workflows.
pub trait Reporter {
    fn log(&mut self, line: &str);
    fn progress(&mut self, percent: u8);
    /// Blocking error notification.
    fn error(&mut self, title: &str, message: &str);
    /// Informational notification.
    fn info(&mut self, title: &str, message: &str);
}

/// Collects events in memory.
impl Reporter for Vec<ReportEvent> {
    fn log(&mut self, line: &str) {
        self.push(ReportEvent::Log {
            line: line.to_string(),
        });
    }

    fn progress(&mut self, percent: u8) {
        self.push(ReportEvent::Progress { percent });
    }

    fn error(&mut self, title: &str, message: &str) {
        self.push(ReportEvent::Error {
            title: title.to_string(),
            message: message.to_string(),
        });
    }

    fn info(&mut self, title: &str, message: &str) {
        self.push(ReportEvent::Info {
            title: title.to_string(),
            message: message.to_string(),
        });
    }
}

/// Bracketed label that prefixes every log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validation,
    Step(u8),
    Mapping,
    Sync,
    Checkout,
    Config,
    Ok,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Validation => f.write_str("[VALIDATION]"),
            Stage::Step(n) => write!(f, "[STEP {}]", n),
            Stage::Mapping => f.write_str("[MAPPING]"),
            Stage::Sync => f.write_str("[SYNC]"),
            Stage::Checkout => f.write_str("[CHECKOUT]"),
            Stage::Config => f.write_str("[CONFIG]"),
            Stage::Ok => f.write_str("[OK]"),
            Stage::Info => f.write_str("[INFO]"),
            Stage::Warning => f.write_str("[WARNING]"),
            Stage::Error => f.write_str("[ERROR]"),
        }
    }
}

/// Wraps a reporter: tags log lines with their stage and keeps progress
/// moving forward (only a reset to 0 may go back).
pub struct Tracker<'a> {
    reporter: &'a mut dyn Reporter,
    percent: u8,
    window: (u8, u8),
}

impl<'a> Tracker<'a> {
    pub fn new(reporter: &'a mut dyn Reporter) -> Self {
        Self {
            reporter,
            percent: 0,
            window: (0, 100),
        }
    }

    /// Map the 0..=100 reported by the next phase onto `from..=to` of the
    /// overall bar.
    pub fn set_window(&mut self, from: u8, to: u8) {
        let to = to.min(100);
        self.window = (from.min(to), to);
    }

    pub fn log(&mut self, stage: Stage, message: impl AsRef<str>) {
        let message = message.as_ref();
        match stage {
            Stage::Warning => tracing::warn!("{}", message),
            Stage::Error => tracing::error!("{}", message),
            _ => tracing::info!("{} {}", stage, message),
        }
        self.reporter.log(&format!("{} {}", stage, message));
    }

    pub fn progress(&mut self, percent: u8) {
        let (from, to) = self.window;
        let span = u16::from(percent.min(100)) * u16::from(to - from) / 100;
        let percent = from + span as u8;
        if percent > self.percent {
            self.percent = percent;
            self.reporter.progress(percent);
        }
    }

    pub fn reset_progress(&mut self) {
        self.percent = 0;
        self.reporter.progress(0);
    }

    pub fn error(&mut self, title: &str, message: &str) {
        self.reporter.error(title, message);
    }

    pub fn info(&mut self, title: &str, message: &str) {
        self.reporter.info(title, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_labels() {
        assert_eq!(Stage::Step(2).to_string(), "[STEP 2]");
        assert_eq!(Stage::Warning.to_string(), "[WARNING]");
    }

    #[test]
    fn test_progress_only_moves_forward() {
        let mut events: Vec<ReportEvent> = Vec::new();
        {
            let mut tracker = Tracker::new(&mut events);
            tracker.progress(20);
            tracker.progress(10);
            tracker.progress(20);
            tracker.progress(250);
            tracker.reset_progress();
            tracker.log(Stage::Ok, "done");
        }
        assert_eq!(
            events,
            vec![
                ReportEvent::Progress { percent: 20 },
                ReportEvent::Progress { percent: 100 },
                ReportEvent::Progress { percent: 0 },
                ReportEvent::Log {
                    line: "[OK] done".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_window_scales_phases() {
        let mut events: Vec<ReportEvent> = Vec::new();
        {
            let mut tracker = Tracker::new(&mut events);
            tracker.set_window(0, 40);
            tracker.progress(50);
            tracker.progress(100);
            tracker.set_window(40, 100);
            tracker.progress(10);
            tracker.progress(100);
        }
        assert_eq!(
            events,
            vec![
                ReportEvent::Progress { percent: 20 },
                ReportEvent::Progress { percent: 40 },
                ReportEvent::Progress { percent: 46 },
                ReportEvent::Progress { percent: 100 },
            ]
        );
    }
}
