//! Progress sinks for surfaced events

use tracing::{Level, event};

use super::types::EventRecord;

/// Receives newly surfaced events, oldest first
pub trait ProgressSink: Send + Sync {
    /// Called once per poll tick that produced new events
    fn on_progress(&self, events: &[EventRecord]);
}

impl<F> ProgressSink for F
where
    F: Fn(&[EventRecord]) + Send + Sync,
{
    fn on_progress(&self, events: &[EventRecord]) {
        self(events);
    }
}

/// Sink that writes every event to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn on_progress(&self, events: &[EventRecord]) {
        for record in events {
            match severity_level(&record.severity) {
                Level::ERROR => event!(Level::ERROR, "{record}"),
                Level::WARN => event!(Level::WARN, "{record}"),
                Level::DEBUG => event!(Level::DEBUG, "{record}"),
                _ => event!(Level::INFO, "{record}"),
            }
        }
    }
}

/// Maps Beanstalk severities and CloudFormation resource statuses to a level
fn severity_level(severity: &str) -> Level {
    let upper = severity.to_ascii_uppercase();
    if upper == "ERROR" || upper == "FATAL" || upper.ends_with("_FAILED") {
        Level::ERROR
    } else if upper == "WARN" || upper.contains("ROLLBACK") {
        Level::WARN
    } else if upper == "TRACE" || upper == "DEBUG" {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    #[test]
    fn test_severity_level() {
        assert_eq!(severity_level("FATAL"), Level::ERROR);
        assert_eq!(severity_level("CREATE_FAILED"), Level::ERROR);
        assert_eq!(severity_level("UPDATE_ROLLBACK_IN_PROGRESS"), Level::WARN);
        assert_eq!(severity_level("warn"), Level::WARN);
        assert_eq!(severity_level("TRACE"), Level::DEBUG);
        assert_eq!(severity_level("CREATE_COMPLETE"), Level::INFO);
    }

    #[test]
    fn test_closure_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |events: &[EventRecord]| {
            seen.lock()
                .unwrap()
                .extend(events.iter().map(|e| e.message.clone()));
        };
        sink.on_progress(&[EventRecord::new(Utc::now(), "INFO", "hello")]);
        assert_eq!(*seen.lock().unwrap(), vec!["hello".to_string()]);
    }
}
