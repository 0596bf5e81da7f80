use std::fmt;

/// What a front end hears about optimizer runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// A run was accepted and works on the named model copy.
    RunStarted { model: String },
    /// The run is over; `published` is false for failed and cancelled runs.
    RunFinished { published: bool },
    Note(String),
}

pub type ProgressSink = Box<dyn Fn(Progress) + Send + Sync>;

/// Forwards run progress to an optional sink.
#[derive(Default)]
pub struct ProgressReporter {
    sink: Option<ProgressSink>,
}

impl ProgressReporter {
    /// A reporter that drops every event.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn with_sink(sink: ProgressSink) -> Self {
        Self { sink: Some(sink) }
    }

    pub fn is_silent(&self) -> bool {
        self.sink.is_none()
    }

    pub fn emit(&self, event: Progress) {
        if let Some(sink) = &self.sink {
            sink(event);
        }
    }

    pub fn note(&self, text: impl Into<String>) {
        self.emit(Progress::Note(text.into()));
    }
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("silent", &self.is_silent())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn silent_reporter_drops_events() {
        let reporter = ProgressReporter::silent();
        assert!(reporter.is_silent());
        reporter.emit(Progress::RunFinished { published: false });
        reporter.note("nobody listens");
    }

    #[test]
    fn sink_receives_events_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let reporter = ProgressReporter::with_sink(Box::new(move |event: Progress| {
            recorder.lock().unwrap().push(event);
        }));

        reporter.emit(Progress::RunStarted {
            model: "gait2392-optimized".to_string(),
        });
        reporter.note("halfway");
        reporter.emit(Progress::RunFinished { published: true });

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                Progress::RunStarted {
                    model: "gait2392-optimized".to_string()
                },
                Progress::Note("halfway".to_string()),
                Progress::RunFinished { published: true },
            ]
        );
    }
}
