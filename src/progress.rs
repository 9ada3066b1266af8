//! Progress notification for long-running build phases.

/// Position of a notification within a phase or workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    Begin,
    Update,
    End,
}

/// One progress notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub stage: ProgressStage,
    /// Completed fraction in `[0, 1]`.
    pub fraction: f64,
    pub message: String,
}

/// Observer signature. Observers may be called from worker threads and must
/// not block.
pub type ProgressFn<'a> = &'a (dyn Fn(&Progress) + Sync);

/// Observer that discards every notification.
pub fn ignore_progress(_: &Progress) {}

/// Observer that writes notifications to the `tracing` log.
pub fn log_progress(progress: &Progress) {
    match progress.stage {
        ProgressStage::Begin => tracing::info!("{}", progress.message),
        ProgressStage::Update => {
            tracing::info!("[{:3.0}%] {}", progress.fraction * 100.0, progress.message);
        }
        ProgressStage::End => tracing::info!("done: {}", progress.message),
    }
}

/// Forwards notifications to an observer.
///
/// Inside a begin/finish workflow bracket, phase-level begin and end
/// notifications are downgraded to updates so that the observer sees a
/// single begin and end for the whole workflow.
#[derive(Clone, Copy)]
pub struct Reporter<'a> {
    sink: ProgressFn<'a>,
    bracketed: bool,
}

impl<'a> Reporter<'a> {
    /// Wraps `sink`; `bracketed` is set while a workflow bracket is open.
    #[must_use]
    pub fn new(sink: ProgressFn<'a>, bracketed: bool) -> Self {
        Self { sink, bracketed }
    }

    fn emit(&self, stage: ProgressStage, fraction: f64, message: &str) {
        let stage = if self.bracketed {
            ProgressStage::Update
        } else {
            stage
        };
        (self.sink)(&Progress {
            stage,
            fraction: fraction.clamp(0.0, 1.0),
            message: message.to_owned(),
        });
    }

    pub fn begin(&self, message: &str) {
        self.emit(ProgressStage::Begin, 0.0, message);
    }

    pub fn update(&self, fraction: f64, message: &str) {
        self.emit(ProgressStage::Update, fraction, message);
    }

    pub fn end(&self, message: &str) {
        self.emit(ProgressStage::End, 1.0, message);
    }
}
