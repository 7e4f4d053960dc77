//! Streaming execution of conversion paths.
//!
//! Each stage of a path runs on its own thread, connected to its neighbours
//! by bounded byte conduits, so a multi-step conversion streams end to end
//! without buffering whole intermediate documents. A dedicated feeder thread
//! pumps the caller's input into the first stage; the last stage writes
//! straight into the caller's output.
//!
//! Failure handling is first-failure-wins: the earliest recorded error is
//! the one reported, and the conduit drops it triggers (end-of-stream
//! downstream, `BrokenPipe` upstream) unwind the remaining stages without
//! masking it.

use crate::capability::ConvertError;
use crate::conduit::{ConduitReader, ConduitWriter, conduit};
use crate::conversion::{ConversionAction, ConversionPath};
use std::any::Any;
use std::io::{self, Read, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;
use std::thread;
use tracing::{debug, error};

/// Errors raised while executing a conversion path.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A stage's capability reported a conversion failure.
    #[error("stage {stage} failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: ConvertError,
    },

    /// Moving bytes into or out of the pipeline failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// A stage thread panicked.
    #[error("stage {stage} panicked: {message}")]
    Panicked { stage: String, message: String },
}

/// First-failure-wins error slot shared by all pipeline threads.
struct FailureCell {
    slot: Mutex<Option<PipelineError>>,
}

impl FailureCell {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    fn record(&self, err: PipelineError) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_none() {
            *slot = Some(err);
        } else {
            // Usually cascade noise (broken pipes) following the real cause.
            debug!(error = %err, "discarding subsequent pipeline failure");
        }
    }

    fn take(&self) -> Option<PipelineError> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

/// Execute `path` over the given streams.
///
/// An empty path degenerates to a plain copy. Otherwise one thread per stage
/// plus a feeder thread run under a scope, so the call returns only after
/// every stage has finished and the output has been flushed.
pub fn run_pipeline<R, W>(
    path: &ConversionPath,
    mut input: R,
    mut output: W,
) -> Result<(), PipelineError>
where
    R: Read + Send,
    W: Write + Send,
{
    if path.is_empty() {
        io::copy(&mut input, &mut output)?;
        output.flush()?;
        return Ok(());
    }

    debug!(path = %path, stages = path.len(), "pipeline started");
    let failures = FailureCell::new();
    let actions = path.actions();

    thread::scope(|scope| {
        let (feed_writer, mut upstream) = conduit();
        let failures = &failures;

        scope.spawn(move || feed(input, feed_writer, failures));

        for action in &actions[..actions.len() - 1] {
            let (writer, next_upstream) = conduit();
            let reader = std::mem::replace(&mut upstream, next_upstream);
            scope.spawn(move || run_stage(action, reader, writer, failures));
        }

        let last = &actions[actions.len() - 1];
        scope.spawn(move || run_stage(last, upstream, &mut output, failures));
    });

    match failures.take() {
        Some(err) => {
            error!(path = %path, error = %err, "pipeline failed");
            Err(err)
        }
        None => {
            debug!(path = %path, "pipeline finished");
            Ok(())
        }
    }
}

/// Pump the caller's input into the first stage, then close the conduit.
fn feed<R: Read>(mut input: R, mut writer: ConduitWriter, failures: &FailureCell) {
    if let Err(err) = io::copy(&mut input, &mut writer) {
        // BrokenPipe here means a stage already failed and recorded itself.
        failures.record(PipelineError::Io(err));
    }
}

/// Run one stage to completion, recording any failure before the conduit
/// ends drop. Dropping them is what signals the neighbours to stop.
fn run_stage<W: Write>(
    action: &ConversionAction,
    mut reader: ConduitReader,
    mut writer: W,
    failures: &FailureCell,
) {
    debug!(stage = %action, "stage started");
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        action.convert(&mut reader, &mut writer)?;
        writer.flush()?;
        Ok::<(), ConvertError>(())
    }));
    match outcome {
        Ok(Ok(())) => debug!(stage = %action, "stage finished"),
        Ok(Err(err)) => failures.record(PipelineError::Stage {
            stage: action.to_string(),
            source: err,
        }),
        Err(payload) => failures.record(PipelineError::Panicked {
            stage: action.to_string(),
            message: panic_message(payload),
        }),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}
