//! Output capture: scoped, stack-disciplined sinks for script output.
//!
//! Scripts write standard output through `print` and standard error through
//! `debug`. Both are routed into the innermost active capture frame; with no
//! frame active, text passes through to the real process streams. Frames are
//! pushed by [`CaptureStack::begin`] and popped when the returned guard is
//! finished or dropped, so restoration happens on every exit path.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

/// Which output sink a write targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Text accumulated by one capture frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    fn push(&mut self, stream: Stream, text: &str) {
        match stream {
            Stream::Stdout => self.stdout.push_str(text),
            Stream::Stderr => self.stderr.push_str(text),
        }
    }
}

/// Stack of capture frames shared by every host binding of one call.
#[derive(Debug, Clone, Default)]
pub struct CaptureStack {
    frames: Rc<RefCell<Vec<CapturedOutput>>>,
}

impl CaptureStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Redirect both sinks into a fresh frame until the guard is finished or dropped.
    pub fn begin(&self) -> CaptureGuard {
        let mut frames = self.frames.borrow_mut();
        frames.push(CapturedOutput::default());
        CaptureGuard {
            stack: self.clone(),
            depth: frames.len(),
            finished: false,
        }
    }

    /// Number of active frames.
    pub fn depth(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn write(&self, stream: Stream, text: &str) {
        if let Some(top) = self.frames.borrow_mut().last_mut() {
            top.push(stream, text);
            return;
        }
        passthrough(stream, text);
    }

    /// Write `text` followed by a newline, the way `print` does.
    pub fn write_line(&self, stream: Stream, text: &str) {
        if let Some(top) = self.frames.borrow_mut().last_mut() {
            top.push(stream, text);
            top.push(stream, "\n");
            return;
        }
        passthrough(stream, &format!("{text}\n"));
    }

    /// Pop every frame at or above `depth` and return the one at `depth`.
    /// Frames above it belong to guards that were leaked; their text is discarded.
    fn pop_to(&self, depth: usize) -> CapturedOutput {
        let mut frames = self.frames.borrow_mut();
        if frames.len() < depth {
            return CapturedOutput::default();
        }
        frames.truncate(depth);
        frames.pop().unwrap_or_default()
    }
}

fn passthrough(stream: Stream, text: &str) {
    let _ = match stream {
        Stream::Stdout => {
            let mut out = std::io::stdout().lock();
            out.write_all(text.as_bytes()).and_then(|_| out.flush())
        }
        Stream::Stderr => std::io::stderr().lock().write_all(text.as_bytes()),
    };
}

/// Active capture frame. Restores the previous sinks when finished or dropped.
#[must_use = "dropping the guard ends the capture immediately"]
pub struct CaptureGuard {
    stack: CaptureStack,
    depth: usize,
    finished: bool,
}

impl CaptureGuard {
    /// End the capture and return what was written while it was active.
    pub fn finish(mut self) -> CapturedOutput {
        self.finished = true;
        self.stack.pop_to(self.depth)
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.stack.pop_to(self.depth);
        }
    }
}

/// Destination of `printit`: the real process stdout unless a host swaps it.
/// Never touched by capture frames.
#[derive(Clone)]
pub struct DirectOutput {
    sink: Arc<Mutex<dyn Write + Send>>,
}

impl DirectOutput {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Arc::new(Mutex::new(writer)),
        }
    }

    /// Write `text` and a newline, then flush.
    pub fn write_line(&self, text: &str) {
        match self.sink.lock() {
            Ok(mut sink) => {
                let _ = writeln!(sink, "{text}").and_then(|_| sink.flush());
            }
            Err(e) => tracing::warn!("Direct output unavailable: {}", e),
        }
    }
}

impl Default for DirectOutput {
    fn default() -> Self {
        Self::stdout()
    }
}

impl std::fmt::Debug for DirectOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectOutput").finish_non_exhaustive()
    }
}

/// Value returned by `silence(|| ..)`: the output the closure swallowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Silenced {
    captured: CapturedOutput,
}

impl Silenced {
    pub fn new(captured: CapturedOutput) -> Self {
        Self { captured }
    }

    /// Swallowed standard output.
    pub fn output(&self) -> &str {
        &self.captured.stdout
    }

    /// Swallowed standard error.
    pub fn errors(&self) -> &str {
        &self.captured.stderr
    }
}
