//! JSON-lines job loop: `{"code": "...", "context": {...}}` per input line,
//! one encoded payload per output line, in input order.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use scriptlet_engine::{Payload, ScriptRunner};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct Job {
    code: String,
    /// A JSON object, or a string holding one.
    #[serde(default)]
    context: Option<Value>,
}

impl Job {
    fn context_json(&self) -> String {
        match &self.context {
            None | Some(Value::Null) => "{}".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Answer one input line. Blank lines produce no output.
pub fn handle_line(runner: &ScriptRunner, line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let payload = match serde_json::from_str::<Job>(line) {
        Ok(job) => return Some(runner.run(&job.code, &job.context_json())),
        Err(e) => Payload::failure(format!("Invalid job: {e}")),
    };
    Some(payload.encode())
}

/// Run jobs from `reader` until EOF. Returns the number of jobs answered.
pub fn serve<R: BufRead, W: Write>(runner: &ScriptRunner, reader: R, mut writer: W) -> Result<usize> {
    let mut answered = 0;
    for line in reader.lines() {
        let line = line.context("Failed to read stdin")?;
        if let Some(out) = handle_line(runner, &line) {
            writeln!(writer, "{}", out)?;
            writer.flush()?;
            answered += 1;
        }
    }
    tracing::debug!("Input closed after {} jobs", answered);
    Ok(answered)
}

pub fn serve_stdio(runner: &ScriptRunner) -> Result<()> {
    let stdin = std::io::stdin();
    serve(runner, stdin.lock(), std::io::stdout())?;
    Ok(())
}
