/*!
Operator implementations.

[`StdinOperator`] reads the terminal on a helper thread so the messaging loop
can wait on the keyboard and the socket with a bounded timeout.
[`ScriptedOperator`] replays canned input and records what was displayed.
*/

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::core::error::Result;
use crate::protocol::shared::traits::{Operator, OperatorInput};

/// Operator at the process's terminal
pub struct StdinOperator {
    lines: Receiver<String>,
}

impl StdinOperator {
    /// Start reading stdin on a background thread.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Reading stdin failed: {}", e);
                        break;
                    }
                }
            }
        });
        Self { lines: rx }
    }
}

impl Operator for StdinOperator {
    fn read_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.recv().ok())
    }

    fn poll_line(&mut self, timeout: Duration) -> Result<OperatorInput> {
        match self.lines.recv_timeout(timeout) {
            Ok(line) => Ok(OperatorInput::Line(line)),
            Err(RecvTimeoutError::Timeout) => Ok(OperatorInput::Pending),
            Err(RecvTimeoutError::Disconnected) => Ok(OperatorInput::Closed),
        }
    }

    fn display(&mut self, text: &str) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", text);
        let _ = stdout.flush();
    }
}

/// Operator that replays a fixed script
#[derive(Debug, Default, Clone)]
pub struct ScriptedOperator {
    script: VecDeque<OperatorInput>,
    displayed: Vec<String>,
}

impl ScriptedOperator {
    /// Script made only of lines
    pub fn with_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_script(lines.into_iter().map(|line| OperatorInput::Line(line.into())))
    }

    /// Arbitrary script; input is closed once it runs out
    pub fn with_script<I: IntoIterator<Item = OperatorInput>>(script: I) -> Self {
        Self {
            script: script.into_iter().collect(),
            displayed: Vec::new(),
        }
    }

    /// Everything shown to the operator so far
    pub fn displayed(&self) -> &[String] {
        &self.displayed
    }
}

impl Operator for ScriptedOperator {
    fn read_line(&mut self) -> Result<Option<String>> {
        while let Some(input) = self.script.pop_front() {
            match input {
                OperatorInput::Line(line) => return Ok(Some(line)),
                OperatorInput::Pending => continue,
                OperatorInput::Closed => return Ok(None),
            }
        }
        Ok(None)
    }

    fn poll_line(&mut self, _timeout: Duration) -> Result<OperatorInput> {
        Ok(self.script.pop_front().unwrap_or(OperatorInput::Closed))
    }

    fn display(&mut self, text: &str) {
        self.displayed.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_read_line_skips_pending() {
        let mut operator = ScriptedOperator::with_script([
            OperatorInput::Pending,
            OperatorInput::Line("1a3".into()),
        ]);
        assert_eq!(operator.read_line().unwrap(), Some("1a3".to_string()));
        assert_eq!(operator.read_line().unwrap(), None);
    }

    #[test]
    fn test_scripted_poll_closes_when_exhausted() {
        let mut operator = ScriptedOperator::with_lines(["hi"]);
        assert_eq!(
            operator.poll_line(Duration::ZERO).unwrap(),
            OperatorInput::Line("hi".into())
        );
        assert_eq!(operator.poll_line(Duration::ZERO).unwrap(), OperatorInput::Closed);
    }

    #[test]
    fn test_scripted_display_records() {
        let mut operator = ScriptedOperator::default();
        operator.display("hello");
        assert_eq!(operator.displayed(), &["hello".to_string()]);
    }
}
