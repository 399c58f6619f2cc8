//! Line-at-a-time driving of a [`Vm`].
//!
//! A session decodes each line against the live machine and executes it.
//! Rejected lines come back to the caller as [`Rejection`]s, which the caller
//! must show to the user. Rejections never end a run; only the terminator
//! (or running out of lines) does.

use std::fmt;

use crate::decode::{self, decode_line};
use crate::opcode::Instruction;
use crate::region::Region;
use crate::report::Snapshot;
use crate::vm::{self, Vm};

/// What the caller should do after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
  Continue,
  Halt,
}

/// Why a single line had no effect
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
  #[error("malformed instruction: {0}")]
  Decode(#[from] decode::Error),

  #[error("execution fault: {0}")]
  Execute(#[from] vm::Error),
}

/// A rejected line and where it was
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
  pub line: usize,
  pub error: LineError,
}

impl fmt::Display for Rejection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "line {}: {}", self.line, self.error)
  }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
  /// Lines consumed, including the terminator
  pub lines: usize,
  pub rejected: Vec<Rejection>,
  /// Whether the run stopped on `end`/`exit` rather than running out of lines
  pub halted: bool,
}

#[derive(Debug, Default)]
pub struct Session {
  vm: Vm,
}

impl Session {
  pub fn new() -> Self {
    Self { vm: Vm::new() }
  }

  pub fn vm(&self) -> &Vm {
    &self.vm
  }

  /// Decode and execute one line. Blank and comment lines are a no-op.
  pub fn execute_line(&mut self, line: &str) -> Result<Flow, LineError> {
    let Some(instruction) = decode_line(line, &self.vm)? else {
      return Ok(Flow::Continue);
    };
    if instruction == Instruction::Halt {
      tracing::debug!(
        instructions = self.vm.counters().instructions(),
        cycles = self.vm.counters().cycles(),
        "halted"
      );
      return Ok(Flow::Halt);
    }
    self.vm.step(instruction)?;
    Ok(Flow::Continue)
  }

  /// Like [`Session::execute_line`], tagging a rejection with its line number.
  pub fn feed(&mut self, number: usize, line: &str) -> Result<Flow, Rejection> {
    self.execute_line(line).map_err(|error| {
      tracing::debug!(line = number, text = line.trim(), "rejected: {error}");
      Rejection {
        line: number,
        error,
      }
    })
  }

  /// Feed every line of `region` until it runs out or halts.
  pub fn run<R>(&mut self, region: &R) -> RunSummary
  where
    R: Region,
  {
    let _span = tracing::debug_span!("run").entered();
    let mut summary = RunSummary::default();
    for (number, line) in (1..).zip(region.lines()) {
      summary.lines = number;
      match self.feed(number, line) {
        Ok(Flow::Continue) => {}
        Ok(Flow::Halt) => {
          summary.halted = true;
          break;
        }
        Err(rejection) => summary.rejected.push(rejection),
      }
    }
    tracing::debug!(
      lines = summary.lines,
      rejected = summary.rejected.len(),
      halted = summary.halted,
      "run finished"
    );
    summary
  }

  pub fn snapshot(&self) -> Snapshot {
    self.vm.snapshot()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::region::Script;
  use crate::vm::{signed, Register, HI};

  fn r(index: usize) -> Register {
    Register::new(index).unwrap()
  }

  #[test]
  fn blank_and_comment_lines_change_nothing() {
    let mut session = Session::new();
    for line in ["", "   ", "# comment", "; another"] {
      assert_eq!(session.execute_line(line), Ok(Flow::Continue));
    }
    assert_eq!(session.snapshot(), Vm::new().snapshot());
  }

  #[test]
  fn decode_and_engine_errors_are_distinct() {
    let mut session = Session::new();
    assert!(matches!(
      session.execute_line("bogus r1"),
      Err(LineError::Decode(_))
    ));
    assert!(matches!(
      session.execute_line("mov r8, 1"),
      Err(LineError::Decode(decode::Error::RegisterOutOfRange(_)))
    ));
    assert_eq!(
      session.execute_line("div r1, r2"),
      Err(LineError::Execute(vm::Error::DivisionByZero {
        rd: r(1),
        rs: r(2)
      }))
    );
  }

  #[test]
  fn division_by_zero_leaves_state_alone() {
    let mut session = Session::new();
    session.execute_line("mov r1, 5").unwrap();
    session.execute_line("mov r2, 0").unwrap();
    let before = session.snapshot();
    assert!(session.execute_line("div r1, r2").is_err());
    assert_eq!(session.snapshot(), before);
    assert_eq!(session.vm().counters().instructions(), 2);
  }

  #[test]
  fn run_continues_past_rejections() {
    let script: Script = "mov r1 10\nfrobnicate\nmov r2 0\ndiv r1 r2\nsub r1 4\n".into();
    let mut session = Session::new();
    let summary = session.run(&script);
    assert_eq!(summary.lines, 5);
    assert!(!summary.halted);
    let lines: Vec<_> = summary.rejected.iter().map(|r| r.line).collect();
    assert_eq!(lines, [2, 4]);
    assert_eq!(session.vm().read(r(1)), 6);
    assert_eq!(session.vm().counters().instructions(), 3);
  }

  #[test]
  fn run_stops_at_terminator() {
    let script: Script = "mov r1 1\nEXIT\nmov r1 2\n".into();
    let mut session = Session::new();
    let summary = session.run(&script);
    assert!(summary.halted);
    assert_eq!(summary.lines, 2);
    assert_eq!(session.vm().read(r(1)), 1);
    assert_eq!(session.vm().counters().instructions(), 1);
  }

  #[test]
  fn sources_are_read_at_decode_time() {
    let mut session = Session::new();
    session.execute_line("mov r1, -7").unwrap();
    session.execute_line("mov r2, r1").unwrap();
    session.execute_line("add r3, r2, r1").unwrap();
    assert_eq!(signed(session.vm().read(r(3))), -14);
    session.execute_line("mov r4, 2").unwrap();
    session.execute_line("div r1, r4").unwrap();
    assert_eq!(signed(session.vm().read(r(1))), -3);
    assert_eq!(signed(session.vm().read(HI)), -1);
  }

  #[test]
  fn rejection_display() {
    let rejection = Rejection {
      line: 3,
      error: LineError::Execute(vm::Error::DivisionByZero { rd: r(1), rs: r(2) }),
    };
    assert_eq!(
      rejection.to_string(),
      "line 3: execution fault: division by zero: r1 / r2"
    );
  }

  #[test]
  fn every_rejection_is_handed_back() {
    let script: Script = "mov r1 5\ndiv r1 r2\nfoo r1\nmov r9 1\nend\n".into();
    let mut session = Session::new();
    let summary = session.run(&script);
    let messages: Vec<_> = summary.rejected.iter().map(|r| r.to_string()).collect();
    assert_eq!(
      messages,
      [
        "line 2: execution fault: division by zero: r1 / r2",
        "line 3: malformed instruction: unknown opcode `foo`",
        "line 4: malformed instruction: register `r9` does not exist (expected r0..r7)",
      ]
    );
  }

  #[test]
  fn feed_returns_the_rejection() {
    let mut session = Session::new();
    let rejection = session.feed(9, "div r3, r4").unwrap_err();
    assert_eq!(rejection.line, 9);
    assert!(matches!(
      rejection.error,
      LineError::Execute(vm::Error::DivisionByZero { .. })
    ));
  }
}
