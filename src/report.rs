//! Read-only views of machine state and their textual rendering.

use std::fmt;

use crate::vm::{signed, Counters, Word, REGISTER_COUNT};

/// One register seen both ways.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterView {
  pub index: usize,
  pub unsigned: Word,
  pub signed: i32,
}

/// Registers and counters captured at one point in time.
///
/// `Display` renders the register dump followed by the performance summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
  registers: [Word; REGISTER_COUNT],
  counters: Counters,
}

impl Snapshot {
  pub fn new(registers: [Word; REGISTER_COUNT], counters: Counters) -> Self {
    Self {
      registers,
      counters,
    }
  }

  pub fn registers(&self) -> impl Iterator<Item = RegisterView> + '_ {
    self
      .registers
      .iter()
      .enumerate()
      .map(|(index, &unsigned)| RegisterView {
        index,
        unsigned,
        signed: signed(unsigned),
      })
  }

  pub fn counters(&self) -> &Counters {
    &self.counters
  }

  /// Just the register dump.
  pub fn registers_display(&self) -> RegisterDump<'_> {
    RegisterDump(self)
  }

  /// Just the performance summary.
  pub fn performance_display(&self) -> Performance<'_> {
    Performance(&self.counters)
  }
}

pub struct RegisterDump<'a>(&'a Snapshot);

impl fmt::Display for RegisterDump<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "REGISTER STATE (Signed / Unsigned / Hex):")?;
    for view in self.0.registers() {
      writeln!(
        f,
        "r{}: {:>12} / {:>12} / 0x{:08X}",
        view.index, view.signed, view.unsigned, view.unsigned
      )?;
    }
    Ok(())
  }
}

pub struct Performance<'a>(&'a Counters);

impl fmt::Display for Performance<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "--- Performance ---")?;
    writeln!(f, "Instructions executed: {}", self.0.instructions())?;
    writeln!(f, "Total cycles:          {}", self.0.cycles())?;
    if let Some(cpi) = self.0.average_cpi() {
      writeln!(f, "Average CPI:           {cpi:.2}")?;
    }
    Ok(())
  }
}

impl fmt::Display for Snapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.registers_display())?;
    writeln!(f)?;
    write!(f, "{}", self.performance_display())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::vm::{Register, Vm};

  #[test]
  fn views_carry_both_interpretations() {
    let mut vm = Vm::new();
    vm.mov(Register::new(2).unwrap(), -1);
    let snapshot = vm.snapshot();
    let view = snapshot.registers().nth(2).unwrap();
    assert_eq!(view.index, 2);
    assert_eq!(view.unsigned, 0xFFFF_FFFF);
    assert_eq!(view.signed, -1);
    assert_eq!(snapshot.registers().count(), REGISTER_COUNT);
  }

  #[test]
  fn register_line_format() {
    let mut vm = Vm::new();
    vm.mov(Register::new(0).unwrap(), -2);
    let dump = vm.snapshot().registers_display().to_string();
    let first = dump.lines().nth(1).unwrap();
    assert_eq!(first, "r0:           -2 /   4294967294 / 0xFFFFFFFE");
  }

  #[test]
  fn cpi_omitted_without_instructions() {
    let text = Vm::new().snapshot().performance_display().to_string();
    assert!(text.contains("Instructions executed: 0"));
    assert!(!text.contains("Average CPI"));
  }

  #[test]
  fn cpi_rounded_to_two_places() {
    let mut vm = Vm::new();
    let r1 = Register::new(1).unwrap();
    vm.mov(r1, 1);
    vm.mov(r1, 1);
    vm.mul(r1, r1);
    let text = vm.snapshot().performance_display().to_string();
    assert!(text.contains("Average CPI:           1.67"));
  }
}
