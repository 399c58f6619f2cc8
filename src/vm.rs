use std::fmt;

use crate::opcode::{Instruction, Opcode};
use crate::report::Snapshot;

/// The canonical storage form of a register: an unsigned 32-bit magnitude
pub type Word = u32;

/// Number of general purpose registers
pub const REGISTER_COUNT: usize = 8;

/// Receives the high word of `mul` and the remainder of `div`
pub const HI: Register = Register(7);

/// Reduce an integer to its low 32 bits.
#[inline]
pub const fn wrap(x: i64) -> Word {
  x as Word
}

/// Two's-complement view of a stored word.
#[inline]
pub const fn signed(x: Word) -> i32 {
  x as i32
}

/// A register index known to be in `0..REGISTER_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Register(u8);

impl Register {
  pub fn new(index: usize) -> Result<Self, Error> {
    if index < REGISTER_COUNT {
      Ok(Self(index as u8))
    } else {
      Err(Error::RegisterOutOfRange(index))
    }
  }

  #[inline]
  pub const fn index(self) -> usize {
    self.0 as usize
  }
}

impl TryFrom<usize> for Register {
  type Error = Error;

  fn try_from(index: usize) -> Result<Self, Self::Error> {
    Self::new(index)
  }
}

impl fmt::Display for Register {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "r{}", self.0)
  }
}

/// Running totals of executed instructions and the cycles they cost.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
  instructions: u64,
  cycles: u64,
}

impl Counters {
  /// Charge one successful execution of `opcode`.
  pub fn record(&mut self, opcode: Opcode) {
    self.instructions += 1;
    self.cycles += opcode.cycles();
  }

  pub fn instructions(&self) -> u64 {
    self.instructions
  }

  pub fn cycles(&self) -> u64 {
    self.cycles
  }

  /// Average cycles per instruction, or `None` before anything has run.
  pub fn average_cpi(&self) -> Option<f64> {
    if self.instructions == 0 {
      return None;
    }
    Some(self.cycles as f64 / self.instructions as f64)
  }
}

/// A 32-bit processor with eight registers and five arithmetic opcodes.
///
/// Only `div` can fail, and a rejected `div` leaves the registers and the
/// counters exactly as they were. The machine has no control flow of its
/// own; stopping at the terminator is up to whoever feeds it.
#[derive(Debug)]
pub struct Vm {
  registers: [Word; REGISTER_COUNT],
  counters: Counters,
}

impl Vm {
  /// Create a new machine with every register zeroed
  pub fn new() -> Self {
    Self {
      registers: [0; REGISTER_COUNT],
      counters: Counters::default(),
    }
  }

  /// Execute a single decoded instruction. The terminator is a no-op here.
  pub fn step(&mut self, instruction: Instruction) -> Result<(), Error> {
    let Some(opcode) = instruction.opcode() else {
      return Ok(());
    };
    match instruction {
      Instruction::Mov { rd, value } => self.mov(rd, value),
      Instruction::Add { rd, rs, value } => self.add(rd, rs, value),
      Instruction::Sub { rd, rs, value } => self.sub(rd, rs, value),
      Instruction::Mul { rd, rs } => self.mul(rd, rs),
      Instruction::Div { rd, rs } => self.div(rd, rs)?,
      Instruction::Halt => {}
    }
    tracing::trace!(
      %opcode,
      instructions = self.counters.instructions(),
      cycles = self.counters.cycles(),
      "retired"
    );
    Ok(())
  }

  // r[d] ← v
  pub fn mov(&mut self, rd: Register, value: i64) {
    self.write(rd, wrap(value));
    self.counters.record(Opcode::Mov);
  }

  // r[d] ← r[s] + v
  pub fn add(&mut self, rd: Register, rs: Register, value: i64) {
    let sum = signed(self.read(rs)) as i64 + signed(wrap(value)) as i64;
    self.write(rd, wrap(sum));
    self.counters.record(Opcode::Add);
  }

  // r[d] ← r[s] − v
  pub fn sub(&mut self, rd: Register, rs: Register, value: i64) {
    let difference = signed(self.read(rs)) as i64 - signed(wrap(value)) as i64;
    self.write(rd, wrap(difference));
    self.counters.record(Opcode::Sub);
  }

  // p ← r[d] × r[s]; r[d] ← p[31:0]; r7 ← p[63:32]
  pub fn mul(&mut self, rd: Register, rs: Register) {
    let product = signed(self.read(rd)) as i64 * signed(self.read(rs)) as i64;
    self.write(rd, wrap(product));
    // must come second: with rd == r7 the high word wins
    self.write(HI, wrap(product >> 32));
    self.counters.record(Opcode::Mul);
  }

  // r[d] ← r[d] ÷ r[s]; r7 ← r[d] mod r[s]
  pub fn div(&mut self, rd: Register, rs: Register) -> Result<(), Error> {
    let dividend = signed(self.read(rd)) as i64;
    let divisor = signed(self.read(rs)) as i64;
    if divisor == 0 {
      return Err(Error::DivisionByZero { rd, rs });
    }
    // i64 keeps i32::MIN / -1 from trapping; it wraps on the way back
    let quotient = dividend / divisor;
    let remainder = dividend % divisor;
    self.write(rd, wrap(quotient));
    self.write(HI, wrap(remainder));
    self.counters.record(Opcode::Div);
    Ok(())
  }

  #[inline]
  pub fn read(&self, register: Register) -> Word {
    self.registers[register.index()]
  }

  pub fn counters(&self) -> &Counters {
    &self.counters
  }

  /// Copy out the registers and counters for rendering
  pub fn snapshot(&self) -> Snapshot {
    Snapshot::new(self.registers, self.counters)
  }

  #[inline]
  fn write(&mut self, register: Register, value: Word) {
    self.registers[register.index()] = value;
  }
}

impl Default for Vm {
  fn default() -> Self {
    Self::new()
  }
}

/// An error raised by the machine while executing an instruction
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
  #[error("division by zero: {rd} / {rs}")]
  DivisionByZero { rd: Register, rs: Register },

  #[error("register r{0} does not exist (expected r0..r7)")]
  RegisterOutOfRange(usize),
}
