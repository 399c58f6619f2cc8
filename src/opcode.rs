use std::fmt;
use std::str::FromStr;

use crate::vm::Register;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
  /// Moves a resolved value into a register.
  ///
  /// | Operation | Semantics/RTL  | Assembly       | Cycles |
  /// |-----------|----------------|----------------|--------|
  /// | Move      | `r[d] ← v`     | `mov rd, v`    | 1      |
  Mov,

  /// Adds a value to a register, wrapping at 32 bits.
  ///
  /// | Operation | Semantics/RTL      | Assembly         | Cycles |
  /// |-----------|--------------------|------------------|--------|
  /// | Add       | `r[d] ← r[s] + v`  | `add rd, rs, v`  | 1      |
  /// | Add       | `r[d] ← r[d] + v`  | `add rd, v`      | 1      |
  Add,

  /// Subtracts a value from a register, wrapping at 32 bits.
  ///
  /// | Operation | Semantics/RTL      | Assembly         | Cycles |
  /// |-----------|--------------------|------------------|--------|
  /// | Subtract  | `r[d] ← r[s] − v`  | `sub rd, rs, v`  | 1      |
  /// | Subtract  | `r[d] ← r[d] − v`  | `sub rd, v`      | 1      |
  Sub,

  /// Signed multiply producing a 64-bit result split over two registers.
  ///
  /// | Operation | Semantics/RTL                                | Assembly     | Cycles |
  /// |-----------|----------------------------------------------|--------------|--------|
  /// | Multiply  | `p ← r[d] × r[s]; r[d] ← p[31:0]; r7 ← p[63:32]` | `mul rd, rs` | 3      |
  ///
  /// `r7` is written last, so `mul r7, rs` leaves the high word in `r7`.
  Mul,

  /// Signed division truncating toward zero.
  ///
  /// | Operation | Semantics/RTL                       | Assembly     | Cycles |
  /// |-----------|-------------------------------------|--------------|--------|
  /// | Divide    | `r[d] ← r[d] ÷ r[s]; r7 ← r[d] mod r[s]` | `div rd, rs` | 4      |
  ///
  /// The remainder takes the sign of the dividend.
  Div,
}

impl Opcode {
  pub const ALL: [Self; 5] = [Self::Mov, Self::Add, Self::Sub, Self::Mul, Self::Div];

  /// Clock cycles charged for one execution of this opcode.
  pub const fn cycles(self) -> u64 {
    match self {
      Self::Mov | Self::Add | Self::Sub => 1,
      Self::Mul => 3,
      Self::Div => 4,
    }
  }

  pub const fn mnemonic(self) -> &'static str {
    match self {
      Self::Mov => "MOV",
      Self::Add => "ADD",
      Self::Sub => "SUB",
      Self::Mul => "MUL",
      Self::Div => "DIV",
    }
  }
}

impl fmt::Display for Opcode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.mnemonic())
  }
}

/// Returned when a mnemonic names no opcode.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown opcode `{0}`")]
pub struct UnknownOpcode(pub String);

impl FromStr for Opcode {
  type Err = UnknownOpcode;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|op| op.mnemonic().eq_ignore_ascii_case(s))
      .ok_or_else(|| UnknownOpcode(s.to_string()))
  }
}

/// A fully decoded instruction with its source operands already resolved.
///
/// `value` carries either an immediate or the content a source register held
/// when the line was decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
  Mov { rd: Register, value: i64 },
  Add { rd: Register, rs: Register, value: i64 },
  Sub { rd: Register, rs: Register, value: i64 },
  Mul { rd: Register, rs: Register },
  Div { rd: Register, rs: Register },
  /// `end` / `exit`
  Halt,
}

impl Instruction {
  /// The opcode charged for this instruction, `None` for the terminator.
  pub fn opcode(&self) -> Option<Opcode> {
    match self {
      Self::Mov { .. } => Some(Opcode::Mov),
      Self::Add { .. } => Some(Opcode::Add),
      Self::Sub { .. } => Some(Opcode::Sub),
      Self::Mul { .. } => Some(Opcode::Mul),
      Self::Div { .. } => Some(Opcode::Div),
      Self::Halt => None,
    }
  }
}
