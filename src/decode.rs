//! Turns one line of program text into an [`Instruction`].
//!
//! ```text
//! mov r1, 3        ; r1 ← 3
//! add r1 r1 -4     # r1 ← r1 + (-4)
//! sub r2, r1       ; r2 ← r2 − r1
//! mul r2, r1
//! div r2 r1
//! end
//! ```
//!
//! Commas are optional. Source operands naming a register are read from the
//! machine while decoding, so the engine only ever sees resolved values.

use crate::opcode::{Instruction, Opcode, UnknownOpcode};
use crate::vm::{Register, Vm, REGISTER_COUNT};

const COMMENT_MARKERS: [char; 2] = ['#', ';'];
const TERMINATORS: [&str; 2] = ["end", "exit"];

/// Why a line could not be decoded
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
  #[error(transparent)]
  UnknownMnemonic(#[from] UnknownOpcode),

  #[error("`{mnemonic}` takes {expected} operand(s), found {found}")]
  OperandCount {
    mnemonic: String,
    expected: &'static str,
    found: usize,
  },

  #[error("`{0}` is neither a register nor a decimal integer")]
  InvalidOperand(String),

  #[error("register `{0}` does not exist (expected r0..r{max})", max = REGISTER_COUNT - 1)]
  RegisterOutOfRange(String),

  #[error("`{mnemonic}` expects a register, found immediate `{token}`")]
  ExpectedRegister { mnemonic: Opcode, token: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
  Register(Register),
  Immediate(i64),
}

/// Decode `line` against the current state of `vm`.
///
/// Returns `Ok(None)` for blank and comment-only lines.
pub fn decode_line(line: &str, vm: &Vm) -> Result<Option<Instruction>, Error> {
  let code = match line.find(COMMENT_MARKERS) {
    Some(at) => &line[..at],
    None => line,
  };
  let mut tokens = code
    .split(|c: char| c.is_whitespace() || c == ',')
    .filter(|t| !t.is_empty());
  let Some(mnemonic) = tokens.next() else {
    return Ok(None);
  };
  let operands: Vec<&str> = tokens.collect();

  if TERMINATORS
    .iter()
    .any(|t| t.eq_ignore_ascii_case(mnemonic))
  {
    return match operands.len() {
      0 => Ok(Some(Instruction::Halt)),
      found => Err(Error::OperandCount {
        mnemonic: mnemonic.to_string(),
        expected: "0",
        found,
      }),
    };
  }

  let opcode: Opcode = mnemonic.parse()?;
  let decoder = Decoder { opcode, vm };
  let instruction = match (opcode, operands.as_slice()) {
    (Opcode::Mov, [rd, src]) => Instruction::Mov {
      rd: decoder.register(rd)?,
      value: decoder.value(src)?,
    },
    (Opcode::Add | Opcode::Sub, [rd, src]) => {
      let rd = decoder.register(rd)?;
      decoder.arithmetic(rd, rd, src)?
    }
    (Opcode::Add | Opcode::Sub, [rd, rs, src]) => {
      decoder.arithmetic(decoder.register(rd)?, decoder.register(rs)?, src)?
    }
    (Opcode::Mul, [rd, rs]) => Instruction::Mul {
      rd: decoder.register(rd)?,
      rs: decoder.register(rs)?,
    },
    (Opcode::Div, [rd, rs]) => Instruction::Div {
      rd: decoder.register(rd)?,
      rs: decoder.register(rs)?,
    },
    (_, found) => {
      return Err(Error::OperandCount {
        mnemonic: mnemonic.to_string(),
        expected: arity(opcode),
        found: found.len(),
      })
    }
  };
  Ok(Some(instruction))
}

fn arity(opcode: Opcode) -> &'static str {
  match opcode {
    Opcode::Mov | Opcode::Mul | Opcode::Div => "2",
    Opcode::Add | Opcode::Sub => "2 or 3",
  }
}

struct Decoder<'vm> {
  opcode: Opcode,
  vm: &'vm Vm,
}

impl Decoder<'_> {
  fn register(&self, token: &str) -> Result<Register, Error> {
    match parse_operand(token)? {
      Operand::Register(register) => Ok(register),
      Operand::Immediate(_) => Err(Error::ExpectedRegister {
        mnemonic: self.opcode,
        token: token.to_string(),
      }),
    }
  }

  // registers are dereferenced here, at decode time
  fn value(&self, token: &str) -> Result<i64, Error> {
    Ok(match parse_operand(token)? {
      Operand::Register(register) => self.vm.read(register) as i64,
      Operand::Immediate(value) => value,
    })
  }

  fn arithmetic(&self, rd: Register, rs: Register, src: &str) -> Result<Instruction, Error> {
    let value = self.value(src)?;
    Ok(match self.opcode {
      Opcode::Sub => Instruction::Sub { rd, rs, value },
      _ => Instruction::Add { rd, rs, value },
    })
  }
}

fn parse_operand(token: &str) -> Result<Operand, Error> {
  let digits = token
    .strip_prefix('r')
    .or_else(|| token.strip_prefix('R'))
    .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()));
  if let Some(digits) = digits {
    let out_of_range = || Error::RegisterOutOfRange(token.to_string());
    let index: usize = digits.parse().map_err(|_| out_of_range())?;
    return Register::new(index)
      .map(Operand::Register)
      .map_err(|_| out_of_range());
  }
  parse_immediate(token)
    .map(Operand::Immediate)
    .ok_or_else(|| Error::InvalidOperand(token.to_string()))
}

// decimals wider than i64 are kept modulo 2^32, which is all the machine sees
fn parse_immediate(token: &str) -> Option<i64> {
  if let Ok(value) = token.parse::<i64>() {
    return Some(value);
  }
  let (negative, digits) = match token.strip_prefix('-') {
    Some(digits) => (true, digits),
    None => (false, token.strip_prefix('+').unwrap_or(token)),
  };
  if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  let low = digits
    .bytes()
    .fold(0u32, |acc, b| acc.wrapping_mul(10).wrapping_add((b - b'0') as u32));
  let low = if negative { low.wrapping_neg() } else { low };
  Some(low as i64)
}
