//! A toy 32-bit processor: eight registers, five arithmetic opcodes and a
//! cycle counter.
//!
//! Values live in registers as unsigned 32-bit words and are read back as
//! two's-complement when the arithmetic needs a sign. Nothing overflows;
//! everything wraps. `r7` doubles as the high word of `mul` and the
//! remainder of `div`.
//!
//! ```
//! use simulator::region::Script;
//! use simulator::session::Session;
//!
//! let mut session = Session::new();
//! session.run(&Script::from("mov r1, 6\nmov r2, -4\nmul r1, r2\nend"));
//! assert_eq!(session.vm().counters().cycles(), 5);
//! ```

pub mod decode;
pub mod logging;
pub mod opcode;
pub mod region;
pub mod report;
pub mod session;
pub mod vm;
