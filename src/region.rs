use std::fs;
use std::io;
use std::path::Path;

/// A body of program text, one instruction per line
pub trait Region {
  fn source(&self) -> &str;

  fn lines(&self) -> std::str::Lines<'_> {
    self.source().lines()
  }
}

/// A `Script` is a whole program held in memory, as read from a file or
/// embedded in a test
pub struct Script {
  source: String,
}

impl Script {
  pub fn open<P>(path: P) -> io::Result<Self>
  where
    P: AsRef<Path>,
  {
    fs::read_to_string(path).map(Self::from)
  }
}

impl From<String> for Script {
  fn from(source: String) -> Self {
    Self { source }
  }
}

impl From<&str> for Script {
  fn from(source: &str) -> Self {
    Self {
      source: source.to_string(),
    }
  }
}

impl Region for Script {
  fn source(&self) -> &str {
    &self.source
  }
}
