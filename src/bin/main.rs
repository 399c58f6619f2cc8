use std::env;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use simulator::logging::{self, LogConfig};
use simulator::region::Script;
use simulator::session::{Flow, Session};

fn main() -> ExitCode {
  if let Err(err) = logging::init(&LogConfig::from_env()) {
    eprintln!("{err}");
  }

  let args: Vec<String> = env::args().skip(1).collect();
  let session = match args.as_slice() {
    [] => run_interactive(),
    [path] => run_file(path),
    _ => {
      eprintln!("usage: isa32 [SCRIPT]");
      return ExitCode::from(2);
    }
  };

  match session {
    Ok(session) => {
      print!("\n{}", session.snapshot());
      ExitCode::SUCCESS
    }
    Err(err) => {
      eprintln!("error: {err}");
      ExitCode::FAILURE
    }
  }
}

fn run_file(path: &str) -> io::Result<Session> {
  println!("Running instructions from file: {path}");
  let script = Script::open(path)?;
  let mut session = Session::new();
  let summary = session.run(&script);
  for rejection in &summary.rejected {
    eprintln!("{rejection}");
  }
  Ok(session)
}

fn run_interactive() -> io::Result<Session> {
  println!("32-bit ISA Simulator (Interactive Mode)");
  println!("Type instructions like: MOV r1, 3 | ADD r1, r1, 5 | MUL r2, r1");
  println!("Type END or EXIT to finish and show results.\n");

  let mut session = Session::new();
  let stdin = io::stdin();
  let mut stdout = io::stdout();
  let mut line = String::new();
  for number in 1.. {
    print!(">> ");
    stdout.flush()?;
    line.clear();
    if stdin.lock().read_line(&mut line)? == 0 {
      // eof
      println!();
      break;
    }
    match session.feed(number, &line) {
      Ok(Flow::Continue) => {}
      Ok(Flow::Halt) => break,
      Err(rejection) => eprintln!("{rejection}"),
    }
  }
  Ok(session)
}
