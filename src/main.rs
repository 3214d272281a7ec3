use std::io::{self, Read, Write};
use std::process;

use rifjc::translate;

/// The compiler reads the whole source program from stdin, streams the
/// generated code to stdout and exits with 0 on success or the latched
/// error's code on failure; diagnostics go to stderr.
fn main() {
  let mut source = String::new();
  if let Err(err) = io::stdin().read_to_string(&mut source) {
    eprintln!("failed to read source program: {err}");
    process::exit(99);
  }

  let stdout = io::stdout();
  let mut output = io::BufWriter::new(stdout.lock());

  match translate(&source, &mut output) {
    Ok(()) => {
      if let Err(err) = output.flush() {
        eprintln!("failed to write target code: {err}");
        process::exit(99);
      }
    }
    Err(err) => {
      eprintln!("{err}");
      process::exit(err.exit_code());
    }
  }
}
