use std::env;
use std::fs;
use std::process;

fn main() {
  let _ = simple_logger::SimpleLogger::new().env().init();

  let args: Vec<String> = env::args().collect();
  if args.len() < 2 || args.len() > 3 {
    let program = args.first().map(String::as_str).unwrap_or("rbfc");
    eprintln!("usage: {program} <source-file> [output-file]");
    process::exit(1);
  }

  let source = match fs::read_to_string(&args[1]) {
    Ok(source) => source,
    Err(err) => {
      eprintln!("failed to read {}: {err}", args[1]);
      process::exit(1);
    }
  };

  let code = match rbfc::compile(&source) {
    Ok(code) => code,
    Err(err) => {
      eprintln!("{err}");
      process::exit(1);
    }
  };

  match args.get(2) {
    Some(path) => {
      if let Err(err) = fs::write(path, &code) {
        eprintln!("failed to write {path}: {err}");
        process::exit(1);
      }
    }
    None => println!("{code}"),
  }
}
