use welt_lang::compiler::compile;
use welt_lang::repl::{repl, run_source};

use std::env;
use std::fs;
use std::process;

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    match args.as_slice() {
        [] => {
            println!(
                "WELT {} -- Die Welt ist meine Vorstellung.",
                env!("CARGO_PKG_VERSION")
            );
            println!("End a program with VERNEINUNG to run it; `quit` leaves.");

            if let Err(error) = repl() {
                eprintln!("{}", error);
                process::exit(1);
            }
        }
        [flag, path] if flag == "--grund" => match compile(&read(path), Some(path.as_str())) {
            Ok(assembly) => print!("{}", assembly),
            Err(error) => {
                eprintln!("{}", error);
                process::exit(1);
            }
        },
        [path] => {
            if let Err(error) = run_source(&read(path)) {
                eprintln!("{}", error);
                process::exit(1);
            }
        }
        _ => {
            eprintln!("usage: welt [--grund] [file.welt]");
            process::exit(2);
        }
    }
}

fn read(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("{}: {}", path, error);
            process::exit(1);
        }
    }
}
