use welt_lang::repl::StdioHost;
use welt_lang::runner::run_grund;

use std::env;
use std::fs;
use std::process;

use futures::executor::block_on;

fn main() {
    let path = match env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("usage: grund <file.grund>");
            process::exit(2);
        }
    };

    let source = match fs::read_to_string(&path) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("{}: {}", path, error);
            process::exit(1);
        }
    };

    if let Err(error) = block_on(run_grund(&source, &mut StdioHost)) {
        eprintln!("{}", error);
        process::exit(1);
    }
}
