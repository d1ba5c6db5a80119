mod compiler;

pub use compiler::{compile, compile_program};
