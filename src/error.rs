use std::error::Error;
use std::fmt;

pub type Result<T> = std::result::Result<T, WeltError>;

/// Every fault the crate surfaces. `line` is the 1-based source line the
/// fault is attributed to, or 0 when no line applies (e.g. a missing
/// start marker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeltError {
    SyntaxError { message: String, line: u32 },
    RuntimeError { message: String, line: u32 },
}

impl WeltError {
    pub fn syntax<S>(message: S, line: u32) -> WeltError
    where
        S: Into<String>,
    {
        WeltError::SyntaxError {
            message: message.into(),
            line,
        }
    }

    pub fn runtime<S>(message: S, line: u32) -> WeltError
    where
        S: Into<String>,
    {
        WeltError::RuntimeError {
            message: message.into(),
            line,
        }
    }

    pub fn expected<S, T>(expected: S, got: T, line: u32) -> WeltError
    where
        S: Into<String>,
        T: Into<String>,
    {
        WeltError::syntax(
            format!("expected `{}`, got `{}` instead", expected.into(), got.into()),
            line,
        )
    }

    pub fn type_mismatch<S>(msg: S, line: u32) -> WeltError
    where
        S: Into<String>,
    {
        WeltError::runtime(format!("type mismatch: `{}`", msg.into()), line)
    }

    pub fn division_by_zero(line: u32) -> WeltError {
        WeltError::runtime("division by zero", line)
    }

    pub fn modulo_by_zero(line: u32) -> WeltError {
        WeltError::runtime("modulo by zero", line)
    }

    pub fn slot_out_of_range(index: usize, line: u32) -> WeltError {
        WeltError::runtime(
            format!("slot out of range: `{}` not in `{{0..7}}`", index),
            line,
        )
    }

    pub fn message(&self) -> &str {
        match self {
            WeltError::SyntaxError { message, .. } => message,
            WeltError::RuntimeError { message, .. } => message,
        }
    }

    pub fn line(&self) -> u32 {
        match self {
            WeltError::SyntaxError { line, .. } => *line,
            WeltError::RuntimeError { line, .. } => *line,
        }
    }
}

impl fmt::Display for WeltError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeltError::SyntaxError { message, line: 0 } => write!(f, "syntax error: {}", message),
            WeltError::SyntaxError { message, line } => {
                write!(f, "syntax error: {} (line {})", message, line)
            }
            WeltError::RuntimeError { message, line: 0 } => write!(f, "runtime error: {}", message),
            WeltError::RuntimeError { message, line } => {
                write!(f, "runtime error: {} (line {})", message, line)
            }
        }
    }
}

impl Error for WeltError {}
