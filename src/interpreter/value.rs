use std::fmt;

/// A slot value. Slots are dynamically typed: legality of an operation is
/// decided against the variant present at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    /// Conversion applied to host input lines: numeric text becomes a
    /// number, blank input reads as 0, anything else is kept as text.
    pub fn from_input(text: &str) -> Value {
        let trimmed = text.trim();

        if trimmed.is_empty() {
            Value::Number(0.0)
        } else if let Ok(number) = trimmed.parse::<f64>() {
            Value::Number(number)
        } else {
            Value::Text(text.to_string())
        }
    }

    /// Numeric view with text coercion. The WELT evaluator never coerces;
    /// this exists for the GRUND machine, which does.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Some(0.0)
                } else {
                    trimmed.parse().ok()
                }
            }
        }
    }
}

impl Default for Value {
    fn default() -> Value {
        Value::Number(0.0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Integral numbers print without a decimal point, so printing a
            // freshly assigned integer round-trips its decimal text.
            Value::Number(n) if n.fract() == 0.0 && n.is_finite() => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}
