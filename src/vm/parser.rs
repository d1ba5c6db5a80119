use crate::error::{Result, WeltError};

use std::collections::HashMap;
use std::fmt;

/// The 16 opcodes of the DAS-8. The first two characters encode the
/// intent, the final one the mode of appearance (r = register, v = void,
/// n = ring push, b = ring pop, k = carry flag).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    // Perception (I/O)
    Mav,
    Vir,
    Mak,
    Pav,
    // Taking (data)
    Tar,
    Tir,
    Tin,
    Tab,
    // Combining (arithmetic)
    Kur,
    Sur,
    Mur,
    Dur,
    // Reaching (flow)
    Rav,
    Rev,
    Rgv,
    Nov,
}

impl Opcode {
    fn lookup(word: &str) -> Option<Opcode> {
        #[rustfmt::skip]
        let opcode = match word {
            "mav" => Opcode::Mav,
            "vir" => Opcode::Vir,
            "mak" => Opcode::Mak,
            "pav" => Opcode::Pav,
            "tar" => Opcode::Tar,
            "tir" => Opcode::Tir,
            "tin" => Opcode::Tin,
            "tab" => Opcode::Tab,
            "kur" => Opcode::Kur,
            "sur" => Opcode::Sur,
            "mur" => Opcode::Mur,
            "dur" => Opcode::Dur,
            "rav" => Opcode::Rav,
            "rev" => Opcode::Rev,
            "rgv" => Opcode::Rgv,
            "nov" => Opcode::Nov,
            _     => return None,
        };

        Some(opcode)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Register(usize),
    Immediate(i64),
    Label(String),
    Data(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operands: Vec<Operand>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrundProgram {
    pub data: HashMap<String, String>,
    pub instructions: Vec<Instruction>,
    pub labels: HashMap<String, usize>,
}

pub fn parse_grund(source: &str) -> Result<GrundProgram> {
    let mut data = HashMap::new();
    let mut instructions: Vec<Instruction> = vec![];
    let mut labels = HashMap::new();

    let mut in_data = false;
    let mut in_code = false;

    for (index, raw) in source.lines().enumerate() {
        let line_number = index as u32 + 1;
        let line = strip_comment(raw).trim();

        if line.is_empty() {
            continue;
        }

        if line == ".data" {
            in_data = true;
            in_code = false;
            continue;
        }

        if line == ".code" {
            in_code = true;
            in_data = false;
            continue;
        }

        if in_data {
            let (key, value) = parse_data_entry(line, line_number)?;
            data.insert(key, value);
            continue;
        }

        // Headerless sources: the first label or opcode opens the code
        // section implicitly.
        if !in_code {
            let first = line.split_whitespace().next().unwrap_or("");
            if (line.starts_with('.') && line.ends_with(':'))
                || Opcode::lookup(&first.to_lowercase()).is_some()
            {
                in_code = true;
            } else {
                continue;
            }
        }

        if line.ends_with(':') {
            let name = line[..line.len() - 1].trim().to_string();
            labels.insert(name, instructions.len());
            continue;
        }

        instructions.push(parse_instruction(line, line_number)?);
    }

    Ok(GrundProgram {
        data,
        instructions,
        labels,
    })
}

fn strip_comment(line: &str) -> &str {
    let mut in_string = false;

    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            ';' if !in_string => return &line[..index],
            _ => {}
        }
    }

    line
}

// <name><:><"><chars><">
fn parse_data_entry(line: &str, line_number: u32) -> Result<(String, String)> {
    let invalid = || WeltError::syntax(format!("invalid data entry: {}", line), line_number);

    let (key, rest) = line.split_once(':').ok_or_else(invalid)?;
    let key = key.trim();
    if key.is_empty() || !key.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err(invalid());
    }

    let rest = rest.trim();
    if !rest.starts_with('"') || !rest.ends_with('"') || rest.len() < 2 {
        return Err(invalid());
    }

    let mut value = String::new();
    let mut chars = rest[1..rest.len() - 1].chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some('"') => value.push('"'),
                Some('\\') => value.push('\\'),
                Some(other) => {
                    value.push('\\');
                    value.push(other);
                }
                None => return Err(invalid()),
            }
        } else if ch == '"' {
            return Err(invalid());
        } else {
            value.push(ch);
        }
    }

    Ok((key.to_string(), value))
}

// <opcode>(<operand>(<,><operand>)*)?
fn parse_instruction(line: &str, line_number: u32) -> Result<Instruction> {
    let mut parts = line
        .split(|ch: char| ch.is_whitespace() || ch == ',')
        .filter(|part| !part.is_empty());

    let word = parts.next().unwrap_or("").to_lowercase();
    let opcode = Opcode::lookup(&word)
        .ok_or_else(|| WeltError::syntax(format!("unknown opcode: {}", word), line_number))?;

    let operands = parts
        .map(|part| parse_operand(part, line_number))
        .collect::<Result<Vec<_>>>()?;

    Ok(Instruction {
        opcode,
        operands,
        line: line_number,
    })
}

fn parse_operand(token: &str, line_number: u32) -> Result<Operand> {
    let lower = token.to_lowercase();
    let bytes = lower.as_bytes();

    if bytes.len() == 2 && bytes[0] == b'r' && bytes[1].is_ascii_digit() {
        let index = (bytes[1] - b'0') as usize;
        if index > 7 {
            return Err(WeltError::syntax(
                format!("register out of range: {}", token),
                line_number,
            ));
        }
        return Ok(Operand::Register(index));
    }

    if lower.starts_with('.') {
        return Ok(Operand::Label(token.to_string()));
    }

    if bytes.len() > 1 && bytes[0] == b's' && bytes[1..].iter().all(u8::is_ascii_digit) {
        return Ok(Operand::Data(lower));
    }

    if let Ok(value) = token.parse::<i64>() {
        return Ok(Operand::Immediate(value));
    }

    Err(WeltError::syntax(
        format!("invalid operand: {}", token),
        line_number,
    ))
}
