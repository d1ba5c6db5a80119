//! Exercise checking. A `.welttest` file holds `EINGABE "..."` input
//! lines and `ERWARTE "..."` expected-output lines, with `---` separating
//! cases and `;` starting comments. A program passes when every case's
//! output matches exactly, in order.

use crate::error::Result;
use crate::interpreter::{Machine, Step, Value, SLOT_COUNT};
use crate::lexer::tokenize;
use crate::parser::Parser;

use std::mem;

/// Steps allowed per test case before the run is declared non-terminating.
/// This is the harness's bounded-ness mechanism; callers with a scheduler
/// race the async runner against a wall clock instead.
pub const STEP_LIMIT: u64 = 100_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub inputs: Vec<String>,
    pub expected: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    pub error: Option<String>,
}

impl Verdict {
    fn pass() -> Verdict {
        Verdict {
            passed: true,
            error: None,
        }
    }

    fn fail<S: Into<String>>(message: S) -> Verdict {
        Verdict {
            passed: false,
            error: Some(message.into()),
        }
    }
}

pub fn parse_welt_test(source: &str) -> Vec<TestCase> {
    let mut cases = vec![];
    let mut inputs: Vec<String> = vec![];
    let mut expected: Vec<String> = vec![];

    for raw in source.lines() {
        let line = raw.trim();

        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        if line == "---" {
            if expected.is_empty() {
                inputs.clear();
            } else {
                cases.push(TestCase {
                    inputs: mem::take(&mut inputs),
                    expected: mem::take(&mut expected),
                });
            }
            continue;
        }

        if let Some(text) = quoted_directive(line, "EINGABE") {
            inputs.push(text);
        } else if let Some(text) = quoted_directive(line, "ERWARTE") {
            expected.push(text);
        }
    }

    if !expected.is_empty() {
        cases.push(TestCase { inputs, expected });
    }

    cases
}

// <keyword> "<text>"
fn quoted_directive(line: &str, keyword: &str) -> Option<String> {
    let rest = line.strip_prefix(keyword)?;
    let rest = rest.strip_prefix(|ch: char| ch.is_whitespace())?;
    let rest = rest.trim_start();
    let rest = rest.strip_prefix('"')?;
    let rest = rest.strip_suffix('"')?;

    Some(rest.to_string())
}

pub fn check(source: &str, tests: &str) -> Verdict {
    check_with_slots(source, tests, Default::default())
}

/// Check against cases with pre-seeded slots (e.g. the residue another
/// program left behind via `boot_slots`).
pub fn check_with_slots(source: &str, tests: &str, slots: [Value; SLOT_COUNT]) -> Verdict {
    let cases = parse_welt_test(tests);
    if cases.is_empty() {
        return Verdict::fail("no test cases found");
    }

    for (index, case) in cases.iter().enumerate() {
        let number = index + 1;

        let outputs = match run_case(source, case, slots.clone()) {
            Ok(outputs) => outputs,
            Err(error) => {
                return Verdict::fail(format!("runtime error in case {}: {}", number, error));
            }
        };

        if outputs.len() != case.expected.len() {
            return Verdict::fail(format!(
                "case {}: expected {} output(s), got {}",
                number,
                case.expected.len(),
                outputs.len()
            ));
        }

        for (output, expected) in outputs.iter().zip(&case.expected) {
            if output != expected {
                return Verdict::fail(format!(
                    "case {}: expected \"{}\", got \"{}\"",
                    number, expected, output
                ));
            }
        }
    }

    Verdict::pass()
}

/// Run a program to completion, ignoring its output, and hand back the
/// final slots for seeding later runs.
pub fn boot_slots(source: &str) -> Result<[Value; SLOT_COUNT]> {
    let program = Parser::new(tokenize(source)).parse()?;
    let mut machine = Machine::new(&program).with_step_limit(STEP_LIMIT);

    loop {
        match machine.step()? {
            Step::AwaitingInput => machine.resume_input("")?,
            Step::Done => return Ok(machine.slots().clone()),
            _ => {}
        }
    }
}

fn run_case(source: &str, case: &TestCase, slots: [Value; SLOT_COUNT]) -> Result<Vec<String>> {
    let program = Parser::new(tokenize(source)).parse()?;
    let mut machine = Machine::with_slots(&program, slots).with_step_limit(STEP_LIMIT);
    let mut outputs = vec![];
    let mut next_input = 0;

    loop {
        match machine.step()? {
            Step::Continue => {}
            Step::Output(text) => outputs.push(text),
            Step::AwaitingInput => {
                let text = case.inputs.get(next_input).map(String::as_str).unwrap_or("");
                next_input += 1;
                machine.resume_input(text)?;
            }
            Step::Done => return Ok(outputs),
        }
    }
}
