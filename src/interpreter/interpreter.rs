use crate::error::{Result, WeltError};
use crate::interpreter::value::Value;
use crate::parser::ast::{BinOp, CmpOp, Condition, Expression, Program, Statement, StmtKind};

pub const SLOT_COUNT: usize = 8;

/// One bounded unit of work performed by `Machine::step`.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Continue,
    Output(String),
    AwaitingInput,
    Done,
}

enum Frame<'a> {
    Block {
        stmts: &'a [Statement],
        pos: usize,
    },
    Loop {
        cond: &'a Condition,
        body: &'a [Statement],
        pos: usize,
        line: u32,
    },
}

enum Advance<'a> {
    Stmt(&'a Statement),
    Pop,
    Recheck(&'a Condition, u32),
    Finished,
}

/// The execution state of one program run: 8 slots, a control-flow frame
/// stack, and the current line for error attribution. A machine is used
/// for exactly one run and driven by repeated `step` calls; it performs a
/// bounded amount of work per call (at most one statement, and a loop
/// iteration costs at least one call for its condition re-check), which is
/// what lets the driver stay cancellable against a tight loop.
pub struct Machine<'a> {
    slots: [Value; SLOT_COUNT],
    frames: Vec<Frame<'a>>,
    pending_read: Option<usize>,
    line: u32,
    steps: u64,
    step_limit: Option<u64>,
    done: bool,
}

impl<'a> Machine<'a> {
    pub fn new(program: &'a Program) -> Machine<'a> {
        Machine::with_slots(program, Default::default())
    }

    /// Start with pre-populated slots instead of the all-zero default.
    pub fn with_slots(program: &'a Program, slots: [Value; SLOT_COUNT]) -> Machine<'a> {
        Machine {
            slots,
            frames: vec![Frame::Block {
                stmts: &program.statements,
                pos: 0,
            }],
            pending_read: None,
            line: 0,
            steps: 0,
            step_limit: None,
            done: false,
        }
    }

    /// Abort with a runtime error once `limit` steps have executed. Off by
    /// default; drivers that cannot race a wall clock (like the exercise
    /// harness) use this to stay bounded.
    pub fn with_step_limit(mut self, limit: u64) -> Machine<'a> {
        self.step_limit = Some(limit);
        self
    }

    pub fn slots(&self) -> &[Value; SLOT_COUNT] {
        &self.slots
    }

    pub fn step(&mut self) -> Result<Step> {
        if self.done {
            return Ok(Step::Done);
        }
        if self.pending_read.is_some() {
            return Ok(Step::AwaitingInput);
        }
        if let Some(limit) = self.step_limit {
            if self.steps >= limit {
                return Err(WeltError::runtime("step limit exceeded", self.line));
            }
        }
        self.steps += 1;

        let stmt = loop {
            let next = match self.frames.last_mut() {
                None => Advance::Finished,
                Some(Frame::Block { stmts, pos }) => {
                    let stmts: &'a [Statement] = *stmts;
                    if *pos < stmts.len() {
                        *pos += 1;
                        Advance::Stmt(&stmts[*pos - 1])
                    } else {
                        Advance::Pop
                    }
                }
                Some(Frame::Loop {
                    cond,
                    body,
                    pos,
                    line,
                }) => {
                    let cond: &'a Condition = *cond;
                    let body: &'a [Statement] = *body;
                    if *pos < body.len() {
                        *pos += 1;
                        Advance::Stmt(&body[*pos - 1])
                    } else {
                        *pos = 0;
                        Advance::Recheck(cond, *line)
                    }
                }
            };

            match next {
                Advance::Stmt(stmt) => break stmt,
                Advance::Pop => {
                    self.frames.pop();
                }
                Advance::Recheck(cond, line) => {
                    self.line = line;
                    if !eval_condition(cond, &self.slots, line)? {
                        self.frames.pop();
                    }
                    return Ok(Step::Continue);
                }
                Advance::Finished => {
                    self.done = true;
                    return Ok(Step::Done);
                }
            }
        };

        self.exec(stmt)
    }

    /// Complete the pending `WILLE` by binding one host-supplied line.
    pub fn resume_input(&mut self, text: &str) -> Result<()> {
        match self.pending_read.take() {
            Some(slot) => self.store(slot, Value::from_input(text)),
            None => Err(WeltError::runtime("no read is awaiting input", self.line)),
        }
    }

    fn exec(&mut self, stmt: &'a Statement) -> Result<Step> {
        self.line = stmt.line;

        match &stmt.kind {
            StmtKind::Assign { slot, expr } => {
                let value = eval_expr(expr, &self.slots, stmt.line)?;
                self.store(*slot, value)?;
                Ok(Step::Continue)
            }
            StmtKind::Print(expr) => {
                let value = eval_expr(expr, &self.slots, stmt.line)?;
                Ok(Step::Output(value.to_string()))
            }
            StmtKind::Read { slot } => {
                if *slot >= SLOT_COUNT {
                    return Err(WeltError::slot_out_of_range(*slot, stmt.line));
                }
                self.pending_read = Some(*slot);
                Ok(Step::AwaitingInput)
            }
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } => {
                let body = if eval_condition(cond, &self.slots, stmt.line)? {
                    then_body
                } else {
                    else_body
                };
                if !body.is_empty() {
                    self.frames.push(Frame::Block {
                        stmts: body.as_slice(),
                        pos: 0,
                    });
                }
                Ok(Step::Continue)
            }
            StmtKind::While { cond, body } => {
                if eval_condition(cond, &self.slots, stmt.line)? {
                    self.frames.push(Frame::Loop {
                        cond,
                        body: body.as_slice(),
                        pos: 0,
                        line: stmt.line,
                    });
                }
                Ok(Step::Continue)
            }
            StmtKind::Halt => {
                self.frames.clear();
                self.done = true;
                Ok(Step::Done)
            }
        }
    }

    fn store(&mut self, slot: usize, value: Value) -> Result<()> {
        if slot >= SLOT_COUNT {
            return Err(WeltError::slot_out_of_range(slot, self.line));
        }
        self.slots[slot] = value;
        Ok(())
    }
}

pub fn eval_expr(expr: &Expression, slots: &[Value; SLOT_COUNT], line: u32) -> Result<Value> {
    match expr {
        Expression::Literal(value) => Ok(value.clone()),
        Expression::Slot(index) => {
            if *index < SLOT_COUNT {
                Ok(slots[*index].clone())
            } else {
                Err(WeltError::slot_out_of_range(*index, line))
            }
        }
        Expression::Binary { op, left, right } => {
            let left = eval_expr(left, slots, line)?;
            let right = eval_expr(right, slots, line)?;
            eval_binary(*op, left, right, line)
        }
    }
}

// Arithmetic is defined on numbers only; text never participates, so any
// text operand is a typed fault rather than a coercion.
fn eval_binary(op: BinOp, left: Value, right: Value, line: u32) -> Result<Value> {
    #[rustfmt::skip]
    let value = match (&left, op, &right) {
        (Value::Number(n), BinOp::Add, Value::Number(m)) => Value::Number(n + m),
        (Value::Number(n), BinOp::Sub, Value::Number(m)) => Value::Number(n - m),
        (Value::Number(n), BinOp::Mul, Value::Number(m)) => Value::Number(n * m),
        (Value::Number(n), BinOp::Div, Value::Number(m)) => {
            if *m == 0.0 {
                return Err(WeltError::division_by_zero(line));
            }
            Value::Number((n / m).floor())
        }
        (Value::Number(n), BinOp::Mod, Value::Number(m)) => {
            if *m == 0.0 {
                return Err(WeltError::modulo_by_zero(line));
            }
            Value::Number(n % m)
        }
        (left, op, right) => {
            return Err(WeltError::type_mismatch(
                format!("{} {} {}", fmt_operand(left), op, fmt_operand(right)),
                line,
            ));
        }
    };

    Ok(value)
}

pub fn eval_condition(cond: &Condition, slots: &[Value; SLOT_COUNT], line: u32) -> Result<bool> {
    let left = eval_expr(&cond.left, slots, line)?;
    let right = eval_expr(&cond.right, slots, line)?;

    #[rustfmt::skip]
    let truth = match (&left, cond.op, &right) {
        (Value::Number(n), CmpOp::Eq , Value::Number(m)) => n == m,
        (Value::Number(n), CmpOp::Neq, Value::Number(m)) => n != m,
        (Value::Number(n), CmpOp::Lt , Value::Number(m)) => n < m,
        (Value::Number(n), CmpOp::Gt , Value::Number(m)) => n > m,
        (Value::Number(n), CmpOp::Le , Value::Number(m)) => n <= m,
        (Value::Number(n), CmpOp::Ge , Value::Number(m)) => n >= m,

        (Value::Text(a), CmpOp::Eq , Value::Text(b)) => a == b,
        (Value::Text(a), CmpOp::Neq, Value::Text(b)) => a != b,

        (left, op, right) => {
            return Err(WeltError::type_mismatch(
                format!("{} {} {}", fmt_operand(left), op, fmt_operand(right)),
                line,
            ));
        }
    };

    Ok(truth)
}

fn fmt_operand(value: &Value) -> String {
    match value {
        Value::Text(s) => format!("\"{}\"", s),
        number => number.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::lexer::tokenize;
    use crate::parser::Parser;

    use lazy_static::lazy_static;
    use test_case::test_case;

    fn run(source: &str, inputs: &[&str]) -> Result<Vec<String>> {
        let program = Parser::new(tokenize(source)).parse().unwrap();
        let mut machine = Machine::new(&program);
        let mut outputs = vec![];
        let mut next_input = 0;

        loop {
            match machine.step()? {
                Step::Continue => {}
                Step::Output(text) => outputs.push(text),
                Step::AwaitingInput => {
                    let text = inputs.get(next_input).copied().unwrap_or("");
                    next_input += 1;
                    machine.resume_input(text)?;
                }
                Step::Done => return Ok(outputs),
            }
        }
    }

    #[rustfmt::skip]
    lazy_static! {
        static ref COUNTDOWN: &'static str =
            "ERWACHE\n\
             DING 0 = 0\n\
             SOLANGE DING 0 < 3\n\
                 VORSTELLUNG DING 0\n\
                 DING 0 = DING 0 + 1\n\
             ENDE\n\
             VERNEINUNG";

        static ref HALT_IN_LOOP: &'static str =
            "ERWACHE\n\
             DING 0 = 0\n\
             SOLANGE DING 0 < 10\n\
                 VORSTELLUNG DING 0\n\
                 WENN DING 0 = 2 DANN\n\
                     VERNEINUNG\n\
                 ENDE\n\
                 DING 0 = DING 0 + 1\n\
             ENDE";

        static ref NESTED_SONST: &'static str =
            "ERWACHE\n\
             DING 0 = 2\n\
             WENN DING 0 = 1 DANN\n\
                 VORSTELLUNG \"one\"\n\
             SONST\n\
                 WENN DING 0 = 2 DANN\n\
                     VORSTELLUNG \"two\"\n\
                 SONST\n\
                     VORSTELLUNG \"other\"\n\
                 ENDE\n\
             ENDE\n\
             VERNEINUNG";

        static ref FIZZBUZZ: &'static str =
            "ERWACHE\n\
             DING 0 = 1\n\
             SOLANGE DING 0 <= 15\n\
                 DING 1 = DING 0 MOD 15\n\
                 DING 2 = DING 0 MOD 3\n\
                 DING 3 = DING 0 MOD 5\n\
                 WENN DING 1 = 0 DANN\n\
                     VORSTELLUNG \"FizzBuzz\"\n\
                 SONST\n\
                     WENN DING 2 = 0 DANN\n\
                         VORSTELLUNG \"Fizz\"\n\
                     SONST\n\
                         WENN DING 3 = 0 DANN\n\
                             VORSTELLUNG \"Buzz\"\n\
                         SONST\n\
                             VORSTELLUNG DING 0\n\
                         ENDE\n\
                     ENDE\n\
                 ENDE\n\
                 DING 0 = DING 0 + 1\n\
             ENDE\n\
             VERNEINUNG";
    }

    #[test_case(
        "ERWACHE\nVORSTELLUNG \"Hallo, Welt!\"\nVERNEINUNG",
        &["Hallo, Welt!"] ;
        "string literal output"
    )]
    #[test_case(
        "ERWACHE\nDING 0 = 5\nVORSTELLUNG DING 0\nVERNEINUNG",
        &["5"] ;
        "number round trip"
    )]
    #[test_case(
        "ERWACHE\nDING 0 = 300\nVORSTELLUNG DING 0\nVERNEINUNG",
        &["300"] ;
        "numbers do not wrap"
    )]
    #[test_case(
        "ERWACHE\nDING 3 = \"test\"\nVORSTELLUNG DING 3\nVERNEINUNG",
        &["test"] ;
        "text round trip"
    )]
    #[test_case(
        "ERWACHE\nVORSTELLUNG DING 5\nVERNEINUNG",
        &["0"] ;
        "slots default to zero"
    )]
    #[test_case(
        "ERWACHE\nDING 0 = 3 + 4\nVORSTELLUNG DING 0\nVERNEINUNG",
        &["7"] ;
        "addition"
    )]
    #[test_case(
        "ERWACHE\nDING 0 = 5 - 10\nVORSTELLUNG DING 0\nVERNEINUNG",
        &["-5"] ;
        "subtraction can go negative"
    )]
    #[test_case(
        "ERWACHE\nDING 0 = 6 * 7\nVORSTELLUNG DING 0\nVERNEINUNG",
        &["42"] ;
        "multiplication"
    )]
    #[test_case(
        "ERWACHE\nDING 0 = 7 / 2\nVORSTELLUNG DING 0\nVERNEINUNG",
        &["3"] ;
        "division floors"
    )]
    #[test_case(
        "ERWACHE\nDING 0 = 17 MOD 5\nVORSTELLUNG DING 0\nVERNEINUNG",
        &["2"] ;
        "modulo"
    )]
    #[test_case(
        "ERWACHE\nDING 0 = 2 + 3 * 4\nVORSTELLUNG DING 0\nVERNEINUNG",
        &["14"] ;
        "precedence"
    )]
    #[test_case(
        "ERWACHE\nDING 0 = 1\nWENN DING 0 = 1 DANN\nVORSTELLUNG \"yes\"\nENDE\nVERNEINUNG",
        &["yes"] ;
        "if taken"
    )]
    #[test_case(
        "ERWACHE\nDING 0 = 0\nWENN DING 0 = 1 DANN\nVORSTELLUNG \"yes\"\nENDE\nVORSTELLUNG \"after\"\nVERNEINUNG",
        &["after"] ;
        "if skipped"
    )]
    #[test_case(
        "ERWACHE\nDING 0 = 0\nWENN DING 0 = 1 DANN\nVORSTELLUNG \"yes\"\nSONST\nVORSTELLUNG \"no\"\nENDE\nVERNEINUNG",
        &["no"] ;
        "else taken"
    )]
    #[test_case(
        "ERWACHE\nDING 0 = \"hello\"\nWENN DING 0 = \"hello\" DANN\nVORSTELLUNG \"match\"\nENDE\nVERNEINUNG",
        &["match"] ;
        "text equality"
    )]
    #[test_case(
        "ERWACHE\nDING 0 = \"a\"\nWENN DING 0 != \"b\" DANN\nVORSTELLUNG \"differs\"\nENDE\nVERNEINUNG",
        &["differs"] ;
        "text inequality"
    )]
    #[test_case(
        "ERWACHE\nDING 0 = 10\nSOLANGE DING 0 < 3\nVORSTELLUNG \"nope\"\nENDE\nVORSTELLUNG \"done\"\nVERNEINUNG",
        &["done"] ;
        "loop with initially false condition"
    )]
    #[test_case(
        "ERWACHE\nVORSTELLUNG \"before\"\nVERNEINUNG\nVORSTELLUNG \"after\"",
        &["before"] ;
        "terminator stops execution"
    )]
    #[test_case(
        "ERWACHE\nVORSTELLUNG \"hello\"",
        &["hello"] ;
        "missing terminator is tolerated"
    )]
    fn test(source: &str, expected: &[&str]) {
        assert_eq!(run(source, &[]).unwrap(), expected)
    }

    #[test]
    fn countdown_prints_in_order() {
        assert_eq!(run(&COUNTDOWN, &[]).unwrap(), ["0", "1", "2"])
    }

    #[test]
    fn halt_inside_loop() {
        assert_eq!(run(&HALT_IN_LOOP, &[]).unwrap(), ["0", "1", "2"])
    }

    #[test]
    fn nested_conditionals() {
        assert_eq!(run(&NESTED_SONST, &[]).unwrap(), ["two"])
    }

    #[test]
    fn fizzbuzz() {
        let expected = [
            "1", "2", "Fizz", "4", "Buzz", "Fizz", "7", "8", "Fizz", "Buzz", "11", "Fizz", "13",
            "14", "FizzBuzz",
        ];

        assert_eq!(run(&FIZZBUZZ, &[]).unwrap(), expected)
    }

    #[test]
    fn reads_text_input() {
        let source = "ERWACHE\nWILLE 0\nVORSTELLUNG DING 0\nVERNEINUNG";

        assert_eq!(run(source, &["hello"]).unwrap(), ["hello"])
    }

    #[test]
    fn reads_numeric_input_as_number() {
        let source = "ERWACHE\nWILLE 0\nDING 1 = DING 0 + 1\nVORSTELLUNG DING 1\nVERNEINUNG";

        assert_eq!(run(source, &["5"]).unwrap(), ["6"])
    }

    #[test]
    fn initial_slots_are_visible() {
        let program = Parser::new(tokenize("ERWACHE\nVORSTELLUNG DING 7\nVERNEINUNG"))
            .parse()
            .unwrap();
        let mut slots: [Value; SLOT_COUNT] = Default::default();
        slots[7] = Value::Number(97.0);

        let mut machine = Machine::with_slots(&program, slots);
        let mut outputs = vec![];
        loop {
            match machine.step().unwrap() {
                Step::Output(text) => outputs.push(text),
                Step::Done => break,
                _ => {}
            }
        }

        assert_eq!(outputs, ["97"])
    }

    #[test]
    fn final_slots_are_observable() {
        let program = Parser::new(tokenize("ERWACHE\nDING 2 = 6 * 7\nVERNEINUNG"))
            .parse()
            .unwrap();

        let mut machine = Machine::new(&program);
        while machine.step().unwrap() != Step::Done {}

        assert_eq!(machine.slots()[2], Value::Number(42.0))
    }

    #[test_case(
        "ERWACHE\nDING 8 = 1\nVERNEINUNG",
        WeltError::slot_out_of_range(8, 2) ;
        "assignment outside slot range"
    )]
    #[test_case(
        "ERWACHE\nVORSTELLUNG DING 9\nVERNEINUNG",
        WeltError::slot_out_of_range(9, 2) ;
        "reference outside slot range"
    )]
    #[test_case(
        "ERWACHE\nWILLE 8\nVERNEINUNG",
        WeltError::slot_out_of_range(8, 2) ;
        "read outside slot range"
    )]
    #[test_case(
        "ERWACHE\nDING 1 = 5 / 0\nVERNEINUNG",
        WeltError::division_by_zero(2) ;
        "division by zero"
    )]
    #[test_case(
        "ERWACHE\nDING 1 = 5 MOD 0\nVERNEINUNG",
        WeltError::modulo_by_zero(2) ;
        "modulo by zero"
    )]
    #[test_case(
        "ERWACHE\nDING 0 = \"a\" + 1\nVERNEINUNG",
        WeltError::type_mismatch("\"a\" + 1", 2) ;
        "text in arithmetic"
    )]
    #[test_case(
        "ERWACHE\nDING 0 = \"a\" + \"b\"\nVERNEINUNG",
        WeltError::type_mismatch("\"a\" + \"b\"", 2) ;
        "no text concatenation"
    )]
    #[test_case(
        "ERWACHE\nWENN 1 = \"x\" DANN\nENDE\nVERNEINUNG",
        WeltError::type_mismatch("1 = \"x\"", 2) ;
        "number compared to text"
    )]
    #[test_case(
        "ERWACHE\nWENN \"a\" < \"b\" DANN\nENDE\nVERNEINUNG",
        WeltError::type_mismatch("\"a\" < \"b\"", 2) ;
        "text has no ordering"
    )]
    fn test_error(source: &str, expected: WeltError) {
        assert_eq!(run(source, &[]).unwrap_err(), expected)
    }

    #[test]
    fn error_line_points_at_the_offending_statement() {
        let source = "ERWACHE\nDING 0 = 1\nDING 1 = 2\nDING 2 = DING 1 / 0\nVERNEINUNG";

        assert_eq!(run(source, &[]).unwrap_err(), WeltError::division_by_zero(4))
    }

    #[test]
    fn step_limit_bounds_infinite_loops() {
        let source = "ERWACHE\nSOLANGE 1 < 2\nENDE\nVERNEINUNG";
        let program = Parser::new(tokenize(source)).parse().unwrap();
        let mut machine = Machine::new(&program).with_step_limit(1_000);

        let error = loop {
            match machine.step() {
                Ok(_) => {}
                Err(error) => break error,
            }
        };

        assert_eq!(error, WeltError::runtime("step limit exceeded", 2))
    }

    #[test]
    fn empty_loop_body_still_yields_each_iteration() {
        let source = "ERWACHE\nSOLANGE 1 < 2\nENDE\nVERNEINUNG";
        let program = Parser::new(tokenize(source)).parse().unwrap();
        let mut machine = Machine::new(&program);

        // Every step returns instead of spinning internally.
        for _ in 0..10_000 {
            assert_eq!(machine.step().unwrap(), Step::Continue);
        }
    }
}
