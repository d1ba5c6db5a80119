use crate::error::Result;
use crate::interpreter::Value;
use crate::lexer::tokenize;
use crate::parser::ast::{BinOp, CmpOp, Condition, Expression, Program, Statement, StmtKind};
use crate::parser::Parser;

// Slots map 1:1 onto registers; the top two registers double as scratch
// space for expression evaluation, with the ring as spill storage when
// both are live.
const SCRATCH: usize = 7;
const SCRATCH2: usize = 6;

/// Compile WELT source to GRUND assembly text.
pub fn compile(source: &str, source_name: Option<&str>) -> Result<String> {
    let program = Parser::new(tokenize(source)).parse()?;
    Ok(compile_program(&program, source_name))
}

/// Compile an already-parsed program.
pub fn compile_program(program: &Program, source_name: Option<&str>) -> String {
    let mut emitter = Emitter::new();

    for stmt in &program.statements {
        emitter.compile_statement(stmt);
    }

    let mut out = String::new();
    out.push_str("; === GRUND (DAS-8 Q4) ===\n");
    if let Some(name) = source_name {
        out.push_str("; source: ");
        out.push_str(name);
        out.push('\n');
    }
    out.push_str(concat!("; compiled by welt ", env!("CARGO_PKG_VERSION"), "\n"));
    out.push('\n');

    out.push_str(".data\n");
    for (key, value) in &emitter.data {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        out.push_str(&format!("  {}: \"{}\"\n", key, escaped));
    }

    out.push_str(".code\n");
    for line in &emitter.lines {
        out.push_str(line);
        out.push('\n');
    }

    out
}

struct Emitter {
    lines: Vec<String>,
    data: Vec<(String, String)>,
    label_counter: usize,
}

fn pad(instr: &str) -> String {
    format!("  {:<24}", instr)
}

impl Emitter {
    fn new() -> Emitter {
        Emitter {
            lines: vec![],
            data: vec![],
            label_counter: 0,
        }
    }

    fn next_label(&mut self) -> String {
        let label = format!(".L{}", self.label_counter);
        self.label_counter += 1;
        label
    }

    fn add_data(&mut self, value: &str) -> String {
        for (key, existing) in &self.data {
            if existing == value {
                return key.clone();
            }
        }

        let key = format!("s{}", self.data.len());
        self.data.push((key.clone(), value.to_string()));
        key
    }

    fn emit(&mut self, instr: &str) {
        self.lines.push(pad(instr).trim_end().to_string());
    }

    fn emit_commented(&mut self, instr: &str, comment: &str) {
        self.lines.push(format!("{}; {}", pad(instr), comment));
    }

    fn emit_label(&mut self, label: &str) {
        self.lines.push(format!("{}:", label));
    }

    fn compile_statement(&mut self, stmt: &Statement) {
        match &stmt.kind {
            StmtKind::Halt => self.emit_commented("nov", "VERNEINUNG"),
            StmtKind::Assign { slot, expr } => self.compile_assign(*slot, expr),
            StmtKind::Print(expr) => self.compile_output(expr),
            StmtKind::Read { slot } => {
                let instr = format!("vir  r{}", slot);
                self.emit_commented(&instr, &format!("WILLE {}", slot));
            }
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } => self.compile_if(cond, then_body, else_body),
            StmtKind::While { cond, body } => self.compile_while(cond, body),
        }
    }

    fn compile_assign(&mut self, slot: usize, expr: &Expression) {
        let comment = format!("DING {} = {}", slot, expr);

        match expr {
            Expression::Literal(Value::Number(n)) => {
                let instr = format!("tar  r{}, {}", slot, Value::Number(*n));
                self.emit_commented(&instr, &comment);
            }
            Expression::Literal(Value::Text(s)) => {
                let key = self.add_data(s);
                let instr = format!("tar  r{}, {}", slot, key);
                self.emit_commented(&instr, &comment);
            }
            Expression::Slot(index) => {
                let instr = format!("tar  r{}, r{}", slot, index);
                self.emit_commented(&instr, &comment);
            }
            Expression::Binary { op, left, right } => {
                self.compile_arith(*op, left, right, slot);
                self.lines.push(format!("{}; {}", pad(""), comment));
            }
        }
    }

    fn compile_output(&mut self, expr: &Expression) {
        let comment = format!("VORSTELLUNG {}", expr);

        match expr {
            Expression::Literal(Value::Number(n)) => {
                self.emit(&format!("tar  r{}, {}", SCRATCH, Value::Number(*n)));
                self.emit_commented(&format!("mav  r{}", SCRATCH), &comment);
            }
            Expression::Literal(Value::Text(s)) => {
                let key = self.add_data(s);
                self.emit(&format!("tar  r{}, {}", SCRATCH, key));
                self.emit_commented(&format!("mav  r{}", SCRATCH), &comment);
            }
            Expression::Slot(index) => {
                self.emit_commented(&format!("mav  r{}", index), &comment);
            }
            Expression::Binary { op, left, right } => {
                self.compile_arith(*op, left, right, SCRATCH);
                self.emit_commented(&format!("mav  r{}", SCRATCH), &comment);
            }
        }
    }

    // Left lands in the scratch register; when the right side needs its
    // own evaluation on top of that, the scratch value waits in the ring.
    fn compile_arith(&mut self, op: BinOp, left: &Expression, right: &Expression, dest: usize) {
        let left_reg = self.resolve_operand(left, SCRATCH);

        let needs_ring = left_reg == SCRATCH && !is_simple(right);
        if needs_ring {
            self.emit(&format!("tin  r{}", SCRATCH));
        }
        let right_reg = self.resolve_operand(right, SCRATCH2);
        if needs_ring {
            self.emit(&format!("tab  r{}", SCRATCH));
        }

        match op {
            BinOp::Add => self.emit(&format!("kur  r{}, r{}, r{}", dest, left_reg, right_reg)),
            BinOp::Sub => self.emit(&format!("sur  r{}, r{}, r{}", dest, left_reg, right_reg)),
            BinOp::Mul => self.emit(&format!("mur  r{}, r{}, r{}", dest, left_reg, right_reg)),
            BinOp::Div => self.emit(&format!("dur  r{}, r{}, r{}", dest, left_reg, right_reg)),
            BinOp::Mod => self.compile_modulo(dest, left_reg, right_reg),
        }
    }

    // No native MOD on the DAS-8: a MOD b = a - (a / b) * b.
    fn compile_modulo(&mut self, dest: usize, left_reg: usize, right_reg: usize) {
        let tmp = if dest == SCRATCH { SCRATCH2 } else { SCRATCH };

        self.emit(&format!("dur  r{}, r{}, r{}", tmp, left_reg, right_reg));
        self.emit(&format!("mur  r{}, r{}, r{}", tmp, tmp, right_reg));
        self.emit(&format!("sur  r{}, r{}, r{}", dest, left_reg, tmp));
    }

    // Only = and > comparisons are native; everything else is synthesized
    // from pav/rev/rgv sequences. Jumps to `false_label` when the
    // condition does not hold.
    fn compile_condition_branch(&mut self, cond: &Condition, false_label: &str) {
        let left_reg = self.resolve_operand(&cond.left, SCRATCH);
        let right_reg = self.resolve_operand(&cond.right, SCRATCH2);

        match cond.op {
            CmpOp::Eq => {
                self.emit(&format!("pav  r{}, r{}", left_reg, right_reg));
                let skip = self.next_label();
                self.emit(&format!("rev  {}", skip));
                self.emit(&format!("rav  {}", false_label));
                self.emit_label(&skip);
            }
            CmpOp::Neq => {
                self.emit(&format!("pav  r{}, r{}", left_reg, right_reg));
                self.emit(&format!("rev  {}", false_label));
            }
            CmpOp::Gt => {
                self.emit(&format!("pav  r{}, r{}", left_reg, right_reg));
                let skip = self.next_label();
                self.emit(&format!("rgv  {}", skip));
                self.emit(&format!("rav  {}", false_label));
                self.emit_label(&skip);
            }
            CmpOp::Lt => {
                self.emit(&format!("pav  r{}, r{}", right_reg, left_reg));
                let skip = self.next_label();
                self.emit(&format!("rgv  {}", skip));
                self.emit(&format!("rav  {}", false_label));
                self.emit_label(&skip);
            }
            CmpOp::Ge => {
                self.emit(&format!("pav  r{}, r{}", right_reg, left_reg));
                self.emit(&format!("rgv  {}", false_label));
            }
            CmpOp::Le => {
                self.emit(&format!("pav  r{}, r{}", left_reg, right_reg));
                self.emit(&format!("rgv  {}", false_label));
            }
        }
    }

    fn compile_if(&mut self, cond: &Condition, then_body: &[Statement], else_body: &[Statement]) {
        let else_label = self.next_label();
        let end_label = if else_body.is_empty() {
            else_label.clone()
        } else {
            self.next_label()
        };

        self.compile_condition_branch(cond, &else_label);

        for stmt in then_body {
            self.compile_statement(stmt);
        }

        if else_body.is_empty() {
            self.emit_label(&else_label);
        } else {
            self.emit(&format!("rav  {}", end_label));
            self.emit_label(&else_label);
            for stmt in else_body {
                self.compile_statement(stmt);
            }
            self.emit_label(&end_label);
        }
    }

    fn compile_while(&mut self, cond: &Condition, body: &[Statement]) {
        let loop_label = self.next_label();
        let end_label = self.next_label();

        self.emit_label(&loop_label);
        self.compile_condition_branch(cond, &end_label);

        for stmt in body {
            self.compile_statement(stmt);
        }

        self.emit(&format!("rav  {}", loop_label));
        self.emit_label(&end_label);
    }

    fn resolve_operand(&mut self, expr: &Expression, target: usize) -> usize {
        match expr {
            Expression::Slot(index) => *index,
            Expression::Literal(Value::Number(n)) => {
                self.emit(&format!("tar  r{}, {}", target, Value::Number(*n)));
                target
            }
            Expression::Literal(Value::Text(s)) => {
                let key = self.add_data(s);
                self.emit(&format!("tar  r{}, {}", target, key));
                target
            }
            Expression::Binary { op, left, right } => {
                self.compile_arith(*op, left, right, target);
                target
            }
        }
    }
}

fn is_simple(expr: &Expression) -> bool {
    matches!(expr, Expression::Slot(_) | Expression::Literal(Value::Number(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::WeltError;
    use crate::interpreter::Step;
    use crate::vm::{parse_grund, Vm};

    use lazy_static::lazy_static;
    use test_case::test_case;

    fn run_compiled(source: &str, inputs: &[&str]) -> Result<Vec<String>> {
        let assembly = compile(source, None)?;
        let program = parse_grund(&assembly)?;
        let mut vm = Vm::new(&program);
        let mut outputs = vec![];
        let mut next_input = 0;

        loop {
            match vm.step()? {
                Step::Continue => {}
                Step::Output(text) => outputs.push(text),
                Step::AwaitingInput => {
                    let text = inputs.get(next_input).copied().unwrap_or("");
                    next_input += 1;
                    vm.resume_input(text)?;
                }
                Step::Done => return Ok(outputs),
            }
        }
    }

    #[rustfmt::skip]
    lazy_static! {
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

    #[test]
    fn emits_the_documented_format() {
        let source = "ERWACHE\nDING 0 = 5\nVORSTELLUNG \"Hi\"\nVERNEINUNG";

        let expected = [
            "; === GRUND (DAS-8 Q4) ===".to_string(),
            "; source: greet.welt".to_string(),
            "; compiled by welt 0.3.1".to_string(),
            "".to_string(),
            ".data".to_string(),
            "  s0: \"Hi\"".to_string(),
            ".code".to_string(),
            format!("  {:<24}; DING 0 = 5", "tar  r0, 5"),
            "  tar  r7, s0".to_string(),
            format!("  {:<24}; VORSTELLUNG \"Hi\"", "mav  r7"),
            format!("  {:<24}; VERNEINUNG", "nov"),
            "".to_string(),
        ]
        .join("\n");

        assert_eq!(compile(source, Some("greet.welt")).unwrap(), expected)
    }

    #[test]
    fn deduplicates_data_entries() {
        let source =
            "ERWACHE\nVORSTELLUNG \"tick\"\nVORSTELLUNG \"tock\"\nVORSTELLUNG \"tick\"\nVERNEINUNG";

        let assembly = compile(source, None).unwrap();

        assert!(assembly.contains("s0: \"tick\""));
        assert!(assembly.contains("s1: \"tock\""));
        assert!(!assembly.contains("s2:"));
    }

    #[test]
    fn spills_the_scratch_register_through_the_ring() {
        let source = "ERWACHE\nDING 0 = 1 + 2 * 3\nVORSTELLUNG DING 0\nVERNEINUNG";

        let assembly = compile(source, None).unwrap();
        assert!(assembly.contains("tin  r7"));
        assert!(assembly.contains("tab  r7"));

        assert_eq!(run_compiled(source, &[]).unwrap(), ["7"])
    }

    #[test]
    fn surfaces_parse_errors() {
        let error = compile("DING 0 = 5", None).unwrap_err();

        assert_eq!(error, WeltError::syntax("program must begin with ERWACHE", 0))
    }

    #[test_case("ERWACHE\nDING 0 = 200 + 100\nVORSTELLUNG DING 0\nVERNEINUNG", &["44"] ; "arithmetic wraps at word size")]
    #[test_case("ERWACHE\nDING 0 = 5 - 10\nVORSTELLUNG DING 0\nVERNEINUNG", &["251"] ; "subtraction wraps to unsigned")]
    #[test_case("ERWACHE\nDING 0 = 20 * 20\nVORSTELLUNG DING 0\nVERNEINUNG", &["144"] ; "multiplication wraps")]
    #[test_case("ERWACHE\nDING 0 = 17\nDING 1 = DING 0 MOD 5\nVORSTELLUNG DING 1\nVERNEINUNG", &["2"] ; "synthesized modulo")]
    #[test_case("ERWACHE\nDING 0 = 7\nDING 1 = DING 0 / 2\nVORSTELLUNG DING 1\nVERNEINUNG", &["3"] ; "division floors")]
    #[test_case("ERWACHE\nVORSTELLUNG DING 3\nVERNEINUNG", &["4"] ; "post residue survives into programs")]
    fn machine_semantics(source: &str, expected: &[&str]) {
        assert_eq!(run_compiled(source, &[]).unwrap(), expected)
    }

    #[test_case("ERWACHE\nDING 0 = 200 + 100\nDING 1 = 3 + 4\nVORSTELLUNG DING 1\nVERNEINUNG", &["8"] ; "carry biases the next op")]
    #[test_case("ERWACHE\nDING 0 = 200 + 100\nDING 1 = 3 + 4\nDING 2 = 1 + 1\nVORSTELLUNG DING 2\nVERNEINUNG", &["2"] ; "carry clears after a clean op")]
    #[test_case("ERWACHE\nDING 0 = 200 + 100\nDING 1 = 200 + 55\nDING 2 = 1 + 1\nVORSTELLUNG DING 2\nVERNEINUNG", &["3"] ; "carry persists through another overflow")]
    fn carry_leakage(source: &str, expected: &[&str]) {
        assert_eq!(run_compiled(source, &[]).unwrap(), expected)
    }

    #[test_case(CmpOp::Eq, "3 = 3", true ; "eq true")]
    #[test_case(CmpOp::Eq, "3 = 4", false ; "eq false")]
    #[test_case(CmpOp::Neq, "3 != 4", true ; "neq true")]
    #[test_case(CmpOp::Neq, "3 != 3", false ; "neq false")]
    #[test_case(CmpOp::Lt, "3 < 4", true ; "lt true")]
    #[test_case(CmpOp::Lt, "4 < 3", false ; "lt false")]
    #[test_case(CmpOp::Gt, "4 > 3", true ; "gt true")]
    #[test_case(CmpOp::Gt, "3 > 4", false ; "gt false")]
    #[test_case(CmpOp::Le, "3 <= 3", true ; "le true")]
    #[test_case(CmpOp::Le, "4 <= 3", false ; "le false")]
    #[test_case(CmpOp::Ge, "3 >= 3", true ; "ge true")]
    #[test_case(CmpOp::Ge, "2 >= 3", false ; "ge false")]
    fn compiled_comparisons_branch_correctly(_op: CmpOp, cond: &str, taken: bool) {
        let source = format!(
            "ERWACHE\nWENN {} DANN\nVORSTELLUNG \"yes\"\nSONST\nVORSTELLUNG \"no\"\nENDE\nVERNEINUNG",
            cond
        );

        let expected = if taken { ["yes"] } else { ["no"] };
        assert_eq!(run_compiled(&source, &[]).unwrap(), expected)
    }

    #[test]
    fn compiled_loops_iterate() {
        let source = "ERWACHE\n\
            DING 0 = 0\n\
            SOLANGE DING 0 < 3\n\
                VORSTELLUNG DING 0\n\
                DING 0 = DING 0 + 1\n\
            ENDE\n\
            VERNEINUNG";

        assert_eq!(run_compiled(source, &[]).unwrap(), ["0", "1", "2"])
    }

    #[test]
    fn compiled_reads_go_through_vir() {
        let source = "ERWACHE\nWILLE 0\nDING 1 = DING 0 + 1\nVORSTELLUNG DING 1\nVERNEINUNG";

        let assembly = compile(source, None).unwrap();
        assert!(assembly.contains("vir  r0"));

        assert_eq!(run_compiled(source, &["5"]).unwrap(), ["6"])
    }

    #[test]
    fn fizzbuzz_through_the_machine() {
        let expected = [
            "1", "2", "Fizz", "4", "Buzz", "Fizz", "7", "8", "Fizz", "Buzz", "11", "Fizz", "13",
            "14", "FizzBuzz",
        ];

        assert_eq!(run_compiled(&FIZZBUZZ, &[]).unwrap(), expected)
    }
}
