use crate::error::{Result, WeltError};
use crate::interpreter::{Step, Value};
use crate::vm::parser::{GrundProgram, Instruction, Opcode, Operand};

const WORD_SIZE: f64 = 256.0;
const RING_SIZE: usize = 4;
const MAX_ITERATIONS: u64 = 1818;
const ITERATION_WARN: u64 = 1024;
const ITERATION_SUFFER: u64 = 4096;

// Residue the fictional POST sequence leaves in the registers.
const BOOT_REGISTERS: [f64; 8] = [0.0, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 97.0];

/// The DAS-8: eight 8-bit registers, a carry flag that leaks into the next
/// arithmetic op, two comparison flags, and a 4-slot ring buffer instead
/// of a call stack. Driven through the same step/resume protocol as the
/// WELT machine; one instruction per step.
pub struct Vm<'a> {
    program: &'a GrundProgram,
    registers: [Value; 8],
    ring: [Value; RING_SIZE],
    ring_pointer: usize,
    ring_count: usize,
    carry: bool,
    flag_equal: bool,
    flag_greater: bool,
    pc: usize,
    halted: bool,
    total: u64,
    last_output: String,
    pending_read: Option<usize>,
    interjection: Option<&'static str>,
}

impl<'a> Vm<'a> {
    pub fn new(program: &'a GrundProgram) -> Vm<'a> {
        Vm::with_registers(program, BOOT_REGISTERS.map(Value::Number))
    }

    pub fn with_registers(program: &'a GrundProgram, registers: [Value; 8]) -> Vm<'a> {
        Vm {
            program,
            registers,
            ring: Default::default(),
            ring_pointer: 0,
            ring_count: 0,
            carry: false,
            flag_equal: false,
            flag_greater: false,
            pc: 0,
            halted: false,
            total: 0,
            last_output: String::new(),
            pending_read: None,
            interjection: None,
        }
    }

    pub fn registers(&self) -> &[Value; 8] {
        &self.registers
    }

    pub fn step(&mut self) -> Result<Step> {
        if let Some(text) = self.interjection.take() {
            return Ok(Step::Output(text.to_string()));
        }
        if self.pending_read.is_some() {
            return Ok(Step::AwaitingInput);
        }
        if self.halted || self.pc >= self.program.instructions.len() {
            self.halted = true;
            return Ok(Step::Done);
        }

        self.total += 1;
        if self.total == ITERATION_WARN {
            self.interjection = Some("...");
        } else if self.total == ITERATION_SUFFER {
            self.interjection = Some("Alles Leben ist Leiden.");
        }
        if self.total > MAX_ITERATIONS * 8 {
            return Err(WeltError::runtime(
                "execution exceeded maximum iterations",
                0,
            ));
        }

        let program = self.program;
        let instr = &program.instructions[self.pc];
        self.exec(instr)
    }

    pub fn resume_input(&mut self, text: &str) -> Result<()> {
        match self.pending_read.take() {
            Some(register) => {
                self.registers[register] = Value::from_input(text);
                Ok(())
            }
            None => Err(WeltError::runtime("no read is awaiting input", 0)),
        }
    }

    fn exec(&mut self, instr: &'a Instruction) -> Result<Step> {
        let mut next = self.pc + 1;
        let mut step = Step::Continue;

        match instr.opcode {
            Opcode::Nov => {
                self.halted = true;
                return Ok(Step::Done);
            }
            // tir's indirect addressing never made it out of the draft
            // spec; it behaves as tar.
            Opcode::Tar | Opcode::Tir => {
                let dest = reg_index(instr, 0)?;
                let value = self.value_operand(instr, 1)?;
                self.registers[dest] = match value {
                    Value::Number(n) => Value::Number(wrap_byte(n)),
                    text => text,
                };
            }
            Opcode::Tin => {
                let src = reg_index(instr, 0)?;
                // The ring overwrites its oldest entry when full.
                self.ring[self.ring_pointer] = self.registers[src].clone();
                self.ring_pointer = (self.ring_pointer + 1) % RING_SIZE;
                if self.ring_count < RING_SIZE {
                    self.ring_count += 1;
                }
            }
            Opcode::Tab => {
                let dest = reg_index(instr, 0)?;
                if self.ring_count == 0 {
                    return Err(WeltError::runtime(
                        "ring buffer underflow: nothing to pop",
                        instr.line,
                    ));
                }
                self.ring_pointer = (self.ring_pointer + RING_SIZE - 1) % RING_SIZE;
                self.ring_count -= 1;
                self.registers[dest] = self.ring[self.ring_pointer].clone();
            }
            Opcode::Mav => {
                let src = reg_index(instr, 0)?;
                let text = self.registers[src].to_string();
                step = Step::Output(self.phosphor(text));
            }
            Opcode::Vir => {
                let dest = reg_index(instr, 0)?;
                self.pending_read = Some(dest);
                self.pc = next;
                return Ok(Step::AwaitingInput);
            }
            Opcode::Mak => {
                step = Step::Output(if self.carry { "1" } else { "0" }.to_string());
            }
            Opcode::Pav => {
                let left = self.value_operand(instr, 0)?;
                let right = self.value_operand(instr, 1)?;
                match (left.as_number(), right.as_number()) {
                    (Some(l), Some(r)) => {
                        self.flag_equal = l == r;
                        self.flag_greater = l > r;
                    }
                    _ => {
                        self.flag_equal = left == right;
                        self.flag_greater = left.to_string() > right.to_string();
                    }
                }
            }
            Opcode::Kur => self.arithmetic(instr, |a, b| a + b)?,
            Opcode::Sur => self.arithmetic(instr, |a, b| a - b)?,
            Opcode::Mur => self.arithmetic(instr, |a, b| a * b)?,
            Opcode::Dur => {
                let dest = reg_index(instr, 0)?;
                let left = self.numeric_register(instr, 1)?;
                let right = self.numeric_register(instr, 2)?;
                if right == 0.0 {
                    return Err(WeltError::division_by_zero(instr.line));
                }
                self.store_arithmetic(dest, (left / right).floor());
            }
            Opcode::Rav => {
                next = self.jump_target(instr)?;
            }
            Opcode::Rev => {
                if self.flag_equal {
                    next = self.jump_target(instr)?;
                }
            }
            Opcode::Rgv => {
                if self.flag_greater {
                    next = self.jump_target(instr)?;
                }
            }
        }

        self.pc = next;
        Ok(step)
    }

    fn arithmetic(&mut self, instr: &Instruction, op: fn(f64, f64) -> f64) -> Result<()> {
        let dest = reg_index(instr, 0)?;
        let left = self.numeric_register(instr, 1)?;
        let right = self.numeric_register(instr, 2)?;

        self.store_arithmetic(dest, op(left, right));

        Ok(())
    }

    // A pending carry biases the raw result before it wraps; overflow or
    // underflow arms the carry for the op after this one.
    fn store_arithmetic(&mut self, dest: usize, raw: f64) {
        let mut raw = raw;
        if self.carry {
            raw += 1.0;
        }
        self.carry = raw >= WORD_SIZE || raw < 0.0;
        self.registers[dest] = Value::Number(wrap_byte(raw));
    }

    fn numeric_register(&self, instr: &Instruction, idx: usize) -> Result<f64> {
        let index = reg_index(instr, idx)?;
        self.registers[index]
            .as_number()
            .ok_or_else(|| WeltError::runtime("arithmetic on non-numeric values", instr.line))
    }

    fn value_operand(&self, instr: &Instruction, idx: usize) -> Result<Value> {
        match instr.operands.get(idx) {
            None => Err(WeltError::runtime(
                format!("missing operand at position {}", idx),
                instr.line,
            )),
            Some(Operand::Register(index)) => Ok(self.registers[*index].clone()),
            Some(Operand::Immediate(value)) => Ok(Value::Number(*value as f64)),
            Some(Operand::Data(key)) => self
                .program
                .data
                .get(key)
                .map(|value| Value::Text(value.clone()))
                .ok_or_else(|| {
                    WeltError::runtime(format!("undefined data reference: {}", key), instr.line)
                }),
            Some(Operand::Label(name)) => Err(WeltError::runtime(
                format!("cannot use label as value: {}", name),
                instr.line,
            )),
        }
    }

    fn jump_target(&self, instr: &Instruction) -> Result<usize> {
        match instr.operands.get(0) {
            Some(Operand::Label(name)) => {
                self.program.labels.get(name).copied().ok_or_else(|| {
                    WeltError::runtime(format!("undefined label: {}", name), instr.line)
                })
            }
            _ => Err(WeltError::runtime(
                "jump requires a label operand",
                instr.line,
            )),
        }
    }

    // CRT phosphor: a line identical to the previous one loses a character
    // and clears the memory, so the third repeat prints clean again.
    fn phosphor(&mut self, text: String) -> String {
        let chars: Vec<char> = text.chars().collect();

        if chars.len() > 1 && text == self.last_output {
            let drop_index = (chars.len() - 1) % 5;
            self.last_output.clear();
            chars
                .iter()
                .enumerate()
                .filter(|(index, _)| *index != drop_index)
                .map(|(_, ch)| ch)
                .collect()
        } else {
            self.last_output = text.clone();
            text
        }
    }
}

fn reg_index(instr: &Instruction, idx: usize) -> Result<usize> {
    match instr.operands.get(idx) {
        Some(Operand::Register(index)) => Ok(*index),
        _ => Err(WeltError::runtime(
            format!("expected register operand at position {}", idx),
            instr.line,
        )),
    }
}

fn wrap_byte(value: f64) -> f64 {
    ((value % WORD_SIZE) + WORD_SIZE) % WORD_SIZE
}
