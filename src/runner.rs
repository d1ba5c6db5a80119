use crate::error::Result;
use crate::interpreter::{Machine, Step};
use crate::lexer::tokenize;
use crate::parser::ast::Program;
use crate::parser::Parser;
use crate::vm::{parse_grund, Vm};

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::BoxFuture;

// Statements executed between scheduler yields. Small enough that a caller
// racing the run future against a timeout preempts a tight loop well
// inside any human-visible budget.
const YIELD_CADENCE: u64 = 64;

/// The two effects a running program can have on its host.
pub trait Host {
    /// Receives one line per executed print statement, in program order.
    fn output(&mut self, text: &str);

    /// Called when the program blocks on a read; execution resumes with
    /// the line the returned future yields.
    fn input(&mut self) -> BoxFuture<'_, String>;
}

/// Anything the runner can drive: the WELT machine and the GRUND machine
/// share the step/resume protocol.
pub trait Stepper {
    fn step(&mut self) -> Result<Step>;
    fn resume_input(&mut self, text: &str) -> Result<()>;
}

impl<'a> Stepper for Machine<'a> {
    fn step(&mut self) -> Result<Step> {
        Machine::step(self)
    }

    fn resume_input(&mut self, text: &str) -> Result<()> {
        Machine::resume_input(self, text)
    }
}

impl<'a> Stepper for Vm<'a> {
    fn step(&mut self) -> Result<Step> {
        Vm::step(self)
    }

    fn resume_input(&mut self, text: &str) -> Result<()> {
        Vm::resume_input(self, text)
    }
}

/// The single entry point the rest of an application touches: lex, parse,
/// and drive the program to completion or failure. Resolves with no value
/// on success; every fault surfaces as one `WeltError`. Abandonment is
/// caller-driven: drop the future (e.g. after losing a race against a
/// timeout) and the execution state goes with it.
pub async fn run(source: &str, host: &mut dyn Host) -> Result<()> {
    let program = Parser::new(tokenize(source)).parse()?;
    run_program(&program, host).await
}

/// Drive an already-parsed program.
pub async fn run_program(program: &Program, host: &mut dyn Host) -> Result<()> {
    drive(Machine::new(program), host).await
}

/// Parse and execute GRUND assembly text.
pub async fn run_grund(source: &str, host: &mut dyn Host) -> Result<()> {
    let program = parse_grund(source)?;
    drive(Vm::new(&program), host).await
}

async fn drive<S: Stepper>(mut stepper: S, host: &mut dyn Host) -> Result<()> {
    let mut executed: u64 = 0;

    loop {
        match stepper.step()? {
            Step::Continue => {}
            Step::Output(text) => host.output(&text),
            Step::AwaitingInput => {
                let text = host.input().await;
                stepper.resume_input(&text)?;
            }
            Step::Done => return Ok(()),
        }

        executed += 1;
        if executed % YIELD_CADENCE == 0 {
            yield_now().await;
        }
    }
}

/// Pending exactly once. Awaiting it hands the scheduler a turn, which is
/// what keeps a non-terminating program abandonable from outside.
fn yield_now() -> YieldNow {
    YieldNow { yielded: false }
}

struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.get_mut().yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::WeltError;

    use futures::executor::block_on;
    use futures::future;
    use futures::task::noop_waker;

    struct ScriptedHost {
        outputs: Vec<String>,
        inputs: Vec<&'static str>,
        next_input: usize,
    }

    impl ScriptedHost {
        fn new(inputs: &[&'static str]) -> ScriptedHost {
            ScriptedHost {
                outputs: vec![],
                inputs: inputs.to_vec(),
                next_input: 0,
            }
        }
    }

    impl Host for ScriptedHost {
        fn output(&mut self, text: &str) {
            self.outputs.push(text.to_string());
        }

        fn input(&mut self) -> BoxFuture<'_, String> {
            let text = self
                .inputs
                .get(self.next_input)
                .copied()
                .unwrap_or("")
                .to_string();
            self.next_input += 1;
            Box::pin(future::ready(text))
        }
    }

    #[test]
    fn resolves_with_outputs_in_program_order() {
        let source = "ERWACHE\n\
            DING 0 = 0\n\
            SOLANGE DING 0 < 3\n\
                VORSTELLUNG DING 0\n\
                DING 0 = DING 0 + 1\n\
            ENDE\n\
            VERNEINUNG";

        let mut host = ScriptedHost::new(&[]);
        block_on(run(source, &mut host)).unwrap();

        assert_eq!(host.outputs, ["0", "1", "2"])
    }

    #[test]
    fn feeds_input_through_the_host() {
        let source = "ERWACHE\n\
            WILLE 0\n\
            WILLE 1\n\
            DING 2 = DING 0 * DING 1\n\
            VORSTELLUNG DING 2\n\
            VERNEINUNG";

        let mut host = ScriptedHost::new(&["6", "7"]);
        block_on(run(source, &mut host)).unwrap();

        assert_eq!(host.outputs, ["42"])
    }

    #[test]
    fn surfaces_syntax_errors() {
        let mut host = ScriptedHost::new(&[]);
        let error = block_on(run("VORSTELLUNG \"hello\"", &mut host)).unwrap_err();

        assert_eq!(error, WeltError::syntax("program must begin with ERWACHE", 0))
    }

    #[test]
    fn surfaces_runtime_errors_with_their_line() {
        let mut host = ScriptedHost::new(&[]);
        let error = block_on(run("ERWACHE\nDING 1 = 5 / 0\nVERNEINUNG", &mut host)).unwrap_err();

        assert_eq!(error, WeltError::division_by_zero(2))
    }

    #[test]
    fn long_runs_cross_many_yield_points() {
        let source = "ERWACHE\n\
            DING 0 = 0\n\
            SOLANGE DING 0 < 2000\n\
                DING 0 = DING 0 + 1\n\
            ENDE\n\
            VORSTELLUNG DING 0\n\
            VERNEINUNG";

        let mut host = ScriptedHost::new(&[]);
        block_on(run(source, &mut host)).unwrap();

        assert_eq!(host.outputs, ["2000"])
    }

    #[test]
    fn non_terminating_programs_can_be_abandoned() {
        let source = "ERWACHE\nSOLANGE 1 < 2\nENDE\nVERNEINUNG";
        let mut host = ScriptedHost::new(&[]);

        let mut future = Box::pin(run(source, &mut host));
        let waker = noop_waker();
        let mut context = Context::from_waker(&waker);

        // Every poll comes back instead of spinning inside the interpreter;
        // dropping the future afterwards is the entire cleanup.
        for _ in 0..1_000 {
            match future.as_mut().poll(&mut context) {
                Poll::Ready(result) => panic!("infinite loop finished: {:?}", result),
                Poll::Pending => {}
            }
        }
    }

    #[test]
    fn runs_grund_assembly() {
        let source = ".code\n\
            tar  r0, 4\n\
            tar  r1, 5\n\
            kur  r2, r0, r1\n\
            mav  r2\n\
            nov";

        let mut host = ScriptedHost::new(&[]);
        block_on(run_grund(source, &mut host)).unwrap();

        assert_eq!(host.outputs, ["9"])
    }
}
