use jal_interpreter::{runner, Evaluator, RunError};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::io::{self, Cursor, Write};
use std::rc::Rc;
use std::thread;

#[derive(Clone, Default)]
struct SharedOutput(Rc<RefCell<Vec<u8>>>);

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn run_with_input(source: &str, stdin: &str) -> (String, Result<(), RunError>) {
    let output = SharedOutput::default();
    let mut evaluator = Evaluator::with_io(
        Box::new(Cursor::new(stdin.as_bytes().to_vec())),
        Box::new(output.clone()),
    );
    let result = runner::run(source, &mut evaluator);
    let printed = String::from_utf8_lossy(&output.0.borrow()).into_owned();
    (printed, result)
}

fn run(source: &str) -> (String, Result<(), RunError>) {
    run_with_input(source, "")
}

fn assert_output(source: &str, expected: &str) {
    let (printed, result) = run(source);
    if let Err(err) = result {
        panic!("program failed: {}\noutput so far: {}", err, printed);
    }
    assert_eq!(printed, expected);
}

fn assert_failure(source: &str, expected_output: &str, exit_code: i32, message: &str) {
    let (printed, result) = run(source);
    match result {
        Err(err) => {
            assert_eq!(printed, expected_output);
            assert_eq!(err.exit_code(), exit_code);
            assert_eq!(err.to_string(), message);
        }
        Ok(()) => panic!("expected failure, got output {:?}", printed),
    }
}

#[test]
fn shadowing_never_touches_the_outer_frame() {
    assert_output("let x = 1\n{ let x = 2; println(x) }\nprintln(x)", "2\n1\n");
}

#[test]
fn closures_observe_later_mutations_of_their_frame() {
    let source = "
def outer() {
  let seen = \"before\"
  def reader() {
    return seen
  }
  seen = \"after\"
  return reader
}

let seen = \"global\"
let read = outer()
println(read())
";
    assert_output(source, "after\n");
}

#[test]
fn nested_loops_break_independently() {
    let source = "
let outer = 0
while outer < 3 do {
  outer = outer + 1
  let inner = 0
  while true do {
    inner = inner + 1
    if inner == 2 then break
  }
  print(strof outer + \":\" + strof inner + \" \")
}
println(\"\")
";
    assert_output(source, "1:2 2:2 3:2 \n");
}

#[test]
fn division() {
    assert_output("println(strof(10 / 2))\nprintln(10 / 4)", "5\n2.5\n");
    assert_failure(
        "println(\"start\")\nprintln(10 / 0)",
        "start\n",
        70,
        "Error at line 2: Division by zero",
    );
}

#[test]
fn constructor_sets_fields() {
    let source = "
class A {
  def constructor(x) {
    self.x = x
  }
}
let a = A(3)
println(a.x == 3)
";
    assert_output(source, "true\n");
}

#[test]
fn super_call_keeps_the_child_instance() {
    let source = "
class Parent {
  def greet() {
    return \"parent sees \" + self.name
  }
}

class Child inherits Parent {
  def constructor() {
    self.name = \"child\"
  }

  def greet() {
    return super.greet()
  }
}

println(Child().greet())
";
    assert_output(source, "parent sees child\n");
}

#[test]
fn arity_mismatch_names_both_counts() {
    assert_failure(
        "def f() {\n  return 1\n}\nf(1)",
        "",
        70,
        "Error at line 4: wrong number of arguments: expected 0 but got 1",
    );
}

#[test]
fn equality_never_coerces() {
    assert_output(
        "println(none == none)\nprintln(none == 0)\nprintln(\"5\" == 5)",
        "true\nfalse\nfalse\n",
    );
}

#[test]
fn static_errors_block_execution() {
    let (printed, result) = run("println(\"never\")\nlet x = 1 +\nlet y = $");
    let err = result.expect_err("should not run");

    assert_eq!(printed, "");
    assert_eq!(err.exit_code(), 65);
    assert_eq!(
        err.to_string(),
        "Error at line 2: expected expression, found end of line\n\
         Error at line 3: unexpected character '$'\n\
         Error at line 3: expected expression, found end of input"
    );
}

#[test]
fn resolver_errors_block_execution() {
    assert_failure(
        "println(1)\nprintln(self)",
        "",
        65,
        "Error at line 2: can't use 'self' outside of a class",
    );
}

#[test]
fn input_reads_lines_from_the_injected_reader() {
    let source = "
let name = input(\"Who? \")
let age = numof input(\"Age? \")
println(name + \" is \" + strof (age + 1) + \" next year\")
println(input(\"More? \"))
";
    let (printed, result) = run_with_input(source, "Ada\n36\n");

    assert!(result.is_ok());
    assert_eq!(printed, "Who? Age? Ada is 37 next year\nMore? none\n");
}

#[test]
fn time_moves_forward() {
    assert_output(
        "let start = time()\nlet later = time()\nprintln(later >= start)",
        "true\n",
    );
}

#[test]
fn a_complete_program() {
    let source = "
class Stack {
  def constructor() {
    self.items = [none, none, none, none]
    self.size = 0
  }

  def push(item) {
    self.items[self.size] = item
    self.size = self.size + 1
  }

  def pop() {
    self.size = self.size - 1
    return self.items[self.size]
  }
}

let stack = Stack()
for (let i = 1; i <= 4; i = i + 1) stack.push(i * i)

let total = 0
do stack.size times total = total + stack.pop()
println(\"total: \" + strof total)
println(stack.items)
";
    assert_output(source, "total: 30\n[1, 4, 9, 16]\n");
}

#[test]
fn runaway_recursion_is_a_runtime_error() {
    // the worker stands in for the binary's large-stack interpreter thread
    let outcome = thread::Builder::new()
        .stack_size(512 * 1024 * 1024)
        .spawn(|| {
            let (printed, result) = run("def down(n) {\n  return down(n + 1)\n}\ndown(0)");
            (printed, result.map_err(|err| (err.exit_code(), err.to_string())))
        })
        .expect("spawn")
        .join()
        .expect("interpreter thread panicked");

    assert_eq!(
        outcome,
        (
            String::new(),
            Err((70, "Error at line 2: stack overflow".to_owned()))
        )
    );
}
