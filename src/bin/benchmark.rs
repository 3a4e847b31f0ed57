use jal_interpreter::{runner, Evaluator};
use std::time::Instant;

static INPUT: &str = "def fibonacci(x) {
  if x == 0 then return 0
  if x == 1 then return 1
  return fibonacci(x - 1) + fibonacci(x - 2)
}
println(fibonacci(25))";

fn main() {
    let (program, locals) = match runner::check(INPUT) {
        Ok(checked) => checked,
        Err(diagnostics) => {
            eprintln!("{}", diagnostics);
            std::process::exit(65);
        }
    };

    let mut evaluator = Evaluator::new();
    evaluator.add_locals(locals);

    let start = Instant::now();
    let outcome = evaluator.interpret(&program);
    let duration = start.elapsed();

    if let Err(err) = outcome {
        eprintln!("{}", err);
        std::process::exit(70);
    }

    println!("engine=tree-walker, duration={}", duration.as_secs_f64());
}
