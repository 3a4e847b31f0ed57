use jal_interpreter::runner;
use std::env;
use std::process;
use std::thread;

/// Stack for the interpreter thread, large enough for the deepest call
/// chain the evaluator allows.
const WORKER_STACK_SIZE: usize = 512 * 1024 * 1024;

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Logs only when asked for, and never on stdout
    if env::var("RUST_LOG").is_ok() {
        let filter = EnvFilter::from_default_env();
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(filter)
            .init();
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: jal <script>");
        process::exit(64);
    }

    init_tracing();

    let path = args[1].clone();
    let worker = thread::Builder::new()
        .name("jal".to_owned())
        .stack_size(WORKER_STACK_SIZE)
        .spawn(move || runner::run_file(&path));

    let code = match worker {
        Ok(handle) => match handle.join() {
            Ok(Ok(())) => 0,
            Ok(Err(err)) => {
                eprintln!("{}", err);
                err.exit_code()
            }
            Err(_) => 70,
        },
        Err(err) => {
            eprintln!("Error: could not start the interpreter: {}", err);
            70
        }
    };

    process::exit(code);
}
