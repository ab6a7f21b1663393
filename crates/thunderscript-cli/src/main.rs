use std::io::{self, Write as _};
use std::process::ExitCode;
use std::time::Instant;

use thunderscript::{Compiler, Context, HostError, Runtime, ValueType, WriteMode, format_listing};

fn main() -> ExitCode {
    println!("ThunderScript Compiler");

    loop {
        let Some(file_path) = prompt("Please enter a file path: ") else {
            return ExitCode::SUCCESS;
        };
        if file_path == "exit" {
            return ExitCode::SUCCESS;
        }

        let mut ctx = Context::new();
        let index = match Compiler::new().compile(&file_path, &mut ctx) {
            Ok(index) => index,
            Err(HostError::FileNotFound(path)) => {
                println!("Could not find file: {path}");
                continue;
            }
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };
        println!("Successfully compiled {file_path}!");

        let script = ctx.get(index).expect("index just returned by compile");
        println!("{}", format_listing(&script.code));

        let Some(answer) = prompt("Do you want to run it? (y/n): ") else {
            return ExitCode::SUCCESS;
        };
        if answer != "y" {
            continue;
        }

        let mut runtime = Runtime::new(ctx);
        if let Err(err) = runtime.load_script(index) {
            eprintln!("{err}");
            continue;
        }

        preset_globals(&mut runtime);

        println!("Running script:\n");
        let start = Instant::now();
        if let Err(err) = runtime.run() {
            eprintln!("{err}");
            continue;
        }
        let elapsed = start.elapsed();

        report_globals(&runtime);
        println!("Program took: {elapsed:?}");
    }
}

/// Sets every `In` float global to a placeholder demo value, the way the
/// original interpreter's sample scripts expect `a`/`b` to arrive preset.
/// A real host would source these from its own configuration instead.
fn preset_globals(runtime: &mut Runtime) {
    let names: Vec<String> = match runtime.globals() {
        Ok(globals) => globals
            .filter(|(_, ty, mode)| *ty == ValueType::Float && *mode == WriteMode::In)
            .map(|(name, ..)| name.to_owned())
            .collect(),
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };
    for (n, name) in names.iter().enumerate() {
        let value = (n + 2) as f32;
        if let Err(err) = runtime.set_global::<f32>(name, value) {
            eprintln!("{err}");
        } else {
            println!("Set global {name} to {value}");
        }
    }
}

/// Prints every `Ref` global's post-run value.
fn report_globals(runtime: &Runtime) {
    let refs: Vec<(String, ValueType)> = match runtime.globals() {
        Ok(globals) => {
            globals.filter(|(_, _, mode)| *mode == WriteMode::Ref).map(|(name, ty, _)| (name.to_owned(), ty)).collect()
        }
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };
    for (name, ty) in refs {
        let result = match ty {
            ValueType::Int => runtime.get_global::<i32>(&name).map(|v| v.to_string()),
            ValueType::Float => runtime.get_global::<f32>(&name).map(|v| v.to_string()),
            ValueType::Bool => runtime.get_global::<bool>(&name).map(|v| v.to_string()),
            ValueType::Unknown => unreachable!("a compiled global is never Unknown"),
        };
        match result {
            Ok(value) => println!("Global {name} has a value of: {value}"),
            Err(err) => eprintln!("{err}"),
        }
    }
}

fn prompt(message: &str) -> Option<String> {
    print!("{message}");
    io::stdout().flush().ok()?;
    let mut line = String::new();
    let read = io::stdin().read_line(&mut line).ok()?;
    if read == 0 {
        return None;
    }
    Some(line.trim().to_owned())
}
