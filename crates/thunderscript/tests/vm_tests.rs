//! Virtual-machine execution behavior, observed through the host-facing
//! `Runtime` since `VirtualMachine` is private to the crate. A manually
//! constructed `Script` (every field on `Script`/`GlobalDescriptor` is
//! public) stands in for the one case `Compiler` can never produce on its
//! own: deliberately invalid bytecode.

use std::io::Write as _;
use std::sync::atomic::{AtomicU32, Ordering};

use thunderscript::{Compiler, Context, HostError, Runtime, RuntimeError};

struct TempScript {
    path: std::path::PathBuf,
}

impl TempScript {
    fn new(contents: &str) -> Self {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);

        let mut path = std::env::temp_dir();
        path.push(format!("thunderscript-vm-{}-{n}.ts", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        Self { path }
    }
}

impl Drop for TempScript {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[test]
fn run_is_idempotent_across_repeated_calls() {
    let file = TempScript::new("#ref int r  r = 5 ;");
    let mut ctx = Context::new();
    let index = Compiler::new().compile(&file.path, &mut ctx).unwrap();
    let mut runtime = Runtime::new(ctx);
    runtime.load_script(index).unwrap();

    runtime.run().unwrap();
    assert_eq!(runtime.get_global::<i32>("r").unwrap(), 5);
    runtime.run().unwrap();
    assert_eq!(runtime.get_global::<i32>("r").unwrap(), 5);
}

#[test]
fn while_loop_counts_down_to_zero() {
    let file = TempScript::new("#ref int r  int i = 5 ;  while ( i > 0 ) { i = i - 1 ; }  r = i ;");
    let mut ctx = Context::new();
    let index = Compiler::new().compile(&file.path, &mut ctx).unwrap();
    let mut runtime = Runtime::new(ctx);
    runtime.load_script(index).unwrap();
    runtime.run().unwrap();
    assert_eq!(runtime.get_global::<i32>("r").unwrap(), 0);
}

#[test]
fn loading_a_script_with_an_unrecognized_opcode_byte_is_a_bad_opcode_error() {
    let mut ctx = Context::new();
    let index = ctx.push(thunderscript::Script { code: vec![255], globals: Vec::new(), stack_size: 0 });
    let mut runtime = Runtime::new(ctx);
    let err = runtime.load_script(index).unwrap_err();
    assert!(matches!(err, HostError::Runtime(RuntimeError::BadOpcode { ip: 0, byte: 255 })));
}
