//! Expression-tree folding/emission behavior, observed through compiled and
//! run scripts since `Node`/`build` are private to the crate.

use std::io::Write as _;
use std::sync::atomic::{AtomicU32, Ordering};

use thunderscript::{Compiler, Context, Runtime};

struct TempScript {
    path: std::path::PathBuf,
}

impl TempScript {
    fn new(contents: &str) -> Self {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);

        let mut path = std::env::temp_dir();
        path.push(format!("thunderscript-expr-{}-{n}.ts", std::process::id()));
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

fn compile_and_run(source: &str) -> Runtime {
    let file = TempScript::new(source);
    let mut ctx = Context::new();
    let index = Compiler::new().compile(&file.path, &mut ctx).unwrap();
    let mut runtime = Runtime::new(ctx);
    runtime.load_script(index).unwrap();
    runtime.run().unwrap();
    runtime
}

#[test]
fn subtraction_is_left_associative() {
    // (10 - 3) - 2 = 5, not 10 - (3 - 2) = 9.
    let runtime = compile_and_run("#ref int r  r = 10 - 3 - 2 ;");
    assert_eq!(runtime.get_global::<i32>("r").unwrap(), 5);
}

#[test]
fn double_negation_is_equivalent_to_the_original_value() {
    let runtime = compile_and_run("#ref bool r  bool a ;  a = true ;  r = !!a ;");
    assert!(runtime.get_global::<bool>("r").unwrap());
}

#[test]
fn uninitialized_use_outside_an_assignment_lhs_errors() {
    let file = TempScript::new("#ref int r  int x ;  r = x + 1 ;");
    let mut ctx = Context::new();
    let err = Compiler::new().compile(&file.path, &mut ctx).unwrap_err();
    let thunderscript::HostError::Compile(compile_err) = err else { panic!("expected a compile error") };
    assert!(compile_err.message.starts_with("UninitializedUse"));
}

#[test]
fn negate_targets_a_fresh_temporary_leaving_the_operand_unchanged() {
    let runtime = compile_and_run("#ref int r #ref int x  x = 5 ;  r = -x ;");
    assert_eq!(runtime.get_global::<i32>("r").unwrap(), -5);
    assert_eq!(runtime.get_global::<i32>("x").unwrap(), 5);
}

#[test]
fn more_than_or_equal_is_correct_at_the_equal_boundary() {
    let runtime = compile_and_run("#ref bool r1 #ref bool r2  r1 = 3 >= 3 ;  r2 = 2 >= 3 ;");
    assert!(runtime.get_global::<bool>("r1").unwrap());
    assert!(!runtime.get_global::<bool>("r2").unwrap());
}
