//! The six literal end-to-end scenarios from the specification, run through
//! the full `Compiler`/`Runtime` host API rather than any internal module.

use std::io::Write as _;
use std::sync::atomic::{AtomicU32, Ordering};

use pretty_assertions::assert_eq;
use thunderscript::{Compiler, Context, Runtime};

struct TempScript {
    path: std::path::PathBuf,
}

impl TempScript {
    fn new(contents: &str) -> Self {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);

        let mut path = std::env::temp_dir();
        path.push(format!("thunderscript-e2e-{}-{n}.ts", std::process::id()));
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
fn adds_two_ref_globals_into_a_third() {
    let file = TempScript::new("#ref int a #ref int b #ref int r  r = a + b ;");
    let mut ctx = Context::new();
    let index = Compiler::new().compile(&file.path, &mut ctx).unwrap();

    let mut runtime = Runtime::new(ctx);
    runtime.load_script(index).unwrap();
    runtime.set_global("a", 2_i32).unwrap();
    runtime.set_global("b", 3_i32).unwrap();
    runtime.run().unwrap();

    assert_eq!(runtime.get_global::<i32>("r").unwrap(), 5);
}

#[test]
fn float_division_uses_the_fixed_div_opcode_not_the_source_bug() {
    // spec.md §8 scenario 2: the source's dominant compiler erroneously
    // emits ADDF for `/`, producing 14.0. This implementation fixes that
    // bug (spec.md §9(b)) and must produce the mathematically correct 2.5.
    let file = TempScript::new("#ref float a #ref float b #ref float r  r = a / b ;");
    let mut ctx = Context::new();
    let index = Compiler::new().compile(&file.path, &mut ctx).unwrap();

    let mut runtime = Runtime::new(ctx);
    runtime.load_script(index).unwrap();
    runtime.set_global("a", 10.0_f32).unwrap();
    runtime.set_global("b", 4.0_f32).unwrap();
    runtime.run().unwrap();

    assert_eq!(runtime.get_global::<f32>("r").unwrap(), 2.5);
}

#[test]
fn while_loop_sums_zero_through_nine() {
    let file = TempScript::new(
        "#ref int r  int x = 0 ;  int i = 0 ;  while (i < 10) { x = x + i ;  i = i + 1 ; }  r = x ;",
    );
    let mut ctx = Context::new();
    let index = Compiler::new().compile(&file.path, &mut ctx).unwrap();

    let mut runtime = Runtime::new(ctx);
    runtime.load_script(index).unwrap();
    runtime.run().unwrap();

    assert_eq!(runtime.get_global::<i32>("r").unwrap(), 45);
}

#[test]
fn boolean_not_and_or_and_comparison_compose() {
    let file = TempScript::new("#ref bool r  bool a ;  a = true ;  r = !a || (1 < 2) ;");
    let mut ctx = Context::new();
    let index = Compiler::new().compile(&file.path, &mut ctx).unwrap();

    let mut runtime = Runtime::new(ctx);
    runtime.load_script(index).unwrap();
    runtime.run().unwrap();

    assert!(runtime.get_global::<bool>("r").unwrap());
}

#[test]
fn if_guard_only_runs_when_condition_holds_and_stack_starts_zeroed() {
    let taken = TempScript::new("#in int n  #ref int r  if (n == 0) { r = 100 ; }");
    let mut ctx = Context::new();
    let index = Compiler::new().compile(&taken.path, &mut ctx).unwrap();
    let mut runtime = Runtime::new(ctx);
    runtime.load_script(index).unwrap();
    runtime.set_global("n", 0_i32).unwrap();
    runtime.run().unwrap();
    assert_eq!(runtime.get_global::<i32>("r").unwrap(), 100);

    let not_taken = TempScript::new("#in int n  #ref int r  if (n == 0) { r = 100 ; }");
    let mut ctx = Context::new();
    let index = Compiler::new().compile(&not_taken.path, &mut ctx).unwrap();
    let mut runtime = Runtime::new(ctx);
    runtime.load_script(index).unwrap();
    runtime.set_global("n", 1_i32).unwrap();
    runtime.run().unwrap();
    assert_eq!(runtime.get_global::<i32>("r").unwrap(), 0);
}

#[test]
fn negate_targets_a_fresh_temporary_not_the_parenthesized_sum() {
    let file = TempScript::new("#ref float r  r = -(1.5 + 2.5) ;");
    let mut ctx = Context::new();
    let index = Compiler::new().compile(&file.path, &mut ctx).unwrap();

    let mut runtime = Runtime::new(ctx);
    runtime.load_script(index).unwrap();
    runtime.run().unwrap();

    assert_eq!(runtime.get_global::<f32>("r").unwrap(), -4.0);
}

#[test]
fn empty_program_compiles_to_a_single_end_and_running_it_is_a_no_op() {
    let file = TempScript::new("");
    let mut ctx = Context::new();
    let index = Compiler::new().compile(&file.path, &mut ctx).unwrap();
    let script = ctx.get(index).unwrap();
    let listing = thunderscript::disassemble(&script.code);
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].text, "END");

    let mut runtime = Runtime::new(ctx);
    runtime.load_script(index).unwrap();
    runtime.run().unwrap();
    runtime.run().unwrap();
}

#[test]
fn nested_scopes_reuse_storage_rather_than_growing_the_stack() {
    let mut contents = String::from("#ref int r  r = 0 ;");
    for _ in 0..5 {
        contents.push_str(" { int i ; i = 1 ; }");
    }
    let file = TempScript::new(&contents);
    let mut ctx = Context::new();
    let index = Compiler::new().compile(&file.path, &mut ctx).unwrap();
    let script = ctx.get(index).unwrap();

    // r (int, 4 bytes) + one reused int-sized slot for every `i` = 8 bytes
    // total, not 4 + 5*4 = 24, since each `{ }` scope reuses the same offset.
    assert_eq!(script.stack_size, 8);
}
