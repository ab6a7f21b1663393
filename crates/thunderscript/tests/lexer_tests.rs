//! Lexer behavior observed through the compiled program it produces, since
//! `token`/`lexer` are private to the crate.

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
        path.push(format!("thunderscript-lexer-{}-{n}.ts", std::process::id()));
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
fn line_and_block_comments_are_stripped_without_shifting_line_numbers() {
    let file = TempScript::new("#ref int r\n/* line2\nline3 */\nr = x ;");
    let mut ctx = Context::new();
    let err = Compiler::new().compile(&file.path, &mut ctx).unwrap_err();
    let thunderscript::HostError::Compile(compile_err) = err else { panic!("expected a compile error") };
    assert_eq!(compile_err.line, 4);
    assert!(compile_err.message.starts_with("UnknownIdentifier"));
}

#[test]
fn compound_operators_lex_as_single_tokens_not_two() {
    // If `>=`/`==` mis-lexed as `>`/`=` pairs, this wouldn't even compile —
    // a second `=` mid-expression is a malformed expression statement.
    let file = TempScript::new("#ref bool r1 #ref bool r2  r1 = 3 >= 3 ;  r2 = 2 == 3 ;");
    let mut ctx = Context::new();
    let index = Compiler::new().compile(&file.path, &mut ctx).unwrap();
    let mut runtime = Runtime::new(ctx);
    runtime.load_script(index).unwrap();
    runtime.run().unwrap();
    assert!(runtime.get_global::<bool>("r1").unwrap());
    assert!(!runtime.get_global::<bool>("r2").unwrap());
}

#[test]
fn identifiers_sharing_a_prefix_with_a_reserved_word_are_not_misparsed() {
    let file = TempScript::new("#ref int r  int integer = 1 ;  int infinity = 2 ;  r = integer + infinity ;");
    let mut ctx = Context::new();
    let index = Compiler::new().compile(&file.path, &mut ctx).unwrap();
    let mut runtime = Runtime::new(ctx);
    runtime.load_script(index).unwrap();
    runtime.run().unwrap();
    assert_eq!(runtime.get_global::<i32>("r").unwrap(), 3);
}

#[test]
fn for_is_reserved_and_cannot_be_used_as_a_declared_identifier() {
    let file = TempScript::new("int for ;");
    let mut ctx = Context::new();
    let err = Compiler::new().compile(&file.path, &mut ctx).unwrap_err();
    let thunderscript::HostError::Compile(compile_err) = err else { panic!("expected a compile error") };
    assert!(compile_err.message.starts_with("UnexpectedToken"));
}
