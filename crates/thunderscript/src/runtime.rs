//! The host-facing runtime: `LoadScript` / `SetGlobal` / `GetGlobal` / `Run`.

use crate::buffer::Packed;
use crate::error::HostError;
use crate::script::{Context, Script, WriteMode};
use crate::types::ValueType;
use crate::vm::VirtualMachine;

/// A Rust type a global can be read or written as. Closed over the same
/// three value types the rest of the language uses.
pub trait GlobalValue: Packed {
    const VALUE_TYPE: ValueType;
}

impl GlobalValue for i32 {
    const VALUE_TYPE: ValueType = ValueType::Int;
}

impl GlobalValue for f32 {
    const VALUE_TYPE: ValueType = ValueType::Float;
}

impl GlobalValue for bool {
    const VALUE_TYPE: ValueType = ValueType::Bool;
}

/// Owns every compiled script plus the single virtual machine that runs
/// whichever one is currently loaded. `LoadScript` must precede
/// `SetGlobal`/`GetGlobal`/`Run`, matching `spec.md` §5's ordering
/// requirement; calling any of them first is a `NoScriptLoaded` error here
/// rather than undefined behavior.
pub struct Runtime {
    ctx: Context,
    vm: VirtualMachine,
    loaded: Option<usize>,
}

impl Runtime {
    #[must_use]
    pub fn new(ctx: Context) -> Self {
        Self { ctx, vm: VirtualMachine::new(), loaded: None }
    }

    #[must_use]
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    pub fn load_script(&mut self, index: usize) -> Result<(), HostError> {
        let script = self.ctx.get(index).ok_or(HostError::UnknownScript(index))?;
        self.vm.load(&script.code, script.stack_size)?;
        self.loaded = Some(index);
        Ok(())
    }

    pub fn run(&mut self) -> Result<(), HostError> {
        self.current_script()?;
        Ok(self.vm.run()?)
    }

    pub fn set_global<T: GlobalValue>(&mut self, name: &str, value: T) -> Result<(), HostError> {
        let global = self.global_descriptor(name)?;
        if global.ty != T::VALUE_TYPE {
            return Err(HostError::GlobalTypeMismatch { name: name.to_string() });
        }
        let offset = global.offset;
        Ok(self.vm.write_stack(offset, value)?)
    }

    pub fn get_global<T: GlobalValue>(&self, name: &str) -> Result<T, HostError> {
        let global = self.global_descriptor(name)?;
        if global.ty != T::VALUE_TYPE {
            return Err(HostError::GlobalTypeMismatch { name: name.to_string() });
        }
        Ok(self.vm.read_stack(global.offset)?)
    }

    /// Every `In`/`Ref` global the currently loaded script declared, for
    /// callers that want to enumerate before setting.
    pub fn globals(&self) -> Result<impl Iterator<Item = (&str, ValueType, WriteMode)>, HostError> {
        let script = self.current_script()?;
        Ok(script.globals.iter().map(|g| (g.name.as_str(), g.ty, g.mode)))
    }

    fn current_script(&self) -> Result<&Script, HostError> {
        let index = self.loaded.ok_or(HostError::NoScriptLoaded)?;
        self.ctx.get(index).ok_or(HostError::UnknownScript(index))
    }

    fn global_descriptor(&self, name: &str) -> Result<&crate::script::GlobalDescriptor, HostError> {
        self.current_script()?.global(name).ok_or_else(|| HostError::UnknownGlobal(name.to_string()))
    }
}
