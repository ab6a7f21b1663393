//! Assigns byte offsets to named values, with scoped reuse of storage and
//! compile-time constant interning.
//!
//! Offsets are never reclaimed within a compilation. On scope exit, the
//! descriptors requested during that scope are flipped `!in_use` so a later
//! request of matching type revives the same offset instead of growing the
//! stack further. This is the scheme `spec.md` §9 asks for: a flat array of
//! descriptors plus a stack of per-scope index lists, no actual freeing.

use crate::error::CompileError;
use crate::types::ValueType;

/// One variable's compile-time bookkeeping: identifier, storage location,
/// type, and the three lifecycle flags the spec's invariants are stated in
/// terms of.
#[derive(Debug, Clone)]
pub struct VarDescriptor {
    pub name: String,
    pub offset: u32,
    pub ty: ValueType,
    pub in_use: bool,
    pub constant: bool,
    pub initialized: bool,
    pub size: u32,
    /// Monotonically increasing across every `request_var`/`request_temp`
    /// call, including revivals. Diagnostic only: distinguishes successive
    /// occupants of a reused offset in `Debug` output and error messages,
    /// and has no effect on offsets or reuse.
    pub generation: u32,
}

/// Opaque handle into the pool's descriptor table. Stable for the lifetime
/// of a compilation — the offset behind it can be revived for a different
/// variable, but the index itself never moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VarId(usize);

pub struct VariablePool {
    descriptors: Vec<VarDescriptor>,
    scopes: Vec<Vec<VarId>>,
    frontier: u32,
    temp_counter: u32,
    next_generation: u32,
}

impl VariablePool {
    #[must_use]
    pub fn new() -> Self {
        Self { descriptors: Vec::new(), scopes: Vec::new(), frontier: 0, temp_counter: 0, next_generation: 0 }
    }

    #[must_use]
    pub fn total_bytes(&self) -> u32 {
        self.frontier
    }

    #[must_use]
    pub fn get(&self, id: VarId) -> &VarDescriptor {
        &self.descriptors[id.0]
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    /// Marks every descriptor requested in the current scope `!in_use` so
    /// their offsets become eligible for reuse, then pops the scope.
    pub fn exit_scope(&mut self) {
        if let Some(ids) = self.scopes.pop() {
            for id in ids {
                self.descriptors[id.0].in_use = false;
            }
        }
    }

    /// Requests storage for a variable of `ty`. Revives a same-typed,
    /// not-in-use descriptor if one exists; otherwise allocates a fresh
    /// offset at the current byte frontier.
    pub fn request_var(&mut self, ty: ValueType, name: impl Into<String>, constant: bool, initialized: bool) -> VarId {
        let name = name.into();
        let generation = self.next_generation;
        self.next_generation += 1;
        if let Some(index) = self.descriptors.iter().position(|d| d.ty == ty && !d.in_use) {
            let d = &mut self.descriptors[index];
            d.name = name;
            d.constant = constant;
            d.initialized = initialized;
            d.in_use = true;
            d.generation = generation;
            let id = VarId(index);
            self.attach_to_scope(id);
            return id;
        }

        let size = ty.size_in_bytes();
        let offset = self.frontier;
        self.frontier += size;
        let id = VarId(self.descriptors.len());
        self.descriptors.push(VarDescriptor {
            name,
            offset,
            ty,
            in_use: true,
            constant,
            initialized,
            size,
            generation,
        });
        self.attach_to_scope(id);
        id
    }

    /// Requests a uniquely named temporary for holding an intermediate
    /// expression result. Temporaries participate in scope reuse exactly
    /// like user-declared variables.
    pub fn request_temp(&mut self, ty: ValueType) -> VarId {
        let name = format!("temp#{}", self.temp_counter);
        self.temp_counter += 1;
        self.request_var(ty, name, false, false)
    }

    /// Returns the most recently requested in-use descriptor named `name`,
    /// so an inner scope's redeclaration shadows an outer one still live on
    /// the scope stack.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<VarId> {
        self.descriptors.iter().enumerate().rev().find(|(_, d)| d.in_use && d.name == name).map(|(i, _)| VarId(i))
    }

    pub fn initialize(&mut self, id: VarId) {
        self.descriptors[id.0].initialized = true;
    }

    /// Returns `var` unchanged if its type already matches `target`;
    /// otherwise allocates a fresh temporary of `target` and emits the
    /// matching cast instruction. Only `Int <-> Float` casts are allowed.
    pub fn cast(
        &mut self,
        target: ValueType,
        var: VarId,
        builder: &mut crate::bytecode::builder::CodeBuilder,
        line: u32,
    ) -> Result<VarId, CompileError> {
        let current = self.get(var).ty;
        if current == target {
            return Ok(var);
        }
        let temp = self.request_temp(target);
        match (current, target) {
            (ValueType::Int, ValueType::Float) => builder.emit_itof(self.get(var).offset, self.get(temp).offset),
            (ValueType::Float, ValueType::Int) => builder.emit_ftoi(self.get(var).offset, self.get(temp).offset),
            _ => return Err(CompileError::new(format!("InvalidCast: cannot cast {current} to {target}"), line)),
        }
        self.initialize(temp);
        Ok(temp)
    }

    fn attach_to_scope(&mut self, id: VarId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.push(id);
        }
    }
}

impl Default for VariablePool {
    fn default() -> Self {
        Self::new()
    }
}
