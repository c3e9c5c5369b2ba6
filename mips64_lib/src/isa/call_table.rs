//! Handler tables binding catalog entries to the functions executing them

use super::catalog::OpId;
use super::decode::DecodeTable;
use super::instruction::DecodedInstruction;
use super::opcode::{Family, Opcode};
use crate::error::{MipsError, MipsResult};

/// Signature of an instruction handler running on core `C`
pub type Handler<C> = fn(&mut C, &DecodedInstruction) -> MipsResult<()>;

/// Per-core table of handlers indexed by `OpId`. Built once with the `bind*` methods and then
/// validated against a decode table with `finish`.
pub struct CallTable<C> {
    name: &'static str,
    handlers: [Option<Handler<C>>; OpId::COUNT],
}

impl<C> CallTable<C> {
    pub fn new(name: &'static str) -> CallTable<C> {
        CallTable {
            name,
            handlers: [None; OpId::COUNT],
        }
    }

    /// Bind `handler` to every opcode in `ops`
    pub fn bind(mut self, handler: Handler<C>, ops: &[&Opcode]) -> CallTable<C> {
        for op in ops {
            self.handlers[op.id.index()] = Some(handler);
        }

        self
    }

    /// Bind `handler` to every opcode of `family` reachable through `table` that doesn't have a
    /// handler yet
    pub fn bind_family(mut self, handler: Handler<C>, table: &DecodeTable, family: Family) -> CallTable<C> {
        for op in table.reachable() {
            let slot = &mut self.handlers[op.id.index()];

            if op.family == family && slot.is_none() {
                *slot = Some(handler);
            }
        }

        self
    }

    /// Make sure every opcode reachable through `table` has a handler
    pub fn finish(self, table: &DecodeTable) -> MipsResult<CallTable<C>> {
        let missing: Vec<&'static str> = table
            .reachable()
            .into_iter()
            .filter(|op| self.handlers[op.id.index()].is_none())
            .map(|op| op.mnemonic)
            .collect();

        if missing.is_empty() {
            Ok(self)
        } else {
            Err(MipsError::IncompleteCallTable {
                table: self.name,
                missing,
            })
        }
    }

    pub fn handler(&self, op: &Opcode) -> Option<Handler<C>> {
        self.handlers[op.id.index()]
    }

    /// Run the handler bound to `inst`
    pub fn call(&self, core: &mut C, inst: &DecodedInstruction) -> MipsResult<()> {
        match self.handler(inst.op) {
            Some(h) => h(core, inst),
            None => Err(MipsError::UnboundOpcode(inst.op.mnemonic)),
        }
    }
}
