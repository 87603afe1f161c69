use mpmem_netlist::Value;

use crate::ReadPortHandle;

/// The purpose of a primitive bank within a built memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BankRole {
    /// Holds the contribution of write port `writer` for read port `reader`.
    Replica { writer: usize, reader: usize },
    /// Relays the contribution of write port `from` into the write data of write port `to`.
    Relay { from: usize, to: usize },
}

/// A primitive bank, i.e. a memory cell with one write port and one read port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bank {
    pub role: BankRole,
    /// The read data of the bank.
    pub output: Value,
}

/// The result of building a memory: the read data of every read port, and the banks that were created.
///
/// The cells are added to the design through its change queue, so they become visible once
/// [`Design::apply`] is called.
///
/// [`Design::apply`]: mpmem_netlist::Design::apply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    read_data: Vec<Value>,
    banks: Vec<Bank>,
}

impl Topology {
    pub(crate) fn new(read_data: Vec<Value>, banks: Vec<Bank>) -> Topology {
        Topology { read_data, banks }
    }

    pub fn read_data(&self, handle: ReadPortHandle) -> &Value {
        &self.read_data[handle.index()]
    }

    pub fn all_read_data(&self) -> &[Value] {
        &self.read_data
    }

    pub fn banks(&self) -> &[Bank] {
        &self.banks
    }

    pub fn bank_count(&self) -> usize {
        self.banks.len()
    }

    pub fn banks_with_role(&self, filter: impl Fn(BankRole) -> bool) -> impl Iterator<Item = &Bank> {
        self.banks.iter().filter(move |bank| filter(bank.role))
    }
}
