//! This library builds memories with many read and write ports out of primitive banks, which are memories
//! with exactly one write port and one read port.
//!
//! Building a memory proceeds as follows:
//!
//! - a [`StorageDescriptor`] describing the shape and initial contents of the memory is created
//! - an engine is created from the descriptor:
//!   - [`MultiReadMemory`] supports a single write port, and replicates the storage once per read port
//!   - [`MultiportXorMemory`] supports any number of write ports, and combines the contributions of each
//!     write port using XOR
//! - read and write ports are declared on the engine; each declaration is validated immediately
//! - [`MemoryEngine::build`] freezes the port declarations and adds the banks and the logic connecting them
//!   to a [`Design`]; the read data of every read port is returned in a [`Topology`]
//!
//! After building, no more ports can be declared, and the memory cannot be built again.
//!
//! [`Design`]: mpmem_netlist::Design

mod descriptor;
mod error;
mod multi_read;
mod registry;
mod topology;
mod xor;

use mpmem_netlist::Design;

pub use descriptor::StorageDescriptor;
pub use error::MemoryError;
pub use multi_read::MultiReadMemory;
pub use registry::{Phase, PortRegistry, ReadPort, ReadPortHandle, WritePort, WritePortHandle};
pub use topology::{Bank, BankRole, Topology};
pub use xor::{CollisionPolicy, MultiportXorMemory};

/// A memory under construction.
pub trait MemoryEngine {
    fn registry(&self) -> &PortRegistry;

    /// Declares a read port.  Fails if the memory has been built, or if the port does not match
    /// the shape of the memory.
    fn read_port(&mut self, port: ReadPort) -> Result<ReadPortHandle, MemoryError>;

    /// Declares a write port.  Fails if the memory has been built, if the memory cannot have any more
    /// write ports, or if the port does not match the shape of the memory.
    fn write_port(&mut self, port: WritePort) -> Result<WritePortHandle, MemoryError>;

    /// The number of primitive banks that building the memory with the ports declared so far creates.
    fn expected_bank_count(&self) -> usize;

    /// Freezes the declared ports and adds the memory to `design`.  May only be called once.
    fn build(&mut self, design: &Design) -> Result<Topology, MemoryError>;
}
