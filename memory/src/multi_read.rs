use log::{debug, trace};
use mpmem_netlist::{ControlNet, Design, Memory, MemoryPortRelation, MemoryReadPort, MemoryWritePort, Value};

use crate::{
    Bank, BankRole, MemoryEngine, MemoryError, PortRegistry, ReadPort, ReadPortHandle, StorageDescriptor, Topology,
    WritePort, WritePortHandle,
};

/// A memory with one write port and any number of read ports.
///
/// Every read port gets a dedicated primitive bank.  The write port drives the write ports of all of
/// the banks identically, so that they always hold the same contents.  If no write port is declared,
/// the banks are read-only and hold the initial contents forever.
#[derive(Debug, Clone)]
pub struct MultiReadMemory {
    registry: PortRegistry,
    clock: ControlNet,
    name: Option<String>,
    writer: usize,
}

impl MultiReadMemory {
    pub fn new(descriptor: StorageDescriptor, clock: impl Into<ControlNet>) -> MultiReadMemory {
        MultiReadMemory { registry: PortRegistry::new(descriptor, Some(1)), clock: clock.into(), name: None, writer: 0 }
    }

    /// Names the read data of every bank in the built design, using `name` as a prefix.
    pub fn with_name(mut self, name: impl Into<String>) -> MultiReadMemory {
        self.name = Some(name.into());
        self
    }

    // The index of the write port of an enclosing memory that this one fans out, for bank roles.
    pub(crate) fn fanning_out(mut self, writer: usize) -> MultiReadMemory {
        self.writer = writer;
        self
    }

    fn bank(&self, write_port: &MemoryWritePort, read_port: &ReadPort, writer: Option<WritePortHandle>) -> Memory {
        let descriptor = self.registry.descriptor();
        let relation = match writer {
            Some(writer) if read_port.is_transparent_for(writer) => MemoryPortRelation::Transparent,
            _ => MemoryPortRelation::ReadBeforeWrite,
        };
        Memory {
            depth: descriptor.depth(),
            width: descriptor.width(),
            init_value: descriptor.init_value(),
            attrs: descriptor.attrs().clone(),
            write_ports: vec![write_port.clone()],
            read_ports: vec![MemoryReadPort::new_clocked(&read_port.addr, descriptor.width(), self.clock)
                .with_enable(read_port.enable)
                .with_relations([relation])],
        }
    }
}

impl MemoryEngine for MultiReadMemory {
    fn registry(&self) -> &PortRegistry {
        &self.registry
    }

    fn read_port(&mut self, port: ReadPort) -> Result<ReadPortHandle, MemoryError> {
        self.registry.declare_read_port(port)
    }

    fn write_port(&mut self, port: WritePort) -> Result<WritePortHandle, MemoryError> {
        self.registry.declare_write_port(port)
    }

    fn expected_bank_count(&self) -> usize {
        self.registry.read_ports().len()
    }

    fn build(&mut self, design: &Design) -> Result<Topology, MemoryError> {
        self.registry.freeze()?;
        self.registry.check_consistency()?;

        let descriptor = self.registry.descriptor();
        let writer = self.registry.write_port_handles().next();
        let write_port = match self.registry.write_ports().first() {
            Some(port) => MemoryWritePort { addr: port.addr.clone(), data: port.data.clone(), mask: port.mask(), clock: self.clock },
            None => {
                debug!("memory has no write port; banks hold their initial contents");
                MemoryWritePort {
                    addr: Value::zero(descriptor.addr_width()),
                    data: Value::zero(descriptor.width()),
                    mask: Value::zero(descriptor.width()),
                    clock: self.clock,
                }
            }
        };

        let mut read_data = vec![];
        let mut banks = vec![];
        for (index, read_port) in self.registry.read_ports().iter().enumerate() {
            let output = design.add_memory(self.bank(&write_port, read_port, writer));
            if let Some(ref name) = self.name {
                design.add_name(format!("{name}.replica{index}"), &output);
            }
            trace!("replica bank for write port {} and read port {index}", self.writer);
            banks.push(Bank { role: BankRole::Replica { writer: self.writer, reader: index }, output: output.clone() });
            read_data.push(output);
        }

        if banks.len() != self.expected_bank_count() {
            return Err(MemoryError::internal_invariant(format!(
                "built {} banks, expected {}",
                banks.len(),
                self.expected_bank_count()
            )));
        }
        debug!(
            "built {}x{} memory with {} read port(s) out of {} bank(s)",
            descriptor.depth(),
            descriptor.width(),
            read_data.len(),
            banks.len()
        );
        Ok(Topology::new(read_data, banks))
    }
}
