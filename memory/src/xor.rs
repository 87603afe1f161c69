use log::{debug, trace, warn};
use mpmem_netlist::{ControlNet, Design, Memory, MemoryReadPort, MemoryWritePort, Value};

use crate::{
    Bank, BankRole, MemoryEngine, MemoryError, MultiReadMemory, PortRegistry, ReadPort, ReadPortHandle,
    StorageDescriptor, Topology, WritePort, WritePortHandle,
};

/// The behavior of a [`MultiportXorMemory`] when several write ports write the same bit of the same
/// row in one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// No arbitration logic is built.  The bits written by colliding write ports end up holding the
    /// XOR of all of the written data, further XORed with the previous contents if an even number of
    /// write ports collide.  Callers are expected to never issue colliding writes.
    #[default]
    Unresolved,
    /// The write port with the lowest index wins; the colliding bits of every other write port are
    /// masked off.
    LowestIndexWins,
}

/// A memory with any number of write ports and read ports, built out of primitive banks.
///
/// The contents of a row are the XOR of the rows of `W` bank groups, one per write port.  Write port
/// `i` writes the group `i` row with its data XORed with the rows of every other group at the same
/// address, which cancels out their contribution.  To fetch those rows in the same cycle, write port
/// `j` relays everything it writes into a dedicated bank per other write port `i`, read asynchronously
/// at the address of write port `i`.  Group `i` is a [`MultiReadMemory`] with one bank per read port,
/// and a read port outputs the XOR of its banks in all groups.
///
/// This takes `W * (W - 1 + R)` banks for `W` write ports and `R` read ports.  The initial contents
/// are placed into group 0 only.
#[derive(Debug, Clone)]
pub struct MultiportXorMemory {
    registry: PortRegistry,
    clock: ControlNet,
    name: Option<String>,
    collision_policy: CollisionPolicy,
}

impl MultiportXorMemory {
    pub fn new(descriptor: StorageDescriptor, clock: impl Into<ControlNet>) -> MultiportXorMemory {
        MultiportXorMemory {
            registry: PortRegistry::new(descriptor, None),
            clock: clock.into(),
            name: None,
            collision_policy: CollisionPolicy::default(),
        }
    }

    /// Names the read data of every bank in the built design, using `name` as a prefix.
    pub fn with_name(mut self, name: impl Into<String>) -> MultiportXorMemory {
        self.name = Some(name.into());
        self
    }

    pub fn with_collision_policy(mut self, collision_policy: CollisionPolicy) -> MultiportXorMemory {
        self.collision_policy = collision_policy;
        self
    }

    pub fn collision_policy(&self) -> CollisionPolicy {
        self.collision_policy
    }

    fn write_masks(&self, design: &Design) -> Vec<Value> {
        let width = self.registry.descriptor().width();
        let write_ports = self.registry.write_ports();
        let masks = Vec::from_iter(write_ports.iter().map(WritePort::mask));
        match self.collision_policy {
            CollisionPolicy::Unresolved => masks,
            CollisionPolicy::LowestIndexWins => Vec::from_iter(write_ports.iter().enumerate().map(|(index, port)| {
                let mut conflict = None::<Value>;
                for (other_index, other_port) in write_ports[..index].iter().enumerate() {
                    let same_row = design.add_eq(&other_port.addr, &port.addr);
                    let other_conflict = design.add_and(&masks[other_index], same_row.repeat(width));
                    conflict = Some(match conflict {
                        None => other_conflict,
                        Some(conflict) => design.add_or(conflict, other_conflict),
                    });
                }
                match conflict {
                    None => masks[index].clone(),
                    Some(conflict) => design.add_and(&masks[index], design.add_not(conflict)),
                }
            })),
        }
    }

    fn relay_bank(&self, descriptor: &StorageDescriptor, write_port: MemoryWritePort, addr: &Value) -> Memory {
        Memory {
            depth: descriptor.depth(),
            width: descriptor.width(),
            init_value: descriptor.init_value(),
            attrs: descriptor.attrs().clone(),
            write_ports: vec![write_port],
            read_ports: vec![MemoryReadPort::new_asynchronous(addr, descriptor.width())],
        }
    }
}

impl MemoryEngine for MultiportXorMemory {
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
        let writers = self.registry.write_ports().len();
        let readers = self.registry.read_ports().len();
        writers * (writers.saturating_sub(1) + readers)
    }

    fn build(&mut self, design: &Design) -> Result<Topology, MemoryError> {
        self.registry.freeze()?;
        self.registry.check_consistency()?;

        let descriptor = self.registry.descriptor();
        let width = descriptor.width();
        let write_ports = self.registry.write_ports();
        let read_ports = self.registry.read_ports();
        debug!(
            "building {}x{} memory with {} write port(s) and {} read port(s)",
            descriptor.depth(),
            width,
            write_ports.len(),
            read_ports.len()
        );
        if write_ports.is_empty() {
            warn!("memory has no write ports; its read data is undefined");
            let read_data = Vec::from_iter(read_ports.iter().map(|_| Value::undef(width)));
            return Ok(Topology::new(read_data, vec![]));
        }

        let group_descriptor = |writer: usize| match writer {
            0 => descriptor.clone(),
            _ => descriptor.without_init(),
        };
        let masks = self.write_masks(design);
        let write_xors = Vec::from_iter(write_ports.iter().map(|_| design.add_void(width)));
        let mut combined = Vec::from_iter(write_ports.iter().map(|port| port.data.clone()));
        let mut banks = vec![];

        // relays
        for (from, write_port) in write_ports.iter().enumerate() {
            let relay_write_port = MemoryWritePort {
                addr: write_port.addr.clone(),
                data: write_xors[from].clone(),
                mask: masks[from].clone(),
                clock: self.clock,
            };
            for (to, other_port) in write_ports.iter().enumerate() {
                if to == from {
                    continue;
                }
                let bank = self.relay_bank(&group_descriptor(from), relay_write_port.clone(), &other_port.addr);
                let output = design.add_memory(bank);
                if let Some(ref name) = self.name {
                    design.add_name(format!("{name}.relay{from}_{to}"), &output);
                }
                trace!("relay bank from write port {from} to write port {to}");
                combined[to] = design.add_xor(&combined[to], &output);
                banks.push(Bank { role: BankRole::Relay { from, to }, output });
            }
        }
        for (write_xor, combined) in write_xors.iter().zip(combined) {
            design.replace_value(write_xor, combined);
        }

        // fan-out
        let fan_out_error =
            |error: MemoryError| MemoryError::internal_invariant(format!("cannot build fan-out stage: {error}"));
        let mut group_read_data = vec![];
        for (writer, write_handle) in self.registry.write_port_handles().enumerate() {
            let mut group = MultiReadMemory::new(group_descriptor(writer), self.clock).fanning_out(writer);
            if let Some(ref name) = self.name {
                group = group.with_name(format!("{name}.group{writer}"));
            }
            let write_port = &write_ports[writer];
            let group_write_handle = group
                .write_port(WritePort::with_granularity(&write_port.addr, &write_xors[writer], &masks[writer], 1))
                .map_err(fan_out_error)?;
            for read_port in read_ports {
                let mut group_read_port = ReadPort::new(&read_port.addr, read_port.enable);
                if read_port.is_transparent_for(write_handle) {
                    group_read_port = group_read_port.transparent_for([group_write_handle]);
                }
                group.read_port(group_read_port).map_err(fan_out_error)?;
            }
            let topology = group.build(design).map_err(fan_out_error)?;
            banks.extend(topology.banks().iter().cloned());
            group_read_data.push(topology.all_read_data().to_vec());
        }

        let mut read_data = vec![];
        for reader in 0..read_ports.len() {
            let mut data = group_read_data[0][reader].clone();
            for group in &group_read_data[1..] {
                data = design.add_xor(&data, &group[reader]);
            }
            read_data.push(data);
        }

        if banks.len() != self.expected_bank_count() {
            return Err(MemoryError::internal_invariant(format!(
                "built {} banks, expected {}",
                banks.len(),
                self.expected_bank_count()
            )));
        }
        debug!("built memory out of {} bank(s)", banks.len());
        Ok(Topology::new(read_data, banks))
    }
}
