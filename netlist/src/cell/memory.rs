use std::collections::BTreeMap;

use crate::{Const, ControlNet, Net, Value};

/// A random-access memory cell.
///
/// A memory is made of `depth` rows, each of them `width` bits wide.  Every port accesses exactly
/// one row at a time.  A memory with exactly one write port and one read port is a *primitive bank*,
/// the only kind of storage that the multiport memory emulation instantiates.
///
/// There are no priority rules among write ports.  If more than one port writes to the same
/// memory bit at the same time, the value written is undefined.
///
/// The output of the memory cell consists of the read data from all the read ports,
/// concatenated in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Memory {
    pub depth: usize,
    pub width: usize,
    /// Initial value for the memory, with all the rows concatenated in order.
    /// Must have a length equal to `depth * width`.
    pub init_value: Const,
    /// Opaque metadata, carried along for downstream tools.
    pub attrs: BTreeMap<String, String>,
    pub write_ports: Vec<MemoryWritePort>,
    pub read_ports: Vec<MemoryReadPort>,
}

/// A synchronous memory write port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoryWritePort {
    /// The row to write.  Writes to out-of-bounds rows do not modify the memory.
    pub addr: Value,
    /// The write data.  Must be as wide as the memory.
    pub data: Value,
    /// The write mask.  Must have the same width as `data`.  On every active clock edge,
    /// a `1` enables writing to the memory for the given data bit, `0` prevents writing.
    pub mask: Value,
    pub clock: ControlNet,
}

/// A memory read port, either synchronous or asynchronous.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoryReadPort {
    /// The row to read.  Reading an out-of-bounds row results in an undefined value.
    pub addr: Value,
    pub data_len: usize,
    /// The sampling register of a synchronous read port, or `None` for asynchronous read ports,
    /// which continuously output the contents of the row selected by `addr`.
    pub flip_flop: Option<MemoryReadFlipFlop>,
}

/// Control signals and collision behavior of a synchronous read port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoryReadFlipFlop {
    pub clock: ControlNet,
    /// While inactive, the read data holds its previous value.
    pub enable: ControlNet,
    /// Read data before the first enabled clock edge.  Must be `data_len` bits wide.
    pub init_value: Const,
    /// The behavior of this read port during a simultaneous write to the same row by a given
    /// write port.  Each entry corresponds to the write port with the same index in the
    /// `write_ports` vector of the containing memory.
    pub relations: Vec<MemoryPortRelation>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MemoryPortRelation {
    #[default]
    /// The read data is undefined for the bits being written.
    Undefined,
    /// The read data is the contents of the row before the write.
    ReadBeforeWrite,
    /// The read data is the newly written value.
    Transparent,
}

impl Memory {
    pub fn output_len(&self) -> usize {
        self.read_ports.iter().map(|port| port.data_len).sum()
    }

    /// Returns true if this memory has exactly one write port and one read port.
    pub fn is_primitive(&self) -> bool {
        self.write_ports.len() == 1 && self.read_ports.len() == 1
    }

    pub fn row_init(&self, row: usize) -> Const {
        self.init_value.slice(row * self.width..(row + 1) * self.width)
    }

    pub fn validate(&self) {
        assert_eq!(self.init_value.len(), self.depth * self.width);
        for port in &self.write_ports {
            assert_eq!(port.data.len(), self.width);
            assert_eq!(port.mask.len(), self.width);
        }
        for port in &self.read_ports {
            assert_eq!(port.data_len, self.width);
            if let Some(ref flip_flop) = port.flip_flop {
                assert_eq!(flip_flop.init_value.len(), port.data_len);
                assert_eq!(flip_flop.relations.len(), self.write_ports.len());
                for (write_port_index, &relation) in flip_flop.relations.iter().enumerate() {
                    if relation != MemoryPortRelation::Undefined {
                        assert_eq!(self.write_ports[write_port_index].clock, flip_flop.clock);
                    }
                }
            }
        }
    }

    pub fn visit(&self, mut f: impl FnMut(Net)) {
        for write_port in &self.write_ports {
            write_port.visit(&mut f);
        }
        for read_port in &self.read_ports {
            read_port.visit(&mut f);
        }
    }

    pub fn visit_mut(&mut self, mut f: impl FnMut(&mut Net)) {
        for write_port in &mut self.write_ports {
            write_port.visit_mut(&mut f);
        }
        for read_port in &mut self.read_ports {
            read_port.visit_mut(&mut f);
        }
    }
}

impl MemoryWritePort {
    pub fn visit(&self, mut f: impl FnMut(Net)) {
        self.addr.visit(&mut f);
        self.data.visit(&mut f);
        self.mask.visit(&mut f);
        self.clock.visit(&mut f);
    }

    pub fn visit_mut(&mut self, mut f: impl FnMut(&mut Net)) {
        self.addr.visit_mut(&mut f);
        self.data.visit_mut(&mut f);
        self.mask.visit_mut(&mut f);
        self.clock.visit_mut(&mut f);
    }
}

impl MemoryReadPort {
    pub fn new_asynchronous(addr: impl Into<Value>, data_len: usize) -> Self {
        Self { addr: addr.into(), data_len, flip_flop: None }
    }

    pub fn new_clocked(addr: impl Into<Value>, data_len: usize, clock: impl Into<ControlNet>) -> Self {
        Self { addr: addr.into(), data_len, flip_flop: Some(MemoryReadFlipFlop::new(clock, data_len)) }
    }

    pub fn with_enable(self, enable: impl Into<ControlNet>) -> Self {
        let flip_flop = self.flip_flop.map(|flip_flop| MemoryReadFlipFlop { enable: enable.into(), ..flip_flop });
        Self { flip_flop, ..self }
    }

    pub fn with_relations(self, relations: impl IntoIterator<Item = MemoryPortRelation>) -> Self {
        let flip_flop = self
            .flip_flop
            .map(|flip_flop| MemoryReadFlipFlop { relations: relations.into_iter().collect(), ..flip_flop });
        Self { flip_flop, ..self }
    }

    pub fn visit(&self, mut f: impl FnMut(Net)) {
        self.addr.visit(&mut f);
        if let Some(ref flip_flop) = self.flip_flop {
            flip_flop.clock.visit(&mut f);
            flip_flop.enable.visit(&mut f);
        }
    }

    pub fn visit_mut(&mut self, mut f: impl FnMut(&mut Net)) {
        self.addr.visit_mut(&mut f);
        if let Some(ref mut flip_flop) = self.flip_flop {
            flip_flop.clock.visit_mut(&mut f);
            flip_flop.enable.visit_mut(&mut f);
        }
    }
}

impl MemoryReadFlipFlop {
    pub fn new(clock: impl Into<ControlNet>, data_len: usize) -> Self {
        MemoryReadFlipFlop {
            clock: clock.into(),
            enable: ControlNet::ONE,
            init_value: Const::undef(data_len),
            relations: vec![],
        }
    }

    pub fn has_enable(&self) -> bool {
        !self.enable.is_always(true)
    }

    pub fn has_init_value(&self) -> bool {
        !self.init_value.is_undef()
    }
}
