use std::collections::BTreeSet;

use mpmem_netlist::{Net, Value};

use crate::{MemoryError, StorageDescriptor};

/// Identifies a read port within the memory it was declared on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReadPortHandle(usize);

/// Identifies a write port within the memory it was declared on.  Write ports are numbered in
/// declaration order, and lower numbers win collisions under [`CollisionPolicy::LowestIndexWins`].
///
/// [`CollisionPolicy::LowestIndexWins`]: crate::CollisionPolicy::LowestIndexWins
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WritePortHandle(usize);

impl ReadPortHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

impl WritePortHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A logical read port.  The read data is sampled on the active edge of the memory clock while
/// `enable` is high, and holds its value otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPort {
    pub addr: Value,
    pub enable: Net,
    /// Write ports whose same-cycle write to the same row this port observes.  For every other write
    /// port, the read data is the contents of the row before the write.
    pub transparent_for: BTreeSet<WritePortHandle>,
}

/// A logical write port.  On the active edge of the memory clock, the enabled bits of `data` are
/// written into the row selected by `addr`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePort {
    pub addr: Value,
    pub data: Value,
    /// One net without a granularity, or one net per `granularity`-bit chunk of `data`, least
    /// significant chunk first.
    pub enable: Value,
    pub granularity: Option<usize>,
}

impl ReadPort {
    pub fn new(addr: impl Into<Value>, enable: impl Into<Net>) -> ReadPort {
        ReadPort { addr: addr.into(), enable: enable.into(), transparent_for: BTreeSet::new() }
    }

    pub fn transparent_for(mut self, write_ports: impl IntoIterator<Item = WritePortHandle>) -> ReadPort {
        self.transparent_for.extend(write_ports);
        self
    }

    pub fn is_transparent_for(&self, write_port: WritePortHandle) -> bool {
        self.transparent_for.contains(&write_port)
    }
}

impl WritePort {
    pub fn new(addr: impl Into<Value>, data: impl Into<Value>, enable: impl Into<Net>) -> WritePort {
        WritePort { addr: addr.into(), data: data.into(), enable: Value::from(enable.into()), granularity: None }
    }

    pub fn with_granularity(
        addr: impl Into<Value>,
        data: impl Into<Value>,
        enable: impl Into<Value>,
        granularity: usize,
    ) -> WritePort {
        WritePort { addr: addr.into(), data: data.into(), enable: enable.into(), granularity: Some(granularity) }
    }

    /// Expands the enable into a per-bit write mask as wide as `data`.
    pub fn mask(&self) -> Value {
        match self.granularity {
            None => self.enable.repeat(self.data.len()),
            Some(granularity) => Value::from_iter(self.enable.iter().flat_map(|net| std::iter::repeat_n(net, granularity))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Ports may be declared.
    Open,
    /// The memory has been built; the declared ports are final.
    Frozen,
}

/// The ports declared on a memory, in declaration order.
///
/// Ports may only be appended while the registry is [`Phase::Open`].  [`PortRegistry::freeze`] is called
/// exactly once, when the memory is built.
#[derive(Debug, Clone)]
pub struct PortRegistry {
    descriptor: StorageDescriptor,
    read_ports: Vec<ReadPort>,
    write_ports: Vec<WritePort>,
    phase: Phase,
    write_capacity: Option<usize>,
}

impl PortRegistry {
    /// Creates a registry that accepts at most `write_capacity` write ports, or any number if `None`.
    pub fn new(descriptor: StorageDescriptor, write_capacity: Option<usize>) -> PortRegistry {
        PortRegistry { descriptor, read_ports: vec![], write_ports: vec![], phase: Phase::Open, write_capacity }
    }

    pub fn descriptor(&self) -> &StorageDescriptor {
        &self.descriptor
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn read_ports(&self) -> &[ReadPort] {
        &self.read_ports
    }

    pub fn write_ports(&self) -> &[WritePort] {
        &self.write_ports
    }

    pub fn read_port(&self, handle: ReadPortHandle) -> Option<&ReadPort> {
        self.read_ports.get(handle.0)
    }

    pub fn write_port(&self, handle: WritePortHandle) -> Option<&WritePort> {
        self.write_ports.get(handle.0)
    }

    pub fn write_port_handles(&self) -> impl Iterator<Item = WritePortHandle> {
        (0..self.write_ports.len()).map(WritePortHandle)
    }

    fn check_open(&self, what: &str) -> Result<(), MemoryError> {
        match self.phase {
            Phase::Open => Ok(()),
            Phase::Frozen => Err(MemoryError::lifecycle(format!("cannot {what} after the memory is built"))),
        }
    }

    fn check_addr(&self, addr: &Value) -> Result<(), MemoryError> {
        if addr.len() != self.descriptor.addr_width() {
            return Err(MemoryError::configuration(format!(
                "address is {} bits wide, expected {} for depth {}",
                addr.len(),
                self.descriptor.addr_width(),
                self.descriptor.depth()
            )));
        }
        Ok(())
    }

    pub fn declare_read_port(&mut self, port: ReadPort) -> Result<ReadPortHandle, MemoryError> {
        self.check_open("declare a read port")?;
        self.check_addr(&port.addr)?;
        if let Some(handle) = port.transparent_for.iter().find(|handle| handle.0 >= self.write_ports.len()) {
            return Err(MemoryError::configuration(format!(
                "read port is transparent for undeclared write port {}",
                handle.0
            )));
        }
        self.read_ports.push(port);
        Ok(ReadPortHandle(self.read_ports.len() - 1))
    }

    pub fn declare_write_port(&mut self, port: WritePort) -> Result<WritePortHandle, MemoryError> {
        self.check_open("declare a write port")?;
        if let Some(capacity) = self.write_capacity {
            if self.write_ports.len() >= capacity {
                return Err(MemoryError::capacity(format!("memory supports at most {capacity} write port(s)")));
            }
        }
        self.check_addr(&port.addr)?;
        let width = self.descriptor.width();
        if port.data.len() != width {
            return Err(MemoryError::configuration(format!(
                "write data is {} bits wide, expected {width}",
                port.data.len()
            )));
        }
        let enable_len = match port.granularity {
            None => 1,
            Some(0) => return Err(MemoryError::configuration("write granularity must be positive")),
            Some(granularity) if width % granularity != 0 => {
                return Err(MemoryError::configuration(format!(
                    "write granularity {granularity} does not divide row width {width}"
                )))
            }
            Some(granularity) => width / granularity,
        };
        if port.enable.len() != enable_len {
            return Err(MemoryError::configuration(format!(
                "write enable is {} bits wide, expected {enable_len}",
                port.enable.len()
            )));
        }
        self.write_ports.push(port);
        Ok(WritePortHandle(self.write_ports.len() - 1))
    }

    /// Transitions the registry from [`Phase::Open`] to [`Phase::Frozen`].
    pub fn freeze(&mut self) -> Result<(), MemoryError> {
        self.check_open("build the memory")?;
        self.phase = Phase::Frozen;
        Ok(())
    }

    /// Checks that every declared port refers only to declared ports and has the declared shape.
    pub(crate) fn check_consistency(&self) -> Result<(), MemoryError> {
        let (addr_width, width) = (self.descriptor.addr_width(), self.descriptor.width());
        for (index, read_port) in self.read_ports.iter().enumerate() {
            if read_port.addr.len() != addr_width {
                return Err(MemoryError::internal_invariant(format!("read port {index} has a malformed address")));
            }
            if read_port.transparent_for.iter().any(|handle| self.write_port(*handle).is_none()) {
                return Err(MemoryError::internal_invariant(format!(
                    "read port {index} refers to a missing write port"
                )));
            }
        }
        for (index, write_port) in self.write_ports.iter().enumerate() {
            if write_port.addr.len() != addr_width || write_port.data.len() != width || write_port.mask().len() != width
            {
                return Err(MemoryError::internal_invariant(format!("write port {index} is malformed")));
            }
        }
        if let Some(capacity) = self.write_capacity {
            if self.write_ports.len() > capacity {
                return Err(MemoryError::internal_invariant("more write ports declared than supported"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use mpmem_netlist::{Net, Value};

    use crate::{Phase, PortRegistry, ReadPort, StorageDescriptor, WritePort};

    fn registry(write_capacity: Option<usize>) -> PortRegistry {
        PortRegistry::new(StorageDescriptor::new(8, 4).unwrap(), write_capacity)
    }

    #[test]
    fn test_declaration_order() {
        let mut registry = registry(None);
        let write0 = registry.declare_write_port(WritePort::new(Value::zero(2), Value::zero(8), Net::ONE)).unwrap();
        let write1 = registry.declare_write_port(WritePort::new(Value::ones(2), Value::ones(8), Net::ONE)).unwrap();
        let read0 = registry.declare_read_port(ReadPort::new(Value::zero(2), Net::ONE)).unwrap();
        let read1 = registry.declare_read_port(ReadPort::new(Value::ones(2), Net::ONE).transparent_for([write1])).unwrap();
        assert_eq!((write0.index(), write1.index()), (0, 1));
        assert_eq!((read0.index(), read1.index()), (0, 1));
        assert_eq!(registry.write_ports()[1].data, Value::ones(8));
        assert_eq!(registry.read_ports()[1].addr, Value::ones(2));
        assert!(registry.read_port(read1).unwrap().is_transparent_for(write1));
        assert!(!registry.read_port(read1).unwrap().is_transparent_for(write0));
    }

    #[test]
    fn test_frozen() {
        let mut registry = registry(None);
        registry.freeze().unwrap();
        assert_eq!(registry.phase(), Phase::Frozen);
        let error = registry.declare_read_port(ReadPort::new(Value::zero(2), Net::ONE)).unwrap_err();
        assert!(error.is_lifecycle());
        let error = registry.declare_write_port(WritePort::new(Value::zero(2), Value::zero(8), Net::ONE)).unwrap_err();
        assert!(error.is_lifecycle());
        assert!(registry.freeze().unwrap_err().is_lifecycle());
        assert!(registry.read_ports().is_empty());
    }

    #[test]
    fn test_capacity() {
        let mut registry = registry(Some(1));
        registry.declare_write_port(WritePort::new(Value::zero(2), Value::zero(8), Net::ONE)).unwrap();
        let error = registry.declare_write_port(WritePort::new(Value::zero(2), Value::zero(8), Net::ONE)).unwrap_err();
        assert!(error.is_capacity());
        assert_eq!(registry.write_ports().len(), 1);
    }

    #[test]
    fn test_port_shape() {
        let mut registry = registry(None);
        let error = registry.declare_read_port(ReadPort::new(Value::zero(3), Net::ONE)).unwrap_err();
        assert!(error.is_configuration());
        let error = registry.declare_write_port(WritePort::new(Value::zero(2), Value::zero(7), Net::ONE)).unwrap_err();
        assert!(error.is_configuration());
        let error =
            registry.declare_write_port(WritePort::with_granularity(Value::zero(2), Value::zero(8), Value::ones(2), 3));
        assert!(error.unwrap_err().is_configuration());
        let error =
            registry.declare_write_port(WritePort::with_granularity(Value::zero(2), Value::zero(8), Value::ones(3), 4));
        assert!(error.unwrap_err().is_configuration());
        registry.declare_write_port(WritePort::with_granularity(Value::zero(2), Value::zero(8), Value::ones(2), 4)).unwrap();
    }

    #[test]
    fn test_transparent_for_undeclared() {
        let mut registry = registry(None);
        let write = registry.declare_write_port(WritePort::new(Value::zero(2), Value::zero(8), Net::ONE)).unwrap();
        let mut other = self::registry(None);
        other.declare_read_port(ReadPort::new(Value::zero(2), Net::ONE).transparent_for([write])).unwrap_err();
        registry.declare_read_port(ReadPort::new(Value::zero(2), Net::ONE).transparent_for([write])).unwrap();
    }

    #[test]
    fn test_mask() {
        let enable = Value::from_iter([Net::ONE, Net::ZERO]);
        let port = WritePort::with_granularity(Value::EMPTY, Value::zero(4), enable, 2);
        assert_eq!(port.mask(), Value::from_iter([Net::ONE, Net::ONE, Net::ZERO, Net::ZERO]));
        let port = WritePort::new(Value::EMPTY, Value::zero(3), Net::ZERO);
        assert_eq!(port.mask(), Value::zero(3));
    }
}
