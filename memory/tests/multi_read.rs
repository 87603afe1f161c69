use mpmem_memory::{BankRole, MemoryEngine, MultiReadMemory, ReadPort, StorageDescriptor, Topology, WritePort};
use mpmem_netlist::{Cell, Const, Design, MemoryPortRelation, Simulator};

struct Ports {
    writer: bool,
    readers: usize,
    granularity: Option<usize>,
    transparent: Vec<bool>,
}

impl Ports {
    fn new(readers: usize) -> Ports {
        Ports { writer: true, readers, granularity: None, transparent: vec![false; readers] }
    }
}

fn build(descriptor: StorageDescriptor, ports: &Ports) -> (Design, Topology) {
    let mut design = Design::new();
    let clk = design.add_input("clk", 1).unwrap_net();
    let (addr_width, width) = (descriptor.addr_width(), descriptor.width());
    let mut memory = MultiReadMemory::new(descriptor, clk);
    let mut writer = None;
    if ports.writer {
        let addr = design.add_input("waddr", addr_width);
        let data = design.add_input("wdata", width);
        let port = match ports.granularity {
            None => WritePort::new(addr, data, design.add_input("we", 1).unwrap_net()),
            Some(granularity) => {
                WritePort::with_granularity(addr, data, design.add_input("we", width / granularity), granularity)
            }
        };
        writer = Some(memory.write_port(port).unwrap());
    }
    for index in 0..ports.readers {
        let addr = design.add_input(format!("raddr{index}"), addr_width);
        let enable = design.add_input(format!("re{index}"), 1).unwrap_net();
        let mut port = ReadPort::new(addr, enable);
        if ports.transparent[index] {
            port = port.transparent_for(writer);
        }
        memory.read_port(port).unwrap();
    }
    let topology = memory.build(&design).unwrap();
    for (index, data) in topology.all_read_data().iter().enumerate() {
        design.add_output(format!("rdata{index}"), data);
    }
    design.apply();
    (design, topology)
}

fn idle(sim: &mut Simulator, ports: &Ports) {
    if ports.writer {
        sim.set_input_uint("waddr", 0);
        sim.set_input_uint("wdata", 0);
        sim.set_input_uint("we", 0);
    }
    for index in 0..ports.readers {
        sim.set_input_uint(&format!("raddr{index}"), 0);
        sim.set_input_uint(&format!("re{index}"), 1);
    }
}

fn read(sim: &Simulator, index: usize) -> Option<u128> {
    sim.get_output(&format!("rdata{index}")).as_uint()
}

#[test]
fn test_write_then_read() {
    // D=4, 8-bit rows, two readers: a write of 0x11 to row 2 is seen by both readers in the next cycle
    let ports = Ports::new(2);
    let (design, topology) = build(StorageDescriptor::new(8, 4).unwrap(), &ports);
    assert_eq!(topology.bank_count(), 2);
    assert_eq!(design.primitive_banks().len(), 2);

    let mut sim = Simulator::new(&design);
    idle(&mut sim, &ports);
    sim.set_input_uint("waddr", 2);
    sim.set_input_uint("wdata", 0x11);
    sim.set_input_uint("we", 1);
    sim.step();

    idle(&mut sim, &ports);
    sim.set_input_uint("raddr0", 2);
    sim.set_input_uint("raddr1", 2);
    sim.step();
    assert_eq!(read(&sim, 0), Some(0x11));
    assert_eq!(read(&sim, 1), Some(0x11));
}

#[test]
fn test_write_coherency() {
    for depth in [1, 2, 5, 16] {
        for readers in [1, 3] {
            let ports = Ports::new(readers);
            let descriptor = StorageDescriptor::new(4, depth).unwrap();
            let (design, topology) = build(descriptor, &ports);
            assert_eq!(topology.bank_count(), readers);

            let mut sim = Simulator::new(&design);
            for row in 0..depth {
                idle(&mut sim, &ports);
                sim.set_input_uint("waddr", row as u128);
                sim.set_input_uint("wdata", (row as u128 * 7 + 3) % 16);
                sim.set_input_uint("we", 1);
                sim.step();
            }
            for row in 0..depth {
                idle(&mut sim, &ports);
                for index in 0..readers {
                    sim.set_input_uint(&format!("raddr{index}"), ((row + index) % depth) as u128);
                }
                sim.step();
                for index in 0..readers {
                    let expected = (((row + index) % depth) as u128 * 7 + 3) % 16;
                    assert_eq!(read(&sim, index), Some(expected), "depth {depth}, reader {index}, row {row}");
                }
            }
        }
    }
}

#[test]
fn test_second_write_port() {
    for readers in 0..3 {
        let mut design = Design::new();
        let clk = design.add_input("clk", 1).unwrap_net();
        let mut memory = MultiReadMemory::new(StorageDescriptor::new(8, 4).unwrap(), clk);
        for _ in 0..readers {
            memory.read_port(ReadPort::new(design.add_input("raddr", 2), design.add_input("re", 1).unwrap_net())).unwrap();
        }
        let port = WritePort::new(design.add_input("waddr", 2), design.add_input("wdata", 8), clk);
        memory.write_port(port.clone()).unwrap();
        assert!(memory.write_port(port).unwrap_err().is_capacity());
        assert_eq!(memory.registry().write_ports().len(), 1);
    }
}

#[test]
fn test_declare_after_build() {
    let mut design = Design::new();
    let clk = design.add_input("clk", 1).unwrap_net();
    let mut memory = MultiReadMemory::new(StorageDescriptor::new(8, 4).unwrap(), clk);
    let read_port = ReadPort::new(design.add_input("raddr", 2), design.add_input("re", 1).unwrap_net());
    memory.read_port(read_port.clone()).unwrap();
    memory.build(&design).unwrap();

    assert!(memory.read_port(read_port).unwrap_err().is_lifecycle());
    let write_port = WritePort::new(design.add_input("waddr", 2), design.add_input("wdata", 8), clk);
    assert!(memory.write_port(write_port).unwrap_err().is_lifecycle());
    assert!(memory.build(&design).unwrap_err().is_lifecycle());
    assert_eq!(memory.registry().read_ports().len(), 1);
}

#[test]
fn test_no_readers() {
    let (design, topology) = build(StorageDescriptor::new(8, 4).unwrap(), &Ports::new(0));
    assert_eq!(topology.bank_count(), 0);
    assert!(design.primitive_banks().is_empty());
}

#[test]
fn test_read_only() {
    let descriptor = StorageDescriptor::new(8, 3)
        .unwrap()
        .with_init([Const::from_uint(0x5a, 8), Const::from_uint(0xc3, 8)])
        .unwrap();
    let ports = Ports { writer: false, ..Ports::new(1) };
    let (design, _topology) = build(descriptor, &ports);
    let mut sim = Simulator::new(&design);
    for (row, expected) in [(0, 0x5a), (1, 0xc3), (2, 0x00)] {
        idle(&mut sim, &ports);
        sim.set_input_uint("raddr0", row);
        sim.step();
        assert_eq!(read(&sim, 0), Some(expected));
    }
}

#[test]
fn test_transparency() {
    let ports = Ports { transparent: vec![true, false], ..Ports::new(2) };
    let (design, topology) = build(StorageDescriptor::new(8, 4).unwrap(), &ports);
    let relations = Vec::from_iter(topology.banks().iter().map(|bank| {
        let (cell_ref, _) = design.find_cell(bank.output[0]).unwrap();
        let Cell::Memory(memory) = cell_ref.get() else { unreachable!() };
        memory.read_ports[0].flip_flop.as_ref().unwrap().relations.clone()
    }));
    assert_eq!(relations, vec![vec![MemoryPortRelation::Transparent], vec![MemoryPortRelation::ReadBeforeWrite]]);

    let mut sim = Simulator::new(&design);
    idle(&mut sim, &ports);
    sim.set_input_uint("waddr", 1);
    sim.set_input_uint("wdata", 0x42);
    sim.set_input_uint("we", 1);
    sim.set_input_uint("raddr0", 1);
    sim.set_input_uint("raddr1", 1);
    sim.step();
    assert_eq!(read(&sim, 0), Some(0x42));
    assert_eq!(read(&sim, 1), Some(0x00));
}

#[test]
fn test_read_enable() {
    let ports = Ports::new(1);
    let (design, _topology) = build(StorageDescriptor::new(8, 2).unwrap(), &ports);
    let mut sim = Simulator::new(&design);
    idle(&mut sim, &ports);
    sim.step();
    assert_eq!(read(&sim, 0), Some(0));

    sim.set_input_uint("re0", 0);
    sim.set_input_uint("wdata", 0xff);
    sim.set_input_uint("we", 1);
    sim.step();
    sim.set_input_uint("we", 0);
    sim.step();
    assert_eq!(read(&sim, 0), Some(0));
    sim.set_input_uint("re0", 1);
    sim.step();
    assert_eq!(read(&sim, 0), Some(0xff));
}

#[test]
fn test_granularity() {
    let ports = Ports { granularity: Some(4), ..Ports::new(1) };
    let (design, _topology) = build(StorageDescriptor::new(8, 2).unwrap(), &ports);
    let mut sim = Simulator::new(&design);
    idle(&mut sim, &ports);
    sim.set_input_uint("wdata", 0xff);
    sim.set_input_uint("we", 0b11);
    sim.step();
    sim.set_input_uint("wdata", 0x00);
    sim.set_input_uint("we", 0b10);
    sim.step();
    sim.set_input_uint("we", 0b00);
    sim.step();
    assert_eq!(read(&sim, 0), Some(0x0f));
}

#[test]
fn test_bank_roles() {
    let mut design = Design::new();
    let clk = design.add_input("clk", 1).unwrap_net();
    let descriptor = StorageDescriptor::new(8, 4).unwrap().with_attr("ram_style", "block");
    let mut memory = MultiReadMemory::new(descriptor, clk).with_name("mem");
    for _ in 0..3 {
        memory.read_port(ReadPort::new(design.add_input("raddr", 2), design.add_input("re", 1).unwrap_net())).unwrap();
    }
    let topology = memory.build(&design).unwrap();
    design.apply();
    let roles = Vec::from_iter(topology.banks().iter().map(|bank| bank.role));
    assert_eq!(
        roles,
        vec![
            BankRole::Replica { writer: 0, reader: 0 },
            BankRole::Replica { writer: 0, reader: 1 },
            BankRole::Replica { writer: 0, reader: 2 },
        ]
    );
    for cell_ref in design.primitive_banks() {
        let Cell::Memory(memory) = cell_ref.get() else { unreachable!() };
        assert_eq!(memory.attrs["ram_style"], "block");
    }
    assert_eq!(design.statistics()["name"], 3);
}
