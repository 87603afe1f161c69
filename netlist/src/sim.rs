use std::collections::BTreeMap;

use crate::{Cell, CellRef, Const, Design, Memory, MemoryPortRelation, Net, Trit, Value};

/// A cycle-based simulator for a design.
///
/// All clocked elements (memory write ports and synchronous read ports) are assumed to be driven by
/// one implicit clock, which ticks once per [`Simulator::step`].  Elements clocked by a constant never
/// trigger.  Combinational logic is evaluated on demand from the current inputs and state.
///
/// Writes through an address that is undefined or out of bounds do not modify the memory.
pub struct Simulator<'a> {
    design: &'a Design,
    inputs: BTreeMap<String, Const>,
    memories: BTreeMap<usize, Vec<Const>>,
    read_data: BTreeMap<(usize, usize), Const>,
    cycle: u64,
}

enum Slot {
    Busy,
    Ready(Const),
}

struct Evaluation<'a, 'b> {
    simulator: &'b Simulator<'a>,
    slots: BTreeMap<usize, Slot>,
}

struct RowWrite {
    row: usize,
    mask: Const,
    data: Const,
}

impl<'a, 'b> Evaluation<'a, 'b> {
    fn new(simulator: &'b Simulator<'a>) -> Self {
        Evaluation { simulator, slots: BTreeMap::new() }
    }

    fn net(&mut self, net: Net) -> Trit {
        match self.simulator.design.find_cell(net) {
            Ok((cell_ref, offset)) => self.cell(cell_ref)[offset],
            Err(trit) => trit,
        }
    }

    fn value(&mut self, value: &Value) -> Const {
        value.iter().map(|net| self.net(net)).collect()
    }

    fn address(&mut self, addr: &Value, depth: usize) -> Option<usize> {
        let row = usize::try_from(self.value(addr).as_uint()?).ok()?;
        (row < depth).then_some(row)
    }

    fn cell(&mut self, cell_ref: CellRef<'a>) -> Const {
        let index = cell_ref.index();
        match self.slots.get(&index) {
            Some(Slot::Ready(output)) => return output.clone(),
            Some(Slot::Busy) => panic!("combinational loop through cell %{index}"),
            None => (),
        }
        self.slots.insert(index, Slot::Busy);
        let output = match cell_ref.get() {
            Cell::Not(arg) => self.value(arg).not(),
            Cell::And(arg1, arg2) => self.value(arg1).and(self.value(arg2)),
            Cell::Or(arg1, arg2) => self.value(arg1).or(self.value(arg2)),
            Cell::Xor(arg1, arg2) => self.value(arg1).xor(self.value(arg2)),
            Cell::Eq(arg1, arg2) => Const::from(self.value(arg1).eq(self.value(arg2))),
            Cell::Memory(memory) => self.memory(index, memory),
            Cell::Input(name, _width) => self.simulator.inputs[name].clone(),
            Cell::Output(..) | Cell::Name(..) => Const::EMPTY,
        };
        self.slots.insert(index, Slot::Ready(output.clone()));
        output
    }

    fn memory(&mut self, index: usize, memory: &Memory) -> Const {
        let mut output = Const::EMPTY;
        for (port_index, read_port) in memory.read_ports.iter().enumerate() {
            match read_port.flip_flop {
                Some(_) => output.extend(self.simulator.read_data[&(index, port_index)].iter()),
                None => match self.address(&read_port.addr, memory.depth) {
                    Some(row) => output.extend(self.simulator.memories[&index][row].iter()),
                    None => output.extend(Const::undef(read_port.data_len).iter()),
                },
            }
        }
        output
    }

    fn row_writes(&mut self, memory: &Memory) -> Vec<Option<RowWrite>> {
        let mut writes = vec![];
        for write_port in &memory.write_ports {
            if write_port.clock.is_const() {
                writes.push(None);
                continue;
            }
            let mask = self.value(&write_port.mask);
            let row = match self.address(&write_port.addr, memory.depth) {
                Some(row) if !mask.is_zero() => row,
                _ => {
                    writes.push(None);
                    continue;
                }
            };
            let data = self.value(&write_port.data);
            writes.push(Some(RowWrite { row, mask, data }));
        }
        writes
    }
}

impl<'a> Simulator<'a> {
    pub fn new(design: &'a Design) -> Simulator<'a> {
        let mut inputs = BTreeMap::new();
        let mut memories = BTreeMap::new();
        let mut read_data = BTreeMap::new();
        for cell_ref in design.iter_cells() {
            match cell_ref.get() {
                Cell::Input(name, width) => {
                    inputs.insert(name.clone(), Const::undef(*width));
                }
                Cell::Memory(memory) => {
                    memories.insert(cell_ref.index(), (0..memory.depth).map(|row| memory.row_init(row)).collect());
                    for (port_index, read_port) in memory.read_ports.iter().enumerate() {
                        if let Some(ref flip_flop) = read_port.flip_flop {
                            read_data.insert((cell_ref.index(), port_index), flip_flop.init_value.clone());
                        }
                    }
                }
                _ => (),
            }
        }
        Simulator { design, inputs, memories, read_data, cycle: 0 }
    }

    /// Returns the number of clock cycles simulated so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn set_input(&mut self, name: &str, value: impl Into<Const>) {
        let value = value.into();
        match self.inputs.get_mut(name) {
            Some(input) => {
                assert_eq!(input.len(), value.len(), "width mismatch for input {name:?}");
                *input = value;
            }
            None => panic!("no input named {name:?}"),
        }
    }

    pub fn set_input_uint(&mut self, name: &str, value: u128) {
        let width = match self.inputs.get(name) {
            Some(input) => input.len(),
            None => panic!("no input named {name:?}"),
        };
        self.set_input(name, Const::from_uint(value, width));
    }

    /// Evaluates a value of the design with the current inputs and state.
    pub fn get(&self, value: impl Into<Value>) -> Const {
        Evaluation::new(self).value(&value.into())
    }

    /// Evaluates the value connected to the output with the given name.
    pub fn get_output(&self, name: &str) -> Const {
        for cell_ref in self.design.iter_cells() {
            if let Cell::Output(output_name, value) = cell_ref.get() {
                if output_name == name {
                    return self.get(value);
                }
            }
        }
        panic!("no output named {name:?}")
    }

    /// Returns the current contents of a row of the memory driving `net`.
    pub fn memory_row(&self, net: Net, row: usize) -> Const {
        match self.design.find_cell(net) {
            Ok((cell_ref, _)) if self.memories.contains_key(&cell_ref.index()) => {
                self.memories[&cell_ref.index()][row].clone()
            }
            _ => panic!("net {net} is not driven by a memory"),
        }
    }

    /// Advances the implicit clock by one cycle, committing every memory write and sampling every
    /// synchronous read port at the same time.
    pub fn step(&mut self) {
        let mut memory_updates = vec![];
        let mut read_data_updates = vec![];
        {
            let mut evaluation = Evaluation::new(self);
            for cell_ref in self.design.iter_cells() {
                let Cell::Memory(memory) = cell_ref.get() else { continue };
                let index = cell_ref.index();
                let rows = &self.memories[&index];
                let writes = evaluation.row_writes(memory);

                for (port_index, read_port) in memory.read_ports.iter().enumerate() {
                    let Some(ref flip_flop) = read_port.flip_flop else { continue };
                    if flip_flop.clock.is_const() {
                        continue;
                    }
                    let enable = flip_flop.enable.is_active_when(evaluation.net(flip_flop.enable.net()));
                    let data = match enable {
                        Trit::Zero => continue,
                        Trit::Undef => Const::undef(read_port.data_len),
                        Trit::One => match evaluation.address(&read_port.addr, memory.depth) {
                            None => Const::undef(read_port.data_len),
                            Some(row) => {
                                let mut data = rows[row].clone();
                                for (write, &relation) in writes.iter().zip(flip_flop.relations.iter()) {
                                    let Some(write) = write else { continue };
                                    if write.row != row {
                                        continue;
                                    }
                                    data = match relation {
                                        MemoryPortRelation::Transparent => data.update(&write.mask, &write.data),
                                        MemoryPortRelation::ReadBeforeWrite => data,
                                        MemoryPortRelation::Undefined => {
                                            data.update(&write.mask, Const::undef(memory.width))
                                        }
                                    };
                                }
                                data
                            }
                        },
                    };
                    read_data_updates.push(((index, port_index), data));
                }

                let mut new_rows = rows.clone();
                let mut written = BTreeMap::<usize, Const>::new();
                for write in writes.into_iter().flatten() {
                    let row = &mut new_rows[write.row];
                    let written_mask = written.entry(write.row).or_insert_with(|| Const::zero(memory.width));
                    // bits written by more than one port at once are undefined
                    let collision = written_mask.and(&write.mask);
                    *row = row.update(&write.mask, &write.data).update(&collision, Const::undef(memory.width));
                    *written_mask = written_mask.or(&write.mask);
                }
                if new_rows != *rows {
                    memory_updates.push((index, new_rows));
                }
            }
        }
        for (index, rows) in memory_updates {
            self.memories.insert(index, rows);
        }
        for (key, data) in read_data_updates {
            self.read_data.insert(key, data);
        }
        self.cycle += 1;
        log::trace!("simulated cycle {}", self.cycle);
    }
}
