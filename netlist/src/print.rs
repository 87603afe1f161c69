use std::fmt::Display;

use crate::{Cell, CellRef, Const, ControlNet, Design, MemoryPortRelation, Net, Value};

enum Chunk {
    Cell { index: usize, offset: usize, width: usize, whole: bool },
    Const(Const),
    Net(Net),
}

impl Design {
    fn is_printable_cell_net(&self, net: Net) -> bool {
        match net.as_cell_index() {
            Ok(index) => index < self.node_count() && !self.is_void(net),
            Err(_) => false,
        }
    }

    pub(crate) fn write_net(&self, f: &mut std::fmt::Formatter, net: Net) -> std::fmt::Result {
        if let Ok(index) = net.as_cell_index() {
            if !self.is_printable_cell_net(net) {
                // placeholder or not yet applied; print it without looking it up
                return write!(f, "%_{index}");
            }
        }
        match self.find_cell(net) {
            Ok((cell_ref, _offset)) if cell_ref.output_len() == 1 => write!(f, "%{}", cell_ref.index()),
            Ok((cell_ref, offset)) => write!(f, "%{}+{offset}", cell_ref.index()),
            Err(trit) => write!(f, "{trit}"),
        }
    }

    pub(crate) fn write_value(&self, f: &mut std::fmt::Formatter, value: &Value) -> std::fmt::Result {
        let mut chunks = vec![];
        let mut index = 0;
        while index < value.len() {
            let net = value[index];
            if net.is_const() {
                let trits = Const::from_iter(value[index..].iter().map_while(|net| net.as_const()));
                index += trits.len();
                chunks.push(Chunk::Const(trits));
            } else if !self.is_printable_cell_net(net) {
                index += 1;
                chunks.push(Chunk::Net(net));
            } else if let Ok((cell_ref, offset)) = self.find_cell(net) {
                let width = value[index..]
                    .iter()
                    .enumerate()
                    .take_while(|&(addend, &other)| {
                        self.is_printable_cell_net(other)
                            && matches!(self.find_cell(other),
                                Ok((other_ref, other_offset)) if other_ref == cell_ref && other_offset == offset + addend)
                    })
                    .count();
                index += width;
                let whole = offset == 0 && width == cell_ref.output_len();
                chunks.push(Chunk::Cell { index: cell_ref.index(), offset, width, whole });
            }
        }
        if chunks.is_empty() {
            return write!(f, "[]");
        }
        let single_chunk = chunks.len() == 1;
        if !single_chunk {
            write!(f, "[")?;
        }
        for chunk in chunks.into_iter().rev() {
            if !single_chunk {
                write!(f, " ")?;
            }
            match chunk {
                Chunk::Cell { index, offset, width, whole } => {
                    write!(f, "%{index}")?;
                    if !whole {
                        write!(f, "+{offset}")?;
                    }
                    if width != 1 {
                        write!(f, ":{width}")?;
                    }
                }
                Chunk::Const(trits) => write!(f, "{trits}")?,
                Chunk::Net(net) => self.write_net(f, net)?,
            }
        }
        if !single_chunk {
            write!(f, " ]")?;
        }
        Ok(())
    }

    fn write_control(&self, f: &mut std::fmt::Formatter, name: &str, control_net: ControlNet) -> std::fmt::Result {
        write!(f, " {name}=")?;
        if control_net.is_negative() {
            write!(f, "!")?;
        }
        self.write_net(f, control_net.net())
    }

    pub(crate) fn write_cell(&self, f: &mut std::fmt::Formatter, cell_ref: CellRef) -> std::fmt::Result {
        let write_common = |f: &mut std::fmt::Formatter, name: &str, args: &[&Value]| -> std::fmt::Result {
            write!(f, "{name}")?;
            for arg in args {
                write!(f, " ")?;
                self.write_value(f, arg)?;
            }
            Ok(())
        };

        write!(f, "%{}:{} = ", cell_ref.index(), cell_ref.output_len())?;
        match cell_ref.get() {
            Cell::Not(arg) => write_common(f, "not", &[arg])?,
            Cell::And(arg1, arg2) => write_common(f, "and", &[arg1, arg2])?,
            Cell::Or(arg1, arg2) => write_common(f, "or", &[arg1, arg2])?,
            Cell::Xor(arg1, arg2) => write_common(f, "xor", &[arg1, arg2])?,
            Cell::Eq(arg1, arg2) => write_common(f, "eq", &[arg1, arg2])?,
            Cell::Memory(memory) => {
                writeln!(f, "memory depth=#{} width=#{} {{", memory.depth, memory.width)?;
                // trailing rows that start out all-zero or all-undef are omitted
                let init_rows = (0..memory.depth)
                    .rev()
                    .find(|&row| {
                        let row_init = memory.row_init(row);
                        !(row_init.is_zero() || row_init.is_undef())
                    })
                    .map_or(0, |row| row + 1);
                for row in 0..init_rows {
                    writeln!(f, "    init {}", memory.row_init(row))?;
                }
                for write_port in &memory.write_ports {
                    write!(f, "    write addr=")?;
                    self.write_value(f, &write_port.addr)?;
                    write!(f, " data=")?;
                    self.write_value(f, &write_port.data)?;
                    if write_port.mask.iter().any(|net| net != Net::ONE) {
                        write!(f, " mask=")?;
                        self.write_value(f, &write_port.mask)?;
                    }
                    self.write_control(f, "clk", write_port.clock)?;
                    writeln!(f)?;
                }
                for read_port in &memory.read_ports {
                    write!(f, "    read addr=")?;
                    self.write_value(f, &read_port.addr)?;
                    write!(f, " width=#{}", read_port.data_len)?;
                    if let Some(ref flip_flop) = read_port.flip_flop {
                        self.write_control(f, "clk", flip_flop.clock)?;
                        if flip_flop.has_enable() {
                            self.write_control(f, "en", flip_flop.enable)?;
                        }
                        if flip_flop.has_init_value() {
                            write!(f, " init={}", flip_flop.init_value)?;
                        }
                        write!(f, " [")?;
                        for (index, relation) in flip_flop.relations.iter().enumerate() {
                            if index > 0 {
                                write!(f, " ")?;
                            }
                            match relation {
                                MemoryPortRelation::Undefined => write!(f, "undef")?,
                                MemoryPortRelation::ReadBeforeWrite => write!(f, "rdfirst")?,
                                MemoryPortRelation::Transparent => write!(f, "trans")?,
                            }
                        }
                        write!(f, "]")?;
                    }
                    writeln!(f)?;
                }
                for (name, value) in &memory.attrs {
                    writeln!(f, "    attr {name:?} = {value:?}")?;
                }
                write!(f, "}}")?;
            }
            Cell::Input(name, _width) => write!(f, "input {name:?}")?,
            Cell::Output(name, value) => {
                write!(f, "output {name:?} ")?;
                self.write_value(f, value)?;
            }
            Cell::Name(name, value) => {
                write!(f, "name {name:?} ")?;
                self.write_value(f, value)?;
            }
        }
        Ok(())
    }
}

impl Display for Design {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for cell_ref in self.iter_cells() {
            self.write_cell(f, cell_ref)?;
            writeln!(f)?;
        }
        Ok(())
    }
}
