use crate::{Net, Value};

mod memory;

pub use memory::{Memory, MemoryPortRelation, MemoryReadFlipFlop, MemoryReadPort, MemoryWritePort};

/// A netlist cell.
///
/// Every cell has an output of `output_len()` bits, which may be zero.  Bitwise cells require
/// their value arguments to have equal widths.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    Not(Value),
    And(Value, Value),
    Or(Value, Value),
    Xor(Value, Value),
    Eq(Value, Value),

    Memory(Memory),

    Input(String, usize),
    Output(String, Value),
    Name(String, Value),
}

impl Cell {
    pub fn validate(&self) {
        match self {
            Cell::Not(_) => (),
            Cell::And(arg1, arg2)
            | Cell::Or(arg1, arg2)
            | Cell::Xor(arg1, arg2)
            | Cell::Eq(arg1, arg2) => assert_eq!(arg1.len(), arg2.len()),
            Cell::Memory(memory) => memory.validate(),
            Cell::Input(..) | Cell::Output(..) | Cell::Name(..) => (),
        }
    }

    pub fn output_len(&self) -> usize {
        match self {
            Cell::Not(arg) => arg.len(),
            Cell::And(arg1, _) | Cell::Or(arg1, _) | Cell::Xor(arg1, _) => arg1.len(),
            Cell::Eq(..) => 1,
            Cell::Memory(memory) => memory.output_len(),
            Cell::Input(_, width) => *width,
            Cell::Output(..) | Cell::Name(..) => 0,
        }
    }

    /// The name under which cells of this kind are counted in [`Design::statistics`].
    ///
    /// [`Design::statistics`]: crate::Design::statistics
    pub fn class_name(&self) -> &'static str {
        match self {
            Cell::Not(_) => "not",
            Cell::And(..) => "and",
            Cell::Or(..) => "or",
            Cell::Xor(..) => "xor",
            Cell::Eq(..) => "eq",
            Cell::Memory(_) => "memory",
            Cell::Input(..) => "input",
            Cell::Output(..) => "output",
            Cell::Name(..) => "name",
        }
    }

    pub fn visit(&self, mut f: impl FnMut(Net)) {
        match self {
            Cell::Input(..) => (),
            Cell::Not(arg) | Cell::Output(_, arg) | Cell::Name(_, arg) => arg.visit(&mut f),
            Cell::And(arg1, arg2) | Cell::Or(arg1, arg2) | Cell::Xor(arg1, arg2) | Cell::Eq(arg1, arg2) => {
                arg1.visit(&mut f);
                arg2.visit(&mut f);
            }
            Cell::Memory(memory) => memory.visit(&mut f),
        }
    }

    pub fn visit_mut(&mut self, mut f: impl FnMut(&mut Net)) {
        match self {
            Cell::Input(..) => (),
            Cell::Not(arg) | Cell::Output(_, arg) | Cell::Name(_, arg) => arg.visit_mut(&mut f),
            Cell::And(arg1, arg2) | Cell::Or(arg1, arg2) | Cell::Xor(arg1, arg2) | Cell::Eq(arg1, arg2) => {
                arg1.visit_mut(&mut f);
                arg2.visit_mut(&mut f);
            }
            Cell::Memory(memory) => memory.visit_mut(&mut f),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{Cell, Value};

    #[test]
    fn test_output_len() {
        assert_eq!(Cell::Xor(Value::zero(3), Value::ones(3)).output_len(), 3);
        assert_eq!(Cell::Eq(Value::zero(3), Value::ones(3)).output_len(), 1);
        assert_eq!(Cell::Output("y".into(), Value::zero(3)).output_len(), 0);
    }

    #[test]
    #[should_panic]
    fn test_validate_width_mismatch() {
        Cell::And(Value::zero(3), Value::ones(2)).validate();
    }
}
