use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::{Cell, Memory, Net, Trit, Value};

// A slot in the cell arena.  A cell with an `n`-bit output occupies `n` slots (or one slot if
// it has no output), so that net indices and slot indices coincide.
#[derive(Debug, Clone)]
pub(crate) enum Node {
    Void,
    Skip(u32),
    Cell(Box<Cell>),
}

/// A netlist: an arena of cells connected by nets.
///
/// Cells are added through a shared reference and become visible after [`Design::apply`], which
/// also performs any pending net replacements.  This allows constructing cyclic structures: a
/// placeholder created with [`Design::add_void`] can be used as a cell input, and later replaced
/// with the value that actually drives it.
#[derive(Debug, Default)]
pub struct Design {
    nodes: Vec<Node>,
    changes: RefCell<ChangeQueue>,
}

#[derive(Debug, Default)]
struct ChangeQueue {
    added_nodes: Vec<Node>,
    replaced_nets: BTreeMap<Net, Net>,
}

impl Design {
    pub fn new() -> Design {
        Design::default()
    }

    pub fn add_cell(&self, cell: Cell) -> Value {
        cell.validate();
        let mut changes = self.changes.borrow_mut();
        let index = self.nodes.len() + changes.added_nodes.len();
        let output_len = cell.output_len();
        changes.added_nodes.push(Node::Cell(Box::new(cell)));
        for _ in 1..output_len {
            changes.added_nodes.push(Node::Skip(index.try_into().expect("cell index too large")));
        }
        Value::from_cell_range(index, output_len)
    }

    /// Creates `width` placeholder nets.  Every placeholder must be replaced through
    /// [`Design::replace_value`] before it can be evaluated.
    pub fn add_void(&self, width: usize) -> Value {
        let mut changes = self.changes.borrow_mut();
        let index = self.nodes.len() + changes.added_nodes.len();
        changes.added_nodes.extend(std::iter::repeat_n(Node::Void, width));
        Value::from_cell_range(index, width)
    }

    pub(crate) fn node(&self, index: usize) -> &Node {
        match self.nodes.get(index) {
            Some(node) => node,
            None => panic!("net %{index} refers to a cell that has not been applied yet"),
        }
    }

    /// Returns the cell driving `net` together with the bit offset within its output, or the value of
    /// a constant net.
    ///
    /// Panics if the net is an unreplaced placeholder.
    pub fn find_cell(&self, net: Net) -> Result<(CellRef, usize), Trit> {
        let index = net.as_cell_index()?;
        let (cell_index, offset) = match *self.node(index) {
            Node::Skip(start) => (start as usize, index - start as usize),
            Node::Cell(_) => (index, 0),
            Node::Void => panic!("net %{index} is an undriven placeholder"),
        };
        Ok((CellRef { design: self, index: cell_index }, offset))
    }

    pub fn is_void(&self, net: Net) -> bool {
        match net.as_cell_index() {
            Ok(index) => matches!(self.node(index), Node::Void),
            Err(_) => false,
        }
    }

    pub fn iter_cells(&self) -> CellIter {
        CellIter { design: self, index: 0 }
    }

    pub fn replace_net(&self, from_net: impl Into<Net>, to_net: impl Into<Net>) {
        let (from_net, to_net) = (from_net.into(), to_net.into());
        let mut changes = self.changes.borrow_mut();
        if let Some(previous) = changes.replaced_nets.insert(from_net, to_net) {
            panic!("net {from_net} is already replaced with {previous}");
        }
    }

    pub fn replace_value(&self, from_value: &Value, to_value: impl Into<Value>) {
        let to_value = to_value.into();
        assert_eq!(from_value.len(), to_value.len());
        for (from_net, to_net) in from_value.iter().zip(to_value.iter()) {
            if from_net != to_net {
                self.replace_net(from_net, to_net);
            }
        }
    }

    pub fn apply(&mut self) {
        let changes = self.changes.get_mut();
        self.nodes.extend(std::mem::take(&mut changes.added_nodes));
        let replaced_nets = std::mem::take(&mut changes.replaced_nets);
        if !replaced_nets.is_empty() {
            let resolve = |mut net: Net| {
                // a placeholder may be replaced with another placeholder
                for _ in 0..=replaced_nets.len() {
                    match replaced_nets.get(&net) {
                        Some(&to_net) => net = to_net,
                        None => return net,
                    }
                }
                panic!("net replacement cycle through {net}")
            };
            for node in self.nodes.iter_mut() {
                if let Node::Cell(cell) = node {
                    cell.visit_mut(|net| *net = resolve(*net));
                }
            }
        }
    }

    /// Returns the number of cells of each class, e.g. `"memory"` or `"xor"`.
    pub fn statistics(&self) -> BTreeMap<String, usize> {
        let mut result = BTreeMap::<String, usize>::new();
        for cell_ref in self.iter_cells() {
            *result.entry(cell_ref.get().class_name().to_owned()).or_default() += 1;
        }
        result
    }

    /// Returns the memory cells of the design that are primitive banks.
    pub fn primitive_banks(&self) -> Vec<CellRef> {
        self.iter_cells()
            .filter(|cell_ref| matches!(cell_ref.get(), Cell::Memory(memory) if memory.is_primitive()))
            .collect()
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[derive(Clone, Copy)]
pub struct CellRef<'a> {
    design: &'a Design,
    index: usize,
}

impl PartialEq<CellRef<'_>> for CellRef<'_> {
    fn eq(&self, other: &CellRef<'_>) -> bool {
        std::ptr::eq(self.design, other.design) && self.index == other.index
    }
}

impl Eq for CellRef<'_> {}

impl std::fmt::Debug for CellRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CellRef(%{})", self.index)
    }
}

impl<'a> CellRef<'a> {
    pub fn get(&self) -> &'a Cell {
        match self.design.node(self.index) {
            Node::Cell(cell) => &**cell,
            _ => unreachable!(),
        }
    }

    pub fn output(&self) -> Value {
        Value::from_cell_range(self.index, self.output_len())
    }

    pub fn output_len(&self) -> usize {
        self.get().output_len()
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

pub struct CellIter<'a> {
    design: &'a Design,
    index: usize,
}

impl<'a> Iterator for CellIter<'a> {
    type Item = CellRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.design.nodes.len() {
            let index = self.index;
            match &self.design.nodes[index] {
                Node::Cell(cell) => {
                    self.index += cell.output_len().max(1);
                    return Some(CellRef { design: self.design, index });
                }
                Node::Void | Node::Skip(_) => self.index += 1,
            }
        }
        None
    }
}

macro_rules! builder_fn {
    () => {};

    ($func:ident( $($arg:ident : $ty:ty),+ ) -> $cell:ident $body:tt; $($rest:tt)*) => {
        pub fn $func(&self, $( $arg: $ty ),+) -> Value {
            self.add_cell(Cell::$cell $body)
        }

        builder_fn!{ $($rest)* }
    };

    // For cells with no output value.
    ($func:ident( $($arg:ident : $ty:ty),+ ) : $cell:ident $body:tt; $($rest:tt)*) => {
        pub fn $func(&self, $( $arg: $ty ),+) {
            self.add_cell(Cell::$cell $body);
        }

        builder_fn!{ $($rest)* }
    };
}

impl Design {
    builder_fn! {
        add_not(arg: impl Into<Value>) ->
            Not(arg.into());
        add_and(arg1: impl Into<Value>, arg2: impl Into<Value>) ->
            And(arg1.into(), arg2.into());
        add_or(arg1: impl Into<Value>, arg2: impl Into<Value>) ->
            Or(arg1.into(), arg2.into());
        add_xor(arg1: impl Into<Value>, arg2: impl Into<Value>) ->
            Xor(arg1.into(), arg2.into());
        add_eq(arg1: impl Into<Value>, arg2: impl Into<Value>) ->
            Eq(arg1.into(), arg2.into());

        add_memory(arg: impl Into<Memory>) ->
            Memory(arg.into());

        add_input(name: impl Into<String>, width: usize) ->
            Input(name.into(), width);
        add_output(name: impl Into<String>, value: impl Into<Value>) :
            Output(name.into(), value.into());
        add_name(name: impl Into<String>, value: impl Into<Value>) :
            Name(name.into(), value.into());
    }
}

#[cfg(test)]
mod test {
    use crate::{Cell, Design, Net, Value};

    #[test]
    fn test_add_apply() {
        let mut design = Design::new();
        let a = design.add_input("a", 4);
        let y = design.add_not(&a);
        assert_eq!(design.iter_cells().count(), 0);
        design.add_output("y", &y);
        design.apply();
        assert_eq!(design.iter_cells().count(), 3);
        let (cell_ref, offset) = design.find_cell(y[2]).unwrap();
        assert_eq!(offset, 2);
        assert_eq!(cell_ref.get(), &Cell::Not(a));
    }

    #[test]
    fn test_void_replace() {
        let mut design = Design::new();
        let void = design.add_void(2);
        let a = design.add_input("a", 2);
        let y = design.add_xor(&void, &a);
        design.replace_value(&void, Value::from_iter([Net::ONE, Net::ZERO]));
        design.apply();
        assert!(design.is_void(void[0]));
        let (cell_ref, _) = design.find_cell(y[0]).unwrap();
        assert_eq!(cell_ref.get(), &Cell::Xor(Value::from_iter([Net::ONE, Net::ZERO]), a));
    }

    #[test]
    fn test_replace_chain() {
        let mut design = Design::new();
        let void1 = design.add_void(1);
        let void2 = design.add_void(1);
        let a = design.add_input("a", 1);
        let y = design.add_not(&void1);
        design.replace_value(&void1, &void2);
        design.replace_value(&void2, &a);
        design.apply();
        let (cell_ref, _) = design.find_cell(y[0]).unwrap();
        assert_eq!(cell_ref.get(), &Cell::Not(a));
    }

    #[test]
    fn test_statistics() {
        let mut design = Design::new();
        let a = design.add_input("a", 4);
        let b = design.add_input("b", 4);
        let y = design.add_xor(&a, &b);
        design.add_output("y", y);
        design.apply();
        let statistics = design.statistics();
        assert_eq!(statistics["input"], 2);
        assert_eq!(statistics["xor"], 1);
        assert_eq!(statistics["output"], 1);
        assert!(!statistics.contains_key("memory"));
    }
}
