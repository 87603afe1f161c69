use std::collections::BTreeMap;

use mpmem_netlist::Const;

use crate::MemoryError;

/// The shape and initial contents of a multiport memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageDescriptor {
    width: usize,
    depth: usize,
    init: Vec<Const>,
    attrs: BTreeMap<String, String>,
}

impl StorageDescriptor {
    /// Describes a memory of `depth` rows, each `width` bits wide, that starts out all-zero.
    pub fn new(width: usize, depth: usize) -> Result<StorageDescriptor, MemoryError> {
        if width == 0 {
            return Err(MemoryError::configuration("row width must be positive"));
        }
        if depth == 0 {
            return Err(MemoryError::configuration("depth must be positive"));
        }
        Ok(StorageDescriptor { width, depth, init: vec![], attrs: BTreeMap::new() })
    }

    /// Sets the initial contents of the first rows.  Rows past the end of `rows` start out all-zero.
    pub fn with_init(self, rows: impl IntoIterator<Item = Const>) -> Result<StorageDescriptor, MemoryError> {
        let init = Vec::from_iter(rows);
        if init.len() > self.depth {
            return Err(MemoryError::configuration(format!(
                "{} initial rows given for a memory of depth {}",
                init.len(),
                self.depth
            )));
        }
        if let Some((index, row)) = init.iter().enumerate().find(|(_, row)| row.len() != self.width) {
            return Err(MemoryError::configuration(format!(
                "initial row {index} is {} bits wide, expected {}",
                row.len(),
                self.width
            )));
        }
        Ok(StorageDescriptor { init, ..self })
    }

    /// Attaches opaque metadata, which is copied onto every bank of the built memory.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> StorageDescriptor {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Returns a descriptor of the same shape and metadata that starts out all-zero.
    pub fn without_init(&self) -> StorageDescriptor {
        StorageDescriptor { init: vec![], ..self.clone() }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn init(&self) -> &[Const] {
        &self.init
    }

    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    /// Returns the width of an address, `ceil(log2(depth))`.
    pub fn addr_width(&self) -> usize {
        (usize::BITS - (self.depth - 1).leading_zeros()) as usize
    }

    /// Returns the initial contents of every row, concatenated in order.
    pub fn init_value(&self) -> Const {
        let mut value = Const::EMPTY;
        for row in &self.init {
            value.extend(row.iter());
        }
        value.extend(Const::zero((self.depth - self.init.len()) * self.width).iter());
        value
    }
}
