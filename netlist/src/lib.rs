mod logic;
mod net;
mod value;
mod cell;
mod design;
mod print;
mod sim;

pub use logic::{Const, Trit};
pub use net::{ControlNet, Net};
pub use value::Value;
pub use cell::{Cell, Memory, MemoryPortRelation, MemoryReadFlipFlop, MemoryReadPort, MemoryWritePort};
pub use design::{CellIter, CellRef, Design};
pub use sim::Simulator;
