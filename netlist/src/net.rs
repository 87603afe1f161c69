use std::fmt::{Debug, Display};

use crate::Trit;

/// A single-bit wire: either a constant, or one output bit of a cell in a [`Design`].
///
/// Cell outputs are numbered consecutively across the design, so a cell with an `n`-bit output
/// occupies `n` consecutive net indices.
///
/// [`Design`]: crate::Design
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Net {
    pub(crate) index: u32,
}

impl Net {
    pub const UNDEF: Net = Net { index: u32::MAX };
    pub const ZERO: Net = Net { index: 0 };
    pub const ONE: Net = Net { index: 1 };

    const FIRST_CELL: u32 = 2;

    pub(crate) fn from_cell_index(cell_index: usize) -> Net {
        assert!(cell_index <= (u32::MAX - Self::FIRST_CELL - 1) as usize, "cell index too large");
        Net { index: cell_index as u32 + Self::FIRST_CELL }
    }

    pub(crate) fn as_cell_index(self) -> Result<usize, Trit> {
        match self.as_const() {
            Some(trit) => Err(trit),
            None => Ok((self.index - Self::FIRST_CELL) as usize),
        }
    }

    pub fn as_const(self) -> Option<Trit> {
        match self {
            Self::UNDEF => Some(Trit::Undef),
            Self::ZERO => Some(Trit::Zero),
            Self::ONE => Some(Trit::One),
            _ => None,
        }
    }

    pub fn is_const(self) -> bool {
        self.as_const().is_some()
    }
}

impl From<bool> for Net {
    fn from(value: bool) -> Self {
        Net::from(Trit::from(value))
    }
}

impl From<Trit> for Net {
    fn from(value: Trit) -> Self {
        match value {
            Trit::Undef => Net::UNDEF,
            Trit::Zero => Net::ZERO,
            Trit::One => Net::ONE,
        }
    }
}

impl TryFrom<Net> for Trit {
    type Error = ();

    fn try_from(value: Net) -> Result<Self, Self::Error> {
        value.as_const().ok_or(())
    }
}

impl Debug for Net {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.as_cell_index() {
            Ok(cell_index) => write!(f, "Net::from_cell_index({cell_index})"),
            Err(Trit::Undef) => write!(f, "Net::UNDEF"),
            Err(Trit::Zero) => write!(f, "Net::ZERO"),
            Err(Trit::One) => write!(f, "Net::ONE"),
        }
    }
}

impl Display for Net {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.as_cell_index() {
            Ok(cell_index) => write!(f, "%{cell_index}"),
            Err(trit) => write!(f, "{trit}"),
        }
    }
}

/// A net used as a control signal, together with its active polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ControlNet {
    Pos(Net),
    Neg(Net),
}

impl ControlNet {
    pub const ZERO: ControlNet = ControlNet::Pos(Net::ZERO);
    pub const ONE: ControlNet = ControlNet::Pos(Net::ONE);

    pub fn net(self) -> Net {
        match self {
            Self::Pos(net) | Self::Neg(net) => net,
        }
    }

    pub fn is_negative(self) -> bool {
        matches!(self, Self::Neg(_))
    }

    /// Applies the polarity to the value of the underlying net.
    pub fn is_active_when(self, trit: Trit) -> Trit {
        match self {
            Self::Pos(_) => trit,
            Self::Neg(_) => !trit,
        }
    }

    pub fn is_always(self, active: bool) -> bool {
        match self.net().as_const() {
            Some(trit) => self.is_active_when(trit) == Trit::from(active),
            None => false,
        }
    }

    pub fn is_const(self) -> bool {
        self.net().is_const()
    }

    pub fn visit(self, mut f: impl FnMut(Net)) {
        f(self.net())
    }

    pub fn visit_mut(&mut self, mut f: impl FnMut(&mut Net)) {
        match self {
            Self::Pos(net) | Self::Neg(net) => f(net),
        }
    }
}

impl From<Net> for ControlNet {
    fn from(net: Net) -> Self {
        ControlNet::Pos(net)
    }
}
