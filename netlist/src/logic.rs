use std::{
    borrow::Cow,
    fmt::{Debug, Display},
    ops::{Index, IndexMut},
    slice::SliceIndex,
    str::FromStr,
};

/// A single bit of simulation state: zero, one, or unknown (`X`).
///
/// Unknown bits appear wherever the netlist does not determine a value, e.g. reading a memory row
/// at an address that is itself unknown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Trit {
    Undef = -1,
    Zero = 0,
    One = 1,
}

impl Trit {
    pub fn from_char(chr: char) -> Result<Self, ()> {
        match chr {
            '0' => Ok(Trit::Zero),
            '1' => Ok(Trit::One),
            'X' => Ok(Trit::Undef),
            _ => Err(()),
        }
    }
}

impl Display for Trit {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Trit::Undef => write!(f, "X"),
            Trit::Zero => write!(f, "0"),
            Trit::One => write!(f, "1"),
        }
    }
}

impl From<bool> for Trit {
    fn from(value: bool) -> Self {
        if value {
            Trit::One
        } else {
            Trit::Zero
        }
    }
}

impl std::ops::Not for Trit {
    type Output = Trit;

    fn not(self) -> Self::Output {
        match self {
            Trit::Zero => Trit::One,
            Trit::One => Trit::Zero,
            Trit::Undef => Trit::Undef,
        }
    }
}

impl std::ops::BitAnd<Trit> for Trit {
    type Output = Trit;

    fn bitand(self, rhs: Trit) -> Self::Output {
        match (self, rhs) {
            (Trit::Zero, _) | (_, Trit::Zero) => Trit::Zero,
            (Trit::One, Trit::One) => Trit::One,
            _ => Trit::Undef,
        }
    }
}

impl std::ops::BitOr<Trit> for Trit {
    type Output = Trit;

    fn bitor(self, rhs: Trit) -> Self::Output {
        match (self, rhs) {
            (Trit::One, _) | (_, Trit::One) => Trit::One,
            (Trit::Zero, Trit::Zero) => Trit::Zero,
            _ => Trit::Undef,
        }
    }
}

impl std::ops::BitXor<Trit> for Trit {
    type Output = Trit;

    fn bitxor(self, rhs: Trit) -> Self::Output {
        match (self, rhs) {
            (Trit::Undef, _) | (_, Trit::Undef) => Trit::Undef,
            (lft, rgt) => Trit::from(lft != rgt),
        }
    }
}

/// A vector of trits, least significant bit first.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Const {
    trits: Vec<Trit>,
}

impl Const {
    pub const EMPTY: Const = Const { trits: vec![] };

    pub fn zero(width: usize) -> Self {
        Self::from_iter(std::iter::repeat_n(Trit::Zero, width))
    }

    pub fn ones(width: usize) -> Self {
        Self::from_iter(std::iter::repeat_n(Trit::One, width))
    }

    pub fn undef(width: usize) -> Self {
        Self::from_iter(std::iter::repeat_n(Trit::Undef, width))
    }

    /// Parses a constant written most significant bit first, e.g. `"01X1"`.
    pub fn lit(value: &str) -> Self {
        value.parse().unwrap()
    }

    pub fn from_uint(value: u128, width: usize) -> Self {
        if width < u128::BITS as usize {
            assert!(value >> width == 0, "value {value:#x} does not fit into {width} bits");
        }
        Self::from_iter((0..width).map(|bit| Trit::from(bit < u128::BITS as usize && (value >> bit) & 1 != 0)))
    }

    /// Returns the unsigned integer value, or `None` if any bit is unknown or the value
    /// does not fit into 128 bits.  The empty constant has the value zero.
    pub fn as_uint(&self) -> Option<u128> {
        let mut result = 0u128;
        for (bit, trit) in self.iter().enumerate() {
            match trit {
                Trit::Undef => return None,
                Trit::Zero => (),
                Trit::One if bit >= u128::BITS as usize => return None,
                Trit::One => result |= 1 << bit,
            }
        }
        Some(result)
    }

    pub fn len(&self) -> usize {
        self.trits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trits.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Trit> + ExactSizeIterator + '_ {
        self.trits.iter().copied()
    }

    pub fn is_zero(&self) -> bool {
        self.iter().all(|trit| trit == Trit::Zero)
    }

    pub fn is_undef(&self) -> bool {
        self.iter().all(|trit| trit == Trit::Undef)
    }

    pub fn has_undef(&self) -> bool {
        self.iter().any(|trit| trit == Trit::Undef)
    }

    pub fn concat<'a>(&self, other: impl Into<Cow<'a, Const>>) -> Self {
        Self::from_iter(self.iter().chain(other.into().iter()))
    }

    pub fn slice(&self, range: impl std::ops::RangeBounds<usize>) -> Const {
        Const::from_iter(self[(range.start_bound().cloned(), range.end_bound().cloned())].iter().copied())
    }

    pub fn not(&self) -> Const {
        Const::from_iter(self.iter().map(|trit| !trit))
    }

    pub fn and<'a>(&self, other: impl Into<Cow<'a, Const>>) -> Const {
        self.zip_with(&other.into(), |x, y| x & y)
    }

    pub fn or<'a>(&self, other: impl Into<Cow<'a, Const>>) -> Const {
        self.zip_with(&other.into(), |x, y| x | y)
    }

    pub fn xor<'a>(&self, other: impl Into<Cow<'a, Const>>) -> Const {
        self.zip_with(&other.into(), |x, y| x ^ y)
    }

    /// Compares two constants; the result is unknown if they could be equal but contain unknown bits.
    pub fn eq<'a>(&self, other: impl Into<Cow<'a, Const>>) -> Trit {
        let other = other.into();
        assert_eq!(self.len(), other.len());
        let mut result = Trit::One;
        for (x, y) in self.iter().zip(other.iter()) {
            match (x, y) {
                (Trit::Undef, _) | (_, Trit::Undef) => result = Trit::Undef,
                (x, y) if x != y => return Trit::Zero,
                _ => (),
            }
        }
        result
    }

    /// Replaces the bits of `self` selected by `mask` with the corresponding bits of `update`.
    /// An unknown mask bit yields an unknown result unless both candidates agree.
    pub fn update<'a, 'b>(&self, mask: impl Into<Cow<'a, Const>>, update: impl Into<Cow<'b, Const>>) -> Const {
        let (mask, update) = (mask.into(), update.into());
        assert_eq!(self.len(), mask.len());
        assert_eq!(self.len(), update.len());
        Const::from_iter(self.iter().zip(mask.iter()).zip(update.iter()).map(|((old, sel), new)| match sel {
            Trit::One => new,
            Trit::Zero => old,
            Trit::Undef if old == new => old,
            Trit::Undef => Trit::Undef,
        }))
    }

    fn zip_with(&self, other: &Const, f: impl Fn(Trit, Trit) -> Trit) -> Const {
        assert_eq!(self.len(), other.len());
        Const::from_iter(self.iter().zip(other.iter()).map(|(x, y)| f(x, y)))
    }
}

impl Debug for Const {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Const::lit(\"{self}\")")
    }
}

impl Display for Const {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for trit in self.trits.iter().rev() {
            write!(f, "{trit}")?;
        }
        Ok(())
    }
}

impl FromStr for Const {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars().rev().map(Trit::from_char).collect::<Result<Vec<_>, _>>().map(Const::from)
    }
}

impl<I: SliceIndex<[Trit]>> Index<I> for Const {
    type Output = I::Output;

    fn index(&self, index: I) -> &Self::Output {
        &self.trits[index]
    }
}

impl<I: SliceIndex<[Trit]>> IndexMut<I> for Const {
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        &mut self.trits[index]
    }
}

impl Extend<Trit> for Const {
    fn extend<T: IntoIterator<Item = Trit>>(&mut self, iter: T) {
        self.trits.extend(iter)
    }
}

impl From<Trit> for Const {
    fn from(trit: Trit) -> Self {
        Const { trits: vec![trit] }
    }
}

impl From<Vec<Trit>> for Const {
    fn from(trits: Vec<Trit>) -> Self {
        Const { trits }
    }
}

impl From<Const> for Cow<'_, Const> {
    fn from(value: Const) -> Self {
        Cow::Owned(value)
    }
}

impl<'a> From<&'a Const> for Cow<'a, Const> {
    fn from(value: &'a Const) -> Self {
        Cow::Borrowed(value)
    }
}

impl FromIterator<Trit> for Const {
    fn from_iter<T: IntoIterator<Item = Trit>>(iter: T) -> Self {
        Const { trits: iter.into_iter().collect() }
    }
}

impl IntoIterator for &Const {
    type Item = Trit;
    type IntoIter = std::vec::IntoIter<Trit>;

    fn into_iter(self) -> Self::IntoIter {
        self.trits.clone().into_iter()
    }
}

#[cfg(test)]
mod test {
    use crate::{Const, Trit};

    #[test]
    fn test_uint() {
        assert_eq!(Const::from_uint(0x11, 8), Const::lit("00010001"));
        assert_eq!(Const::lit("00010001").as_uint(), Some(0x11));
        assert_eq!(Const::lit("0X01").as_uint(), None);
        assert_eq!(Const::EMPTY.as_uint(), Some(0));
    }

    #[test]
    fn test_xor() {
        for (a, b, y) in [("", "", ""), ("1010", "1100", "0110"), ("X0X0", "XX00", "XXX0")] {
            assert_eq!(Const::lit(a).xor(Const::lit(b)), Const::lit(y));
        }
    }

    #[test]
    fn test_eq() {
        assert_eq!(Const::EMPTY.eq(Const::EMPTY), Trit::One);
        assert_eq!(Const::lit("0101").eq(Const::lit("0101")), Trit::One);
        assert_eq!(Const::lit("0101").eq(Const::lit("0111")), Trit::Zero);
        assert_eq!(Const::lit("X101").eq(Const::lit("0101")), Trit::Undef);
        assert_eq!(Const::lit("X101").eq(Const::lit("0111")), Trit::Zero);
    }

    #[test]
    fn test_update() {
        for (old, mask, new, y) in [
            ("0000", "0000", "1111", "0000"),
            ("0000", "0110", "1111", "0110"),
            ("0101", "X0X0", "1111", "X1X1"),
            ("0101", "XXXX", "0101", "0101"),
        ] {
            assert_eq!(Const::lit(old).update(Const::lit(mask), Const::lit(new)), Const::lit(y));
        }
    }
}
