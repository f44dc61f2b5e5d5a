use std::fmt;

use serde::{Deserialize, Serialize};

/// An untyped 32-bit word, as stored in pallet blocks, common dictionaries, and decoded fields.
///
/// The decoder never knows what a field means; callers pick an interpretation with one of the
/// `as_*` methods. Narrower views take the low bits of the word, matching how the client reads a
/// short or byte field out of its 32-bit storage.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Value32([u8; 4]);

impl Value32 {
    pub const ZERO: Value32 = Value32([0; 4]);

    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Value32(bytes)
    }

    pub fn to_bytes(self) -> [u8; 4] {
        self.0
    }

    pub fn as_u32(self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    pub fn as_i32(self) -> i32 {
        i32::from_le_bytes(self.0)
    }

    pub fn as_f32(self) -> f32 {
        f32::from_bits(self.as_u32())
    }

    pub fn as_u16(self) -> u16 {
        u16::from_le_bytes([self.0[0], self.0[1]])
    }

    pub fn as_i16(self) -> i16 {
        i16::from_le_bytes([self.0[0], self.0[1]])
    }

    pub fn as_u8(self) -> u8 {
        self.0[0]
    }

    pub fn as_i8(self) -> i8 {
        self.0[0] as i8
    }
}

impl From<u32> for Value32 {
    fn from(v: u32) -> Self {
        Value32(v.to_le_bytes())
    }
}

impl From<i32> for Value32 {
    fn from(v: i32) -> Self {
        Value32(v.to_le_bytes())
    }
}

impl From<f32> for Value32 {
    fn from(v: f32) -> Self {
        Value32(v.to_bits().to_le_bytes())
    }
}

impl fmt::Debug for Value32 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Value32({:#010x})", self.as_u32())
    }
}

/// A scalar type a field can be read as.
///
/// `BITS` is the element width used when stepping through uncompressed arrays and sparse
/// records.
pub trait FieldType: Copy + Sized {
    const BITS: u32;
    fn from_value(value: Value32) -> Self;
}

macro_rules! field_type {
    ($ty:ty, $bits:expr, $conv:ident) => {
        impl FieldType for $ty {
            const BITS: u32 = $bits;
            fn from_value(value: Value32) -> Self {
                value.$conv()
            }
        }
    };
}

field_type!(u32, 32, as_u32);
field_type!(i32, 32, as_i32);
field_type!(f32, 32, as_f32);
field_type!(u16, 16, as_u16);
field_type!(i16, 16, as_i16);
field_type!(u8, 8, as_u8);
field_type!(i8, 8, as_i8);
