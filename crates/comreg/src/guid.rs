//! GUID value type and registry-format rendering.
//!
//! CLSIDs, IIDs and LIBIDs are all 128-bit globally unique identifiers with
//! the Windows GUID field layout. Identity and equality are raw value
//! comparison; the canonical string form is the braced, hyphenated,
//! uppercase hex rendering used throughout the registry
//! (`{12345678-1234-1234-0102-030405060708}`).

use bytes::{Buf, BufMut};
use std::fmt;

/// A 128-bit globally unique identifier in Windows GUID layout.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    /// Size of a GUID in bytes
    pub const SIZE: usize = 16;

    /// Nil GUID (all zeros)
    pub const NIL: Self = Self {
        data1: 0,
        data2: 0,
        data3: 0,
        data4: [0; 8],
    };

    /// Create a GUID from its four components
    pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }

    /// Generate a new random (v4) GUID
    pub fn generate() -> Self {
        let uuid = uuid::Uuid::new_v4();
        let bytes = uuid.as_bytes();
        Self {
            data1: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            data2: u16::from_be_bytes([bytes[4], bytes[5]]),
            data3: u16::from_be_bytes([bytes[6], bytes[7]]),
            data4: [
                bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14],
                bytes[15],
            ],
        }
    }

    /// Check if this is the nil GUID
    pub fn is_nil(&self) -> bool {
        *self == Self::NIL
    }

    /// Parse from string form, braced or bare, in either case.
    ///
    /// Accepts `{xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx}` and the same
    /// without braces.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let s = match (s.starts_with('{'), s.ends_with('}')) {
            (true, true) => &s[1..s.len() - 1],
            (false, false) => s,
            _ => return None,
        };
        if s.len() != 36 {
            return None;
        }
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 5 {
            return None;
        }
        if parts[0].len() != 8
            || parts[1].len() != 4
            || parts[2].len() != 4
            || parts[3].len() != 4
            || parts[4].len() != 12
        {
            return None;
        }

        let data1 = u32::from_str_radix(parts[0], 16).ok()?;
        let data2 = u16::from_str_radix(parts[1], 16).ok()?;
        let data3 = u16::from_str_radix(parts[2], 16).ok()?;
        let clock = u16::from_str_radix(parts[3], 16).ok()?;

        let mut data4 = [0u8; 8];
        data4[0] = (clock >> 8) as u8;
        data4[1] = clock as u8;
        for i in 0..6 {
            data4[i + 2] = u8::from_str_radix(&parts[4][i * 2..i * 2 + 2], 16).ok()?;
        }

        Some(Self {
            data1,
            data2,
            data3,
            data4,
        })
    }

    /// Encode in binary form (respecting byte order)
    pub fn encode<B: BufMut>(&self, buf: &mut B, little_endian: bool) {
        if little_endian {
            buf.put_u32_le(self.data1);
            buf.put_u16_le(self.data2);
            buf.put_u16_le(self.data3);
        } else {
            buf.put_u32(self.data1);
            buf.put_u16(self.data2);
            buf.put_u16(self.data3);
        }
        buf.put_slice(&self.data4);
    }

    /// Decode from binary form (respecting byte order)
    pub fn decode<B: Buf>(buf: &mut B, little_endian: bool) -> Self {
        let data1 = if little_endian { buf.get_u32_le() } else { buf.get_u32() };
        let data2 = if little_endian { buf.get_u16_le() } else { buf.get_u16() };
        let data3 = if little_endian { buf.get_u16_le() } else { buf.get_u16() };
        let mut data4 = [0u8; 8];
        buf.copy_to_slice(&mut data4);
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }

    /// Encode to 16 bytes in little-endian (registry blob) form
    pub fn to_bytes_le(&self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[0..4].copy_from_slice(&self.data1.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.data2.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.data3.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.data4);
        bytes
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}}}",
            self.data1,
            self.data2,
            self.data3,
            self.data4[0],
            self.data4[1],
            self.data4[2],
            self.data4[3],
            self.data4[4],
            self.data4[5],
            self.data4[6],
            self.data4[7],
        )
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GUID({})", self)
    }
}
