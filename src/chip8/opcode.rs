use std::fmt;

/// A 16-bit instruction word, fetched big-endian from two memory bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode(pub u16);

impl Opcode {
    pub fn from_bytes(hi: u8, lo: u8) -> Self {
        Opcode(u16::from_be_bytes([hi, lo]))
    }

    /// high nibble, selects the handler
    pub fn group(self) -> usize {
        ((self.0 & 0xF000) >> 12) as usize
    }

    pub fn x(self) -> usize {
        ((self.0 & 0x0F00) >> 8) as usize
    }

    pub fn y(self) -> usize {
        ((self.0 & 0x00F0) >> 4) as usize
    }

    pub fn n(self) -> u8 {
        (self.0 & 0x000F) as u8
    }

    pub fn kk(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    pub fn nnn(self) -> u16 {
        self.0 & 0x0FFF
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operand_fields() {
        let op = Opcode(0xD1A5);
        assert_eq!(op.group(), 0xD);
        assert_eq!(op.x(), 0x1);
        assert_eq!(op.y(), 0xA);
        assert_eq!(op.n(), 0x5);
        assert_eq!(op.kk(), 0xA5);
        assert_eq!(op.nnn(), 0x1A5);
    }

    #[test]
    fn test_from_bytes_is_big_endian() {
        assert_eq!(Opcode::from_bytes(0x6A, 0x05), Opcode(0x6A05));
    }

    #[test]
    fn test_display_pads_to_four_digits() {
        assert_eq!(Opcode(0x00E0).to_string(), "00E0");
        assert_eq!(Opcode(0xF065).to_string(), "F065");
    }
}
