//! The tagged address value used by remote-AT and transmit frames.

/// A destination (or, for remote-AT responses, source) radio address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    /// A specific 64-bit hardware address.
    Addr64(u64),
    /// A specific 16-bit network address.
    Addr16(u16),
    /// The fixed 64-bit broadcast address (`00 00 00 00 00 00 FF FF`).
    Addr64Broadcast,
    /// The fixed 16-bit broadcast address (`FF FF`).
    Addr16Broadcast,
}

impl Address {
    /// This address's 8-byte wire encoding for the 64-bit address field.
    pub(crate) fn as_addr64_bytes(self) -> [u8; 8] {
        match self {
            Address::Addr64(addr) => addr.to_be_bytes(),
            Address::Addr64Broadcast => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF],
            // Remote-AT with a 16-bit address sets the 64-bit field to the
            // reserved "use 16-bit address" value.
            Address::Addr16(_) | Address::Addr16Broadcast => {
                [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFE]
            }
        }
    }

    /// This address's 2-byte wire encoding for the 16-bit address field.
    pub(crate) fn as_addr16_bytes(self) -> [u8; 2] {
        match self {
            Address::Addr16(addr) => addr.to_be_bytes(),
            Address::Addr16Broadcast => [0xFF, 0xFF],
            // Remote-AT with a 64-bit address sets the 16-bit field to the
            // reserved "use 64-bit address" value.
            Address::Addr64(_) | Address::Addr64Broadcast => [0xFF, 0xFE],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addr64_broadcast_encoding() {
        assert_eq!(
            Address::Addr64Broadcast.as_addr64_bytes(),
            [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF]
        );
    }

    #[test]
    fn addr16_broadcast_encoding() {
        assert_eq!(Address::Addr16Broadcast.as_addr16_bytes(), [0xFF, 0xFF]);
    }

    #[test]
    fn addr16_sets_reserved_addr64_field() {
        assert_eq!(
            Address::Addr16(0x1234).as_addr64_bytes(),
            [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFE]
        );
    }

    #[test]
    fn addr64_sets_reserved_addr16_field() {
        assert_eq!(
            Address::Addr64(0x0013A20012345678).as_addr16_bytes(),
            [0xFF, 0xFE]
        );
    }
}
