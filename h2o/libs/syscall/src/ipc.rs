//! Port message layout.
//!
//! Every message delivered through a port starts with a [`MessageHeader`]
//! whose `kind` carries a discriminant (`MSG_*`) and, in its top bit, the
//! [`KindFlags::KERNEL_MODE`] annotation for messages posted by the kernel.
//! Classification always looks at the discriminant with the flag masked off.

use core::mem;

use static_assertions::const_assert_eq;

pub const MSG_REQUEST: u16 = 1;
pub const MSG_REPLY: u16 = 2;
pub const MSG_DATAGRAM: u16 = 3;
pub const MSG_LOST_REPLY: u16 = 4;
pub const MSG_PORT_CLOSED: u16 = 5;
pub const MSG_CLIENT_DIED: u16 = 6;
pub const MSG_EXCEPTION: u16 = 7;
pub const MSG_DEBUG_EVENT: u16 = 8;
pub const MSG_ERROR_EVENT: u16 = 9;
pub const MSG_CONNECTION_REQUEST: u16 = 10;

bitflags::bitflags! {
    #[repr(transparent)]
    pub struct KindFlags: u16 {
        const KERNEL_MODE = 0x8000;
    }
}

/// Total size of a [`PortMessage`].
pub const PORT_MESSAGE_SIZE: usize = 256;
pub const HEADER_SIZE: usize = mem::size_of::<MessageHeader>();
pub const MAX_DATA_SIZE: usize = PORT_MESSAGE_SIZE - HEADER_SIZE;

/// Byte offset of `kind` within a [`PortMessage`].
pub const KIND_OFFSET: usize = mem::offset_of!(MessageHeader, kind);

/// Strips the annotation bits from a raw `kind` value.
#[inline]
pub const fn kind_of(raw: u16) -> u16 {
    raw & !KindFlags::KERNEL_MODE.bits()
}

#[inline]
pub const fn is_connection_request(raw: u16) -> bool {
    kind_of(raw) == MSG_CONNECTION_REQUEST
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct ClientId {
    pub process: u32,
    pub thread: u32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct MessageHeader {
    pub data_len: u16,
    pub total_len: u16,
    pub kind: u16,
    pub reserved: u16,
    pub client: ClientId,
    pub id: u32,
    pub callback: u32,
}

impl MessageHeader {
    pub fn new(kind: u16, data_len: usize) -> Self {
        let data_len = data_len.min(MAX_DATA_SIZE) as u16;
        MessageHeader {
            data_len,
            total_len: HEADER_SIZE as u16 + data_len,
            kind,
            ..Default::default()
        }
    }

    #[inline]
    pub fn kind(&self) -> u16 {
        kind_of(self.kind)
    }

    #[inline]
    pub fn flags(&self) -> KindFlags {
        KindFlags::from_bits_truncate(self.kind)
    }

    #[inline]
    pub fn is_kernel_mode(&self) -> bool {
        self.flags().contains(KindFlags::KERNEL_MODE)
    }

    #[inline]
    pub fn is_connection_request(&self) -> bool {
        is_connection_request(self.kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct PortMessage {
    pub header: MessageHeader,
    pub data: [u8; MAX_DATA_SIZE],
}

impl PortMessage {
    pub fn new(kind: u16, data: &[u8]) -> Self {
        let mut ret = PortMessage {
            header: MessageHeader::new(kind, data.len()),
            ..Default::default()
        };
        let len = ret.header.data_len as usize;
        ret.data[..len].copy_from_slice(&data[..len]);
        ret
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        let len = (self.header.data_len as usize).min(MAX_DATA_SIZE);
        &self.data[..len]
    }
}

impl Default for PortMessage {
    fn default() -> Self {
        PortMessage {
            header: MessageHeader::default(),
            data: [0; MAX_DATA_SIZE],
        }
    }
}

// The header and data are laid out back to back with no padding, so a message
// can be copied to and from user memory as raw bytes.
const_assert_eq!(HEADER_SIZE, 24);
const_assert_eq!(mem::size_of::<PortMessage>(), HEADER_SIZE + MAX_DATA_SIZE);
const_assert_eq!(mem::size_of::<PortMessage>(), PORT_MESSAGE_SIZE);
const_assert_eq!(mem::align_of::<PortMessage>(), 4);

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [u16; 10] = [
        MSG_REQUEST,
        MSG_REPLY,
        MSG_DATAGRAM,
        MSG_LOST_REPLY,
        MSG_PORT_CLOSED,
        MSG_CLIENT_DIED,
        MSG_EXCEPTION,
        MSG_DEBUG_EVENT,
        MSG_ERROR_EVENT,
        MSG_CONNECTION_REQUEST,
    ];

    #[test]
    fn connection_request_ignores_kernel_mode() {
        let kernel = KindFlags::KERNEL_MODE.bits();
        assert!(is_connection_request(MSG_CONNECTION_REQUEST));
        assert!(is_connection_request(MSG_CONNECTION_REQUEST | kernel));
    }

    #[test]
    fn other_kinds_never_match() {
        let kernel = KindFlags::KERNEL_MODE.bits();
        for kind in KINDS.into_iter().filter(|&k| k != MSG_CONNECTION_REQUEST) {
            assert!(!is_connection_request(kind));
            assert!(!is_connection_request(kind | kernel));
        }
        assert!(!is_connection_request(0));
        assert!(!is_connection_request(kernel));
    }

    #[test]
    fn header_accessors() {
        let mut header = MessageHeader::new(MSG_DATAGRAM, 5);
        assert_eq!(header.total_len as usize, HEADER_SIZE + 5);
        assert!(!header.is_kernel_mode());

        header.kind |= KindFlags::KERNEL_MODE.bits();
        assert!(header.is_kernel_mode());
        assert_eq!(header.kind(), MSG_DATAGRAM);
    }

    #[test]
    fn message_data_is_truncated() {
        let big = [0xAAu8; MAX_DATA_SIZE + 10];
        let msg = PortMessage::new(MSG_REQUEST, &big);
        assert_eq!(msg.data().len(), MAX_DATA_SIZE);
        assert_eq!(msg.header.total_len as usize, PORT_MESSAGE_SIZE);
    }

    #[test]
    fn kind_offset() {
        assert_eq!(KIND_OFFSET, 4);
    }
}
