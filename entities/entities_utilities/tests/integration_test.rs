//! Integration tests for entities_utilities crate
//!
//! These tests exercise byte views and byte order conversion together,
//! the way the socket layer uses them.

use entities_utilities::*;
use proptest::prelude::*;

#[test]
fn test_view_tracks_partial_fill() {
    // A read that fills 3 of 8 bytes shrinks the view by the remainder.
    let mut buffer = vec![0u8; 8];
    let mut view = ByteView::from(&mut buffer);
    view[..3].copy_from_slice(b"abc");
    view.shrink_back(5);
    assert_eq!(&*view, b"abc");
    assert_eq!(view.capacity(), 8);
}

#[test]
fn test_view_consumes_header() {
    let mut buffer = [0u8; 6];
    buffer[..2].copy_from_slice(&host_to_network(0x0102u16).to_ne_bytes());
    buffer[2..].copy_from_slice(b"body");

    let mut view = ByteView::new(&mut buffer);
    let header = u16::from_ne_bytes([view[0], view[1]]);
    assert_eq!(network_to_host(header), 0x0102);

    view.shrink_front(2);
    assert_eq!(&*view, b"body");
    assert!(view.resize(5).is_err());
}

#[test]
fn test_network_order_is_big_endian() {
    let port = host_to_network(25565u16);
    assert_eq!(port.to_ne_bytes(), 25565u16.to_be_bytes());
}

proptest! {
    #[test]
    fn test_flip_u16_roundtrip(value in any::<u16>()) {
        prop_assert_eq!(flip(flip(value)), value);
        prop_assert_eq!(network_to_host(host_to_network(value)), value);
    }

    #[test]
    fn test_flip_u32_roundtrip(value in any::<u32>()) {
        prop_assert_eq!(flip(flip(value)), value);
        prop_assert_eq!(flip(value), value.swap_bytes());
    }

    #[test]
    fn test_resize_within_capacity(len in 0usize..64, new_len in 0usize..128) {
        let mut buffer = vec![0u8; len];
        let mut view = ByteView::from(&mut buffer);
        let result = view.resize(new_len);
        prop_assert_eq!(result.is_ok(), new_len <= len);
        prop_assert_eq!(view.len(), if new_len <= len { new_len } else { len });
    }
}
