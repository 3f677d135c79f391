// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::{composite::Builder, testing};
use bolero::check;

#[test]
fn truncated_reads() {
    testing::init_tracing();

    let mut arena = Arena::new();
    let id = testing::truncated(&mut arena, &testing::pattern(10), 6);
    let tvb = arena.tvb(id).unwrap();

    assert_eq!(tvb.get_ptr(2, Length::Exact(3)).unwrap(), &[2, 3, 4]);
    assert_eq!(tvb.check_offset_length(5, Length::Exact(3)).unwrap(), (5, 3));
    assert_eq!(
        tvb.get_ptr(5, Length::Exact(3)).unwrap_err(),
        Kind::NotCaptured
    );
    assert_eq!(
        tvb.get_ptr(8, Length::Exact(5)).unwrap_err(),
        Kind::OutOfBounds
    );

    assert!(tvb.bytes_exist(0, 6));
    assert!(!tvb.bytes_exist(0, 7));
    assert!(!tvb.bytes_exist(12, 0));

    assert_eq!(tvb.captured_len_remaining(2).unwrap(), 4);
    assert_eq!(tvb.reported_len_remaining(2).unwrap(), 8);
    assert_eq!(tvb.captured_len_remaining(-4).unwrap(), 0);
    assert_eq!(tvb.reported_len_remaining(-4).unwrap(), 4);
    assert_eq!(
        tvb.captured_len_remaining(7).unwrap_err(),
        Kind::NotCaptured
    );
    assert_eq!(
        tvb.reported_len_remaining(11).unwrap_err(),
        Kind::OutOfBounds
    );
}

#[test]
fn negative_offsets() {
    let mut arena = Arena::new();
    let id = arena.new_real(testing::pattern(10), 10);
    let tvb = arena.tvb(id).unwrap();

    assert_eq!(tvb.get_ptr(-4, Length::ToEnd).unwrap(), &[6, 7, 8, 9]);
    assert_eq!(tvb.get_u8(-1).unwrap(), 9);
    assert_eq!(tvb.get_u16(-2).unwrap(), 0x0809);
    assert_eq!(tvb.get_u16(-1).unwrap_err(), Kind::OutOfBounds);
}

#[test]
fn network_order_getters() {
    let bytes = [
        0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, //
        0xff, 0xfe, 0xfd, 0xfc, 0xfb, 0xfa, 0xf9, 0xf8,
    ];
    let mut arena = Arena::new();
    let id = arena.new_real(bytes.to_vec(), bytes.len());
    let tvb = arena.tvb(id).unwrap();

    assert_eq!(tvb.get_u8(0).unwrap(), 0x01);
    assert_eq!(tvb.get_i8(8).unwrap(), -1);
    assert_eq!(tvb.get_u16(0).unwrap(), 0x0102);
    assert_eq!(tvb.get_i16(8).unwrap(), -2);
    assert_eq!(*tvb.get_u24(1).unwrap(), 0x02_0304);
    assert_eq!(*tvb.get_i24(0).unwrap(), 0x01_0203);
    assert_eq!(tvb.get_u32(0).unwrap(), 0x0102_0304);
    assert_eq!(tvb.get_i32(8).unwrap(), i32::from_be_bytes([0xff, 0xfe, 0xfd, 0xfc]));
    assert_eq!(*tvb.get_u48(2).unwrap(), 0x0304_0506_0708);
    assert_eq!(*tvb.get_i48(0).unwrap(), 0x0102_0304_0506);
    assert_eq!(tvb.get_u64(0).unwrap(), 0x0102_0304_0506_0708);
    assert_eq!(
        tvb.get_i64(8).unwrap(),
        i64::from_be_bytes([0xff, 0xfe, 0xfd, 0xfc, 0xfb, 0xfa, 0xf9, 0xf8])
    );

    assert_eq!(tvb.get_u64(9).unwrap_err(), Kind::OutOfBounds);
    assert_eq!(tvb.decode::<u16>(0, 3).unwrap_err(), Kind::Decode);
}

#[test]
fn getters_span_composite_members() {
    let mut arena = Arena::new();
    let a = arena.new_real(vec![0x12, 0x34], 2);
    let b = arena.new_real(vec![0x56, 0x78], 2);
    let mut builder = Builder::new();
    builder.append(a).append(b);
    let id = builder.finalize(&mut arena).unwrap();
    let tvb = arena.tvb(id).unwrap();

    assert_eq!(tvb.get_u32(0).unwrap(), 0x1234_5678);
    assert_eq!(tvb.get_u16(1).unwrap(), 0x3456);
    assert_eq!(tvb.get_u16(2).unwrap(), 0x5678);
}

#[test]
fn getters_on_truncated_data() {
    let mut arena = Arena::new();
    let id = testing::truncated(&mut arena, &[0xaa, 0xbb, 0xcc, 0xdd], 3);
    let tvb = arena.tvb(id).unwrap();

    assert_eq!(*tvb.get_u24(0).unwrap(), 0xaa_bbcc);
    assert_eq!(tvb.get_u32(0).unwrap_err(), Kind::NotCaptured);
    assert_eq!(tvb.get_u8(4).unwrap_err(), Kind::OutOfBounds);

    let error = tvb.get_u32(0).unwrap_err();
    assert!(error.kind().is_truncation());
    assert_eq!(
        std::io::Error::from(error).kind(),
        std::io::ErrorKind::UnexpectedEof
    );
}

#[test]
fn copies() {
    let mut arena = Arena::new();
    let id = testing::truncated(&mut arena, &testing::pattern(8), 6);
    let tvb = arena.tvb(id).unwrap();

    let mut dest = [0; 3];
    tvb.copy_into(-5, &mut dest).unwrap();
    assert_eq!(dest, [3, 4, 5]);
    assert_eq!(tvb.copy_into(4, &mut dest).unwrap_err(), Kind::NotCaptured);

    assert_eq!(tvb.to_vec(4, Length::ToEnd).unwrap(), [4, 5]);
    assert_eq!(tvb.to_vec(6, Length::ToEnd).unwrap(), Vec::<u8>::new());

    let chunk = tvb.ensure_contiguous(1, Length::Exact(2)).unwrap();
    assert!(chunk.is_borrowed());
    assert_eq!(chunk.freeze(), &[1, 2][..]);

    let bytes = tvb.clone_range(0, Length::ToEnd).unwrap();
    arena.free_chain(id).unwrap();
    assert_eq!(bytes, &[0, 1, 2, 3, 4, 5][..]);
}

#[test]
fn searches_respect_limits() {
    let mut arena = Arena::new();
    let id = testing::truncated(&mut arena, b"key=value;rest", 12);
    let tvb = arena.tvb(id).unwrap();

    assert_eq!(tvb.find_u8(0, Length::ToEnd, b'=').unwrap(), Some(3));
    assert_eq!(tvb.find_u8(4, Length::ToEnd, b';').unwrap(), Some(9));
    assert_eq!(tvb.find_u8(4, Length::Exact(5), b';').unwrap(), None);
    assert_eq!(tvb.find_u8(0, Length::ToEnd, b't').unwrap(), None);
    // the limit is clamped to the captured bytes
    assert_eq!(tvb.find_u8(10, Length::Exact(100), b's').unwrap(), None);
    assert_eq!(tvb.find_u8(-4, Length::ToEnd, b'r').unwrap(), Some(10));
    assert_eq!(
        tvb.find_u8(13, Length::ToEnd, b'r').unwrap_err(),
        Kind::NotCaptured
    );

    let pattern = Pattern::new(b";=");
    assert_eq!(
        tvb.find_pattern(0, Length::ToEnd, &pattern).unwrap(),
        Some((3, b'='))
    );
    assert_eq!(
        tvb.find_pattern(4, Length::ToEnd, &pattern).unwrap(),
        Some((9, b';'))
    );
    assert_eq!(
        tvb.find_pattern(10, Length::ToEnd, &pattern).unwrap(),
        None
    );
}

#[test]
fn offsets() {
    let mut arena = Arena::new();
    let root = arena.new_real(testing::pattern(16), 16);
    let id = arena.new_subset_remaining(root, 4).unwrap();
    let tvb = arena.tvb(id).unwrap();

    assert_eq!(tvb.id(), id);
    assert_eq!(tvb.raw_offset().unwrap(), 4);
    assert_eq!(tvb.offset_from_real_beginning().unwrap(), 4);
    assert_eq!(tvb.record().data_source(), root);
}

#[test]
fn search_model() {
    check!()
        .with_type::<(Vec<u8>, u8, i8, Option<u8>, u8)>()
        .for_each(|(data, captured, offset, max_len, needle)| {
            let mut arena = Arena::new();
            let id = testing::truncated(&mut arena, data, *captured as usize);
            let tvb = arena.tvb(id).unwrap();

            let offset = *offset as isize;
            let max_len = Length::from(max_len.map(usize::from));
            let Ok(start) = validate::resolve_offset(tvb.record(), offset) else {
                assert!(tvb.find_u8(offset, max_len, *needle).is_err());
                return;
            };

            let result = tvb.find_u8(offset, max_len, *needle);
            let captured = tvb.captured_len();
            if start > captured {
                assert_eq!(result.unwrap_err(), Kind::NotCaptured);
                return;
            }

            let end = max_len
                .exact()
                .map_or(captured, |max| (start + max).min(captured));
            let expected = data[start..end]
                .iter()
                .position(|b| b == needle)
                .map(|idx| start + idx);
            assert_eq!(result.unwrap(), expected);

            let pattern = Pattern::new(&[*needle]);
            let found = tvb.find_pattern(offset, max_len, &pattern).unwrap();
            assert_eq!(found, expected.map(|idx| (idx, *needle)));
        });
}
