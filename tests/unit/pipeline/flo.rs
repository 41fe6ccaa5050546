use super::*;
use crate::foundation::core::Canvas;

fn header(w: i32, h: i32) -> Vec<u8> {
    let mut b = Vec::new();
    b.extend_from_slice(b"PIEH");
    b.extend_from_slice(&w.to_le_bytes());
    b.extend_from_slice(&h.to_le_bytes());
    b
}

#[test]
fn pieh_magic_matches_tag() {
    assert_eq!(f32::from_le_bytes(*b"PIEH"), FLO_TAG);
}

#[test]
fn reads_interleaved_vectors() {
    let mut bytes = header(2, 1);
    for v in [1.0f32, -2.0, 0.5, 4.0] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    let f = read_flo(bytes.as_slice()).unwrap();
    assert_eq!(f.canvas(), Canvas::new(2, 1));
    assert_eq!(f.at(0, 0), [1.0, -2.0]);
    assert_eq!(f.at(1, 0), [0.5, 4.0]);
}

#[test]
fn written_file_reads_back() {
    let f = FlowField::uniform(Canvas::new(3, 2), [0.25, -1.0]).unwrap();
    let mut buf = Vec::new();
    write_flo(&f, &mut buf).unwrap();
    assert_eq!(buf.len(), 12 + 3 * 2 * 2 * 4);
    assert_eq!(read_flo(buf.as_slice()).unwrap(), f);
}

#[test]
fn rejects_bad_tag_size_and_truncation() {
    let mut bad = header(1, 1);
    bad[0] = b'X';
    assert!(read_flo(bad.as_slice()).is_err());
    assert!(read_flo(header(0, 4).as_slice()).is_err());
    let mut short = header(2, 2);
    short.extend_from_slice(&[0u8; 8]);
    assert!(matches!(
        read_flo(short.as_slice()),
        Err(CinemagraphError::Io(_))
    ));
}

#[test]
fn rejects_nan_vectors() {
    let mut bytes = header(1, 1);
    bytes.extend_from_slice(&f32::NAN.to_le_bytes());
    bytes.extend_from_slice(&0.0f32.to_le_bytes());
    assert!(matches!(
        read_flo(bytes.as_slice()),
        Err(CinemagraphError::NonFiniteField { .. })
    ));
}
