use super::*;
use crate::encode::sink::InMemorySink;
use crate::foundation::core::Grid;
use crate::render::frame::RasterStats;

fn frame(w: u32, h: u32, fill: impl Fn(u32, u32) -> [f32; 3]) -> RenderedFrame {
    let mut rgb = Grid::filled(w, h, 3, 0.0f32);
    for y in 0..h {
        for x in 0..w {
            rgb.pixel_mut(x, y).copy_from_slice(&fill(x, y));
        }
    }
    RenderedFrame {
        time: 0.0,
        rgb,
        coverage: Grid::filled(w, h, 1, 1.0),
        depth: Grid::filled(w, h, 1, 1.0),
        features: Grid::filled(w, h, 0, 0.0),
        stats: RasterStats::default(),
    }
}

#[test]
fn crops_every_edge_and_quantizes() {
    let f = frame(6, 5, |x, y| [x as f32 / 5.0, y as f32 / 4.0, 0.5]);
    let img = FrameAssembler::new(1).convert(&f).unwrap();
    assert_eq!(img.dimensions(), (4, 3));
    // Output (0, 0) is input (1, 1).
    assert_eq!(img.get_pixel(0, 0).0, [51, 64, 128]);
    assert_eq!(img.get_pixel(3, 2).0, [204, 191, 128]);
}

#[test]
fn zero_crop_keeps_size() {
    let f = frame(3, 3, |_, _| [1.0, 0.0, 0.0]);
    let img = FrameAssembler::new(0).convert(&f).unwrap();
    assert_eq!(img.dimensions(), (3, 3));
}

#[test]
fn crop_larger_than_frame_is_an_encoding_error() {
    let f = frame(4, 8, |_, _| [0.0; 3]);
    assert!(matches!(
        FrameAssembler::new(2).convert(&f),
        Err(CinemagraphError::Encoding(_))
    ));
}

#[test]
fn empty_or_mixed_sequences_fail() {
    let a = FrameAssembler::new(1);
    assert!(matches!(a.assemble(&[]), Err(CinemagraphError::Encoding(_))));
    let mixed = [frame(6, 6, |_, _| [0.0; 3]), frame(6, 5, |_, _| [0.0; 3])];
    assert!(matches!(
        a.assemble(&mixed),
        Err(CinemagraphError::Encoding(_))
    ));

    let mut sink = InMemorySink::new();
    assert!(
        a.write_all(&mixed, &mut sink, EncodeSettings::default())
            .is_err()
    );
    assert!(sink.config().is_none());
}

#[test]
fn write_all_pushes_frames_in_order() {
    let frames: Vec<_> = (0..4)
        .map(|i| frame(6, 6, move |_, _| [i as f32 / 4.0; 3]))
        .collect();
    let mut sink = InMemorySink::new();
    let n = FrameAssembler::new(1)
        .write_all(&frames, &mut sink, EncodeSettings { fps: 12, quality: 5 })
        .unwrap();
    assert_eq!(n, 4);
    assert!(sink.is_finished());
    let cfg = sink.config().unwrap();
    assert_eq!((cfg.width, cfg.height, cfg.fps, cfg.quality), (4, 4, 12, 5));
    let firsts: Vec<u8> = sink.frames().iter().map(|(_, f)| f.get_pixel(0, 0).0[0]).collect();
    assert_eq!(firsts, vec![0, 64, 128, 191]);
}

#[test]
fn dropped_session_aborts_the_sink() {
    let mut sink = InMemorySink::new();
    {
        let mut session = FrameAssembler::new(0)
            .begin(&mut sink, Canvas::new(2, 2), EncodeSettings::default())
            .unwrap();
        session.push(&frame(2, 2, |_, _| [0.0; 3])).unwrap();
        assert!(session.push(&frame(3, 2, |_, _| [0.0; 3])).is_err());
    }
    assert!(sink.is_aborted());
    assert!(sink.frames().is_empty());
}
