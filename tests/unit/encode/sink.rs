use super::*;

fn cfg() -> SinkConfig {
    SinkConfig {
        width: 4,
        height: 2,
        fps: 25,
        quality: 8,
    }
}

#[test]
fn config_validation_catches_bad_values() {
    assert!(cfg().validate().is_ok());
    assert!(SinkConfig { width: 0, ..cfg() }.validate().is_err());
    assert!(SinkConfig { fps: 0, ..cfg() }.validate().is_err());
    assert!(SinkConfig { quality: 11, ..cfg() }.validate().is_err());
}

#[test]
fn in_memory_sink_keeps_frames_in_order() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    for i in 0..3 {
        sink.push_frame(FrameIndex(i), &image::RgbImage::new(4, 2))
            .unwrap();
    }
    sink.end().unwrap();
    assert!(sink.is_finished());
    let idx: Vec<_> = sink.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(idx, vec![0, 1, 2]);
}

#[test]
fn rejects_out_of_order_and_mismatched_frames() {
    let mut sink = InMemorySink::new();
    assert!(
        sink.push_frame(FrameIndex(0), &image::RgbImage::new(4, 2))
            .is_err()
    );
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(1), &image::RgbImage::new(4, 2))
        .unwrap();
    assert!(
        sink.push_frame(FrameIndex(1), &image::RgbImage::new(4, 2))
            .is_err()
    );
    assert!(
        sink.push_frame(FrameIndex(2), &image::RgbImage::new(3, 2))
            .is_err()
    );
}

#[test]
fn abort_discards_output() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(0), &image::RgbImage::new(4, 2))
        .unwrap();
    sink.abort();
    assert!(sink.is_aborted());
    assert!(!sink.is_finished());
    assert!(sink.frames().is_empty());
}
