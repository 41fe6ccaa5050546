use super::*;

const ALL: [Ease; 4] = [Ease::Linear, Ease::InOutQuad, Ease::InOutCubic, Ease::InOutSine];

#[test]
fn endpoints_are_fixed() {
    for e in ALL {
        assert!(e.apply(0.0).abs() < 1e-12, "{e:?}");
        assert!((e.apply(1.0) - 1.0).abs() < 1e-12, "{e:?}");
    }
}

#[test]
fn input_is_clamped() {
    for e in ALL {
        assert_eq!(e.apply(-1.0), e.apply(0.0));
        assert_eq!(e.apply(2.0), e.apply(1.0));
    }
}

#[test]
fn smooth_curves_have_flat_ends() {
    let h = 1e-4;
    for e in ALL.into_iter().filter(|e| e.is_smooth_at_ends()) {
        let v0 = (e.apply(h) - e.apply(0.0)) / h;
        let v1 = (e.apply(1.0) - e.apply(1.0 - h)) / h;
        assert!(v0.abs() < 1e-2, "{e:?} start velocity {v0}");
        assert!(v1.abs() < 1e-2, "{e:?} end velocity {v1}");
    }
}

#[test]
fn curves_are_monotonic() {
    for e in ALL {
        let mut prev = e.apply(0.0);
        for i in 1..=100 {
            let v = e.apply(i as f64 / 100.0);
            assert!(v + 1e-12 >= prev, "{e:?}");
            prev = v;
        }
    }
}
