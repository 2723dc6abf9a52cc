//! Heel strike on synthetic ground reaction forces.
//!
//! A smooth stance/swing profile with a single threshold crossing per foot
//! must report the crossing sample and the leg that made it.

#![allow(clippy::unwrap_used)]

use gait_predict::{detect_heel_strike, HeelStrike, CONTACT_THRESHOLD};
use gait_types::{GaitError, Side};

const N: usize = 25;

/// Vertical force rising through the threshold between `rise − 1` and
/// `rise`.
fn loading(rise: usize) -> Vec<f64> {
    (0..N)
        .map(|k| {
            if k < rise {
                10.0 * (k as f64 / rise as f64)
            } else {
                CONTACT_THRESHOLD + 40.0 + 600.0 * ((k - rise) as f64 / N as f64)
            }
        })
        .collect()
}

#[test]
fn single_crossing_on_the_right_leg() {
    let left: Vec<f64> = loading(0).iter().map(|f| f + 100.0).collect();
    let strike = detect_heel_strike(&loading(13), &left, CONTACT_THRESHOLD).unwrap();
    assert_eq!(
        strike,
        HeelStrike {
            index: 13,
            leg: Side::Right
        }
    );
}

#[test]
fn single_crossing_on_the_left_leg() {
    // right foot in stance throughout, left lifts and lands at sample 9
    let right = vec![650.0; N];
    let strike = detect_heel_strike(&right, &loading(9), CONTACT_THRESHOLD).unwrap();
    assert_eq!(strike.leg, Side::Left);
    assert_eq!(strike.index, 9);
}

#[test]
fn sample_at_threshold_is_neither_swing_nor_stance() {
    let mut right = loading(5);
    right[5] = CONTACT_THRESHOLD;
    let left = vec![500.0; N];
    let strike = detect_heel_strike(&right, &left, CONTACT_THRESHOLD).unwrap();
    assert_eq!(strike, HeelStrike { index: 5, leg: Side::Right });
}

#[test]
fn flat_signals_are_undefined() {
    let err = detect_heel_strike(&[0.0; N], &[0.0; N], CONTACT_THRESHOLD).unwrap_err();
    assert!(matches!(err, GaitError::UndefinedHeelStrike { .. }));
    assert!(err.is_consistency_error());
}
