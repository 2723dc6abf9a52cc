//! Heel-strike detection from vertical ground reaction forces.
//!
//! The right and left signals are concatenated into one `2N` sequence. The
//! heel strike is the first sample after the last sample below the contact
//! threshold; when the sequence ends in swing it wraps to the first sample
//! above the threshold. Samples in the second half belong to the left leg.

use gait_types::{GaitError, Result, Side};
use serde::{Deserialize, Serialize};

/// Vertical force (N) separating swing from stance.
pub const CONTACT_THRESHOLD: f64 = 30.0;

/// First ground contact of the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeelStrike {
    /// Sample index within the leg's signal.
    pub index: usize,
    /// Leg making contact.
    pub leg: Side,
}

fn undefined(reason: &str) -> GaitError {
    GaitError::UndefinedHeelStrike {
        reason: reason.to_string(),
    }
}

/// Locate the heel strike in the vertical forces of both feet.
pub fn detect_heel_strike(right: &[f64], left: &[f64], threshold: f64) -> Result<HeelStrike> {
    if right.is_empty() || right.len() != left.len() {
        return Err(undefined(&format!(
            "force signals of {} and {} samples",
            right.len(),
            left.len()
        )));
    }
    let n = right.len();
    let signal: Vec<f64> = right.iter().chain(left).copied().collect();
    let last_swing = signal
        .iter()
        .rposition(|&f| f < threshold)
        .ok_or_else(|| undefined("both feet stay loaded"))?;
    let first_contact = if last_swing == 2 * n - 1 {
        signal
            .iter()
            .position(|&f| f > threshold)
            .ok_or_else(|| undefined("no foot ever loads"))?
    } else {
        last_swing + 1
    };
    Ok(if first_contact >= n {
        HeelStrike {
            index: first_contact - n,
            leg: Side::Left,
        }
    } else {
        HeelStrike {
            index: first_contact,
            leg: Side::Right,
        }
    })
}
