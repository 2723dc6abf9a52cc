//! Output layout of the external dynamics evaluator.
//!
//! The evaluator returns one flat vector: generalized forces in joint order,
//! followed by auxiliary outputs at offsets that depend only on the joint
//! count. Two variants exist:
//!
//! ```text
//! transcription:   [ τ (nJ) | calcn_r calcn_l femur_r femur_l hand_r hand_l
//!                              tibia_r tibia_l toes_r toes_l   (2-D, 20) ]
//! post-processing: [ τ (nJ) | GRF_r GRF_l | calcn3D_r calcn3D_l | GRM_r GRM_l ]
//! ```
//!
//! Offsets are computed, never looked up by name.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Body side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Right side.
    Right,
    /// Left side.
    Left,
}

impl Side {
    /// Position of the side within a right/left pair.
    #[must_use]
    pub const fn offset(self) -> usize {
        match self {
            Self::Right => 0,
            Self::Left => 1,
        }
    }

    /// Label used in file headers.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Right => "r",
            Self::Left => "l",
        }
    }
}

/// Bodies whose origins the transcription variant reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Body {
    /// Heel bone.
    Calcaneus,
    /// Thigh.
    Femur,
    /// Hand.
    Hand,
    /// Shank.
    Tibia,
    /// Toes.
    Toes,
}

impl Body {
    const fn slot(self) -> usize {
        match self {
            Self::Calcaneus => 0,
            Self::Femur => 1,
            Self::Hand => 2,
            Self::Tibia => 3,
            Self::Toes => 4,
        }
    }
}

/// Which evaluator variant an output vector comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DynamicsVariant {
    /// Torques plus 2-D body origins.
    Transcription,
    /// Torques plus 3-D ground reactions and calcaneus origins.
    PostProcessing,
}

/// Fixed-offset output schema for a model with `n_joints` coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicsLayout {
    /// Number of generalized coordinates.
    pub n_joints: usize,
}

impl DynamicsLayout {
    /// Number of 2-D origins in the transcription variant.
    pub const ORIGIN_COUNT: usize = 10;

    /// Create the layout.
    #[must_use]
    pub const fn new(n_joints: usize) -> Self {
        Self { n_joints }
    }

    /// Length of the evaluator input: interleaved q/q̇ then q̈.
    #[must_use]
    pub const fn input_len(&self) -> usize {
        3 * self.n_joints
    }

    /// Length of the output vector for `variant`.
    #[must_use]
    pub const fn output_len(&self, variant: DynamicsVariant) -> usize {
        match variant {
            DynamicsVariant::Transcription => self.n_joints + 2 * Self::ORIGIN_COUNT,
            DynamicsVariant::PostProcessing => self.n_joints + 18,
        }
    }

    /// Range of joint torques (both variants).
    #[must_use]
    pub const fn torques(&self) -> Range<usize> {
        0..self.n_joints
    }

    /// Range of a 2-D body origin in the transcription variant.
    #[must_use]
    pub const fn origin(&self, body: Body, side: Side) -> Range<usize> {
        let start = self.n_joints + 2 * (2 * body.slot() + side.offset());
        start..start + 2
    }

    /// Range of the 3-D ground reaction force under one foot.
    #[must_use]
    pub const fn grf(&self, side: Side) -> Range<usize> {
        let start = self.n_joints + 3 * side.offset();
        start..start + 3
    }

    /// Range of the 3-D calcaneus origin.
    #[must_use]
    pub const fn calcaneus_3d(&self, side: Side) -> Range<usize> {
        let start = self.n_joints + 6 + 3 * side.offset();
        start..start + 3
    }

    /// Range of the 3-D ground reaction moment under one foot.
    #[must_use]
    pub const fn grm(&self, side: Side) -> Range<usize> {
        let start = self.n_joints + 12 + 3 * side.offset();
        start..start + 3
    }
}

/// Self-collision heuristic between two body origins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionPair {
    /// First origin.
    pub first: (Body, Side),
    /// Second origin.
    pub second: (Body, Side),
    /// Minimum squared distance (m²).
    pub min_squared_distance: f64,
    /// Maximum squared distance (m²).
    pub max_squared_distance: f64,
}

impl CollisionPair {
    /// Upper bound shared by every pair.
    pub const MAX_SQUARED_DISTANCE: f64 = 4.0;

    /// Create a pair with the shared upper bound.
    #[must_use]
    pub const fn new(first: (Body, Side), second: (Body, Side), min_squared_distance: f64) -> Self {
        Self {
            first,
            second,
            min_squared_distance,
            max_squared_distance: Self::MAX_SQUARED_DISTANCE,
        }
    }

    /// Pairs constrained during walking: calcanei, femur vs. hand on both
    /// sides, tibias, toes.
    #[must_use]
    pub fn walking_set() -> Vec<Self> {
        vec![
            Self::new((Body::Calcaneus, Side::Right), (Body::Calcaneus, Side::Left), 0.0081),
            Self::new((Body::Femur, Side::Right), (Body::Hand, Side::Right), 0.0324),
            Self::new((Body::Femur, Side::Left), (Body::Hand, Side::Left), 0.0324),
            Self::new((Body::Tibia, Side::Right), (Body::Tibia, Side::Left), 0.0121),
            Self::new((Body::Toes, Side::Right), (Body::Toes, Side::Left), 0.01),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcription_offsets() {
        let layout = DynamicsLayout::new(31);
        assert_eq!(layout.origin(Body::Calcaneus, Side::Right), 31..33);
        assert_eq!(layout.origin(Body::Calcaneus, Side::Left), 33..35);
        assert_eq!(layout.origin(Body::Femur, Side::Right), 35..37);
        assert_eq!(layout.origin(Body::Hand, Side::Left), 41..43);
        assert_eq!(layout.origin(Body::Toes, Side::Left), 49..51);
        assert_eq!(layout.output_len(DynamicsVariant::Transcription), 51);
    }

    #[test]
    fn test_post_processing_offsets() {
        let layout = DynamicsLayout::new(29);
        assert_eq!(layout.grf(Side::Right), 29..32);
        assert_eq!(layout.grf(Side::Left), 32..35);
        assert_eq!(layout.calcaneus_3d(Side::Right), 35..38);
        assert_eq!(layout.grm(Side::Left), 44..47);
        assert_eq!(layout.output_len(DynamicsVariant::PostProcessing), 47);
        assert_eq!(layout.input_len(), 87);
    }

    #[test]
    fn test_walking_collision_set() {
        let pairs = CollisionPair::walking_set();
        assert_eq!(pairs.len(), 5);
        assert!(pairs
            .iter()
            .all(|p| p.min_squared_distance < p.max_squared_distance));
    }
}
