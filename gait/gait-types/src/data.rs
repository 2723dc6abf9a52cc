//! Constant per-muscle and per-joint data of the 3-D walking model.
//!
//! Specific tensions and slow-twitch ratios after Uchida et al. (2016);
//! limit-torque coefficients after Anderson (1999), fitted to cadaver
//! range-of-motion measurements. Left-side joints share the right-side
//! values.

use crate::joint::LimitTorqueParameters;

/// Specific tension (MPa) of each right-side and trunk muscle.
pub const SPECIFIC_TENSION: &[(&str, f64)] = &[
    ("glut_med1_r", 0.74455),
    ("glut_med2_r", 0.75395),
    ("glut_med3_r", 0.75057),
    ("glut_min1_r", 0.75),
    ("glut_min2_r", 0.75),
    ("glut_min3_r", 0.75116),
    ("semimem_r", 0.62524),
    ("semiten_r", 0.62121),
    ("bifemlh_r", 0.62222),
    ("bifemsh_r", 1.00500),
    ("sar_r", 0.74286),
    ("add_long_r", 0.74643),
    ("add_brev_r", 0.75263),
    ("add_mag1_r", 0.55217),
    ("add_mag2_r", 0.55323),
    ("add_mag3_r", 0.54831),
    ("tfl_r", 0.75161),
    ("pect_r", 0.76000),
    ("grac_r", 0.73636),
    ("glut_max1_r", 0.75395),
    ("glut_max2_r", 0.74455),
    ("glut_max3_r", 0.74595),
    ("iliacus_r", 1.2477),
    ("psoas_r", 1.5041),
    ("quad_fem_r", 0.74706),
    ("gem_r", 0.74545),
    ("peri_r", 0.75254),
    ("rect_fem_r", 0.74936),
    ("vas_med_r", 0.49961),
    ("vas_int_r", 0.55263),
    ("vas_lat_r", 0.50027),
    ("med_gas_r", 0.69865),
    ("lat_gas_r", 0.69694),
    ("soleus_r", 0.62703),
    ("tib_post_r", 0.62520),
    ("flex_dig_r", 0.5),
    ("flex_hal_r", 0.50313),
    ("tib_ant_r", 0.75417),
    ("per_brev_r", 0.62143),
    ("per_long_r", 0.62450),
    ("per_tert_r", 1.0),
    ("ext_dig_r", 0.75294),
    ("ext_hal_r", 0.73636),
    ("ercspn_r", 0.25),
    ("intobl_r", 0.25),
    ("extobl_r", 0.25),
];

/// Fraction of slow-twitch fibers of each right-side and trunk muscle.
pub const SLOW_TWITCH_RATIO: &[(&str, f64)] = &[
    ("glut_med1_r", 0.55),
    ("glut_med2_r", 0.55),
    ("glut_med3_r", 0.55),
    ("glut_min1_r", 0.55),
    ("glut_min2_r", 0.55),
    ("glut_min3_r", 0.55),
    ("semimem_r", 0.4925),
    ("semiten_r", 0.425),
    ("bifemlh_r", 0.5425),
    ("bifemsh_r", 0.529),
    ("sar_r", 0.50),
    ("add_long_r", 0.50),
    ("add_brev_r", 0.50),
    ("add_mag1_r", 0.552),
    ("add_mag2_r", 0.552),
    ("add_mag3_r", 0.552),
    ("tfl_r", 0.50),
    ("pect_r", 0.50),
    ("grac_r", 0.50),
    ("glut_max1_r", 0.55),
    ("glut_max2_r", 0.55),
    ("glut_max3_r", 0.55),
    ("iliacus_r", 0.50),
    ("psoas_r", 0.50),
    ("quad_fem_r", 0.50),
    ("gem_r", 0.50),
    ("peri_r", 0.50),
    ("rect_fem_r", 0.3865),
    ("vas_med_r", 0.503),
    ("vas_int_r", 0.543),
    ("vas_lat_r", 0.455),
    ("med_gas_r", 0.566),
    ("lat_gas_r", 0.507),
    ("soleus_r", 0.803),
    ("tib_post_r", 0.60),
    ("flex_dig_r", 0.60),
    ("flex_hal_r", 0.60),
    ("tib_ant_r", 0.70),
    ("per_brev_r", 0.60),
    ("per_long_r", 0.60),
    ("per_tert_r", 0.75),
    ("ext_dig_r", 0.75),
    ("ext_hal_r", 0.75),
    ("ercspn_r", 0.60),
    ("intobl_r", 0.56),
    ("extobl_r", 0.58),
];

const DEG_20: f64 = 0.349_065_850_398_865_9;

/// Limit-torque coefficients `(joint stem, k, θ)`; the stem matches both
/// `_l` and `_r` joints.
const LIMIT_TORQUES: &[(&str, [f64; 4], [f64; 2])] = &[
    ("hip_flexion", [-2.44, 5.05, 1.51, -21.88], [-0.6981, 1.81]),
    ("hip_adduction", [-0.03, 14.94, 0.03, -14.94], [-0.5, 0.5]),
    ("hip_rotation", [-0.03, 14.94, 0.03, -14.94], [-0.92, 0.92]),
    ("knee_angle", [-6.09, 33.94, 11.03, -11.33], [-2.4, 0.13]),
    ("ankle_angle", [-2.03, 38.11, 0.18, -12.12], [-0.74, 0.52]),
    ("subtalar_angle", [-60.21, 16.32, 60.21, -16.32], [-0.65, 0.65]),
    ("mtp_angle", [-0.9, 14.87, 0.18, -70.08], [0.0, 1.134_464_013_796_314]),
    ("lumbar_extension", [-0.35, 30.72, 0.25, -20.36], [-0.523_598_775_598_298_8, 0.17]),
    ("lumbar_bending", [-0.25, 20.36, 0.25, -20.36], [-DEG_20, DEG_20]),
    ("lumbar_rotation", [-0.25, 20.36, 0.25, -20.36], [-DEG_20, DEG_20]),
];

fn lookup(table: &[(&str, f64)], muscle: &str) -> Option<f64> {
    table
        .iter()
        .find_map(|&(name, value)| (name == muscle).then_some(value))
}

/// Specific tension of a right-side or trunk muscle.
#[must_use]
pub fn specific_tension(muscle: &str) -> Option<f64> {
    lookup(SPECIFIC_TENSION, muscle)
}

/// Slow-twitch ratio of a right-side or trunk muscle.
#[must_use]
pub fn slow_twitch_ratio(muscle: &str) -> Option<f64> {
    lookup(SLOW_TWITCH_RATIO, muscle)
}

/// Limit-torque parameters of a joint, with the default damping.
#[must_use]
pub fn limit_torque(joint: &str) -> Option<LimitTorqueParameters> {
    let stem = joint
        .strip_suffix("_r")
        .or_else(|| joint.strip_suffix("_l"))
        .unwrap_or(joint);
    LIMIT_TORQUES
        .iter()
        .find(|(name, _, _)| *name == stem)
        .map(|&(_, k, theta)| LimitTorqueParameters::new(k, theta))
}
