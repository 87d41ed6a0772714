//! Fixed-point cos/cosh for the pair-mass computation.
//!
//! Values are scaled by [`COSCOSH_LSB`]. In [`TrigMode::Lut`] they come from
//! 2048-entry tables indexed by |angle| in hardware units:
//!
//! ```text
//! cos_lut[i]  = clamp(trunc(cos(i · π/720) · 128), -1023, 1023)
//! cosh_lut[i] = min(trunc(cosh(i · π/720) · 128), 2047)
//! ```
//!
//! Indices past the table are clamped to the last entry. For every index whose
//! entry is not clamped, the table value is within one unit of the exact scaled
//! value (truncation, plus single-precision rounding well below a unit).

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use w3pi_core::ETAPHI_LSB;

/// Fixed-point scale of cos/cosh values.
pub const COSCOSH_LSB: i64 = 128;
/// Entries per table.
pub const LUT_SIZE: usize = 2048;
/// Cos entries are clamped to ±COS_CLAMP.
pub const COS_CLAMP: i64 = (LUT_SIZE / 2 - 1) as i64;
/// Cosh entries are clamped to COSH_CLAMP.
pub const COSH_CLAMP: i64 = (LUT_SIZE - 1) as i64;

/// How cos/cosh are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrigMode {
    /// Bit-exact hardware lookup tables
    #[default]
    Lut,
    /// Double-precision cos/cosh, scaled and rounded to the nearest unit
    Exact,
}

struct TrigTables {
    cos: Box<[i64]>,
    cosh: Box<[i64]>,
}

impl TrigTables {
    fn build() -> Self {
        // Tables are filled in single precision to match the firmware initialisation.
        let lsb = ETAPHI_LSB as f32;
        let scale = COSCOSH_LSB as f32;
        let cos = (0..LUT_SIZE)
            .map(|i| {
                let alpha = lsb * i as f32;
                ((alpha.cos() * scale) as i64).clamp(-COS_CLAMP, COS_CLAMP)
            })
            .collect();
        let cosh = (0..LUT_SIZE)
            .map(|i| {
                let alpha = lsb * i as f32;
                ((alpha.cosh() * scale) as i64).min(COSH_CLAMP)
            })
            .collect();
        Self { cos, cosh }
    }
}

static TABLES: Lazy<TrigTables> = Lazy::new(|| {
    log::debug!("building {}-entry cos/cosh lookup tables", LUT_SIZE);
    TrigTables::build()
});

fn lut_index(angle: i32) -> usize {
    (angle.unsigned_abs() as usize).min(LUT_SIZE - 1)
}

impl TrigMode {
    /// cos of a hardware angle, scaled by [`COSCOSH_LSB`].
    pub fn cos(self, angle: i32) -> i64 {
        match self {
            TrigMode::Lut => TABLES.cos[lut_index(angle)],
            TrigMode::Exact => {
                ((angle as f64 * ETAPHI_LSB).cos() * COSCOSH_LSB as f64).round() as i64
            }
        }
    }

    /// cosh of a hardware angle, scaled by [`COSCOSH_LSB`].
    pub fn cosh(self, angle: i32) -> i64 {
        match self {
            TrigMode::Lut => TABLES.cosh[lut_index(angle)],
            TrigMode::Exact => {
                ((angle as f64 * ETAPHI_LSB).cosh() * COSCOSH_LSB as f64).round() as i64
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_anchors() {
        let lut = TrigMode::Lut;
        assert_eq!(lut.cos(0), 128);
        assert_eq!(lut.cosh(0), 128);
        // single-precision fill lands exactly on ±1 at π and 2π
        assert_eq!(lut.cos(720), -128);
        assert_eq!(lut.cos(1440), 128);
        assert_eq!(lut.cos(360), 0);
        assert_eq!(lut.cos(-360), lut.cos(360));
        assert_eq!(lut.cosh(-100), lut.cosh(100));
    }

    #[test]
    fn test_clamping() {
        let lut = TrigMode::Lut;
        assert_eq!(lut.cosh(2047), COSH_CLAMP);
        assert_eq!(lut.cosh(4000), COSH_CLAMP);
        assert_eq!(lut.cos(5000), lut.cos(2047));
        for angle in 0..LUT_SIZE as i32 {
            assert!(lut.cos(angle).abs() <= COS_CLAMP);
            assert!(lut.cosh(angle) <= COSH_CLAMP);
        }
    }

    #[test]
    fn test_lut_error_bound() {
        for angle in 0..LUT_SIZE as i32 {
            let exact_cos = (angle as f64 * ETAPHI_LSB).cos() * COSCOSH_LSB as f64;
            assert!(
                (TrigMode::Lut.cos(angle) as f64 - exact_cos).abs() < 1.01,
                "cos at {}",
                angle
            );
            let exact_cosh = (angle as f64 * ETAPHI_LSB).cosh() * COSCOSH_LSB as f64;
            if exact_cosh < COSH_CLAMP as f64 {
                assert!(
                    (TrigMode::Lut.cosh(angle) as f64 - exact_cosh).abs() < 1.01,
                    "cosh at {}",
                    angle
                );
            }
        }
    }

    #[test]
    fn test_exact_mode_is_unclamped() {
        assert_eq!(TrigMode::Exact.cos(720), -128);
        assert!(TrigMode::Exact.cosh(2047) > COSH_CLAMP);
    }
}
