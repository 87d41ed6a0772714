//! Fixed-point particle candidate.
//!
//! A candidate is unpacked from one 64-bit word produced upstream by the
//! particle-flow reconstruction. Field layout (LSB first):
//!
//! ```text
//! bits  0..14  hw_pt   unsigned   0.25 GeV
//! bits 14..26  hw_eta  signed     π/720
//! bits 26..37  hw_phi  signed     π/720
//! bits 37..40  hw_id   unsigned   particle-id code
//! bits 40..50  hw_z0   signed     0.05 cm
//! bits 50..64  unused
//! ```
//!
//! Every field is stored already wrapped to its bit width, so derived equality
//! is bitwise equality of the packed word.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

pub const PT_BITS: u32 = 14;
pub const ETA_BITS: u32 = 12;
pub const PHI_BITS: u32 = 11;
pub const ID_BITS: u32 = 3;
pub const Z0_BITS: u32 = 10;

const ETA_SHIFT: u32 = PT_BITS;
const PHI_SHIFT: u32 = ETA_SHIFT + ETA_BITS;
const ID_SHIFT: u32 = PHI_SHIFT + PHI_BITS;
const Z0_SHIFT: u32 = ID_SHIFT + ID_BITS;

/// Transverse momentum LSB (GeV).
pub const PT_LSB: f64 = 0.25;
/// Shared LSB of pseudorapidity and azimuth.
pub const ETAPHI_LSB: f64 = PI / 720.0;
/// Longitudinal impact position LSB (cm).
pub const Z0_LSB: f64 = 0.05;

/// π in hardware azimuth units.
pub const INT_PI: i32 = 720;
/// 2π in hardware azimuth units.
pub const INT_2PI: i32 = 1440;

/// Particle-flow identity code.
///
/// Charged codes alternate sign: even codes are negative, odd codes positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ParticleId {
    HadronZero = 0,
    Photon = 1,
    HadronMinus = 2,
    HadronPlus = 3,
    ElectronMinus = 4,
    ElectronPlus = 5,
    MuonMinus = 6,
    MuonPlus = 7,
}

impl ParticleId {
    pub fn from_code(code: u8) -> Self {
        match code & 0x7 {
            0 => ParticleId::HadronZero,
            1 => ParticleId::Photon,
            2 => ParticleId::HadronMinus,
            3 => ParticleId::HadronPlus,
            4 => ParticleId::ElectronMinus,
            5 => ParticleId::ElectronPlus,
            6 => ParticleId::MuonMinus,
            _ => ParticleId::MuonPlus,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_charged(self) -> bool {
        self.code() > 1
    }

    /// Electric charge sign: 0 for neutrals, +1 for odd charged codes, -1 for even.
    pub fn charge(self) -> i8 {
        if !self.is_charged() {
            0
        } else if self.code() & 1 == 1 {
            1
        } else {
            -1
        }
    }
}

/// One reconstructed particle in hardware units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Candidate {
    hw_pt: u16,
    hw_eta: i16,
    hw_phi: i16,
    hw_id: u8,
    hw_z0: i16,
}

/// Wrap `value` to `bits` and sign-extend it back.
fn wrap_signed(value: i32, bits: u32) -> i16 {
    let shift = 32 - bits;
    ((value << shift) >> shift) as i16
}

fn field(word: u64, shift: u32, bits: u32) -> u64 {
    (word >> shift) & ((1u64 << bits) - 1)
}

impl Candidate {
    /// Neutral filler: momentum 0, sorts to the lowest rank.
    pub const EMPTY: Candidate = Candidate {
        hw_pt: 0,
        hw_eta: 0,
        hw_phi: 0,
        hw_id: 0,
        hw_z0: 0,
    };

    /// Build a candidate from hardware integers, wrapping each to its field width.
    pub fn new(hw_pt: u32, hw_eta: i32, hw_phi: i32, hw_id: u8, hw_z0: i32) -> Self {
        Self {
            hw_pt: (hw_pt & ((1 << PT_BITS) - 1)) as u16,
            hw_eta: wrap_signed(hw_eta, ETA_BITS),
            hw_phi: wrap_signed(hw_phi, PHI_BITS),
            hw_id: hw_id & ((1 << ID_BITS) - 1),
            hw_z0: wrap_signed(hw_z0, Z0_BITS),
        }
    }

    /// Build a candidate from physical units, rounding to the nearest LSB.
    pub fn from_physical(pt: f64, eta: f64, phi: f64, id: ParticleId, z0: f64) -> Self {
        Self::new(
            (pt / PT_LSB).round().max(0.0) as u32,
            (eta / ETAPHI_LSB).round() as i32,
            (phi / ETAPHI_LSB).round() as i32,
            id.code(),
            (z0 / Z0_LSB).round() as i32,
        )
    }

    /// Unpack a raw 64-bit candidate word. Bits 50..64 are ignored.
    pub fn unpack(word: u64) -> Self {
        Self::new(
            field(word, 0, PT_BITS) as u32,
            field(word, ETA_SHIFT, ETA_BITS) as i32,
            field(word, PHI_SHIFT, PHI_BITS) as i32,
            field(word, ID_SHIFT, ID_BITS) as u8,
            field(word, Z0_SHIFT, Z0_BITS) as i32,
        )
    }

    /// Pack back into the 64-bit wire layout.
    pub fn pack(&self) -> u64 {
        let mask = |bits: u32| (1u64 << bits) - 1;
        (self.hw_pt as u64 & mask(PT_BITS))
            | ((self.hw_eta as u16 as u64 & mask(ETA_BITS)) << ETA_SHIFT)
            | ((self.hw_phi as u16 as u64 & mask(PHI_BITS)) << PHI_SHIFT)
            | ((self.hw_id as u64 & mask(ID_BITS)) << ID_SHIFT)
            | ((self.hw_z0 as u16 as u64 & mask(Z0_BITS)) << Z0_SHIFT)
    }

    pub fn hw_pt(&self) -> u16 {
        self.hw_pt
    }

    pub fn hw_eta(&self) -> i16 {
        self.hw_eta
    }

    pub fn hw_phi(&self) -> i16 {
        self.hw_phi
    }

    pub fn hw_id(&self) -> u8 {
        self.hw_id
    }

    pub fn hw_z0(&self) -> i16 {
        self.hw_z0
    }

    pub fn particle_id(&self) -> ParticleId {
        ParticleId::from_code(self.hw_id)
    }

    /// Charge sign derived from the identity code.
    pub fn charge(&self) -> i8 {
        self.particle_id().charge()
    }

    pub fn is_neutral(&self) -> bool {
        !self.particle_id().is_charged()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    pub fn float_pt(&self) -> f64 {
        self.hw_pt as f64 * PT_LSB
    }

    pub fn float_eta(&self) -> f64 {
        self.hw_eta as f64 * ETAPHI_LSB
    }

    pub fn float_phi(&self) -> f64 {
        self.hw_phi as f64 * ETAPHI_LSB
    }

    pub fn float_z0(&self) -> f64 {
        self.hw_z0 as f64 * Z0_LSB
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[pT {:6.2} eta {:+6.3} phi {:+6.3} id {} z0 {:+6.2}]",
            self.float_pt(),
            self.float_eta(),
            self.float_phi(),
            self.hw_id,
            self.float_z0()
        )
    }
}
