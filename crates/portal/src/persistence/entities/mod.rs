pub mod pillar;

pub use pillar::{Pillar, PillarStatus, SystemState};
