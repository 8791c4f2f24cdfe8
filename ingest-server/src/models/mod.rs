//! Request / response models

pub mod analysis;
pub mod record;

pub use analysis::*;
pub use record::*;
