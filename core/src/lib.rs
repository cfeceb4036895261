pub mod consonance;

pub mod voice;

pub mod voices;

mod output;
pub use output::*;

pub mod helpers;
