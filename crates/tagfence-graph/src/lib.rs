pub mod checker;
pub mod graph;
pub mod synth;

pub use checker::*;
pub use graph::*;
pub use synth::*;
