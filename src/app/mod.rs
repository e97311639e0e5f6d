pub mod controller;
pub mod state;
pub mod ui;

#[cfg(test)]
mod tests;

pub use controller::{DebouncedRecomputeController, InputSnapshot, Outcome, Pipeline, ResultSink};
pub use state::App;
