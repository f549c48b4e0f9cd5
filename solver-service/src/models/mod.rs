pub mod solution;

pub use solution::SolutionEnvelope;
