pub mod health;
pub mod metrics;
pub mod solve;

pub use health::health_check;
pub use metrics::metrics;
pub use solve::solve_problem;
