pub mod metrics;
pub mod providers;
pub mod solver;

pub use metrics::{get_metrics, init_metrics};
pub use solver::{HomeworkSolver, SOLUTION_PROMPT};
