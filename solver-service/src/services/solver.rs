//! Homework solving: image in, worked solution envelope out.

use crate::models::SolutionEnvelope;
use crate::services::metrics::record_solve;
use crate::services::providers::{create_image_message, VisionModel};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;
use std::time::Instant;

/// Instruction sent alongside every uploaded image.
pub const SOLUTION_PROMPT: &str = "\
Analyze this homework problem image and provide a comprehensive step-by-step solution:

**Instructions:**
1. **Problem Identification**: Identify what type of problem this is (math, science, literature, etc.)
2. **Given Information**: List all the information provided in the problem
3. **Solution Strategy**: Explain your approach to solving this problem
4. **Step-by-Step Solution**: Break down the solution into clear, numbered steps with explanations
5. **Calculations**: Show all mathematical work and reasoning using simple text (avoid LaTeX/complex formatting)
6. **Final Answer**: Provide the complete, clear answer
7. **Verification**: Briefly explain how to check if the answer is correct

**Formatting Guidelines:**
- Use simple text for mathematical expressions (e.g., \"5 × 10,000 = 50,000\" instead of LaTeX)
- Use Unicode symbols when helpful (×, ÷, ≤, ≥, π, etc.)
- Avoid complex LaTeX formatting that may not render properly
- Use code blocks for step-by-step calculations
- Make it educational and easy to read for students

**Format your response clearly with headers and make it educational for the student.**";

/// Stateless solver shared by all requests.
///
/// Holds only the model handle, the model name and the fixed prompt, so
/// concurrent solves need no coordination.
pub struct HomeworkSolver {
    model: Arc<dyn VisionModel>,
    model_name: String,
    prompt: &'static str,
}

impl HomeworkSolver {
    pub fn new(model: Arc<dyn VisionModel>, model_name: impl Into<String>) -> Self {
        Self {
            model,
            model_name: model_name.into(),
            prompt: SOLUTION_PROMPT,
        }
    }

    /// Solve the problem pictured in `image`.
    ///
    /// Never fails: provider errors become a failed envelope. The call
    /// completes only once the provider has answered or errored, and the
    /// elapsed time is reported either way.
    pub async fn solve(&self, image: &[u8]) -> SolutionEnvelope {
        let start = Instant::now();

        let image_base64 = STANDARD.encode(image);
        let message = create_image_message(&image_base64, self.prompt);

        let result = self
            .model
            .complete(std::slice::from_ref(&message), &self.model_name)
            .await;
        let elapsed = start.elapsed();

        match result {
            Ok(solution) => {
                tracing::info!(
                    image_bytes = image.len(),
                    model = %self.model_name,
                    solution_chars = solution.len(),
                    processing_time = elapsed.as_secs_f64(),
                    "Homework problem solved"
                );
                record_solve("success", elapsed);
                SolutionEnvelope::solved(solution, elapsed)
            }
            Err(e) => {
                tracing::error!(
                    image_bytes = image.len(),
                    model = %self.model_name,
                    error_kind = e.kind(),
                    processing_time = elapsed.as_secs_f64(),
                    "Homework solve failed: {}",
                    e
                );
                record_solve("failure", elapsed);
                SolutionEnvelope::failed(e.to_string(), elapsed)
            }
        }
    }
}
