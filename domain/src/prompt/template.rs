//! Prompt templates for each orchestration stage

use crate::diffusion::RefinementRole;
use crate::planning::PlanStep;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// Ask `critic` to critique `author`'s answer
    pub fn critique(question: &str, target_answer: &str, author: &str) -> String {
        format!(
            r#"You are reviewing an answer written by {author}.

Original question: {question}

Answer under review:
---
{target_answer}
---

List every factual error, logical flaw and important gap you find, one per line.
Start error lines with "Error:" and gap lines with "Missing:".
End with a line "Confidence: N/10" for how sure you are of your critique."#
        )
    }

    /// Ask the author to refine its answer given critiques
    pub fn improve(question: &str, previous_answer: &str, critiques: &[String]) -> String {
        let mut prompt = format!(
            r#"Original question: {question}

Your previous answer:
---
{previous_answer}
---

Other experts raised these points:
"#
        );
        for (i, critique) in critiques.iter().enumerate() {
            prompt.push_str(&format!("\n--- Critique {} ---\n{}\n", i + 1, critique));
        }
        prompt.push_str(
            r#"
Write an improved answer. Fix what is actually wrong, keep what is right,
and do not mention the critiques themselves."#,
        );
        prompt
    }

    /// Ask an evaluator to score another model's argument
    pub fn evaluate(question: &str, argument: &str) -> String {
        format!(
            r#"Original question: {question}

Evaluate this answer for accuracy, completeness and reasoning:
---
{argument}
---

Respond in JSON format:
{{"score": <0-10>, "reasoning": "<one sentence>"}}"#
        )
    }

    /// Ask a model to rework a weak debate argument
    pub fn regenerate(question: &str, previous_argument: &str, key_points: &[String]) -> String {
        let mut prompt = format!(
            r#"Original question: {question}

Your previous answer was rated weak by the other participants:
---
{previous_argument}
---
"#
        );
        if !key_points.is_empty() {
            prompt.push_str("\nPoints the other participants agree on:\n");
            for point in key_points {
                prompt.push_str(&format!("- {point}\n"));
            }
        }
        prompt.push_str("\nWrite a stronger answer that addresses these points.");
        prompt
    }

    /// Merge answers into one final answer.
    ///
    /// Each entry is `(model, answer, weight)`; callers pass them heaviest
    /// first.
    pub fn synthesis(
        question: &str,
        answers: &[(String, String, f64)],
        key_points: &[String],
    ) -> String {
        let mut prompt = format!(
            r#"Original question: {question}

Expert answers, weighted by how much each should count:
"#
        );
        for (model, content, weight) in answers {
            prompt.push_str(&format!("\n--- {model} (weight {weight:.2}) ---\n{content}\n"));
        }
        if !key_points.is_empty() {
            prompt.push_str("\nAgreed key points:\n");
            for point in key_points {
                prompt.push_str(&format!("- {point}\n"));
            }
        }
        prompt.push_str(
            r#"
Synthesize a single final answer that keeps the best supported claims.
Where the answers disagree, favour the higher weights. Answer the question directly."#,
        );
        prompt
    }

    /// Ask a model to rewrite a prompt under a refinement role
    pub fn rewrite(prompt: &str, role: RefinementRole) -> String {
        format!(
            r#"You are improving a prompt before it is sent to other AI models.
Your role: {role}. {instruction}

Prompt:
---
{prompt}
---

Reply with the rewritten prompt only."#,
            instruction = role.instruction()
        )
    }

    /// Ask a judge to rate a rewritten prompt against the original
    pub fn judge(original: &str, rewrite: &str) -> String {
        format!(
            r#"Compare a rewritten prompt with the original.

Original:
---
{original}
---

Rewrite:
---
{rewrite}
---

Rate how much better the rewrite would be at getting a precise, useful answer
while keeping the original intent. Respond in JSON format:
{{"score": <0-10>, "reasoning": "<one sentence>"}}"#
        )
    }

    /// Prompt for one plan step, with the outputs it depends on
    pub fn step(task: &str, step: &PlanStep, inputs: &[(String, String)]) -> String {
        let mut prompt = format!(
            r#"Overall task: {task}

Your part ({role}): {description}
"#,
            role = step.role,
            description = step.description
        );
        if !inputs.is_empty() {
            prompt.push_str("\nInputs from earlier steps:\n");
            for (id, output) in inputs {
                prompt.push_str(&format!("\n--- {id} ---\n{output}\n"));
            }
        }
        prompt
    }
}
