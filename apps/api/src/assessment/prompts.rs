// Prompt constants and rendering for the assessment pipeline.

use crate::corpus::DocumentChunk;

/// Assessment prompt. Slots: {user_responses}, {question_origins}, {context}.
///
/// The severity bands below are read by the model only; nothing in this
/// service scores answers or checks the output structure.
pub const ASSESSMENT_PROMPT_TEMPLATE: &str = r#"You are a compassionate mental health assistant. Analyze the following responses to a mixed mental health questionnaire containing items from PHQ-9 (depression), GAD-7 (anxiety), and PSS-10 (stress) assessments.

User responses:
{user_responses}

Question origins:
{question_origins}

Based on the responses, determine which condition(s) the user might be experiencing (depression, anxiety, stress, or combinations). Calculate approximate scores for each condition based on the relevant questions.

Scoring information:
- Depression questions (PHQ-9): Each answer is scored 0-3. Total score ranges: 0-4 minimal, 5-9 mild, 10-14 moderate, 15-19 moderately severe, 20-27 severe depression.
- Anxiety questions (GAD-7): Each answer is scored 0-3. Total score ranges: 0-4 minimal, 5-9 mild, 10-14 moderate, 15-21 severe anxiety.
- Stress questions (PSS-10): Items about feeling in control are reverse scored. Score ranges: 0-13 low, 14-26 moderate, 27-40 high perceived stress.

FORMAT YOUR RESPONSE WITH THE FOLLOWING STRUCTURE:

ASSESSMENT SUMMARY:
[Brief overview of the assessment results and primary concerns]

CONDITION SCORES:
- Depression: [Score]/[Max Score] - [Severity Level]
- Anxiety: [Score]/[Max Score] - [Severity Level]
- Stress: [Score]/[Max Score] - [Severity Level]

DETAILED ANALYSIS:

Depression:
[Detailed analysis of depression symptoms and their impact]

Anxiety:
[Detailed analysis of anxiety symptoms and their impact]

Stress:
[Detailed analysis of stress symptoms and their impact]

RECOMMENDATIONS:
1. [First recommendation specific to the conditions identified]
2. [Second recommendation]
3. [Third recommendation]
4. [Fourth recommendation]
5. [Fifth recommendation if applicable]

DISCLAIMER:
[Include a clear disclaimer that this is not a clinical diagnosis and professional help is recommended]

Context information about mental health approaches from the database:
{context}"#;

/// Separator between retrieved chunks in the {context} slot.
const CONTEXT_SEPARATOR: &str = "\n\n";

/// Builds the assessment prompt. Chunks are expected nearest-first and are
/// inserted in that order.
pub fn compose(
    user_responses: &str,
    question_origins: &str,
    retrieved_chunks: &[DocumentChunk],
) -> String {
    let context = retrieved_chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR);

    render(
        ASSESSMENT_PROMPT_TEMPLATE,
        &[
            ("user_responses", user_responses),
            ("question_origins", question_origins),
            ("context", &context),
        ],
    )
}

/// Single-pass `{name}` substitution. Substituted values are never rescanned,
/// so slot names typed by a user stay literal. Unknown `{...}` is kept as-is.
fn render(template: &str, slots: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];

        let slot = slots
            .iter()
            .find(|(name, _)| tail.starts_with(name) && tail[name.len()..].starts_with('}'));

        match slot {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}
