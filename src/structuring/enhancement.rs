//! Narrative enhancement stage.
//!
//! Hands the deterministic term sheet to the narrative generator and
//! takes back prose only: custom covenants, extra conditions, special
//! terms, and a justification paragraph. The returned JSON is validated
//! field by field; anything malformed is dropped. A dead generator is
//! not an error; the pipeline continues with an empty enhancement.

use serde_json::Value;

use crate::capabilities::NarrativeGenerator;
use crate::types::{AiEnhancement, Analysis, RulesEngineOutput};

const SYSTEM_PROMPT: &str = "You are a senior commercial credit officer. \
Given a machine-derived term sheet and credit analysis, suggest narrative \
enhancements only. Respond with a single JSON object with exactly these \
keys: custom_covenants (array of strings), additional_conditions (array \
of strings), special_terms (array of strings), justification (string). \
Never propose changes to any numeric term: amounts, rates, terms, \
payments, and fees are final.";

/// Run the enhancement stage. Infallible by design: every failure mode
/// degrades to the empty enhancement.
pub fn enhance_structure(
    rules: &RulesEngineOutput,
    analysis: &Analysis,
    generator: &dyn NarrativeGenerator,
) -> AiEnhancement {
    let user_prompt = match build_user_prompt(rules, analysis) {
        Ok(prompt) => prompt,
        Err(err) => {
            log::warn!("enhancement: could not serialize term sheet ({}); skipping", err);
            return AiEnhancement::unavailable();
        }
    };

    match generator.generate_json(SYSTEM_PROMPT, &user_prompt) {
        Ok(value) => sanitize_enhancement(value),
        Err(err) => {
            log::warn!("enhancement: generator unavailable ({}); continuing without", err);
            AiEnhancement::unavailable()
        }
    }
}

fn build_user_prompt(
    rules: &RulesEngineOutput,
    analysis: &Analysis,
) -> Result<String, serde_json::Error> {
    Ok(format!(
        "Term sheet:\n{}\n\nCredit analysis summary:\n{}",
        serde_json::to_string_pretty(rules)?,
        serde_json::to_string_pretty(&analysis.summary)?,
    ))
}

/// Validate the generator's JSON against the enhancement shape. Unknown
/// keys are ignored, malformed values dropped, arrays defaulted empty.
fn sanitize_enhancement(value: Value) -> AiEnhancement {
    AiEnhancement {
        custom_covenants: string_array(&value, "custom_covenants"),
        additional_conditions: string_array(&value, "additional_conditions"),
        special_terms: string_array(&value, "special_terms"),
        justification: value
            .get("justification")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    }
}

fn string_array(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
