//! Fixed prompt templates and tolerant parsing of model output

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

/// Maximum number of entity names taken from one extraction
pub const MAX_ENTITY_NAMES: usize = 5;

/// Answer returned when retrieval finds nothing
pub const NOT_FOUND_ANSWER: &str = "No relevant information was found in this knowledge base.";

/// Answer returned when the answer model call fails
pub const ANSWER_FAILED: &str =
    "Relevant facts were found in this knowledge base, but an answer could not be generated.";

static JSON_ARRAY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*?\]").unwrap());
static JSON_ARRAY_GREEDY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*\]").unwrap());
static JSON_OBJECT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

const ENTITY_EXTRACTION_TEMPLATE: &str = r#"Extract the key entities mentioned in the question below.

Rules:
- Return between 3 and 5 entity names, fewer only if the question mentions fewer.
- Only return proper names of people, organizations, places, products, events or specific concepts.
- Do not return generic question words such as "who", "what", "company", "information" or "relationship".
- Keep each name exactly as written in the question.
- Respond with only a JSON array of strings, for example ["Entity One", "Entity Two"]. No explanation.

Question: {question}"#;

const ANSWER_TEMPLATE: &str = r#"You are answering a question using facts from a knowledge graph.
Each fact has the form (head) --[relation]--> (tail).

Facts:
{context}

Answer the question using only the facts above. If the facts do not contain the answer, say that the knowledge base does not contain it. Be concise.

Question: {question}"#;

const QUERY_TEMPLATE: &str = r#"Task: Generate a graph query that answers a question about a knowledge graph.
Use only the node labels, relationship types and patterns listed in the schema.
Relationship types may contain spaces or non-ASCII characters; always quote them.
Every entity has a `name`, a `node_type` and a `description`. Entity names are upper-case.
Do not include explanations or apologies, only the query.

Schema:
{schema}

Question: {question}"#;

/// Prompt asking the chat model for entity names in `question`
pub fn entity_extraction_prompt(question: &str) -> String {
    ENTITY_EXTRACTION_TEMPLATE.replace("{question}", question)
}

/// Prompt asking the chat model to answer `question` from `context`
pub fn answer_prompt(context: &str, question: &str) -> String {
    ANSWER_TEMPLATE
        .replace("{context}", context)
        .replace("{question}", question)
}

/// Text-to-query prompt embedding a namespace's schema. The question slot is
/// left as `{question}` for the caller to fill.
pub fn query_prompt(schema_text: &str) -> String {
    QUERY_TEMPLATE.replace("{schema}", schema_text.trim_end())
}

/// Parse entity names from a chat response.
///
/// Tries the whole trimmed response as a JSON array, then the first `[...]`
/// span. Non-string items and blank names are ignored; the result is
/// de-duplicated (case-insensitively) and capped at [`MAX_ENTITY_NAMES`].
/// Anything unparseable yields an empty list.
pub fn parse_entity_names(response: &str) -> Vec<String> {
    let trimmed = strip_code_fence(response.trim());

    let items = serde_json::from_str::<Vec<Value>>(trimmed)
        .ok()
        .or_else(|| first_json_array(trimmed));

    let Some(items) = items else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(|item| item.as_str())
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_lowercase()))
        .take(MAX_ENTITY_NAMES)
        .map(str::to_string)
        .collect()
}

fn first_json_array(text: &str) -> Option<Vec<Value>> {
    [&*JSON_ARRAY_RE, &*JSON_ARRAY_GREEDY_RE]
        .iter()
        .filter_map(|re| re.find(text))
        .find_map(|m| serde_json::from_str::<Vec<Value>>(m.as_str()).ok())
}

/// Parse a JSON object from model output: the whole trimmed text, or the
/// outermost `{...}` span
pub fn extract_json_object(response: &str) -> Option<Value> {
    let trimmed = strip_code_fence(response.trim());
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => JSON_OBJECT_RE
            .find(trimmed)
            .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok())
            .filter(Value::is_object),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_json_array() {
        assert_eq!(
            parse_entity_names(r#"["OpenAI", "Sam Altman"]"#),
            vec!["OpenAI", "Sam Altman"]
        );
    }

    #[test]
    fn test_array_embedded_in_prose() {
        let response = "Sure! Here are the entities: [\"OpenAI\", \"GPT-4\"]. Hope that helps.";
        assert_eq!(parse_entity_names(response), vec!["OpenAI", "GPT-4"]);
    }

    #[test]
    fn test_code_fenced_array() {
        let response = "```json\n[\"Berlin\", \"Germany\"]\n```";
        assert_eq!(parse_entity_names(response), vec!["Berlin", "Germany"]);
    }

    #[test]
    fn test_garbage_yields_empty() {
        assert!(parse_entity_names("I could not find any entities.").is_empty());
        assert!(parse_entity_names("[not json at all").is_empty());
        assert!(parse_entity_names("").is_empty());
    }

    #[test]
    fn test_non_strings_and_blanks_dropped() {
        let response = r#"["OpenAI", 42, null, "  ", {"name": "x"}, "Sam Altman"]"#;
        assert_eq!(parse_entity_names(response), vec!["OpenAI", "Sam Altman"]);
    }

    #[test]
    fn test_dedup_and_cap() {
        let response = r#"["a", "A", "b", "c", "d", "e", "f", "g"]"#;
        assert_eq!(parse_entity_names(response), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_extract_json_object_from_noise() {
        let value = extract_json_object("Result:\n{\"nodes\": []}\nDone").unwrap();
        assert!(value.get("nodes").is_some());
        assert!(extract_json_object("[1, 2]").is_none());
    }

    #[test]
    fn test_prompts_embed_inputs() {
        assert!(entity_extraction_prompt("Who runs OpenAI?").ends_with("Question: Who runs OpenAI?"));
        let answer = answer_prompt("(A) --[r]--> (B)", "what?");
        assert!(answer.contains("(A) --[r]--> (B)"));
        let query = query_prompt("Node labels: PERSON\n");
        assert!(query.contains("Node labels: PERSON\n\nQuestion: {question}"));
    }
}
