//! Prompt construction and response cleanup.
//!
//! Prompts are deterministic: the same word and context always produce the
//! same text, so cached results stay valid across requests.

const WORD_TEMPLATE: &str = r#"Correct this word: "{word}". The corrected word can be in Malayalam or English. If the input word exists return that, if no suggestions return the same word. Reply only with the corrected word no explanation of suggestion or anything.
Don't add any extra characters or words. Don't add any extra spaces or new lines. Don't add any quotes. Don't add any punctuation marks. Don't add any emojis. Don't add anything else. Don't hallucinate.
Example:
Input: hell0
Output: hello

Input: hello
Output: hello

Input: മലയാള0
Output: മലയാളം

Input: holp
Output: help"#;

const CONTEXT_TEMPLATE: &str = r#"Correct this word in the given context. Only reply with the corrected word.
Word: "{word}"
Context: "{context}"
Important: Only reply with the corrected word, nothing else."#;

/// Prompt for `word`, using the context template when `context` is non-empty.
pub fn build_prompt(word: &str, context: Option<&str>) -> String {
    match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => CONTEXT_TEMPLATE
            .replace("{word}", word)
            .replace("{context}", context),
        None => WORD_TEMPLATE.replace("{word}", word),
    }
}

/// Trim, strip one layer of surrounding quotes, trim again.
///
/// A leading and a trailing quote are removed independently, so `"word'`
/// and `'word` both come back as `word`.
pub fn clean_response(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix(['"', '\''])
        .unwrap_or(trimmed);
    let trimmed = trimmed
        .strip_suffix(['"', '\''])
        .unwrap_or(trimmed);
    trimmed.trim().to_string()
}
