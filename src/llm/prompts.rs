/// Diffs longer than this are cut before being embedded in a prompt.
pub const MAX_DIFF_CHARS: usize = 60_000;

const TITLE_TEMPLATE: &str = r#"Please generate an appropriate pull request title based on the git diff below.

Rules:
- A single line, no longer than 72 characters.
- Use the imperative mood (e.g. "Add", "Fix", "Refactor").
- No surrounding quotes, no markdown, no trailing period.
- Reply with the title only."#;

const BODY_TEMPLATE: &str = r#"Please generate an appropriate pull request description based on the git diff below.

Here is a sample of the pull request format.

---
## Description

* desc

### Changes
1. change:
   - desc

2. change:
   - desc

...

### Testing
- desc

---

Reply with the description only, without a title."#;

const JAPANESE_INSTRUCTION: &str = "Write the answer in Japanese.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrPart {
    Title,
    Body,
}

/// Render the question sent to the model for one part of the pull request.
pub fn create_question(part: PrPart, diff: &str, japanese: bool) -> String {
    let template = match part {
        PrPart::Title => TITLE_TEMPLATE,
        PrPart::Body => BODY_TEMPLATE,
    };

    let mut prompt = String::from(template);
    if japanese {
        prompt.push('\n');
        prompt.push_str(JAPANESE_INSTRUCTION);
    }

    prompt.push_str("\n\n```diff\n");
    prompt.push_str(&truncate_diff(diff, MAX_DIFF_CHARS));
    prompt.push_str("\n```\n");
    prompt
}

fn truncate_diff(diff: &str, max_chars: usize) -> String {
    match diff.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...\n[truncated]", &diff[..cut]),
        None => diff.trim_end().to_string(),
    }
}
