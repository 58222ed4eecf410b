//! Prompt templates for artifact generation

/// Templates for the generation prompt
pub struct PromptTemplate;

impl PromptTemplate {
    /// System instructions sent with every generation request
    pub fn system() -> &'static str {
        r#"You are a senior front-end developer and UI designer.
You build complete, modern, single-file web pages with semantic HTML5, modern CSS (Flexbox, Grid, custom properties) and modular ES6+ JavaScript.

Rules for every answer:
- Return ONE complete HTML document.
- Put CSS in a <style> element inside <head> and JavaScript in a <script> element at the end of <body>.
- Keep the page responsive (mobile first), accessible (keyboard and screen reader friendly) and free of external build steps.
- Use 2-space indentation, kebab-case CSS class names and camelCase JavaScript names.
- When existing code is provided, apply the requested change and keep everything else intact.
- If the existing code contains a TRUNCATED marker, reproduce the omitted middle section unchanged.
- Wrap the full file in a single ```html fenced code block."#
    }

    /// User prompt embedding the request and the current artifact snippet
    pub fn user_instruction(message: &str, existing_code: &str) -> String {
        format!(
            "User request:\n{message}\n\nExisting code (may be empty):\n```html\n{existing_code}\n```\n\nReturn ONLY the new full file in a fenced code block."
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_instruction_embeds_message_and_code() {
        let prompt = PromptTemplate::user_instruction("make a red button", "<p>old</p>");
        assert!(prompt.starts_with("User request:\nmake a red button\n"));
        assert!(prompt.contains("```html\n<p>old</p>\n```"));
        assert!(prompt.ends_with("fenced code block."));
    }

    #[test]
    fn user_instruction_with_empty_code() {
        let prompt = PromptTemplate::user_instruction("hello", "");
        assert!(prompt.contains("```html\n\n```"));
    }

    #[test]
    fn system_prompt_asks_for_fenced_html() {
        assert!(PromptTemplate::system().contains("```html"));
    }
}
