use codeguard_core::{RuleSuggestion, SuggestRuleInput, ValidationRequest, ValidationResult};

fn schema_of<T: schemars::JsonSchema>() -> String {
    let schema = schemars::schema_for!(T);
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string())
}

pub fn validation_system_prompt() -> String {
    format!(
        "You are a code validation expert.\n\n\
You will receive a code snippet, a programming language, and a validation category. \
Analyze the snippet and identify every violation of the rules and best practices \
associated with the given category.\n\n\
For each violation give the rule that was violated, a description of the violation, \
and a suggestion for fixing it. Include 1-based line numbers when they apply. \
Start with a one-sentence summary of the results.\n\n\
Output ONLY a JSON object matching this JSON Schema, inside a ```json fenced block:\n\
{}\n\n\
If the code has no violations, output an empty \"violations\" array.",
        schema_of::<ValidationResult>()
    )
}

pub fn validation_user_message(request: &ValidationRequest) -> String {
    format!(
        "Language: {language}\n\
Category: {category}\n\
Code:\n\
```{language}\n\
{code}\n\
```",
        language = request.language,
        category = request.category,
        code = request.code,
    )
}

pub fn suggestion_system_prompt() -> String {
    format!(
        "You are an AI assistant helping to write code validation rules.\n\n\
Based on the provided code example, the description of the desired coding practice, \
the programming language and the category, suggest a title, a detailed description and \
a severity level for a new code validation rule.\n\n\
The title must be concise and informative. The description must explain the rule and \
the consequences of violating it. The severity reflects the impact of a violation: \
HIGH, MEDIUM or LOW.\n\n\
Output ONLY a JSON object matching this JSON Schema, nothing else:\n{}",
        schema_of::<RuleSuggestion>()
    )
}

pub fn suggestion_user_message(input: &SuggestRuleInput) -> String {
    format!(
        "Language: {}\n\
Category: {}\n\
Subcategory: {}\n\
Code Example: {}\n\
Description of Desired Behavior: {}",
        input.language,
        input.category,
        input.subcategory.as_deref().unwrap_or(""),
        input.code_example,
        input.description,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestion_message_interpolates_fields_verbatim() {
        let input = SuggestRuleInput {
            language: "Python".into(),
            category: "Best Practices".into(),
            subcategory: None,
            code_example: "for x in range(10): squares.append(x**2)".into(),
            description: "prefer comprehensions".into(),
        };
        let msg = suggestion_user_message(&input);
        assert!(msg.contains("Language: Python\n"));
        assert!(msg.contains("Category: Best Practices\n"));
        assert!(msg.contains("Subcategory: \n"));
        assert!(msg.contains("Code Example: for x in range(10): squares.append(x**2)\n"));
        assert!(msg.ends_with("Description of Desired Behavior: prefer comprehensions"));
    }

    #[test]
    fn validation_message_fences_code_with_language() {
        let req = ValidationRequest::new("JavaScript", "Security", "const password='123456';");
        let msg = validation_user_message(&req);
        assert!(msg.starts_with("Language: JavaScript\nCategory: Security\n"));
        assert!(msg.contains("```JavaScript\nconst password='123456';\n```"));
    }

    #[test]
    fn system_prompts_embed_output_schemas() {
        let validation = validation_system_prompt();
        assert!(validation.contains("\"violations\""));
        assert!(validation.contains("\"lineNumbers\""));
        let suggestion = suggestion_system_prompt();
        assert!(suggestion.contains("\"severity\""));
        assert!(suggestion.contains("\"HIGH\""));
    }
}
