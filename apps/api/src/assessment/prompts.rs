// All LLM prompt constants for the assessment module.
// Reuses cross-cutting fragments from llm_client::prompts.
// Templates are filled with `fill_template`, never chained `.replace` calls.

/// Question generation prompt template.
/// Replace: {topic}, {difficulty}
pub const QUESTION_PROMPT_TEMPLATE: &str = r#"Generate a DSA coding problem for topic: {topic} with difficulty: {difficulty}.
Respond ONLY with a valid JSON object in this exact format, with no additional text, markdown, or explanations:
{
  "title": "Problem Title",
  "description": "Problem description with clear constraints, examples, and what the function should do. Include input/output format.",
  "testCases": [
    {"input": "input1", "output": "expected_output1", "description": "test case 1 description"},
    {"input": "input2", "output": "expected_output2", "description": "test case 2 description"},
    {"input": "input3", "output": "expected_output3", "description": "test case 3 description"}
  ],
  "sampleInput": "sample input for testing",
  "sampleOutput": "expected sample output",
  "difficulty": "{difficulty}",
  "hints": ["hint1", "hint2"]
}

Make sure:
1. The problem is clear and has examples
2. Test cases cover edge cases
3. Input/output format is specified
4. Problem is language-agnostic
5. Difficulty level matches: {difficulty}"#;

/// Single run against the sample input.
/// Replace: {language}, {code}, {input}
pub const RUN_PROMPT_TEMPLATE: &str = r#"Execute this {language} code with the given input and return ONLY the output.

CRITICAL INSTRUCTIONS:
- Run the code with the provided input
- Return ONLY the actual output that the code produces
- Do NOT include any explanations, descriptions, or additional text
- Do NOT say "Output:" or "Result:" - just return the raw output
- If there's an error, return only the error message

Code:
{code}

Input: {input}

Execute and return only the output:"#;

/// Pass/fail check against one test case.
/// Replace: {language}, {code}, {input}, {expected}
pub const CHECK_PROMPT_TEMPLATE: &str = r#"Execute this {language} code with the given test case.

CRITICAL: Respond ONLY with:
- "PASS" (if code executes correctly and output matches expected)
- "FAIL: [brief reason]" (if code fails or output is wrong)

Do NOT include code descriptions, explanations, or additional commentary.

Code:
{code}

Test Input: {input}
Expected Output: {expected}

Execute the code and compare actual output with expected output."#;

/// Substitutes `{name}` placeholders in one pass over `template`.
///
/// Substituted values are copied verbatim and never rescanned, so a value
/// containing `{code}` stays literal. Braces that do not name a known
/// placeholder (the JSON example above, for one) are left untouched.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let substitution = tail.find('}').and_then(|end| {
            let name = &tail[1..end];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (end, *value))
        });
        match substitution {
            Some((end, value)) => {
                out.push_str(value);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
