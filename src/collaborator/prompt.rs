use crate::collaborator::TaskKind;
use crate::sandbox::language::Language;

pub const DEVELOPER_SYSTEM: &str =
    "You are an expert software developer. You always answer with a single JSON object and nothing else.";

pub const REVIEWER_SYSTEM: &str =
    "You are a senior code reviewer. You always answer with a single JSON object and nothing else.";

pub fn fix_prompt(code: &str, issue: &str, language: Language, feedback: &str) -> String {
    format!(
        r#"Task: fix the reported defect in the {language} code below.

First, CHECK that the code actually is {language}. If it clearly is not
(for example C++ submitted as Python), return {{"rationale": "", "code": "", "error": "Language mismatch: expected {language}"}}.

Code:
{code}

Defect description:
{issue}

{feedback_section}
Return JSON with 'rationale' (reasoning behind the changes), 'code' (the
complete fixed code), and optional 'error'."#,
        feedback_section = feedback_section(feedback),
    )
}

pub fn optimization_prompt(code: &str, language: Language, feedback: &str) -> String {
    format!(
        r#"Task: optimize the {language} code below for time and space complexity.
Keep its behavior exactly the same.

First, CHECK that the code actually is {language}. If it is not, return
{{"rationale": "", "code": "", "error": "Language mismatch: expected {language}"}}.

Analyze the complexity of BOTH the original and the optimized version.

Code:
{code}

{feedback_section}
Return JSON with 'rationale', 'code' (the complete optimized code),
'orig_time', 'orig_space', 'opt_time', 'opt_space' (complexity estimates
such as "O(n)"), and optional 'error'."#,
        feedback_section = feedback_section(feedback),
    )
}

pub fn security_patch_prompt(code: &str, feedback: &str) -> String {
    format!(
        r#"Task: identify and fix injection vulnerabilities in the code below.
Use parameterized queries.

- If the input is a bare query, return ONLY the corrected query (with
  placeholders such as ? or %s).
- If the input is application code, return ONLY the corrected
  function/snippet.
- Do not invent database setup or mocking unless the input already had it.
- Keep the output minimal and focused on the fix.

Code:
{code}

{feedback_section}
Return JSON with 'rationale' and the secured 'code'."#,
        feedback_section = feedback_section(feedback),
    )
}

pub fn harness_prompt(code: &str, raw_input: &str, language: Language) -> String {
    format!(
        r#"Task: create a test harness that exercises the {language} code below.

Code under test:
{code}

{input_section}
The harness is the entry point only (for example `if __name__ == "__main__":`
or `int main()`):
1. Include any import/include lines the harness itself needs.
2. Call the relevant function from the code under test.
3. Print output so execution can be observed and timed.

Do NOT repeat the code under test; it is prepended to your harness
automatically, so every name it defines is already in scope.

If a test input is given above and is a complete script, return it as is;
if it is bare data, wrap it in a call. If no input is given, analyze the
code, generate a challenging input (large enough to be worth timing), and
build the harness around it.

Return JSON with 'rationale' and the executable harness in 'code'."#,
        input_section = if raw_input.is_empty() {
            String::new()
        } else {
            format!("Test input (raw data or a partial script):\n{raw_input}\n")
        },
    )
}

pub fn review_prompt(code: &str, kind: TaskKind) -> String {
    let criteria = match kind {
        TaskKind::Repair => "Check that the logic is correct and the reported defect is gone.",
        TaskKind::Optimize => {
            "Check that complexity actually improved and the code stays readable."
        }
        TaskKind::Harden => {
            "STRICTLY check for injection vulnerabilities. If any query is built by string concatenation, REJECT it."
        }
    };

    format!(
        r#"Task: review the code below for {task}.

Criteria: {criteria}

Code:
{code}

Return JSON with 'approved' (boolean) and 'feedback' (string)."#,
        task = kind.name(),
    )
}

fn feedback_section(feedback: &str) -> String {
    if feedback.is_empty() {
        String::new()
    } else {
        format!("Feedback on the previous attempt:\n{feedback}\n")
    }
}
