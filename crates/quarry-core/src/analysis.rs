//! Regex heuristics for the most common JS/TS code smells.
//!
//! Not a linter replacement: quick, dependency-light pattern matching
//! that is good enough to score chunks for retrieval metadata.

use once_cell::sync::Lazy;
use regex::Regex;

const MAX_NESTING_DEPTH: usize = 3;
const MAX_FUNCTION_LINES: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub complexity: u32,
    pub anti_patterns: Vec<String>,
}

static DECISION_POINTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(if|for|while|case|catch)\b").unwrap());

static VAR_DECL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bvar\s+").unwrap());
static WITH_STMT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bwith\s*\(").unwrap());
static EVAL_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\beval\s*\(").unwrap());
static NEW_FUNCTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bnew\s+Function\s*\(").unwrap());
static LOOSE_EQ: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^=!<>]==[^=]|[^=!]!=[^=]").unwrap());
static ASYNC_FN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\basync\s+function[^{]*\{.*\breturn\b").unwrap());
static EMPTY_CATCH: Lazy<Regex> = Lazy::new(|| Regex::new(r"catch\s*\([^)]*\)\s*\{\s*\}").unwrap());
static CONSOLE_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bconsole\.(log|debug|info|warn|error)\s*\(").unwrap());
static TODO_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"//\s*TODO\b|/\*\s*TODO\b").unwrap());
static LONG_PARAM_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bfunction\b[^{(]*\([^)]{41,}\)").unwrap());
static EMPTY_CONTROL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(if|for|while|switch)\b[^{]*\{\s*\}").unwrap());
static EMPTY_IF: Lazy<Regex> = Lazy::new(|| Regex::new(r"if\s*\([^)]*\)\s*;").unwrap());
static FOR_IN_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"for\s*\(\s*var\s+\w+\s+in\s+\w+\s*\)").unwrap());
static MAGIC_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(0x[0-9a-fA-F]+|\d{3,})\b").unwrap());
static ANY_TYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bany\b").unwrap());
static NON_NULL_ASSERT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w!\.").unwrap());
static AS_ANY: Lazy<Regex> = Lazy::new(|| Regex::new(r"as\s+any\b").unwrap());
static DEFAULT_GENERATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bexport\s+default\s+function\s*\*").unwrap());

pub fn analyze(code: &str) -> Analysis {
    let complexity = approximate_cyclomatic_complexity(code);
    let mut anti_patterns = Vec::new();
    let mut push = |label: &str| anti_patterns.push(label.to_string());

    // Language-level dangers.
    if VAR_DECL.is_match(code) {
        push("Use of var (prefer let / const)");
    }
    if WITH_STMT.is_match(code) {
        push("with statement (creates scope confusion)");
    }
    if EVAL_CALL.is_match(code) {
        push("eval usage");
    }
    if NEW_FUNCTION.is_match(code) {
        push("new Function constructor");
    }

    // Logic and safety smells.
    if LOOSE_EQ.is_match(code) {
        push("Loose equality (== / !=) - prefer strict");
    }
    if ASYNC_FN.is_match(code) && !code.contains("await") {
        push("async function without await");
    }
    if EMPTY_CATCH.is_match(code) {
        push("Empty catch block");
    }

    // Readability and maintainability.
    if CONSOLE_CALL.is_match(code) {
        push("console.* left in production code");
    }
    if TODO_COMMENT.is_match(code) {
        push("TODO/FIXME left in code");
    }
    if LONG_PARAM_LIST.is_match(code) {
        push("Function has > 6 parameters");
    }
    if EMPTY_CONTROL.is_match(code) {
        push("Empty control structure");
    }
    if EMPTY_IF.is_match(code) {
        push("Empty if statement");
    }
    if FOR_IN_VAR.is_match(code) {
        push("for-in loop over array (use for-of)");
    }
    if MAGIC_NUMBER.is_match(code) {
        push("Magic number literal");
    }
    if deeply_nested(code) {
        push("Nested blocks > 3 levels deep");
    }
    if long_function(code) {
        push("Function longer than 100 LOC");
    }
    if ANY_TYPE.is_match(code) {
        push("TypeScript 'any' type");
    }
    if NON_NULL_ASSERT.is_match(code) {
        push("Non-null assertion operator (!) - brittle");
    }
    if AS_ANY.is_match(code) {
        push("Type assertion to any");
    }
    if DEFAULT_GENERATOR.is_match(code) {
        push("Default-exporting generator function (rarely desired)");
    }

    Analysis {
        complexity,
        anti_patterns,
    }
}

/// 1 + decision points (branch keywords and short-circuit operators).
fn approximate_cyclomatic_complexity(code: &str) -> u32 {
    let keywords = DECISION_POINTS.find_iter(code).count();
    let logical = code.matches("&&").count() + code.matches("||").count();
    (keywords + logical + 1) as u32
}

fn deeply_nested(code: &str) -> bool {
    let mut depth = 0usize;
    let mut max = 0usize;
    for ch in code.chars() {
        match ch {
            '{' => {
                depth += 1;
                max = max.max(depth);
            }
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max > MAX_NESTING_DEPTH
}

fn long_function(code: &str) -> bool {
    code.lines().count() > MAX_FUNCTION_LINES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_var_and_eval_together() {
        let analysis = analyze("function run(code) {\n  if (code) {\n    var x = 1; eval(code);\n  }\n}\n");
        assert!(analysis
            .anti_patterns
            .iter()
            .any(|p| p.contains("var")));
        assert!(analysis.anti_patterns.iter().any(|p| p.contains("eval")));
        assert!(analysis.complexity >= 2);
    }

    #[test]
    fn clean_code_has_base_complexity() {
        let analysis = analyze("const total = a + b;\n");
        assert_eq!(analysis.complexity, 1);
        assert!(analysis.anti_patterns.is_empty());
    }

    #[test]
    fn counts_branches_and_short_circuits() {
        let code = "if (a && b) { x(); } for (;;) { y(); }";
        let analysis = analyze(code);
        // if + for + && + base
        assert_eq!(analysis.complexity, 4);
    }

    #[test]
    fn loose_equality_but_not_strict() {
        assert!(analyze("if (a == b) {}")
            .anti_patterns
            .iter()
            .any(|p| p.contains("Loose equality")));
        assert!(!analyze("if (a === b) { body(a); }")
            .anti_patterns
            .iter()
            .any(|p| p.contains("Loose equality")));
    }

    #[test]
    fn flags_deep_nesting() {
        let code = "{ { { { nested(); } } } }";
        assert!(analyze(code)
            .anti_patterns
            .iter()
            .any(|p| p.contains("Nested blocks")));
    }

    #[test]
    fn flags_console_and_magic_numbers() {
        let analysis = analyze("console.log(timeout);\nconst timeout = 5000;");
        assert!(analysis
            .anti_patterns
            .iter()
            .any(|p| p.contains("console")));
        assert!(analysis
            .anti_patterns
            .iter()
            .any(|p| p.contains("Magic number")));
    }

    #[test]
    fn finding_order_is_stable() {
        let code = "var a = 1; eval(a); console.log(a);";
        let analysis = analyze(code);
        let var_pos = analysis
            .anti_patterns
            .iter()
            .position(|p| p.contains("var"))
            .unwrap();
        let eval_pos = analysis
            .anti_patterns
            .iter()
            .position(|p| p.contains("eval"))
            .unwrap();
        assert!(var_pos < eval_pos);
    }
}
