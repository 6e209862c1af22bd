//! Structural scan of embedded Rhai scripts.
//!
//! Scripts are compiled with a bare engine and the resulting AST is walked.
//! The sandbox engine registers no module resolver and no I/O, so `import`
//! statements can only ever probe the host and are denied wholesale. Call
//! sites naming the engine's dynamic-evaluation and function-pointer
//! primitives are denied because they can smuggle code past a name-based
//! scan. A script that fails to compile is rejected outright.

use rhai::{ASTNode, Engine, Expr, Stmt};

/// Engine primitives whose call is denied.
const DANGEROUS_PRIMITIVES: &[&str] = &["eval", "Fn", "call", "curry"];

/// Scans a Rhai source string, returning any violations found.
pub(crate) fn scan(source: &str) -> Vec<String> {
    let engine = Engine::new_raw();
    let ast = match engine.compile(source) {
        Ok(ast) => ast,
        Err(err) => return vec![format!("failed to parse rhai source: {err}")],
    };

    let mut violations = Vec::new();
    ast.walk(&mut |path| {
        if let Some(node) = path.last() {
            inspect(node, &mut violations);
        }
        true
    });
    violations
}

/// Records violations for a single AST node.
fn inspect(node: &ASTNode<'_>, violations: &mut Vec<String>) {
    match node {
        ASTNode::Stmt(Stmt::Import(..)) => {
            violations.push(String::from(
                "import statements are not permitted in sandboxed scripts",
            ));
        }
        ASTNode::Expr(Expr::FnCall(call, _) | Expr::MethodCall(call, _)) => {
            let name = call.name.as_str();
            if DANGEROUS_PRIMITIVES.contains(&name) {
                violations.push(format!("call to dangerous engine primitive: {name}"));
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("eval(\"40 + 2\")", "engine primitive: eval")]
    #[case("let f = Fn(\"helper\"); f.call(1)", "engine primitive: Fn")]
    #[case("let g = |x| x + 1; g.call(2)", "engine primitive: call")]
    #[case("let h = add.curry(1); h.call(2)", "engine primitive: curry")]
    fn dangerous_primitives_are_flagged(#[case] source: &str, #[case] needle: &str) {
        let violations = scan(source);
        assert!(
            violations.iter().any(|violation| violation.contains(needle)),
            "expected '{needle}' in {violations:?}",
        );
    }

    #[test]
    fn import_statements_are_flagged() {
        let violations = scan("import \"toolkit\" as tk; tk::run();");
        assert!(
            violations
                .iter()
                .any(|violation| violation.contains("import statements are not permitted")),
            "got {violations:?}",
        );
    }

    #[test]
    fn compile_failure_is_a_violation() {
        let violations = scan("let x = ;");
        assert!(
            violations
                .iter()
                .any(|violation| violation.contains("failed to parse rhai source")),
            "got {violations:?}",
        );
    }

    #[test]
    fn benign_script_passes() {
        let source = "let total = 0; for n in 1..=10 { total += n; } print(total);";
        let violations = scan(source);
        assert!(violations.is_empty(), "unexpected: {violations:?}");
    }

    #[test]
    fn user_function_calls_are_not_confused_with_primitives() {
        let source = "fn evaluate(x) { x * 2 } print(evaluate(21));";
        let violations = scan(source);
        assert!(violations.is_empty(), "unexpected: {violations:?}");
    }
}
