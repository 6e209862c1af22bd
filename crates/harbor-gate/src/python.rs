//! Structural scan of Python sources via Tree-sitter.
//!
//! The source is parsed into a concrete syntax tree and walked for three
//! classes of construct: imports of restricted modules, calls to dangerous
//! built-ins, and attribute calls whose receiver is a restricted module
//! alias. A source that fails to parse is rejected outright: the scan
//! cannot vouch for code it cannot read.

use tree_sitter::Node;

use crate::error::GateError;
use crate::language::Language;

/// Modules whose import is denied.
const RESTRICTED_MODULES: &[&str] = &["os", "sys", "subprocess", "socket", "shutil"];

/// Built-in functions whose call is denied.
const DANGEROUS_BUILTINS: &[&str] = &["eval", "exec", "compile", "open", "input"];

/// Module aliases whose attribute calls are denied.
const RESTRICTED_ALIASES: &[&str] = &["os", "sys", "subprocess"];

/// Violation recorded when the source does not parse.
const PARSE_FAILURE: &str = "failed to parse python source";

/// Scans a Python source string, returning any violations found.
///
/// # Errors
///
/// Returns [`GateError::Grammar`] when the Python grammar cannot be loaded;
/// the analyser converts this into a deny verdict.
pub(crate) fn scan(source: &str) -> Result<Vec<String>, GateError> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|err| GateError::Grammar {
            language: Language::Python,
            message: err.to_string(),
        })?;

    let Some(tree) = parser.parse(source, None) else {
        return Ok(vec![String::from(PARSE_FAILURE)]);
    };

    // Structural checks are meaningless on a broken tree; report the parse
    // failure alone, matching the gate's fail-closed posture.
    if tree.root_node().has_error() {
        return Ok(vec![String::from(PARSE_FAILURE)]);
    }

    let mut violations = Vec::new();
    walk(tree.root_node(), source, &mut violations);
    Ok(violations)
}

/// Recursively visits every node, dispatching on the kinds of interest.
fn walk(node: Node<'_>, source: &str, violations: &mut Vec<String>) {
    match node.kind() {
        "import_statement" => check_import(node, source, violations),
        "import_from_statement" => check_import_from(node, source, violations),
        "call" => check_call(node, source, violations),
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, source, violations);
    }
}

/// Checks `import a.b, c as d` statements against the restricted modules.
fn check_import(node: Node<'_>, source: &str, violations: &mut Vec<String>) {
    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        let dotted = if name.kind() == "aliased_import" {
            name.child_by_field_name("name")
        } else {
            Some(name)
        };
        if let Some(dotted) = dotted {
            record_restricted_module(node_text(dotted, source), violations);
        }
    }
}

/// Checks `from a.b import c` statements against the restricted modules.
fn check_import_from(node: Node<'_>, source: &str, violations: &mut Vec<String>) {
    if let Some(module) = node.child_by_field_name("module_name") {
        record_restricted_module(node_text(module, source), violations);
    }
}

/// Records a violation when the root segment of a dotted module path is
/// restricted.
fn record_restricted_module(dotted: &str, violations: &mut Vec<String>) {
    let root = dotted.split('.').next().unwrap_or(dotted);
    if RESTRICTED_MODULES.contains(&root) {
        violations.push(format!("import of restricted module: {root}"));
    }
}

/// Checks call expressions for dangerous built-ins and restricted-alias
/// attribute calls.
fn check_call(node: Node<'_>, source: &str, violations: &mut Vec<String>) {
    let Some(function) = node.child_by_field_name("function") else {
        return;
    };
    match function.kind() {
        "identifier" => {
            let name = node_text(function, source);
            if DANGEROUS_BUILTINS.contains(&name) {
                violations.push(format!("call to dangerous function: {name}"));
            }
        }
        "attribute" => check_attribute_call(function, source, violations),
        _ => {}
    }
}

/// Flags `alias.method(...)` calls whose alias names a restricted module.
fn check_attribute_call(function: Node<'_>, source: &str, violations: &mut Vec<String>) {
    let Some(object) = function.child_by_field_name("object") else {
        return;
    };
    if object.kind() != "identifier" {
        return;
    }
    let alias = node_text(object, source);
    if !RESTRICTED_ALIASES.contains(&alias) {
        return;
    }
    let method = function
        .child_by_field_name("attribute")
        .map_or("<unknown>", |attr| node_text(attr, source));
    violations.push(format!("call to dangerous method: {alias}.{method}"));
}

/// Returns the source text covered by a node.
fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    source.get(node.byte_range()).unwrap_or_default()
}
