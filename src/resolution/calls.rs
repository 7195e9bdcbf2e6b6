//! Per-file function call analysis.
//!
//! Two passes over one syntax tree:
//!
//! 1. **Symbols.** Names of function declarations and of variables initialized
//!    with a function or arrow expression go into `local_functions`; every
//!    default or named import binding goes into `imported_functions` with the
//!    module it came from.
//! 2. **Calls.** For each named function (declaration or variable-bound
//!    expression), every call expression in its subtree becomes an edge from
//!    that function to the callee. Calls outside any named function are never
//!    reported.
//!
//! Callees are a plain identifier (`foo()`) or an identifier member of an
//! identifier (`api.get()`); other shapes have no name and are skipped, as are
//! built-in globals. Edges are de-duplicated per `(caller, callee)`, first
//! occurrence wins. Resolution is name matching within the file, not scope
//! analysis: a shadowing parameter still resolves to the outer binding.

use std::collections::{HashMap, HashSet};

use tree_sitter::Node;

use crate::error::Result;
use crate::indexer::parser::{descendants, named_children, node_text, string_value, CodeParser};
use crate::types::{CallLocation, FunctionCallEdge, Language, Resolution, SyntaxTree};

/// Caller name reported for `export default function () {}`.
pub const ANONYMOUS_CALLER: &str = "<anonymous>";

/// Platform and runtime names that never produce call edges.
const BUILT_INS: &[&str] = &[
    "console",
    "Math",
    "JSON",
    "Date",
    "Promise",
    "setTimeout",
    "setInterval",
    "clearTimeout",
    "clearInterval",
    "window",
    "document",
    "globalThis",
    "Array",
    "Object",
    "Number",
    "String",
    "Boolean",
    "Symbol",
    "BigInt",
    "isNaN",
    "eval",
    "alert",
    "prompt",
    "fetch",
    "XMLHttpRequest",
    "requestAnimationFrame",
    "cancelAnimationFrame",
    "localStorage",
    "sessionStorage",
    "indexedDB",
    "Headers",
    "Request",
    "Response",
    "WebSocket",
    "Worker",
    "MessageChannel",
    "MessagePort",
    "MessageEvent",
    "Notification",
    "dispatch",
    "useContext",
    "createContext",
    "createRoot",
    "document.getElementById",
    "useReducer",
    "parseFloat",
    "num.toString",
    "num.toExponential",
    "isFinite",
    "value.includes",
];

/// Whether a callee name is on the built-in denylist.
///
/// Member calls are also matched on their object, so `console.log` and
/// `Math.max` are built-ins because `console` and `Math` are.
pub fn is_built_in(name: &str) -> bool {
    if BUILT_INS.contains(&name) {
        return true;
    }
    match name.split_once('.') {
        Some((object, _)) => BUILT_INS.contains(&object),
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Analyze one file's source as TypeScript with JSX.
pub fn analyze(source: &str) -> Result<Vec<FunctionCallEdge>> {
    analyze_with(source, Language::Tsx)
}

/// Analyze one file's source with an explicit dialect.
pub fn analyze_with(source: &str, language: Language) -> Result<Vec<FunctionCallEdge>> {
    let tree = CodeParser::new().parse(source, language)?;
    Ok(analyze_tree(&tree, source))
}

/// Analyze an already-parsed file. `source` must be the text `tree` was
/// parsed from.
pub fn analyze_tree(tree: &SyntaxTree, source: &str) -> Vec<FunctionCallEdge> {
    let root = tree.root_node();
    let symbols = FileSymbols::collect(root, source);
    let mut collector = CallCollector {
        symbols: &symbols,
        source,
        seen: HashSet::new(),
        edges: Vec::new(),
    };

    for node in descendants(root) {
        if let Some(function) = NamedFunction::from_node(node, source) {
            let caller = function.name.unwrap_or(ANONYMOUS_CALLER);
            collector.collect(caller, function.node);
        }
    }
    collector.edges
}

// ---------------------------------------------------------------------------
// Pass 1: symbols
// ---------------------------------------------------------------------------

/// Function and import bindings of one file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileSymbols {
    pub local_functions: HashSet<String>,
    /// Local binding name -> module specifier.
    pub imported_functions: HashMap<String, String>,
}

impl FileSymbols {
    pub fn collect(root: Node<'_>, source: &str) -> Self {
        let mut symbols = Self::default();
        for node in descendants(root) {
            if node.kind() == "import_statement" {
                symbols.record_import(node, source);
                continue;
            }
            if let Some(name) = NamedFunction::from_node(node, source).and_then(|f| f.name) {
                symbols.local_functions.insert(name.to_string());
            }
        }
        symbols
    }

    /// Default and named specifiers; namespace imports bind nothing callable
    /// by plain name and are ignored.
    fn record_import(&mut self, statement: Node<'_>, source: &str) {
        let Some(module) = statement
            .child_by_field_name("source")
            .and_then(|s| string_value(s, source))
        else {
            return;
        };

        for clause in named_children(statement) {
            if clause.kind() != "import_clause" {
                continue;
            }
            for part in named_children(clause) {
                match part.kind() {
                    "identifier" => {
                        self.imported_functions
                            .insert(node_text(part, source).to_string(), module.to_string());
                    }
                    "named_imports" => {
                        for spec in named_children(part) {
                            if spec.kind() != "import_specifier" {
                                continue;
                            }
                            let local = spec
                                .child_by_field_name("alias")
                                .or_else(|| spec.child_by_field_name("name"));
                            if let Some(local) = local {
                                self.imported_functions.insert(
                                    node_text(local, source).to_string(),
                                    module.to_string(),
                                );
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    /// Classify a callee name: local bindings shadow imports.
    pub fn resolve(&self, name: &str) -> (Resolution, Option<String>) {
        if self.local_functions.contains(name) {
            (Resolution::Local, None)
        } else if let Some(module) = self.imported_functions.get(name) {
            (Resolution::Imported, Some(module.clone()))
        } else {
            (Resolution::Unknown, None)
        }
    }
}

// ---------------------------------------------------------------------------
// Named functions
// ---------------------------------------------------------------------------

/// A function that can act as a caller, and the subtree holding its calls.
struct NamedFunction<'t, 's> {
    /// `None` only for an anonymous default-exported function.
    name: Option<&'s str>,
    node: Node<'t>,
}

impl<'t, 's> NamedFunction<'t, 's> {
    fn from_node(node: Node<'t>, source: &'s str) -> Option<Self> {
        match node.kind() {
            "function_declaration" | "generator_function_declaration" => Some(Self {
                name: node
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source)),
                node,
            }),
            // `export default function () {}` is a declaration without a name.
            "function_expression" | "function" | "generator_function"
                if node.parent().is_some_and(|p| p.kind() == "export_statement") =>
            {
                Some(Self {
                    name: node
                        .child_by_field_name("name")
                        .map(|n| node_text(n, source)),
                    node,
                })
            }
            "variable_declarator" => {
                let name = node.child_by_field_name("name")?;
                if name.kind() != "identifier" {
                    return None;
                }
                let value = unwrap_parens(node.child_by_field_name("value")?);
                is_function_expression(value.kind()).then(|| Self {
                    name: Some(node_text(name, source)),
                    node: value,
                })
            }
            _ => None,
        }
    }
}

fn is_function_expression(kind: &str) -> bool {
    matches!(
        kind,
        "function_expression" | "function" | "arrow_function" | "generator_function"
    )
}

fn unwrap_parens(mut node: Node<'_>) -> Node<'_> {
    while node.kind() == "parenthesized_expression" {
        match named_children(node).into_iter().next() {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

// ---------------------------------------------------------------------------
// Pass 2: calls
// ---------------------------------------------------------------------------

struct CallCollector<'a> {
    symbols: &'a FileSymbols,
    source: &'a str,
    seen: HashSet<(String, String)>,
    edges: Vec<FunctionCallEdge>,
}

impl CallCollector<'_> {
    fn collect(&mut self, caller: &str, function: Node<'_>) {
        for node in descendants(function) {
            if node.kind() != "call_expression" {
                continue;
            }
            let Some(callee) = callee_name(node, self.source) else {
                continue;
            };
            if is_built_in(&callee) {
                continue;
            }
            if !self.seen.insert((caller.to_string(), callee.clone())) {
                continue;
            }

            let (resolution, import_source) = self.symbols.resolve(&callee);
            let pos = node.start_position();
            self.edges.push(FunctionCallEdge {
                callee,
                caller: caller.to_string(),
                location: CallLocation {
                    line: pos.row as u32 + 1,
                    column: pos.column as u32,
                },
                resolution,
                import_source,
                file_path: None,
            });
        }
    }
}

/// Textual callee of a plain call: `name` or `object.property`.
///
/// Optional calls (`f?.()`, `a?.b()`) and tagged templates are not plain calls.
fn callee_name(call: Node<'_>, source: &str) -> Option<String> {
    if has_optional_chain(call) {
        return None;
    }
    if call
        .child_by_field_name("arguments")
        .is_some_and(|a| a.kind() == "template_string")
    {
        return None;
    }

    let function = unwrap_parens(call.child_by_field_name("function")?);
    match function.kind() {
        "identifier" => Some(node_text(function, source).to_string()),
        "member_expression" => {
            if has_optional_chain(function) {
                return None;
            }
            let object = unwrap_parens(function.child_by_field_name("object")?);
            let property = function.child_by_field_name("property")?;
            (object.kind() == "identifier" && property.kind() == "property_identifier").then(
                || {
                    format!(
                        "{}.{}",
                        node_text(object, source),
                        node_text(property, source)
                    )
                },
            )
        }
        _ => None,
    }
}

fn has_optional_chain(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| c.kind() == "optional_chain");
    found
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DepScopeError;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn pairs(edges: &[FunctionCallEdge]) -> Vec<(&str, &str)> {
        edges
            .iter()
            .map(|e| (e.caller.as_str(), e.callee.as_str()))
            .collect()
    }

    #[test]
    fn imported_call_carries_its_source() {
        let code = r#"
import { helper } from "./h";

function run() {
    helper();
}
"#;
        let edges = analyze(code).unwrap();
        assert_eq!(edges.len(), 1);
        let edge = &edges[0];
        assert_eq!(edge.caller, "run");
        assert_eq!(edge.callee, "helper");
        assert_eq!(edge.resolution, Resolution::Imported);
        assert_eq!(edge.import_source.as_deref(), Some("./h"));
    }

    #[test]
    fn imported_and_unknown_callees() {
        let code = r#"import { b } from "./b"; function run() { b(); helper(); }"#;
        let edges = analyze_with(code, Language::TypeScript).unwrap();
        assert_eq!(pairs(&edges), vec![("run", "b"), ("run", "helper")]);
        assert_eq!(edges[0].resolution, Resolution::Imported);
        assert_eq!(edges[1].resolution, Resolution::Unknown);
        assert_eq!(edges[1].import_source, None);
    }

    #[test]
    fn call_column_counts_bytes() {
        let code = "function f() { const s = \"\u{e9}\"; g(); }";
        let edges = analyze(code).unwrap();
        assert_eq!(edges[0].location, CallLocation { line: 1, column: 31 });
    }

    #[test]
    fn duplicate_calls_keep_first_site() {
        let code = "function caller() {\n  foo();\n  foo();\n}\n";
        let edges = analyze(code).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].location, CallLocation { line: 2, column: 2 });
    }

    #[test]
    fn same_callee_from_different_callers_is_kept() {
        let code = "function a() { log2(); }\nfunction b() { log2(); }";
        let edges = analyze(code).unwrap();
        assert_eq!(pairs(&edges), vec![("a", "log2"), ("b", "log2")]);
    }

    #[test_case("console.log('x')" ; "console member")]
    #[test_case("Math.max(1, 2)" ; "math member")]
    #[test_case("setTimeout(tick, 10)" ; "timer")]
    #[test_case("JSON.parse(raw)" ; "json")]
    #[test_case("document.getElementById('root')" ; "dom lookup")]
    #[test_case("useContext(Ctx)" ; "react hook on list")]
    fn built_ins_produce_no_edges(call: &str) {
        let code = format!("function f(tick, raw, Ctx) {{ {call}; }}");
        assert!(analyze(&code).unwrap().is_empty());
    }

    #[test]
    fn program_level_calls_are_ignored() {
        let code = "import { add } from './math';\nadd(1, 2);\nsetup();\n";
        assert!(analyze(code).unwrap().is_empty());
    }

    #[test]
    fn local_functions_resolve_regardless_of_order() {
        let code = "function a() { b(); }\nfunction b() {}";
        let edges = analyze(code).unwrap();
        assert_eq!(edges[0].resolution, Resolution::Local);
    }

    #[test]
    fn variable_bound_functions_are_callers_and_locals() {
        let code = r#"
const go = () => { step(); };
const step = function () { finish(); };
"#;
        let edges = analyze(code).unwrap();
        assert_eq!(pairs(&edges), vec![("go", "step"), ("step", "finish")]);
        assert_eq!(edges[0].resolution, Resolution::Local);
        assert_eq!(edges[1].resolution, Resolution::Unknown);
    }

    #[test]
    fn parenthesized_arrow_is_a_function() {
        let code = "const go = (async () => { step(); });";
        let edges = analyze(code).unwrap();
        assert_eq!(pairs(&edges), vec![("go", "step")]);
    }

    #[test]
    fn member_calls_on_identifiers_are_named() {
        let code = "function f() { api.get(); }";
        let edges = analyze(code).unwrap();
        assert_eq!(edges[0].callee, "api.get");
        assert_eq!(edges[0].resolution, Resolution::Unknown);
    }

    #[test_case("(foo)()", "foo" ; "parenthesized identifier")]
    #[test_case("((foo))()", "foo" ; "nested parentheses")]
    #[test_case("(api.get)()", "api.get" ; "parenthesized member")]
    #[test_case("(api).get()", "api.get" ; "parenthesized object")]
    fn parentheses_around_callee_are_ignored(call: &str, callee: &str) {
        let code = format!("function f() {{ {call}; }}");
        let edges = analyze_with(&code, Language::TypeScript).unwrap();
        assert_eq!(pairs(&edges), vec![("f", callee)]);
    }

    #[test_case("this.save()" ; "this receiver")]
    #[test_case("a.b.c()" ; "chained member")]
    #[test_case("handlers[key]()" ; "computed member")]
    #[test_case("a?.()" ; "optional call")]
    #[test_case("a?.b()" ; "optional member")]
    #[test_case("gql`query`" ; "tagged template")]
    #[test_case("new Widget()" ; "constructor")]
    fn unnamed_callee_shapes_are_skipped(call: &str) {
        let code = format!("function f(handlers, key, a) {{ {call}; }}");
        assert!(analyze(&code).unwrap().is_empty(), "{call} produced an edge");
    }

    #[test]
    fn call_result_callee_keeps_inner_call() {
        let code = "function f() { getHandler()(); }";
        let edges = analyze(code).unwrap();
        assert_eq!(pairs(&edges), vec![("f", "getHandler")]);
    }

    #[test]
    fn default_and_aliased_imports_are_bindings() {
        let code = r#"
import api, { fetchUser as loadUser } from "./api";
import * as ns from "./ns";

function f() {
    api();
    loadUser();
    ns.go();
}
"#;
        let edges = analyze(code).unwrap();
        assert_eq!(edges[0].resolution, Resolution::Imported);
        assert_eq!(edges[0].import_source.as_deref(), Some("./api"));
        assert_eq!(edges[1].callee, "loadUser");
        assert_eq!(edges[1].resolution, Resolution::Imported);
        assert_eq!(edges[2].callee, "ns.go");
        assert_eq!(edges[2].resolution, Resolution::Unknown);
    }

    #[test]
    fn nested_calls_are_attributed_to_every_enclosing_function() {
        let code = r#"
function outer() {
    function inner() {
        deep();
    }
    inner();
}
"#;
        let edges = analyze(code).unwrap();
        assert_eq!(
            pairs(&edges),
            vec![("outer", "deep"), ("outer", "inner"), ("inner", "deep")]
        );
        assert_eq!(edges[1].resolution, Resolution::Local);
    }

    #[test]
    fn callbacks_inside_a_function_belong_to_it() {
        let code = "function list(items) { items.forEach((x) => render(x)); }";
        let edges = analyze(code).unwrap();
        assert_eq!(pairs(&edges), vec![("list", "items.forEach"), ("list", "render")]);
    }

    #[test]
    fn anonymous_default_export_is_a_caller() {
        let code = "export default function () { work(); }";
        let edges = analyze(code).unwrap();
        assert_eq!(pairs(&edges), vec![(ANONYMOUS_CALLER, "work")]);
    }

    #[test]
    fn exported_declarations_are_callers() {
        let code = "export function run() { go(); }\nexport const go = () => {};";
        let edges = analyze(code).unwrap();
        assert_eq!(pairs(&edges), vec![("run", "go")]);
        assert_eq!(edges[0].resolution, Resolution::Local);
    }

    #[test]
    fn generator_functions_are_callers() {
        let code = "function* gen() { yield step(); }";
        let edges = analyze(code).unwrap();
        assert_eq!(pairs(&edges), vec![("gen", "step")]);
    }

    #[test]
    fn locals_shadow_imports() {
        let code = "import { x } from './x';\nfunction x() {}\nfunction f() { x(); }";
        let edges = analyze(code).unwrap();
        assert_eq!(edges[0].resolution, Resolution::Local);
        assert_eq!(edges[0].import_source, None);
    }

    #[test]
    fn jsx_callbacks_are_collected() {
        let code = r#"
export const Button = () => {
    return <button onClick={() => submit()}>{label()}</button>;
};
"#;
        let edges = analyze(code).unwrap();
        assert_eq!(pairs(&edges), vec![("Button", "submit"), ("Button", "label")]);
    }

    #[test]
    fn syntax_error_is_reported() {
        let err = analyze("function broken( {").unwrap_err();
        assert!(matches!(err, DepScopeError::Syntax { .. }));
    }

    #[test]
    fn symbols_collects_locals_and_imports() {
        let code = "import d, { n } from './m';\nfunction a() {}\nconst b = () => 1;\nconst c = 3;";
        let tree = CodeParser::new().parse(code, Language::TypeScript).unwrap();
        let symbols = FileSymbols::collect(tree.root_node(), code);
        let mut locals: Vec<&str> = symbols.local_functions.iter().map(String::as_str).collect();
        locals.sort_unstable();
        assert_eq!(locals, vec!["a", "b"]);
        assert_eq!(symbols.imported_functions.get("d").map(String::as_str), Some("./m"));
        assert_eq!(symbols.imported_functions.get("n").map(String::as_str), Some("./m"));
    }

    #[test]
    fn built_in_matching() {
        assert!(is_built_in("console"));
        assert!(is_built_in("console.log"));
        assert!(is_built_in("num.toString"));
        assert!(!is_built_in("helper"));
        assert!(!is_built_in("api.get"));
    }
}
