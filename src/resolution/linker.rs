//! Coarse cross-file function dependencies.
//!
//! Every top-level function declaration in the project is recorded by name
//! (later declarations overwrite earlier ones). Then every top-level statement
//! of the form `name(...)` whose `name` is in that map is reported as a
//! dependency of the calling file on that function. Only direct children of
//! the program count: exported declarations and calls inside functions are
//! not considered, and `caller` equals `callee`.

use std::collections::HashMap;

use tracing::debug;
use tree_sitter::Node;

use crate::indexer::parser::{named_children, node_text};
use crate::types::{FunctionDependency, FunctionSite, ProjectNode};

/// Link top-level calls to top-level declarations across all parsed files.
pub fn link_dependencies(tree: &ProjectNode) -> Vec<FunctionDependency> {
    let declarations = collect_declarations(tree);

    let mut dependencies = Vec::new();
    for file in tree.files() {
        let Some((syntax, source)) = file.parsed() else {
            continue;
        };
        for statement in named_children(syntax.root_node()) {
            let Some(name) = top_level_call(statement, source) else {
                continue;
            };
            if let Some(site) = declarations.get(name) {
                dependencies.push(FunctionDependency {
                    caller: name.to_string(),
                    callee: name.to_string(),
                    file: file.path.clone(),
                    declared_in: site.clone(),
                });
            }
        }
    }

    debug!(
        declarations = declarations.len(),
        dependencies = dependencies.len(),
        "linked cross-file dependencies"
    );
    dependencies
}

/// Top-level declaration name -> the file that declares it. Last one wins.
pub fn collect_declarations(tree: &ProjectNode) -> HashMap<String, FunctionSite> {
    let mut map = HashMap::new();
    for file in tree.files() {
        let Some((syntax, source)) = file.parsed() else {
            continue;
        };
        for node in named_children(syntax.root_node()) {
            if !matches!(
                node.kind(),
                "function_declaration" | "generator_function_declaration"
            ) {
                continue;
            }
            if let Some(name) = node.child_by_field_name("name") {
                map.insert(
                    node_text(name, source).to_string(),
                    FunctionSite {
                        file_path: file.path.clone(),
                        file_id: file.id.clone(),
                    },
                );
            }
        }
    }
    map
}

/// `name(...);` as a statement: the callee name.
fn top_level_call<'s>(statement: Node<'_>, source: &'s str) -> Option<&'s str> {
    if statement.kind() != "expression_statement" {
        return None;
    }
    let call = named_children(statement).into_iter().next()?;
    if call.kind() != "call_expression" {
        return None;
    }
    if call
        .child_by_field_name("arguments")
        .is_some_and(|a| a.kind() == "template_string")
    {
        return None;
    }
    let function = call.child_by_field_name("function")?;
    (function.kind() == "identifier").then(|| node_text(function, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::parser::CodeParser;
    use crate::types::Language;
    use pretty_assertions::assert_eq;

    fn parsed_file(path: &str, source: &str) -> ProjectNode {
        let name = path.rsplit('/').next().unwrap_or(path);
        let tree = CodeParser::new()
            .parse(source, Language::TypeScript)
            .unwrap();
        ProjectNode::file(name, path).with_source(
            Language::TypeScript,
            source.to_string(),
            Some(tree),
        )
    }

    fn project(files: Vec<ProjectNode>) -> ProjectNode {
        ProjectNode::dir("", "", files)
    }

    #[test]
    fn top_level_call_links_to_declaration_in_other_file() {
        let tree = project(vec![
            parsed_file("a.ts", "import { b } from './b';\nb();"),
            parsed_file("b.ts", "export function b() {}\nfunction b2() {}"),
            parsed_file("c.ts", "b2();"),
        ]);
        let deps = link_dependencies(&tree);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].caller, "b2");
        assert_eq!(deps[0].callee, "b2");
        assert_eq!(deps[0].file, "c.ts");
        assert_eq!(deps[0].declared_in.file_path, "b.ts");
    }

    #[test]
    fn exported_declarations_are_not_collected() {
        let tree = project(vec![parsed_file("b.ts", "export function b() {}\nb();")]);
        assert!(link_dependencies(&tree).is_empty());
    }

    #[test]
    fn calls_inside_functions_are_ignored() {
        let tree = project(vec![parsed_file(
            "x.ts",
            "function init() {}\nfunction main() { init(); }",
        )]);
        assert!(link_dependencies(&tree).is_empty());
    }

    #[test]
    fn same_file_calls_are_reported() {
        let tree = project(vec![parsed_file("x.ts", "function init() {}\ninit();")]);
        let deps = link_dependencies(&tree);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].file, "x.ts");
        assert_eq!(deps[0].declared_in.file_id, tree.children[0].id);
    }

    #[test]
    fn last_declaration_wins() {
        let tree = project(vec![
            parsed_file("one.ts", "function setup() {}"),
            ProjectNode::dir(
                "lib",
                "lib",
                vec![parsed_file("lib/two.ts", "function setup() {}")],
            ),
            parsed_file("main.ts", "setup();"),
        ]);
        let deps = link_dependencies(&tree);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].declared_in.file_path, "lib/two.ts");
    }

    #[test]
    fn member_and_unknown_calls_are_ignored() {
        let tree = project(vec![parsed_file(
            "x.ts",
            "function run() {}\nconsole.log(1);\nother();\nrun.call(null);",
        )]);
        assert!(link_dependencies(&tree).is_empty());
    }

    #[test]
    fn unparsed_files_are_skipped() {
        let unparsed = ProjectNode::file("y.ts", "y.ts").with_source(
            Language::TypeScript,
            "function y() {}".into(),
            None,
        );
        let tree = project(vec![unparsed, parsed_file("z.ts", "y();")]);
        assert!(link_dependencies(&tree).is_empty());
    }
}
