//! Abstract test-plan class rendering.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use waymark_synth::naming::sanitize;
use waymark_synth::{NamedPlan, Step, Stub};

const INDENT: &str = "    ";

/// Presentation settings for the generated class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitOptions {
    /// Prepended to the sanitized model name to form the class name.
    pub class_prefix: String,
    /// Named in the header comment.
    pub strategy_name: String,
    /// Emitted as `import <path>;` lines, in order.
    pub imports: Vec<String>,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            class_prefix: "TestPlanForStateMachine".to_string(),
            strategy_name: "TransitionCorrectnessTestStrategy".to_string(),
            imports: vec![
                "org.eclipse.uml2.uml.*".to_string(),
                // Explicit so they win over java.lang.Package / java.lang.Class.
                "org.eclipse.uml2.uml.Package".to_string(),
                "org.eclipse.uml2.uml.Class".to_string(),
            ],
        }
    }
}

pub fn class_name(model_name: &str, options: &EmitOptions) -> String {
    format!("{}{}", options.class_prefix, sanitize(model_name))
}

/// Render one abstract class declaring every stub followed by every plan.
///
/// Stubs and plans are written in the order given; callers pass the
/// registry snapshot and the path-ordered plan list.
pub fn render_class(
    model_name: &str,
    stubs: &[Arc<Stub>],
    plans: &[NamedPlan],
    options: &EmitOptions,
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "/* Generated by {} from state diagram {} */\n\n",
        options.strategy_name,
        comment_safe(model_name)
    ));
    for import in &options.imports {
        out.push_str(&format!("import {import};\n"));
    }
    if !options.imports.is_empty() {
        out.push('\n');
    }

    out.push_str(&format!(
        "public abstract class {} {{\n",
        class_name(model_name, options)
    ));

    for stub in stubs {
        out.push('\n');
        render_stub(&mut out, stub);
    }
    for plan in plans {
        out.push('\n');
        render_plan(&mut out, plan);
    }

    out.push_str("}\n");
    out
}

fn render_stub(out: &mut String, stub: &Stub) {
    out.push_str(&format!("{INDENT}/**\n"));
    out.push_str(&format!(
        "{INDENT} * {}\n",
        comment_safe(&stub.documentation)
    ));
    out.push_str(&format!("{INDENT} */\n"));
    out.push_str(&format!(
        "{INDENT}public abstract boolean {}(Object... arguments);\n",
        stub.name
    ));
}

fn render_plan(out: &mut String, plan: &NamedPlan) {
    out.push_str(&format!("{INDENT}public void {}() {{\n", plan.name));
    for step in &plan.plan.steps {
        match step {
            Step::Assert(name) => {
                out.push_str(&format!("{INDENT}{INDENT}assert {name}();\n"));
            }
            Step::Call(name) => {
                out.push_str(&format!("{INDENT}{INDENT}{name}();\n"));
            }
        }
    }
    out.push_str(&format!("{INDENT}}}\n"));
}

/// Keep free text from terminating the surrounding comment.
fn comment_safe(text: &str) -> String {
    text.replace("*/", "* /").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_name_is_sanitized() {
        let options = EmitOptions::default();
        assert_eq!(
            class_name("Vending Machine", &options),
            "TestPlanForStateMachineVending_Machine"
        );
    }

    #[test]
    fn test_comment_safe() {
        assert_eq!(comment_safe("a */ b\nc"), "a * / b c");
    }

    #[test]
    fn test_empty_class_without_imports() {
        let options = EmitOptions {
            imports: vec![],
            ..EmitOptions::default()
        };
        let text = render_class("M", &[], &[], &options);
        assert_eq!(
            text,
            "/* Generated by TransitionCorrectnessTestStrategy from state diagram M */\n\n\
             public abstract class TestPlanForStateMachineM {\n}\n"
        );
    }
}
