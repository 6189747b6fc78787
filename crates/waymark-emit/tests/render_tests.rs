use std::sync::Arc;

use waymark_emit::{render_class, render_manifest, EmitOptions, Manifest};
use waymark_model::graph::{StateGraph, Transition, Trigger};
use waymark_synth::expand::{expand, ExpandOptions};
use waymark_synth::{DiagnosticCollector, GenerationContext, NamedPlan, Stub};

fn turnstile() -> (Vec<Arc<Stub>>, Vec<NamedPlan>) {
    let mut g = StateGraph::new("Turnstile");
    let init = g.add_initial_state("Initial");
    let locked = g.add_state("Locked");
    let open = g.add_final_state("Open");
    let broken = g.add_final_state("Broken");
    g.add_transition(init, Transition::to(locked));
    g.add_transition(
        locked,
        Transition::to(open)
            .guard("coins >= 1")
            .trigger(Trigger::call("Turnstile", "push")),
    );
    g.add_transition(locked, Transition::to(broken).guard("kicked"));

    let collector = DiagnosticCollector::new();
    let ctx = GenerationContext::new(&collector);
    expand(&g, &ctx, ExpandOptions::default()).unwrap();
    ctx.finish()
}

#[test]
fn test_render_full_class() {
    let (stubs, plans) = turnstile();
    let text = render_class("Turnstile", &stubs, &plans, &EmitOptions::default());

    let expected = "\
/* Generated by TransitionCorrectnessTestStrategy from state diagram Turnstile */

import org.eclipse.uml2.uml.*;
import org.eclipse.uml2.uml.Package;
import org.eclipse.uml2.uml.Class;

public abstract class TestPlanForStateMachineTurnstile {

    /**
     * Must return true if the current state is Broken.
     */
    public abstract boolean currentStateIs_Broken(Object... arguments);

    /**
     * Must return true if the current state is InitialState.
     */
    public abstract boolean currentStateIs_InitialState(Object... arguments);

    /**
     * Must return true if the current state is Locked.
     */
    public abstract boolean currentStateIs_Locked(Object... arguments);

    /**
     * Must return true if the current state is Open.
     */
    public abstract boolean currentStateIs_Open(Object... arguments);

    /**
     * Must drive the tested system until the following condition holds, so the test can progress on the current branch: coins >= 1
     */
    public abstract boolean setToTrue_Coins_greater_or_equal_1(Object... arguments);

    /**
     * Must drive the tested system until the following condition holds, so the test can progress on the current branch: kicked
     */
    public abstract boolean setToTrue_Kicked(Object... arguments);

    /**
     * Must return true once operation \"push\" has been invoked and completed on class \"Turnstile\", so the following transition can be asserted.
     */
    public abstract boolean Turnstile_push(Object... arguments);

    public void testPlan_1() {
        assert currentStateIs_InitialState();
        assert currentStateIs_Locked();
        setToTrue_Coins_greater_or_equal_1();
        Turnstile_push();
        assert currentStateIs_Open();
    }

    public void testPlan_2() {
        assert currentStateIs_InitialState();
        assert currentStateIs_Locked();
        setToTrue_Kicked();
        assert currentStateIs_Broken();
    }
}
";
    assert_eq!(text, expected);
}

#[test]
fn test_custom_prefix_and_strategy() {
    let (stubs, plans) = turnstile();
    let options = EmitOptions {
        class_prefix: "Abstract".to_string(),
        strategy_name: "MyStrategy".to_string(),
        imports: vec!["com.example.Sut".to_string()],
    };
    let text = render_class("Turn stile", &stubs, &plans, &options);
    assert!(text.starts_with("/* Generated by MyStrategy from state diagram Turn stile */"));
    assert!(text.contains("import com.example.Sut;\n"));
    assert!(text.contains("public abstract class AbstractTurn_stile {"));
}

#[test]
fn test_manifest_matches_plans() {
    let (stubs, plans) = turnstile();
    let json = render_manifest("Turnstile", &stubs, &plans).unwrap();
    let manifest: Manifest = serde_json::from_str(&json).unwrap();

    assert_eq!(manifest.model, "Turnstile");
    assert_eq!(manifest.stubs.len(), stubs.len());
    assert_eq!(manifest.plans.len(), 2);
    assert_eq!(manifest.plans[0].name, "testPlan_1");
    assert_eq!(manifest.plans[0].path, vec![0]);
    assert_eq!(manifest.plans[1].path, vec![1]);
    assert_eq!(manifest.plans[0].transitions, vec![0, 1]);
    assert!(manifest
        .stubs
        .iter()
        .any(|s| s.name == "Turnstile_push" && s.kind == "invoke_trigger"));
}
