use waymark_model::graph::{StateGraph, Trigger};
use waymark_model::parse::parse_model;
use waymark_model::validate::{validate_graph, ModelError};

#[test]
fn test_parse_fixture_into_graph() {
    let json = include_str!("fixtures/vending_machine.json");
    let doc = parse_model(json).unwrap();
    assert_eq!(doc.name, "VendingMachine");
    assert_eq!(doc.states.len(), 5);

    let graph = StateGraph::from_document(&doc).unwrap();
    assert!(validate_graph(&graph).is_ok());
    assert_eq!(graph.state_count(), 5);
    assert_eq!(graph.transition_count(), 5);

    let paid = graph.find_state("Paid").unwrap();
    assert_eq!(graph.state(paid).unwrap().outgoing.len(), 2);

    let off = graph.find_state("Off").unwrap();
    assert!(graph.state(off).unwrap().is_final);

    let initial = graph.initial().unwrap();
    assert_eq!(graph.state(initial).unwrap().name, "Initial");
}

#[test]
fn test_trigger_kinds_are_mapped() {
    let json = include_str!("fixtures/vending_machine.json");
    let graph = StateGraph::from_document(&parse_model(json).unwrap()).unwrap();

    let triggers: Vec<&Trigger> = graph
        .transitions()
        .flat_map(|(_, t)| t.triggers.iter())
        .collect();
    assert!(triggers.contains(&&Trigger::call("Machine", "insertCoin")));
    assert!(triggers.contains(&&Trigger::time("timeout", "after 30s")));
    assert!(triggers.contains(&&Trigger::change("trayEmpty", "tray.items == 0")));
}

#[test]
fn test_unknown_kind_becomes_other() {
    let json = r#"{
        "name": "m",
        "states": [
            { "name": "I", "initial": true, "transitions": [
                { "target": "F", "triggers": [ { "kind": "signal", "event_name": "ping" } ] }
            ] },
            { "name": "F", "final": true }
        ]
    }"#;
    let graph = StateGraph::from_document(&parse_model(json).unwrap()).unwrap();
    let (_, t) = graph.transitions().next().unwrap();
    assert_eq!(
        t.triggers[0],
        Trigger::Other {
            event_name: "ping".to_string(),
            kind: "signal".to_string()
        }
    );
}

#[test]
fn test_unknown_target_name_is_rejected() {
    let json = r#"{
        "name": "m",
        "states": [
            { "name": "I", "initial": true, "transitions": [ { "target": "Nowhere" } ] }
        ]
    }"#;
    let errors = StateGraph::from_document(&parse_model(json).unwrap()).unwrap_err();
    assert_eq!(
        errors,
        vec![ModelError::UnknownTarget {
            state: "I".to_string(),
            transition: "I#0".to_string(),
            target: "Nowhere".to_string(),
        }]
    );
}

#[test]
fn test_call_trigger_requires_operation() {
    let json = r#"{
        "name": "m",
        "states": [
            { "name": "I", "initial": true, "transitions": [
                { "name": "go", "target": "F", "triggers": [ { "kind": "call", "class_name": "C" } ] }
            ] },
            { "name": "F", "final": true }
        ]
    }"#;
    let errors = StateGraph::from_document(&parse_model(json).unwrap()).unwrap_err();
    assert!(matches!(
        &errors[0],
        ModelError::IncompleteTrigger { field: "operation_name", .. }
    ));
}

#[test]
fn test_parse_invalid_json() {
    assert!(parse_model("not json at all").is_err());
}

#[test]
fn test_initial_state_can_also_be_final() {
    let json = r#"{
        "name": "Trivial",
        "states": [ { "name": "Only", "initial": true, "final": true } ]
    }"#;
    let graph = StateGraph::from_document(&parse_model(json).unwrap()).unwrap();
    let only = graph.initial().unwrap();
    let state = graph.state(only).unwrap();
    assert!(state.is_initial);
    assert!(state.is_final);
    assert!(validate_graph(&graph).is_ok());
}
