//! Canonical stub names.
//!
//! Every name is a pure function of the stub kind and its raw identifier, so
//! the same guard, state or trigger always maps onto the same registry key.

pub const ASSERT_STATE_PREFIX: &str = "currentStateIs_";
pub const ASSERT_GUARD_PREFIX: &str = "conditionIsTrue_";
pub const FORCE_GUARD_PREFIX: &str = "setToTrue_";
pub const INVOKE_PREFIX: &str = "invoke_";
pub const GENERATE_EVENT_PREFIX: &str = "generateEvent_";
pub const PLAN_PREFIX: &str = "testPlan_";

/// Identifier used for the synthetic start state.
pub const INITIAL_STATE_NAME: &str = "InitialState";

/// Symbol to word table. Multi-character operators come first so `>=` is
/// never read as `>` followed by `=`.
const MATH_SYMBOLS: &[(&str, &str)] = &[
    ("==", "equals"),
    ("!=", "not_equals"),
    (">=", "greater_or_equal"),
    ("<=", "less_or_equal"),
    ("&&", "and"),
    ("||", "or"),
    ("\u{2265}", "greater_or_equal"),
    ("\u{2264}", "less_or_equal"),
    ("\u{2260}", "not_equals"),
    ("\u{2227}", "and"),
    ("\u{2228}", "or"),
    ("\u{00ac}", "not"),
    (">", "greater_than"),
    ("<", "less_than"),
    ("=", "equals"),
    ("!", "not"),
    ("+", "plus"),
    ("-", "minus"),
    ("*", "times"),
    ("/", "divided_by"),
    ("%", "modulo"),
];

/// Replace recognized math symbols with words, separated from their
/// neighbours by a single space.
pub fn convert_math_symbols(input: &str) -> String {
    let mut out = String::with_capacity(input.len() * 2);
    let mut rest = input;
    'scan: while let Some(c) = rest.chars().next() {
        for (symbol, word) in MATH_SYMBOLS {
            if let Some(tail) = rest.strip_prefix(symbol) {
                if !out.is_empty() && !out.ends_with(char::is_whitespace) {
                    out.push(' ');
                }
                out.push_str(word);
                if !tail.is_empty() && !tail.starts_with(char::is_whitespace) {
                    out.push(' ');
                }
                rest = tail;
                continue 'scan;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Turn free-form text into an identifier fragment: math symbols become
/// words, then every character outside `[A-Za-z0-9_]` becomes `_`.
pub fn sanitize(input: &str) -> String {
    convert_math_symbols(input)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Uppercase the first character.
pub fn capitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn state_assertion_name(state_name: &str, is_initial: bool) -> String {
    if is_initial {
        format!("{ASSERT_STATE_PREFIX}{INITIAL_STATE_NAME}")
    } else {
        format!("{ASSERT_STATE_PREFIX}{}", sanitize(state_name))
    }
}

pub fn guard_assertion_name(body: &str) -> String {
    format!("{ASSERT_GUARD_PREFIX}{}", capitalize(&sanitize(body)))
}

pub fn guard_force_name(body: &str) -> String {
    format!("{FORCE_GUARD_PREFIX}{}", capitalize(&sanitize(body)))
}

pub fn call_event_name(class_name: &str, operation_name: &str) -> String {
    format!("{}_{}", sanitize(class_name), sanitize(operation_name))
}

/// Shared by change and time events: `<event>_<expression>`.
pub fn expression_event_name(event_name: &str, expression: &str) -> String {
    format!("{}_{}", sanitize(event_name), sanitize(expression))
}

/// Used when a change or time event carries no expression.
pub fn generated_event_name(event_name: &str) -> String {
    format!("{GENERATE_EVENT_PREFIX}{}", sanitize(event_name))
}

pub fn other_event_name(event_name: &str) -> String {
    format!("{INVOKE_PREFIX}{}", sanitize(event_name))
}

/// Display name of the `index`-th plan (1-based).
pub fn plan_name(index: usize) -> String {
    format!("{PLAN_PREFIX}{index}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_non_alphanumerics() {
        assert_eq!(sanitize("tray.items"), "tray_items");
        assert_eq!(sanitize("Waiting Room"), "Waiting_Room");
        assert_eq!(sanitize("already_ok_1"), "already_ok_1");
    }

    #[test]
    fn test_math_symbols_become_words() {
        assert_eq!(sanitize("stock > 0"), "stock_greater_than_0");
        assert_eq!(sanitize("stock>0"), "stock_greater_than_0");
        assert_eq!(sanitize("a>=b"), "a_greater_or_equal_b");
        assert_eq!(sanitize("x == y && !z"), "x_equals_y_and_not_z");
        assert_eq!(sanitize("n \u{2264} 3"), "n_less_or_equal_3");
    }

    #[test]
    fn test_non_ascii_letters_are_replaced() {
        assert_eq!(sanitize("caf\u{e9}"), "caf_");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("g1"), "G1");
        assert_eq!(capitalize("_x"), "_x");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_state_names() {
        assert_eq!(state_assertion_name("Idle", false), "currentStateIs_Idle");
        assert_eq!(
            state_assertion_name("Anything", true),
            "currentStateIs_InitialState"
        );
    }

    #[test]
    fn test_guard_names() {
        assert_eq!(guard_assertion_name("g1"), "conditionIsTrue_G1");
        assert_eq!(guard_force_name("g1"), "setToTrue_G1");
        assert_eq!(
            guard_force_name("stock > 0"),
            "setToTrue_Stock_greater_than_0"
        );
    }

    #[test]
    fn test_trigger_names() {
        assert_eq!(call_event_name("Machine", "insert coin"), "Machine_insert_coin");
        assert_eq!(
            expression_event_name("timeout", "after 30s"),
            "timeout_after_30s"
        );
        assert_eq!(generated_event_name("tick"), "generateEvent_tick");
        assert_eq!(other_event_name("ping!"), "invoke_ping_not");
    }

    #[test]
    fn test_plan_name() {
        assert_eq!(plan_name(3), "testPlan_3");
    }
}
