use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]+)\}").expect("token pattern is valid"));

/// Replace `{name}` tokens from the variable bindings, then the step results.
///
/// Single pass: text inserted by a replacement is not rescanned. A name
/// bound in both maps takes the variable. String variables are inserted
/// verbatim, every other value as JSON. Unknown tokens stay as they are.
pub fn substitute(text: &str, variables: &Map<String, Value>, results: &Map<String, Value>) -> String {
    TOKEN
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            match variables.get(name) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => match results.get(name) {
                    Some(result) => result.to_string(),
                    None => caps[0].to_string(),
                },
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn replaces_variables_and_results() {
        let vars = map(json!({"topic": "rust", "keywords": ["a", "b"]}));
        let results = map(json!({"research": {"content": "notes"}}));
        let out = substitute("Write about {topic} with {keywords} using {research}", &vars, &results);
        assert_eq!(
            out,
            r#"Write about rust with ["a","b"] using {"content":"notes"}"#
        );
    }

    #[test]
    fn variables_win_over_results() {
        let vars = map(json!({"x": "var"}));
        let results = map(json!({"x": "result"}));
        assert_eq!(substitute("{x}", &vars, &results), "var");
    }

    #[test]
    fn unknown_tokens_are_left_alone() {
        let out = substitute("keep {missing} here", &Map::new(), &Map::new());
        assert_eq!(out, "keep {missing} here");
    }

    #[test]
    fn no_bound_token_survives() {
        let vars = map(json!({
            "a": "1",
            "b-c": 2,
            "d_e": null,
            "user.name": "Ada",
            "target audience": "founders",
            "café": "open",
        }));
        let results = map(json!({"step-1": {"ok": true}, "f": "x", "step:1": "done"}));
        let text = "{a}{a} {b-c} {d_e} {step-1} {f} {{a}} tail \
                    Hi {user.name} / {target audience} / {café} / {step:1}";
        let out = substitute(text, &vars, &results);
        for name in vars.keys().chain(results.keys()) {
            assert!(!out.contains(&format!("{{{}}}", name)), "{} left in {}", name, out);
        }
        assert!(out.ends_with("Hi Ada / founders / open / \"done\""), "{}", out);
    }

    #[test]
    fn repeated_tokens_are_all_replaced() {
        let vars = map(json!({"n": "x"}));
        assert_eq!(substitute("{n}-{n}-{n}", &vars, &Map::new()), "x-x-x");
    }
}
