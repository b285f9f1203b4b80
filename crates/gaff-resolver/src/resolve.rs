use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static WHOLE_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\$\{([^}]+)\}$").unwrap());
static EMBEDDED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

/// Expand `${...}` references in a node's input map.
///
/// `results` maps node_id to that node's already-produced output; `context`
/// is the execution's mutable context map. A reference that cannot be
/// resolved — its node hasn't run, its path doesn't exist, its context key
/// is absent — is left as the literal `${...}` text rather than erroring;
/// resolution never fails and never reads or writes state itself.
pub fn resolve(
  inputs: &HashMap<String, Value>,
  results: &HashMap<String, Value>,
  context: &HashMap<String, Value>,
) -> HashMap<String, Value> {
  inputs
    .iter()
    .map(|(key, value)| (key.clone(), resolve_value(value, results, context)))
    .collect()
}

fn resolve_value(value: &Value, results: &HashMap<String, Value>, context: &HashMap<String, Value>) -> Value {
  match value {
    Value::String(s) => resolve_string(s, results, context),
    Value::Array(items) => Value::Array(
      items
        .iter()
        .map(|item| resolve_value(item, results, context))
        .collect(),
    ),
    Value::Object(map) => Value::Object(
      map
        .iter()
        .map(|(k, v)| (k.clone(), resolve_value(v, results, context)))
        .collect(),
    ),
    other => other.clone(),
  }
}

fn resolve_string(s: &str, results: &HashMap<String, Value>, context: &HashMap<String, Value>) -> Value {
  if let Some(caps) = WHOLE_VALUE.captures(s) {
    let path = &caps[1];
    return match lookup(path, results, context) {
      Some(value) => value,
      None => Value::String(s.to_string()),
    };
  }

  let replaced = EMBEDDED.replace_all(s, |caps: &regex::Captures| {
    let path = &caps[1];
    match lookup(path, results, context) {
      Some(Value::String(text)) => text,
      Some(other) => serde_json::to_string(&other).unwrap_or_default(),
      None => caps[0].to_string(),
    }
  });

  Value::String(replaced.into_owned())
}

/// Resolve a single `node.path.to.field` or `context_key` reference.
///
/// 1. If the first segment names a completed node, descend through its
///    result by the remaining path.
/// 2. Else if the whole path is a single segment naming a context key,
///    substitute its value.
/// 3. Else the reference is unresolved.
fn lookup(path: &str, results: &HashMap<String, Value>, context: &HashMap<String, Value>) -> Option<Value> {
  let mut segments = path.split('.');
  let head = segments.next()?;

  if let Some(root) = results.get(head) {
    let rest: Vec<&str> = segments.collect();
    return descend(root, &rest).cloned();
  }

  if !path.contains('.') {
    if let Some(value) = context.get(path) {
      return Some(value.clone());
    }
  }

  None
}

fn descend<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
  let mut current = value;
  for segment in path {
    current = match current {
      Value::Object(map) => map.get(*segment)?,
      Value::Array(items) => {
        let index: usize = segment.parse().ok()?;
        items.get(index)?
      }
      _ => return None,
    };
  }
  Some(current)
}
