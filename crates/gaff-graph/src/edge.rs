use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A directed edge between two nodes, normalized from whichever field-pair
/// dialect the caller used ({from,to}, {from_node,to_node}, {source,target}).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
  pub from: String,
  pub to: String,
}

impl Edge {
  pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
    Self {
      from: from.into(),
      to: to.into(),
    }
  }
}

impl<'de> Deserialize<'de> for Edge {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    struct EdgeVisitor;

    impl<'de> Visitor<'de> for EdgeVisitor {
      type Value = Edge;

      fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(
          "an edge object using one of {from,to}, {from_node,to_node} or {source,target}",
        )
      }

      fn visit_map<A>(self, mut map: A) -> Result<Edge, A::Error>
      where
        A: MapAccess<'de>,
      {
        let mut from = None;
        let mut to = None;
        while let Some(key) = map.next_key::<String>()? {
          match key.as_str() {
            "from" | "from_node" | "source" => from = Some(map.next_value::<String>()?),
            "to" | "to_node" | "target" => to = Some(map.next_value::<String>()?),
            _ => {
              let _ = map.next_value::<de::IgnoredAny>()?;
            }
          }
        }
        let from = from.ok_or_else(|| de::Error::missing_field("from"))?;
        let to = to.ok_or_else(|| de::Error::missing_field("to"))?;
        Ok(Edge { from, to })
      }
    }

    deserializer.deserialize_map(EdgeVisitor)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_from_to() {
    let e: Edge = serde_json::from_value(serde_json::json!({"from": "a", "to": "b"})).unwrap();
    assert_eq!(e, Edge::new("a", "b"));
  }

  #[test]
  fn accepts_from_node_to_node() {
    let e: Edge =
      serde_json::from_value(serde_json::json!({"from_node": "a", "to_node": "b"})).unwrap();
    assert_eq!(e, Edge::new("a", "b"));
  }

  #[test]
  fn accepts_source_target() {
    let e: Edge =
      serde_json::from_value(serde_json::json!({"source": "a", "target": "b"})).unwrap();
    assert_eq!(e, Edge::new("a", "b"));
  }

  #[test]
  fn missing_endpoint_is_error() {
    let result: Result<Edge, _> = serde_json::from_value(serde_json::json!({"from": "a"}));
    assert!(result.is_err());
  }
}
