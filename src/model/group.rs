use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Id of the group that always exists and can never be deleted.
pub const DEFAULT_GROUP_ID: &str = "default";

/// A named bucket of todos
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    /// CSS color string, e.g. `hsl(210, 70%, 50%)`. Absent in some older
    /// documents, and left absent on save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Fields this version doesn't know about, kept for the next write
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl Group {
    pub fn new(id: String, name: String, color: String) -> Self {
        Group {
            id,
            name,
            color: Some(color),
            icon: None,
            extra: IndexMap::new(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_GROUP_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_color_stays_missing() {
        let raw = r#"{"id":"default","name":"Daily","icon":"sun"}"#;
        let group: Group = serde_json::from_str(raw).unwrap();
        assert_eq!(group.color, None);
        assert_eq!(serde_json::to_string(&group).unwrap(), raw);
    }

    #[test]
    fn new_group_has_color() {
        let group = Group::new("g1".into(), "Work".into(), "hsl(10, 70%, 50%)".into());
        let json = serde_json::to_value(&group).unwrap();
        assert_eq!(json["color"], "hsl(10, 70%, 50%)");
        assert!(!group.is_default());
    }
}
