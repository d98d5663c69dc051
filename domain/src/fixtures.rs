//! Non-persisted records injected at startup: the fixed viewer and the widgets.

use serde::Deserialize;

use crate::{CoreError, Widget};

/// Fixed viewer and static widget list.
///
/// The viewer is an alias for the parent with `viewer_id`; widgets only live
/// in memory and are rebuilt every process start.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixtures {
    #[serde(default = "default_viewer_id")]
    pub viewer_id: String,
    #[serde(default = "default_widgets")]
    pub widgets: Vec<Widget>,
}

fn default_viewer_id() -> String {
    "1".into()
}

fn default_widgets() -> Vec<Widget> {
    ["What's-it", "Who's-it", "How's-it"]
        .iter()
        .enumerate()
        .map(|(i, name)| Widget {
            id: i.to_string(),
            name: (*name).to_string(),
        })
        .collect()
}

impl Fixtures {
    /// Parse fixtures from JSON, e.g. `{"viewerId": "7", "widgets": [...]}`.
    /// Missing keys fall back to the defaults.
    pub fn from_json(s: &str) -> Result<Self, CoreError> {
        serde_json::from_str(s).map_err(|e| CoreError::InvalidFixtures(e.to_string()))
    }
}

impl Default for Fixtures {
    fn default() -> Self {
        Self {
            viewer_id: default_viewer_id(),
            widgets: default_widgets(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_widgets_are_ordered() {
        let f = Fixtures::default();
        assert_eq!(f.viewer_id, "1");
        let names: Vec<_> = f.widgets.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, ["What's-it", "Who's-it", "How's-it"]);
        assert_eq!(f.widgets[2].id, "2");
    }

    #[test]
    fn from_json_overrides_and_defaults() {
        let f = Fixtures::from_json(r#"{"viewerId":"p9"}"#).unwrap();
        assert_eq!(f.viewer_id, "p9");
        assert_eq!(f.widgets.len(), 3);

        let f = Fixtures::from_json(r#"{"widgets":[{"id":"a","name":"Gizmo"}]}"#).unwrap();
        assert_eq!(f.viewer_id, "1");
        assert_eq!(f.widgets, vec![Widget { id: "a".into(), name: "Gizmo".into() }]);
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(matches!(
            Fixtures::from_json("not json"),
            Err(CoreError::InvalidFixtures(_))
        ));
    }
}
