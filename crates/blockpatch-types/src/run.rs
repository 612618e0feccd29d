//! Styled text runs: the unit of text content carried by flat blocks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discriminator of a run. Only plain text runs exist today.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
    #[default]
    Text,
}

/// Style flags attached to a run.
///
/// The editor may emit style keys beyond the common ones (`textColor`,
/// `backgroundColor`, custom marks). Those are kept in `extra` so that a
/// change to them is still visible to the comparator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl TextStyles {
    /// Returns `true` if no style is set.
    pub fn is_plain(&self) -> bool {
        self.bold.is_none()
            && self.italic.is_none()
            && self.underline.is_none()
            && self.strikethrough.is_none()
            && self.code.is_none()
            && self.color.is_none()
            && self.extra.is_empty()
    }

    /// Decode a `styles` object without failing.
    ///
    /// Keys whose value does not fit the typed field (`"bold": "yes"`) are
    /// kept verbatim in `extra`. A non-object decodes as no styles.
    pub fn from_value_lossy(value: &Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };
        if let Ok(styles) = serde_json::from_value(value.clone()) {
            return styles;
        }

        let mut typed = serde_json::Map::new();
        let mut extra = BTreeMap::new();
        for (key, val) in map {
            let single = Value::Object(serde_json::Map::from_iter([(key.clone(), val.clone())]));
            if serde_json::from_value::<TextStyles>(single).is_ok() {
                typed.insert(key.clone(), val.clone());
            } else {
                extra.insert(key.clone(), val.clone());
            }
        }
        let mut styles: TextStyles =
            serde_json::from_value(Value::Object(typed)).unwrap_or_default();
        styles.extra.extend(extra);
        styles
    }

    /// Style with only `bold` set.
    pub fn bold() -> Self {
        Self {
            bold: Some(true),
            ..Default::default()
        }
    }

    /// Style with only `italic` set.
    pub fn italic() -> Self {
        Self {
            italic: Some(true),
            ..Default::default()
        }
    }
}

/// A contiguous span of text sharing one style set.
///
/// Serializes as `{ "type": "text", "text": ..., "styles": {...} }`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledRun {
    #[serde(rename = "type", default)]
    pub kind: RunKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub styles: TextStyles,
}

impl StyledRun {
    /// An unstyled text run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            kind: RunKind::Text,
            text: text.into(),
            styles: TextStyles::default(),
        }
    }

    /// A text run with the given styles.
    pub fn styled(text: impl Into<String>, styles: TextStyles) -> Self {
        Self {
            kind: RunKind::Text,
            text: text.into(),
            styles,
        }
    }
}

/// Concatenate the text of every run, ignoring styles.
pub fn plain_text(runs: &[StyledRun]) -> String {
    runs.iter().map(|r| r.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn run_serializes_with_text_tag() {
        let run = StyledRun::plain("Hello");
        let value = serde_json::to_value(&run).unwrap();
        assert_eq!(value, json!({"type": "text", "text": "Hello", "styles": {}}));
    }

    #[test]
    fn unknown_style_keys_are_preserved() {
        let styles: TextStyles =
            serde_json::from_value(json!({"bold": true, "textColor": "red"})).unwrap();
        assert_eq!(styles.bold, Some(true));
        assert_eq!(styles.extra.get("textColor"), Some(&json!("red")));
        assert!(!styles.is_plain());

        let back = serde_json::to_value(&styles).unwrap();
        assert_eq!(back, json!({"bold": true, "textColor": "red"}));
    }

    #[test]
    fn mistyped_style_values_move_to_extra() {
        let styles = TextStyles::from_value_lossy(&json!({"bold": "yes", "italic": true}));
        assert_eq!(styles.bold, None);
        assert_eq!(styles.italic, Some(true));
        assert_eq!(styles.extra.get("bold"), Some(&json!("yes")));

        assert!(TextStyles::from_value_lossy(&json!("bold")).is_plain());
        assert_eq!(
            TextStyles::from_value_lossy(&json!({"code": true})),
            TextStyles {
                code: Some(true),
                ..Default::default()
            }
        );
    }

    #[test]
    fn missing_styles_default_to_plain() {
        let run: StyledRun = serde_json::from_value(json!({"type": "text", "text": "x"})).unwrap();
        assert!(run.styles.is_plain());
    }

    #[test]
    fn plain_text_concatenates() {
        let runs = vec![
            StyledRun::plain("Hello, "),
            StyledRun::styled("world", TextStyles::bold()),
        ];
        assert_eq!(plain_text(&runs), "Hello, world");
        assert_eq!(plain_text(&[]), "");
    }
}
