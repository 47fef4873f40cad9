//! Selector choices
//!
//! Turns an ordered record list into an ordered [`ChoiceList`]. Order is
//! significant: the first choice is the fallback selection.
//!
//! # Labels
//! - [`primary_label`]: `code`, else `name`, else `"{Type} {id}"`
//! - [`LabelMarker`]: fixed annotation added to labels of special records
//!   (templates) and stripped again before selection matching

use serde::{Deserialize, Serialize};

/// Secondary display hint of a choice
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceHint {
    /// Icon / thumbnail URL
    pub icon: Option<String>,
    /// Subtitle line
    pub subtitle: Option<String>,
}

impl ChoiceHint {
    /// Hint with a subtitle only
    #[inline]
    #[must_use]
    pub fn subtitle(subtitle: impl Into<String>) -> Self {
        Self {
            icon: None,
            subtitle: Some(subtitle.into()),
        }
    }

    /// Set icon
    #[inline]
    #[must_use]
    pub fn with_icon(mut self, icon: Option<String>) -> Self {
        self.icon = icon.filter(|i| !i.is_empty());
        self
    }
}

/// One selectable option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice<P> {
    /// Display label
    pub label: String,
    /// Data carried by the option
    pub payload: P,
    /// Optional icon / subtitle
    pub hint: Option<ChoiceHint>,
}

impl<P> Choice<P> {
    /// Create choice without hint
    #[inline]
    #[must_use]
    pub fn new(label: impl Into<String>, payload: P) -> Self {
        Self {
            label: label.into(),
            payload,
            hint: None,
        }
    }

    /// Attach a hint
    #[inline]
    #[must_use]
    pub fn with_hint(mut self, hint: ChoiceHint) -> Self {
        self.hint = Some(hint);
        self
    }
}

/// Ordered choices of one selector
///
/// Labels need not be unique; lookups by label return the first match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceList<P> {
    choices: Vec<Choice<P>>,
}

impl<P> Default for ChoiceList<P> {
    fn default() -> Self {
        Self {
            choices: Vec::new(),
        }
    }
}

impl<P> ChoiceList<P> {
    /// Create empty list
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a choice
    pub fn push(&mut self, choice: Choice<P>) {
        self.choices.push(choice);
    }

    /// Display labels in order
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.choices.iter().map(|c| c.label.clone()).collect()
    }

    /// First choice with exactly this label
    #[must_use]
    pub fn find(&self, label: &str) -> Option<&Choice<P>> {
        self.choices.iter().find(|c| c.label == label)
    }

    /// Choice at position
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Choice<P>> {
        self.choices.get(index)
    }

    /// First choice
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&Choice<P>> {
        self.choices.first()
    }

    /// Iterate in order
    pub fn iter(&self) -> std::slice::Iter<'_, Choice<P>> {
        self.choices.iter()
    }

    /// Number of choices
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.choices.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// Split into choices and their labels
    #[must_use]
    pub fn into_parts(self) -> (Vec<Choice<P>>, Vec<String>) {
        let labels = self.labels();
        (self.choices, labels)
    }
}

impl<P> FromIterator<Choice<P>> for ChoiceList<P> {
    fn from_iter<I: IntoIterator<Item = Choice<P>>>(iter: I) -> Self {
        Self {
            choices: iter.into_iter().collect(),
        }
    }
}

impl<'a, P> IntoIterator for &'a ChoiceList<P> {
    type Item = &'a Choice<P>;
    type IntoIter = std::slice::Iter<'a, Choice<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.choices.iter()
    }
}

/// Build choices from records, one per record, in record order
pub fn build_choices<R, P>(
    records: &[R],
    label_of: impl Fn(&R) -> String,
    payload_of: impl Fn(&R) -> P,
) -> ChoiceList<P> {
    records
        .iter()
        .map(|r| Choice::new(label_of(r), payload_of(r)))
        .collect()
}

/// Build choices with per-record hints
pub fn build_choices_with_hints<R, P>(
    records: &[R],
    label_of: impl Fn(&R) -> String,
    payload_of: impl Fn(&R) -> P,
    hint_of: impl Fn(&R) -> Option<ChoiceHint>,
) -> ChoiceList<P> {
    records
        .iter()
        .map(|r| Choice {
            label: label_of(r),
            payload: payload_of(r),
            hint: hint_of(r),
        })
        .collect()
}

/// Primary label of a record
///
/// Prefers a non-empty `code`, then a non-empty `name`, then `"{Type} {id}"`.
#[must_use]
pub fn primary_label(code: Option<&str>, name: Option<&str>, type_name: &str, id: i64) -> String {
    code.filter(|c| !c.is_empty())
        .or_else(|| name.filter(|n| !n.is_empty()))
        .map_or_else(|| format!("{type_name} {id}"), ToString::to_string)
}

/// Fixed annotation wrapped around a label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMarker {
    /// Text placed before the label
    pub prefix: String,
    /// Text placed after the label
    pub suffix: String,
}

impl LabelMarker {
    /// Create marker
    #[inline]
    #[must_use]
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Marker used for template records: `"📋 {label} (Template)"`
    #[must_use]
    pub fn template() -> Self {
        Self::new("📋 ", " (Template)")
    }

    /// Annotate a label
    #[must_use]
    pub fn apply(&self, label: &str) -> String {
        format!("{}{}{}", self.prefix, label, self.suffix)
    }

    /// Annotate only when `special` holds
    #[must_use]
    pub fn apply_if(&self, special: bool, label: &str) -> String {
        if special {
            self.apply(label)
        } else {
            label.to_string()
        }
    }

    /// Remove the annotation, if the label carries it
    #[must_use]
    pub fn strip<'a>(&self, label: &'a str) -> &'a str {
        label
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_suffix(self.suffix.as_str()))
            .unwrap_or(label)
    }
}

/// Strip every marker from a label
#[must_use]
pub fn strip_markers<'a>(label: &'a str, markers: &[LabelMarker]) -> &'a str {
    markers.iter().fold(label, |acc, marker| marker.strip(acc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Row {
        id: i64,
        code: Option<&'static str>,
        name: Option<&'static str>,
    }

    #[test]
    fn primary_label_fallbacks() {
        assert_eq!(primary_label(Some("hero"), Some("Hero"), "Asset", 1), "hero");
        assert_eq!(primary_label(Some(""), Some("Hero"), "Asset", 1), "Hero");
        assert_eq!(primary_label(None, None, "Asset", 12), "Asset 12");
    }

    #[test]
    fn build_keeps_record_order() {
        let rows = vec![
            Row { id: 2, code: Some("b"), name: None },
            Row { id: 1, code: None, name: Some("A") },
            Row { id: 3, code: None, name: None },
        ];

        let list = build_choices(
            &rows,
            |r| primary_label(r.code, r.name, "Asset", r.id),
            |r| r.id,
        );

        assert_eq!(list.labels(), vec!["b", "A", "Asset 3"]);
        assert_eq!(list.first().map(|c| c.payload), Some(2));
    }

    #[test]
    fn duplicate_labels_resolve_to_first() {
        let list: ChoiceList<i64> = vec![
            Choice::new("dup", 1),
            Choice::new("dup", 2),
        ]
        .into_iter()
        .collect();

        assert_eq!(list.find("dup").map(|c| c.payload), Some(1));
    }

    #[test]
    fn hints_are_attached() {
        let rows = vec![Row { id: 5, code: Some("tree"), name: None }];
        let list = build_choices_with_hints(
            &rows,
            |r| r.code.unwrap_or_default().to_string(),
            |r| r.id,
            |_| Some(ChoiceHint::subtitle("Prop").with_icon(Some(String::new()))),
        );

        let hint = list.first().and_then(|c| c.hint.clone()).unwrap();
        assert_eq!(hint.subtitle.as_deref(), Some("Prop"));
        assert_eq!(hint.icon, None);
    }

    #[test]
    fn marker_apply_and_strip() {
        let marker = LabelMarker::template();
        let marked = marker.apply("Demo");
        assert_eq!(marked, "📋 Demo (Template)");
        assert_eq!(marker.strip(&marked), "Demo");
        assert_eq!(marker.strip("Demo"), "Demo");
        assert_eq!(marker.apply_if(false, "Demo"), "Demo");
    }

    #[test]
    fn into_parts_returns_parallel_lists() {
        let list: ChoiceList<&str> = vec![Choice::new("a", "x"), Choice::new("b", "y")]
            .into_iter()
            .collect();
        let (choices, labels) = list.into_parts();
        assert_eq!(choices.len(), labels.len());
        assert_eq!(labels, vec!["a", "b"]);
    }
}
