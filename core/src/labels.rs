//! Pump-state labels and the category mapping built from the dataset

use std::collections::HashMap;
use std::fmt;

/// Integer class produced by a classifier
///
/// `1` means the pump should run and `0` that it should stop. Datasets with
/// more than two categories produce larger labels, which carry no command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub usize);

impl Label {
    pub const OFF: Label = Label(0);
    pub const ON: Label = Label(1);

    pub fn value(self) -> usize {
        self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bidirectional mapping between target category strings and labels
///
/// Codes are assigned `0..k` in order of first appearance and never change
/// once the mapping is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelMapping {
    categories: Vec<String>,
    codes: HashMap<String, Label>,
}

impl LabelMapping {
    /// Build from target values in dataset order
    pub fn from_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut mapping = Self::default();
        for value in values {
            if !mapping.codes.contains_key(value) {
                let label = Label(mapping.categories.len());
                mapping.categories.push(value.to_string());
                mapping.codes.insert(value.to_string(), label);
            }
        }
        mapping
    }

    pub fn encode(&self, category: &str) -> Option<Label> {
        self.codes.get(category).copied()
    }

    pub fn decode(&self, label: Label) -> Option<&str> {
        self.categories.get(label.0).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// `(category, label)` pairs in code order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Label)> {
        self.categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), Label(i)))
    }
}

impl fmt::Display for LabelMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (category, label)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{}': {}", category, label)?;
        }
        write!(f, "}}")
    }
}

/// How labels are shown to the operator
///
/// Textual targets display their original category; numeric targets display
/// the label itself.
pub fn describe(mapping: Option<&LabelMapping>, label: Label) -> String {
    match mapping {
        Some(mapping) => mapping
            .decode(label)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Unknown ({})", label)),
        None => label.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_first_appearance() {
        let mapping = LabelMapping::from_values(["ON", "OFF", "ON", "OFF", "OFF"]);
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.encode("ON"), Some(Label(0)));
        assert_eq!(mapping.encode("OFF"), Some(Label(1)));
        assert_eq!(mapping.encode("IDLE"), None);
    }

    #[test]
    fn test_inverse_reproduces_original_strings() {
        let raw = ["dry", "wet", "wet", "very dry", "dry", "wet"];
        let mapping = LabelMapping::from_values(raw);

        let encoded: Vec<Label> = raw.iter().map(|v| mapping.encode(v).unwrap()).collect();
        let decoded: Vec<&str> = encoded.iter().map(|l| mapping.decode(*l).unwrap()).collect();

        assert_eq!(decoded, raw);
        assert_eq!(
            encoded,
            vec![Label(0), Label(1), Label(1), Label(2), Label(0), Label(1)]
        );
    }

    #[test]
    fn test_describe_unknown_and_numeric() {
        let mapping = LabelMapping::from_values(["off", "on"]);
        assert_eq!(describe(Some(&mapping), Label(1)), "on");
        assert_eq!(describe(Some(&mapping), Label(7)), "Unknown (7)");
        assert_eq!(describe(None, Label::ON), "1");
    }

    #[test]
    fn test_display_lists_pairs_in_code_order() {
        let mapping = LabelMapping::from_values(["Pump ON", "Pump OFF"]);
        assert_eq!(mapping.to_string(), "{'Pump ON': 0, 'Pump OFF': 1}");
    }
}
