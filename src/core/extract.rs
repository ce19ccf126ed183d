//! Name extraction from field-labeled spreadsheet rows.

/// Field labels tried, in order, before falling back to the first field.
pub const NAME_FIELD_LABELS: [&str; 6] = ["姓名", "名字", "name", "Name", "人员", "员工"];

/// One spreadsheet row as ordered `(label, value)` pairs.
///
/// Labels come from the header row; values are already stringified by the
/// adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetRow {
    fields: Vec<(String, String)>,
}

impl SheetRow {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field, keeping column order.
    pub fn with_field(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(label, value);
        self
    }

    /// Appends a field, keeping column order.
    pub fn push(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.fields.push((label.into(), value.into()));
    }

    /// Value of the first field labeled `label`.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    /// Value of the leftmost field.
    pub fn first_value(&self) -> Option<&str> {
        self.fields.first().map(|(_, v)| v.as_str())
    }

    /// Returns true when the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<L: Into<String>, V: Into<String>> FromIterator<(L, V)> for SheetRow {
    fn from_iter<I: IntoIterator<Item = (L, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(l, v)| (l.into(), v.into())).collect(),
        }
    }
}

/// Picks the participant name out of `row`.
///
/// The first label in [`NAME_FIELD_LABELS`] holding a non-blank value wins;
/// otherwise the first field is used. Blank results yield `None`.
pub fn extract_name(row: &SheetRow) -> Option<String> {
    NAME_FIELD_LABELS
        .iter()
        .filter_map(|label| row.get(label))
        .chain(row.first_value())
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}
