use rand::Rng;

use super::extract::{SheetRow, extract_name};

/// Errors raised when loading a [`NameRoster`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    /// Nothing non-blank was found in the input.
    #[error("no valid names")]
    NoValidNames,
}

/// Pool of names eligible to be drawn.
///
/// Order is display order only; draws select by random index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameRoster {
    names: Vec<String>,
}

impl NameRoster {
    /// Creates an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the roster with the trimmed, non-blank subset of `names`.
    ///
    /// The roster is overwritten even when nothing survives, in which case
    /// [`RosterError::NoValidNames`] is returned.
    pub fn load<I, S>(&mut self, names: I) -> Result<usize, RosterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.names = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();

        if self.names.is_empty() {
            return Err(RosterError::NoValidNames);
        }
        Ok(self.names.len())
    }

    /// Loads names extracted from spreadsheet rows.
    pub fn load_rows(&mut self, rows: &[SheetRow]) -> Result<usize, RosterError> {
        self.load(rows.iter().filter_map(extract_name))
    }

    /// Uniform index in `[0, len)`. Must not be called on an empty roster.
    pub fn pick_random_index<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        debug_assert!(!self.names.is_empty(), "pick on empty roster");
        if self.names.is_empty() {
            return 0;
        }
        rng.gen_range(0..self.names.len())
    }

    /// Removes and returns the name at `index`; `None` when out of range.
    pub fn remove_at(&mut self, index: usize) -> Option<String> {
        (index < self.names.len()).then(|| self.names.remove(index))
    }

    /// Name at `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// All names in display order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Drops every name.
    pub fn clear(&mut self) {
        self.names.clear();
    }

    /// Number of names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true when no names remain.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
