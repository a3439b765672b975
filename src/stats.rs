//! Per-column maximum width tracking.

/// Maximum trimmed character length seen per column.
///
/// Widths only grow. A row longer than any seen before adds columns that
/// start at zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnWidths {
    widths: Vec<usize>,
}

impl ColumnWidths {
    /// Create a table with `columns` zero-width columns.
    pub fn new(columns: usize) -> Self {
        Self {
            widths: vec![0; columns],
        }
    }

    /// Fold one data row into the widths.
    pub fn observe<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (index, value) in row.into_iter().enumerate() {
            if index >= self.widths.len() {
                self.widths.resize(index + 1, 0);
            }
            let len = value.as_ref().trim().chars().count();
            if len > self.widths[index] {
                self.widths[index] = len;
            }
        }
    }

    /// Number of columns tracked.
    #[inline]
    pub fn len(&self) -> usize {
        self.widths.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    /// Width of column `index`, 0 if it was never observed.
    #[inline]
    pub fn get(&self, index: usize) -> usize {
        self.widths.get(index).copied().unwrap_or(0)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.widths
    }
}

impl From<Vec<usize>> for ColumnWidths {
    fn from(widths: Vec<usize>) -> Self {
        Self { widths }
    }
}
