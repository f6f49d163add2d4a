//! Plain-text table rendering for command output.

use std::fmt;

/// Column-aligned text table. Cells are left-aligned and columns are
/// separated by two spaces; trailing whitespace is trimmed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Table {
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Appends a row. Rows may have different lengths.
    pub fn push<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    /// Appends a two-column `key value` row for detail views.
    pub fn field(&mut self, key: &str, value: impl fmt::Display) {
        self.push([key.to_owned(), value.to_string()]);
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = Vec::new();
        for row in &self.rows {
            for (index, cell) in row.iter().enumerate() {
                let len = cell.chars().count();
                match widths.get_mut(index) {
                    Some(width) => *width = (*width).max(len),
                    None => widths.push(len),
                }
            }
        }
        widths
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();
        for row in &self.rows {
            let mut line = String::new();
            for (index, cell) in row.iter().enumerate() {
                if index > 0 {
                    line.push_str("  ");
                }
                let width = widths.get(index).copied().unwrap_or_default();
                line.push_str(&format!("{cell:<width$}"));
            }
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_align_to_widest_cell() {
        let mut table = Table::new();
        table.push(["Id", "Name"]);
        table.push(["1234", "web"]);
        table.push(["7", "database"]);

        assert_eq!(
            table.to_string(),
            "Id    Name\n1234  web\n7     database\n"
        );
    }

    #[test]
    fn ragged_rows_and_fields_render() {
        let mut table = Table::new();
        table.push(["no droplets found"]);
        assert_eq!(table.to_string(), "no droplets found\n");

        let mut detail = Table::new();
        detail.field("Id", 7);
        detail.field("Locked", false);
        assert_eq!(detail.to_string(), "Id      7\nLocked  false\n");
    }

    #[test]
    fn width_counts_characters_not_bytes() {
        let mut table = Table::new();
        table.push(["0.02 €", "x"]);
        table.push(["14.60", "y"]);
        assert_eq!(table.to_string(), "0.02 €  x\n14.60   y\n");
    }
}
