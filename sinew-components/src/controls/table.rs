use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("a controls table needs at least one time")]
    Empty,

    #[error("{labels} labels but {columns} columns")]
    LabelCount { labels: usize, columns: usize },

    #[error("column `{label}` has {found} rows, expected {expected}")]
    ColumnLength {
        label: String,
        expected: usize,
        found: usize,
    },

    #[error("column label `{0}` appears more than once")]
    DuplicateLabel(String),

    #[error("no column labeled `{0}`")]
    UnknownLabel(String),

    #[error("times must be finite and strictly increasing, but row {index} is not")]
    InvalidTime { index: usize },
}

/// A column-labeled time series of sampled controls.
///
/// Each column label is either the name of an actuator or the absolute path
/// to one. A [`PrescribedController`](crate::PrescribedController) can be built
/// from a table with one control function per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable", into = "RawTable")]
pub struct ControlsTable {
    times: Vec<f64>,
    labels: Vec<String>,
    columns: Vec<Vec<f64>>,
}

#[derive(Serialize, Deserialize)]
struct RawTable {
    times: Vec<f64>,
    labels: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl ControlsTable {
    /// Creates a table, checking its shape and its time column.
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] if the table has no rows, the labels and
    /// columns disagree, a label repeats, or the times are not strictly increasing.
    pub fn new(
        times: Vec<f64>,
        labels: Vec<String>,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self, TableError> {
        if times.is_empty() {
            return Err(TableError::Empty);
        }
        if labels.len() != columns.len() {
            return Err(TableError::LabelCount {
                labels: labels.len(),
                columns: columns.len(),
            });
        }
        if let Some(index) = times.iter().position(|t| !t.is_finite()) {
            return Err(TableError::InvalidTime { index });
        }
        if let Some(index) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(TableError::InvalidTime { index: index + 1 });
        }
        for (i, (label, column)) in labels.iter().zip(&columns).enumerate() {
            if column.len() != times.len() {
                return Err(TableError::ColumnLength {
                    label: label.clone(),
                    expected: times.len(),
                    found: column.len(),
                });
            }
            if labels[..i].contains(label) {
                return Err(TableError::DuplicateLabel(label.clone()));
            }
        }

        Ok(Self {
            times,
            labels,
            columns,
        })
    }

    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.times.len()
    }

    /// Returns the column with the given label.
    #[must_use]
    pub fn column(&self, label: &str) -> Option<&[f64]> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.columns[i].as_slice())
    }

    /// Returns every `(label, column)` pair in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> + '_ {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    /// Multiplies every value of one column by `factor`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::UnknownLabel`] if no column has that label.
    pub fn scale_column(&mut self, label: &str, factor: f64) -> Result<(), TableError> {
        let index = self
            .labels
            .iter()
            .position(|l| l == label)
            .ok_or_else(|| TableError::UnknownLabel(label.to_owned()))?;

        for value in &mut self.columns[index] {
            *value *= factor;
        }
        Ok(())
    }
}

impl TryFrom<RawTable> for ControlsTable {
    type Error = TableError;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        Self::new(raw.times, raw.labels, raw.columns)
    }
}

impl From<ControlsTable> for RawTable {
    fn from(table: ControlsTable) -> Self {
        Self {
            times: table.times,
            labels: table.labels,
            columns: table.columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emg() -> ControlsTable {
        ControlsTable::new(
            vec![0.0, 0.5, 1.0],
            vec!["soleus_r".into(), "/forceset/tibant_r".into()],
            vec![vec![0.1, 0.4, 0.2], vec![0.0, 0.2, 0.6]],
        )
        .unwrap()
    }

    #[test]
    fn columns_are_found_by_label() {
        let table = emg();
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.column("soleus_r"), Some(&[0.1, 0.4, 0.2][..]));
        assert_eq!(table.column("tibant_r"), None);
        assert_eq!(
            table.columns().map(|(label, _)| label).collect::<Vec<_>>(),
            vec!["soleus_r", "/forceset/tibant_r"]
        );
    }

    #[test]
    fn scaling_touches_one_column() {
        let mut table = emg();
        table.scale_column("/forceset/tibant_r", 0.5).unwrap();

        assert_eq!(table.column("/forceset/tibant_r"), Some(&[0.0, 0.1, 0.3][..]));
        assert_eq!(table.column("soleus_r"), Some(&[0.1, 0.4, 0.2][..]));
        assert_eq!(
            table.scale_column("gasmed_r", 2.0),
            Err(TableError::UnknownLabel("gasmed_r".into()))
        );
    }

    #[test]
    fn malformed_tables_are_rejected() {
        assert_eq!(
            ControlsTable::new(vec![], vec![], vec![]),
            Err(TableError::Empty)
        );
        assert_eq!(
            ControlsTable::new(vec![0.0, 1.0], vec!["a".into()], vec![vec![0.0]]),
            Err(TableError::ColumnLength {
                label: "a".into(),
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            ControlsTable::new(
                vec![0.0, 1.0],
                vec!["a".into(), "a".into()],
                vec![vec![0.0; 2], vec![0.0; 2]]
            ),
            Err(TableError::DuplicateLabel("a".into()))
        );
        assert_eq!(
            ControlsTable::new(vec![1.0, 0.0], vec![], vec![]),
            Err(TableError::InvalidTime { index: 1 })
        );
    }
}
