use crate::dataset::table::Table;
use crate::error::{ProjectorError, Result};
use serde::Serialize;
use serde_json::Value;
use std::io::Write;

pub const STATISTICS_COLUMNS: [&str; 5] = [
    "Relative url",
    "Input nb rows",
    "Input nb columns",
    "Output nb rows",
    "Output nb columns",
];

/// Shape of one dataset, as counted during the load or the project phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeRecord {
    pub relative_url: String,
    pub nb_rows: usize,
    pub nb_columns: usize,
}

impl ShapeRecord {
    pub fn of(relative_url: &str, table: &Table) -> Self {
        Self {
            relative_url: relative_url.to_string(),
            nb_rows: table.nb_rows(),
            nb_columns: table.nb_columns(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetStatistics {
    #[serde(rename = "Relative url")]
    pub relative_url: String,
    #[serde(rename = "Input nb rows")]
    pub input_nb_rows: usize,
    #[serde(rename = "Input nb columns")]
    pub input_nb_columns: usize,
    #[serde(rename = "Output nb rows")]
    pub output_nb_rows: usize,
    #[serde(rename = "Output nb columns")]
    pub output_nb_columns: usize,
}

/// Before/after shapes of every processed dataset, one row per dataset in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionStatistics {
    rows: Vec<DatasetStatistics>,
    skipped_by_all_hubs: Vec<String>,
}

impl ProjectionStatistics {
    /// Zips the input and output shapes. Both lists must name the same datasets in the
    /// same order; anything else means a projected dataset got matched to the wrong
    /// input and the run is aborted.
    pub fn align(input: Vec<ShapeRecord>, output: Vec<ShapeRecord>) -> Result<Self> {
        let input_urls: Vec<String> = input.iter().map(|r| r.relative_url.clone()).collect();
        let output_urls: Vec<String> = output.iter().map(|r| r.relative_url.clone()).collect();
        if input_urls != output_urls {
            return Err(ProjectorError::StatisticsMisaligned {
                input: input_urls,
                output: output_urls,
            });
        }

        let rows = input
            .into_iter()
            .zip(output)
            .map(|(i, o)| DatasetStatistics {
                relative_url: i.relative_url,
                input_nb_rows: i.nb_rows,
                input_nb_columns: i.nb_columns,
                output_nb_rows: o.nb_rows,
                output_nb_columns: o.nb_columns,
            })
            .collect();
        Ok(Self {
            rows,
            skipped_by_all_hubs: Vec::new(),
        })
    }

    /// Records the in-scope relative urls that no input hub had.
    pub fn with_skipped_by_all_hubs(mut self, skipped: Vec<String>) -> Self {
        self.skipped_by_all_hubs = skipped;
        self
    }

    pub fn skipped_by_all_hubs(&self) -> &[String] {
        &self.skipped_by_all_hubs
    }

    pub fn rows(&self) -> &[DatasetStatistics] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn relative_urls(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.relative_url.as_str()).collect()
    }

    pub fn to_table(&self) -> Table {
        let columns = STATISTICS_COLUMNS.iter().map(|c| c.to_string()).collect();
        let rows = self
            .rows
            .iter()
            .map(|r| {
                vec![
                    Value::from(r.relative_url.clone()),
                    Value::from(r.input_nb_rows),
                    Value::from(r.input_nb_columns),
                    Value::from(r.output_nb_rows),
                    Value::from(r.output_nb_columns),
                ]
            })
            .collect();
        Table::from_rows(columns, rows)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        if self.rows.is_empty() {
            csv_writer.write_record(STATISTICS_COLUMNS)?;
        }
        for row in &self.rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(url: &str, rows: usize, cols: usize) -> ShapeRecord {
        ShapeRecord {
            relative_url: url.to_string(),
            nb_rows: rows,
            nb_columns: cols,
        }
    }

    #[test]
    fn aligned_lists_zip_in_order() {
        let stats = ProjectionStatistics::align(
            vec![shape("a", 10, 3), shape("b", 4, 2)],
            vec![shape("a", 2, 3), shape("b", 0, 2)],
        )
        .unwrap();
        assert_eq!(stats.relative_urls(), vec!["a", "b"]);
        assert_eq!(stats.rows()[0].output_nb_rows, 2);

        let table = stats.to_table();
        assert_eq!(table.columns, STATISTICS_COLUMNS.to_vec());
        assert_eq!(table.nb_rows(), 2);
    }

    #[test]
    fn misaligned_lists_are_rejected() {
        let err = ProjectionStatistics::align(vec![shape("a", 1, 1), shape("b", 1, 1)], vec![shape("b", 1, 1), shape("a", 1, 1)])
            .unwrap_err();
        assert!(matches!(err, ProjectorError::StatisticsMisaligned { .. }));
    }

    #[test]
    fn csv_has_headers_even_when_empty() {
        let mut out = Vec::new();
        ProjectionStatistics::default().write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.trim(), STATISTICS_COLUMNS.join(","));

        let mut out = Vec::new();
        ProjectionStatistics::align(vec![shape("x/y.json", 3, 2)], vec![shape("x/y.json", 1, 2)])
            .unwrap()
            .write_csv(&mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Relative url,Input nb rows"));
        assert!(text.contains("x/y.json,3,2,1,2"));
    }
}
