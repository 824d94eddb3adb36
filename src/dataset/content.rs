use crate::dataset::filter::SliceDefinition;
use crate::dataset::table::Table;

/// Dataset payload that can be narrowed down by a [`SliceDefinition`].
pub trait DataSetContent {
    /// Returns the subset of `self` that complies with `slice_def`. Never mutates `self`.
    fn filter(&self, slice_def: &SliceDefinition) -> Self
    where
        Self: Sized;
}

/// [`DataSetContent`] backed by an in-memory [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableDataSetContent {
    table: Table,
}

impl TableDataSetContent {
    pub fn new(table: Table) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }
}

impl DataSetContent for TableDataSetContent {
    fn filter(&self, slice_def: &SliceDefinition) -> Self {
        let mut filtered = self.table.clone();
        for constraint in &slice_def.filters_to_apply {
            // A constraint on a column this dataset lacks does not apply to it
            let Some(idx) = filtered.column_index(&constraint.field.name) else {
                continue;
            };
            filtered = filtered.retain_rows(|row| constraint.accepts(&row[idx]));
        }
        TableDataSetContent::new(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::filter::AnyOfFilter;
    use serde_json::json;

    fn content() -> TableDataSetContent {
        TableDataSetContent::new(Table::from_rows(
            vec!["id".to_string(), "brand".to_string(), "region".to_string()],
            vec![
                vec![json!(1), json!("A"), json!("EU")],
                vec![json!(2), json!("B"), json!("EU")],
                vec![json!(3), json!("A"), json!("US")],
                vec![json!(4), json!("C"), json!("US")],
            ],
        ))
    }

    #[test]
    fn filters_are_anded() {
        let slice = SliceDefinition::new(vec![
            AnyOfFilter::new("brand", vec![json!("A"), json!("C")]),
            AnyOfFilter::new("region", vec![json!("US")]),
        ]);
        let result = content().filter(&slice);
        assert_eq!(result.table().column_values("id"), vec![&json!(3), &json!(4)]);
    }

    #[test]
    fn missing_field_constraint_is_a_noop() {
        let slice = SliceDefinition::new(vec![
            AnyOfFilter::new("not_a_column", vec![json!("zzz")]),
            AnyOfFilter::new("brand", vec![json!("B")]),
        ]);
        let result = content().filter(&slice);
        assert_eq!(result.table().nb_rows(), 1);
    }

    #[test]
    fn filter_is_pure_and_idempotent() {
        let original = content();
        let before = original.clone();
        let slice = SliceDefinition::everything().with_filter(AnyOfFilter::new("brand", vec![json!("A")]));

        let once = original.filter(&slice);
        let twice = once.filter(&slice);

        assert_eq!(original, before);
        assert_eq!(once, twice);
        assert_eq!(once.table().columns, original.table().columns);
    }
}
