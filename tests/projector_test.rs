use anyhow::Result;
use hub_projector::config::ProjectorConfig;
use hub_projector::context::AppContext;
use hub_projector::database::{DataAccessor, DataHubHandle, SingleRootDataHub, StaticDatabaseManifest};
use hub_projector::dataset::{AnyOfFilter, DatasetIdentity, NamedDatasetIdentity, SliceDefinition, Table};
use hub_projector::error::ProjectorError;
use hub_projector::logging::{LogLevel, Logger};
use hub_projector::projector::{DatabaseProjector, FilterProjector};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn quiet_context() -> AppContext {
    AppContext::new(ProjectorConfig::default(), Logger::new(LogLevel::NONE))
}

fn manifest(root: &Path, hubs: &[&str]) -> StaticDatabaseManifest {
    hubs.iter().fold(StaticDatabaseManifest::default(), |m, name| {
        m.with_hub(SingleRootDataHub::new(*name, DataHubHandle::relative(root, *name)))
    })
}

fn identity(path: &str) -> Arc<dyn DatasetIdentity> {
    Arc::new(NamedDatasetIdentity::new(path, path, Vec::new()))
}

fn orders(countries: &[&str]) -> Table {
    Table::from_rows(
        vec!["order_id".into(), "country".into()],
        countries
            .iter()
            .enumerate()
            .map(|(i, c)| vec![json!(i), json!(c)])
            .collect(),
    )
}

fn write(path: &Path, sheet: Option<&str>, table: &Table) -> Result<()> {
    DataAccessor::scope(path, sheet.map(str::to_string), |ax| ax.persist(table))?;
    Ok(())
}

fn read(path: &Path, sheet: Option<&str>) -> Result<Option<Table>> {
    Ok(DataAccessor::scope(path, sheet.map(str::to_string), |ax| ax.retrieve(&[], false))?)
}

#[test]
fn sections_are_reassembled_then_filtered() -> Result<()> {
    let input = tempdir()?;
    let output = tempdir()?;
    let url = input.path().join("pub/orders.json");
    write(&url, Some("batch1"), &orders(&["FR", "DE"]))?;
    write(&url, Some("batch2"), &orders(&["FR", "US", "FR"]))?;

    let id: Arc<dyn DatasetIdentity> = Arc::new(NamedDatasetIdentity::new(
        "orders",
        "orders.json",
        vec!["batch1".to_string(), "batch2".to_string()],
    ));
    let slice = SliceDefinition::new(vec![AnyOfFilter::new("country", vec![json!("FR")])]);
    let projector = FilterProjector::new(vec![id], 100, slice);

    let stats = projector.project(
        &quiet_context(),
        &manifest(input.path(), &["pub"]),
        &manifest(output.path(), &["pub"]),
    )?;

    assert_eq!(stats.len(), 1);
    let row = &stats.rows()[0];
    assert_eq!((row.input_nb_rows, row.input_nb_columns), (5, 2));
    assert_eq!((row.output_nb_rows, row.output_nb_columns), (3, 2));

    let saved = read(&output.path().join("pub/orders.json"), Some("batch1"))?.expect("saved");
    assert_eq!(saved.nb_rows(), 3);
    assert!(saved.column_values("country").iter().all(|c| **c == json!("FR")));
    Ok(())
}

#[test]
fn only_datasets_missing_everywhere_are_reported() -> Result<()> {
    let input = tempdir()?;
    let output = tempdir()?;
    write(&input.path().join("h1/X.json"), None, &orders(&["FR"]))?;
    write(&input.path().join("h2/Y.json"), None, &orders(&["DE"]))?;

    let projector = FilterProjector::new(
        vec![identity("X.json"), identity("Y.json"), identity("Z.json")],
        10,
        SliceDefinition::everything(),
    );
    let stats = projector.project(
        &quiet_context(),
        &manifest(input.path(), &["h1", "h2"]),
        &manifest(output.path(), &["h1", "h2"]),
    )?;

    assert_eq!(stats.skipped_by_all_hubs(), &["Z.json".to_string()]);
    assert_eq!(stats.relative_urls(), vec!["X.json", "Y.json"]);
    assert!(output.path().join("h1/X.json").is_file());
    assert!(output.path().join("h2/Y.json").is_file());
    assert!(!output.path().join("h1/Y.json").exists());
    Ok(())
}

#[test]
fn strict_projector_fails_on_dataset_missing_everywhere() -> Result<()> {
    let input = tempdir()?;
    let output = tempdir()?;
    write(&input.path().join("h1/X.json"), None, &orders(&["FR"]))?;

    let projector =
        FilterProjector::new(vec![identity("X.json"), identity("Z.json")], 10, SliceDefinition::everything())
            .strict(true);
    let err = projector
        .project(
            &quiet_context(),
            &manifest(input.path(), &["h1"]),
            &manifest(output.path(), &["h1"]),
        )
        .unwrap_err();

    match err {
        ProjectorError::MissingEverywhere { relative_urls, .. } => assert_eq!(relative_urls, vec!["Z.json"]),
        other => panic!("unexpected error: {}", other),
    }
    assert!(!output.path().join("h1/X.json").exists());
    Ok(())
}

#[test]
fn statistics_follow_load_order_whatever_the_output_hub_order() -> Result<()> {
    let input = tempdir()?;
    let output = tempdir()?;
    write(&input.path().join("h1/a.json"), None, &orders(&["FR", "FR", "DE"]))?;
    write(&input.path().join("h1/b.json"), None, &orders(&["DE"]))?;
    write(&input.path().join("h2/a.json"), None, &orders(&["US", "FR"]))?;

    let slice = SliceDefinition::new(vec![AnyOfFilter::new("country", vec![json!("FR")])]);
    let projector = FilterProjector::new(vec![identity("a.json"), identity("b.json")], 10, slice);
    let stats = projector.project(
        &quiet_context(),
        &manifest(input.path(), &["h1", "h2"]),
        &manifest(output.path(), &["h2", "h1"]),
    )?;

    let shapes: Vec<(&str, usize, usize)> = stats
        .rows()
        .iter()
        .map(|r| (r.relative_url.as_str(), r.input_nb_rows, r.output_nb_rows))
        .collect();
    assert_eq!(shapes, vec![("a.json", 3, 2), ("b.json", 1, 0), ("a.json", 2, 1)]);
    Ok(())
}

#[test]
fn emptied_datasets_are_saved_only_on_request() -> Result<()> {
    let input = tempdir()?;
    write(&input.path().join("pub/orders.json"), None, &orders(&["DE", "US"]))?;
    let slice = SliceDefinition::new(vec![AnyOfFilter::new("country", vec![json!("FR")])]);

    let skipped_out = tempdir()?;
    FilterProjector::new(vec![identity("orders.json")], 10, slice.clone()).project(
        &quiet_context(),
        &manifest(input.path(), &["pub"]),
        &manifest(skipped_out.path(), &["pub"]),
    )?;
    assert!(!skipped_out.path().join("pub/orders.json").exists());

    let kept_out = tempdir()?;
    FilterProjector::new(vec![identity("orders.json")], 10, slice)
        .always_saving(["orders.json"])
        .project(
            &quiet_context(),
            &manifest(input.path(), &["pub"]),
            &manifest(kept_out.path(), &["pub"]),
        )?;
    let saved = read(&kept_out.path().join("pub/orders.json"), None)?.expect("saved");
    assert!(saved.is_empty());
    assert_eq!(saved.columns, vec!["order_id", "country"]);
    Ok(())
}

#[test]
fn missing_filter_column_keeps_dataset_whole() -> Result<()> {
    let input = tempdir()?;
    let output = tempdir()?;
    let customers = Table::from_rows(vec!["name".into()], vec![vec![json!("ada")], vec![json!("bob")]]);
    write(&input.path().join("pub/customers.json"), None, &customers)?;

    let slice = SliceDefinition::new(vec![AnyOfFilter::new("country", vec![json!("FR")])]);
    let stats = FilterProjector::new(vec![identity("customers.json")], 10, slice).project(
        &quiet_context(),
        &manifest(input.path(), &["pub"]),
        &manifest(output.path(), &["pub"]),
    )?;

    assert_eq!(stats.rows()[0].output_nb_rows, 2);
    assert_eq!(read(&output.path().join("pub/customers.json"), None)?, Some(customers));
    Ok(())
}

#[test]
fn reprojecting_into_populated_hub_leaves_no_stale_sections() -> Result<()> {
    let input = tempdir()?;
    let output = tempdir()?;
    for root in [input.path(), output.path()] {
        let url = root.join("pub/orders.json");
        write(&url, Some("batch1"), &orders(&["FR", "DE"]))?;
        write(&url, Some("batch2"), &orders(&["FR", "US", "FR"]))?;
    }

    let id: Arc<dyn DatasetIdentity> = Arc::new(NamedDatasetIdentity::new(
        "orders",
        "orders.json",
        vec!["batch1".to_string(), "batch2".to_string()],
    ));
    let slice = SliceDefinition::new(vec![AnyOfFilter::new("country", vec![json!("FR")])]);
    FilterProjector::new(vec![id], 100, slice).project(
        &quiet_context(),
        &manifest(input.path(), &["pub"]),
        &manifest(output.path(), &["pub"]),
    )?;

    let url = output.path().join("pub/orders.json");
    let batch1 = read(&url, Some("batch1"))?.expect("saved");
    assert_eq!(batch1.nb_rows(), 3);
    assert!(batch1.column_values("country").iter().all(|c| **c == json!("FR")));
    assert_eq!(read(&url, Some("batch2"))?, None);
    Ok(())
}
