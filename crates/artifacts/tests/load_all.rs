use std::fs;
use std::sync::Arc;

use storefront_artifacts::{load_all, ArtifactKind, ArtifactStatus, SharedArtifacts};
use storefront_core::config::ArtifactsConfig;
use storefront_core::ids::normalize;
use storefront_core::recommend::{self, AlsoBoughtSource, ExpansionOptions, RecommendationSource};
use tempfile::TempDir;

type TestResult = Result<(), String>;

fn write(dir: &TempDir, name: &str, body: &str) -> TestResult {
    fs::write(dir.path().join(name), body).map_err(|err| format!("write {name}: {err}"))
}

fn full_fixture() -> Result<TempDir, String> {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    write(
        &dir,
        "catalog.csv",
        "article_id,prod_name,colour_group_name,price\n\
         1,Tee,White,0.01\n\
         2,Jeans,Blue,0.05\n\
         3,Socks,Black,0.002\n",
    )?;
    write(
        &dir,
        "als_model.json",
        r#"{"user_ids": ["B"], "item_ids": [1, 2], "user_factors": [[1.0, 0.0]], "item_factors": [[1.0, 0.0], [0.0, 1.0]]}"#,
    )?;
    write(&dir, "co_purchase.json", r#"{"1": ["2", "3"], "2": [[3, 0.9]]}"#)?;
    write(&dir, "candidates.json", r#"{"A": ["1", "2", "3"]}"#)?;
    write(&dir, "user_summary.json", r#"{"B": {"last_5_items": ["1"]}}"#)?;
    Ok(dir)
}

#[test]
fn full_artifact_set_serves_every_tier() -> TestResult {
    let dir = full_fixture()?;
    let (artifacts, report) = load_all(&ArtifactsConfig::in_dir(dir.path()));

    if !report.all_loaded() {
        return Err(format!("expected every artifact to load: {:?}", report.outcomes));
    }
    if report.outcome(ArtifactKind::Catalog).map(|o| &o.status)
        != Some(&ArtifactStatus::Loaded { records: 3 })
    {
        return Err("catalog should report three records".to_string());
    }

    let precomputed = recommend::resolve(&artifacts, "A", 2);
    assert_eq!(precomputed.items, vec![normalize("1"), normalize("2")]);
    assert_eq!(precomputed.source, RecommendationSource::Precomputed);

    let scored = recommend::resolve(&artifacts, "B", 1);
    assert_eq!(scored.items, vec![normalize("2")]);
    assert_eq!(scored.source, RecommendationSource::LatentFactor);

    let history = recommend::expand(&artifacts, "B", 2, ExpansionOptions::default());
    assert_eq!(history.items, vec![normalize("2"), normalize("3")]);
    assert_eq!(history.source, AlsoBoughtSource::PurchaseHistory);
    Ok(())
}

#[test]
fn empty_directory_degrades_to_empty_tables() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let (artifacts, report) = load_all(&ArtifactsConfig::in_dir(dir.path()));

    assert_eq!(report.degraded().count(), ArtifactKind::ALL.len());
    assert!(report.outcomes.iter().all(|o| o.status == ArtifactStatus::Missing));
    assert!(artifacts.catalog.is_empty());
    assert!(artifacts.model.is_none());
    assert!(recommend::recommend(&artifacts, "anyone", 3).is_empty());
    Ok(())
}

#[test]
fn corrupt_artifact_fails_alone() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    write(&dir, "catalog.csv", "article_id\n9\n10\n")?;
    write(&dir, "candidates.json", "[1, 2")?;

    let (artifacts, report) = load_all(&ArtifactsConfig::in_dir(dir.path()));

    assert!(report.is_loaded(ArtifactKind::Catalog));
    assert!(matches!(
        report.outcome(ArtifactKind::Candidates).map(|o| &o.status),
        Some(ArtifactStatus::Failed { .. })
    ));
    assert_eq!(
        recommend::recommend(&artifacts, "anyone", 2),
        vec![normalize("9"), normalize("10")]
    );
    Ok(())
}

#[test]
fn report_serializes_with_tagged_status() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    write(&dir, "catalog.csv", "article_id\n1\n")?;
    let (_, report) = load_all(&ArtifactsConfig::in_dir(dir.path()));

    let json = serde_json::to_value(&report).map_err(|err| err.to_string())?;
    let first = &json["outcomes"][0];
    assert_eq!(first["kind"], "catalog");
    assert_eq!(first["status"]["state"], "loaded");
    assert_eq!(first["status"]["records"], 1);
    assert_eq!(json["outcomes"][1]["status"]["state"], "missing");
    Ok(())
}

#[tokio::test]
async fn shared_handle_loads_once() -> TestResult {
    let dir = full_fixture()?;
    let shared = Arc::new(SharedArtifacts::new(ArtifactsConfig::in_dir(dir.path())));
    assert!(shared.loaded().is_none());

    let (first, second) = tokio::join!(shared.get(), shared.get());
    let first = first.map_err(|err| err.to_string())?;
    let second = second.map_err(|err| err.to_string())?;

    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first.artifacts, &second.artifacts));
    assert_eq!(first.artifacts.catalog.len(), 3);
    assert!(shared.loaded().is_some());
    Ok(())
}
