use std::collections::BTreeMap;

use anyhow::Context;
use beanfeed_core::{AppConfig, SourceConfig, SourcesFile};
use beanfeed_scraper::{
    AggregateReport, Aggregator, BatchScheduler, Extractor, ShopifyClient, ShopifySource,
};
use tokio_util::sync::CancellationToken;

use crate::sources::{load_sources, load_vocabulary};

/// Runs one aggregation and prints either a summary or the catalog JSON.
///
/// Ctrl-C cancels the run between batches.
pub(crate) async fn run_collect(
    config: &AppConfig,
    source_filter: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let sources = select_sources(load_sources(config)?, source_filter)?;

    let source = ShopifySource::new(
        ShopifyClient::from_app_config(config)?,
        Extractor::new(load_vocabulary(config)?),
    );
    let aggregator = Aggregator::new(source, BatchScheduler::from_app_config(config));

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("ctrl-c received, cancelling collection");
                cancel.cancel();
            }
        })
    };

    let result = aggregator.run(&sources, &cancel).await;
    ctrl_c.abort();
    let report = result.context("collection did not complete")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.beans)?);
    } else {
        for line in summary_lines(&report) {
            println!("{line}");
        }
    }
    Ok(())
}

fn select_sources(file: SourcesFile, filter: Option<&str>) -> anyhow::Result<Vec<SourceConfig>> {
    let Some(name) = filter else {
        return Ok(file.sources);
    };
    file.find(name)
        .cloned()
        .map(|source| vec![source])
        .with_context(|| format!("no configured source named '{name}'"))
}

fn summary_lines(report: &AggregateReport) -> Vec<String> {
    let mut per_merchant: BTreeMap<&str, usize> = BTreeMap::new();
    for bean in &report.beans {
        *per_merchant.entry(bean.merchant.as_str()).or_default() += 1;
    }

    let mut lines: Vec<String> = per_merchant
        .into_iter()
        .map(|(merchant, count)| format!("{merchant:<32} {count:>5}"))
        .collect();
    lines.push(format!(
        "{} beans from {}/{} collections ({} duplicates dropped) in {} ms",
        report.beans.len(),
        report.success_count,
        report.task_count,
        report.duplicate_count,
        report.duration.as_millis()
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use beanfeed_core::CanonicalBean;
    use std::time::Duration;

    fn source(name: &str) -> SourceConfig {
        SourceConfig {
            name: name.to_string(),
            collections: vec![format!("https://{name}.example/collections/coffee")],
            notes: None,
        }
    }

    fn bean(merchant: &str, id: &str) -> CanonicalBean {
        CanonicalBean {
            id: CanonicalBean::make_id(merchant, id),
            name: "Test Bean".to_string(),
            merchant: merchant.to_string(),
            price: None,
            weight_grams: None,
            roast_level: None,
            origin: None,
            process: None,
            tasting_notes: vec![],
            image: None,
            url: String::new(),
            in_stock: true,
            fetch_date: None,
        }
    }

    fn sources_file() -> SourcesFile {
        SourcesFile {
            sources: vec![source("subko"), source("araku")],
        }
    }

    #[test]
    fn select_sources_without_filter_keeps_all() {
        let picked = select_sources(sources_file(), None).expect("select");
        assert_eq!(picked.len(), 2);
    }

    #[test]
    fn select_sources_unknown_name_errors() {
        let err = select_sources(sources_file(), Some("zzz")).unwrap_err();
        assert!(err.to_string().contains("zzz"));
    }

    #[test]
    fn select_sources_matches_name_case_insensitively() {
        let picked = select_sources(sources_file(), Some("ARAKU")).expect("select");
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name, "araku");
    }

    #[test]
    fn summary_counts_beans_per_merchant() {
        let report = AggregateReport {
            beans: vec![bean("Subko", "1"), bean("Subko", "2"), bean("Araku", "9")],
            task_count: 3,
            success_count: 2,
            failure_count: 1,
            duplicate_count: 1,
            duration: Duration::from_millis(1200),
        };
        let lines = summary_lines(&report);

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Araku"));
        assert!(lines[1].starts_with("Subko"));
        assert!(lines[1].trim_end().ends_with('2'));
        assert_eq!(
            lines[2],
            "3 beans from 2/3 collections (1 duplicates dropped) in 1200 ms"
        );
    }
}
