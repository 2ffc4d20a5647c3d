//! Catalog commands

use mizan_compliance::{Control, ControlCatalog};
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::Tabled;

use super::load_catalog;
use crate::{output, output::OutputFormat, CatalogCommands};

#[derive(Debug, Serialize)]
pub struct CatalogReport {
    pub controls: usize,
    pub by_source: BTreeMap<String, usize>,
    pub domains: Vec<u8>,
}

impl CatalogReport {
    pub fn new(catalog: &ControlCatalog) -> Self {
        let mut by_source = BTreeMap::new();
        let mut domains: Vec<u8> = vec![];
        for control in catalog.controls() {
            *by_source.entry(control.source.to_string()).or_insert(0) += 1;
            if !domains.contains(&control.domain_number) {
                domains.push(control.domain_number);
            }
        }
        domains.sort_unstable();
        Self { controls: catalog.len(), by_source, domains }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct ControlRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Source")]
    pub source: String,
    #[tabled(rename = "Domain")]
    pub domain: u8,
    #[tabled(rename = "Risk")]
    pub risk: String,
    #[tabled(rename = "Yes/Partial")]
    pub points: String,
    #[tabled(rename = "Weight")]
    pub weight: f64,
    #[tabled(rename = "Title")]
    pub title: String,
}

impl From<&Control> for ControlRow {
    fn from(c: &Control) -> Self {
        Self {
            id: c.id.to_string(),
            source: c.source.to_string(),
            domain: c.domain_number,
            risk: c.risk_level.to_string(),
            points: format!("{}/{}", c.points_yes, c.points_partial),
            weight: c.weight_multiplier,
            title: c.title.clone(),
        }
    }
}

pub fn list(catalog: &ControlCatalog, domain: Option<u8>) -> Vec<ControlRow> {
    catalog
        .controls()
        .iter()
        .filter(|c| domain.map_or(true, |d| c.domain_number == d))
        .map(ControlRow::from)
        .collect()
}

pub fn handle(action: CatalogCommands, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        CatalogCommands::Validate { catalog } => {
            let catalog = load_catalog(catalog.as_deref())?;
            let report = CatalogReport::new(&catalog);
            tracing::debug!(controls = report.controls, "catalog loaded");

            let text = format.render(&report, || {
                let sources = report.by_source
                    .iter()
                    .map(|(source, n)| format!("{source} {n}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "catalog valid: {} controls ({}) across {} domains",
                    report.controls,
                    sources,
                    report.domains.len()
                )
            })?;
            println!("{text}");
        }
        CatalogCommands::List { catalog, domain } => {
            let catalog = load_catalog(catalog.as_deref())?;
            let rows = list(&catalog, domain);
            println!("{}", format.render(&rows, || output::table(&rows))?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_report() {
        let catalog = ControlCatalog::builtin().unwrap();
        let report = CatalogReport::new(&catalog);
        assert_eq!(report.controls, catalog.len());
        assert_eq!(report.by_source.values().sum::<usize>(), catalog.len());
        assert_eq!(report.by_source.get("MOH"), Some(&5));
        assert!(report.domains.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_list_by_domain() {
        let catalog = ControlCatalog::builtin().unwrap();
        let rows = list(&catalog, Some(6));
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|r| r.domain == 6));
        assert!(rows.iter().any(|r| r.id == "PDPL-TS.1"));
    }
}
