//! Applicability preview for an organization profile

use mizan_compliance::{BranchingEngine, ControlCatalog, OrganizationProfile};
use serde::Serialize;
use std::path::Path;

use super::{load_catalog, read_document};
use crate::output::{self, OutputFormat};
use crate::commands::catalog::ControlRow;

#[derive(Debug, Serialize)]
pub struct ApplicabilityReport {
    pub activated: Vec<String>,
    pub not_applicable: Vec<String>,
    pub applicable: Vec<ControlRow>,
    /// Controls that may not be answered N/A by this organization type
    pub na_forbidden: Vec<String>,
}

pub fn preview(catalog: &ControlCatalog, profile: &OrganizationProfile) -> ApplicabilityReport {
    let result = BranchingEngine::evaluate(profile);
    let applicable = BranchingEngine::applicable_controls(catalog, profile, &result);

    ApplicabilityReport {
        activated: result.activated_controls.iter().map(ToString::to_string).collect(),
        not_applicable: result.na_controls.iter().map(ToString::to_string).collect(),
        na_forbidden: applicable
            .iter()
            .filter(|c| BranchingEngine::na_forbidden(c, profile.org_type))
            .map(|c| c.id.to_string())
            .collect(),
        applicable: applicable.into_iter().map(ControlRow::from).collect(),
    }
}

pub fn handle(profile: &Path, catalog: Option<&Path>, format: OutputFormat) -> anyhow::Result<()> {
    let profile: OrganizationProfile = read_document(profile)?;
    let catalog = load_catalog(catalog)?;
    let report = preview(&catalog, &profile);
    tracing::debug!(
        org_type = ?profile.org_type,
        applicable = report.applicable.len(),
        "applicability evaluated"
    );

    let text = format.render(&report, || {
        format!(
            "{}\n{} of {} controls apply; N/A forbidden: {}",
            output::table(&report.applicable),
            report.applicable.len(),
            catalog.len(),
            if report.na_forbidden.is_empty() { "none".to_string() } else { report.na_forbidden.join(", ") },
        )
    })?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mizan_compliance::OrgType;

    #[test]
    fn test_transfers_off_hides_transfer_controls() {
        let catalog = ControlCatalog::builtin().unwrap();
        let report = preview(&catalog, &OrganizationProfile::baseline(OrgType::PrivateCompany));

        assert!(report.not_applicable.contains(&"PDPL-T.1".to_string()));
        assert!(!report.applicable.iter().any(|c| c.id == "PDPL-T.1"));
        assert!(report.na_forbidden.is_empty());
    }

    #[test]
    fn test_hospital_profile() {
        let catalog = ControlCatalog::builtin().unwrap();
        let mut profile = OrganizationProfile::baseline(OrgType::Hospital);
        profile.cross_border_transfers = true;
        let report = preview(&catalog, &profile);

        assert!(report.applicable.iter().any(|c| c.id == "PDPL-TS.1"));
        assert!(report.na_forbidden.contains(&"MOH-G.1".to_string()));
        assert!(report.activated.contains(&"MOH-G.2".to_string()));
    }
}
