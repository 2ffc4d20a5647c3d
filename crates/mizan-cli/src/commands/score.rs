//! Offline scoring of a response file

use anyhow::{bail, Context};
use colored::Colorize;
use mizan_compliance::{
    Answer, BranchingEngine, ComplianceConfig, ControlCatalog, OrganizationProfile, ScoreSummary,
    ScoringInput, ScoringService,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tabled::Tabled;

use super::{load_catalog, read_document};
use crate::output::{self, OutputFormat};

/// One line of a response file
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseLine {
    pub control_id: String,
    pub answer: String,
    #[serde(default)]
    pub na_justification: Option<String>,
}

#[derive(Debug, Serialize, Tabled)]
struct DomainRow {
    #[tabled(rename = "Domain")]
    domain: u8,
    #[tabled(rename = "Score %")]
    percentage: String,
    #[tabled(rename = "Assessed")]
    assessed: usize,
    #[tabled(rename = "Gaps")]
    gaps: usize,
    #[tabled(rename = "Partial")]
    partial: usize,
    #[tabled(rename = "N/A")]
    na: usize,
}

/// Validate the lines the same way response submission does, then score
pub fn score(
    catalog: &ControlCatalog,
    config: &ComplianceConfig,
    profile: Option<&OrganizationProfile>,
    lines: &[ResponseLine],
) -> anyhow::Result<ScoreSummary> {
    let mut seen = HashSet::new();
    let mut inputs = Vec::with_capacity(lines.len());

    for line in lines {
        let control = catalog
            .find(&line.control_id)
            .with_context(|| format!("unknown control {}", line.control_id))?;
        let answer: Answer = line.answer
            .parse()
            .with_context(|| format!("control {}", line.control_id))?;

        if !seen.insert(control.id.clone()) {
            bail!("control {} answered more than once", control.id);
        }

        if answer == Answer::Na {
            if let Some(profile) = profile {
                if BranchingEngine::na_forbidden(control, profile.org_type) {
                    bail!("control {} is mandatory and cannot be N/A", control.id);
                }
            }
            let chars = line.na_justification.as_deref().map_or(0, |j| j.trim().chars().count());
            if chars < config.na_justification_min_chars {
                bail!(
                    "control {}: N/A justification must be at least {} characters",
                    control.id,
                    config.na_justification_min_chars
                );
            }
        }

        inputs.push(ScoringInput::new(control, answer));
    }

    Ok(ScoringService::score(&inputs))
}

pub fn handle(
    responses: &Path,
    profile: Option<&Path>,
    catalog: Option<&Path>,
    config: &ComplianceConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let lines: Vec<ResponseLine> = read_document(responses)?;
    let profile: Option<OrganizationProfile> = profile.map(read_document).transpose()?;
    let catalog = load_catalog(catalog)?;

    let summary = score(&catalog, config, profile.as_ref(), &lines)?;
    tracing::info!(
        score = %summary.overall_score,
        assessed = summary.total_controls_assessed,
        "responses scored"
    );

    let text = format.render(&summary, || {
        let rows = summary.domain_scores.iter().map(|d| DomainRow {
            domain: d.domain_number,
            percentage: d.percentage.to_string(),
            assessed: d.controls_assessed,
            gaps: d.gap_count,
            partial: d.partial_count,
            na: d.na_count,
        });
        let g = &summary.gaps;
        format!(
            "{}\n{} {}%  gaps: {} critical, {} high, {} medium, {} low",
            output::table(rows),
            "Overall".bold(),
            summary.overall_score.to_string().bold(),
            g.critical.to_string().red(),
            g.high.to_string().yellow(),
            g.medium,
            g.low,
        )
    })?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mizan_compliance::OrgType;
    use rust_decimal::Decimal;

    fn line(control: &str, answer: &str) -> ResponseLine {
        ResponseLine { control_id: control.into(), answer: answer.into(), na_justification: None }
    }

    #[test]
    fn test_scores_lines() {
        let catalog = ControlCatalog::builtin().unwrap();
        let lines = [line("PDPL-G.1", "YES"), line("PDPL-G.12", "NO")];
        let summary = score(&catalog, &ComplianceConfig::default(), None, &lines).unwrap();

        assert_eq!(summary.overall_score, Decimal::new(5714, 2));
        assert_eq!(summary.gaps.medium, 1);
        assert_eq!(summary.total_controls_assessed, 2);
    }

    #[test]
    fn test_rejects_bad_lines() {
        let catalog = ControlCatalog::builtin().unwrap();
        let config = ComplianceConfig::default();

        assert!(score(&catalog, &config, None, &[line("PDPL-XX.1", "YES")]).is_err());
        assert!(score(&catalog, &config, None, &[line("PDPL-G.1", "maybe")]).is_err());
        assert!(score(&catalog, &config, None, &[line("PDPL-G.1", "YES"), line("PDPL-G.1", "NO")]).is_err());
        assert!(score(&catalog, &config, None, &[line("PDPL-TR.1", "NA")]).is_err());
    }

    #[test]
    fn test_mandatory_na_needs_profile_check() {
        let catalog = ControlCatalog::builtin().unwrap();
        let config = ComplianceConfig::default();
        let mut na = line("MOH-G.2", "NA");
        na.na_justification = Some("Duties are handled by the parent group".into());

        assert!(score(&catalog, &config, None, &[na.clone()]).is_ok());
        let hospital = OrganizationProfile::baseline(OrgType::Hospital);
        assert!(score(&catalog, &config, Some(&hospital), &[na]).is_err());
    }
}
