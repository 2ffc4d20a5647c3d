//! Branching Rules
//!
//! Maps an organization profile to the controls that apply to it.
//!
//! Rules are evaluated independently and only ever add to the activated or
//! N/A sets. When a control lands in both, N/A wins. The activated set is
//! bookkeeping: applicability is gated only by the N/A set and the control's
//! own `conditional_on` predicates.

use mizan_common::ControlId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::catalog::{Control, ControlCatalog};
use super::profile::{CloudUsage, OrgType, OrganizationProfile};

/// Minors consent and rights group
pub const MINORS_CONTROLS: [&str; 2] = ["PDPL-M.1", "PDPL-M.2"];

/// Cross-border transfer group, N/A when the organization does not transfer
pub const TRANSFER_CONTROLS: [&str; 4] = ["PDPL-T.1", "PDPL-T.2", "PDPL-T.3", "PDPL-TS.1"];

/// DPO, task segregation and stage documentation
pub const HEALTH_MANDATORY_CONTROLS: [&str; 3] = ["MOH-G.1", "MOH-G.2", "MOH-G.3"];

/// Cloud-specific transfer and cybersecurity controls
pub const CLOUD_CONTROLS: [&str; 2] = ["PDPL-T.4", "NCA-ECC-4.2.1"];

/// DPIA and algorithmic-decision controls
pub const AI_CONTROLS: [&str; 2] = ["PDPL-D.1", "PDPL-AI.1"];

/// A YES on any control in this family raises an urgent task
pub const TRANSFER_SUSPENSION_FAMILY: &str = "PDPL-TS.";

/// DPIA control whose NO answer triggers the response-level cascade
pub const DPIA_CONTROL: &str = "PDPL-D.1";

/// Controls the DPIA cascade would flag
pub const DPIA_DEPENDENT_CONTROLS: [&str; 2] = ["PDPL-G.12", "PDPL-D.5"];

/// One profile field that must hold an exact value.
///
/// Serialized as `{"field": "processes_minors", "equals": true}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "equals", rename_all = "snake_case")]
pub enum ApplicabilityCondition {
    OrgType(OrgType),
    ProcessesMinors(bool),
    CrossBorderTransfers(bool),
    UsesCloud(CloudUsage),
    ConductsResearch(bool),
    UsesAiOrAutomatedDecisions(bool),
    ContinuousMonitoring(bool),
}

impl ApplicabilityCondition {
    pub fn matches(&self, profile: &OrganizationProfile) -> bool {
        match *self {
            Self::OrgType(t) => profile.org_type == t,
            Self::ProcessesMinors(v) => profile.processes_minors == v,
            Self::CrossBorderTransfers(v) => profile.cross_border_transfers == v,
            Self::UsesCloud(v) => profile.uses_cloud == v,
            Self::ConductsResearch(v) => profile.conducts_research == v,
            Self::UsesAiOrAutomatedDecisions(v) => profile.uses_ai_or_automated_decisions == v,
            Self::ContinuousMonitoring(v) => profile.continuous_monitoring == v,
        }
    }
}

/// Output of the rule table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchingResult {
    pub activated_controls: BTreeSet<ControlId>,
    pub na_controls: BTreeSet<ControlId>,
}

impl BranchingResult {
    pub fn is_activated(&self, id: &ControlId) -> bool {
        self.activated_controls.contains(id)
    }

    pub fn is_na(&self, id: &ControlId) -> bool {
        self.na_controls.contains(id)
    }

    fn activate(&mut self, ids: &[&str]) {
        self.activated_controls.extend(ids.iter().filter_map(|id| ControlId::new(*id).ok()));
    }

    fn mark_na(&mut self, ids: &[&str]) {
        self.na_controls.extend(ids.iter().filter_map(|id| ControlId::new(*id).ok()));
    }
}

/// Stateless rule engine
pub struct BranchingEngine;

impl BranchingEngine {
    /// Evaluate the fixed rule table against a profile
    pub fn evaluate(profile: &OrganizationProfile) -> BranchingResult {
        let mut result = BranchingResult::default();

        if profile.processes_minors {
            result.activate(&MINORS_CONTROLS);
        }

        if profile.cross_border_transfers {
            result.activate(&TRANSFER_CONTROLS);
        } else {
            result.mark_na(&TRANSFER_CONTROLS);
        }

        if profile.org_type.is_health_sector() {
            result.activate(&HEALTH_MANDATORY_CONTROLS);
        }

        if profile.uses_cloud.uses_cloud() {
            result.activate(&CLOUD_CONTROLS);
        }

        if profile.uses_ai_or_automated_decisions {
            result.activate(&AI_CONTROLS);
        }

        result
    }

    /// Whether a control applies.
    ///
    /// False for anything in the N/A set; otherwise every condition must
    /// match. Activation is not consulted.
    pub fn is_applicable(
        control_id: &ControlId,
        conditional_on: &[ApplicabilityCondition],
        profile: &OrganizationProfile,
        result: &BranchingResult,
    ) -> bool {
        if result.is_na(control_id) {
            return false;
        }
        conditional_on.iter().all(|c| c.matches(profile))
    }

    /// Catalog controls that apply, in catalog order
    pub fn applicable_controls<'a>(
        catalog: &'a ControlCatalog,
        profile: &OrganizationProfile,
        result: &BranchingResult,
    ) -> Vec<&'a Control> {
        catalog
            .controls()
            .iter()
            .filter(|c| Self::is_applicable(&c.id, &c.conditional_on, profile, result))
            .collect()
    }

    /// Whether N/A is forbidden for this control and organization type
    pub fn na_forbidden(control: &Control, org_type: OrgType) -> bool {
        let health_mandatory = org_type.is_health_sector()
            && HEALTH_MANDATORY_CONTROLS.contains(&control.id.as_str());
        health_mandatory || control.mandatory_for_types.contains(&org_type)
    }

    pub fn in_transfer_suspension_family(control_id: &ControlId) -> bool {
        control_id.in_family(TRANSFER_SUSPENSION_FAMILY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ControlId {
        ControlId::new(s).unwrap()
    }

    #[test]
    fn test_rule_table_ids_exist_in_builtin_catalog() {
        let catalog = ControlCatalog::builtin().unwrap();
        let groups = [
            &MINORS_CONTROLS[..],
            &TRANSFER_CONTROLS[..],
            &HEALTH_MANDATORY_CONTROLS[..],
            &CLOUD_CONTROLS[..],
            &AI_CONTROLS[..],
            &DPIA_DEPENDENT_CONTROLS[..],
            &[DPIA_CONTROL][..],
        ];
        for group in groups {
            for control in group {
                assert!(catalog.find(control).is_some(), "{control} missing");
            }
        }
    }

    #[test]
    fn test_transfers_flag_is_exclusive() {
        let mut profile = OrganizationProfile::baseline(OrgType::PrivateCompany);
        let result = BranchingEngine::evaluate(&profile);
        assert!(result.is_na(&id("PDPL-T.1")));
        assert!(!result.is_activated(&id("PDPL-T.1")));

        profile.cross_border_transfers = true;
        let result = BranchingEngine::evaluate(&profile);
        assert!(result.is_activated(&id("PDPL-TS.1")));
        assert!(result.na_controls.is_empty());
    }

    #[test]
    fn test_health_sector_always_activates_mandatory_group() {
        let result = BranchingEngine::evaluate(&OrganizationProfile::baseline(OrgType::Hospital));
        for control in HEALTH_MANDATORY_CONTROLS {
            assert!(result.is_activated(&id(control)));
        }
        let result = BranchingEngine::evaluate(&OrganizationProfile::baseline(OrgType::NonProfit));
        assert!(!result.is_activated(&id("MOH-G.1")));
    }

    #[test]
    fn test_cloud_and_ai_rules() {
        let mut profile = OrganizationProfile::baseline(OrgType::Clinic);
        profile.uses_cloud = CloudUsage::Partial;
        profile.uses_ai_or_automated_decisions = true;
        let result = BranchingEngine::evaluate(&profile);
        assert!(result.is_activated(&id("NCA-ECC-4.2.1")));
        assert!(result.is_activated(&id("PDPL-AI.1")));
        assert!(result.is_activated(&id("PDPL-D.1")));
    }

    #[test]
    fn test_na_wins_over_matching_condition() {
        let profile = OrganizationProfile::baseline(OrgType::Clinic);
        let mut result = BranchingEngine::evaluate(&profile);
        result.activate(&["PDPL-T.1"]);
        let conditions = [ApplicabilityCondition::OrgType(OrgType::Clinic)];
        assert!(!BranchingEngine::is_applicable(&id("PDPL-T.1"), &conditions, &profile, &result));
    }

    #[test]
    fn test_conditions_must_all_match() {
        let mut profile = OrganizationProfile::baseline(OrgType::Clinic);
        profile.processes_minors = true;
        let result = BranchingEngine::evaluate(&profile);
        let conditions = [
            ApplicabilityCondition::ProcessesMinors(true),
            ApplicabilityCondition::ConductsResearch(true),
        ];
        assert!(!BranchingEngine::is_applicable(&id("X-1"), &conditions, &profile, &result));

        profile.conducts_research = true;
        assert!(BranchingEngine::is_applicable(&id("X-1"), &conditions, &profile, &result));
    }

    #[test]
    fn test_activation_does_not_gate() {
        // Not activated, no conditions, not N/A: still applicable.
        let profile = OrganizationProfile::baseline(OrgType::PrivateCompany);
        let result = BranchingEngine::evaluate(&profile);
        assert!(!result.is_activated(&id("PDPL-T.4")));
        assert!(BranchingEngine::is_applicable(&id("PDPL-T.4"), &[], &profile, &result));
    }

    #[test]
    fn test_applicable_controls_respects_conditions() {
        let catalog = ControlCatalog::builtin().unwrap();
        let profile = OrganizationProfile::baseline(OrgType::PrivateCompany);
        let result = BranchingEngine::evaluate(&profile);
        let applicable: Vec<_> = BranchingEngine::applicable_controls(&catalog, &profile, &result)
            .into_iter()
            .map(|c| c.id.as_str())
            .collect();
        assert!(!applicable.contains(&"PDPL-M.1"));
        assert!(!applicable.contains(&"PDPL-T.1"));
        assert!(applicable.contains(&"PDPL-G.1"));
    }

    #[test]
    fn test_na_forbidden() {
        let catalog = ControlCatalog::builtin().unwrap();
        let dpo = catalog.find("MOH-G.1").unwrap();
        assert!(BranchingEngine::na_forbidden(dpo, OrgType::Hospital));
        assert!(!BranchingEngine::na_forbidden(dpo, OrgType::PrivateCompany));

        let training = catalog.find("MOH-A.1").unwrap();
        assert!(BranchingEngine::na_forbidden(training, OrgType::Pharmacy));

        let policy = catalog.find("PDPL-G.1").unwrap();
        assert!(!BranchingEngine::na_forbidden(policy, OrgType::Hospital));
    }

    #[test]
    fn test_transfer_suspension_family() {
        assert!(BranchingEngine::in_transfer_suspension_family(&id("PDPL-TS.1")));
        assert!(!BranchingEngine::in_transfer_suspension_family(&id("PDPL-T.1")));
    }
}
