//! PDPL Controls
//!
//! Personal Data Protection Law and its Implementing Regulation.

use mizan_common::Role;

use super::{CatalogError, Control, ControlSource, RiskLevel};
use crate::domain::branching::ApplicabilityCondition;

/// Get PDPL controls
pub fn controls() -> Result<Vec<Control>, CatalogError> {
    use ControlSource::Pdpl;
    use RiskLevel::*;

    Ok(vec![
        // Domain 1 - Governance
        Control::new("PDPL-G.1", Pdpl, 1, "Published privacy policy", High, 8, 4)?
            .roles(&[Role::Dpo])
            .cite("PDPL Art. 12")
            .guidance("Current privacy notice and its publication record"),
        Control::new("PDPL-G.12", Pdpl, 1, "Record of processing activities", Medium, 6, 3)?
            .roles(&[Role::Dpo, Role::ComplianceOfficer])
            .cite("PDPL Art. 31")
            .cite("Implementing Regulation Art. 33")
            .guidance("Exported ROPA with owners and review dates"),
        // Domain 2 - Lawful basis
        Control::new("PDPL-C.1", Pdpl, 2, "Documented lawful basis per processing purpose", High, 8, 4)?
            .roles(&[Role::Dpo])
            .cite("PDPL Art. 6")
            .guidance("Purpose register mapping each purpose to its lawful basis"),
        Control::new("PDPL-C.2", Pdpl, 2, "Consent withdrawal mechanism", Medium, 6, 3)?
            .cite("PDPL Art. 5")
            .guidance("Screenshots or procedures showing withdrawal is as easy as consent"),
        Control::new("PDPL-M.1", Pdpl, 2, "Guardian consent for minors' data", Critical, 10, 5)?
            .weighted(1.5)
            .roles(&[Role::Dpo])
            .when(ApplicabilityCondition::ProcessesMinors(true))
            .cite("PDPL Art. 5(2)")
            .guidance("Guardian consent forms and verification procedure"),
        // Domain 3 - Data subject rights
        Control::new("PDPL-R.1", Pdpl, 3, "Access request handling within statutory period", High, 8, 4)?
            .roles(&[Role::Dpo, Role::Staff])
            .cite("PDPL Art. 4")
            .guidance("Request log with response times"),
        Control::new("PDPL-R.2", Pdpl, 3, "Correction and deletion requests", Medium, 6, 3)?
            .cite("PDPL Art. 4")
            .cite("PDPL Art. 18"),
        Control::new("PDPL-M.2", Pdpl, 3, "Rights handling for minors", High, 8, 4)?
            .when(ApplicabilityCondition::ProcessesMinors(true))
            .cite("Implementing Regulation Art. 14"),
        // Domain 4 - Minimisation & retention
        Control::new("PDPL-RT.1", Pdpl, 4, "Retention schedule enforced", Medium, 6, 3)?
            .cite("PDPL Art. 18")
            .guidance("Retention schedule and deletion job logs"),
        Control::new("PDPL-RT.2", Pdpl, 4, "Collection limited to stated purpose", Low, 4, 2)?
            .cite("PDPL Art. 11"),
        // Domain 5 - Risk & DPIA
        Control::new("PDPL-D.1", Pdpl, 5, "DPIA conducted for high-risk processing", High, 8, 4)?
            .roles(&[Role::Dpo])
            .cite("Implementing Regulation Art. 25")
            .guidance("Signed DPIA report"),
        Control::new("PDPL-D.5", Pdpl, 5, "DPIA findings tracked to closure", Medium, 6, 3)?
            .cite("Implementing Regulation Art. 25(4)"),
        Control::new("PDPL-AI.1", Pdpl, 5, "Human review of automated decisions", High, 8, 4)?
            .when(ApplicabilityCondition::UsesAiOrAutomatedDecisions(true))
            .cite("Implementing Regulation Art. 26")
            .guidance("Procedure describing human review and appeal"),
        Control::new("PDPL-RS.1", Pdpl, 5, "Research processing safeguards", Medium, 6, 3)?
            .when(ApplicabilityCondition::ConductsResearch(true))
            .cite("PDPL Art. 27"),
        // Domain 6 - Transfers
        Control::new("PDPL-T.1", Pdpl, 6, "Adequacy assessment before transfer", Critical, 10, 5)?
            .weighted(1.5)
            .roles(&[Role::Dpo, Role::ComplianceOfficer])
            .cite("PDPL Art. 29")
            .cite("Transfer Regulation Art. 2")
            .guidance("Adequacy assessment per destination country"),
        Control::new("PDPL-T.2", Pdpl, 6, "Appropriate safeguards for transfers", High, 8, 4)?
            .cite("Transfer Regulation Art. 5"),
        Control::new("PDPL-T.3", Pdpl, 6, "Transfer register maintained", Medium, 6, 3)?
            .cite("Transfer Regulation Art. 8"),
        Control::new("PDPL-T.4", Pdpl, 6, "Cloud hosting region documented", High, 8, 4)?
            .roles(&[Role::ItSecurity])
            .cite("Transfer Regulation Art. 3"),
        Control::new("PDPL-TS.1", Pdpl, 6, "Transfer suspended on loss of adequacy", Critical, 10, 5)?
            .weighted(1.5)
            .roles(&[Role::Dpo])
            .cite("Transfer Regulation Art. 7")
            .guidance("Suspension decision and notification to the recipient"),
        // Domain 8 - Processors
        Control::new("PDPL-P.1", Pdpl, 8, "Processor agreements in place", High, 8, 4)?
            .cite("PDPL Art. 8"),
        // Domain 9 - Breach
        Control::new("PDPL-B.1", Pdpl, 9, "Breach notification within 72 hours", Critical, 10, 5)?
            .weighted(1.5)
            .roles(&[Role::Dpo, Role::ItSecurity])
            .cite("PDPL Art. 20")
            .cite("Implementing Regulation Art. 24")
            .guidance("Incident response plan and notification template"),
        Control::new("PDPL-B.2", Pdpl, 9, "Breach register maintained", Medium, 6, 3)?
            .cite("Implementing Regulation Art. 24(5)"),
        // Domain 10 - Training
        Control::new("PDPL-TR.1", Pdpl, 10, "Annual privacy awareness training", Low, 4, 2)?
            .roles(&[Role::DepartmentHead])
            .guidance("Attendance records"),
    ])
}
