//! NCA Essential Cybersecurity Controls

use mizan_common::Role;

use super::{CatalogError, Control, ControlSource, RiskLevel};
use crate::domain::branching::ApplicabilityCondition;

/// Get NCA ECC controls
pub fn controls() -> Result<Vec<Control>, CatalogError> {
    use ControlSource::NcaEcc;
    use RiskLevel::*;

    Ok(vec![
        Control::new("NCA-ECC-1.1.1", NcaEcc, 1, "Cybersecurity strategy approved", Medium, 6, 3)?
            .roles(&[Role::Admin])
            .cite("ECC 1-1-1"),
        Control::new("NCA-ECC-2.2.1", NcaEcc, 7, "Identity and access management", High, 8, 4)?
            .roles(&[Role::ItSecurity])
            .cite("ECC 2-2-1")
            .guidance("Access review records and MFA configuration"),
        Control::new("NCA-ECC-2.6.1", NcaEcc, 7, "Encryption of personal data at rest and in transit", Critical, 10, 5)?
            .weighted(1.5)
            .roles(&[Role::ItSecurity])
            .cite("ECC 2-8-1")
            .guidance("Encryption configuration export"),
        Control::new("NCA-ECC-2.12.1", NcaEcc, 7, "Security event logging and monitoring", Medium, 6, 3)?
            .roles(&[Role::ItSecurity])
            .cite("ECC 2-12-1"),
        Control::new("NCA-ECC-2.12.3", NcaEcc, 7, "24x7 security operations coverage", Medium, 6, 3)?
            .when(ApplicabilityCondition::ContinuousMonitoring(true))
            .cite("ECC 2-12-3"),
        Control::new("NCA-ECC-4.2.1", NcaEcc, 7, "Cloud service cybersecurity requirements", High, 8, 4)?
            .roles(&[Role::ItSecurity])
            .cite("ECC 4-2-1")
            .guidance("Cloud provider attestation and shared responsibility matrix"),
        Control::new("NCA-ECC-4.1.1", NcaEcc, 8, "Third-party cybersecurity clauses", Medium, 6, 3)?
            .cite("ECC 4-1-1"),
    ])
}
