//! Ministry of Health Controls
//!
//! Mandatory for health-sector organizations: N/A is never accepted.

use mizan_common::Role;

use super::{CatalogError, Control, ControlSource, RiskLevel};
use crate::domain::profile::OrgType;

/// Get MOH controls
pub fn controls() -> Result<Vec<Control>, CatalogError> {
    use ControlSource::Moh;
    use RiskLevel::*;

    Ok(vec![
        Control::new("MOH-G.1", Moh, 1, "Data protection officer appointed", Critical, 10, 5)?
            .weighted(1.5)
            .roles(&[Role::Admin])
            .mandatory_for(&OrgType::HEALTH_SECTOR)
            .cite("MOH Health Data Policy 3.1")
            .cite("PDPL Art. 30")
            .guidance("Appointment letter and DPO contact publication"),
        Control::new("MOH-G.2", Moh, 1, "Segregation of data handling duties", High, 8, 4)?
            .mandatory_for(&OrgType::HEALTH_SECTOR)
            .cite("MOH Health Data Policy 3.4")
            .guidance("RACI matrix for health data handling"),
        Control::new("MOH-G.3", Moh, 1, "Processing stage documentation", High, 8, 4)?
            .mandatory_for(&OrgType::HEALTH_SECTOR)
            .cite("MOH Health Data Policy 4.2"),
        Control::new("MOH-S.1", Moh, 7, "Patient record access logging", High, 8, 4)?
            .roles(&[Role::ItSecurity])
            .mandatory_for(&OrgType::HEALTH_SECTOR)
            .cite("MOH Health Data Policy 6.3"),
        Control::new("MOH-A.1", Moh, 10, "Confidentiality training for clinical staff", Medium, 6, 3)?
            .roles(&[Role::DepartmentHead])
            .mandatory_for(&OrgType::HEALTH_SECTOR)
            .cite("MOH Health Data Policy 7.1"),
    ])
}
