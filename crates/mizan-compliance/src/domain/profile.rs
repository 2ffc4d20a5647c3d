//! Organization Profile
//!
//! The shape the branching rules read. Owned by the organization aggregate
//! outside this crate; the compliance core only reads it.

use serde::{Deserialize, Serialize};

use super::value_objects::Language;

/// Organization category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrgType {
    Hospital,
    Clinic,
    Pharmacy,
    Laboratory,
    HealthInsurer,
    GovernmentEntity,
    PrivateCompany,
    NonProfit,
    Other,
}

impl OrgType {
    /// Health-sector organizations carry the mandatory MOH control group
    pub fn is_health_sector(&self) -> bool {
        matches!(
            self,
            Self::Hospital | Self::Clinic | Self::Pharmacy | Self::Laboratory | Self::HealthInsurer
        )
    }

    pub const HEALTH_SECTOR: [OrgType; 5] = [
        Self::Hospital,
        Self::Clinic,
        Self::Pharmacy,
        Self::Laboratory,
        Self::HealthInsurer,
    ];
}

/// Cloud usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudUsage {
    Yes,
    No,
    Partial,
}

impl CloudUsage {
    pub fn uses_cloud(&self) -> bool {
        matches!(self, Self::Yes | Self::Partial)
    }
}

/// Organization profile collected during onboarding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationProfile {
    pub org_type: OrgType,
    pub processes_minors: bool,
    pub cross_border_transfers: bool,
    pub uses_cloud: CloudUsage,
    pub conducts_research: bool,
    pub uses_ai_or_automated_decisions: bool,
    pub continuous_monitoring: bool,
    #[serde(default)]
    pub preferred_language: Language,
}

impl OrganizationProfile {
    /// Profile with every flag off
    pub fn baseline(org_type: OrgType) -> Self {
        Self {
            org_type,
            processes_minors: false,
            cross_border_transfers: false,
            uses_cloud: CloudUsage::No,
            conducts_research: false,
            uses_ai_or_automated_decisions: false,
            continuous_monitoring: false,
            preferred_language: Language::default(),
        }
    }
}
