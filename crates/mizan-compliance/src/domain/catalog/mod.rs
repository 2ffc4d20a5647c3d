//! Control Catalog
//!
//! Static reference data: one row per regulatory control. Loaded once at
//! startup, validated, then shared read-only behind an `Arc`.

pub mod moh;
pub mod nca_ecc;
pub mod pdpl;

use mizan_common::{ControlId, IdError, Role};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use super::branching::ApplicabilityCondition;
use super::profile::OrgType;
use super::value_objects::Answer;

/// Upper bound for `points_yes`
pub const MAX_CONTROL_POINTS: u32 = 10;

/// Regulatory source of a control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlSource {
    /// Personal Data Protection Law
    Pdpl,
    /// NCA Essential Cybersecurity Controls
    NcaEcc,
    /// Ministry of Health requirements
    Moh,
}

impl fmt::Display for ControlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdpl => write!(f, "PDPL"),
            Self::NcaEcc => write!(f, "NCA ECC"),
            Self::Moh => write!(f, "MOH"),
        }
    }
}

/// Control risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl RiskLevel {
    /// Sort key, lower is more urgent
    pub fn priority(&self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }

    /// Closing a task at this level needs linked evidence
    pub fn requires_closure_evidence(&self) -> bool {
        matches!(self, Self::Critical | Self::High)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_weight() -> f64 {
    1.0
}

/// Control definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Control {
    pub id: ControlId,
    pub source: ControlSource,
    pub domain_number: u8,
    pub title: String,
    pub risk_level: RiskLevel,
    pub points_yes: u32,
    pub points_partial: u32,
    #[serde(default = "default_weight")]
    pub weight_multiplier: f64,
    #[serde(default)]
    pub responsible_roles: Vec<Role>,
    /// Organization types for which N/A is forbidden
    #[serde(default)]
    pub mandatory_for_types: BTreeSet<OrgType>,
    /// Every condition must hold for the control to apply
    #[serde(default)]
    pub conditional_on: Vec<ApplicabilityCondition>,
    /// Article / clause references, joined into the task's legal basis
    #[serde(default)]
    pub citations: Vec<String>,
    #[serde(default)]
    pub evidence_guidance: String,
}

impl Control {
    /// Create a control with default weight and no applicability metadata
    pub fn new(
        id: &str,
        source: ControlSource,
        domain_number: u8,
        title: &str,
        risk_level: RiskLevel,
        points_yes: u32,
        points_partial: u32,
    ) -> Result<Self, CatalogError> {
        Ok(Self {
            id: ControlId::new(id)?,
            source,
            domain_number,
            title: title.to_string(),
            risk_level,
            points_yes,
            points_partial,
            weight_multiplier: default_weight(),
            responsible_roles: Vec::new(),
            mandatory_for_types: BTreeSet::new(),
            conditional_on: Vec::new(),
            citations: Vec::new(),
            evidence_guidance: String::new(),
        })
    }

    pub fn weighted(mut self, weight: f64) -> Self {
        self.weight_multiplier = weight;
        self
    }

    pub fn roles(mut self, roles: &[Role]) -> Self {
        self.responsible_roles = roles.to_vec();
        self
    }

    pub fn mandatory_for(mut self, types: &[OrgType]) -> Self {
        self.mandatory_for_types.extend(types.iter().copied());
        self
    }

    pub fn when(mut self, condition: ApplicabilityCondition) -> Self {
        self.conditional_on.push(condition);
        self
    }

    pub fn cite(mut self, citation: &str) -> Self {
        self.citations.push(citation.to_string());
        self
    }

    pub fn guidance(mut self, text: &str) -> Self {
        self.evidence_guidance = text.to_string();
        self
    }

    /// Points earned for an answer, before weighting
    pub fn points_for(&self, answer: Answer) -> u32 {
        match answer {
            Answer::Yes => self.points_yes,
            Answer::Partial => self.points_partial,
            Answer::No | Answer::Na => 0,
        }
    }

    /// Citation fields concatenated
    pub fn legal_basis(&self) -> String {
        self.citations.join("; ")
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if !(1..=10).contains(&self.domain_number) {
            return Err(CatalogError::InvalidControl {
                id: self.id.clone(),
                reason: format!("domain {} outside 1..=10", self.domain_number),
            });
        }
        if self.points_yes == 0 || self.points_yes > MAX_CONTROL_POINTS {
            return Err(CatalogError::InvalidControl {
                id: self.id.clone(),
                reason: format!("points_yes {} outside 1..={}", self.points_yes, MAX_CONTROL_POINTS),
            });
        }
        if self.points_partial >= self.points_yes {
            return Err(CatalogError::InvalidControl {
                id: self.id.clone(),
                reason: "points_partial must be below points_yes".into(),
            });
        }
        if !self.weight_multiplier.is_finite() || self.weight_multiplier <= 0.0 {
            return Err(CatalogError::InvalidControl {
                id: self.id.clone(),
                reason: format!("weight {} must be positive", self.weight_multiplier),
            });
        }
        Ok(())
    }
}

/// Catalog errors, raised at load time only
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid control id: {0}")]
    InvalidId(#[from] IdError),
    #[error("duplicate control {0}")]
    Duplicate(ControlId),
    #[error("control {id}: {reason}")]
    InvalidControl { id: ControlId, reason: String },
    #[error("catalog parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Thematic domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub number: u8,
    pub name: String,
}

fn builtin_domains() -> Vec<Domain> {
    [
        (1, "Governance & Accountability"),
        (2, "Lawful Basis & Consent"),
        (3, "Data Subject Rights"),
        (4, "Minimisation & Retention"),
        (5, "Risk Assessment & DPIA"),
        (6, "Cross-Border Transfers"),
        (7, "Information Security"),
        (8, "Processors & Third Parties"),
        (9, "Breach Management"),
        (10, "Training & Awareness"),
    ]
    .into_iter()
    .map(|(number, name)| Domain { number, name: name.to_string() })
    .collect()
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default = "builtin_domains")]
    domains: Vec<Domain>,
    controls: Vec<Control>,
}

/// Validated, immutable control catalog
#[derive(Debug, Clone)]
pub struct ControlCatalog {
    controls: Vec<Control>,
    index: HashMap<ControlId, usize>,
    domains: BTreeMap<u8, String>,
}

impl ControlCatalog {
    /// Build and validate a catalog
    pub fn new(domains: Vec<Domain>, controls: Vec<Control>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(controls.len());
        for (i, control) in controls.iter().enumerate() {
            control.validate()?;
            if index.insert(control.id.clone(), i).is_some() {
                return Err(CatalogError::Duplicate(control.id.clone()));
            }
        }

        let catalog = Self {
            controls,
            index,
            domains: domains.into_iter().map(|d| (d.number, d.name)).collect(),
        };
        tracing::info!(controls = catalog.len(), "control catalog loaded");
        Ok(catalog)
    }

    /// Built-in PDPL, NCA ECC and MOH controls
    pub fn builtin() -> Result<Self, CatalogError> {
        let mut controls = pdpl::controls()?;
        controls.extend(nca_ecc::controls()?);
        controls.extend(moh::controls()?);
        Self::new(builtin_domains(), controls)
    }

    /// Parse an operator-supplied catalog
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.domains, file.controls)
    }

    pub fn get(&self, id: &ControlId) -> Option<&Control> {
        self.index.get(id).map(|&i| &self.controls[i])
    }

    /// Lookup by raw string; malformed IDs simply do not exist
    pub fn find(&self, id: &str) -> Option<&Control> {
        ControlId::new(id).ok().and_then(|id| self.get(&id))
    }

    pub fn contains(&self, id: &ControlId) -> bool {
        self.index.contains_key(id)
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn domain_name(&self, number: u8) -> Option<&str> {
        self.domains.get(&number).map(String::as_str)
    }

    pub fn in_domain(&self, number: u8) -> impl Iterator<Item = &Control> {
        self.controls.iter().filter(move |c| c.domain_number == number)
    }
}
