//! Acting principal and role capabilities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::value_objects::{OrgId, UserId};

/// Organization role
///
/// Closed set; capabilities are attached to the role rather than checked
/// by name at each call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Organization administrator
    Admin,
    /// Data protection officer
    Dpo,
    /// Compliance officer
    ComplianceOfficer,
    /// IT / security staff
    ItSecurity,
    /// Department head
    DepartmentHead,
    /// Regular staff member
    Staff,
    /// External or internal auditor (read only)
    Auditor,
}

impl Role {
    /// May finalize an assessment and lock its score
    pub fn can_finalize_assessments(&self) -> bool {
        matches!(self, Self::Admin | Self::Dpo)
    }

    /// May move a remediation task to CLOSED
    pub fn can_close_tasks(&self) -> bool {
        matches!(self, Self::Admin | Self::Dpo | Self::ComplianceOfficer)
    }

    /// May move a remediation task to DEFERRED
    pub fn can_defer_tasks(&self) -> bool {
        matches!(self, Self::Admin | Self::Dpo | Self::ComplianceOfficer)
    }

    /// May assign remediation task owners
    pub fn can_assign_tasks(&self) -> bool {
        matches!(self, Self::Admin | Self::Dpo | Self::ComplianceOfficer)
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Dpo => "DPO",
            Self::ComplianceOfficer => "COMPLIANCE_OFFICER",
            Self::ItSecurity => "IT_SECURITY",
            Self::DepartmentHead => "DEPARTMENT_HEAD",
            Self::Staff => "STAFF",
            Self::Auditor => "AUDITOR",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown role name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "DPO" => Ok(Self::Dpo),
            "COMPLIANCE_OFFICER" => Ok(Self::ComplianceOfficer),
            "IT_SECURITY" => Ok(Self::ItSecurity),
            "DEPARTMENT_HEAD" => Ok(Self::DepartmentHead),
            "STAFF" => Ok(Self::Staff),
            "AUDITOR" => Ok(Self::Auditor),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// The authenticated principal performing an operation
///
/// Resolved once by the transport layer; the core only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Acting user
    pub user_id: UserId,
    /// Tenant the user acts within
    pub org_id: OrgId,
    /// Role within that tenant
    pub role: Role,
    /// Client address, recorded in the audit trail
    pub ip_address: String,
    /// Client user agent, recorded in the audit trail
    pub user_agent: Option<String>,
}

impl Actor {
    /// Create an actor with an unknown client address
    pub fn new(user_id: UserId, org_id: OrgId, role: Role) -> Self {
        Self {
            user_id,
            org_id,
            role,
            ip_address: "0.0.0.0".into(),
            user_agent: None,
        }
    }

    /// Attach client details
    pub fn with_client(mut self, ip_address: impl Into<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address.into();
        self.user_agent = user_agent;
        self
    }

    /// True if the actor belongs to `org_id`
    pub fn in_org(&self, org_id: &OrgId) -> bool {
        &self.org_id == org_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        assert!(Role::Dpo.can_finalize_assessments());
        assert!(!Role::ComplianceOfficer.can_finalize_assessments());
        assert!(Role::ComplianceOfficer.can_close_tasks());
        assert!(!Role::Staff.can_close_tasks());
        assert!(!Role::Auditor.can_defer_tasks());
        assert!(!Role::DepartmentHead.can_assign_tasks());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("dpo".parse::<Role>(), Ok(Role::Dpo));
        assert_eq!("Compliance_Officer".parse::<Role>(), Ok(Role::ComplianceOfficer));
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_actor_scope() {
        let org = OrgId::generate();
        let actor = Actor::new(UserId::generate(), org.clone(), Role::Staff)
            .with_client("10.0.0.7", Some("mizan-test".into()));
        assert!(actor.in_org(&org));
        assert!(!actor.in_org(&OrgId::generate()));
        assert_eq!(actor.ip_address, "10.0.0.7");
    }
}
