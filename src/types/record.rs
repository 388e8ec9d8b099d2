//! Contact records returned by the profile API

use std::fmt;

use serde::Serialize;

use crate::types::Target;

/// Contact type codes used by the profile API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactType {
    Email,
    PhoneOrAgreement,
    Address,
    Unknown,
}

impl ContactType {
    /// Map the API's numeric contactType code.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => ContactType::Email,
            2 => ContactType::PhoneOrAgreement,
            3 => ContactType::Address,
            _ => ContactType::Unknown,
        }
    }
}

impl fmt::Display for ContactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContactType::Email => "Email",
            ContactType::PhoneOrAgreement => "Phone/Agreement",
            ContactType::Address => "Address",
            ContactType::Unknown => "Unknown",
        };
        write!(f, "{}", label)
    }
}

/// One contact entry found for a target.
#[derive(Debug, Clone, Serialize)]
pub struct ContactRecord {
    /// Masked contact value, e.g. "79*****4567"
    pub value: String,

    pub contact_type: ContactType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreement_id: Option<String>,

    /// Regional branch the record was found in
    pub domain: String,

    /// Service address attached to the agreement, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl fmt::Display for ContactRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] in {}", self.value, self.contact_type, self.domain)?;
        if let Some(ref id) = self.agreement_id {
            write!(f, ", agreement {}", id)?;
        }
        if let Some(ref address) = self.address {
            write!(f, ", address: {}", address)?;
        }
        Ok(())
    }
}

/// Everything found for one target.
#[derive(Debug, Clone, Serialize)]
pub struct ContactReport {
    pub target: Target,
    pub records: Vec<ContactRecord>,
}

impl fmt::Display for ContactReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.target)?;
        for record in &self.records {
            writeln!(f, "  {}", record)?;
        }
        Ok(())
    }
}
