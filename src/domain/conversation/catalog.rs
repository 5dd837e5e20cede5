//! Supported support domains and their assistant contexts.
//!
//! A domain scopes both conversations and tickets. Each one carries the
//! system context the assistant is primed with. The built-in catalog can be
//! replaced at startup from a YAML file:
//!
//! ```yaml
//! domains:
//!   - slug: finance
//!     name: Finance
//!     context: |
//!       You are an expert financial assistant...
//! ```

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::domain::foundation::{DomainSlug, ValidationError};

/// One supported domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportDomain {
    pub slug: DomainSlug,
    pub name: String,
    pub context: String,
}

/// Errors raised while loading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read domain catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse domain catalog: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid domain entry: {0}")]
    Invalid(#[from] ValidationError),

    #[error("domain catalog is empty")]
    Empty,

    #[error("domain '{0}' is declared twice")]
    Duplicate(String),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    domains: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    slug: String,
    name: String,
    context: String,
}

/// The set of domains the assistant will answer in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainCatalog {
    domains: Vec<SupportDomain>,
}

static BUILTIN: Lazy<DomainCatalog> = Lazy::new(|| {
    let domains = BUILTIN_DOMAINS
        .iter()
        .filter_map(|(slug, name, context)| {
            DomainSlug::new(*slug).ok().map(|slug| SupportDomain {
                slug,
                name: (*name).to_string(),
                context: context.trim().to_string(),
            })
        })
        .collect();
    DomainCatalog { domains }
});

impl DomainCatalog {
    /// The four domains shipped with the service.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Builds a catalog, rejecting empty lists and duplicate slugs.
    pub fn new(domains: Vec<SupportDomain>) -> Result<Self, CatalogError> {
        if domains.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for domain in &domains {
            if !seen.insert(domain.slug.clone()) {
                return Err(CatalogError::Duplicate(domain.slug.to_string()));
            }
        }
        Ok(Self { domains })
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(raw)?;
        let domains = file
            .domains
            .into_iter()
            .map(|entry| {
                if entry.name.trim().is_empty() {
                    return Err(ValidationError::empty_field("name"));
                }
                if entry.context.trim().is_empty() {
                    return Err(ValidationError::empty_field("context"));
                }
                Ok(SupportDomain {
                    slug: DomainSlug::new(entry.slug)?,
                    name: entry.name.trim().to_string(),
                    context: entry.context.trim().to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(domains)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    /// Resolves user input to a supported domain.
    ///
    /// Accepts the slug or the display name, case-insensitively, with spaces
    /// or underscores in place of dashes ("Technical Support" resolves to
    /// `technical-support`).
    pub fn resolve(&self, input: &str) -> Result<&SupportDomain, ValidationError> {
        let wanted = normalize(input);
        if wanted.is_empty() {
            return Err(ValidationError::empty_field("domain"));
        }
        self.domains
            .iter()
            .find(|d| d.slug.as_str() == wanted || normalize(&d.name) == wanted)
            .ok_or_else(|| {
                ValidationError::invalid_format(
                    "domain",
                    format!(
                        "unsupported domain '{}'; expected one of: {}",
                        input.trim(),
                        self.slugs().join(", ")
                    ),
                )
            })
    }

    /// Looks up a domain by its canonical slug.
    pub fn get(&self, slug: &DomainSlug) -> Option<&SupportDomain> {
        self.domains.iter().find(|d| &d.slug == slug)
    }

    pub fn slugs(&self) -> Vec<&str> {
        self.domains.iter().map(|d| d.slug.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SupportDomain> {
        self.domains.iter()
    }
}

impl Default for DomainCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize(input: &str) -> String {
    input
        .trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

const BUILTIN_DOMAINS: &[(&str, &str, &str)] = &[
    (
        "customer-support",
        "Customer Support",
        r#"
You are a professional customer support assistant specializing in:
- Product support and troubleshooting
- Account management and billing inquiries
- Service requests and escalations
- Policy explanations and procedures
- Refund and return processes
- Order status and shipping information

Always be helpful, empathetic, and solution-oriented. Provide clear, actionable responses.
If you cannot resolve an issue, guide the user to the appropriate escalation path.
"#,
    ),
    (
        "technical-support",
        "Technical Support",
        r#"
You are a technical support assistant expert in:
- System diagnostics and troubleshooting
- Software installation and configuration
- Network connectivity and performance issues
- Hardware problems and maintenance
- Error message interpretation
- Performance optimization

Provide step-by-step technical solutions with clear explanations.
Adjust the level of detail to the user's apparent technical experience.
"#,
    ),
    (
        "finance",
        "Finance",
        r#"
You are a financial assistant covering:
- Personal finance and budgeting
- Banking services and account management
- Insurance and financial planning
- Tax planning and preparation guidance
- Credit and loan information

Provide clear, practical guidance and note that it is not professional financial advice.
Recommend consulting a qualified professional for complex matters.
"#,
    ),
    (
        "travel",
        "Travel",
        r#"
You are a travel assistant specializing in:
- Travel planning and booking assistance
- Destination information and recommendations
- Travel documentation and visa requirements
- Transportation options and accommodation
- Travel safety tips and local customs

Help users plan safe and enjoyable trips, and remind them to verify details independently.
"#,
    ),
];
