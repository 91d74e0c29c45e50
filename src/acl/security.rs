//! Principals, security identities and the per-call security context

use crate::error::RegisterError;
use std::collections::HashMap;

/// Claim holding the principal's identity
pub const SUBJECT_CLAIM: &str = "sub";

/// Identity used when the subject claim is missing
pub const SYSTEM_PRINCIPAL: &str = "system";

/// An authenticated (or not) caller, described by token claims
#[derive(Debug, Clone, Default)]
pub struct Authentication {
    pub claims: HashMap<String, String>,
    pub authenticated: bool,
}

impl Authentication {
    /// Authenticated caller whose subject claim is `principal`
    pub fn for_principal(principal: impl Into<String>) -> Self {
        let mut claims = HashMap::new();
        claims.insert(SUBJECT_CLAIM.to_string(), principal.into());
        Self { claims, authenticated: true }
    }

    /// The subject claim, or the system principal when absent
    pub fn subject(&self) -> &str {
        self.claims
            .get(SUBJECT_CLAIM)
            .map(String::as_str)
            .unwrap_or(SYSTEM_PRINCIPAL)
    }
}

/// Security context of one call
#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    authentication: Option<Authentication>,
}

impl SecurityContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(authentication: Authentication) -> Self {
        Self { authentication: Some(authentication) }
    }

    pub fn for_principal(principal: impl Into<String>) -> Self {
        Self::new(Authentication::for_principal(principal))
    }

    pub fn authentication(&self) -> Option<&Authentication> {
        self.authentication.as_ref()
    }

    /// Principal SID of the authenticated caller.
    ///
    /// Fails with [`RegisterError::AnonymousPrincipal`] when there is no
    /// authentication or it is not authenticated.
    pub fn require_principal(&self) -> Result<Sid, RegisterError> {
        match &self.authentication {
            Some(auth) if auth.authenticated => Ok(Sid::Principal(auth.subject().to_string())),
            _ => Err(RegisterError::AnonymousPrincipal),
        }
    }
}

/// Security identity an ACL entry is granted to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sid {
    Principal(String),
    Authority(String),
}

impl Sid {
    pub fn principal(name: impl Into<String>) -> Self {
        Sid::Principal(name.into())
    }

    pub fn authority(name: impl Into<String>) -> Self {
        Sid::Authority(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            Sid::Principal(name) | Sid::Authority(name) => name,
        }
    }

    pub fn is_principal(&self) -> bool {
        matches!(self, Sid::Principal(_))
    }
}

/// A securable entity instance: its ACL class and identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectIdentity {
    pub class: String,
    pub identifier: i64,
}

impl ObjectIdentity {
    pub fn new(class: impl Into<String>, identifier: i64) -> Self {
        Self { class: class.into(), identifier }
    }
}
