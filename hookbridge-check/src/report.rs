//! Dry-run admission of a hook manifest.
//!
//! Every request in the manifest goes through the same resolution and policy
//! path as a live registration, without installing anything.

use hookbridge_runtime::{
    admit, HookManifest, HookRequest, MethodResolver, RegistrationError, SecurityPolicy, TypeRef,
};
use std::fmt;

/// Outcome of admitting one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The request resolves to a hookable method.
    Admitted {
        method: String,
        overrides: Option<TypeRef>,
    },
    /// The request would be rejected at registration.
    Rejected(RegistrationError),
}

impl Verdict {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Verdict::Admitted { .. })
    }
}

/// A request paired with its verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct HookVerdict {
    pub request: HookRequest,
    pub verdict: Verdict,
}

impl fmt::Display for HookVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.verdict {
            Verdict::Admitted {
                method,
                overrides: Some(return_type),
            } => write!(f, "ok    {} (overrides {})", method, return_type),
            Verdict::Admitted { method, .. } => write!(f, "ok    {}", method),
            Verdict::Rejected(err) => write!(f, "FAIL  {}: {}", self.request, err),
        }
    }
}

/// Verdicts for a whole manifest, in manifest order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    verdicts: Vec<HookVerdict>,
}

impl Report {
    /// Admit every request in `manifest`.
    pub fn check(
        resolver: &dyn MethodResolver,
        policy: &SecurityPolicy,
        manifest: &HookManifest,
    ) -> Self {
        let verdicts = manifest
            .hooks
            .iter()
            .map(|request| {
                let verdict = match admit(resolver, policy, request) {
                    Ok(method) => Verdict::Admitted {
                        method: method.to_string(),
                        overrides: request.returns.then(|| method.return_type.clone()),
                    },
                    Err(e) => Verdict::Rejected(e),
                };
                HookVerdict {
                    request: request.clone(),
                    verdict,
                }
            })
            .collect();

        Self { verdicts }
    }

    pub fn verdicts(&self) -> &[HookVerdict] {
        &self.verdicts
    }

    pub fn admitted(&self) -> usize {
        self.verdicts
            .iter()
            .filter(|v| v.verdict.is_admitted())
            .count()
    }

    pub fn rejected(&self) -> usize {
        self.verdicts.len() - self.admitted()
    }

    /// True when every request would be admitted.
    pub fn is_clean(&self) -> bool {
        self.rejected() == 0
    }
}
