use metrics::counter;

/// Outcome label for `tenant_access_decisions_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantDecision {
    Granted,
    Denied,
    Missing,
    Error,
}

impl TenantDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantDecision::Granted => "granted",
            TenantDecision::Denied => "denied",
            TenantDecision::Missing => "missing",
            TenantDecision::Error => "error",
        }
    }
}

pub fn record_tenant_decision(outcome: TenantDecision) {
    counter!("tenant_access_decisions_total", "outcome" => outcome.as_str()).increment(1);
}
