use std::collections::BTreeSet;

/// Method names a source type must declare to count as a command message.
pub const MSG_FINGERPRINT: [&str; 5] = [
    "Route",
    "Type",
    "GetSigners",
    "GetSignBytes",
    "ValidateBasic",
];

/// Decides whether a declared method set satisfies a required one.
pub trait CapabilityMatcher: Send + Sync {
    fn matches(&self, required: &[&str], declared: &BTreeSet<String>) -> bool;
}

/// Name-only check: every required name must be declared. Signatures and
/// return types are not inspected, so two unrelated types sharing all the
/// names both match.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodNameMatcher;

impl CapabilityMatcher for MethodNameMatcher {
    fn matches(&self, required: &[&str], declared: &BTreeSet<String>) -> bool {
        required.iter().all(|name| declared.contains(*name))
    }
}
