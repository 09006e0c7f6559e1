use std::fmt;

/// Separates a partner name from the partner's own listing id
pub const NAMESPACE_SEPARATOR: char = ':';

/// Provider a listing id belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProviderNamespace {
    /// The in-house provider
    Default,
    /// A registered partner provider, by name
    Partner(String),
}

/// A listing id tagged with its owning provider.
///
/// Parsed once where a raw id enters the system; downstream code routes on the
/// namespace instead of inspecting the string again.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingRef {
    /// Owning provider
    pub namespace: ProviderNamespace,
    /// Id as understood by the owning provider
    pub local_id: String,
}

impl ListingRef {
    /// Tags a raw id.
    ///
    /// `partner:rest` becomes a partner reference when `is_partner("partner")`
    /// holds. Anything else, including ids whose prefix names no registered
    /// partner, belongs to the default provider unchanged.
    pub fn parse(raw: &str, is_partner: impl Fn(&str) -> bool) -> Self {
        if let Some((prefix, rest)) = raw.split_once(NAMESPACE_SEPARATOR) {
            if is_partner(prefix) {
                return Self::partner(prefix, rest);
            }
        }
        Self::default_provider(raw)
    }

    /// A reference owned by the default provider
    pub fn default_provider(local_id: impl Into<String>) -> Self {
        Self {
            namespace: ProviderNamespace::Default,
            local_id: local_id.into(),
        }
    }

    /// A reference owned by the named partner
    pub fn partner(name: impl Into<String>, local_id: impl Into<String>) -> Self {
        Self {
            namespace: ProviderNamespace::Partner(name.into()),
            local_id: local_id.into(),
        }
    }
}

impl fmt::Display for ListingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            ProviderNamespace::Default => write!(f, "{}", self.local_id),
            ProviderNamespace::Partner(name) => {
                write!(f, "{}{}{}", name, NAMESPACE_SEPARATOR, self.local_id)
            }
        }
    }
}
