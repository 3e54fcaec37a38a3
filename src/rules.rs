//! In-memory store of ingress host rules.

/// One hostname declared by an ingress object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Hostname from the ingress rule. Empty when the rule has no `host`.
    pub domain: String,

    /// Name of the ingress object that declared the rule.
    pub owner: String,
}

impl Rule {
    /// Creates a rule.
    #[must_use]
    pub fn new(domain: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            owner: owner.into(),
        }
    }
}

/// Rules currently known for the cluster.
///
/// Duplicates are allowed; entries are identified by `(owner, domain)` when
/// removed. Storage order is insertion order; [`sorted`](Self::sorted)
/// gives the render order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Adds `rule` unconditionally.
    pub fn append(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Overwrites the domain of the first rule owned by `owner`.
    ///
    /// Returns `false` if `owner` has no rule. Further rules of the same
    /// owner keep their domains.
    pub fn update_owner_domain(&mut self, owner: &str, domain: &str) -> bool {
        match self.rules.iter_mut().find(|r| r.owner == owner) {
            Some(rule) => {
                rule.domain = domain.to_string();
                true
            }
            None => false,
        }
    }

    /// Removes the first rule matching both `owner` and `domain`.
    ///
    /// Returns `false` (and changes nothing) if no rule matches.
    pub fn remove_owner_domain(&mut self, owner: &str, domain: &str) -> bool {
        match self
            .rules
            .iter()
            .position(|r| r.owner == owner && r.domain == domain)
        {
            Some(idx) => {
                self.rules.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Returns the rules ordered by case-insensitive domain.
    ///
    /// Rules with equal domains keep their insertion order.
    #[must_use]
    pub fn sorted(&self) -> Vec<&Rule> {
        let mut view: Vec<&Rule> = self.rules.iter().collect();
        view.sort_by_cached_key(|r| r.domain.to_lowercase());
        view
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    /// Number of rules.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the set holds no rules.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
