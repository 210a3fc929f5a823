//! Identity key normalization for contact emails and phone numbers.
//!
//! Both canonical forms are pure, total and idempotent. Provider-specific
//! email handling is table driven: each alias-insensitive domain maps to an
//! [`AliasRule`], so adding a provider never touches the grouping code.

use crate::config::AliasDomainConfig;
use std::collections::HashMap;

/// How a mailbox provider treats the local part of its addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasRule {
    pub canonical_domain: String,
    pub strip_plus_tag: bool,
    pub strip_dots: bool,
}

impl AliasRule {
    fn apply(&self, local: &str) -> String {
        let local = if self.strip_plus_tag {
            local.split('+').next().unwrap_or_default()
        } else {
            local
        };

        if self.strip_dots {
            local.replace('.', "")
        } else {
            local.to_string()
        }
    }
}

#[derive(Debug, Clone)]
pub struct IdentityNormalizer {
    rules: HashMap<String, AliasRule>,
}

impl Default for IdentityNormalizer {
    fn default() -> Self {
        let gmail = AliasRule {
            canonical_domain: "gmail.com".to_string(),
            strip_plus_tag: true,
            strip_dots: true,
        };

        let mut rules = HashMap::new();
        rules.insert("gmail.com".to_string(), gmail.clone());
        rules.insert("googlemail.com".to_string(), gmail);

        Self { rules }
    }
}

impl IdentityNormalizer {
    /// Built-in rules plus any providers listed in configuration. Configured
    /// entries override built-ins for the same domain.
    pub fn from_config(extra: &[AliasDomainConfig]) -> Self {
        extra.iter().fold(Self::default(), |normalizer, entry| {
            let domain = entry.domain.trim().to_lowercase();
            let canonical_domain = entry
                .canonical_domain
                .as_deref()
                .map(|d| d.trim().to_lowercase())
                .unwrap_or_else(|| domain.clone());

            normalizer.with_rule(
                &domain,
                AliasRule {
                    canonical_domain,
                    strip_plus_tag: entry.strip_plus_tag,
                    strip_dots: entry.strip_dots,
                },
            )
        })
    }

    pub fn with_rule(mut self, domain: &str, rule: AliasRule) -> Self {
        self.rules.insert(domain.trim().to_lowercase(), rule);
        self
    }

    /// Lower-cased, trimmed address with provider alias rules applied.
    /// Absent or blank input yields an empty string.
    pub fn canonical_email(&self, raw: Option<&str>) -> String {
        let mut email = raw.unwrap_or_default().trim().to_lowercase();
        let mut visited: Vec<String> = Vec::new();

        // A rule can point at a domain that has its own rule. Follow the
        // chain, visiting each domain once, so the result stays idempotent.
        loop {
            let Some((local, domain)) = email.rsplit_once('@') else {
                return email;
            };
            if visited.iter().any(|d| d == domain) {
                return email;
            }
            let Some(rule) = self.rules.get(domain) else {
                return email;
            };

            visited.push(domain.to_string());
            email = format!("{}@{}", rule.apply(local), rule.canonical_domain);
        }
    }
}

/// Digits only. No country-code handling: "+1 555 0100" and "555 0100" are
/// different keys.
pub fn canonical_phone(raw: Option<&str>) -> String {
    raw.unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect()
}
