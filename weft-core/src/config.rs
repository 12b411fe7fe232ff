//! Provider-wide tag configuration.
//!
//! [`TagsConfig`] is assembled once while the provider is configured and is
//! read concurrently by every invocation afterwards. It is decoded from the
//! provider configuration block and can be overlaid with environment
//! variables.

use crate::{error::ConfigError, tags::KeyValueTags};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};

/// Prefix of environment variables contributing default tags.
pub const DEFAULT_TAGS_ENV_PREFIX: &str = "WEFT_DEFAULT_TAGS_";
/// Comma separated tag keys to ignore.
pub const IGNORE_TAGS_KEYS_ENV: &str = "WEFT_IGNORE_TAGS_KEYS";
/// Comma separated tag key prefixes to ignore.
pub const IGNORE_TAGS_KEY_PREFIXES_ENV: &str = "WEFT_IGNORE_TAGS_KEY_PREFIXES";
/// Tag policy compliance severity.
pub const TAG_POLICY_COMPLIANCE_ENV: &str = "WEFT_TAG_POLICY_COMPLIANCE";

/// Tags merged into every managed resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultConfig {
    /// The default tags.
    #[serde(default)]
    pub tags: KeyValueTags,
}

impl DefaultConfig {
    /// Default tags overridden by the resource's own tags.
    pub fn merge_tags(&self, tags: &KeyValueTags) -> KeyValueTags {
        self.tags.merge(tags)
    }

    /// Whether `key = value` is one of the default tags.
    pub fn contains(&self, key: &str, value: &str) -> bool {
        self.tags.contains(key, value)
    }
}

/// Tag keys and key prefixes the provider never manages or reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreConfig {
    /// Exact keys.
    #[serde(default)]
    pub keys: BTreeSet<String>,
    /// Key prefixes.
    #[serde(default)]
    pub key_prefixes: BTreeSet<String>,
}

impl IgnoreConfig {
    /// Whether `key` matches an exact key or a prefix.
    pub fn ignores(&self, key: &str) -> bool {
        self.keys.contains(key) || self.key_prefixes.iter().any(|p| key.starts_with(p.as_str()))
    }

    /// Whether no rule is configured.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.key_prefixes.is_empty()
    }
}

/// How violations of the tag policy are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicySeverity {
    /// Missing required tags fail the plan.
    Error,
    /// Missing required tags produce a warning.
    Warning,
    /// The policy is not enforced.
    Disabled,
}

impl FromStr for PolicySeverity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(PolicySeverity::Error),
            "warning" => Ok(PolicySeverity::Warning),
            "disabled" => Ok(PolicySeverity::Disabled),
            _ => Err(()),
        }
    }
}

impl fmt::Display for PolicySeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicySeverity::Error => f.write_str("error"),
            PolicySeverity::Warning => f.write_str("warning"),
            PolicySeverity::Disabled => f.write_str("disabled"),
        }
    }
}

/// Required-tag policy enforced at plan time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPolicyConfig {
    /// Reporting severity; unset means the environment decides.
    #[serde(default)]
    pub severity: Option<PolicySeverity>,
    /// Keys every tagged resource must carry.
    #[serde(default)]
    pub required_keys: BTreeSet<String>,
}

impl TagPolicyConfig {
    /// The severity in force, `Disabled` when unset.
    pub fn effective_severity(&self) -> PolicySeverity {
        self.severity.unwrap_or(PolicySeverity::Disabled)
    }
}

/// The complete provider-wide tag configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagsConfig {
    /// Default tags.
    #[serde(default)]
    pub default_tags: DefaultConfig,
    /// Ignore rules.
    #[serde(default)]
    pub ignore_tags: IgnoreConfig,
    /// Optional tag policy.
    #[serde(default)]
    pub tag_policy: Option<TagPolicyConfig>,
}

impl TagsConfig {
    /// Decode the provider configuration block.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Overlay the process environment. See [`TagsConfig::with_env`].
    pub fn with_process_env(self) -> Result<Self, ConfigError> {
        self.with_env(std::env::vars())
    }

    /// Overlay environment variables.
    ///
    /// - Default tags from `WEFT_DEFAULT_TAGS_<key>`; configured tags win.
    /// - Ignore keys and prefixes are unioned with the configured rules.
    /// - The policy severity from the environment applies only when none is
    ///   configured, so an explicit `disabled` always wins.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut env_defaults = KeyValueTags::new();
        let mut env_severity = None;

        for (key, value) in vars {
            let (key, value) = (key.as_ref(), value.as_ref());
            if let Some(tag_key) = key.strip_prefix(DEFAULT_TAGS_ENV_PREFIX) {
                env_defaults.insert(tag_key, value);
            } else if key == IGNORE_TAGS_KEYS_ENV {
                self.ignore_tags.keys.extend(split_list(value));
            } else if key == IGNORE_TAGS_KEY_PREFIXES_ENV {
                self.ignore_tags.key_prefixes.extend(split_list(value));
            } else if key == TAG_POLICY_COMPLIANCE_ENV && !value.is_empty() {
                env_severity = Some(value.to_owned());
            }
        }

        self.default_tags.tags = env_defaults.merge(&self.default_tags.tags);

        if let Some(value) = env_severity {
            let severity = value.parse::<PolicySeverity>().map_err(|()| {
                ConfigError::InvalidSeverity {
                    value: value.clone(),
                    source_name: TAG_POLICY_COMPLIANCE_ENV.to_owned(),
                }
            })?;
            let policy = self.tag_policy.get_or_insert_with(TagPolicyConfig::default);
            if policy.severity.is_none() {
                policy.severity = Some(severity);
            }
        }

        Ok(self)
    }
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_block() {
        let config = TagsConfig::from_json(json!({
            "default_tags": {"tags": {"Team": "infra"}},
            "ignore_tags": {"keys": ["Owner"], "key_prefixes": ["kubernetes.io/"]},
            "tag_policy": {"severity": "warning", "required_keys": ["CostCenter"]}
        }))
        .unwrap();

        assert!(config.default_tags.contains("Team", "infra"));
        assert!(config.ignore_tags.ignores("Owner"));
        assert!(config.ignore_tags.ignores("kubernetes.io/cluster"));
        assert!(!config.ignore_tags.ignores("Name"));
        let policy = config.tag_policy.unwrap();
        assert_eq!(policy.effective_severity(), PolicySeverity::Warning);
        assert!(policy.required_keys.contains("CostCenter"));
    }

    #[test]
    fn test_decode_rejects_bad_severity() {
        let err = TagsConfig::from_json(json!({"tag_policy": {"severity": "loud"}}));
        assert!(matches!(err, Err(ConfigError::Decode(_))));
    }

    #[test]
    fn test_env_default_tags_lose_to_configured() {
        let mut config = TagsConfig::default();
        config.default_tags.tags.insert("Team", "configured");

        let config = config
            .with_env([
                ("WEFT_DEFAULT_TAGS_Team", "env"),
                ("WEFT_DEFAULT_TAGS_Env", "dev"),
                ("PATH", "/usr/bin"),
            ])
            .unwrap();

        assert_eq!(config.default_tags.tags.get("Team"), Some("configured"));
        assert_eq!(config.default_tags.tags.get("Env"), Some("dev"));
        assert_eq!(config.default_tags.tags.len(), 2);
    }

    #[test]
    fn test_env_ignore_lists_are_trimmed_and_unioned() {
        let mut config = TagsConfig::default();
        config.ignore_tags.keys.insert("Owner".to_owned());

        let config = config
            .with_env([
                (IGNORE_TAGS_KEYS_ENV, " Creator , ,LastScanned"),
                (IGNORE_TAGS_KEY_PREFIXES_ENV, "k8s/"),
            ])
            .unwrap();

        let keys: Vec<_> = config.ignore_tags.keys.iter().map(String::as_str).collect();
        assert_eq!(keys, ["Creator", "LastScanned", "Owner"]);
        assert!(config.ignore_tags.ignores("k8s/node"));
    }

    #[test]
    fn test_env_severity() {
        let config = TagsConfig::default()
            .with_env([(TAG_POLICY_COMPLIANCE_ENV, "error")])
            .unwrap();
        assert_eq!(
            config.tag_policy.unwrap().effective_severity(),
            PolicySeverity::Error
        );

        let disabled = TagsConfig {
            tag_policy: Some(TagPolicyConfig {
                severity: Some(PolicySeverity::Disabled),
                ..TagPolicyConfig::default()
            }),
            ..TagsConfig::default()
        }
        .with_env([(TAG_POLICY_COMPLIANCE_ENV, "error")])
        .unwrap();
        assert_eq!(
            disabled.tag_policy.unwrap().effective_severity(),
            PolicySeverity::Disabled
        );

        let err = TagsConfig::default().with_env([(TAG_POLICY_COMPLIANCE_ENV, "loud")]);
        assert!(matches!(err, Err(ConfigError::InvalidSeverity { .. })));
    }
}
