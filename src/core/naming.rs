//! core::naming
//!
//! Device name rules: joining and splitting structured device names.
//!
//! # Rules
//!
//! A device name carries five components: system, sector, subsystem,
//! device, and an optional instance. Two mutually incompatible orders are
//! supported:
//!
//! | Rule              | Layout                                   | Example          |
//! |-------------------|------------------------------------------|------------------|
//! | `subsystem-first` | `SYS-SUBSYSTEM:device-sector[-instance]` | `TS-PS:QF-01-1`  |
//! | `sector-first`    | `SYS-sector:SUBSYSTEM-device[-instance]` | `TS-01:PS-QF-1`  |
//!
//! System and subsystem are upper-cased on join. A sector is either a
//! decimal section number or one of the convention's reserved labels
//! (`Fam`, `Glob`). Reserved labels must contain a lowercase letter, which
//! keeps them distinguishable from subsystems and makes the two rules
//! unambiguous: a name produced under one rule never splits under the
//! other.
//!
//! # Example
//!
//! ```
//! use latticenames::core::naming::{NamingConvention, NamingRule};
//!
//! let rule2 = NamingConvention::new(NamingRule::SectorFirst);
//! let name = rule2.join_name("ts", "bpm", "01", "02", None).unwrap();
//! assert_eq!(name, "TS-02:BPM-01");
//!
//! let parts = rule2.split_name(&name).unwrap();
//! assert_eq!(parts.sector(), "02");
//!
//! let rule1 = NamingConvention::new(NamingRule::SubsystemFirst);
//! assert!(rule1.split_name(&name).is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sector label for names that address a whole family.
pub const FAMILY_SECTOR: &str = "Fam";

/// Sector label for names that address a whole system.
pub const GLOBAL_SECTOR: &str = "Glob";

/// Errors from device name handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamingError {
    #[error("invalid {component} '{value}': {reason}")]
    InvalidComponent {
        component: &'static str,
        value: String,
        reason: String,
    },

    #[error("malformed device name '{name}': {reason}")]
    Malformed { name: String, reason: String },

    #[error("device name '{name}' follows the {found} rule, expected {expected}")]
    NamingRuleMismatch {
        name: String,
        expected: NamingRule,
        found: NamingRule,
    },

    #[error("unknown naming rule '{0}', expected 1, 2, subsystem-first or sector-first")]
    UnknownRule(String),
}

/// Serialization order of device names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RuleRepr", into = "String")]
pub enum NamingRule {
    /// `SYS-SUBSYSTEM:device-sector[-instance]` (proposal 1)
    SubsystemFirst,
    /// `SYS-sector:SUBSYSTEM-device[-instance]` (proposal 2)
    SectorFirst,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RuleRepr {
    Number(u8),
    Name(String),
}

impl TryFrom<RuleRepr> for NamingRule {
    type Error = NamingError;

    fn try_from(repr: RuleRepr) -> Result<Self, Self::Error> {
        match repr {
            RuleRepr::Number(n) => n.to_string().parse(),
            RuleRepr::Name(s) => s.parse(),
        }
    }
}

impl From<NamingRule> for String {
    fn from(rule: NamingRule) -> Self {
        rule.to_string()
    }
}

impl NamingRule {
    /// All supported rules.
    pub const ALL: [NamingRule; 2] = [NamingRule::SubsystemFirst, NamingRule::SectorFirst];

    /// The historical proposal number of the rule.
    pub fn number(self) -> u8 {
        match self {
            Self::SubsystemFirst => 1,
            Self::SectorFirst => 2,
        }
    }
}

impl FromStr for NamingRule {
    type Err = NamingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "subsystem-first" => Ok(Self::SubsystemFirst),
            "2" | "sector-first" => Ok(Self::SectorFirst),
            _ => Err(NamingError::UnknownRule(s.to_string())),
        }
    }
}

impl fmt::Display for NamingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubsystemFirst => write!(f, "subsystem-first"),
            Self::SectorFirst => write!(f, "sector-first"),
        }
    }
}

/// Structured components of a device name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DeviceName {
    system: String,
    sector: String,
    subsystem: String,
    device: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    instance: Option<String>,
}

impl DeviceName {
    /// Create a device name, upper-casing system and subsystem.
    ///
    /// # Errors
    ///
    /// Returns `NamingError::InvalidComponent` if a component is empty,
    /// contains a separator (`-`, `:`) or whitespace, or if system or
    /// subsystem are not alphanumeric with a leading letter.
    pub fn new(
        system: &str,
        subsystem: &str,
        device: &str,
        sector: &str,
        instance: Option<&str>,
    ) -> Result<Self, NamingError> {
        let system = system.to_ascii_uppercase();
        let subsystem = subsystem.to_ascii_uppercase();
        check_code("system", &system)?;
        check_code("subsystem", &subsystem)?;
        check_free("device", device)?;
        check_free("sector", sector)?;
        if let Some(idx) = instance {
            check_free("instance", idx)?;
        }

        Ok(Self {
            system,
            sector: sector.to_string(),
            subsystem,
            device: device.to_string(),
            instance: instance.map(str::to_string),
        })
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn sector(&self) -> &str {
        &self.sector
    }

    pub fn subsystem(&self) -> &str {
        &self.subsystem
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn instance(&self) -> Option<&str> {
        self.instance.as_deref()
    }
}

fn check_free(component: &'static str, value: &str) -> Result<(), NamingError> {
    let invalid = |reason: &str| NamingError::InvalidComponent {
        component,
        value: value.to_string(),
        reason: reason.to_string(),
    };
    if value.is_empty() {
        return Err(invalid("cannot be empty"));
    }
    if value.contains(['-', ':']) {
        return Err(invalid("cannot contain '-' or ':'"));
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid("cannot contain whitespace"));
    }
    Ok(())
}

fn check_code(component: &'static str, value: &str) -> Result<(), NamingError> {
    check_free(component, value)?;
    let leading_letter = value.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    if !leading_letter
        || !value
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err(NamingError::InvalidComponent {
            component,
            value: value.to_string(),
            reason: "must be upper-case alphanumeric starting with a letter".into(),
        });
    }
    Ok(())
}

/// A naming rule together with its reserved sector labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConvention {
    rule: NamingRule,
    reserved_sectors: Vec<String>,
}

impl NamingConvention {
    /// Convention with the default reserved sectors (`Fam`, `Glob`).
    pub fn new(rule: NamingRule) -> Self {
        Self {
            rule,
            reserved_sectors: vec![FAMILY_SECTOR.to_string(), GLOBAL_SECTOR.to_string()],
        }
    }

    /// Convention with custom reserved sector labels.
    ///
    /// # Errors
    ///
    /// Returns `NamingError::InvalidComponent` if a label is not a valid
    /// component or has no lowercase letter.
    pub fn with_reserved_sectors<I, S>(rule: NamingRule, labels: I) -> Result<Self, NamingError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let reserved_sectors: Vec<String> = labels.into_iter().map(Into::into).collect();
        for label in &reserved_sectors {
            check_free("sector", label)?;
            if !label.chars().any(|c| c.is_ascii_lowercase()) {
                return Err(NamingError::InvalidComponent {
                    component: "sector",
                    value: label.clone(),
                    reason: "reserved sector labels need a lowercase letter".into(),
                });
            }
        }
        Ok(Self {
            rule,
            reserved_sectors,
        })
    }

    pub fn rule(&self) -> NamingRule {
        self.rule
    }

    pub fn reserved_sectors(&self) -> &[String] {
        &self.reserved_sectors
    }

    /// Build and serialize a device name under this convention.
    ///
    /// # Errors
    ///
    /// Returns `NamingError::InvalidComponent` for invalid components,
    /// including a sector that is neither numeric nor reserved.
    pub fn join_name(
        &self,
        system: &str,
        subsystem: &str,
        device: &str,
        sector: &str,
        instance: Option<&str>,
    ) -> Result<String, NamingError> {
        let name = DeviceName::new(system, subsystem, device, sector, instance)?;
        self.join(&name)
    }

    /// Serialize structured components under this convention.
    ///
    /// # Errors
    ///
    /// Returns `NamingError::InvalidComponent` if the sector is neither
    /// numeric nor reserved.
    pub fn join(&self, name: &DeviceName) -> Result<String, NamingError> {
        self.check_sector(&name.sector)?;
        let mut joined = match self.rule {
            NamingRule::SubsystemFirst => format!(
                "{}-{}:{}-{}",
                name.system, name.subsystem, name.device, name.sector
            ),
            NamingRule::SectorFirst => format!(
                "{}-{}:{}-{}",
                name.system, name.sector, name.subsystem, name.device
            ),
        };
        if let Some(idx) = &name.instance {
            joined.push('-');
            joined.push_str(idx);
        }
        Ok(joined)
    }

    /// Parse a device name produced under this convention.
    ///
    /// # Errors
    ///
    /// - `NamingError::NamingRuleMismatch` if the name is valid only under
    ///   the other rule
    /// - `NamingError::Malformed` if it is valid under neither
    pub fn split_name(&self, name: &str) -> Result<DeviceName, NamingError> {
        let malformed = |reason: String| NamingError::Malformed {
            name: name.to_string(),
            reason,
        };

        let (head, tail) = name
            .split_once(':')
            .ok_or_else(|| malformed("missing ':' separator".into()))?;
        let head: Vec<&str> = head.split('-').collect();
        let tail: Vec<&str> = tail.split('-').collect();
        if head.len() != 2 || !(2..=3).contains(&tail.len()) {
            return Err(malformed(
                "expected 'A-B:C-D' with an optional '-E' suffix".into(),
            ));
        }

        match self.interpret(self.rule, &head, &tail) {
            Ok(parsed) => Ok(parsed),
            Err(err) => {
                let other = match self.rule {
                    NamingRule::SubsystemFirst => NamingRule::SectorFirst,
                    NamingRule::SectorFirst => NamingRule::SubsystemFirst,
                };
                if self.interpret(other, &head, &tail).is_ok() {
                    Err(NamingError::NamingRuleMismatch {
                        name: name.to_string(),
                        expected: self.rule,
                        found: other,
                    })
                } else {
                    Err(malformed(err.to_string()))
                }
            }
        }
    }

    fn interpret(
        &self,
        rule: NamingRule,
        head: &[&str],
        tail: &[&str],
    ) -> Result<DeviceName, NamingError> {
        let instance = tail.get(2).copied();
        let (system, subsystem, device, sector) = match rule {
            NamingRule::SubsystemFirst => (head[0], head[1], tail[0], tail[1]),
            NamingRule::SectorFirst => (head[0], tail[0], tail[1], head[1]),
        };
        // Split input must already be in canonical case.
        check_code("system", system)?;
        check_code("subsystem", subsystem)?;
        self.check_sector(sector)?;
        DeviceName::new(system, subsystem, device, sector, instance)
    }

    fn check_sector(&self, sector: &str) -> Result<(), NamingError> {
        let numeric = !sector.is_empty() && sector.chars().all(|c| c.is_ascii_digit());
        if numeric || self.reserved_sectors.iter().any(|r| r == sector) {
            Ok(())
        } else {
            Err(NamingError::InvalidComponent {
                component: "sector",
                value: sector.to_string(),
                reason: format!(
                    "must be numeric or one of: {}",
                    self.reserved_sectors.join(", ")
                ),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule1() -> NamingConvention {
        NamingConvention::new(NamingRule::SubsystemFirst)
    }

    fn rule2() -> NamingConvention {
        NamingConvention::new(NamingRule::SectorFirst)
    }

    #[test]
    fn join_rule1() {
        assert_eq!(
            rule1().join_name("ts", "ps", "QF", "01", Some("1")).unwrap(),
            "TS-PS:QF-01-1"
        );
        assert_eq!(
            rule1().join_name("TS", "PS", "QD", "02", None).unwrap(),
            "TS-PS:QD-02"
        );
    }

    #[test]
    fn join_rule2() {
        assert_eq!(
            rule2().join_name("ts", "ps", "QF", "01", Some("1")).unwrap(),
            "TS-01:PS-QF-1"
        );
        assert_eq!(
            rule2().join_name("ts", "di", "BPM", FAMILY_SECTOR, None).unwrap(),
            "TS-Fam:DI-BPM"
        );
    }

    #[test]
    fn split_recovers_components() {
        let parts = rule2().split_name("TS-02:BPM-01").unwrap();
        assert_eq!(parts.system(), "TS");
        assert_eq!(parts.sector(), "02");
        assert_eq!(parts.subsystem(), "BPM");
        assert_eq!(parts.device(), "01");
        assert_eq!(parts.instance(), None);

        let parts = rule1().split_name("TS-PS:CV-04-2").unwrap();
        assert_eq!(parts.subsystem(), "PS");
        assert_eq!(parts.device(), "CV");
        assert_eq!(parts.sector(), "04");
        assert_eq!(parts.instance(), Some("2"));
    }

    #[test]
    fn split_detects_rule_mismatch() {
        let name = rule2().join_name("TS", "BPM", "01", "02", None).unwrap();
        assert_eq!(
            rule1().split_name(&name),
            Err(NamingError::NamingRuleMismatch {
                name: name.clone(),
                expected: NamingRule::SubsystemFirst,
                found: NamingRule::SectorFirst,
            })
        );

        let name = rule1().join_name("TS", "PS", "QF", "01", Some("2")).unwrap();
        assert!(matches!(
            rule2().split_name(&name),
            Err(NamingError::NamingRuleMismatch { .. })
        ));
    }

    #[test]
    fn family_names_do_not_cross_rules() {
        let name = rule2().join_name("TS", "DI", "BPM", FAMILY_SECTOR, None).unwrap();
        assert!(matches!(
            rule1().split_name(&name),
            Err(NamingError::NamingRuleMismatch { .. })
        ));
    }

    #[test]
    fn split_rejects_malformed() {
        for name in ["TS", "TS-01", "TS-01-PS-QF", "TS:01:PS", "TS-01:PS-QF-1-2", "TS-xx:PS-QF"] {
            assert!(
                matches!(rule2().split_name(name), Err(NamingError::Malformed { .. })),
                "{name} should be malformed"
            );
        }
    }

    #[test]
    fn split_requires_canonical_case() {
        assert!(rule2().split_name("ts-01:PS-QF").is_err());
    }

    #[test]
    fn join_rejects_invalid_components() {
        assert!(rule2().join_name("", "PS", "QF", "01", None).is_err());
        assert!(rule2().join_name("TS", "P-S", "QF", "01", None).is_err());
        assert!(rule2().join_name("TS", "PS", "Q:F", "01", None).is_err());
        assert!(rule2().join_name("TS", "PS", "QF", "north", None).is_err());
        assert!(rule2().join_name("TS", "PS", "QF", "01", Some("")).is_err());
        assert!(rule2().join_name("TS", "1PS", "QF", "01", None).is_err());
    }

    #[test]
    fn reserved_sectors_need_lowercase() {
        assert!(NamingConvention::with_reserved_sectors(NamingRule::SectorFirst, ["GLOB"]).is_err());
        let conv =
            NamingConvention::with_reserved_sectors(NamingRule::SectorFirst, ["All"]).unwrap();
        assert_eq!(conv.join_name("SI", "PS", "QF", "All", None).unwrap(), "SI-All:PS-QF");
    }

    #[test]
    fn rule_parsing() {
        assert_eq!("1".parse::<NamingRule>().unwrap(), NamingRule::SubsystemFirst);
        assert_eq!("sector-first".parse::<NamingRule>().unwrap(), NamingRule::SectorFirst);
        assert!("3".parse::<NamingRule>().is_err());
        assert_eq!(NamingRule::SectorFirst.number(), 2);
    }

    #[test]
    fn rule_from_toml_number_or_name() {
        #[derive(Deserialize)]
        struct Wrapper {
            rule: NamingRule,
        }
        let w: Wrapper = toml::from_str("rule = 2").unwrap();
        assert_eq!(w.rule, NamingRule::SectorFirst);
        let w: Wrapper = toml::from_str("rule = \"subsystem-first\"").unwrap();
        assert_eq!(w.rule, NamingRule::SubsystemFirst);
        assert!(toml::from_str::<Wrapper>("rule = 7").is_err());
    }
}
