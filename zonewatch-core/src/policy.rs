//! Zone-downgrade policy evaluation.
//!
//! A pure decision over a file's current zone and the directory rule it
//! matched. The restricted zone is an absolute override: nothing at zone 4
//! is ever acted on, and no rule may assign zone 4.

use std::fmt::{self, Display, Formatter};
use std::path::Path;

use regex::{Regex, RegexBuilder};
use tracing::debug;
use zonewatch_model::{TrustZone, WatchedDirectory};

/// Why a file was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No origin marker present.
    Clean,
    /// File sits in zone 4; protected by policy.
    RestrictedZone,
    /// Marker zone is more trusted than the rule's threshold.
    BelowThreshold,
    /// File name matched an exclude pattern.
    Excluded,
    /// Rule asked for zone 4 as a target, which is never written.
    RestrictedTarget,
}

impl SkipReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            SkipReason::Clean => "clean",
            SkipReason::RestrictedZone => "restricted-zone-protected",
            SkipReason::BelowThreshold => "below-threshold",
            SkipReason::Excluded => "excluded",
            SkipReason::RestrictedTarget => "restricted-target",
        }
    }
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the pipeline should do with a matched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneAction {
    Skip(SkipReason),
    /// Rewrite the marker to the given zone (up or down).
    Assign(TrustZone),
    /// Remove the marker entirely.
    Remove,
}

/// Decide the action for a file at `current` under `rule`.
pub fn evaluate(
    path: &Path,
    current: Option<TrustZone>,
    rule: &WatchedDirectory,
) -> ZoneAction {
    let Some(zone) = current else {
        return ZoneAction::Skip(SkipReason::Clean);
    };

    if zone == TrustZone::Restricted {
        return ZoneAction::Skip(SkipReason::RestrictedZone);
    }

    if let Some(min) = rule.min_zone
        && zone < min
    {
        return ZoneAction::Skip(SkipReason::BelowThreshold);
    }

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or(std::borrow::Cow::Borrowed(""));
    if rule
        .exclude_patterns
        .iter()
        .any(|pattern| glob_match(pattern, &name))
    {
        return ZoneAction::Skip(SkipReason::Excluded);
    }

    match rule.target_zone {
        Some(TrustZone::Restricted) => {
            // Never write zone 4, even on a hand-edited rule.
            debug!(
                "rule for {} targets zone 4, refusing",
                rule.path.display()
            );
            ZoneAction::Skip(SkipReason::RestrictedTarget)
        }
        Some(target) => ZoneAction::Assign(target),
        None => ZoneAction::Remove,
    }
}

/// Case-insensitive glob match: `*` any run of characters, `?` exactly one.
pub fn glob_match(pattern: &str, name: &str) -> bool {
    match glob_regex(pattern) {
        Ok(regex) => regex.is_match(name),
        Err(err) => {
            debug!("unusable exclude pattern {pattern:?}: {err}");
            false
        }
    }
}

fn glob_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => {
                let mut buf = [0u8; 4];
                expr.push_str(&regex::escape(other.encode_utf8(&mut buf)));
            }
        }
    }
    expr.push('$');
    RegexBuilder::new(&expr).case_insensitive(true).build()
}
