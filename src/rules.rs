//! Transient click-validity rules.
//!
//! At most one rule is active at a time and installing a new one replaces
//! it outright, expiry included: expiry is a timestamp swept by the frame
//! loop, so a replaced rule can never clear its successor.

use rand::Rng;

use crate::entities::EntityKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleKind {
    /// Stars become invalid.
    NoStars,
    /// Everything except rockets becomes invalid.
    OnlyRockets,
    /// Everything is valid, bombs and devils included.
    Safety,
}

pub const RULE_CATALOG: [RuleKind; 3] =
    [RuleKind::NoStars, RuleKind::OnlyRockets, RuleKind::Safety];

impl RuleKind {
    /// Warning banner text shown while the rule is active.
    pub fn text(self) -> &'static str {
        match self {
            RuleKind::NoStars => "DON'T CLICK STARS!",
            RuleKind::OnlyRockets => "ONLY CLICK ROCKETS!",
            RuleKind::Safety => "BOMBS ARE SAFE (3s)!",
        }
    }

    pub fn duration_ms(self) -> f64 {
        match self {
            RuleKind::NoStars | RuleKind::OnlyRockets => 5_000.0,
            RuleKind::Safety => 3_000.0,
        }
    }

    /// Validity predicate consulted in place of the default policy.
    pub fn allows(self, kind: EntityKind) -> bool {
        match self {
            RuleKind::NoStars => kind != EntityKind::Star,
            RuleKind::OnlyRockets => kind == EntityKind::Rocket,
            RuleKind::Safety => true,
        }
    }

    pub fn install(self, now_ms: f64) -> ActiveRule {
        ActiveRule {
            kind: self,
            installed_at: now_ms,
            expires_at: now_ms + self.duration_ms(),
        }
    }
}

/// Uniform pick from the catalog.
pub fn pick_rule(rng: &mut impl Rng) -> RuleKind {
    RULE_CATALOG[rng.gen_range(0..RULE_CATALOG.len())]
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveRule {
    pub kind: RuleKind,
    pub installed_at: f64,
    pub expires_at: f64,
}

impl ActiveRule {
    pub fn allows(&self, kind: EntityKind) -> bool {
        self.kind.allows(kind)
    }

    pub fn expired(&self, now_ms: f64) -> bool {
        now_ms >= self.expires_at
    }

    pub fn text(&self) -> &'static str {
        self.kind.text()
    }
}
