//! Named decision rules
//!
//! The execute decision is an ordered sequence of rules folded over a single
//! accumulator. Each rule reports whether it fires, an optional override of
//! the execute flag, and the reason line it contributes to the audit trail.
//! Rules later in the list win on conflict; every firing rule is recorded in
//! order, whether or not it changed the final answer.

use crate::common::types::Outcome;
use crate::config::EngineConfig;

/// Result of evaluating one rule
#[derive(Debug, Clone)]
pub struct RuleOutcome {
    pub name: &'static str,
    pub fires: bool,
    /// When firing, optionally force the execute flag to this value
    pub override_execute: Option<bool>,
    pub reason: String,
}

impl RuleOutcome {
    fn skip(name: &'static str) -> Self {
        Self {
            name,
            fires: false,
            override_execute: None,
            reason: String::new(),
        }
    }

    fn note(name: &'static str, reason: impl Into<String>) -> Self {
        Self {
            name,
            fires: true,
            override_execute: None,
            reason: reason.into(),
        }
    }

    fn force(name: &'static str, execute: bool, reason: impl Into<String>) -> Self {
        Self {
            name,
            fires: true,
            override_execute: Some(execute),
            reason: reason.into(),
        }
    }
}

/// Facts the rules are evaluated against, all computed before the fold
#[derive(Debug)]
pub struct RuleContext<'a> {
    pub ml_confidence: f64,
    pub outcome_match: bool,
    pub declared_outcome: Option<Outcome>,
    pub predicted_outcome: Outcome,
    pub is_cheaper_outcome: bool,
    pub is_active_hour: bool,
    pub hour: u32,
    pub recommended_size_usd: f64,
    pub size_was_capped: bool,
    pub config: &'a EngineConfig,
}

/// Evaluate all rules in order and fold them into the final execute flag
/// plus the complete audit trail.
pub fn evaluate_rules(ctx: &RuleContext<'_>) -> (bool, Vec<String>) {
    let outcomes = [
        high_confidence(ctx),
        outcome_match(ctx),
        mismatch_override(ctx),
        cheaper_outcome(ctx),
        cheapness_veto(ctx),
        active_hour(ctx),
        inactivity_veto(ctx),
        size_capped(ctx),
        below_minimum(ctx),
    ];

    let mut execute = false;
    let mut reasons = Vec::new();
    for outcome in outcomes {
        if !outcome.fires {
            continue;
        }
        reasons.push(outcome.reason);
        if let Some(forced) = outcome.override_execute {
            execute = forced;
        }
    }
    (execute, reasons)
}

fn high_confidence(ctx: &RuleContext<'_>) -> RuleOutcome {
    if ctx.ml_confidence >= ctx.config.min_confidence {
        RuleOutcome::force(
            "high-confidence",
            true,
            format!("High ML confidence ({:.1}%)", ctx.ml_confidence * 100.0),
        )
    } else {
        RuleOutcome::skip("high-confidence")
    }
}

fn outcome_match(ctx: &RuleContext<'_>) -> RuleOutcome {
    if ctx.outcome_match {
        RuleOutcome::force(
            "outcome-match",
            true,
            "Trader outcome matches ML prediction",
        )
    } else {
        let declared = ctx
            .declared_outcome
            .map(|o| o.to_string())
            .unwrap_or_default();
        RuleOutcome::note(
            "outcome-match",
            format!(
                "Trader outcome ({declared}) differs from ML ({})",
                ctx.predicted_outcome
            ),
        )
    }
}

fn mismatch_override(ctx: &RuleContext<'_>) -> RuleOutcome {
    if !ctx.outcome_match && ctx.ml_confidence >= ctx.config.override_confidence {
        RuleOutcome::force(
            "mismatch-override",
            true,
            "Executing despite mismatch due to very high confidence",
        )
    } else {
        RuleOutcome::skip("mismatch-override")
    }
}

fn cheaper_outcome(ctx: &RuleContext<'_>) -> RuleOutcome {
    if ctx.is_cheaper_outcome {
        RuleOutcome::note("cheaper-outcome", "Buying cheaper outcome (pattern match)")
    } else {
        RuleOutcome::note("cheaper-outcome", "Not buying cheaper outcome")
    }
}

fn cheapness_veto(ctx: &RuleContext<'_>) -> RuleOutcome {
    if !ctx.is_cheaper_outcome && ctx.ml_confidence < ctx.config.veto_confidence {
        RuleOutcome::force("cheapness-veto", false, "Low confidence + not cheaper = skip")
    } else {
        RuleOutcome::skip("cheapness-veto")
    }
}

fn active_hour(ctx: &RuleContext<'_>) -> RuleOutcome {
    if ctx.is_active_hour {
        RuleOutcome::note(
            "active-hour",
            format!("Active trading hour ({}:00)", ctx.hour),
        )
    } else {
        RuleOutcome::note("active-hour", format!("Less active hour ({}:00)", ctx.hour))
    }
}

fn inactivity_veto(ctx: &RuleContext<'_>) -> RuleOutcome {
    if !ctx.is_active_hour && ctx.ml_confidence < ctx.config.veto_confidence {
        RuleOutcome::force(
            "inactivity-veto",
            false,
            "Low confidence + inactive hour = skip",
        )
    } else {
        RuleOutcome::skip("inactivity-veto")
    }
}

fn size_capped(ctx: &RuleContext<'_>) -> RuleOutcome {
    if ctx.size_was_capped {
        RuleOutcome::note("size-capped", "Capped size to available balance")
    } else {
        RuleOutcome::skip("size-capped")
    }
}

fn below_minimum(ctx: &RuleContext<'_>) -> RuleOutcome {
    if ctx.recommended_size_usd < ctx.config.min_order_usd {
        RuleOutcome::force(
            "below-minimum",
            false,
            format!(
                "Recommended size (${:.2}) below minimum (${:.2})",
                ctx.recommended_size_usd, ctx.config.min_order_usd
            ),
        )
    } else {
        RuleOutcome::skip("below-minimum")
    }
}
