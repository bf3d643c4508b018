//! Regime handler functions and table builder.
//!
//! ```text
//!  NON-COOKING (single tier)
//!    gas >= safe ──▶ alert raised ──[dwell elapsed]──▶ valve closed
//!    gas <  safe ──▶ reset (valve reopened if closed)
//!
//!  COOKING (tiered)
//!    gas <  warning           ──▶ reset
//!    warning <= gas < danger  ──▶ warning alert, valve stays open
//!    gas >= danger            ──▶ valve closed immediately
//! ```

use super::context::EvalContext;
use super::context::OperatingMode;
use super::{AlertEvent, RegimeDescriptor};
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the regime table.  Called once at startup.
pub fn build_regime_table() -> [RegimeDescriptor; OperatingMode::COUNT] {
    [
        // Index 0: NonCooking
        RegimeDescriptor {
            mode: OperatingMode::NonCooking,
            name: "NonCooking",
            on_enter: Some(non_cooking_enter),
            on_evaluate: non_cooking_evaluate,
        },
        // Index 1: Cooking
        RegimeDescriptor {
            mode: OperatingMode::Cooking,
            name: "Cooking",
            on_enter: Some(cooking_enter),
            on_evaluate: cooking_evaluate,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  NON-COOKING regime
// ═══════════════════════════════════════════════════════════════════════════

fn non_cooking_enter(ctx: &mut EvalContext<'_>) {
    if ctx.state.alert_active {
        ctx.state.alert_active = false;
        info!("NON-COOKING: cooking alert silenced");
    }
    // The valve is reading-gated; only a safe reading reopens it.
    if ctx.state.valve_closed {
        warn!("NON-COOKING: valve remains closed until gas reads safe");
    }
}

fn non_cooking_evaluate(ctx: &mut EvalContext<'_>) {
    if ctx.gas < ctx.thresholds.safe {
        if ctx.state.is_alarmed() {
            info!(
                "NON-COOKING: gas {} < {} safe, resetting",
                ctx.gas, ctx.thresholds.safe
            );
        }
        ctx.clear();
        return;
    }

    if ctx.stamp_alert() {
        warn!(
            "NON-COOKING: gas {} >= {} safe, alert raised",
            ctx.gas, ctx.thresholds.safe
        );
        ctx.raise(AlertEvent::LeakDetected);
        return;
    }

    if ctx.alert_age_ms() >= u64::from(ctx.policy.valve_close_delay_ms)
        && ctx.close_valve()
    {
        warn!(
            "NON-COOKING: gas {} held for {} ms, valve closed",
            ctx.gas,
            ctx.alert_age_ms()
        );
        ctx.raise(AlertEvent::ValveClosed);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  COOKING regime
// ═══════════════════════════════════════════════════════════════════════════

fn cooking_enter(ctx: &mut EvalContext<'_>) {
    if ctx.state.alert_active {
        info!("COOKING: existing alert carried over");
    } else {
        info!("COOKING: tiered thresholds active");
    }
}

fn cooking_evaluate(ctx: &mut EvalContext<'_>) {
    let t = ctx.thresholds;

    if ctx.gas < t.warning {
        if ctx.state.is_alarmed() {
            info!("COOKING: gas {} < {} warning, resetting", ctx.gas, t.warning);
        }
        ctx.clear();
        return;
    }

    if ctx.gas < t.danger {
        if ctx.stamp_alert() {
            info!("COOKING: gas {} in warning band", ctx.gas);
            ctx.raise(AlertEvent::CookingWarning);
        }
        return;
    }

    // Danger band: no dwell.
    ctx.stamp_alert();
    if ctx.close_valve() {
        warn!("COOKING: gas {} >= {} danger, valve closed", ctx.gas, t.danger);
        ctx.raise(AlertEvent::ExtremeDanger);
        ctx.raise(AlertEvent::ValveClosed);
    }
    if ctx.policy.cooking_danger_forces_non_cooking {
        warn!("COOKING: danger forces non-cooking mode");
        ctx.state.mode = OperatingMode::NonCooking;
    }
}
