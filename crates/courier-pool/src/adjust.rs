//! The hysteresis rule that rescales the per-host idle ceiling.

use crate::config::PoolConfig;

/// Growth factor applied when utilization is above the scale-up threshold.
pub const SCALE_UP_FACTOR: f64 = 1.5;
/// Shrink factor applied when utilization is below the scale-down threshold.
pub const SCALE_DOWN_FACTOR: f64 = 0.8;

/// Decision produced by [`plan_adjustment`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    /// No active connections, no ceiling, or utilization inside the band.
    Hold,
    /// Raise the ceiling.
    Grow { from: usize, to: usize, utilization: f64 },
    /// Lower the ceiling.
    Shrink { from: usize, to: usize, utilization: f64 },
    /// A proposal existed but fell outside `min_per_host..=max_conns_per_host`.
    Rejected {
        current: usize,
        proposed: usize,
        utilization: f64,
    },
}

impl Adjustment {
    /// The new ceiling, if this decision changes it.
    pub fn target(&self) -> Option<usize> {
        match self {
            Adjustment::Grow { to, .. } | Adjustment::Shrink { to, .. } => Some(*to),
            Adjustment::Hold | Adjustment::Rejected { .. } => None,
        }
    }
}

/// Decides how the idle ceiling should change given `active` connections.
///
/// Utilization is `active / max_idle_per_host`. Above the scale-up threshold
/// the ceiling grows by half (bounded by `max_conns_per_host` unless that is
/// zero); below the scale-down threshold it shrinks by a fifth (bounded by
/// `min_per_host`). Between the thresholds nothing changes.
pub fn plan_adjustment(config: &PoolConfig, active: usize) -> Adjustment {
    let current = config.max_idle_per_host;
    if active == 0 || current == 0 {
        return Adjustment::Hold;
    }

    let utilization = active as f64 / current as f64;

    if utilization > config.scale_up_threshold {
        let proposed = (current as f64 * SCALE_UP_FACTOR).round() as usize;
        if config.max_conns_per_host != 0 && proposed > config.max_conns_per_host {
            return Adjustment::Rejected {
                current,
                proposed,
                utilization,
            };
        }
        if proposed == current {
            return Adjustment::Hold;
        }
        Adjustment::Grow {
            from: current,
            to: proposed,
            utilization,
        }
    } else if utilization < config.scale_down_threshold {
        let proposed = (current as f64 * SCALE_DOWN_FACTOR).round() as usize;
        if proposed < config.min_per_host {
            return Adjustment::Rejected {
                current,
                proposed,
                utilization,
            };
        }
        if proposed == current {
            return Adjustment::Hold;
        }
        Adjustment::Shrink {
            from: current,
            to: proposed,
            utilization,
        }
    } else {
        Adjustment::Hold
    }
}
