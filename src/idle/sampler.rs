use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IdleCounters {
    pub idle_seconds_this_cycle: u64,
    pub seconds_sampled: u64,
    pub total_idle_seconds: u64,
    pub total_active_seconds: u64,
    pub continuous_idle_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleWarning {
    pub streak_secs: u64,
}

/// Counts idle and active seconds from one probe reading per second.
#[derive(Debug, Clone)]
pub struct IdleSampler {
    counters: IdleCounters,
    sample_threshold_secs: u64,
    warning_threshold_secs: u64,
    warning_visible: bool,
}

impl IdleSampler {
    pub fn new(sample_threshold_secs: u64, warning_threshold_secs: u64) -> Self {
        Self {
            counters: IdleCounters::default(),
            sample_threshold_secs: sample_threshold_secs.max(1),
            warning_threshold_secs,
            warning_visible: false,
        }
    }

    pub fn counters(&self) -> IdleCounters {
        self.counters
    }

    pub fn total_idle_seconds(&self) -> u64 {
        self.counters.total_idle_seconds
    }

    pub fn idle_seconds_this_cycle(&self) -> u64 {
        self.counters.idle_seconds_this_cycle
    }

    pub fn warning_visible(&self) -> bool {
        self.warning_visible
    }

    /// Feeds one reading of "seconds since last input". Returns a warning the
    /// first time the idle streak reaches the threshold while none is shown.
    pub fn record_sample(&mut self, host_idle_secs: u64) -> Option<IdleWarning> {
        let counters = &mut self.counters;
        counters.seconds_sampled += 1;

        if host_idle_secs < self.sample_threshold_secs {
            counters.total_active_seconds += 1;
            counters.continuous_idle_seconds = 0;
            return None;
        }

        counters.idle_seconds_this_cycle += 1;
        counters.total_idle_seconds += 1;
        counters.continuous_idle_seconds += 1;

        if counters.continuous_idle_seconds >= self.warning_threshold_secs && !self.warning_visible {
            self.warning_visible = true;
            return Some(IdleWarning {
                streak_secs: counters.continuous_idle_seconds,
            });
        }
        None
    }

    /// Confirm or dismiss: the streak restarts, totals stay.
    pub fn acknowledge_warning(&mut self) {
        self.warning_visible = false;
        self.counters.continuous_idle_seconds = 0;
    }

    /// Returns the per-cycle `(idle, sampled)` pair and zeroes it.
    pub fn reset_cycle(&mut self) -> (u64, u64) {
        let cycle = (
            self.counters.idle_seconds_this_cycle,
            self.counters.seconds_sampled,
        );
        self.counters.idle_seconds_this_cycle = 0;
        self.counters.seconds_sampled = 0;
        cycle
    }

    pub fn stop(&mut self) {
        self.reset_cycle();
        self.counters.continuous_idle_seconds = 0;
    }

    pub fn reset_totals(&mut self) {
        self.counters = IdleCounters::default();
        self.warning_visible = false;
    }
}
