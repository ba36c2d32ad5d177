// src/guard/classify.rs

//! Shutdown classification: did this process terminate because its time
//! limit ran out?
//!
//! The rules run in a fixed order and the first match wins. The function
//! is pure; the guard gathers the facts and acts on the verdict.

use std::time::Instant;

/// Everything the classifier looks at, gathered by the guard at shutdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShutdownFacts {
    /// The timeout helper's SIGINT was delivered (Unix).
    pub interrupted: bool,
    /// The guard's in-process execution ceiling was hit (platforms with
    /// no external helper).
    pub ceiling_exceeded: bool,
    /// Configured limit in seconds, if any.
    pub time_limit: Option<u64>,
    /// When the hosting process began initializing, if known. Absent
    /// under unit-test harnesses, which disables the elapsed-time rules.
    pub app_start: Option<Instant>,
    /// Kernel-reported elapsed seconds of the timer process (Unix), if
    /// queryable.
    pub timer_elapsed_secs: Option<u64>,
}

/// First matching rule wins:
///
/// 1. an interrupt was received;
/// 2. the runtime execution ceiling tripped (any other fatal condition is
///    not a timeout);
/// 3. no limit configured: not a timeout, stop looking;
/// 4. wall clock since process start reached the limit;
/// 5. the timer process's kernel clock reached the limit. This exists
///    because startup overhead makes rule 4 under-count: the timer
///    process started before this process's runtime finished
///    initializing, so its elapsed time is authoritative.
pub fn has_timed_out(facts: &ShutdownFacts) -> bool {
    if facts.interrupted {
        return true;
    }
    if facts.ceiling_exceeded {
        return true;
    }

    let Some(limit) = facts.time_limit else {
        return false;
    };

    if let Some(start) = facts.app_start {
        if start.elapsed().as_secs_f64() >= limit as f64 {
            return true;
        }
        // etimes can be off by one against the wall clock (6.999s prints
        // as "6"), so this comparison stays in whole seconds on purpose.
        if let Some(elapsed) = facts.timer_elapsed_secs {
            return elapsed >= limit;
        }
    }

    false
}
