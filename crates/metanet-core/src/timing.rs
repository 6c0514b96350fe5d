//! Phase timing for CLI runs.
//!
//! A [`PhaseTimer`] is created once per command and threaded through the
//! phases that matter (model load, cloning, decomposition, overview, ORA).
//! When disabled it only runs the closures.

use std::time::{Duration, Instant};

use serde::Serialize;

/// Environment variable that enables timing when `--timing` is absent.
pub const TIMING_ENV: &str = "METANET_TIMING";

/// Whether `METANET_TIMING` holds a truthy value (`1`, `true`, `yes`, `on`).
#[must_use]
pub fn timing_enabled_from_env() -> bool {
    std::env::var(TIMING_ENV)
        .ok()
        .is_some_and(|value| is_truthy(&value))
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// One recorded phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Phase {
    pub name: String,
    #[serde(rename = "elapsed_us", serialize_with = "as_micros")]
    pub elapsed: Duration,
}

fn as_micros<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u128(d.as_micros())
}

/// Ordered list of phase durations.
#[derive(Debug, Default)]
pub struct PhaseTimer {
    enabled: bool,
    phases: Vec<Phase>,
}

impl PhaseTimer {
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self {
            enabled,
            phases: Vec::new(),
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Run `f`, recording its duration under `name` when enabled.
    pub fn time<R>(&mut self, name: &str, f: impl FnOnce() -> R) -> R {
        if !self.enabled {
            return f();
        }
        let started = Instant::now();
        let result = f();
        self.phases.push(Phase {
            name: name.to_string(),
            elapsed: started.elapsed(),
        });
        result
    }

    #[must_use]
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    #[must_use]
    pub fn total(&self) -> Duration {
        self.phases.iter().map(|p| p.elapsed).sum()
    }

    /// Two-column table for stderr.
    #[must_use]
    pub fn render(&self) -> String {
        use std::fmt::Write as _;

        if self.phases.is_empty() {
            return "no phases recorded\n".to_string();
        }
        let mut out = String::new();
        for phase in &self.phases {
            let _ = writeln!(out, "{:<24} {:>12}", phase.name, format_duration(phase.elapsed));
        }
        let _ = writeln!(out, "{:<24} {:>12}", "total", format_duration(self.total()));
        out
    }
}

fn format_duration(duration: Duration) -> String {
    let micros = duration.as_micros();
    if micros >= 1_000_000 {
        format!("{}.{:03}s", micros / 1_000_000, (micros % 1_000_000) / 1_000)
    } else if micros >= 1_000 {
        format!("{}.{:03}ms", micros / 1_000, micros % 1_000)
    } else {
        format!("{micros}us")
    }
}
