//! Hypergeometric distribution.
//!
//! `X` counts successes in a sample of size `n` drawn without replacement
//! from a population of `N` items of which `K` are successes:
//!
//! ```text
//! P(X = k) = C(K, k) · C(N − K, n − k) / C(N, n),   max(0, n + K − N) ≤ k ≤ min(n, K)
//! ```
//!
//! Binomial coefficients are evaluated in log space from a table of
//! `ln(i!)` so that genome-scale populations do not overflow.

use std::ops::RangeInclusive;

/// Invalid distribution parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HypergeometricError {
    #[error("number of successes {successes} exceeds population size {population}")]
    SuccessesExceedPopulation { successes: usize, population: usize },

    #[error("sample size {sample} exceeds population size {population}")]
    SampleExceedsPopulation { sample: usize, population: usize },
}

#[derive(Debug, Clone)]
pub struct Hypergeometric {
    population: usize,
    successes: usize,
    /// `ln_factorial[i] = ln(i!)` for `i ∈ 0..=population`.
    ln_factorial: Vec<f64>,
}

impl Hypergeometric {
    /// # Errors
    ///
    /// Fails when `successes > population`.
    pub fn new(population: usize, successes: usize) -> Result<Self, HypergeometricError> {
        if successes > population {
            return Err(HypergeometricError::SuccessesExceedPopulation {
                successes,
                population,
            });
        }
        let mut ln_factorial = Vec::with_capacity(population + 1);
        let mut acc = 0.0_f64;
        ln_factorial.push(acc);
        for i in 1..=population {
            acc += ln_usize(i);
            ln_factorial.push(acc);
        }
        Ok(Self {
            population,
            successes,
            ln_factorial,
        })
    }

    #[must_use]
    pub const fn population(&self) -> usize {
        self.population
    }

    #[must_use]
    pub const fn successes(&self) -> usize {
        self.successes
    }

    /// Values of `k` with non-zero probability for a sample of `sample`.
    ///
    /// # Errors
    ///
    /// Fails when `sample > population`.
    pub fn support(&self, sample: usize) -> Result<RangeInclusive<usize>, HypergeometricError> {
        self.check_sample(sample)?;
        let lo = (sample + self.successes).saturating_sub(self.population);
        let hi = sample.min(self.successes);
        Ok(lo..=hi)
    }

    /// `P(X = k)`.
    ///
    /// # Errors
    ///
    /// Fails when `sample > population`.
    pub fn pmf(&self, sample: usize, k: usize) -> Result<f64, HypergeometricError> {
        let support = self.support(sample)?;
        if !support.contains(&k) {
            return Ok(0.0);
        }
        Ok(self.ln_pmf(sample, k).exp())
    }

    /// `P(X ≤ k)`.
    ///
    /// # Errors
    ///
    /// Fails when `sample > population`.
    pub fn cdf(&self, sample: usize, k: usize) -> Result<f64, HypergeometricError> {
        let support = self.support(sample)?;
        if k < *support.start() {
            return Ok(0.0);
        }
        if k >= *support.end() {
            return Ok(1.0);
        }
        let total: f64 = (*support.start()..=k)
            .map(|i| self.ln_pmf(sample, i).exp())
            .sum();
        Ok(total.clamp(0.0, 1.0))
    }

    /// One-tailed `P(X ≥ k)`.
    ///
    /// Evaluated as `1 − P(X ≤ k − 1)` unless that lower tail exceeds 0.5,
    /// in which case the upper tail is summed directly to avoid cancellation.
    ///
    /// # Errors
    ///
    /// Fails when `sample > population`.
    pub fn upper_tail(&self, sample: usize, k: usize) -> Result<f64, HypergeometricError> {
        let support = self.support(sample)?;
        if k <= *support.start() {
            return Ok(1.0);
        }
        if k > *support.end() {
            return Ok(0.0);
        }
        let below = self.cdf(sample, k - 1)?;
        let p = if below > 0.5 {
            (k..=*support.end())
                .map(|i| self.ln_pmf(sample, i).exp())
                .sum::<f64>()
        } else {
            1.0 - below
        };
        Ok(p.clamp(0.0, 1.0))
    }

    fn check_sample(&self, sample: usize) -> Result<(), HypergeometricError> {
        if sample > self.population {
            return Err(HypergeometricError::SampleExceedsPopulation {
                sample,
                population: self.population,
            });
        }
        Ok(())
    }

    /// `ln P(X = k)`; `k` must lie in the support.
    fn ln_pmf(&self, sample: usize, k: usize) -> f64 {
        let (big_n, big_k, n) = (self.population, self.successes, sample);
        self.ln_choose(big_k, k) + self.ln_choose(big_n - big_k, n - k) - self.ln_choose(big_n, n)
    }

    fn ln_choose(&self, n: usize, k: usize) -> f64 {
        self.ln_factorial[n] - self.ln_factorial[k] - self.ln_factorial[n - k]
    }
}

#[allow(clippy::cast_precision_loss)]
fn ln_usize(value: usize) -> f64 {
    (value as f64).ln()
}
