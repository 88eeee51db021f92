//! # Harmonic perturbation series
//!
//! Shared evaluation primitive of the planetary and lunar theories. A series is a sum of
//! periodic terms
//!
//! ```text
//! S(τ) = τⁿ · Σ [ sₖ·sin φₖ(τ) + cₖ·cos φₖ(τ) ]
//! ```
//!
//! where each phase `φₖ(τ)` is a polynomial of degree ≤ 4 in the normalized time `τ`
//! (built from integer combinations of fundamental angles) and `n` is the perturbation
//! order of the series. [`HarmonicSeries::derivative`] returns the exact `dS/dτ` using
//! the product rule across the `τⁿ` factor.
//!
//! Terms whose amplitude falls under the significance threshold are removed once, when
//! the series is built ([`HarmonicSeries::from_terms`]), never during evaluation.

use std::{
    iter::Sum,
    ops::{Add, Mul},
};

use log::debug;

/// Highest power of τ carried by the phase polynomials.
pub const MAX_DEGREE: usize = 4;

/// Powers `[1, τ, τ², τ³, τ⁴]` of the normalized time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimePowers([f64; MAX_DEGREE + 1]);

impl TimePowers {
    pub fn new(tau: f64) -> Self {
        let tau2 = tau * tau;
        TimePowers([1.0, tau, tau2, tau2 * tau, tau2 * tau2])
    }

    /// The normalized time τ itself.
    pub fn tau(&self) -> f64 {
        self.0[1]
    }

    /// τ raised to `power`. Powers above 4 are computed on demand.
    pub fn pow(&self, power: usize) -> f64 {
        match self.0.get(power) {
            Some(value) => *value,
            None => self.tau().powi(power as i32),
        }
    }

    /// `d(τ^power)/dτ = power · τ^(power−1)`.
    pub fn pow_derivative(&self, power: usize) -> f64 {
        if power == 0 {
            0.0
        } else {
            power as f64 * self.pow(power - 1)
        }
    }
}

/// Polynomial `φ(τ) = Σ aₖ τᵏ` giving the phase of a periodic term, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhasePolynomial(pub [f64; MAX_DEGREE + 1]);

impl PhasePolynomial {
    /// Phase linear in τ: `φ(τ) = constant + rate·τ`.
    pub fn linear(constant: f64, rate: f64) -> Self {
        PhasePolynomial([constant, rate, 0.0, 0.0, 0.0])
    }

    pub fn value(&self, t: &TimePowers) -> f64 {
        self.0.iter().zip(t.0.iter()).map(|(a, tk)| a * tk).sum()
    }

    /// `dφ/dτ`
    pub fn rate(&self, t: &TimePowers) -> f64 {
        (1..=MAX_DEGREE)
            .map(|k| k as f64 * self.0[k] * t.0[k - 1])
            .sum()
    }

    /// Constant and linear coefficients only.
    pub fn linear_part(&self) -> Self {
        PhasePolynomial::linear(self.0[0], self.0[1])
    }
}

impl Add for PhasePolynomial {
    type Output = PhasePolynomial;

    fn add(self, rhs: PhasePolynomial) -> PhasePolynomial {
        let mut coefficients = self.0;
        for (a, b) in coefficients.iter_mut().zip(rhs.0) {
            *a += b;
        }
        PhasePolynomial(coefficients)
    }
}

impl Mul<f64> for PhasePolynomial {
    type Output = PhasePolynomial;

    fn mul(self, rhs: f64) -> PhasePolynomial {
        PhasePolynomial(self.0.map(|a| a * rhs))
    }
}

impl Sum for PhasePolynomial {
    fn sum<I: Iterator<Item = PhasePolynomial>>(iter: I) -> Self {
        iter.fold(PhasePolynomial::default(), Add::add)
    }
}

/// Integer combination `Σ mₖ·φₖ` of fundamental arguments.
pub fn combine_arguments(multipliers: &[i32], arguments: &[PhasePolynomial]) -> PhasePolynomial {
    multipliers
        .iter()
        .zip(arguments)
        .map(|(&m, argument)| *argument * m as f64)
        .sum()
}

/// One periodic term `s·sin φ(τ) + c·cos φ(τ)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicTerm {
    pub sin_amplitude: f64,
    pub cos_amplitude: f64,
    pub phase: PhasePolynomial,
}

impl PeriodicTerm {
    pub fn sine(amplitude: f64, phase: PhasePolynomial) -> Self {
        PeriodicTerm {
            sin_amplitude: amplitude,
            cos_amplitude: 0.0,
            phase,
        }
    }

    pub fn cosine(amplitude: f64, phase: PhasePolynomial) -> Self {
        PeriodicTerm {
            sin_amplitude: 0.0,
            cos_amplitude: amplitude,
            phase,
        }
    }

    /// Squared amplitude `s² + c²`, used for the significance test.
    pub fn squared_amplitude(&self) -> f64 {
        self.sin_amplitude * self.sin_amplitude + self.cos_amplitude * self.cos_amplitude
    }

    pub fn compute(&self, t: &TimePowers) -> f64 {
        let (sin_phi, cos_phi) = self.phase.value(t).sin_cos();
        self.sin_amplitude * sin_phi + self.cos_amplitude * cos_phi
    }

    pub fn derivative(&self, t: &TimePowers) -> f64 {
        let (sin_phi, cos_phi) = self.phase.value(t).sin_cos();
        (self.sin_amplitude * cos_phi - self.cos_amplitude * sin_phi) * self.phase.rate(t)
    }
}

/// A sum of [`PeriodicTerm`]s scaled by `τ^order`.
///
/// Immutable once built: the significance filter has already been applied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HarmonicSeries {
    terms: Vec<PeriodicTerm>,
    order: usize,
}

impl HarmonicSeries {
    /// Build a series from terms that were already reduced by the caller.
    pub fn new(order: usize, terms: Vec<PeriodicTerm>) -> Self {
        HarmonicSeries { terms, order }
    }

    /// Build a series, keeping only the terms whose amplitude passes `is_significant`.
    ///
    /// Arguments
    /// ---------
    /// * `order`: power of τ multiplying the whole sum.
    /// * `terms`: candidate terms, in table order.
    /// * `is_significant`: data-reduction predicate, applied exactly once per term.
    ///
    /// Return
    /// ------
    /// * The filtered series. Term order is preserved so accumulation is deterministic.
    pub fn from_terms<I, F>(order: usize, terms: I, is_significant: F) -> Self
    where
        I: IntoIterator<Item = PeriodicTerm>,
        F: Fn(&PeriodicTerm) -> bool,
    {
        let mut read = 0usize;
        let terms: Vec<PeriodicTerm> = terms
            .into_iter()
            .inspect(|_| read += 1)
            .filter(|term| is_significant(term))
            .collect();
        debug!(
            "harmonic series of order {order}: kept {} of {read} terms",
            terms.len()
        );
        HarmonicSeries { terms, order }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn terms(&self) -> &[PeriodicTerm] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn periodic_sum(&self, t: &TimePowers) -> f64 {
        self.terms.iter().map(|term| term.compute(t)).sum()
    }

    fn periodic_sum_derivative(&self, t: &TimePowers) -> f64 {
        self.terms.iter().map(|term| term.derivative(t)).sum()
    }

    /// `S(τ) = τⁿ · Σ terms`
    pub fn compute(&self, t: &TimePowers) -> f64 {
        self.periodic_sum(t) * t.pow(self.order)
    }

    /// `dS/dτ = τⁿ · Σ terms' + n·τⁿ⁻¹ · Σ terms`
    pub fn derivative(&self, t: &TimePowers) -> f64 {
        let mut result = self.periodic_sum_derivative(t) * t.pow(self.order);
        if self.order > 0 {
            result += self.periodic_sum(t) * t.pow_derivative(self.order);
        }
        result
    }
}

/// Sum of several [`HarmonicSeries`] evaluated on the same time basis.
pub fn compute_all(series: &[HarmonicSeries], t: &TimePowers) -> f64 {
    series.iter().map(|s| s.compute(t)).sum()
}

/// Derivative counterpart of [`compute_all`].
pub fn derivative_all(series: &[HarmonicSeries], t: &TimePowers) -> f64 {
    series.iter().map(|s| s.derivative(t)).sum()
}
