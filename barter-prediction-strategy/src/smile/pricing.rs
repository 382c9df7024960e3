//! Digital option pricing off an implied volatility surface.
//!
//! A binary "above strike K at expiry T" contract is priced as the
//! risk-neutral probability `N(d2)` with zero rates, using the IV
//! interpolated from the snapshot in total-variance space.

use super::surface::{ExpiryData, IvSnapshot};
use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Milliseconds in a 365-day year.
pub const MS_PER_YEAR: f64 = 365.0 * 24.0 * 60.0 * 60.0 * 1000.0;

/// Bisection bounds for implied volatility search.
pub const MIN_IMPLIED_VOL: f64 = 0.01;
pub const MAX_IMPLIED_VOL: f64 = 5.0;

/// Maximum relative distance between target and nearest quoted strike for
/// the strike to count as "near".
const NEAR_STRIKE_TOLERANCE: f64 = 0.05;

/// All errors generated while pricing against an [`IvSnapshot`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    #[error("no strikes available")]
    EmptyStrikes,

    #[error("snapshot has no expiries")]
    EmptyExpiries,

    #[error("no underlying price available")]
    NoUnderlying,

    #[error("no mark IV quoted at strike {strike}")]
    MissingIv { strike: f64 },
}

/// Confidence in a theoretical price given how well the snapshot covers
/// the target expiry and strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    #[display("high")]
    High,
    #[display("medium")]
    Medium,
    #[display("low")]
    Low,
}

impl Confidence {
    pub fn score(&self) -> f64 {
        match self {
            Confidence::High => 0.9,
            Confidence::Medium => 0.6,
            Confidence::Low => 0.3,
        }
    }
}

/// Theoretical price together with the inputs that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingDiagnostics {
    pub price: f64,
    pub iv: f64,
    pub forward: f64,
    /// `None` when the price collapsed to the intrinsic indicator
    pub d2: Option<f64>,
    pub confidence: Confidence,
}

/// Years between two instants on a 365-day year. Negative if `to` precedes
/// `from`.
pub fn years_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / MS_PER_YEAR
}

/// Standard normal CDF via the Abramowitz-Stegun 7.1.26 erf approximation
/// (absolute error below 1.5e-7).
pub fn normal_cdf(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let z = x.abs() / std::f64::consts::SQRT_2;

    let t = 1.0 / (1.0 + P * z);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-z * z).exp();

    0.5 * (1.0 + sign * y)
}

/// Strike in `available` closest to `target`. Ties keep the earlier strike.
pub fn find_nearest_strike(target: f64, available: &[f64]) -> Result<f64, PricingError> {
    available
        .iter()
        .copied()
        .reduce(|nearest, strike| {
            if (strike - target).abs() < (nearest - target).abs() {
                strike
            } else {
                nearest
            }
        })
        .ok_or(PricingError::EmptyStrikes)
}

/// Mark IV (as a decimal) at the strike nearest `target_strike`.
pub fn get_iv_at_strike(expiry: &ExpiryData, target_strike: f64) -> Result<f64, PricingError> {
    let nearest = find_nearest_strike(target_strike, &expiry.strike_values())?;
    expiry
        .strikes
        .iter()
        .find(|strike| strike.strike == nearest)
        .and_then(|strike| strike.mark_iv())
        .ok_or(PricingError::MissingIv { strike: nearest })
}

/// IV at `target_expiry`, interpolated linearly in total variance between
/// the bracketing expiries.
///
/// Targets before the first expiry use the first expiry's IV. Targets after
/// the last expiry are extrapolated from the last two. `target_strike`
/// defaults to the underlying price.
pub fn interpolate_iv(
    snapshot: &IvSnapshot,
    target_expiry: DateTime<Utc>,
    target_strike: Option<f64>,
    now: DateTime<Utc>,
) -> Result<f64, PricingError> {
    let strike = target_strike.unwrap_or(snapshot.underlying_price);
    let expiries = &snapshot.expiries;
    let (first, last) = match (expiries.first(), expiries.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(PricingError::EmptyExpiries),
    };

    let lower = expiries.iter().rev().find(|expiry| expiry.expiry <= target_expiry);
    let upper = expiries.iter().find(|expiry| expiry.expiry >= target_expiry);

    let (near, far) = match (lower, upper) {
        (None, _) => return get_iv_at_strike(first, strike),
        (Some(lower), Some(upper)) if lower.expiry == upper.expiry => {
            return get_iv_at_strike(lower, strike);
        }
        (Some(lower), Some(upper)) => (lower, upper),
        (Some(_), None) => match expiries.len() {
            0 | 1 => return get_iv_at_strike(last, strike),
            len => (&expiries[len - 2], last),
        },
    };

    let t_star = years_between(now, target_expiry);
    if t_star <= 0.0 {
        return get_iv_at_strike(lower.unwrap_or(first), strike);
    }

    let near_iv = get_iv_at_strike(near, strike)?;
    let far_iv = get_iv_at_strike(far, strike)?;
    let (t1, t2) = (near.time_to_expiry, far.time_to_expiry);
    if (t2 - t1).abs() < f64::EPSILON {
        return Ok(near_iv);
    }

    let w1 = near_iv * near_iv * t1;
    let w2 = far_iv * far_iv * t2;
    let alpha = (t_star - t1) / (t2 - t1);
    let w_star = w1 + alpha * (w2 - w1);

    Ok((w_star / t_star).max(0.0).sqrt())
}

/// `d2` of Black-Scholes with zero rates.
fn compute_d2(forward: f64, strike: f64, iv: f64, t: f64) -> f64 {
    let vol_sqrt_t = iv * t.sqrt();
    ((forward / strike).ln() - 0.5 * iv * iv * t) / vol_sqrt_t
}

/// Price of a digital paying 1 if the underlying finishes above `strike`.
///
/// Collapses to the indicator `forward >= strike` once expired or with no
/// volatility.
pub fn compute_theoretical_price(forward: f64, strike: f64, iv: f64, t: f64) -> f64 {
    if t <= 0.0 || iv <= 0.0 || forward <= 0.0 || strike <= 0.0 {
        return if forward >= strike { 1.0 } else { 0.0 };
    }

    normal_cdf(compute_d2(forward, strike, iv, t))
}

/// Theoretical price at `strike`/`target_expiry` with the IV, forward, `d2`
/// and a confidence tier.
pub fn compute_theoretical_price_with_diagnostics(
    snapshot: &IvSnapshot,
    strike: f64,
    target_expiry: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<PricingDiagnostics, PricingError> {
    let iv = interpolate_iv(snapshot, target_expiry, Some(strike), now)?;
    let forward = snapshot.underlying_price;
    let t = years_between(now, target_expiry);
    let price = compute_theoretical_price(forward, strike, iv, t);
    let d2 = (t > 0.0 && iv > 0.0 && strike > 0.0).then(|| compute_d2(forward, strike, iv, t));

    let expiry_in_range = match (snapshot.first_expiry(), snapshot.last_expiry()) {
        (Some(first), Some(last)) => first.expiry <= target_expiry && target_expiry <= last.expiry,
        _ => false,
    };

    let strikes: Vec<f64> = snapshot.all_strikes().collect();
    let strike_near = strike > 0.0
        && find_nearest_strike(strike, &strikes)
            .map(|nearest| (nearest - strike).abs() / strike <= NEAR_STRIKE_TOLERANCE)
            .unwrap_or(false);

    let confidence = match (expiry_in_range, strike_near) {
        (true, true) => Confidence::High,
        (true, false) | (false, true) => Confidence::Medium,
        (false, false) => Confidence::Low,
    };

    Ok(PricingDiagnostics {
        price,
        iv,
        forward,
        d2,
        confidence,
    })
}

/// Invert [`compute_theoretical_price`] for IV by bisection on
/// `[MIN_IMPLIED_VOL, MAX_IMPLIED_VOL]`.
///
/// Returns `None` for degenerate inputs (a price outside `(0, 1)` or a
/// non-positive forward, strike or time) and for prices the bounds do not
/// bracket. Out of the money the price is only monotone in IV below
/// `sqrt(2 ln(K/F) / t)`, so roots above that are not recovered.
pub fn compute_implied_iv(
    market_price: f64,
    forward: f64,
    strike: f64,
    t: f64,
    tolerance: f64,
    max_iterations: usize,
) -> Option<f64> {
    if !(market_price > 0.0 && market_price < 1.0) || forward <= 0.0 || strike <= 0.0 || t <= 0.0 {
        return None;
    }

    let price_at = |iv: f64| compute_theoretical_price(forward, strike, iv, t);
    let (mut low, mut high) = (MIN_IMPLIED_VOL, MAX_IMPLIED_VOL);

    let (price_low, price_high) = (price_at(low), price_at(high));
    if market_price < price_low.min(price_high) || market_price > price_low.max(price_high) {
        return None;
    }

    // Out of the money the digital gains value with volatility, in the
    // money it loses value.
    let increasing = forward < strike;

    for _ in 0..max_iterations {
        let mid = 0.5 * (low + high);
        let diff = price_at(mid) - market_price;
        if diff.abs() < tolerance {
            return Some(mid);
        }

        if (diff < 0.0) == increasing {
            low = mid;
        } else {
            high = mid;
        }
    }

    Some(0.5 * (low + high))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smile::surface::StrikeIv;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn years(t: f64) -> chrono::Duration {
        chrono::Duration::milliseconds((t * MS_PER_YEAR).round() as i64)
    }

    fn expiry(t: f64, iv: f64, strikes: &[f64]) -> ExpiryData {
        ExpiryData {
            expiry: now() + years(t),
            time_to_expiry: t,
            strikes: strikes
                .iter()
                .map(|strike| StrikeIv {
                    strike: *strike,
                    call_iv: Some(iv),
                    put_iv: Some(iv),
                    call_mark_iv: Some(iv),
                    put_mark_iv: Some(iv),
                })
                .collect(),
        }
    }

    fn snapshot() -> IvSnapshot {
        IvSnapshot::new(
            100_000.0,
            vec![
                expiry(0.1, 0.5, &[95_000.0, 100_000.0, 105_000.0]),
                expiry(0.2, 0.6, &[95_000.0, 100_000.0, 105_000.0]),
            ],
            now(),
        )
        .unwrap()
    }

    #[test]
    fn test_normal_cdf() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((normal_cdf(1.0) - 0.841_344_746).abs() < 1e-6);
        assert!((normal_cdf(-1.96) - 0.024_997_895).abs() < 1e-6);
        assert!(normal_cdf(8.0) > 0.999_999);
        assert!(normal_cdf(-8.0) < 1e-6);
    }

    #[test]
    fn test_find_nearest_strike() {
        let strikes = [95_000.0, 100_000.0, 105_000.0];
        assert_eq!(find_nearest_strike(101_000.0, &strikes), Ok(100_000.0));
        assert_eq!(find_nearest_strike(1.0, &strikes), Ok(95_000.0));
        // Tie keeps the first candidate
        assert_eq!(find_nearest_strike(97_500.0, &strikes), Ok(95_000.0));
        assert_eq!(find_nearest_strike(1.0, &[]), Err(PricingError::EmptyStrikes));
    }

    #[test]
    fn test_interpolate_iv_total_variance() {
        let snapshot = snapshot();
        let iv = interpolate_iv(&snapshot, now() + years(0.15), Some(100_000.0), now()).unwrap();

        let expected = ((0.25 * 0.1 + 0.5 * (0.36 * 0.2 - 0.25 * 0.1)) / 0.15_f64).sqrt();
        assert!(iv > 0.5 && iv < 0.6);
        assert!((iv - expected).abs() < 1e-9);
        assert!((iv - 0.568_624).abs() < 1e-5);
    }

    #[test]
    fn test_interpolate_iv_exact_expiry_and_outside_range() {
        let snapshot = snapshot();

        let exact = interpolate_iv(&snapshot, now() + years(0.2), None, now()).unwrap();
        assert_eq!(exact, 0.6);

        let before = interpolate_iv(&snapshot, now() + years(0.05), None, now()).unwrap();
        assert_eq!(before, 0.5);

        // Extrapolation off the last two expiries stays on the variance line
        let after = interpolate_iv(&snapshot, now() + years(0.3), None, now()).unwrap();
        let expected = ((0.025 + 2.0 * (0.072 - 0.025)) / 0.3_f64).sqrt();
        assert!((after - expected).abs() < 1e-9);
    }

    #[test]
    fn test_interpolate_iv_single_expiry() {
        let snapshot = IvSnapshot::new(100.0, vec![expiry(0.1, 0.7, &[100.0])], now()).unwrap();

        let after = interpolate_iv(&snapshot, now() + years(0.5), None, now()).unwrap();
        assert_eq!(after, 0.7);
    }

    #[test]
    fn test_theoretical_price() {
        // At the money, zero rates: N(-sigma*sqrt(T)/2)
        let price = compute_theoretical_price(100.0, 100.0, 0.5, 1.0);
        assert!((price - normal_cdf(-0.25)).abs() < 1e-12);

        // Expired collapses to the indicator
        assert_eq!(compute_theoretical_price(101.0, 100.0, 0.5, 0.0), 1.0);
        assert_eq!(compute_theoretical_price(100.0, 100.0, 0.5, 0.0), 1.0);
        assert_eq!(compute_theoretical_price(99.0, 100.0, 0.5, -1.0), 0.0);
        assert_eq!(compute_theoretical_price(101.0, 100.0, 0.0, 1.0), 1.0);

        // Deep in the money approaches one
        assert!(compute_theoretical_price(200.0, 100.0, 0.5, 0.01) > 0.999);
    }

    #[test]
    fn test_diagnostics_confidence_tiers() {
        let snapshot = snapshot();

        let high = compute_theoretical_price_with_diagnostics(&snapshot, 100_000.0, now() + years(0.15), now()).unwrap();
        assert_eq!(high.confidence, Confidence::High);
        assert!(high.d2.is_some());
        assert_eq!(high.forward, 100_000.0);

        let far_strike = compute_theoretical_price_with_diagnostics(&snapshot, 150_000.0, now() + years(0.15), now()).unwrap();
        assert_eq!(far_strike.confidence, Confidence::Medium);

        let far_both = compute_theoretical_price_with_diagnostics(&snapshot, 150_000.0, now() + years(0.5), now()).unwrap();
        assert_eq!(far_both.confidence, Confidence::Low);
        assert_eq!(Confidence::Low.score(), 0.3);
        assert_eq!(Confidence::Medium.to_string(), "medium");
    }

    #[test]
    fn test_implied_iv_round_trips() {
        for (forward, strike, t) in [(100.0, 110.0, 0.005), (100.0, 90.0, 0.25), (100.0, 100.0, 0.25)] {
            let price = compute_theoretical_price(forward, strike, 0.8, t);
            let iv = compute_implied_iv(price, forward, strike, t, 1e-10, 200).unwrap();
            assert!((iv - 0.8).abs() < 1e-4, "forward {forward} strike {strike} iv {iv}");
        }
    }

    #[test]
    fn test_implied_iv_degenerate_inputs() {
        assert_eq!(compute_implied_iv(0.0, 100.0, 100.0, 0.25, 1e-6, 100), None);
        assert_eq!(compute_implied_iv(1.0, 100.0, 100.0, 0.25, 1e-6, 100), None);
        assert_eq!(compute_implied_iv(0.5, 100.0, 100.0, 0.0, 1e-6, 100), None);
        assert_eq!(compute_implied_iv(0.5, -1.0, 100.0, 0.25, 1e-6, 100), None);
        // ATM prices span roughly (0.106, 0.499) over the IV bounds
        assert_eq!(compute_implied_iv(0.6, 100.0, 100.0, 0.25, 1e-6, 100), None);
    }
}
