//! Randomness battery used to score simulated QRNG output.
//!
//! Fifteen NIST SP 800-22 inspired checks over a byte slice. The dashboard only
//! shows how many of them pass (`randomness_tests_passed`, 0–15), but every
//! [`TestResult`] keeps its p-value, statistic and a letter grade so the CLI
//! can print a full breakdown.

use std::f64::consts::SQRT_2;
use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use rustfft::{FftPlanner, num_complex::Complex};
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};
use statrs::function::erf::erfc;

/// Number of tests in the battery.
pub const BATTERY_SIZE: usize = 15;

/// Significance level for p-value based tests.
pub const ALPHA: f64 = 0.01;

/// Bit limit for the quadratic pattern tests.
const PATTERN_BIT_LIMIT: usize = 20_000;

// ═══════════════════════════════════════════════════════════════════════════════
// Core types
// ═══════════════════════════════════════════════════════════════════════════════

/// Outcome of one battery test.
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub name: &'static str,
    pub passed: bool,
    pub p_value: Option<f64>,
    pub statistic: f64,
    pub details: String,
    pub grade: char,
}

impl TestResult {
    /// Result for a p-value based test.
    fn from_p(name: &'static str, p: f64, statistic: f64, details: String) -> Self {
        Self {
            name,
            passed: p >= ALPHA,
            p_value: Some(p),
            statistic,
            details,
            grade: grade_from_p(Some(p)),
        }
    }

    /// Result for a ratio based test (value in [0, 1], higher is better).
    fn from_ratio(name: &'static str, ratio: f64, pass_at: f64, details: String) -> Self {
        let grade = match ratio {
            r if r > 0.95 => 'A',
            r if r > 0.85 => 'B',
            r if r > 0.7 => 'C',
            r if r > 0.5 => 'D',
            _ => 'F',
        };
        Self {
            name,
            passed: ratio > pass_at,
            p_value: None,
            statistic: ratio,
            details,
            grade,
        }
    }

    fn failed(name: &'static str, details: String) -> Self {
        Self {
            name,
            passed: false,
            p_value: None,
            statistic: 0.0,
            details,
            grade: 'F',
        }
    }

    fn insufficient(name: &'static str, needed: usize, got: usize) -> Self {
        Self::failed(name, format!("Insufficient data: need {needed}, got {got}"))
    }
}

/// Letter grade for a p-value: A ≥ 0.1, B ≥ 0.01, C ≥ 0.001, D ≥ 0.0001, F otherwise.
pub fn grade_from_p(p: Option<f64>) -> char {
    match p {
        Some(p) if p >= 0.1 => 'A',
        Some(p) if p >= 0.01 => 'B',
        Some(p) if p >= 0.001 => 'C',
        Some(p) if p >= 0.0001 => 'D',
        _ => 'F',
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// Unpack bytes into bits, MSB first.
fn to_bits(data: &[u8]) -> Vec<u8> {
    data.iter()
        .flat_map(|&byte| (0..8).rev().map(move |shift| (byte >> shift) & 1))
        .collect()
}

/// Upper tail of the chi-squared distribution, `None` for an invalid df.
fn chi2_sf(df: f64, statistic: f64) -> Option<f64> {
    ChiSquared::new(df).ok().map(|d| d.sf(statistic))
}

fn chi2_result(name: &'static str, df: f64, chi2: f64, details: String) -> TestResult {
    match chi2_sf(df, chi2) {
        Some(p) => TestResult::from_p(name, p, chi2, details),
        None => TestResult::failed(name, format!("invalid degrees of freedom {df}")),
    }
}

fn byte_histogram(data: &[u8]) -> [u64; 256] {
    let mut hist = [0u64; 256];
    for &b in data {
        hist[b as usize] += 1;
    }
    hist
}

/// Count overlapping (cyclic) patterns of `width` bits.
fn pattern_counts(bits: &[u8], width: usize) -> Vec<u64> {
    let n = bits.len();
    let mut counts = vec![0u64; 1 << width];
    for i in 0..n {
        let idx = (0..width).fold(0usize, |acc, j| (acc << 1) | bits[(i + j) % n] as usize);
        counts[idx] += 1;
    }
    counts
}

// ═══════════════════════════════════════════════════════════════════════════════
// Frequency
// ═══════════════════════════════════════════════════════════════════════════════

/// Proportion of ones across the whole sequence.
pub fn monobit(data: &[u8]) -> TestResult {
    let name = "Monobit";
    let bits = to_bits(data);
    let n = bits.len();
    if n < 100 {
        return TestResult::insufficient(name, 100, n);
    }
    let sum: i64 = bits.iter().map(|&b| if b == 1 { 1 } else { -1 }).sum();
    let s_obs = sum.unsigned_abs() as f64 / (n as f64).sqrt();
    let p = erfc(s_obs / SQRT_2);
    TestResult::from_p(name, p, s_obs, format!("S={sum}, n={n}"))
}

/// Proportion of ones inside 128-bit blocks.
pub fn block_frequency(data: &[u8]) -> TestResult {
    let name = "Block Frequency";
    const M: usize = 128;
    let bits = to_bits(data);
    let blocks = bits.len() / M;
    if blocks < 10 {
        return TestResult::insufficient(name, M * 10, bits.len());
    }
    let chi2 = 4.0
        * M as f64
        * bits
            .chunks_exact(M)
            .map(|block| {
                let pi = block.iter().filter(|&&b| b == 1).count() as f64 / M as f64;
                (pi - 0.5).powi(2)
            })
            .sum::<f64>();
    chi2_result(name, blocks as f64, chi2, format!("blocks={blocks}, M={M}"))
}

/// Chi-squared over the 256 byte values.
pub fn byte_frequency(data: &[u8]) -> TestResult {
    let name = "Byte Frequency";
    let n = data.len();
    if n < 256 {
        return TestResult::insufficient(name, 256, n);
    }
    let expected = n as f64 / 256.0;
    let chi2: f64 = byte_histogram(data)
        .iter()
        .map(|&c| (c as f64 - expected).powi(2) / expected)
        .sum();
    chi2_result(name, 255.0, chi2, format!("n={n}, expected/bin={expected:.1}"))
}

/// Bias of each bit position (0–7) across all bytes.
pub fn bit_position_bias(data: &[u8]) -> TestResult {
    let name = "Bit Position Bias";
    let n = data.len();
    if n < 64 {
        return TestResult::insufficient(name, 64, n);
    }
    let half = n as f64 / 2.0;
    let quarter = n as f64 / 4.0;
    let mut worst = 0usize;
    let mut worst_dev = 0.0;
    let mut chi2 = 0.0;
    for pos in 0..8 {
        let ones = data.iter().filter(|&&b| (b >> pos) & 1 == 1).count();
        let dev = (ones as f64 - half).abs();
        if dev > worst_dev {
            worst_dev = dev;
            worst = pos;
        }
        chi2 += dev * dev / quarter;
    }
    chi2_result(name, 8.0, chi2, format!("worst bit={worst}, deviation={worst_dev:.1}"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runs
// ═══════════════════════════════════════════════════════════════════════════════

/// Number of uninterrupted runs of identical bits.
pub fn runs(data: &[u8]) -> TestResult {
    let name = "Runs";
    let bits = to_bits(data);
    let n = bits.len();
    if n < 100 {
        return TestResult::insufficient(name, 100, n);
    }
    let pi = bits.iter().filter(|&&b| b == 1).count() as f64 / n as f64;
    if (pi - 0.5).abs() >= 2.0 / (n as f64).sqrt() {
        return TestResult::failed(name, format!("frequency pre-test failed: pi={pi:.4}"));
    }
    let observed = 1 + bits.windows(2).filter(|w| w[0] != w[1]).count();
    let spread = 2.0 * n as f64 * pi * (1.0 - pi);
    let p = erfc(
        (observed as f64 - spread).abs() / (2.0 * (2.0 * n as f64).sqrt() * pi * (1.0 - pi)),
    );
    TestResult::from_p(
        name,
        p,
        observed as f64,
        format!("runs={observed}, expected={:.0}", spread + 1.0),
    )
}

/// Longest run of ones within 8-bit blocks.
pub fn longest_run(data: &[u8]) -> TestResult {
    let name = "Longest Run of Ones";
    if data.len() < 16 {
        return TestResult::insufficient(name, 128, data.len() * 8);
    }
    // P(longest run ≤1), =2, =3, ≥4 for M = 8
    const PROBS: [f64; 4] = [0.2148, 0.3672, 0.2305, 0.1875];
    let mut observed = [0u64; 4];
    for &byte in data {
        let mut longest = 0u32;
        let mut current = 0u32;
        for shift in (0..8).rev() {
            if (byte >> shift) & 1 == 1 {
                current += 1;
                longest = longest.max(current);
            } else {
                current = 0;
            }
        }
        let bin = match longest {
            0 | 1 => 0,
            2 => 1,
            3 => 2,
            _ => 3,
        };
        observed[bin] += 1;
    }
    let blocks = data.len() as f64;
    let chi2: f64 = observed
        .iter()
        .zip(PROBS)
        .map(|(&o, p)| (o as f64 - blocks * p).powi(2) / (blocks * p))
        .sum();
    chi2_result(name, 3.0, chi2, format!("blocks={blocks}, bins={observed:?}"))
}

/// Maximum excursion of the ±1 random walk (forward cumulative sums).
pub fn cumulative_sums(data: &[u8]) -> TestResult {
    let name = "Cumulative Sums";
    let bits = to_bits(data);
    let n = bits.len();
    if n < 100 {
        return TestResult::insufficient(name, 100, n);
    }
    let mut walk = 0i64;
    let mut z = 0i64;
    for &b in &bits {
        walk += if b == 1 { 1 } else { -1 };
        z = z.max(walk.abs());
    }
    if z == 0 {
        return TestResult::failed(name, "walk never left the origin".to_string());
    }
    let norm = Normal::standard();
    let nf = n as f64;
    let zf = z as f64;
    let sqrt_n = nf.sqrt();
    let phi = |x: f64| norm.cdf(x * zf / sqrt_n);

    let mut first = 0.0;
    let start = ((-nf / zf + 1.0) / 4.0).floor() as i64;
    let end = ((nf / zf - 1.0) / 4.0).floor() as i64;
    for k in start..=end {
        let k = k as f64;
        first += phi(4.0 * k + 1.0) - phi(4.0 * k - 1.0);
    }
    let mut second = 0.0;
    let start = ((-nf / zf - 3.0) / 4.0).floor() as i64;
    for k in start..=end {
        let k = k as f64;
        second += phi(4.0 * k + 3.0) - phi(4.0 * k + 1.0);
    }
    let p = (1.0 - first + second).clamp(0.0, 1.0);
    TestResult::from_p(name, p, zf, format!("max excursion={z}, n={n}"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Patterns
// ═══════════════════════════════════════════════════════════════════════════════

/// Overlapping 4-bit pattern frequencies (first difference ∇ψ²).
pub fn serial(data: &[u8]) -> TestResult {
    let name = "Serial";
    const M: usize = 4;
    let mut bits = to_bits(data);
    bits.truncate(PATTERN_BIT_LIMIT);
    let n = bits.len();
    if n < (1 << M) + 10 {
        return TestResult::insufficient(name, (1 << M) + 10, n);
    }
    let psi = |width: usize| -> f64 {
        let counts = pattern_counts(&bits, width);
        let squares: f64 = counts.iter().map(|&c| (c as f64).powi(2)).sum();
        squares * (1u64 << width) as f64 / n as f64 - n as f64
    };
    let delta = psi(M) - psi(M - 1);
    chi2_result(name, (1u64 << (M - 1)) as f64, delta, format!("m={M}, bits={n}"))
}

/// Approximate entropy comparing 3- and 4-bit pattern frequencies.
pub fn approximate_entropy(data: &[u8]) -> TestResult {
    let name = "Approximate Entropy";
    const M: usize = 3;
    let mut bits = to_bits(data);
    bits.truncate(PATTERN_BIT_LIMIT);
    let n = bits.len();
    if n < 64 {
        return TestResult::insufficient(name, 64, n);
    }
    let phi = |width: usize| -> f64 {
        pattern_counts(&bits, width)
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| {
                let p = c as f64 / n as f64;
                p * p.ln()
            })
            .sum()
    };
    let apen = phi(M) - phi(M + 1);
    let chi2 = 2.0 * n as f64 * (std::f64::consts::LN_2 - apen);
    chi2_result(name, (1u64 << M) as f64, chi2, format!("ApEn={apen:.6}, m={M}"))
}

/// Nibble-level poker test (16 hands, 15 df).
pub fn poker(data: &[u8]) -> TestResult {
    let name = "Poker";
    let hands = data.len() * 2;
    if hands < 320 {
        return TestResult::insufficient(name, 160, data.len());
    }
    let mut counts = [0u64; 16];
    for &b in data {
        counts[(b >> 4) as usize] += 1;
        counts[(b & 0x0f) as usize] += 1;
    }
    let squares: f64 = counts.iter().map(|&c| (c as f64).powi(2)).sum();
    let x = 16.0 / hands as f64 * squares - hands as f64;
    chi2_result(name, 15.0, x, format!("hands={hands}"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Spectral
// ═══════════════════════════════════════════════════════════════════════════════

/// Discrete Fourier transform peak count.
pub fn dft_spectral(data: &[u8]) -> TestResult {
    let name = "DFT Spectral";
    let bits = to_bits(data);
    let n = bits.len();
    if n < 64 {
        return TestResult::insufficient(name, 64, n);
    }
    let mut buffer: Vec<Complex<f64>> = bits
        .iter()
        .map(|&b| Complex::new(if b == 1 { 1.0 } else { -1.0 }, 0.0))
        .collect();
    FftPlanner::new().plan_fft_forward(n).process(&mut buffer);

    let half = n / 2;
    // sqrt(ln(1/0.05) * n)
    let threshold = (2.995_732_274 * n as f64).sqrt();
    let below = buffer[..half].iter().filter(|c| c.norm() < threshold).count() as f64;
    let expected = 0.95 * half as f64;
    let d = (below - expected) / (n as f64 * 0.95 * 0.05 / 4.0).sqrt();
    let p = erfc(d.abs() / SQRT_2);
    TestResult::from_p(name, p, d, format!("below threshold={below}/{half}"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Entropy
// ═══════════════════════════════════════════════════════════════════════════════

/// Shannon entropy per byte relative to the 8-bit maximum.
pub fn shannon(data: &[u8]) -> TestResult {
    let name = "Shannon Entropy";
    let n = data.len();
    if n < 16 {
        return TestResult::insufficient(name, 16, n);
    }
    let h: f64 = byte_histogram(data)
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n as f64;
            -p * p.log2()
        })
        .sum();
    let ratio = h / 8.0;
    TestResult::from_ratio(name, ratio, 0.85, format!("{h:.4} / 8.0 bits"))
}

/// Most-common-value min-entropy relative to the 8-bit maximum.
pub fn min_entropy(data: &[u8]) -> TestResult {
    let name = "Min-Entropy";
    let n = data.len();
    if n < 16 {
        return TestResult::insufficient(name, 16, n);
    }
    let p_max = byte_histogram(data).iter().copied().max().unwrap_or(0) as f64 / n as f64;
    let h_min = -(p_max + 1e-15).log2();
    let ratio = h_min / 8.0;
    TestResult::from_ratio(name, ratio, 0.7, format!("{h_min:.4} / 8.0 bits"))
}

/// zlib compressibility; random data does not compress.
pub fn compression(data: &[u8]) -> TestResult {
    let name = "Compression Ratio";
    let n = data.len();
    if n < 32 {
        return TestResult::insufficient(name, 32, n);
    }
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(n), Compression::best());
    let compressed = match encoder.write_all(data).and_then(|_| encoder.finish()) {
        Ok(out) => out,
        Err(e) => return TestResult::failed(name, format!("zlib error: {e}")),
    };
    let ratio = compressed.len() as f64 / n as f64;
    TestResult::from_ratio(
        name,
        ratio.min(1.0),
        0.85,
        format!("{}/{n} = {ratio:.4}", compressed.len()),
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// Correlation
// ═══════════════════════════════════════════════════════════════════════════════

/// Lag-1 correlation between adjacent bytes.
pub fn serial_correlation(data: &[u8]) -> TestResult {
    let name = "Serial Correlation";
    let n = data.len();
    if n < 20 {
        return TestResult::insufficient(name, 20, n);
    }
    let mean = data.iter().map(|&b| b as f64).sum::<f64>() / n as f64;
    let var = data
        .iter()
        .map(|&b| (b as f64 - mean).powi(2))
        .sum::<f64>()
        / n as f64;
    if var < 1e-10 {
        return TestResult::failed(name, "zero variance".to_string());
    }
    let cov: f64 = data
        .windows(2)
        .map(|w| (w[0] as f64 - mean) * (w[1] as f64 - mean))
        .sum();
    let r = cov / ((n - 1) as f64 * var);
    let z = r * (n as f64).sqrt();
    let p = 2.0 * (1.0 - Normal::standard().cdf(z.abs()));
    TestResult::from_p(name, p, r.abs(), format!("r={r:.6}, z={z:.4}"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Battery
// ═══════════════════════════════════════════════════════════════════════════════

/// Run every test in a fixed order.
pub fn run_all(data: &[u8]) -> Vec<TestResult> {
    let battery: [fn(&[u8]) -> TestResult; BATTERY_SIZE] = [
        monobit,
        block_frequency,
        byte_frequency,
        runs,
        longest_run,
        serial,
        approximate_entropy,
        cumulative_sums,
        dft_spectral,
        shannon,
        min_entropy,
        compression,
        serial_correlation,
        poker,
        bit_position_bias,
    ];
    battery.iter().map(|test| test(data)).collect()
}

/// Number of passing results.
pub fn passed_count(results: &[TestResult]) -> usize {
    results.iter().filter(|r| r.passed).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 64-bit LCG, good enough to pass a small battery.
    fn pseudo_random(n: usize) -> Vec<u8> {
        let mut state: u64 = 0x5DEE_CE66_D1CE_4E5B;
        (0..n)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                (state >> 33) as u8
            })
            .collect()
    }

    #[test]
    fn to_bits_is_msb_first() {
        assert_eq!(to_bits(&[0b1011_0001]), vec![1, 0, 1, 1, 0, 0, 0, 1]);
    }

    #[test]
    fn grades_follow_p_value_bands() {
        assert_eq!(grade_from_p(Some(0.5)), 'A');
        assert_eq!(grade_from_p(Some(0.05)), 'B');
        assert_eq!(grade_from_p(Some(0.005)), 'C');
        assert_eq!(grade_from_p(Some(0.0005)), 'D');
        assert_eq!(grade_from_p(Some(1e-9)), 'F');
        assert_eq!(grade_from_p(None), 'F');
    }

    #[test]
    fn battery_has_fifteen_tests() {
        let results = run_all(&pseudo_random(4096));
        assert_eq!(results.len(), BATTERY_SIZE);
        let mut names: Vec<_> = results.iter().map(|r| r.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BATTERY_SIZE, "test names must be unique");
    }

    #[test]
    fn short_input_is_reported_not_panicking() {
        let results = run_all(&[0xAA; 4]);
        assert_eq!(passed_count(&results), 0);
        assert!(results[0].details.contains("Insufficient"));
    }

    #[test]
    fn constant_input_fails_most_tests() {
        let results = run_all(&[0u8; 4096]);
        let passed = passed_count(&results);
        assert!(passed < 3, "constant data passed {passed} tests");
    }

    #[test]
    fn pseudo_random_input_passes_most_tests() {
        let results = run_all(&pseudo_random(4096));
        let passed = passed_count(&results);
        assert!(
            passed >= 11,
            "only {passed}/{BATTERY_SIZE} passed: {:?}",
            results
                .iter()
                .filter(|r| !r.passed)
                .map(|r| (r.name, r.details.clone()))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn monobit_detects_all_ones() {
        let r = monobit(&[0xFF; 128]);
        assert!(!r.passed);
        assert_eq!(r.grade, 'F');
    }

    #[test]
    fn alternating_bits_fail_runs() {
        // 0x55 = 01010101: maximal run count
        let r = runs(&[0x55; 256]);
        assert!(!r.passed, "alternating pattern passed runs: {}", r.details);
    }

    #[test]
    fn compression_flags_repetitive_data() {
        let data: Vec<u8> = (0..2048).map(|i| (i % 4) as u8).collect();
        assert!(!compression(&data).passed);
    }

    #[test]
    fn cumulative_sums_p_value_in_unit_interval() {
        let r = cumulative_sums(&pseudo_random(1024));
        let p = r.p_value.expect("p-value");
        assert!((0.0..=1.0).contains(&p));
    }
}
