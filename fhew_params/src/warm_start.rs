use crate::SecurityLevel;

/// Coefficients `(a, b)` of the fit `log2(modulus) = a * dimension + b` for
/// moduli meeting each standard security level.
fn modulus_regression(level: SecurityLevel) -> (f64, f64) {
    match level {
        SecurityLevel::Std128 => (0.026243550051145488, -0.19332645282074845),
        SecurityLevel::Std128Q => (0.024334365322949414, 0.026487788095649),
        SecurityLevel::Std192 => (0.01843137255110034, -0.6666666695778614),
        SecurityLevel::Std192Q => (0.017254901960954656, -0.9019607843827292),
        SecurityLevel::Std256 => (0.014352941174320843, -1.0014705882400903),
        SecurityLevel::Std256Q => (0.01339285714070515, -1.083333333337455),
    }
}

/// Returns an analytic estimate of the largest modulus bit length at which a
/// `dimension`-dimensional instance meets `level`.
///
/// # Remarks
/// This is only a starting point for [`SecurityOptimizer`](crate::SecurityOptimizer),
/// which corrects it against the security estimator. Estimates below one bit
/// are rounded up to one bit.
pub fn warm_start_modulus_bits(dimension: usize, level: SecurityLevel) -> u32 {
    let (a, b) = modulus_regression(level);

    (a * dimension as f64 + b).ceil().max(1.0) as u32
}
