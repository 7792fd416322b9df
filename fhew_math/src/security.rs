use statrs::function::erf::{erfc, erfc_inv};

/// The distance between a plaintext's encoding and the nearest decision
/// boundary, `q / 2p`.
fn decision_margin(plaintext_modulus: u64, ciphertext_modulus: u64) -> f64 {
    ciphertext_modulus as f64 / (2.0 * plaintext_modulus as f64)
}

/// Noise of a gate accumulating `gate_inputs` fresh ciphertexts grows by
/// `sqrt(gate_inputs)`; the extra `sqrt(2)` turns `erfc` into a Gaussian
/// tail.
fn tail_scale(gate_inputs: u32) -> f64 {
    (2.0 * gate_inputs as f64).sqrt()
}

/// Returns the largest noise standard deviation whose decryption failure
/// probability does not exceed `2^failure_exponent`.
///
/// # Remarks
/// `failure_exponent` is the base 2 log of the tolerated failure probability
/// (e.g. `-32` for `2^-32`). The result is derived from the Gaussian tail
/// bound `P[fail] = erfc(q / (2p) / (sqrt(2k) * sigma))` where `k` is the
/// number of gate inputs.
pub fn target_noise(
    failure_exponent: f64,
    plaintext_modulus: u64,
    ciphertext_modulus: u64,
    gate_inputs: u32,
) -> f64 {
    let margin = decision_margin(plaintext_modulus, ciphertext_modulus);

    margin / (tail_scale(gate_inputs) * erfc_inv(failure_exponent.exp2()))
}

/// Returns the base 2 log of the decryption failure probability given the
/// measured noise standard deviation. The inverse of [`target_noise`].
///
/// # Remarks
/// When the tail probability underflows to exactly zero, the failure rate is
/// reported as `0` rather than negative infinity.
pub fn failure_rate(
    noise_std: f64,
    plaintext_modulus: u64,
    ciphertext_modulus: u64,
    gate_inputs: u32,
) -> f64 {
    let margin = decision_margin(plaintext_modulus, ciphertext_modulus);
    let val = erfc(margin / (tail_scale(gate_inputs) * noise_std));

    if val == 0.0 { 0.0 } else { val.log2() }
}
