// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

//! K-of-N Shamir secret sharing over GF(2^8).
//!
//! A share is `secret.len() + 1` bytes: byte 0 is the 1-based x-coordinate,
//! the rest is the polynomial evaluated at that x for every byte of the
//! secret independently. Reconstruction is Lagrange interpolation at x=0.

mod gf256;

use primitives::random_bytes;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    #[error("invalid share: {0}")]
    InvalidShare(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Split `secret` into `n` shares of which any `k` reconstruct it.
///
/// Requires `2 <= k <= n <= 255` and a non-empty secret. Coefficients above
/// the constant term are drawn from the OS CSPRNG for every byte position.
pub fn split(secret: &[u8], n: u8, k: u8) -> Result<Vec<Vec<u8>>> {
    validate_params(n, k)?;
    if secret.is_empty() {
        return Err(Error::InvalidParams("secret must not be empty".into()));
    }

    // coefficients[byte_index][degree - 1] for degree in 1..k
    let coeff_bytes = random_bytes(secret.len() * (k as usize - 1));
    let mut shares: Vec<Vec<u8>> = (1..=n)
        .map(|x| {
            let mut share = Vec::with_capacity(secret.len() + 1);
            share.push(x);
            share
        })
        .collect();

    for (byte_idx, &secret_byte) in secret.iter().enumerate() {
        let coeffs = &coeff_bytes[byte_idx * (k as usize - 1)..(byte_idx + 1) * (k as usize - 1)];
        for share in shares.iter_mut() {
            let x = share[0];
            let y = eval_polynomial(secret_byte, coeffs, x);
            share.push(y);
        }
    }

    Ok(shares)
}

/// Reconstruct the secret from `shares`.
///
/// Every share must have the same length and the set of x-coordinates
/// (byte 0 of each share) must contain no duplicates. Passing fewer than
/// the original threshold is accepted here - the arithmetic cannot know
/// the threshold used at split time - but the result will not equal the
/// original secret.
pub fn combine(shares: &[Vec<u8>]) -> Result<Vec<u8>> {
    if shares.len() < 2 {
        return Err(Error::InvalidShare(
            "at least two shares are required".into(),
        ));
    }
    let share_len = shares[0].len();
    if share_len < 2 {
        return Err(Error::InvalidShare("share is too short".into()));
    }
    for s in shares {
        if s.len() != share_len {
            return Err(Error::InvalidShare(
                "shares have inconsistent lengths".into(),
            ));
        }
    }

    let mut seen_x = std::collections::HashSet::new();
    for s in shares {
        if !seen_x.insert(s[0]) {
            return Err(Error::InvalidShare(format!(
                "duplicate share x-coordinate {}",
                s[0]
            )));
        }
    }

    let secret_len = share_len - 1;
    let mut secret = vec![0u8; secret_len];
    for byte_idx in 0..secret_len {
        let points: Vec<(u8, u8)> = shares.iter().map(|s| (s[0], s[byte_idx + 1])).collect();
        secret[byte_idx] = lagrange_interpolate_at_zero(&points);
    }
    Ok(secret)
}

fn validate_params(n: u8, k: u8) -> Result<()> {
    if n < 1 {
        return Err(Error::InvalidParams("n must be at least 1".into()));
    }
    if k < 2 {
        return Err(Error::InvalidParams("threshold must be at least 2".into()));
    }
    if k > n {
        return Err(Error::InvalidParams(
            "threshold cannot exceed total shares".into(),
        ));
    }
    Ok(())
}

/// Evaluate `constant + coeffs[0]*x + coeffs[1]*x^2 + ...` at `x` in GF(2^8).
fn eval_polynomial(constant: u8, coeffs: &[u8], x: u8) -> u8 {
    let mut result = constant;
    let mut x_pow = x;
    for &c in coeffs {
        result = gf256::add(result, gf256::mul(c, x_pow));
        x_pow = gf256::mul(x_pow, x);
    }
    result
}

/// Lagrange interpolation of `points` evaluated at x=0, i.e. the constant term.
fn lagrange_interpolate_at_zero(points: &[(u8, u8)]) -> u8 {
    let mut result = 0u8;
    for (i, &(xi, yi)) in points.iter().enumerate() {
        let mut numerator = 1u8;
        let mut denominator = 1u8;
        for (j, &(xj, _)) in points.iter().enumerate() {
            if i == j {
                continue;
            }
            // at x=0: (0 - xj) == xj in GF(2^8), since subtraction is XOR
            numerator = gf256::mul(numerator, xj);
            denominator = gf256::mul(denominator, gf256::add(xi, xj));
        }
        let term = gf256::mul(yi, gf256::div(numerator, denominator));
        result = gf256::add(result, term);
    }
    result
}
