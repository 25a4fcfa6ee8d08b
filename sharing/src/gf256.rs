// Copyright 2024 ReMemory Contributors
// SPDX-License-Identifier: Apache-2.0

//! Arithmetic in GF(2^8) with the AES reduction polynomial `x^8 + x^4 + x^3 + x + 1`.
//!
//! Built once as exp/log tables; every split/combine operation is then a
//! handful of table lookups and XORs, not bit-level polynomial math.

const POLY: u16 = 0x11b;

pub struct Tables {
    exp: [u8; 512],
    log: [u8; 256],
}

fn build() -> Tables {
    let mut exp = [0u8; 512];
    let mut log = [0u8; 256];
    let mut x: u16 = 1;
    for i in 0..255usize {
        exp[i] = x as u8;
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= POLY;
        }
    }
    for i in 255..512 {
        exp[i] = exp[i - 255];
    }
    Tables { exp, log }
}

thread_local! {
    static TABLES: Tables = build();
}

/// `a + b` in GF(2^8), which is simply XOR.
pub fn add(a: u8, b: u8) -> u8 {
    a ^ b
}

/// `a * b` in GF(2^8).
pub fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    TABLES.with(|t| {
        let la = t.log[a as usize] as usize;
        let lb = t.log[b as usize] as usize;
        t.exp[la + lb]
    })
}

/// `a / b` in GF(2^8). Panics if `b == 0`.
pub fn div(a: u8, b: u8) -> u8 {
    assert!(b != 0, "division by zero in GF(2^8)");
    if a == 0 {
        return 0;
    }
    TABLES.with(|t| {
        let la = t.log[a as usize] as usize;
        let lb = t.log[b as usize] as usize;
        t.exp[255 + la - lb]
    })
}
