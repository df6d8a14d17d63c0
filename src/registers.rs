// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Register name tables for the Emotion Engine GPR and FPR banks.
//!
//! Every GPR answers to three spellings (`t0`, `$t0`, `"8"`), every FPR to
//! two (`f4`, `$f4`). Lookups are case-insensitive and both banks share one
//! number space, 0..31.

/// Conventional GPR names, indexed by register number.
pub const GPR_NAMES: [&str; 32] = [
    "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3", "t0", "t1", "t2", "t3", "t4", "t5", "t6",
    "t7", "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "t8", "t9", "k0", "k1", "gp", "sp", "fp",
    "ra",
];

/// Resolves a register spelling to its number, or `None` when the spelling
/// is not registered. The bare decimal spellings (`"8"`) are not valid
/// behind a `$` prefix.
pub fn lookup(name: &str) -> Option<u32> {
    if let Some(tail) = name.strip_prefix('$') {
        return lookup_gpr_name(tail).or_else(|| lookup_fpr_name(tail));
    }
    lookup_gpr_name(name)
        .or_else(|| lookup_gpr_index(name))
        .or_else(|| lookup_fpr_name(name))
}

/// True when the operand names an FPR: after stripping at most one leading
/// `$` it reads `f<n>` with `0 <= n < 32`.
pub fn is_fpr(name: &str) -> bool {
    let name = name.strip_prefix('$').unwrap_or(name);
    lookup_fpr_name(name).is_some()
}

fn lookup_gpr_name(name: &str) -> Option<u32> {
    GPR_NAMES
        .iter()
        .position(|gpr| gpr.eq_ignore_ascii_case(name))
        .map(|idx| idx as u32)
}

fn lookup_gpr_index(name: &str) -> Option<u32> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let idx: u32 = name.parse().ok()?;
    (idx < 32).then_some(idx)
}

fn lookup_fpr_name(name: &str) -> Option<u32> {
    let tail = name.strip_prefix(['f', 'F'])?;
    if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let idx: u32 = tail.parse().ok()?;
    (idx < 32).then_some(idx)
}
