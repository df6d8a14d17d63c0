//! Operand parsing: registers, hex/decimal literals, and label references.

use crate::error::{AsmError, AsmErrorKind};
use crate::registers;
use crate::symbol_table::LabelTable;

/// Parses one operand into its 32-bit value.
///
/// The priority order is fixed: immediate-context `$`-hex, register, `0x`
/// hex, non-immediate `$`-hex, decimal, label. The value is returned
/// signed but is assembled as an unsigned bit pattern.
pub fn parse_operand(op: &str, labels: &LabelTable, immediate: bool) -> Result<i32, AsmError> {
    let op = op.trim();
    if op.is_empty() {
        return Err(AsmError::new(AsmErrorKind::Operand, "Missing operand", None));
    }

    if immediate {
        if let Some(tail) = op.strip_prefix('$') {
            return parse_hex(tail, op);
        }
    }

    if let Some(reg) = register_lookup_cleaned(op) {
        return Ok(reg as i32);
    }

    if let Some(tail) = strip_hex_prefix(op) {
        return parse_hex(tail, op);
    }

    if !immediate {
        if let Some(tail) = op.strip_prefix('$') {
            if let Some(reg) = registers::lookup(op) {
                return Ok(reg as i32);
            }
            return parse_hex(tail, op);
        }
    }

    if let Ok(value) = op.parse::<i32>() {
        return Ok(value);
    }

    lookup_label(op, labels)
}

/// Splits and parses a memory operand of the form `offset(base)`.
/// Returns `(imm, rs)`; the base goes through the standard operand parser
/// in non-immediate context.
pub fn parse_mem_operand(op: &str, labels: &LabelTable) -> Result<(i32, u32), AsmError> {
    let op = op.trim();
    let open = op
        .find('(')
        .ok_or_else(|| AsmError::new(AsmErrorKind::Operand, "Invalid memory operand", Some(op)))?;
    if !op.ends_with(')') {
        return Err(AsmError::new(
            AsmErrorKind::Operand,
            "Invalid memory operand",
            Some(op),
        ));
    }
    let offset = op[..open].trim();
    let base = op[open + 1..op.len() - 1].trim();
    if offset.is_empty() || base.is_empty() {
        return Err(AsmError::new(
            AsmErrorKind::Operand,
            "Invalid memory operand",
            Some(op),
        ));
    }

    let imm = if let Some(tail) = offset.strip_prefix('$') {
        parse_hex(tail, offset)?
    } else if let Some(tail) = strip_hex_prefix(offset) {
        parse_hex(tail, offset)?
    } else if let Ok(value) = offset.parse::<i32>() {
        value
    } else {
        lookup_label(offset, labels)?
    };

    let rs = parse_operand(base, labels, false)? as u32 & 0x1F;
    Ok((imm, rs))
}

/// Register lookup tolerating stray label sigils around the spelling.
fn register_lookup_cleaned(op: &str) -> Option<u32> {
    if let Some(reg) = registers::lookup(op) {
        return Some(reg);
    }
    if let Some(tail) = op.strip_prefix([':', ';']) {
        let tail = tail.strip_suffix([':', ';']).unwrap_or(tail);
        return registers::lookup(tail);
    }
    if let Some(head) = op.strip_suffix([':', ';']) {
        return registers::lookup(head);
    }
    None
}

fn strip_hex_prefix(op: &str) -> Option<&str> {
    op.strip_prefix("0x").or_else(|| op.strip_prefix("0X"))
}

fn parse_hex(digits: &str, original: &str) -> Result<i32, AsmError> {
    if digits.is_empty() {
        return Err(AsmError::new(
            AsmErrorKind::Operand,
            "Invalid hex value",
            Some(original),
        ));
    }
    u32::from_str_radix(digits, 16)
        .map(|value| value as i32)
        .map_err(|_| AsmError::new(AsmErrorKind::Operand, "Invalid hex value", Some(original)))
}

fn lookup_label(op: &str, labels: &LabelTable) -> Result<i32, AsmError> {
    if let Some(addr) = labels.lookup(op) {
        return Ok(addr as i32);
    }
    let stripped = op.strip_prefix(':').unwrap_or(op);
    let stripped = stripped.strip_suffix(':').unwrap_or(stripped);
    if stripped != op {
        if let Some(addr) = labels.lookup(stripped) {
            return Ok(addr as i32);
        }
    }
    Err(AsmError::new(
        AsmErrorKind::Operand,
        "Unknown value or unresolved label",
        Some(op),
    ))
}
