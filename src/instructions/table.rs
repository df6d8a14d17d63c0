// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Baseline mnemonic table for the Emotion Engine integer core and FPU.

use super::{OpFamily as F, OpInfo};

pub static INSTRUCTION_TABLE: &[OpInfo] = &[
    // Integer arithmetic and logic, SPECIAL encoding.
    OpInfo::new("add", F::R).funct(0x20),
    OpInfo::new("addu", F::R).funct(0x21),
    OpInfo::new("sub", F::R).funct(0x22),
    OpInfo::new("subu", F::R).funct(0x23),
    OpInfo::new("and", F::R).funct(0x24),
    OpInfo::new("or", F::R).funct(0x25),
    OpInfo::new("xor", F::R).funct(0x26),
    OpInfo::new("nor", F::R).funct(0x27),
    OpInfo::new("slt", F::R).funct(0x2A),
    OpInfo::new("sltu", F::R).funct(0x2B),
    OpInfo::new("dadd", F::R).funct(0x2C),
    OpInfo::new("daddu", F::R).funct(0x2D),
    OpInfo::new("dsub", F::R).funct(0x2E),
    OpInfo::new("dsubu", F::R).funct(0x2F),
    OpInfo::new("movz", F::R).funct(0x0A),
    OpInfo::new("movn", F::R).funct(0x0B),
    OpInfo::new("jr", F::R).funct(0x08),
    OpInfo::new("jalr", F::RJalr).funct(0x09),
    // Shifts.
    OpInfo::new("sll", F::RShift).funct(0x00),
    OpInfo::new("srl", F::RShift).funct(0x02),
    OpInfo::new("sra", F::RShift).funct(0x03),
    OpInfo::new("dsll", F::RShift).funct(0x38),
    OpInfo::new("dsrl", F::RShift).funct(0x3A),
    OpInfo::new("dsra", F::RShift).funct(0x3B),
    OpInfo::new("dsll32", F::RShiftPlus32).funct(0x3C),
    OpInfo::new("dsrl32", F::RShiftPlus32).funct(0x3E),
    OpInfo::new("dsra32", F::RShiftPlus32).funct(0x3F),
    OpInfo::new("sllv", F::RShiftV).funct(0x04),
    OpInfo::new("srlv", F::RShiftV).funct(0x06),
    OpInfo::new("srav", F::RShiftV).funct(0x07),
    OpInfo::new("dsllv", F::RShiftV).funct(0x14),
    OpInfo::new("dsrlv", F::RShiftV).funct(0x16),
    OpInfo::new("dsrav", F::RShiftV).funct(0x17),
    // Multiply and divide.
    OpInfo::new("mult", F::RMultDiv).funct(0x18),
    OpInfo::new("multu", F::RMultDiv).funct(0x19),
    OpInfo::new("div", F::RMultDiv).funct(0x1A),
    OpInfo::new("divu", F::RMultDiv).funct(0x1B),
    OpInfo::new("mfhi", F::RMfhiMflo).funct(0x10),
    OpInfo::new("mflo", F::RMfhiMflo).funct(0x12),
    OpInfo::new("mthi", F::RMthiMtlo).funct(0x11),
    OpInfo::new("mtlo", F::RMthiMtlo).funct(0x13),
    // Traps and barriers.
    OpInfo::new("syscall", F::RSyscallBreak).funct(0x0C),
    OpInfo::new("break", F::RSyscallBreak).funct(0x0D),
    OpInfo::new("sync", F::RSync).funct(0x0F),
    OpInfo::new("eret", F::REret).opcode(0x10).funct(0x18),
    // Immediate arithmetic.
    OpInfo::new("addi", F::I).opcode(0x08),
    OpInfo::new("addiu", F::I).opcode(0x09),
    OpInfo::new("slti", F::I).opcode(0x0A),
    OpInfo::new("sltiu", F::I).opcode(0x0B),
    OpInfo::new("andi", F::I).opcode(0x0C),
    OpInfo::new("ori", F::I).opcode(0x0D),
    OpInfo::new("xori", F::I).opcode(0x0E),
    OpInfo::new("lui", F::I).opcode(0x0F),
    OpInfo::new("daddi", F::I).opcode(0x18),
    OpInfo::new("daddiu", F::I).opcode(0x19),
    // Memory loads and stores.
    OpInfo::new("lb", F::I).opcode(0x20),
    OpInfo::new("lh", F::I).opcode(0x21),
    OpInfo::new("lwl", F::I).opcode(0x22),
    OpInfo::new("lw", F::I).opcode(0x23),
    OpInfo::new("lbu", F::I).opcode(0x24),
    OpInfo::new("lhu", F::I).opcode(0x25),
    OpInfo::new("lwr", F::I).opcode(0x26),
    OpInfo::new("lwu", F::I).opcode(0x27),
    OpInfo::new("sb", F::I).opcode(0x28),
    OpInfo::new("sh", F::I).opcode(0x29),
    OpInfo::new("swl", F::I).opcode(0x2A),
    OpInfo::new("sw", F::I).opcode(0x2B),
    OpInfo::new("sdl", F::I).opcode(0x2C),
    OpInfo::new("sdr", F::I).opcode(0x2D),
    OpInfo::new("swr", F::I).opcode(0x2E),
    OpInfo::new("ldl", F::I).opcode(0x1A),
    OpInfo::new("ldr", F::I).opcode(0x1B),
    OpInfo::new("ld", F::ILdSd).opcode(0x37),
    OpInfo::new("sd", F::ILdSd).opcode(0x3F),
    OpInfo::new("lq", F::ILdSd).opcode(0x1E),
    OpInfo::new("sq", F::ILdSd).opcode(0x1F),
    // Branches.
    OpInfo::new("beq", F::IBranch).opcode(0x04),
    OpInfo::new("bne", F::IBranch).opcode(0x05),
    OpInfo::new("beql", F::IBranchLikely).opcode(0x14),
    OpInfo::new("bnel", F::IBranchLikely).opcode(0x15),
    OpInfo::new("blez", F::IBranchRsZero).opcode(0x06),
    OpInfo::new("bgtz", F::IBranchRsZero).opcode(0x07),
    OpInfo::new("blezl", F::IBranchRsZero).opcode(0x16),
    OpInfo::new("bgtzl", F::IBranchRsZero).opcode(0x17),
    OpInfo::new("bltz", F::IBranchRsRtFmt).opcode(0x01).rt_field(0x00),
    OpInfo::new("bgez", F::IBranchRsRtFmt).opcode(0x01).rt_field(0x01),
    OpInfo::new("bltzl", F::IBranchRsRtFmt).opcode(0x01).rt_field(0x02),
    OpInfo::new("bgezl", F::IBranchRsRtFmt).opcode(0x01).rt_field(0x03),
    OpInfo::new("bltzal", F::IBranchRsRtFmt).opcode(0x01).rt_field(0x10),
    OpInfo::new("bgezal", F::IBranchRsRtFmt).opcode(0x01).rt_field(0x11),
    OpInfo::new("bltzall", F::IBranchRsRtFmt).opcode(0x01).rt_field(0x12),
    OpInfo::new("bgezall", F::IBranchRsRtFmt).opcode(0x01).rt_field(0x13),
    // Jumps.
    OpInfo::new("j", F::J).opcode(0x02),
    OpInfo::new("jal", F::J).opcode(0x03),
    // COP0 moves.
    OpInfo::new("mfc0", F::Cop0Mov).opcode(0x10).cop_op(0x00),
    OpInfo::new("mtc0", F::Cop0Mov).opcode(0x10).cop_op(0x04),
    // FPU loads, stores, and moves.
    OpInfo::new("lwc1", F::IfpuLs).opcode(0x31),
    OpInfo::new("swc1", F::IfpuLs).opcode(0x39),
    OpInfo::new("mfc1", F::FpuMov).opcode(0x11).cop_op(0x00),
    OpInfo::new("mtc1", F::FpuMov).opcode(0x11).cop_op(0x04),
    // Single-precision FPU arithmetic.
    OpInfo::new("add.s", F::FpuR).opcode(0x11).fmt(0x10).funct(0x00),
    OpInfo::new("sub.s", F::FpuR).opcode(0x11).fmt(0x10).funct(0x01),
    OpInfo::new("mul.s", F::FpuR).opcode(0x11).fmt(0x10).funct(0x02),
    OpInfo::new("div.s", F::FpuR).opcode(0x11).fmt(0x10).funct(0x03),
    OpInfo::new("madd.s", F::FpuR).opcode(0x11).fmt(0x10).funct(0x1C),
    OpInfo::new("msub.s", F::FpuR).opcode(0x11).fmt(0x10).funct(0x1D),
    OpInfo::new("max.s", F::FpuR).opcode(0x11).fmt(0x10).funct(0x28),
    OpInfo::new("min.s", F::FpuR).opcode(0x11).fmt(0x10).funct(0x29),
    OpInfo::new("rsqrt.s", F::FpuR).opcode(0x11).fmt(0x10).funct(0x16),
    OpInfo::new("sqrt.s", F::FpuRUn).opcode(0x11).fmt(0x10).funct(0x04),
    OpInfo::new("abs.s", F::FpuRUn).opcode(0x11).fmt(0x10).funct(0x05),
    OpInfo::new("mov.s", F::FpuRUn).opcode(0x11).fmt(0x10).funct(0x06),
    OpInfo::new("neg.s", F::FpuRUn).opcode(0x11).fmt(0x10).funct(0x07),
    // Convert forms for every source format.
    OpInfo::new("cvt.s.d", F::FpuCvt).opcode(0x11).fmt(0x11).funct(0x20),
    OpInfo::new("cvt.s.w", F::FpuCvt).opcode(0x11).fmt(0x14).funct(0x20),
    OpInfo::new("cvt.s.l", F::FpuCvt).opcode(0x11).fmt(0x15).funct(0x20),
    OpInfo::new("cvt.d.s", F::FpuCvt).opcode(0x11).fmt(0x10).funct(0x21),
    OpInfo::new("cvt.d.w", F::FpuCvt).opcode(0x11).fmt(0x14).funct(0x21),
    OpInfo::new("cvt.d.l", F::FpuCvt).opcode(0x11).fmt(0x15).funct(0x21),
    OpInfo::new("cvt.w.s", F::FpuCvt).opcode(0x11).fmt(0x10).funct(0x24),
    OpInfo::new("cvt.w.d", F::FpuCvt).opcode(0x11).fmt(0x11).funct(0x24),
    OpInfo::new("cvt.l.s", F::FpuCvt).opcode(0x11).fmt(0x10).funct(0x25),
    OpInfo::new("cvt.l.d", F::FpuCvt).opcode(0x11).fmt(0x11).funct(0x25),
    // FPU compares and branches.
    OpInfo::new("c.f.s", F::FpuCmp).opcode(0x11).fmt(0x10).funct(0x30),
    OpInfo::new("c.eq.s", F::FpuCmp).opcode(0x11).fmt(0x10).funct(0x32),
    OpInfo::new("c.lt.s", F::FpuCmp).opcode(0x11).fmt(0x10).funct(0x34),
    OpInfo::new("c.le.s", F::FpuCmp).opcode(0x11).fmt(0x10).funct(0x36),
    OpInfo::new("bc1f", F::FpuBranch).opcode(0x11).cop_op(0x08).cc(0),
    OpInfo::new("bc1t", F::FpuBranch).opcode(0x11).cop_op(0x08).cc(1),
    // Fixed words and pseudo-instructions.
    OpInfo::new("nop", F::Custom).custom(0x0000_0000),
    OpInfo::new("b", F::PseudoBranch),
    OpInfo::new("setreg", F::PseudoSetReg),
];
