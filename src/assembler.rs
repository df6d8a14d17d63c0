// Assembler core pipeline: two-pass compilation and run orchestration.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, ValueEnum};
use serde_json::json;

use crate::comments::CommentStripper;
use crate::error::{build_context_lines, AsmError, AsmErrorKind};
use crate::instructions::{self, OpFamily};
use crate::operand;
use crate::output::{self, OutputMode};
use crate::preprocess::{self, FsReader, Preprocessor, SourceLine, SourceReader};
use crate::registers;
use crate::symbol_table::{LabelTable, LabelTableResult};

pub const VERSION: &str = "1.0";
const LONG_ABOUT: &str = "Two-pass MIPS assembler for the PlayStation 2 Emotion Engine.

Sources use `address`, `print`, `hexcode`, `float`, and `setreg` directives
alongside the EE integer and FPU instruction set, with `import \"file\"` for
inclusion. Output is a RAW address/word listing (--mode ps2) or a PCSX2
patch file (--mode pnach). Use --format-char to override the leading digit
of every emitted address, e.g. 2 for E-type patch regions.";

#[derive(Parser, Debug)]
#[command(
    name = "ps2asm",
    version = VERSION,
    about = "PlayStation 2 Emotion Engine assembler producing RAW and PNACH cheat listings",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    #[arg(
        long = "format",
        value_enum,
        default_value_t = ReportFormat::Text,
        long_help = "Select global CLI output format. text is default; json enables machine-readable reports."
    )]
    pub format: ReportFormat,
    #[arg(
        short = 'q',
        long = "quiet",
        action = ArgAction::SetTrue,
        long_help = "Suppress per-input summaries for successful runs. Errors are still reported unless --no-error is set."
    )]
    pub quiet: bool,
    #[arg(
        short = 'E',
        long = "error",
        value_name = "FILE",
        long_help = "Write diagnostics to FILE instead of stderr."
    )]
    pub error_file: Option<PathBuf>,
    #[arg(
        long = "error-append",
        action = ArgAction::SetTrue,
        requires = "error_file",
        long_help = "Append diagnostics to --error FILE instead of truncating it."
    )]
    pub error_append: bool,
    #[arg(
        long = "no-error",
        action = ArgAction::SetTrue,
        conflicts_with_all = ["error_file", "error_append"],
        long_help = "Disable all diagnostic output routing."
    )]
    pub no_error: bool,
    #[arg(
        short = 'm',
        long = "mode",
        value_enum,
        default_value_t = ModeArg::Ps2,
        long_help = "Output listing format: ps2 emits `ADDR WORD` pairs, pnach emits PCSX2 patch lines."
    )]
    pub mode: ModeArg,
    #[arg(
        short = 'c',
        long = "format-char",
        value_name = "CHAR",
        default_value = "-",
        long_help = "Replace the leading digit of every emitted address with CHAR. `-` leaves addresses unchanged."
    )]
    pub format_char: String,
    #[arg(
        short = 'o',
        long = "outfile",
        value_name = "BASE",
        long_help = "Output filename base. Defaults to the input base. With multiple inputs, BASE must be a directory."
    )]
    pub outfile: Option<String>,
    #[arg(
        short = 'i',
        long = "infile",
        value_name = "FILE",
        action = ArgAction::Append,
        long_help = "Input assembly file (repeatable). Must end with .asm."
    )]
    pub infiles: Vec<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    Ps2,
    Pnach,
}

impl ModeArg {
    pub fn output_mode(self) -> OutputMode {
        match self {
            ModeArg::Ps2 => OutputMode::Ps2,
            ModeArg::Pnach => OutputMode::Pnach,
        }
    }
}

/// Where CLI diagnostics should be routed.
pub enum DiagnosticsSinkConfig {
    Disabled,
    Stderr,
    File { path: PathBuf, append: bool },
}

pub fn diagnostics_sink_config(cli: &Cli) -> DiagnosticsSinkConfig {
    if cli.no_error {
        return DiagnosticsSinkConfig::Disabled;
    }
    match &cli.error_file {
        Some(path) => DiagnosticsSinkConfig::File {
            path: path.clone(),
            append: cli.error_append,
        },
        None => DiagnosticsSinkConfig::Stderr,
    }
}

/// One diagnostic produced during a compile.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub file: String,
    /// 1-based line within the origin file.
    pub line: u32,
    /// Position in the expanded line sequence.
    pub index: usize,
    /// Address the failing line would have consumed.
    pub address: u32,
    /// Machine code attempted for the line, when one was produced.
    pub data: Option<u32>,
    pub error: AsmError,
    pub source_line: String,
    pub from_main_input: bool,
}

impl ErrorRecord {
    pub fn message(&self) -> &str {
        self.error.message()
    }

    /// The attempted machine code as 8 hex digits, or `N/A`.
    pub fn data_text(&self) -> String {
        match self.data {
            Some(word) => format!("{word:08X}"),
            None => "N/A".to_string(),
        }
    }

    pub fn format_with_context(&self, use_color: bool) -> String {
        let mut out = format!("{}:{}: ERROR\n", self.file, self.line);
        for line in build_context_lines(self.line, None, Some(&self.source_line), use_color) {
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str(&format!(
            "ERROR: {} (address {:08X}, code {})",
            self.error.message(),
            self.address,
            self.data_text()
        ));
        out
    }
}

/// Outcome of one `compile` call.
#[derive(Debug)]
pub struct CompilationResult {
    pub success: bool,
    /// Emitted listing text; partial output is preserved on failure.
    pub output: String,
    pub errors: Vec<ErrorRecord>,
    /// Deduplicated 1-based line numbers of errors in the top-level input,
    /// in first-encounter order.
    pub main_error_lines: Vec<u32>,
}

impl CompilationResult {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

/// Compiles the given source lines into the selected listing format.
///
/// `current_file_path` names the top-level input for error origins and
/// anchors relative `import` resolution.
pub fn compile(
    input_lines: &[String],
    current_file_path: Option<&Path>,
    mode: OutputMode,
    address_format_char: &str,
) -> CompilationResult {
    compile_with_reader(
        input_lines,
        current_file_path,
        mode,
        address_format_char,
        &FsReader,
    )
}

pub fn compile_with_reader(
    input_lines: &[String],
    current_file_path: Option<&Path>,
    mode: OutputMode,
    address_format_char: &str,
    reader: &dyn SourceReader,
) -> CompilationResult {
    let file_name = current_file_path
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "<input>".to_string());
    let dir = current_file_path.and_then(Path::parent).map(Path::to_path_buf);

    let mut pp = Preprocessor::new(reader);
    let lines = match pp.expand(input_lines, &file_name, dir.as_deref()) {
        Ok(lines) => lines,
        Err(err) => {
            return CompilationResult {
                success: false,
                output: String::new(),
                errors: vec![ErrorRecord {
                    file: file_name,
                    line: 0,
                    index: 0,
                    address: 0,
                    data: None,
                    error: err,
                    source_line: String::new(),
                    from_main_input: true,
                }],
                main_error_lines: Vec::new(),
            };
        }
    };

    let mut compiler = Compiler::new(&lines, mode, output::parse_format_char(address_format_char));
    compiler.pass1();
    if !compiler.errors.is_empty() {
        return compiler.into_result();
    }
    compiler.pass2();
    compiler.into_result()
}

struct Compiler<'a> {
    lines: &'a [SourceLine],
    labels: LabelTable,
    errors: Vec<ErrorRecord>,
    output: Vec<String>,
    mode: OutputMode,
    format_char: Option<char>,
}

impl<'a> Compiler<'a> {
    fn new(lines: &'a [SourceLine], mode: OutputMode, format_char: Option<char>) -> Self {
        Self {
            lines,
            labels: LabelTable::new(),
            errors: Vec::new(),
            output: Vec::new(),
            mode,
            format_char,
        }
    }

    /// Pass 1: address assignment and label collection. Pass 2 only runs
    /// when this pass finishes clean.
    fn pass1(&mut self) {
        let lines = self.lines;
        let mut stripper = CommentStripper::new();
        let mut addr: u32 = 0;

        for src in lines {
            let text = stripper.strip(&src.text);
            if text.is_empty() {
                continue;
            }
            let rest = self.consume_labels(&text, addr, src, true);
            if rest.is_empty() {
                continue;
            }
            let (mnemonic, args) = split_statement(&rest);
            match mnemonic.to_ascii_lowercase().as_str() {
                "address" => match parse_address(args) {
                    Ok(value) => addr = value,
                    Err(err) => self.record(src, addr, None, err),
                },
                "print" => match parse_print_bytes(args) {
                    Ok(bytes) => addr = addr.wrapping_add(bytes.len().div_ceil(4) as u32 * 4),
                    Err(err) => self.record(src, addr, None, err),
                },
                "hexcode" | "float" => addr = addr.wrapping_add(4),
                other => {
                    let size = match instructions::lookup(other) {
                        Some(op) if op.family == OpFamily::PseudoSetReg => 8,
                        _ => 4,
                    };
                    addr = addr.wrapping_add(size);
                }
            }
        }
    }

    /// Pass 2: encoding and output emission. A failing line contributes an
    /// error record and does not advance the address counter.
    fn pass2(&mut self) {
        let lines = self.lines;
        let mut stripper = CommentStripper::new();
        let mut addr: u32 = 0;

        for src in lines {
            let text = stripper.strip(&src.text);
            if text.is_empty() {
                continue;
            }
            let rest = self.consume_labels(&text, addr, src, false);
            if rest.is_empty() {
                continue;
            }
            let (mnemonic, args) = split_statement(&rest);
            let words = match mnemonic.to_ascii_lowercase().as_str() {
                "address" => match parse_address(args) {
                    Ok(value) => {
                        addr = value;
                        continue;
                    }
                    Err(err) => Err(err),
                },
                "print" => parse_print_bytes(args).map(|bytes| print_words(&bytes)),
                "hexcode" => self.parse_value_operand(args).map(|word| vec![word]),
                "float" => parse_float_word(args).map(|word| vec![word]),
                _ => self.encode_instruction(mnemonic, args, addr),
            };
            match words {
                Ok(words) => {
                    for word in words {
                        self.output
                            .push(output::format_line(addr, word, self.mode, self.format_char));
                        addr = addr.wrapping_add(4);
                    }
                }
                Err(err) => self.record(src, addr, None, err),
            }
        }
    }

    /// Peels `name:` definitions off the front of the line. Definitions
    /// only happen in pass 1; pass 2 just skips past them.
    fn consume_labels(&mut self, text: &str, addr: u32, src: &SourceLine, define: bool) -> String {
        let mut rest = text.trim();
        while let Some((name, tail)) = split_label(rest) {
            if define && self.labels.add(name, addr) == LabelTableResult::Duplicate {
                self.record(
                    src,
                    addr,
                    None,
                    AsmError::new(
                        AsmErrorKind::Symbol,
                        "Label defined more than once",
                        Some(name),
                    ),
                );
            }
            rest = tail.trim();
        }
        rest.to_string()
    }

    fn record(&mut self, src: &SourceLine, addr: u32, data: Option<u32>, error: AsmError) {
        self.errors.push(ErrorRecord {
            file: src.file.clone(),
            line: src.line,
            index: src.index,
            address: addr,
            data,
            error,
            source_line: src.text.clone(),
            from_main_input: src.from_main_input,
        });
    }

    fn into_result(self) -> CompilationResult {
        let mut main_error_lines = Vec::new();
        for err in &self.errors {
            if err.from_main_input && !main_error_lines.contains(&err.line) {
                main_error_lines.push(err.line);
            }
        }
        CompilationResult {
            success: self.errors.is_empty(),
            output: self.output.join("\n"),
            errors: self.errors,
            main_error_lines,
        }
    }

    fn encode_instruction(
        &self,
        mnemonic: &str,
        args: &str,
        addr: u32,
    ) -> Result<Vec<u32>, AsmError> {
        let op = instructions::lookup(mnemonic).ok_or_else(|| {
            AsmError::new(
                AsmErrorKind::Instruction,
                "Unknown instruction",
                Some(mnemonic),
            )
        })?;
        let ops = split_operands(args);

        match op.family {
            OpFamily::R => match ops.len() {
                1 => {
                    let rs = self.reg_field(ops[0])?;
                    Ok(vec![(op.opcode << 26) | (rs << 21) | op.funct])
                }
                3 => {
                    let rd = self.reg_field(ops[0])?;
                    let rs = self.reg_field(ops[1])?;
                    let rt = self.reg_field(ops[2])?;
                    Ok(vec![
                        (op.opcode << 26) | (rs << 21) | (rt << 16) | (rd << 11) | op.funct,
                    ])
                }
                _ => Err(wrong_operand_count(mnemonic)),
            },
            OpFamily::RJalr => {
                let (rd, rs) = match ops.len() {
                    1 => (31, self.reg_field(ops[0])?),
                    2 => (self.reg_field(ops[0])?, self.reg_field(ops[1])?),
                    _ => return Err(wrong_operand_count(mnemonic)),
                };
                Ok(vec![(op.opcode << 26) | (rs << 21) | (rd << 11) | op.funct])
            }
            OpFamily::RShift | OpFamily::RShiftPlus32 => {
                if ops.len() != 3 {
                    return Err(wrong_operand_count(mnemonic));
                }
                let rd = self.reg_field(ops[0])?;
                let rt = self.reg_field(ops[1])?;
                let shamt = (operand::parse_operand(ops[2], &self.labels, true)? as u32) & 0x1F;
                Ok(vec![
                    (op.opcode << 26) | (rt << 16) | (rd << 11) | (shamt << 6) | op.funct,
                ])
            }
            OpFamily::RShiftV => {
                if ops.len() != 3 {
                    return Err(wrong_operand_count(mnemonic));
                }
                let rd = self.reg_field(ops[0])?;
                let rt = self.reg_field(ops[1])?;
                let rs = self.reg_field(ops[2])?;
                Ok(vec![
                    (op.opcode << 26) | (rs << 21) | (rt << 16) | (rd << 11) | op.funct,
                ])
            }
            OpFamily::RMultDiv => match ops.len() {
                2 => {
                    let rs = self.reg_field(ops[0])?;
                    let rt = self.reg_field(ops[1])?;
                    Ok(vec![(op.opcode << 26) | (rs << 21) | (rt << 16) | op.funct])
                }
                3 => {
                    let rd = self.reg_field(ops[0])?;
                    let rs = self.reg_field(ops[1])?;
                    let rt = self.reg_field(ops[2])?;
                    Ok(vec![
                        (op.opcode << 26) | (rs << 21) | (rt << 16) | (rd << 11) | op.funct,
                    ])
                }
                _ => Err(wrong_operand_count(mnemonic)),
            },
            OpFamily::RMfhiMflo => {
                if ops.len() != 1 {
                    return Err(wrong_operand_count(mnemonic));
                }
                let rd = self.reg_field(ops[0])?;
                Ok(vec![(op.opcode << 26) | (rd << 11) | op.funct])
            }
            OpFamily::RMthiMtlo => {
                if ops.len() != 1 {
                    return Err(wrong_operand_count(mnemonic));
                }
                let rs = self.reg_field(ops[0])?;
                Ok(vec![(op.opcode << 26) | (rs << 21) | op.funct])
            }
            OpFamily::RSyscallBreak | OpFamily::RSync => {
                let code = match ops.len() {
                    0 => 0,
                    1 => (operand::parse_operand(ops[0], &self.labels, true)? as u32) & 0xF_FFFF,
                    _ => return Err(wrong_operand_count(mnemonic)),
                };
                Ok(vec![(op.opcode << 26) | (code << 6) | op.funct])
            }
            OpFamily::REret => {
                if !ops.is_empty() {
                    return Err(wrong_operand_count(mnemonic));
                }
                Ok(vec![(op.opcode << 26) | (1 << 25) | op.funct])
            }
            OpFamily::I => match ops.len() {
                2 if ops[1].contains('(') => {
                    let rt = self.reg_field(ops[0])?;
                    let (imm, rs) = operand::parse_mem_operand(ops[1], &self.labels)?;
                    Ok(vec![
                        (op.opcode << 26) | (rs << 21) | (rt << 16) | (imm as u32 & 0xFFFF),
                    ])
                }
                2 => {
                    let rt = self.reg_field(ops[0])?;
                    let imm = self.imm_field(ops[1])?;
                    Ok(vec![(op.opcode << 26) | (rt << 16) | imm])
                }
                3 => {
                    let rt = self.reg_field(ops[0])?;
                    let rs = self.reg_field(ops[1])?;
                    let imm = self.imm_field(ops[2])?;
                    Ok(vec![(op.opcode << 26) | (rs << 21) | (rt << 16) | imm])
                }
                _ => Err(wrong_operand_count(mnemonic)),
            },
            OpFamily::ILdSd | OpFamily::IfpuLs => {
                if ops.len() != 2 {
                    return Err(wrong_operand_count(mnemonic));
                }
                let rt = self.reg_field(ops[0])?;
                let (imm, rs) = operand::parse_mem_operand(ops[1], &self.labels)?;
                Ok(vec![
                    (op.opcode << 26) | (rs << 21) | (rt << 16) | (imm as u32 & 0xFFFF),
                ])
            }
            OpFamily::IBranch | OpFamily::IBranchLikely => {
                if ops.len() != 3 {
                    return Err(wrong_operand_count(mnemonic));
                }
                let rs = self.reg_field(ops[0])?;
                let rt = self.reg_field(ops[1])?;
                let offset = self.branch_offset(ops[2], addr)?;
                Ok(vec![(op.opcode << 26) | (rs << 21) | (rt << 16) | offset])
            }
            OpFamily::IBranchRsZero | OpFamily::IBranchRsRtFmt => {
                if ops.len() != 2 {
                    return Err(wrong_operand_count(mnemonic));
                }
                let rs = self.reg_field(ops[0])?;
                let rt = match op.family {
                    OpFamily::IBranchRsRtFmt => op.rt_field,
                    _ => 0,
                };
                let offset = self.branch_offset(ops[1], addr)?;
                Ok(vec![(op.opcode << 26) | (rs << 21) | (rt << 16) | offset])
            }
            OpFamily::Cop0Mov => {
                if ops.len() != 2 {
                    return Err(wrong_operand_count(mnemonic));
                }
                let rt = self.reg_field(ops[0])?;
                let rd = (operand::parse_operand(ops[1], &self.labels, false)? as u32) & 0x1F;
                Ok(vec![
                    (op.opcode << 26) | (op.cop_op << 21) | (rt << 16) | (rd << 11),
                ])
            }
            OpFamily::FpuMov => {
                if ops.len() != 2 {
                    return Err(wrong_operand_count(mnemonic));
                }
                let (gpr_text, fpr_text) =
                    match (registers::is_fpr(ops[0]), registers::is_fpr(ops[1])) {
                        (false, true) => (ops[0], ops[1]),
                        (true, false) => (ops[1], ops[0]),
                        _ => {
                            return Err(AsmError::new(
                                AsmErrorKind::Instruction,
                                "Expected one GPR and one FPR operand",
                                Some(mnemonic),
                            ))
                        }
                    };
                let gpr = self.reg_field(gpr_text)?;
                let fpr = self.reg_field(fpr_text)?;
                Ok(vec![
                    (op.opcode << 26) | (op.cop_op << 21) | (gpr << 16) | (fpr << 11),
                ])
            }
            OpFamily::FpuR => {
                if ops.len() != 3 {
                    return Err(wrong_operand_count(mnemonic));
                }
                let fd = self.reg_field(ops[0])?;
                let fs = self.reg_field(ops[1])?;
                let ft = self.reg_field(ops[2])?;
                Ok(vec![
                    (op.opcode << 26)
                        | (op.fmt << 21)
                        | (ft << 16)
                        | (fs << 11)
                        | (fd << 6)
                        | op.funct,
                ])
            }
            OpFamily::FpuRUn => {
                if ops.len() != 2 {
                    return Err(wrong_operand_count(mnemonic));
                }
                let fd = self.reg_field(ops[0])?;
                let mut fs = self.reg_field(ops[1])?;
                let mut ft = 0;
                // sqrt.s with source == destination moves the register
                // into the ft slot and zeroes fs.
                if op.mnemonic.eq_ignore_ascii_case("sqrt.s") && fd == fs {
                    ft = fd;
                    fs = 0;
                }
                Ok(vec![
                    (op.opcode << 26)
                        | (op.fmt << 21)
                        | (ft << 16)
                        | (fs << 11)
                        | (fd << 6)
                        | op.funct,
                ])
            }
            OpFamily::FpuCvt => {
                if ops.len() != 2 {
                    return Err(wrong_operand_count(mnemonic));
                }
                let fd = self.reg_field(ops[0])?;
                let fs = self.reg_field(ops[1])?;
                Ok(vec![
                    (op.opcode << 26) | (op.fmt << 21) | (fs << 11) | (fd << 6) | op.funct,
                ])
            }
            OpFamily::FpuCmp => {
                if ops.len() != 2 {
                    return Err(wrong_operand_count(mnemonic));
                }
                let fs = self.reg_field(ops[0])?;
                let ft = self.reg_field(ops[1])?;
                Ok(vec![
                    (op.opcode << 26) | (op.fmt << 21) | (ft << 16) | (fs << 11) | op.funct,
                ])
            }
            OpFamily::FpuBranch => {
                if ops.len() != 1 {
                    return Err(wrong_operand_count(mnemonic));
                }
                let offset = self.branch_offset(ops[0], addr)?;
                Ok(vec![
                    (op.opcode << 26) | (op.cop_op << 21) | (op.cc_bit << 16) | offset,
                ])
            }
            OpFamily::J => {
                if ops.len() != 1 {
                    return Err(wrong_operand_count(mnemonic));
                }
                let target = operand::parse_operand(ops[0], &self.labels, true)? as u32;
                Ok(vec![(op.opcode << 26) | ((target >> 2) & 0x03FF_FFFF)])
            }
            OpFamily::Custom => {
                if !ops.is_empty() {
                    return Err(wrong_operand_count(mnemonic));
                }
                Ok(vec![op.custom])
            }
            OpFamily::PseudoBranch => {
                if ops.len() != 1 {
                    return Err(wrong_operand_count(mnemonic));
                }
                let offset = self.branch_offset(ops[0], addr)?;
                Ok(vec![(0x04 << 26) | offset])
            }
            OpFamily::PseudoSetReg => {
                if ops.len() != 2 {
                    return Err(wrong_operand_count(mnemonic));
                }
                let rd = self.reg_field(ops[0])?;
                let value = self.parse_value_operand(ops[1])?;
                let lui = (0x0F << 26) | (rd << 16) | (value >> 16);
                let ori = (0x0D << 26) | (rd << 21) | (rd << 16) | (value & 0xFFFF);
                Ok(vec![lui, ori])
            }
        }
    }

    fn reg_field(&self, text: &str) -> Result<u32, AsmError> {
        Ok((operand::parse_operand(text, &self.labels, false)? as u32) & 0x1F)
    }

    fn imm_field(&self, text: &str) -> Result<u32, AsmError> {
        Ok((operand::parse_operand(text, &self.labels, true)? as u32) & 0xFFFF)
    }

    /// Word offset from the branch's own address; must fit the signed
    /// 16-bit field.
    fn branch_offset(&self, text: &str, addr: u32) -> Result<u32, AsmError> {
        let target = operand::parse_operand(text, &self.labels, true)? as u32;
        let offset = (i64::from(target) - i64::from(addr)) / 4;
        if !(-32768..=32767).contains(&offset) {
            return Err(AsmError::new(
                AsmErrorKind::Instruction,
                "Branch offset out of range",
                Some(text),
            ));
        }
        Ok((offset as u32) & 0xFFFF)
    }

    /// Value operand for `hexcode` and `setreg`: hex (`$`/`0x`), decimal,
    /// or a label. A `:`-wrapped label resolves case-insensitively; a bare
    /// one must match its defining spelling.
    fn parse_value_operand(&self, text: &str) -> Result<u32, AsmError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AsmError::new(AsmErrorKind::Directive, "Missing value", None));
        }
        if let Some(tail) = text.strip_prefix('$') {
            return parse_hex_word(tail, text);
        }
        if let Some(tail) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            return parse_hex_word(tail, text);
        }
        if let Ok(value) = text.parse::<i32>() {
            return Ok(value as u32);
        }
        if text.starts_with(':') || text.ends_with(':') {
            let stripped = text.strip_prefix(':').unwrap_or(text);
            let stripped = stripped.strip_suffix(':').unwrap_or(stripped);
            return self.labels.lookup(stripped).ok_or_else(|| {
                AsmError::new(AsmErrorKind::Directive, "Unresolved label", Some(text))
            });
        }
        self.labels
            .lookup_exact(text)
            .ok_or_else(|| AsmError::new(AsmErrorKind::Directive, "Unresolved label", Some(text)))
    }
}

fn wrong_operand_count(mnemonic: &str) -> AsmError {
    AsmError::new(
        AsmErrorKind::Instruction,
        "Wrong number of operands for instruction",
        Some(mnemonic),
    )
}

fn split_statement(text: &str) -> (&str, &str) {
    match text.find(|c: char| c.is_whitespace()) {
        Some(pos) => (&text[..pos], text[pos..].trim_start()),
        None => (text, ""),
    }
}

/// Matches a leading `name:` label definition.
fn split_label(text: &str) -> Option<(&str, &str)> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    if i == 0 || i >= bytes.len() || bytes[i] != b':' {
        return None;
    }
    Some((&text[..i], &text[i + 1..]))
}

fn split_operands(args: &str) -> Vec<&str> {
    args.split(',')
        .map(str::trim)
        .filter(|op| !op.is_empty())
        .collect()
}

fn parse_address(args: &str) -> Result<u32, AsmError> {
    let arg = args.trim();
    let digits = arg
        .strip_prefix('$')
        .or_else(|| arg.strip_prefix("0x"))
        .or_else(|| arg.strip_prefix("0X"))
        .unwrap_or(arg);
    if digits.is_empty() {
        return Err(AsmError::new(
            AsmErrorKind::Directive,
            "Invalid address value",
            Some(arg),
        ));
    }
    u32::from_str_radix(digits, 16).map_err(|_| {
        AsmError::new(AsmErrorKind::Directive, "Invalid address value", Some(arg))
    })
}

fn parse_hex_word(digits: &str, original: &str) -> Result<u32, AsmError> {
    if digits.is_empty() {
        return Err(AsmError::new(
            AsmErrorKind::Directive,
            "Invalid hex value",
            Some(original),
        ));
    }
    u32::from_str_radix(digits, 16)
        .map_err(|_| AsmError::new(AsmErrorKind::Directive, "Invalid hex value", Some(original)))
}

/// Decodes the quoted `print` string with `\n`, `\t`, and `\"` escapes
/// into its ISO-8859-1 bytes.
fn parse_print_bytes(args: &str) -> Result<Vec<u8>, AsmError> {
    let arg = args.trim();
    let inner = arg.strip_prefix('"').ok_or_else(|| {
        AsmError::new(AsmErrorKind::Directive, "Malformed print directive", Some(arg))
    })?;

    let mut text = String::new();
    let mut chars = inner.chars();
    let mut closed = false;
    let mut escaped = false;
    for c in chars.by_ref() {
        if escaped {
            match c {
                'n' => text.push('\n'),
                't' => text.push('\t'),
                '"' => text.push('"'),
                other => {
                    text.push('\\');
                    text.push(other);
                }
            }
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => {
                closed = true;
                break;
            }
            other => text.push(other),
        }
    }
    let trailing: String = chars.collect();
    if !closed || !trailing.trim().is_empty() {
        return Err(AsmError::new(
            AsmErrorKind::Directive,
            "Malformed print directive",
            Some(arg),
        ));
    }
    Ok(preprocess::encode_latin1(&text))
}

/// Packs string bytes into little-endian words, zero-padded to a multiple
/// of four.
fn print_words(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks(4)
        .map(|chunk| {
            let mut quad = [0u8; 4];
            quad[..chunk.len()].copy_from_slice(chunk);
            u32::from_le_bytes(quad)
        })
        .collect()
}

fn parse_float_word(args: &str) -> Result<u32, AsmError> {
    let arg = args.trim();
    let text = arg.strip_prefix('$').unwrap_or(arg);
    text.parse::<f32>().map(f32::to_bits).map_err(|_| {
        AsmError::new(AsmErrorKind::Directive, "Invalid float literal", Some(arg))
    })
}

/// A run report for one successfully assembled input.
pub struct RunReport {
    pub input: String,
    pub out_path: String,
    pub result: CompilationResult,
}

/// Error from a failed assembler run.
#[derive(Debug)]
pub struct RunError {
    error: AsmError,
    records: Vec<ErrorRecord>,
}

impl RunError {
    fn new(error: AsmError, records: Vec<ErrorRecord>) -> Self {
        Self { error, records }
    }

    fn cli(msg: &str) -> Self {
        Self::new(AsmError::new(AsmErrorKind::Cli, msg, None), Vec::new())
    }

    fn io(msg: &str, param: &str) -> Self {
        Self::new(AsmError::new(AsmErrorKind::Io, msg, Some(param)), Vec::new())
    }

    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for RunError {}

/// Run the assembler with command-line arguments.
pub fn run() -> Result<Vec<RunReport>, RunError> {
    let cli = Cli::parse();
    run_with_cli(&cli)
}

pub fn run_with_cli(cli: &Cli) -> Result<Vec<RunReport>, RunError> {
    if cli.infiles.is_empty() {
        return Err(RunError::cli("No input files specified. Use -i/--infile"));
    }
    if cli.format_char.chars().count() != 1 {
        return Err(RunError::cli(
            "Invalid --format-char; must be a single character or -",
        ));
    }

    let out_dir = if cli.infiles.len() > 1 {
        match cli.outfile.as_deref() {
            Some(out) => {
                let out_path = PathBuf::from(out);
                if out_path.exists() && !out_path.is_dir() {
                    return Err(RunError::cli(
                        "-o/--outfile must be a directory when multiple inputs are provided",
                    ));
                }
                if let Err(err) = fs::create_dir_all(&out_path) {
                    return Err(RunError::io(&err.to_string(), out));
                }
                Some(out_path)
            }
            None => None,
        }
    } else {
        None
    };

    let mut reports = Vec::new();
    for asm_path in &cli.infiles {
        let (asm_name, input_base) = resolve_input(asm_path)?;
        let out_base = if let Some(dir) = &out_dir {
            dir.join(&input_base).to_string_lossy().to_string()
        } else {
            cli.outfile.as_deref().unwrap_or(&input_base).to_string()
        };
        let report = run_one(cli, &asm_name, &out_base)?;
        reports.push(report);
    }

    Ok(reports)
}

fn run_one(cli: &Cli, asm_name: &str, out_base: &str) -> Result<RunReport, RunError> {
    let bytes = fs::read(asm_name).map_err(|err| RunError::io(&err.to_string(), asm_name))?;
    let input_lines = preprocess::split_lines(&preprocess::decode_latin1(&bytes));

    let mode = cli.mode.output_mode();
    let result = compile(
        &input_lines,
        Some(Path::new(asm_name)),
        mode,
        &cli.format_char,
    );

    let out_path = format!("{out_base}.{}", mode.extension());
    let mut text = result.output.clone();
    if !result.success {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str("*** Compilation failed ***");
    }
    if !text.is_empty() {
        text.push('\n');
    }
    fs::write(&out_path, preprocess::encode_latin1(&text))
        .map_err(|err| RunError::io(&err.to_string(), &out_path))?;

    if result.success {
        Ok(RunReport {
            input: asm_name.to_string(),
            out_path,
            result,
        })
    } else {
        Err(RunError::new(
            AsmError::new(
                AsmErrorKind::Assembler,
                "Errors detected in source",
                Some(asm_name),
            ),
            result.errors,
        ))
    }
}

/// Checks that a source path carries the `.asm` extension and derives the
/// default output base from its stem.
fn resolve_input(path: &Path) -> Result<(String, String), RunError> {
    let has_asm_ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("asm"));
    if !has_asm_ext {
        return Err(RunError::cli(&format!(
            "Source files need an .asm extension: {}",
            path.display()
        )));
    }
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| {
            RunError::cli(&format!(
                "Cannot derive an output name from {}",
                path.display()
            ))
        })?;
    Ok((path.to_string_lossy().to_string(), stem.to_string()))
}

fn record_json(record: &ErrorRecord) -> serde_json::Value {
    json!({
        "file": record.file,
        "line": record.line,
        "index": record.index,
        "address": format!("{:08X}", record.address),
        "data": record.data_text(),
        "message": record.error.message(),
        "source": record.source_line,
        "main_input": record.from_main_input,
    })
}

pub fn report_json(report: &RunReport) -> String {
    json!({
        "schema": "ps2asm-report-v1",
        "success": true,
        "input": report.input,
        "output": report.out_path,
        "lines": report.result.output.lines().count(),
    })
    .to_string()
}

pub fn error_report_json(err: &RunError) -> String {
    let errors: Vec<serde_json::Value> = err.records.iter().map(record_json).collect();
    let mut main_error_lines: Vec<u32> = Vec::new();
    for record in &err.records {
        if record.from_main_input && !main_error_lines.contains(&record.line) {
            main_error_lines.push(record.line);
        }
    }
    json!({
        "schema": "ps2asm-report-v1",
        "success": false,
        "message": err.to_string(),
        "main_error_lines": main_error_lines,
        "errors": errors,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io;

    fn lines(src: &str) -> Vec<String> {
        src.lines().map(|l| l.to_string()).collect()
    }

    fn compile_ps2(src: &str) -> CompilationResult {
        compile(&lines(src), None, OutputMode::Ps2, "-")
    }

    fn output_lines(result: &CompilationResult) -> Vec<&str> {
        result.output.lines().collect()
    }

    struct MapReader {
        files: HashMap<PathBuf, Vec<String>>,
    }

    impl MapReader {
        fn new(files: &[(&str, &str)]) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(name, body)| (PathBuf::from(name), lines(body)))
                    .collect(),
            }
        }
    }

    impl SourceReader for MapReader {
        fn exists(&self, path: &Path) -> bool {
            self.files.contains_key(path)
        }

        fn read_lines(&self, path: &Path) -> io::Result<Vec<String>> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "missing"))
        }
    }

    #[test]
    fn addiu_with_hex_immediate() {
        let result = compile_ps2("address $00100000\naddiu s0, v0, 0x10");
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(result.output, "00100000 24500010");
    }

    #[test]
    fn lui_ori_with_dollar_hex() {
        let result = compile_ps2("address $00100000\nlui t0, $1234\nori t0, t0, $5678");
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(
            output_lines(&result),
            vec!["00100000 3C081234", "00100004 35085678"]
        );
    }

    #[test]
    fn setreg_expands_to_lui_ori() {
        let result = compile_ps2("address $00100000\nsetreg t0, $DEADBEEF");
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(
            output_lines(&result),
            vec!["00100000 3C08DEAD", "00100004 3508BEEF"]
        );
    }

    #[test]
    fn backward_branch_offset() {
        let result = compile_ps2("address $00100000\nloop:\nnop\nb :loop\nnop");
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(
            output_lines(&result),
            vec![
                "00100000 00000000",
                "00100004 1000FFFF",
                "00100008 00000000"
            ]
        );
    }

    #[test]
    fn pnach_mode_with_format_char() {
        let result = compile(
            &lines("address $00100000\nnop"),
            None,
            OutputMode::Pnach,
            "2",
        );
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(result.output, "patch=1,EE,20100000,extended,00000000");
    }

    #[test]
    fn print_emits_little_endian_padded_words() {
        let result = compile_ps2("address $00100000\nprint \"AB\"");
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(result.output, "00100000 00004241");
    }

    #[test]
    fn print_escapes_and_multi_word_strings() {
        let result = compile_ps2("address $00100000\nprint \"ABCD\\n\"");
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(
            output_lines(&result),
            vec!["00100000 44434241", "00100004 0000000A"]
        );
    }

    #[test]
    fn print_advances_the_address_in_both_passes() {
        let result = compile_ps2("address $00100000\nprint \"ABCDE\"\nafter:\nhexcode :after");
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(
            output_lines(&result),
            vec![
                "00100000 44434241",
                "00100004 00000045",
                "00100008 00100008"
            ]
        );
    }

    #[test]
    fn duplicate_label_fails_in_pass1_with_no_output() {
        let result = compile_ps2("foo:\nnop\nfoo:\nnop");
        assert!(!result.success);
        assert!(result.output.is_empty());
        assert_eq!(result.error_count(), 1);
        assert!(result.errors[0].message().contains("foo"));
        assert_eq!(result.main_error_lines, vec![3]);
    }

    #[test]
    fn out_of_range_branch_reports_and_continues() {
        let result = compile_ps2("address $00100000\nb :far\naddress $00120000\nfar:\nnop");
        assert!(!result.success);
        assert_eq!(result.error_count(), 1);
        assert!(result.errors[0].message().contains("out of range"));
        assert_eq!(result.errors[0].address, 0x0010_0000);
        assert_eq!(result.errors[0].data_text(), "N/A");
        assert!(result.output.contains("00120000 00000000"));
    }

    #[test]
    fn failing_line_does_not_advance_the_address() {
        let result = compile_ps2("address $00100000\nbogus t0\nnop");
        assert!(!result.success);
        assert_eq!(result.errors[0].address, 0x0010_0000);
        assert_eq!(result.output, "00100000 00000000");
    }

    #[test]
    fn label_references_are_case_insensitive() {
        let result = compile_ps2("address $00100000\nTarget:\nnop\nj :target\nj TARGET");
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(
            output_lines(&result),
            vec![
                "00100000 00000000",
                "00100004 08040000",
                "00100008 08040000"
            ]
        );
    }

    #[test]
    fn hexcode_accepts_every_value_form() {
        let result = compile_ps2(
            "address $00100000\nmark:\nhexcode $DEADBEEF\nhexcode 0x10\nhexcode 255\nhexcode :mark\nhexcode mark",
        );
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(
            output_lines(&result),
            vec![
                "00100000 DEADBEEF",
                "00100004 00000010",
                "00100008 000000FF",
                "0010000C 00100000",
                "00100010 00100000"
            ]
        );
    }

    #[test]
    fn bare_label_lookup_in_hexcode_is_case_sensitive() {
        let bad = compile_ps2("address $00100000\nMark:\nhexcode mark");
        assert!(!bad.success);
        assert!(bad.errors[0].message().contains("Unresolved label"));

        let good = compile_ps2("address $00100000\nMark:\nhexcode :MARK");
        assert!(good.success, "{:?}", good.errors);
    }

    #[test]
    fn float_directive_emits_ieee_bits() {
        let result = compile_ps2("address $00100000\nfloat 1.0\nfloat $-2.5");
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(
            output_lines(&result),
            vec!["00100000 3F800000", "00100004 C0200000"]
        );
    }

    #[test]
    fn comments_are_stripped_across_lines() {
        let result = compile_ps2(
            "address $00100000\nnop // one\n# whole line\nnop /* open\nstill comment\nclose */ nop",
        );
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(
            output_lines(&result),
            vec![
                "00100000 00000000",
                "00100004 00000000",
                "00100008 00000000"
            ]
        );
    }

    #[test]
    fn imports_expand_and_keep_error_origins() {
        let reader = MapReader::new(&[("inc.asm", "nop\nbogus t0")]);
        let result = compile_with_reader(
            &lines("address $00100000\nimport \"inc.asm\"\nnop"),
            Some(Path::new("main.asm")),
            OutputMode::Ps2,
            "-",
            &reader,
        );
        assert!(!result.success);
        assert_eq!(result.errors[0].file, "inc.asm");
        assert_eq!(result.errors[0].line, 2);
        assert!(!result.errors[0].from_main_input);
        assert!(result.main_error_lines.is_empty());
        assert!(result.output.contains("00100000 00000000"));
    }

    #[test]
    fn missing_import_compiles_as_placeholder_comment() {
        let reader = MapReader::new(&[]);
        let result = compile_with_reader(
            &lines("address $00100000\nimport \"gone.asm\"\nnop"),
            None,
            OutputMode::Ps2,
            "-",
            &reader,
        );
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(result.output, "00100000 00000000");
    }

    #[test]
    fn import_depth_cap_is_a_preprocess_failure() {
        let reader = MapReader::new(&[("self.asm", "import \"self.asm\"")]);
        let result = compile_with_reader(
            &lines("import \"self.asm\""),
            None,
            OutputMode::Ps2,
            "-",
            &reader,
        );
        assert!(!result.success);
        assert_eq!(result.error_count(), 1);
        assert!(result.errors[0]
            .message()
            .contains("Maximum import depth exceeded"));
        assert!(result.output.is_empty());
    }

    #[test]
    fn compiling_twice_is_byte_identical() {
        let src = "address $00100000\nloop:\nsetreg t0, :loop\nbne t0, zero, :loop\nprint \"ok\"";
        let first = compile_ps2(src);
        let second = compile_ps2(src);
        assert!(first.success, "{:?}", first.errors);
        assert_eq!(first.output, second.output);
    }

    #[test]
    fn memory_operands_encode_offset_and_base() {
        let result = compile_ps2("address $00100000\nlw t0, 4(sp)\nsw t0, $10(v0)\nsq t1, 0(a0)");
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(
            output_lines(&result),
            vec![
                "00100000 8FA80004",
                "00100004 AC480010",
                "00100008 7C890000"
            ]
        );
    }

    #[test]
    fn shift_and_variable_shift_forms() {
        let result = compile_ps2("address $00100000\nsll t0, t1, 4\ndsra32 t0, t1, 1\nsllv t0, t1, t2");
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(
            output_lines(&result),
            vec![
                "00100000 00094100",
                "00100004 0009407F",
                "00100008 01494004"
            ]
        );
    }

    #[test]
    fn jr_and_jalr_forms() {
        let result = compile_ps2("address $00100000\njr ra\njalr t0\njalr v0, t0");
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(
            output_lines(&result),
            vec![
                "00100000 03E00008",
                "00100004 0100F809",
                "00100008 01001009"
            ]
        );
    }

    #[test]
    fn multdiv_two_and_three_operand_forms() {
        let result = compile_ps2("address $00100000\nmult t0, t1\nmult v0, t0, t1\ndiv t0, t1");
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(
            output_lines(&result),
            vec![
                "00100000 01090018",
                "00100004 01091018",
                "00100008 0109001A"
            ]
        );
    }

    #[test]
    fn regimm_branches_take_rt_from_the_table() {
        let result = compile_ps2("address $00100000\nhere:\nbltz t0, :here\nbgezal t0, :here");
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(
            output_lines(&result),
            vec!["00100000 05000000", "00100004 0511FFFF"]
        );
    }

    #[test]
    fn fpu_moves_accept_operands_in_either_order() {
        let result = compile_ps2("address $00100000\nmtc1 t0, f4\nmtc1 f4, t0\nmfc1 t0, f4");
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(
            output_lines(&result),
            vec![
                "00100000 44882000",
                "00100004 44882000",
                "00100008 44082000"
            ]
        );
    }

    #[test]
    fn fpu_moves_reject_same_bank_operands() {
        let result = compile_ps2("address $00100000\nmtc1 t0, t1");
        assert!(!result.success);
        assert!(result.errors[0].message().contains("GPR"));
        let result = compile_ps2("address $00100000\nmfc1 f0, f1");
        assert!(!result.success);
    }

    #[test]
    fn sqrt_same_register_moves_source_into_ft() {
        let result = compile_ps2("address $00100000\nsqrt.s f4, f4\nsqrt.s f4, f2");
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(
            output_lines(&result),
            vec!["00100000 46040104", "00100004 46001104"]
        );
    }

    #[test]
    fn fpu_arithmetic_compare_and_branch() {
        let result = compile_ps2(
            "address $00100000\ntop:\nadd.s f2, f4, f6\ncvt.s.w f2, f4\nc.eq.s f2, f4\nbc1t :top",
        );
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(
            output_lines(&result),
            vec![
                "00100000 46062080",
                "00100004 468020A0",
                "00100008 46041032",
                "0010000C 4501FFFD"
            ]
        );
    }

    #[test]
    fn cop0_moves_and_eret() {
        let result = compile_ps2("address $00100000\nmfc0 t0, 12\nmtc0 t0, 12\neret");
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(
            output_lines(&result),
            vec![
                "00100000 40086000",
                "00100004 40886000",
                "00100008 42000018"
            ]
        );
    }

    #[test]
    fn syscall_break_and_sync_codes() {
        let result = compile_ps2("address $00100000\nsyscall\nsyscall 5\nbreak\nsync");
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(
            output_lines(&result),
            vec![
                "00100000 0000000C",
                "00100004 0000014C",
                "00100008 0000000D",
                "0010000C 0000000F"
            ]
        );
    }

    #[test]
    fn labels_may_share_a_line_with_code() {
        let result = compile_ps2("address $00100000\nstart: nop\nj :start");
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(
            output_lines(&result),
            vec!["00100000 00000000", "00100004 08040000"]
        );
    }

    #[test]
    fn main_error_lines_are_deduplicated_in_order() {
        let result = compile_ps2("bogus1\nnop\nbogus2\nbogus1");
        assert!(!result.success);
        assert_eq!(result.main_error_lines, vec![1, 3, 4]);
    }

    #[test]
    fn split_label_accepts_word_characters_only() {
        assert_eq!(split_label("loop: nop"), Some(("loop", " nop")));
        assert_eq!(split_label("a_1:"), Some(("a_1", "")));
        assert_eq!(split_label("addiu t0, t0, 1"), None);
        assert_eq!(split_label(": nop"), None);
        assert_eq!(split_label("add.s f0, f1, f2"), None);
    }

    #[test]
    fn parse_address_accepts_dollar_0x_and_bare_hex() {
        assert_eq!(parse_address("$00100000").unwrap(), 0x0010_0000);
        assert_eq!(parse_address("0x00100000").unwrap(), 0x0010_0000);
        assert_eq!(parse_address("00100000").unwrap(), 0x0010_0000);
        assert!(parse_address("$").is_err());
        assert!(parse_address("wxyz").is_err());
    }

    #[test]
    fn malformed_print_is_rejected() {
        assert!(parse_print_bytes("no quotes").is_err());
        assert!(parse_print_bytes("\"unterminated").is_err());
        assert!(parse_print_bytes("\"done\" extra").is_err());
        assert_eq!(parse_print_bytes("\"a\\\"b\"").unwrap(), b"a\"b".to_vec());
    }

    #[test]
    fn cli_parses_modes_and_inputs() {
        let cli = Cli::parse_from([
            "ps2asm",
            "-i",
            "prog.asm",
            "-m",
            "pnach",
            "-c",
            "2",
            "-o",
            "out",
        ]);
        assert_eq!(cli.infiles, vec![PathBuf::from("prog.asm")]);
        assert_eq!(cli.mode, ModeArg::Pnach);
        assert_eq!(cli.format_char, "2");
        assert_eq!(cli.outfile, Some("out".to_string()));
    }

    #[test]
    fn run_rejects_missing_inputs_and_bad_format_char() {
        let cli = Cli::parse_from(["ps2asm"]);
        assert!(run_with_cli(&cli).is_err());
        let cli = Cli::parse_from(["ps2asm", "-i", "prog.asm", "-c", "20"]);
        assert!(run_with_cli(&cli).is_err());
    }

    #[test]
    fn inputs_must_carry_an_asm_extension() {
        let err = resolve_input(Path::new("prog.txt")).unwrap_err();
        assert!(err.to_string().contains(".asm extension"));
        assert!(resolve_input(Path::new("prog")).is_err());
        let (name, base) = resolve_input(Path::new("dir/prog.asm")).unwrap();
        assert_eq!(name, "dir/prog.asm");
        assert_eq!(base, "prog");
        let (_, base) = resolve_input(Path::new("PROG.ASM")).unwrap();
        assert_eq!(base, "PROG");
    }

    #[test]
    fn error_record_renders_context() {
        let result = compile_ps2("bogus t0");
        let rendered = result.errors[0].format_with_context(false);
        assert!(rendered.contains("<input>:1: ERROR"));
        assert!(rendered.contains("    1 | bogus t0"));
        assert!(rendered.contains("code N/A"));
    }
}
