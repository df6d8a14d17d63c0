// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Import expansion producing a flat, origin-tagged line sequence.
//!
//! `import "path"` directives are replaced by the lines of the named file,
//! recursively. Every emitted line remembers its origin file, its 1-based
//! line number there, and its position in the expanded sequence.

use std::io;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use crate::error::{AsmError, AsmErrorKind};

/// Recursion cap for nested imports. Exceeding it fails the whole compile.
pub const MAX_IMPORT_DEPTH: u32 = 10;

/// One logical input line after import expansion.
#[derive(Debug, Clone)]
pub struct SourceLine {
    pub text: String,
    pub file: String,
    /// 1-based line number within the origin file.
    pub line: u32,
    /// 0-based position in the expanded sequence.
    pub index: usize,
    pub from_main_input: bool,
}

/// Text I/O surface consumed by the preprocessor.
pub trait SourceReader {
    fn exists(&self, path: &Path) -> bool;
    /// Reads a file as ISO-8859-1 text, split into lines.
    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>>;
}

/// Reads from the local file system, decoding bytes as ISO-8859-1.
#[derive(Debug, Default)]
pub struct FsReader;

impl SourceReader for FsReader {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>> {
        let bytes = std::fs::read(path)?;
        Ok(split_lines(&decode_latin1(&bytes)))
    }
}

pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Encodes text as ISO-8859-1, substituting `?` for unrepresentable chars.
pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) < 0x100 { c as u8 } else { b'?' })
        .collect()
}

pub fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(|line| line.to_string()).collect()
}

pub struct Preprocessor<'a> {
    reader: &'a dyn SourceReader,
}

impl<'a> Preprocessor<'a> {
    pub fn new(reader: &'a dyn SourceReader) -> Self {
        Self { reader }
    }

    /// Expands the top-level input into the flat line sequence. Relative
    /// imports resolve against `dir`, or the working directory when the
    /// input has no known location.
    pub fn expand(
        &mut self,
        lines: &[String],
        file_name: &str,
        dir: Option<&Path>,
    ) -> Result<Vec<SourceLine>, AsmError> {
        let mut out = Vec::new();
        self.expand_into(lines, file_name, dir, 0, &mut out)?;
        Ok(out)
    }

    fn expand_into(
        &mut self,
        lines: &[String],
        file_name: &str,
        dir: Option<&Path>,
        depth: u32,
        out: &mut Vec<SourceLine>,
    ) -> Result<(), AsmError> {
        if depth > MAX_IMPORT_DEPTH {
            return Err(AsmError::new(
                AsmErrorKind::Preprocess,
                "Maximum import depth exceeded",
                Some(file_name),
            ));
        }

        for (num, text) in lines.iter().enumerate() {
            let line_num = num as u32 + 1;
            if let Some(target) = parse_import(text) {
                let resolved = resolve_import_path(&target, dir);
                if self.reader.exists(&resolved) {
                    let nested = self.reader.read_lines(&resolved).map_err(|err| {
                        AsmError::new(
                            AsmErrorKind::Io,
                            &err.to_string(),
                            Some(&resolved.to_string_lossy()),
                        )
                    })?;
                    let nested_name = resolved.to_string_lossy().to_string();
                    let nested_dir = resolved.parent().map(Path::to_path_buf);
                    self.expand_into(
                        &nested,
                        &nested_name,
                        nested_dir.as_deref(),
                        depth + 1,
                        out,
                    )?;
                } else {
                    push_line(
                        out,
                        format!("// Import failed (not found): {target}"),
                        file_name,
                        line_num,
                        depth == 0,
                    );
                }
                continue;
            }
            push_line(out, text.clone(), file_name, line_num, depth == 0);
        }
        Ok(())
    }
}

fn push_line(out: &mut Vec<SourceLine>, text: String, file: &str, line: u32, from_main: bool) {
    let index = out.len();
    out.push(SourceLine {
        text,
        file: file.to_string(),
        line,
        index,
        from_main_input: from_main,
    });
}

/// Matches `^\s*import\s+"([^"]+)"`, case-insensitively.
fn parse_import(line: &str) -> Option<String> {
    let rest = line.trim_start();
    let bytes = rest.as_bytes();
    if bytes.len() < 6 || !bytes[..6].eq_ignore_ascii_case(b"import") {
        return None;
    }
    let tail = &rest[6..];
    let after_ws = tail.trim_start();
    if after_ws.len() == tail.len() {
        return None;
    }
    let quoted = after_ws.strip_prefix('"')?;
    let end = quoted.find('"')?;
    if end == 0 {
        return None;
    }
    Some(quoted[..end].to_string())
}

/// Normalises backslashes to the host separator and resolves relative
/// paths against the importing file's directory.
fn resolve_import_path(target: &str, dir: Option<&Path>) -> PathBuf {
    let normalised: String = target
        .chars()
        .map(|c| if c == '\\' { MAIN_SEPARATOR } else { c })
        .collect();
    let path = PathBuf::from(normalised);
    if path.is_absolute() {
        return path;
    }
    match dir {
        Some(dir) => dir.join(path),
        None => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapReader {
        files: HashMap<PathBuf, Vec<String>>,
    }

    impl MapReader {
        fn new(files: &[(&str, &str)]) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(name, body)| (PathBuf::from(name), split_lines(body)))
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

    fn lines(body: &str) -> Vec<String> {
        split_lines(body)
    }

    #[test]
    fn plain_lines_are_tagged_with_origin() {
        let reader = MapReader::new(&[]);
        let mut pp = Preprocessor::new(&reader);
        let out = pp
            .expand(&lines("nop\naddiu t0, t0, 1"), "main.asm", None)
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "nop");
        assert_eq!(out[0].file, "main.asm");
        assert_eq!(out[0].line, 1);
        assert_eq!(out[0].index, 0);
        assert!(out[0].from_main_input);
        assert_eq!(out[1].line, 2);
        assert_eq!(out[1].index, 1);
    }

    #[test]
    fn import_expansion_is_depth_first_and_order_preserving() {
        let reader = MapReader::new(&[
            ("inc.asm", "one\nimport \"leaf.asm\"\ntwo"),
            ("leaf.asm", "leaf"),
        ]);
        let mut pp = Preprocessor::new(&reader);
        let out = pp
            .expand(&lines("top\nimport \"inc.asm\"\nbottom"), "main.asm", None)
            .unwrap();
        let texts: Vec<&str> = out.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["top", "one", "leaf", "two", "bottom"]);
        let indices: Vec<usize> = out.iter().map(|l| l.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert!(out[0].from_main_input);
        assert!(!out[1].from_main_input);
        assert_eq!(out[2].file, "leaf.asm");
        assert_eq!(out[2].line, 1);
    }

    #[test]
    fn import_keyword_is_case_insensitive_and_needs_whitespace() {
        assert_eq!(parse_import("  IMPORT \"a.asm\""), Some("a.asm".into()));
        assert_eq!(parse_import("Import\t\"a.asm\""), Some("a.asm".into()));
        assert_eq!(parse_import("import\"a.asm\""), None);
        assert_eq!(parse_import("imported \"a.asm\""), None);
        assert_eq!(parse_import("import \"\""), None);
        assert_eq!(parse_import("import \"open"), None);
    }

    #[test]
    fn missing_import_becomes_placeholder_line() {
        let reader = MapReader::new(&[]);
        let mut pp = Preprocessor::new(&reader);
        let out = pp
            .expand(&lines("import \"gone.asm\""), "main.asm", None)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "// Import failed (not found): gone.asm");
        assert_eq!(out[0].file, "main.asm");
        assert_eq!(out[0].line, 1);
        assert!(out[0].from_main_input);
    }

    #[test]
    fn relative_imports_resolve_against_importer_directory() {
        let sub = format!("sub{}inc.asm", MAIN_SEPARATOR);
        let reader = MapReader::new(&[(&sub, "inner")]);
        let mut pp = Preprocessor::new(&reader);
        let out = pp
            .expand(&lines("import \"inc.asm\""), "main.asm", Some(Path::new("sub")))
            .unwrap();
        assert_eq!(out[0].text, "inner");
        assert_eq!(out[0].file, sub);
    }

    #[test]
    fn backslashes_normalise_to_host_separator() {
        let resolved = resolve_import_path("lib\\inc.asm", None);
        assert_eq!(
            resolved,
            PathBuf::from(format!("lib{}inc.asm", MAIN_SEPARATOR))
        );
    }

    #[test]
    fn import_cycle_hits_the_depth_cap() {
        let reader = MapReader::new(&[("self.asm", "import \"self.asm\"")]);
        let mut pp = Preprocessor::new(&reader);
        let err = pp
            .expand(&lines("import \"self.asm\""), "main.asm", None)
            .unwrap_err();
        assert!(err.message().contains("Maximum import depth exceeded"));
    }

    #[test]
    fn latin1_round_trips_high_bytes() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        let text = decode_latin1(&bytes);
        assert_eq!(encode_latin1(&text), bytes);
        assert_eq!(encode_latin1("\u{2603}"), vec![b'?']);
    }
}
