// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for ps2asm.

use std::fs::OpenOptions;
use std::io::{self, Write};

use clap::Parser;

use ps2asm::assembler::{self, Cli, DiagnosticsSinkConfig, ReportFormat};

struct DiagnosticsSink {
    writer: Option<Box<dyn Write>>,
}

impl DiagnosticsSink {
    fn from_config(config: &DiagnosticsSinkConfig) -> io::Result<Self> {
        match config {
            DiagnosticsSinkConfig::Disabled => Ok(Self { writer: None }),
            DiagnosticsSinkConfig::Stderr => Ok(Self {
                writer: Some(Box::new(io::stderr())),
            }),
            DiagnosticsSinkConfig::File { path, append } => {
                let mut opts = OpenOptions::new();
                opts.create(true).write(true);
                if *append {
                    opts.append(true);
                } else {
                    opts.truncate(true);
                }
                let file = opts.open(path)?;
                Ok(Self {
                    writer: Some(Box::new(file)),
                })
            }
        }
    }

    fn emit_line(&mut self, line: &str) {
        if let Some(writer) = &mut self.writer {
            let _ = writeln!(writer, "{line}");
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let mut sink = match DiagnosticsSink::from_config(&assembler::diagnostics_sink_config(&cli)) {
        Ok(sink) => sink,
        Err(err) => {
            eprintln!("Failed to open diagnostics sink: {err}");
            std::process::exit(1);
        }
    };

    let use_color = std::env::var("NO_COLOR").is_err();
    match assembler::run_with_cli(&cli) {
        Ok(reports) => {
            if cli.quiet {
                return;
            }
            for report in &reports {
                match cli.format {
                    ReportFormat::Json => println!("{}", assembler::report_json(report)),
                    ReportFormat::Text => {
                        println!(
                            "{} -> {} ({} lines)",
                            report.input,
                            report.out_path,
                            report.result.output.lines().count()
                        );
                    }
                }
            }
        }
        Err(err) => {
            match cli.format {
                ReportFormat::Json => sink.emit_line(&assembler::error_report_json(&err)),
                ReportFormat::Text => {
                    for record in err.records() {
                        sink.emit_line(&record.format_with_context(use_color));
                    }
                    sink.emit_line(&err.to_string());
                }
            }
            std::process::exit(1);
        }
    }
}
