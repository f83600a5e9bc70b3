//! sas-analyze - command line front end over the SAS syntax table and zone
//! classifier. Results are printed as JSON on stdout, logs go to stderr.

mod cli;

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::{debug, info};

use sas_ide::{classify_position, document_symbols, AnalysisConfig, SyntaxTable};
use sas_syntax::{KeywordDatabase, Position, StaticKeywordDatabase, TokenKind};

use crate::cli::{Cli, Command};

#[derive(Debug, Serialize)]
struct TokenRow {
    kind: TokenKind,
    start: Position,
    end: Position,
    text: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let path = cli.command.file();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let config = load_config(&cli, path);
    let loaded = match &cli.kb {
        Some(kb) => Some(
            StaticKeywordDatabase::from_path(kb)
                .with_context(|| format!("failed to load keyword catalog {}", kb.display()))?,
        ),
        None => config
            .knowledge_base()
            .context("failed to load configured keyword catalog")?,
    };
    let kb: &dyn KeywordDatabase = match &loaded {
        Some(db) => db,
        None => StaticKeywordDatabase::builtin(),
    };

    let table = SyntaxTable::new(&text, kb, &config);
    info!(
        file = %path.display(),
        lines = table.line_count(),
        tokens = table.tokens().len(),
        "analyzed"
    );

    match &cli.command {
        Command::Tokens { blanks, .. } => {
            let rows: Vec<TokenRow> = table
                .tokens()
                .iter()
                .filter(|token| *blanks || token.kind != TokenKind::Blank)
                .map(|token| TokenRow {
                    kind: token.kind,
                    start: token.start,
                    end: token.end,
                    text: token.text(table.model()),
                })
                .collect();
            print_json(&rows, cli.pretty)
        }
        Command::Blocks { .. } => print_json(&document_symbols(table.blocks()), cli.pretty),
        Command::Zone { line, column, .. } => {
            let pos = Position::new(*line, *column);
            let classification = classify_position(&table, kb, pos);
            debug!(%pos, zone = ?classification.zone, "zone");
            print_json(&classification, cli.pretty)
        }
    }
}

fn load_config(cli: &Cli, program: &Path) -> AnalysisConfig {
    match &cli.config {
        Some(path) => AnalysisConfig::load_file(path),
        None => program
            .parent()
            .map_or_else(AnalysisConfig::default, AnalysisConfig::load),
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}
