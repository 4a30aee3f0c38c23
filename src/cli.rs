//! CLI: analyze → report → (optionally) reduce
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use log::info;

use crate::codec::read_tree;
use crate::config::{AnalysisConfig, DEFAULT_WARNING_DEPTH, ReportOptions};
use crate::decision::{Action, REDUCE_PROMPT, confirm, decide};
use crate::error::Error;
use crate::repair::repair;
use crate::report::{render_outcome, render_report, summary_json};
use crate::walker::analyze;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// find the deepest structures of an NBT file and optionally cut them down
#[derive(Parser, Debug)]
#[command(name = "nbt-depth", version)]
pub struct CommandLineInterface {
    /// NBT file to analyze (gzip, zlib or uncompressed)
    file: Option<PathBuf>,

    /// print paths in full instead of `first > second > ... > last`
    #[arg(short, long, default_value_t = false)]
    full_paths: bool,

    /// subtree depth at which a structure is flagged
    #[arg(short, long, default_value_t = DEFAULT_WARNING_DEPTH)]
    warning_depth: usize,

    /// reduce flagged structures without asking
    #[arg(short, long, default_value_t = false)]
    yes: bool,

    /// print the analysis as JSON and exit without prompting
    #[arg(long, default_value_t = false)]
    json: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        self.execute(&mut io::stdin().lock(), &mut io::stdout().lock())
    }
    /// Same as [`run`](Self::run), answering prompts from `input` and
    /// printing to `output`.
    pub fn execute<R: BufRead, W: Write>(&self, input: &mut R, output: &mut W) -> Result<()> {
        let Some(path) = self.file.as_deref() else {
            bail!("Please provide an NBT file path");
        };
        let config = AnalysisConfig { warning_depth: self.warning_depth };
        let options = ReportOptions { full_paths: self.full_paths, ..ReportOptions::default() };

        // 1) load
        info!("loading {}", path.display());
        let mut file = read_tree(path).map_err(|source| Error::Load { path: path.to_owned(), source })?;

        // 2) analyze & report
        let analysis = analyze(&file.root, &config);
        if self.json {
            let summary = summary_json(path, &analysis, &config, &options);
            writeln!(output, "{}", serde_json::to_string_pretty(&summary)?)?;
            return Ok(());
        }
        write!(output, "{}", render_report(path, &analysis, &config, &options))?;

        // 3) decide
        let Action::OfferReduction { candidates } = decide(&analysis) else {
            return Ok(());
        };
        let proceed = self.yes || {
            writeln!(output)?;
            confirm(input, output, REDUCE_PROMPT)?
        };
        if !proceed {
            writeln!(output, "Skipping reduction; the file was left unchanged.")?;
            return Ok(());
        }

        // 4) backup, reduce, save
        info!("reducing {candidates} flagged structures in {}", path.display());
        let outcome = repair(path, &mut file, &analysis)?;
        write!(output, "{}", render_outcome(&outcome))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    use crate::codec::{Compression, NbtFile, write_tree};
    use crate::tag::{Scalar, Tag};

    /// `{ Data: <levels nested compounds>, Version: 1 }` written gzip'd to `dir`.
    fn deep_file(dir: &TempDir, levels: usize) -> PathBuf {
        let mut deep = Tag::Leaf(Scalar::Byte(1));
        for i in 0..levels {
            deep = Tag::compound([(format!("n{i}"), deep)]);
        }
        let file = NbtFile {
            name: String::new(),
            root: Tag::compound([("Data", deep), ("Version", Scalar::Int(1).into())]),
            compression: Compression::Gzip,
        };
        let path = dir.path().join("level.dat");
        write_tree(&file, &path).unwrap();
        path
    }

    fn has_backup(dir: &Path) -> bool {
        fs::read_dir(dir)
            .unwrap()
            .any(|entry| entry.unwrap().file_name().to_string_lossy().contains(".backup_"))
    }

    fn execute(args: &[&str], input: &str) -> String {
        colored::control::set_override(false);
        let cli = CommandLineInterface::parse_from(args);
        let mut output = Vec::new();
        cli.execute(&mut input.as_bytes(), &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn defaults_match_the_documented_surface() {
        let cli = CommandLineInterface::parse_from(["nbt-depth", "level.dat"]);
        assert_eq!(cli.file, Some(PathBuf::from("level.dat")));
        assert!(!cli.full_paths);
        assert_eq!(cli.warning_depth, 100);
        assert!(!cli.yes);
        assert!(!cli.json);
    }

    #[test]
    fn short_flags_parse() {
        let cli = CommandLineInterface::parse_from(["nbt-depth", "-f", "-w", "12", "-y", "x.dat"]);
        assert!(cli.full_paths);
        assert_eq!(cli.warning_depth, 12);
        assert!(cli.yes);
    }

    #[test]
    fn missing_file_is_an_error() {
        let cli = CommandLineInterface::parse_from(["nbt-depth"]);
        let err = cli.execute(&mut "".as_bytes(), &mut Vec::<u8>::new()).unwrap_err();
        assert_eq!(err.to_string(), "Please provide an NBT file path");
    }

    #[test]
    fn yes_flag_reduces_without_prompting() {
        let dir = TempDir::new().unwrap();
        let path = deep_file(&dir, 30);
        let file = path.to_str().unwrap();

        let out = execute(&["nbt-depth", "-w", "10", "-y", file], "");
        assert!(!out.contains(REDUCE_PROMPT));
        assert!(out.contains("Reduced 1 structure(s) and saved the file."));
        assert!(has_backup(dir.path()));

        let after = read_tree(&path).unwrap();
        let analysis = analyze(&after.root, &AnalysisConfig { warning_depth: 10 });
        assert_eq!(analysis.max_depth, 1);
    }

    #[test]
    fn declined_prompt_leaves_the_file_alone() {
        let dir = TempDir::new().unwrap();
        let path = deep_file(&dir, 30);
        let before = fs::read(&path).unwrap();

        let out = execute(&["nbt-depth", "-w", "10", path.to_str().unwrap()], "maybe\nno\n");
        assert!(out.contains(REDUCE_PROMPT));
        assert!(out.contains("Please answer 'yes' or 'no'."));
        assert!(out.contains("Skipping reduction; the file was left unchanged."));
        assert!(!has_backup(dir.path()));
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn json_output_never_prompts_or_writes() {
        let dir = TempDir::new().unwrap();
        let path = deep_file(&dir, 30);
        let before = fs::read(&path).unwrap();

        // a pending "yes" must not be consumed
        let out = execute(&["nbt-depth", "--json", "-w", "10", path.to_str().unwrap()], "yes\n");
        assert!(!out.contains(REDUCE_PROMPT));
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["max_depth"], 31);
        assert_eq!(value["problematic"][0]["path"], serde_json::json!(["Data"]));

        assert!(!has_backup(dir.path()));
        assert_eq!(fs::read(&path).unwrap(), before);
    }
}
