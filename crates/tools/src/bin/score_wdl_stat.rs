//! エンジン評価コメント付き PGN コーパスの署名集計ツール
//!
//! 各手の評価コメントを (outcome, move, material, score) のキーに落として
//! 出現回数を数え、フラットな JSON（既定 `scoreWDLstat.json`）へ書き出す。
//! 下流の WDL モデルフィッティングの入力になる。
//!
//! # 使用例
//!
//! ```shell
//! # ディレクトリ直下の .pgn / .pgn.gz をすべて処理
//! cargo run -p tools --release --bin score_wdl_stat -- --dir ./pgns
//!
//! # 単一ファイル
//! cargo run -p tools --release --bin score_wdl_stat -- --file games.pgn.gz
//! ```
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use walkdir::WalkDir;

use scorewdl_core::{CHUNKS_PER_WORKER, export_json, scan_chunks_parallel, split_chunks};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(about = "aggregate (outcome, move, material, score) counts from engine PGNs")]
struct Cli {
    /// Process every .pgn / .pgn.gz directly inside this directory (non-recursive)
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Process exactly one file (ignored when --dir is given)
    #[arg(long)]
    file: Option<PathBuf>,

    /// Number of worker threads (default: hardware concurrency)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Output JSON path
    #[arg(long, default_value = "scoreWDLstat.json")]
    output: PathBuf,
}

// ---------------------------------------------------------------------------
// 入力ファイルの列挙
// ---------------------------------------------------------------------------

/// `dir` 直下の .pgn / .pgn.gz を列挙する。チャンク割りを決定的にするため
/// パスの辞書順に揃える。
fn collect_pgn_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("cannot list {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.ends_with(".pgn") || name.ends_with(".pgn.gz") {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism().map_or(1, usize::from)
}

// ---------------------------------------------------------------------------
// メイン処理
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let files = if let Some(dir) = &cli.dir {
        collect_pgn_files(dir)?
    } else if let Some(file) = &cli.file {
        vec![file.clone()]
    } else {
        collect_pgn_files(Path::new("./pgns"))?
    };

    let concurrency = cli.concurrency.unwrap_or_else(default_concurrency).max(1);
    log::debug!("using {concurrency} worker threads");
    let chunks = split_chunks(&files, CHUNKS_PER_WORKER * concurrency);

    println!(
        "Found {} pgn files, creating {} chunks for processing.",
        files.len(),
        chunks.len()
    );

    let progress =
        ProgressBar::with_draw_target(Some(chunks.len() as u64), ProgressDrawTarget::stdout());
    progress.set_style(ProgressStyle::with_template("Progress: {pos}/{len}")?);

    let started = Instant::now();
    let map = scan_chunks_parallel(chunks, concurrency, |done, _total| {
        progress.set_position(done as u64);
    });
    progress.finish();

    println!("Time taken: {}s", started.elapsed().as_secs());

    let total = export_json(&map, &cli.output)
        .with_context(|| format!("writing {}", cli.output.display()))?;
    println!("Retained {total} scored positions for analysis.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_only_pgn_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.pgn"), "").unwrap();
        std::fs::write(dir.path().join("a.pgn"), "").unwrap();
        std::fs::write(dir.path().join("c.pgn.gz"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("d.pgn"), "").unwrap();

        let files = collect_pgn_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.pgn", "b.pgn", "c.pgn.gz"]);
    }

    #[test]
    fn missing_directory_is_fatal() {
        assert!(collect_pgn_files(Path::new("no-such-dir")).is_err());
    }
}
