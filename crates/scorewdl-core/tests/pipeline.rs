//! ファイル入出力を通した一気通貫テスト

use std::fs::{self, File};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use scorewdl_core::{
    CountMap, Key, Outcome, Score, export_json, new_count_map, scan_chunks_parallel, scan_files,
    split_chunks, total_count,
};

const THREE_PLY_GAME: &str = "[Event \"?\"]\n[Site \"?\"]\n[Result \"1-0\"]\n\n\
1. e4 {+0.20/10 0.12s} e5 {+0.20/10 0.10s} 2. Nf3 {+0.20/10 0.08s} 1-0\n";

fn write_pgn(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// スコアと結果だけ差し替えた 1 ゲームの PGN を作る。
fn one_game(result: &str, eval: &str) -> String {
    format!(
        "[Result \"{result}\"]\n\n1. d4 {{{eval}/12 0.5s}} d5 {{{eval}/12 0.5s}} {result}\n"
    )
}

#[test]
fn three_ply_game_yields_one_signature_per_ply() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pgn(dir.path(), "game.pgn", THREE_PLY_GAME);

    let mut map = new_count_map();
    scan_files(&mut map, &[path]);

    let expected = [
        Key {
            outcome: Outcome::Win,
            move_no: 1,
            material: 78,
            score: Score::Cp(20),
        },
        Key {
            outcome: Outcome::Loss,
            move_no: 1,
            material: 78,
            score: Score::Cp(20),
        },
        Key {
            outcome: Outcome::Win,
            move_no: 2,
            material: 78,
            score: Score::Cp(20),
        },
    ];
    assert_eq!(map.len(), expected.len());
    for key in expected {
        assert_eq!(map.get(&key), Some(&1), "missing {key}");
    }
}

#[test]
fn gzipped_input_matches_plain_input() {
    let dir = tempfile::tempdir().unwrap();
    let plain = write_pgn(dir.path(), "game.pgn", THREE_PLY_GAME);

    let gz_path = dir.path().join("game.pgn.gz");
    let mut encoder = flate2::write::GzEncoder::new(
        File::create(&gz_path).unwrap(),
        flate2::Compression::default(),
    );
    encoder.write_all(THREE_PLY_GAME.as_bytes()).unwrap();
    encoder.finish().unwrap();

    let mut from_plain = new_count_map();
    scan_files(&mut from_plain, &[plain]);
    let mut from_gz = new_count_map();
    scan_files(&mut from_gz, &[gz_path]);
    assert_eq!(from_plain, from_gz);
}

#[test]
fn merge_is_independent_of_chunking() {
    let dir = tempfile::tempdir().unwrap();
    let fixtures = [
        ("a.pgn", one_game("1-0", "+0.20")),
        ("b.pgn", one_game("0-1", "-0.45")),
        ("c.pgn", one_game("1/2-1/2", "+0.05")),
        ("d.pgn", one_game("1-0", "+M3")),
        ("e.pgn", one_game("1-0", "+0.20")),
        ("f.pgn", one_game("0-1", "-1.27")),
    ];
    let files: Vec<PathBuf> = fixtures
        .iter()
        .map(|(name, contents)| write_pgn(dir.path(), name, contents))
        .collect();

    let mut single_pass = new_count_map();
    scan_files(&mut single_pass, &files);
    assert!(!single_pass.is_empty());

    for target_chunks in [1, 3, 16] {
        for concurrency in [1, 4] {
            let chunks = split_chunks(&files, target_chunks);
            let merged = scan_chunks_parallel(chunks, concurrency, |_, _| {});
            assert_eq!(
                merged, single_pass,
                "target_chunks={target_chunks} concurrency={concurrency}"
            );
        }
    }
}

#[test]
fn progress_reports_every_chunk_once() {
    let dir = tempfile::tempdir().unwrap();
    let files: Vec<PathBuf> = (0..8)
        .map(|i| write_pgn(dir.path(), &format!("{i}.pgn"), &one_game("1-0", "+0.20")))
        .collect();

    let chunks = split_chunks(&files, 8);
    let total = chunks.len();
    let mut seen = Vec::new();
    scan_chunks_parallel(chunks, 2, |done, reported_total| {
        assert_eq!(reported_total, total);
        seen.push(done);
    });
    // 畳み込みは collector 1 本なので done は単調に 1..=total
    assert_eq!(seen, (1..=total).collect::<Vec<_>>());
}

#[test]
fn export_round_trips_totals() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pgn(dir.path(), "game.pgn", THREE_PLY_GAME);

    let mut map: CountMap = new_count_map();
    scan_files(&mut map, &[path]);

    let out = dir.path().join("scoreWDLstat.json");
    let written_total = export_json(&map, &out).unwrap();
    assert_eq!(written_total, total_count(&map));

    let parsed: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let object = parsed.as_object().unwrap();
    assert_eq!(object.len(), map.len());

    let json_total: u64 = object.values().map(|v| v.as_u64().unwrap()).sum();
    assert_eq!(json_total, written_total);

    for (key, count) in &map {
        assert_eq!(
            object.get(&key.to_string()).and_then(|v| v.as_u64()),
            Some(*count)
        );
    }
}
