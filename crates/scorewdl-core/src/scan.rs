//! PGN ファイル群の走査と並列集計
//!
//! ファイル列を順に読む逐次アグリゲータと、ファイル列を連続チャンクに割って
//! ワーカースレッドへ配る並列コーディネータ。ワーカーはローカルマップを
//! 値として送り返し、呼び出しスレッドが一点で畳み込む。パース中にロックは
//! 一切持たない。

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel as chan;
use pgn_reader::BufferedReader;

use crate::game::GameVisitor;
use crate::key::{CountMap, fold_into, new_count_map};

const READER_BUF_CAP: usize = 128 * 1024; // 128 KiB

/// 1 ワーカーあたりのチャンク数。処理コストの偏りで終盤にワーカーが
/// 遊ばないよう、スレッド数より細かく割っておく。
pub const CHUNKS_PER_WORKER: usize = 4;

/// gzip 透過のリーダを開く（拡張子 `.gz` で判定）。
fn open_reader(path: &Path) -> io::Result<Box<dyn Read>> {
    let file = File::open(path)?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if ext == "gz" {
        // GzDecoder は小刻みに読むので下側をバッファしておく
        let dec = flate2::read::GzDecoder::new(BufReader::with_capacity(READER_BUF_CAP, file));
        return Ok(Box::new(dec));
    }
    // 素のファイルは pgn-reader 側のバッファに任せる
    Ok(Box::new(file))
}

/// 1 ファイルを読み切って `map` へ署名を加算する。
fn scan_file(map: &mut CountMap, path: &Path) -> anyhow::Result<()> {
    let reader = open_reader(path)?;
    let mut games = BufferedReader::new(reader);
    let mut visitor = GameVisitor::new(map);
    while games.read_game(&mut visitor)?.is_some() {}
    Ok(())
}

/// ファイル列を順に処理する。開けない・途中で壊れているファイルは警告だけ
/// 出して読み飛ばす（そのファイルぶんの署名が減るだけでバッチは続く）。
pub fn scan_files(map: &mut CountMap, files: &[PathBuf]) {
    for path in files {
        if let Err(err) = scan_file(map, path) {
            log::warn!("skipping {}: {err:#}", path.display());
        }
    }
}

/// ファイル列を先頭から `ceil(len / target_chunks)` 件ずつの連続チャンクに割る。
pub fn split_chunks(files: &[PathBuf], target_chunks: usize) -> Vec<Vec<PathBuf>> {
    if files.is_empty() {
        return Vec::new();
    }
    let chunk_size = files.len().div_ceil(target_chunks.max(1));
    files.chunks(chunk_size).map(<[PathBuf]>::to_vec).collect()
}

/// チャンク列を固定数のワーカーで並列集計し、単一のグローバルマップへ
/// 畳み込む。
///
/// ワーカーはチャンクごとに新しいローカルマップで `scan_files` を走らせ、
/// 結果チャネルで値ごと送り返す。畳み込みと進捗通知 `on_progress(done, total)`
/// は呼び出しスレッドだけが行う。キー単位の合算は可換・結合的なので、
/// チャンクの完了順によらず結果は同じになる。全チャンクを畳み込み終わる
/// まで戻らない。
pub fn scan_chunks_parallel<F>(
    chunks: Vec<Vec<PathBuf>>,
    concurrency: usize,
    mut on_progress: F,
) -> CountMap
where
    F: FnMut(usize, usize),
{
    let total = chunks.len();
    let mut global = new_count_map();
    if total == 0 {
        return global;
    }

    let workers = concurrency.max(1);
    let (chunk_tx, chunk_rx) = chan::unbounded::<Vec<PathBuf>>();
    let (map_tx, map_rx) = chan::bounded::<CountMap>(workers);
    for chunk in chunks {
        // unbounded への送信は受信側が生きている限り失敗しない
        let _ = chunk_tx.send(chunk);
    }
    drop(chunk_tx);

    thread::scope(|scope| {
        for _ in 0..workers {
            let chunk_rx = chunk_rx.clone();
            let map_tx = map_tx.clone();
            scope.spawn(move || {
                while let Ok(chunk) = chunk_rx.recv() {
                    let mut local = new_count_map();
                    scan_files(&mut local, &chunk);
                    if map_tx.send(local).is_err() {
                        break;
                    }
                }
            });
        }
        // 全ワーカーが終わると map_rx のイテレーションが尽きる
        drop(map_tx);

        let mut done = 0;
        for local in map_rx.iter() {
            fold_into(&mut global, local);
            done += 1;
            on_progress(done, total);
        }
    });

    global
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("{i:03}.pgn"))).collect()
    }

    #[test]
    fn split_keeps_order_and_covers_everything() {
        let files = paths(10);
        let chunks = split_chunks(&files, 4);
        // ceil(10 / 4) = 3 → 3, 3, 3, 1
        assert_eq!(
            chunks.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![3, 3, 3, 1]
        );
        let flattened: Vec<_> = chunks.into_iter().flatten().collect();
        assert_eq!(flattened, files);
    }

    #[test]
    fn split_with_more_targets_than_files() {
        let files = paths(3);
        let chunks = split_chunks(&files, 16);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn split_empty_list_yields_no_chunks() {
        assert!(split_chunks(&[], 8).is_empty());
        // target 0 でもパニックしない
        assert_eq!(split_chunks(&paths(2), 0).len(), 1);
    }

    #[test]
    fn unreadable_files_contribute_nothing() {
        let mut map = CountMap::new();
        scan_files(&mut map, &[PathBuf::from("does-not-exist.pgn")]);
        assert!(map.is_empty());
    }

    #[test]
    fn parallel_scan_of_nothing_is_empty() {
        let mut calls = 0;
        let map = scan_chunks_parallel(Vec::new(), 4, |_, _| calls += 1);
        assert!(map.is_empty());
        assert_eq!(calls, 0);
    }
}
