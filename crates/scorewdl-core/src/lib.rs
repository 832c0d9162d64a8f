//! エンジン評価コメント付き PGN から (outcome, move, material, score) の
//! 頻度マップを作るコアライブラリ。
//!
//! パイプラインは一方向: ファイル列 → チャンク → チャンクごとのローカル
//! マップ → 畳み込み済みグローバルマップ → JSON。後段から前段を読み返す
//! 経路はない。PGN の字句解析は pgn-reader、盤面・ルールは shakmaty に
//! 任せ、このクレートは署名の導出と集計だけを持つ。

pub mod export;
pub mod game;
pub mod key;
pub mod scan;
pub mod score;

pub use export::{export_json, total_count};
pub use game::{GameVisitor, MAX_PLIES};
pub use key::{CountMap, EXPECTED_KEYS, Key, Outcome, ResultPair, fold_into, new_count_map};
pub use scan::{CHUNKS_PER_WORKER, scan_chunks_parallel, scan_files, split_chunks};
pub use score::{Score, parse_comment_score};
