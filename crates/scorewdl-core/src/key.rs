//! 集計キーとカウントマップ
//!
//! (outcome, move, material, score) の 4 つ組を 1 キーとして出現回数を数える。
//! ハッシュと等価性は derive したフィールド純関数で決まり、アドレスや挿入順に
//! 依存しないため、スレッドごとに作った部分マップを突き合わせても一貫する。

use std::collections::HashMap;
use std::fmt;

use crate::score::Score;

/// 指した側から見た対局結果
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

impl Outcome {
    /// 外部表現の 1 文字（'W' / 'D' / 'L'）
    pub fn as_char(self) -> char {
        match self {
            Outcome::Win => 'W',
            Outcome::Draw => 'D',
            Outcome::Loss => 'L',
        }
    }
}

/// Result ヘッダから導出する（白視点, 黒視点）の勝敗ペア
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResultPair {
    pub white: Outcome,
    pub black: Outcome,
}

impl ResultPair {
    /// `1-0` / `0-1` / `1/2-1/2` 以外は `None`（そのゲームは集計対象外）。
    pub fn from_tag(tag: &str) -> Option<ResultPair> {
        match tag.trim() {
            "1-0" => Some(ResultPair {
                white: Outcome::Win,
                black: Outcome::Loss,
            }),
            "0-1" => Some(ResultPair {
                white: Outcome::Loss,
                black: Outcome::Win,
            }),
            "1/2-1/2" => Some(ResultPair {
                white: Outcome::Draw,
                black: Outcome::Draw,
            }),
            _ => None,
        }
    }
}

/// 評価コメント 1 件分の署名
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Key {
    pub outcome: Outcome,
    /// 1 始まりのフルムーブ番号（= ceil(ply / 2)）
    pub move_no: u32,
    /// 盤上に残る駒の重み付き合計（Q9 R5 B3 N3 P1、両カラー合算）
    pub material: u32,
    pub score: Score,
}

impl fmt::Display for Key {
    /// 正規文字列 `('W', 12, 39, 125)`。JSON のフィールド名になる。
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "('{}', {}, {}, {})",
            self.outcome.as_char(),
            self.move_no,
            self.material,
            self.score.bucket()
        )
    }
}

/// キー → 出現回数
pub type CountMap = HashMap<Key, u64>;

/// fishtest 規模の PGN コーパスで観測されるキー数の目安。再ハッシュ抑止用。
pub const EXPECTED_KEYS: usize = 1_200_000;

/// 想定キー数ぶん事前確保したカウントマップを作る。
pub fn new_count_map() -> CountMap {
    CountMap::with_capacity(EXPECTED_KEYS)
}

/// `src` をキー単位の加算で `dst` に畳み込む。
pub fn fold_into(dst: &mut CountMap, src: CountMap) {
    for (key, count) in src {
        *dst.entry(key).or_insert(0) += count;
    }
}
