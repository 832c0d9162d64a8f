//! 評価コメントのスコア量子化
//!
//! fishtest 形式の PGN では各指し手のコメントに `+0.34/18 0.052s` のような
//! エンジン評価が入る。`/` 手前のトークンをセンチポーンへ変換し、
//! [-1000, 1000] にクランプした上で 5 刻みへ切り下げる。詰みスコア
//! （`+M3` 等）はクランプ域のすぐ外側の ±1001 バケットに落とし、
//! 最大級のセンチポーン評価と区別できるようにしておく。

/// センチポーンのクランプ幅
pub const SCORE_CLAMP: i32 = 1000;

/// 量子化の刻み
const SCORE_STEP: i32 = 5;

/// 量子化済みの評価スコア。
///
/// 「スコアなし」はこの型には含めず `Option<Score>` の `None` で表す。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Score {
    /// 詰みスコア。`true` なら `+M` 表記（評価側の勝ち詰み）
    Mate(bool),
    /// クランプ・量子化済みセンチポーン値（-1000..=1000、5 の倍数）
    Cp(i32),
}

impl Score {
    /// 外部表現の数値バケット。詰みはクランプ域のすぐ外の ±1001。
    pub fn bucket(self) -> i32 {
        match self {
            Score::Mate(true) => SCORE_CLAMP + 1,
            Score::Mate(false) => -(SCORE_CLAMP + 1),
            Score::Cp(v) => v,
        }
    }
}

/// 指し手コメントから量子化済みスコアを取り出す。
///
/// `book`、`/` なし、数字なしのコメントは `None`（その手は集計に寄与しない）。
pub fn parse_comment_score(comment: &str) -> Option<Score> {
    let comment = comment.trim();
    if comment == "book" {
        return None;
    }
    let (token, _) = comment.split_once('/')?;

    let bytes = token.as_bytes();
    if bytes.get(1) == Some(&b'M') {
        return Some(Score::Mate(bytes[0] == b'+'));
    }

    let cp = parse_centipawns(token)?;
    let clamped = cp.clamp(-i64::from(SCORE_CLAMP), i64::from(SCORE_CLAMP)) as i32;
    Some(Score::Cp(clamped.div_euclid(SCORE_STEP) * SCORE_STEP))
}

/// `+1.27` 形式の評価値をセンチポーン（×100、ゼロ方向へ切り捨て）にする。
///
/// ロケール非依存の手書きパーサ。符号・整数部・`.`・小数部だけを読み、
/// それ以外のバイトで打ち切る（指数・空白・桁区切りは扱わない）。
/// 数字がひとつもなければ `None`。桁あふれは飽和し、クランプで吸収される。
fn parse_centipawns(token: &str) -> Option<i64> {
    let bytes = token.as_bytes();
    let mut i = 0;

    let negative = match bytes.first() {
        Some(b'-') => {
            i = 1;
            true
        }
        Some(b'+') => {
            i = 1;
            false
        }
        _ => false,
    };

    let mut int_part: i64 = 0;
    let mut seen_digit = false;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        int_part = int_part
            .saturating_mul(10)
            .saturating_add(i64::from(bytes[i] - b'0'));
        seen_digit = true;
        i += 1;
    }

    let mut cp = int_part.saturating_mul(100);
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        // 小数第3位以下は ×100 の切り捨てで消えるので読み飛ばすだけ
        let mut scale = 10;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            cp = cp.saturating_add(i64::from(bytes[i] - b'0') * scale);
            scale /= 10;
            seen_digit = true;
            i += 1;
        }
    }

    if !seen_digit {
        return None;
    }
    Some(if negative { -cp } else { cp })
}
