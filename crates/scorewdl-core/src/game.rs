//! 1 ゲーム分の署名抽出
//!
//! pgn-reader の `Visitor` としてゲームを一度だけ走査し、評価コメント付きの
//! 各手を (outcome, move, material, score) のキーに落としてカウントマップへ
//! 加算する。盤面は shakmaty に任せ、こちらは指す前の局面から材料と手番を
//! 読むだけにする。

use pgn_reader::{RawComment, RawHeader, SanPlus, Skip, Visitor};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Position};

use crate::key::{CountMap, Key, Outcome, ResultPair};
use crate::score::parse_comment_score;

/// 1 ゲームあたりの署名打ち切り ply 数。これを超えた手は評価しない。
pub const MAX_PLIES: u32 = 400;

/// 直前の `san` で確定した「スコア待ち」の署名。コメント到着時に確定する。
#[derive(Clone, Copy)]
struct Pending {
    outcome: Outcome,
    move_no: u32,
    material: u32,
}

/// ゲーム 1 本を走査して署名をマップへ加算する Visitor。
///
/// Result ヘッダが無い・解釈できないゲーム、FEN が壊れているゲームは
/// まるごとスキップする（バッチ全体は止めない）。
pub struct GameVisitor<'m> {
    map: &'m mut CountMap,
    result: Option<ResultPair>,
    fen: Option<String>,
    chess960: bool,
    pos: Chess,
    ply: u32,
    pending: Option<Pending>,
    /// ply 上限超過・不正 SAN 以降はゲームの残りを読み捨てる
    abandoned: bool,
}

impl<'m> GameVisitor<'m> {
    pub fn new(map: &'m mut CountMap) -> Self {
        GameVisitor {
            map,
            result: None,
            fen: None,
            chess960: false,
            pos: Chess::default(),
            ply: 0,
            pending: None,
            abandoned: false,
        }
    }

    /// 盤上の重み付きマテリアル（両カラー合算）。キングは数えない。
    fn material(&self) -> u32 {
        let board = self.pos.board();
        (9 * board.queens().count()
            + 5 * board.rooks().count()
            + 3 * board.bishops().count()
            + 3 * board.knights().count()
            + board.pawns().count()) as u32
    }
}

impl Visitor for GameVisitor<'_> {
    type Result = ();

    fn begin_game(&mut self) {
        self.result = None;
        self.fen = None;
        self.chess960 = false;
        self.pos = Chess::default();
        self.ply = 0;
        self.pending = None;
        self.abandoned = false;
    }

    fn header(&mut self, key: &[u8], value: RawHeader<'_>) {
        if key == b"Result" {
            if let Ok(tag) = value.decode_utf8() {
                self.result = ResultPair::from_tag(&tag);
            }
        } else if key == b"FEN" {
            if let Ok(fen) = value.decode_utf8() {
                self.fen = Some(fen.into_owned());
            }
        } else if key == b"Variant" {
            self.chess960 = value.as_bytes() == b"fischerandom";
        }
    }

    fn end_headers(&mut self) -> Skip {
        if self.result.is_none() {
            return Skip(true);
        }
        if let Some(fen) = self.fen.take() {
            let mode = if self.chess960 {
                CastlingMode::Chess960
            } else {
                CastlingMode::Standard
            };
            let pos = Fen::from_ascii(fen.as_bytes())
                .ok()
                .and_then(|f| f.into_position::<Chess>(mode).ok());
            match pos {
                Some(pos) => self.pos = pos,
                None => return Skip(true),
            }
        }
        Skip(false)
    }

    fn san(&mut self, san_plus: SanPlus) {
        if self.abandoned {
            return;
        }
        // コメントが付かなかった直前の手はここで流れる
        self.pending = None;

        self.ply += 1;
        if self.ply > MAX_PLIES {
            self.abandoned = true;
            return;
        }

        let Some(result) = self.result else {
            return;
        };
        let outcome = if self.pos.turn().is_white() {
            result.white
        } else {
            result.black
        };
        self.pending = Some(Pending {
            outcome,
            move_no: (self.ply + 1) / 2,
            material: self.material(),
        });

        match san_plus.san.to_move(&self.pos) {
            Ok(m) => self.pos.play_unchecked(&m),
            Err(_) => {
                // 棋譜が壊れていて以降の局面を再現できない。残りは捨てる
                self.pending = None;
                self.abandoned = true;
            }
        }
    }

    fn comment(&mut self, comment: RawComment<'_>) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let text = String::from_utf8_lossy(comment.as_bytes());
        if let Some(score) = parse_comment_score(&text) {
            let key = Key {
                outcome: pending.outcome,
                move_no: pending.move_no,
                material: pending.material,
                score,
            };
            *self.map.entry(key).or_insert(0) += 1;
        }
    }

    fn begin_variation(&mut self) -> Skip {
        // 本譜のみ
        Skip(true)
    }

    fn end_game(&mut self) -> Self::Result {}
}
