//! 集計結果の JSON 出力

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::key::CountMap;

/// マップを正規キー文字列 → 回数のフラットな JSON オブジェクトとして
/// `path` へ書き出し、全回数の合計を返す。
///
/// 出力バイト列を再現可能にするためフィールドはキー文字列の辞書順。
/// インデントは 2 スペース。
pub fn export_json(map: &CountMap, path: &Path) -> Result<u64> {
    let mut entries: Vec<(String, u64)> = map
        .iter()
        .map(|(key, &count)| (key.to_string(), count))
        .collect();
    entries.sort();

    let mut object = serde_json::Map::new();
    let mut total = 0u64;
    for (name, count) in entries {
        total += count;
        object.insert(name, serde_json::Value::from(count));
    }

    let file =
        File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &serde_json::Value::Object(object))
        .with_context(|| format!("cannot write {}", path.display()))?;
    writer.flush()?;
    Ok(total)
}

/// マップ中の全回数の合計。
pub fn total_count(map: &CountMap) -> u64 {
    map.values().sum()
}
