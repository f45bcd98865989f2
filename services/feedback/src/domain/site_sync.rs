/// 静的サイトの同期計画
///
/// ローカルのアセット一覧とバケット上のオブジェクト一覧を比較し、
/// アップロード・削除すべきキーを決定する。
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// ローカルの静的アセット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAsset {
    /// バケット上のキー（ルートからの相対パス、`/`区切り）
    pub key: String,
    /// ローカルファイルのパス
    pub path: PathBuf,
    /// ファイルサイズ（バイト）
    pub size: u64,
    /// 最終更新日時
    pub modified: DateTime<Utc>,
}

/// バケット上のオブジェクト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    pub key: String,
    pub size: u64,
    /// S3のLastModified（秒精度）
    pub last_modified: Option<DateTime<Utc>>,
}

/// 同期オプション
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// ローカルに存在しないオブジェクトを削除する
    pub delete: bool,
    /// サイズが同じでも常にアップロードする
    pub force: bool,
}

/// 同期計画
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// アップロード対象（キー順）
    pub uploads: Vec<LocalAsset>,
    /// 削除対象のキー（キー順）
    pub deletes: Vec<String>,
    /// 変更なしとしてスキップした件数
    pub unchanged: usize,
}

impl SyncPlan {
    /// ローカルとリモートの差分から同期計画を作成する
    ///
    /// 次のいずれかに該当するファイルをアップロードする。
    /// - キーがリモートに存在しない
    /// - サイズが異なる
    /// - ローカルの更新日時がリモートより新しい（秒単位で比較）
    ///
    /// 削除は`options.delete`が指定された場合のみ計画に含める。
    pub fn build(local: &[LocalAsset], remote: &[RemoteObject], options: SyncOptions) -> Self {
        let remote_objects: BTreeMap<&str, &RemoteObject> = remote
            .iter()
            .map(|object| (object.key.as_str(), object))
            .collect();

        let mut sorted_local: Vec<&LocalAsset> = local.iter().collect();
        sorted_local.sort_by(|a, b| a.key.cmp(&b.key));

        let mut plan = SyncPlan::default();
        for asset in sorted_local {
            let changed = match remote_objects.get(asset.key.as_str()) {
                Some(object) => object.size != asset.size || is_newer(asset, object),
                None => true,
            };
            if changed || options.force {
                plan.uploads.push(asset.clone());
            } else {
                plan.unchanged += 1;
            }
        }

        if options.delete {
            let local_keys: BTreeSet<&str> = local.iter().map(|asset| asset.key.as_str()).collect();
            plan.deletes = remote_objects
                .keys()
                .filter(|key| !local_keys.contains(*key))
                .map(|key| key.to_string())
                .collect();
        }

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.uploads.is_empty() && self.deletes.is_empty()
    }
}

/// ローカルファイルがリモートより後に更新されたか
///
/// LastModifiedが取得できない場合は更新ありとみなす。
fn is_newer(asset: &LocalAsset, object: &RemoteObject) -> bool {
    object
        .last_modified
        .is_none_or(|remote| asset.modified.timestamp() > remote.timestamp())
}

/// 拡張子からContent-Typeを決定する
pub fn content_type_for(key: &str) -> &'static str {
    let extension = key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "application/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// キーに応じたCache-Controlを決定する
///
/// HTMLは常に再検証させ、それ以外のアセットは1時間キャッシュする。
pub fn cache_control_for(key: &str) -> &'static str {
    if content_type_for(key).starts_with("text/html") {
        "public, max-age=0, must-revalidate"
    } else {
        "public, max-age=3600"
    }
}
