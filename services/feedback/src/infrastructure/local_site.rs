/// ローカルの静的アセットディレクトリ走査
///
/// フロントエンドのビルド成果物ディレクトリを再帰的に走査し、
/// バケット上のキーとローカルパスの対応を作る。
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::domain::LocalAsset;

/// ディレクトリ走査のエラー型
#[derive(Debug, Error)]
pub enum LocalSiteError {
    #[error("ソースディレクトリが存在しません: {0}")]
    NotADirectory(String),
    #[error("ディレクトリ走査エラー: {0}")]
    WalkError(#[from] walkdir::Error),
    #[error("更新日時の取得に失敗 ({path}): {source}")]
    Modified {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// ディレクトリ配下のファイルをキー順に列挙する
///
/// `.`で始まるファイル・ディレクトリ（`.git`や`.DS_Store`など）は除外する。
/// キーはルートからの相対パスを`/`で連結したもの。
pub fn scan(root: &Path) -> Result<Vec<LocalAsset>, LocalSiteError> {
    if !root.is_dir() {
        return Err(LocalSiteError::NotADirectory(root.display().to_string()));
    }

    let mut assets = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let key = object_key(relative);
        let metadata = entry.metadata()?;
        let modified = metadata
            .modified()
            .map_err(|source| LocalSiteError::Modified {
                path: entry.path().to_path_buf(),
                source,
            })?;

        assets.push(LocalAsset {
            key,
            path: entry.path().to_path_buf(),
            size: metadata.len(),
            modified: DateTime::<Utc>::from(modified),
        });
    }

    assets.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(assets)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// 相対パスをS3キーに変換する（OSに依存せず`/`区切り）
fn object_key(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_scan_lists_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        fs::create_dir_all(dir.path().join("assets/img")).unwrap();
        fs::write(dir.path().join("assets/app.js"), "console.log(1)").unwrap();
        fs::write(dir.path().join("assets/img/logo.svg"), "<svg/>").unwrap();

        let assets = scan(dir.path()).unwrap();
        let keys: Vec<&str> = assets.iter().map(|a| a.key.as_str()).collect();

        assert_eq!(keys, vec!["assets/app.js", "assets/img/logo.svg", "index.html"]);
        assert_eq!(assets[2].size, 13);
        assert_eq!(assets[2].path, dir.path().join("index.html"));
    }

    #[test]
    fn test_scan_records_modified_time() {
        let before = Utc::now().timestamp();
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "x").unwrap();

        let assets = scan(dir.path()).unwrap();

        // ファイルシステムの時刻精度を考慮して秒単位で比較する
        assert!(assets[0].modified.timestamp() >= before - 1);
        assert!(assets[0].modified.timestamp() <= Utc::now().timestamp() + 1);
    }

    #[test]
    fn test_scan_skips_hidden_entries() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "x").unwrap();
        fs::write(dir.path().join(".DS_Store"), "x").unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/config"), "x").unwrap();

        let assets = scan(dir.path()).unwrap();

        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].key, "index.html");
    }

    #[test]
    fn test_scan_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        assert!(matches!(
            scan(&missing),
            Err(LocalSiteError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_object_key_uses_forward_slashes() {
        let path = Path::new("assets").join("css").join("main.css");
        assert_eq!(object_key(&path), "assets/css/main.css");
    }
}
