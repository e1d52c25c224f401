// ==========================================
// 港口到港舱单系统 - 文件留存
// ==========================================
// 职责: 保存上传的原始舱单 / 用户头像，返回对外访问 URL
// 与解析/校验无事务关系：留存失败只影响 URL 字段
// ==========================================

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("文件写入失败: {0}")]
    Io(#[from] std::io::Error),
}

// ==========================================
// FileStore Trait
// ==========================================
// 实现者: LocalFileStore
#[async_trait]
pub trait FileStore: Send + Sync {
    /// 保存文件
    ///
    /// # 参数
    /// - category: 子目录（如 manifests / photos）
    /// - file_name: 原始文件名
    /// - bytes: 文件内容
    ///
    /// # 返回
    /// - Ok(String): 对外访问 URL
    async fn save(&self, category: &str, file_name: &str, bytes: &[u8]) -> Result<String, StorageError>;
}

/// 本地目录存储
pub struct LocalFileStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// 文件名清洗：只保留字母数字与 . - _，其余替换为 _
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, category: &str, file_name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let dir = self.root.join(category);
        tokio::fs::create_dir_all(&dir).await?;

        // 同名文件不覆盖
        let stored_name = format!("{}_{}", Uuid::new_v4().simple(), sanitize_file_name(file_name));
        let path = dir.join(&stored_name);
        tokio::fs::write(&path, bytes).await?;

        debug!(path = %path.display(), size = bytes.len(), "文件已保存");
        Ok(format!("{}/{}/{}", self.public_base_url, category, stored_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("crew list (1).xlsx"), "crew_list__1_.xlsx");
        assert_eq!(sanitize_file_name(".."), "upload");
    }

    #[tokio::test]
    async fn test_save_returns_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path(), "http://localhost:8000/uploads/");

        let url = store.save("manifests", "pax.xlsx", b"PK").await.unwrap();

        assert!(url.starts_with("http://localhost:8000/uploads/manifests/"));
        assert!(url.ends_with("_pax.xlsx"));
        let stored = url.rsplit('/').next().unwrap();
        let content = std::fs::read(dir.path().join("manifests").join(stored)).unwrap();
        assert_eq!(content, b"PK");
    }
}
