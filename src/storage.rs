// src/storage.rs

use crate::{
    error::*,
    models::{DownloadAction, DownloadedPayload, SavedFile},
};
use log::{debug, info, warn};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

pub fn target_path(output_dir: &Path, file_name: &str) -> PathBuf {
    output_dir.join(file_name)
}

/// 检查目标文件，决定是跳过、覆盖还是新建
pub fn prepare_save_action(path: &Path, force: bool) -> DownloadAction {
    if !path.exists() {
        return DownloadAction::DownloadNew;
    }
    if force {
        info!("用户强制重新下载文件: {:?}", path);
        DownloadAction::Overwrite
    } else {
        DownloadAction::Skip
    }
}

/// 在目标目录中创建临时文件，保证之后的改名不跨文件系统
pub fn staging_file(output_dir: &Path) -> AppResult<NamedTempFile> {
    fs::create_dir_all(output_dir)?;
    let tmp = NamedTempFile::new_in(output_dir)?;
    debug!("创建临时文件: {:?}", tmp.path());
    Ok(tmp)
}

/// 把已写完的临时文件改名为最终文件。临时文件需位于 `output_dir` 中。
pub fn save_payload(output_dir: &Path, payload: DownloadedPayload) -> AppResult<SavedFile> {
    let path = target_path(output_dir, &payload.file_name);
    let media_type = payload.media_type().to_string();

    let mut file = payload.file;
    file.flush()?;
    file.persist(&path)?;

    let size = fs::metadata(&path)?.len();
    if size != payload.size {
        warn!("文件大小 {} 与接收字节数 {} 不一致: {}", size, payload.size, path.display());
    }
    info!("文件已保存: {} ({} 字节, {})", path.display(), size, media_type);
    Ok(SavedFile {
        path,
        size,
        media_type,
    })
}
