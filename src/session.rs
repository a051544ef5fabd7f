// src/session.rs

//! 下载请求客户端：持有当前状态与预览，负责校验输入、调用两个接口并推进状态。
//!
//! 同一个会话同时只允许一个 validate 或 download 在进行。进入 `Validating` /
//! `Downloading` 时获取 [`ControlsGuard`]，任何退出路径上都会自动释放。

use crate::{
    client::VideoApi,
    error::{AppError, AppResult},
    models::{ApplicationState, DownloadOptions, DownloadRequest, DownloadedPayload, VideoPreview},
    storage, utils,
};
use indicatif::ProgressBar;
use log::{debug, info, warn};
use std::{
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

#[derive(Default)]
struct SessionInner {
    state: ApplicationState,
    /// 最近一次成功解析的视频；失败的 validate 不会覆盖它
    preview: Option<VideoPreview>,
}

/// 进入忙碌状态时禁用操作，离开作用域时恢复
struct ControlsGuard<'a> {
    busy: &'a AtomicBool,
}

impl<'a> ControlsGuard<'a> {
    fn acquire(busy: &'a AtomicBool) -> AppResult<Self> {
        busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::Busy)?;
        Ok(Self { busy })
    }
}

impl Drop for ControlsGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

pub struct DownloadSession {
    api: Arc<dyn VideoApi>,
    inner: Mutex<SessionInner>,
    busy: AtomicBool,
}

impl DownloadSession {
    pub fn new(api: Arc<dyn VideoApi>) -> Self {
        Self {
            api,
            inner: Mutex::new(SessionInner::default()),
            busy: AtomicBool::new(false),
        }
    }

    /// 当前状态的快照，供界面渲染
    pub fn state(&self) -> ApplicationState {
        self.inner.lock().unwrap().state.clone()
    }

    pub fn current_preview(&self) -> Option<VideoPreview> {
        self.inner.lock().unwrap().preview.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn set_state(&self, state: ApplicationState) {
        debug!("状态切换 -> {:?}", StateName(&state));
        self.inner.lock().unwrap().state = state;
    }

    fn fail<T>(&self, err: AppError) -> AppResult<T> {
        self.set_state(ApplicationState::Error(err.to_string()));
        Err(err)
    }

    /// 用户提交链接。空输入和格式错误在本地直接拒绝，不发起请求。
    pub async fn on_validate_requested(&self, raw_url: &str) -> AppResult<VideoPreview> {
        let _controls = ControlsGuard::acquire(&self.busy)?;

        let url = raw_url.trim();
        if url.is_empty() {
            return self.fail(AppError::EmptyInput);
        }
        if !utils::validate_url(url) {
            info!("本地校验未通过: {}", url);
            return self.fail(AppError::InvalidUrlFormat);
        }

        self.set_state(ApplicationState::Validating);
        match self.api.validate(url).await {
            Ok(preview) => {
                info!("已获取视频信息: {} ({} 个清晰度)", preview.title, preview.qualities.len());
                let mut inner = self.inner.lock().unwrap();
                inner.preview = Some(preview.clone());
                inner.state = ApplicationState::PreviewReady {
                    preview: preview.clone(),
                    notice: None,
                };
                Ok(preview)
            }
            Err(e) => {
                warn!("解析链接 '{}' 失败: {}", url, e);
                self.fail(e)
            }
        }
    }

    /// 用户确认清晰度与类型后下载。
    ///
    /// 内容写入 `staging_dir` 下的临时文件，成功后由 [`storage::save_payload`] 改名为最终文件；
    /// 失败时临时文件随返回值一起被丢弃，目录中不会留下半截内容。
    pub async fn on_download_requested(
        &self,
        options: &DownloadOptions,
        staging_dir: &Path,
        pbar: &ProgressBar,
    ) -> AppResult<DownloadedPayload> {
        let _controls = ControlsGuard::acquire(&self.busy)?;

        let Some(preview) = self.current_preview() else {
            return self.fail(AppError::NoActiveSelection);
        };

        let quality = options
            .quality
            .clone()
            .filter(|q| !q.trim().is_empty())
            .unwrap_or_else(|| preview.default_quality().to_string());
        let request = DownloadRequest {
            url: preview.url.clone(),
            quality,
            download_type: options.download_type,
        };

        let mut file = match storage::staging_file(staging_dir) {
            Ok(file) => file,
            Err(e) => return self.fail(e),
        };

        self.set_state(ApplicationState::Downloading);
        match self.api.download(&request, &mut file, pbar).await {
            Ok(body) => {
                let expected = request.download_type.mime_type();
                if let Some(content_type) = body.content_type.as_deref()
                    && !content_type.starts_with(expected)
                {
                    warn!("响应类型 '{}' 与预期 '{}' 不一致", content_type, expected);
                }
                let payload = DownloadedPayload {
                    file,
                    size: body.size,
                    file_name: preview.file_name(request.download_type),
                    content_type: body.content_type,
                    download_type: request.download_type,
                };
                info!("下载完成: {} ({} 字节)", payload.file_name, payload.size);
                self.set_state(ApplicationState::PreviewReady {
                    preview,
                    notice: Some(request.download_type.success_message().to_string()),
                });
                Ok(payload)
            }
            Err(e) => {
                warn!("下载 '{}' 失败: {}", request.url, e);
                self.fail(e)
            }
        }
    }

    /// 清除错误或成功提示，回到预览（或空闲）状态
    pub fn dismiss_messages(&self) {
        if self.is_busy() {
            return;
        }
        let mut inner = self.inner.lock().unwrap();
        let clears = matches!(
            inner.state,
            ApplicationState::Error(_) | ApplicationState::PreviewReady { notice: Some(_), .. }
        );
        if clears {
            inner.state = match inner.preview.clone() {
                Some(preview) => ApplicationState::PreviewReady { preview, notice: None },
                None => ApplicationState::Idle,
            };
        }
    }

    /// 丢弃当前预览，回到初始状态
    pub fn reset(&self) -> AppResult<()> {
        let _controls = ControlsGuard::acquire(&self.busy)?;
        let mut inner = self.inner.lock().unwrap();
        inner.preview = None;
        inner.state = ApplicationState::Idle;
        Ok(())
    }
}

/// 日志里只打印状态名，不打印整个预览
struct StateName<'a>(&'a ApplicationState);

impl std::fmt::Debug for StateName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self.0 {
            ApplicationState::Idle => "Idle",
            ApplicationState::Validating => "Validating",
            ApplicationState::PreviewReady { notice: None, .. } => "PreviewReady",
            ApplicationState::PreviewReady { notice: Some(_), .. } => "PreviewReady(notice)",
            ApplicationState::Downloading => "Downloading",
            ApplicationState::Error(_) => "Error",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        client::MediaBody,
        models::{DownloadType, QualityOption},
    };
    use async_trait::async_trait;
    use std::{fs, io::Write, sync::atomic::AtomicUsize};
    use tokio::sync::Notify;

    const URL: &str = "https://youtu.be/dQw4w9WgXcQ";

    fn preview(title: &str) -> VideoPreview {
        VideoPreview {
            url: URL.to_string(),
            title: title.to_string(),
            thumbnail: String::new(),
            duration_string: "3:32".to_string(),
            uploader: "Rick".to_string(),
            qualities: vec![
                QualityOption { value: "best".into(), label: "Best".into(), note: None },
                QualityOption { value: "720p".into(), label: "720p".into(), note: Some("720p".into()) },
            ],
            video_id: None,
            duration: None,
            view_count: None,
        }
    }

    /// 按预设结果应答，并记录调用情况
    #[derive(Default)]
    struct FakeApi {
        validate_results: Mutex<Vec<AppResult<VideoPreview>>>,
        validate_calls: AtomicUsize,
        download_calls: AtomicUsize,
        last_request: Mutex<Option<DownloadRequest>>,
        download_fails: bool,
        /// 写入一部分内容后再失败，模拟传输中断
        download_breaks: bool,
    }

    #[async_trait]
    impl VideoApi for FakeApi {
        async fn validate(&self, _url: &str) -> AppResult<VideoPreview> {
            self.validate_calls.fetch_add(1, Ordering::SeqCst);
            self.validate_results.lock().unwrap().remove(0)
        }

        async fn download(
            &self,
            request: &DownloadRequest,
            sink: &mut (dyn Write + Send),
            _pbar: &ProgressBar,
        ) -> AppResult<MediaBody> {
            self.download_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            if self.download_fails {
                return Err(AppError::api(Some(500), "Erro ao fazer download do vídeo"));
            }
            sink.write_all(b"med")?;
            if self.download_breaks {
                return Err(AppError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset",
                )));
            }
            sink.write_all(b"ia")?;
            Ok(MediaBody {
                size: 5,
                content_type: Some(request.download_type.mime_type().to_string()),
            })
        }
    }

    fn session_with(api: Arc<FakeApi>) -> DownloadSession {
        DownloadSession::new(api)
    }

    #[tokio::test]
    async fn test_validate_success_enters_preview_ready() {
        let api = Arc::new(FakeApi {
            validate_results: Mutex::new(vec![Ok(preview("Test: Video"))]),
            ..Default::default()
        });
        let session = session_with(api.clone());
        assert_eq!(session.state(), ApplicationState::Idle);

        let result = session.on_validate_requested(&format!("  {}  ", URL)).await.unwrap();
        assert_eq!(utils::sanitize_filename(&result.title), "Test_Video");
        assert!(matches!(session.state(), ApplicationState::PreviewReady { notice: None, .. }));
        assert_eq!(session.state().preview().map(|p| p.title.as_str()), Some("Test: Video"));
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_local_rejections_make_no_request() {
        let api = Arc::new(FakeApi::default());
        let session = session_with(api.clone());

        assert!(matches!(session.on_validate_requested("   ").await, Err(AppError::EmptyInput)));
        assert!(matches!(session.state(), ApplicationState::Error(_)));

        let err = session.on_validate_requested("https://example.com/video").await;
        assert!(matches!(err, Err(AppError::InvalidUrlFormat)));
        assert_eq!(api.validate_calls.load(Ordering::SeqCst), 0);
        // 错误之后控件已恢复可用
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_failed_validation_keeps_previous_preview() {
        let api = Arc::new(FakeApi {
            validate_results: Mutex::new(vec![
                Ok(preview("First")),
                Err(AppError::api(Some(400), "bad url")),
            ]),
            ..Default::default()
        });
        let session = session_with(api.clone());
        session.on_validate_requested(URL).await.unwrap();

        let err = session.on_validate_requested(URL).await.unwrap_err();
        assert!(matches!(&err, AppError::Api { message, .. } if message == "bad url"));
        assert_eq!(session.state(), ApplicationState::Error("bad url".to_string()));
        assert_eq!(session.current_preview().unwrap().title, "First");

        // 新的操作会清除错误提示
        session.dismiss_messages();
        assert!(matches!(session.state(), ApplicationState::PreviewReady { .. }));
    }

    #[tokio::test]
    async fn test_download_without_selection() {
        let api = Arc::new(FakeApi::default());
        let session = session_with(api.clone());
        let options = DownloadOptions { quality: None, download_type: DownloadType::Video };
        let dir = tempfile::tempdir().unwrap();

        let err = session
            .on_download_requested(&options, dir.path(), &ProgressBar::hidden())
            .await;
        assert!(matches!(err, Err(AppError::NoActiveSelection)));
        assert_eq!(api.download_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_download_success_sets_notice_and_file_name() {
        let api = Arc::new(FakeApi {
            validate_results: Mutex::new(vec![Ok(preview("Test: Video"))]),
            ..Default::default()
        });
        let session = session_with(api.clone());
        session.on_validate_requested(URL).await.unwrap();

        let options = DownloadOptions { quality: None, download_type: DownloadType::Audio };
        let dir = tempfile::tempdir().unwrap();
        let payload = session
            .on_download_requested(&options, dir.path(), &ProgressBar::hidden())
            .await
            .unwrap();

        assert_eq!(payload.file_name, "Test_Video.mp3");
        assert_eq!(payload.size, 5);
        assert_eq!(fs::read(payload.file.path()).unwrap(), b"media");
        let request = api.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.quality, "best"); // 未指定时使用第一个选项
        assert_eq!(request.url, URL);
        match session.state() {
            ApplicationState::PreviewReady { notice: Some(notice), .. } => {
                assert_eq!(notice, DownloadType::Audio.success_message())
            }
            other => panic!("意外的状态: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_download_failure_allows_retry() {
        let api = Arc::new(FakeApi {
            validate_results: Mutex::new(vec![Ok(preview("Clip"))]),
            download_fails: true,
            ..Default::default()
        });
        let session = session_with(api.clone());
        session.on_validate_requested(URL).await.unwrap();

        let options = DownloadOptions { quality: Some("720p".into()), download_type: DownloadType::Video };
        let dir = tempfile::tempdir().unwrap();
        let pbar = ProgressBar::hidden();
        assert!(session.on_download_requested(&options, dir.path(), &pbar).await.is_err());
        assert!(matches!(session.state(), ApplicationState::Error(_)));
        assert!(session.on_download_requested(&options, dir.path(), &pbar).await.is_err());
        assert_eq!(api.download_calls.load(Ordering::SeqCst), 2);
        assert!(session.current_preview().is_some());
    }

    #[tokio::test]
    async fn test_interrupted_download_leaves_no_partial_file() {
        let api = Arc::new(FakeApi {
            validate_results: Mutex::new(vec![Ok(preview("Clip"))]),
            download_breaks: true,
            ..Default::default()
        });
        let session = session_with(api.clone());
        session.on_validate_requested(URL).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let options = DownloadOptions { quality: None, download_type: DownloadType::Video };
        let err = session
            .on_download_requested(&options, dir.path(), &ProgressBar::hidden())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Io(_)));
        assert!(matches!(session.state(), ApplicationState::Error(_)));
        assert_eq!(session.current_preview().unwrap().title, "Clip");
        assert!(!session.is_busy());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_reset_drops_preview() {
        let api = Arc::new(FakeApi {
            validate_results: Mutex::new(vec![Ok(preview("Clip"))]),
            ..Default::default()
        });
        let session = session_with(api);
        session.on_validate_requested(URL).await.unwrap();
        session.reset().unwrap();
        assert_eq!(session.state(), ApplicationState::Idle);
        assert!(session.current_preview().is_none());
    }

    /// validate 会一直挂起直到测试放行
    struct BlockingApi {
        entered: Notify,
        release: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl VideoApi for BlockingApi {
        async fn validate(&self, _url: &str) -> AppResult<VideoPreview> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            self.release.notified().await;
            Ok(preview("Slow"))
        }

        async fn download(
            &self,
            _request: &DownloadRequest,
            _sink: &mut (dyn Write + Send),
            _pbar: &ProgressBar,
        ) -> AppResult<MediaBody> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(MediaBody { size: 0, content_type: None })
        }
    }

    #[tokio::test]
    async fn test_second_submission_is_rejected_while_in_flight() {
        let api = Arc::new(BlockingApi {
            entered: Notify::new(),
            release: Notify::new(),
            calls: AtomicUsize::new(0),
        });
        let session = Arc::new(DownloadSession::new(api.clone()));

        let first_session = session.clone();
        let first = tokio::spawn(async move { first_session.on_validate_requested(URL).await });
        api.entered.notified().await;

        assert!(session.is_busy());
        assert_eq!(session.state(), ApplicationState::Validating);
        assert!(matches!(session.on_validate_requested(URL).await, Err(AppError::Busy)));
        let options = DownloadOptions { quality: None, download_type: DownloadType::Video };
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            session
                .on_download_requested(&options, dir.path(), &ProgressBar::hidden())
                .await,
            Err(AppError::Busy)
        ));
        assert!(matches!(session.reset(), Err(AppError::Busy)));

        api.release.notify_one();
        first.await.unwrap().unwrap();
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        assert!(!session.is_busy());
        assert!(matches!(session.state(), ApplicationState::PreviewReady { .. }));
    }
}
