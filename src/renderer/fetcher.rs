//! # HTTP 下载模块
//!
//! ## 设计思路
//!
//! 渲染服务只通过一次 HTTP GET 返回图片，这里负责在“尽可能早”的阶段拒绝异常响应：
//! 状态码、内容类型、声明体积、实际体积、文件签名依次校验。
//!
//! ## 实现思路
//!
//! - 只发一次请求，不做重试；失败以 `FetchError` 显式返回给调用方。
//! - 分块读取响应体并累计体积，超限立即中止。
//! - 成功结果按 URL 放入渲染缓存；缓存锁只在同步代码里持有，不跨 `.await`。

use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::cache::RenderCache;
use super::{FetchConfig, FetchError, ImageFetcher, RenderedImage};

const BUFFER_INITIAL_CAPACITY: usize = 16 * 1024;

/// 基于 `reqwest` 的渲染图片下载器。
pub struct HttpFetcher {
    client: reqwest::Client,
    config: FetchConfig,
    cache: Mutex<RenderCache>,
}

impl HttpFetcher {
    /// 根据配置创建下载器。
    ///
    /// 这里同时构建复用型 HTTP 客户端，减少每次请求的初始化开销。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use latex_insert::renderer::{FetchConfig, HttpFetcher};
    ///
    /// let fetcher = HttpFetcher::new(FetchConfig::default())?;
    /// # Ok::<(), latex_insert::renderer::FetchError>(())
    /// ```
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Network(format!("无法创建 HTTP 客户端：{}", e)))?;

        let cache = RenderCache::new(
            config.cache_capacity,
            Duration::from_secs(config.cache_ttl_secs),
        );

        Ok(Self {
            client,
            config,
            cache: Mutex::new(cache),
        })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    async fn download(&self, url: reqwest::Url) -> Result<Vec<u8>, FetchError> {
        log::debug!("📡 发送 HTTP 请求...");
        let mut response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "image/gif,image/png,image/svg+xml,image/*;q=0.8")
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e, url.as_str()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!(
                "HTTP {}: {}",
                status.as_u16(),
                Self::status_message(status.as_u16())
            )));
        }

        if let Some(ct) = response.headers().get(reqwest::header::CONTENT_TYPE) {
            if let Ok(ct_str) = ct.to_str() {
                if !Self::is_image_content_type(ct_str) {
                    return Err(FetchError::InvalidFormat(format!("不是图片类型：{}", ct_str)));
                }
            }
        }

        let total_len = response.content_length();
        if let Some(size) = total_len {
            if size > self.config.max_file_size {
                return Err(FetchError::ResourceLimit(format!(
                    "渲染结果过大：{:.2} KB（限制：{:.2} KB）",
                    size as f64 / 1024.0,
                    self.config.max_file_size as f64 / 1024.0
                )));
            }
        }

        let initial_capacity = total_len
            .map(|len| len.min(self.config.max_file_size) as usize)
            .filter(|len| *len > 0)
            .unwrap_or(BUFFER_INITIAL_CAPACITY);
        let mut buffer = Vec::with_capacity(initial_capacity);

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.map_reqwest_error(e, url.as_str()))?
        {
            if (buffer.len() + chunk.len()) as u64 > self.config.max_file_size {
                return Err(FetchError::ResourceLimit("下载后文件超过大小限制".to_string()));
            }
            buffer.extend_from_slice(&chunk);
        }

        log::debug!("✅ 下载完成 - {} bytes", buffer.len());
        Ok(buffer)
    }

    fn cached(&self, url: &str) -> Option<RenderedImage> {
        self.cache.lock().ok()?.get(url)
    }

    fn store_cached(&self, url: &str, image: &RenderedImage) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(url, image);
        }
    }

    fn parse_url(url: &str) -> Result<reqwest::Url, FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| FetchError::InvalidFormat(format!("URL 格式错误：{}", e)))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(FetchError::InvalidFormat("仅支持 HTTP/HTTPS".to_string()));
        }

        Ok(parsed)
    }

    fn is_image_content_type(content_type: &str) -> bool {
        content_type
            .split(';')
            .next()
            .map(|base| base.trim().to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(false)
    }

    pub(crate) fn redact_url_for_log(url: &str) -> String {
        let Ok(parsed) = reqwest::Url::parse(url) else {
            return "<invalid-url>".to_string();
        };

        let host = parsed.host_str().unwrap_or("<unknown-host>");
        let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();

        format!("{}://{}{}{}", parsed.scheme(), host, port, parsed.path())
    }

    /// 统一映射 reqwest 错误到业务错误。
    fn map_reqwest_error(&self, e: reqwest::Error, url: &str) -> FetchError {
        let err_msg = e.to_string().replace(url, &Self::redact_url_for_log(url));

        if e.is_timeout() {
            FetchError::Timeout(format!("下载超时（{}秒）", self.config.timeout_secs))
        } else if e.is_connect() {
            FetchError::Network(format!("无法连接渲染服务：{}", err_msg))
        } else if e.is_redirect() {
            FetchError::Network(format!("重定向次数超过限制（{}）", self.config.max_redirects))
        } else {
            FetchError::Network(format!("请求失败：{}", err_msg))
        }
    }

    /// 常见 HTTP 状态码本地化文案。
    fn status_message(code: u16) -> &'static str {
        match code {
            400 => "公式无法被渲染服务解析",
            404 => "未找到",
            403 => "访问被拒绝",
            429 => "请求过于频繁",
            500..=599 => "渲染服务错误",
            _ => "请求失败",
        }
    }
}

impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<RenderedImage, FetchError> {
        let parsed = Self::parse_url(url)?;
        let key = parsed.to_string();

        if let Some(image) = self.cached(&key) {
            log::debug!("♻️ 命中渲染缓存 - URL: {}", Self::redact_url_for_log(&key));
            return Ok(image);
        }

        log::info!("🌐 开始下载公式图片 - URL: {}", Self::redact_url_for_log(&key));
        let start = Instant::now();

        let bytes = self.download(parsed).await?;
        let image = RenderedImage::from_bytes(bytes)?;
        self.store_cached(&key, &image);

        log::info!(
            "✅ 公式图片下载完成 - {}x{} {} {} bytes elapsed={}ms",
            image.width,
            image.height,
            image.mime_type,
            image.len(),
            start.elapsed().as_millis()
        );

        Ok(image)
    }
}
