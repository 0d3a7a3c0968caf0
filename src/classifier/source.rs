use crate::config::ClassifierConfig;
use crate::error::{Error, FetchError};
use async_trait::async_trait;
use image::ImageReader;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use std::io::Cursor;
use std::time::Duration;
use url::Url;

/// Capability to download the bytes of an image
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}

/// Downloads images over HTTP with a shared client
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: Client,
    timeout: Duration,
    max_bytes: usize,
}

impl HttpImageSource {
    /// Builds a client carrying the configured headers
    pub fn new(config: &ClassifierConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| Error::Config(format!("invalid user agent: {}", e)))?,
        );
        if let Some(referer) = &config.referer {
            headers.insert(
                REFERER,
                HeaderValue::from_str(referer)
                    .map_err(|e| Error::Config(format!("invalid referer: {}", e)))?,
            );
        }

        let timeout = Duration::from_secs(config.fetch_timeout_secs);
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self::with_client(client, timeout).with_max_bytes(config.max_image_bytes))
    }

    /// Reuse an existing client
    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            max_bytes: usize::MAX,
        }
    }

    /// Reject bodies larger than `max_bytes`
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let request = async {
            let mut response = self
                .client
                .get(url.as_str())
                .send()
                .await
                .map_err(|e| FetchError::Request(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }

            if response
                .content_length()
                .is_some_and(|len| len > self.max_bytes as u64)
            {
                return Err(FetchError::TooLarge(self.max_bytes));
            }

            // Content-Length may be absent or wrong; count while reading
            let mut body = Vec::new();
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|e| FetchError::Request(e.to_string()))?
            {
                if body.len() + chunk.len() > self.max_bytes {
                    return Err(FetchError::TooLarge(self.max_bytes));
                }
                body.extend_from_slice(&chunk);
            }
            Ok(body)
        };

        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))?
    }
}

/// Read the true pixel dimensions from encoded image bytes
///
/// Only the header is parsed; the pixel data is not decoded.
pub fn decode_dimensions(bytes: &[u8]) -> Result<(u32, u32), String> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| format!("failed to read image: {}", e))?;

    if reader.format().is_none() {
        return Err("unrecognised image format".to_string());
    }

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| format!("failed to decode image header: {}", e))?;

    if width == 0 || height == 0 {
        return Err(format!("image has no pixels ({}x{})", width, height));
    }
    Ok((width, height))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Encode a blank PNG of the given size
    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_dimensions_png() {
        assert_eq!(decode_dimensions(&png_bytes(64, 32)), Ok((64, 32)));
        assert_eq!(decode_dimensions(&png_bytes(10, 40)), Ok((10, 40)));
    }

    #[test]
    fn test_decode_dimensions_garbage() {
        assert!(decode_dimensions(b"").is_err());
        assert!(decode_dimensions(b"<html>not an image</html>").is_err());
    }

    #[test]
    fn test_decode_dimensions_truncated_png() {
        let bytes = png_bytes(64, 32);
        assert!(decode_dimensions(&bytes[..12]).is_err());
    }

    /// Serve one connection on a local port with `respond`
    async fn serve_once<F, Fut>(respond: F) -> Url
    where
        F: FnOnce(TcpStream) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((stream, _)) = listener.accept().await {
                respond(stream).await;
            }
        });
        Url::parse(&format!("http://{}/image.png", addr)).unwrap()
    }

    /// Read the request head, then write `response`
    async fn reply(mut stream: TcpStream, response: Vec<u8>) {
        let mut buf = [0u8; 4096];
        let _ = stream.read(&mut buf).await;
        let _ = stream.write_all(&response).await;
        let _ = stream.shutdown().await;
    }

    fn source(timeout: Duration, max_bytes: usize) -> HttpImageSource {
        let client = Client::builder().no_proxy().build().unwrap();
        HttpImageSource::with_client(client, timeout).with_max_bytes(max_bytes)
    }

    #[tokio::test]
    async fn test_http_source_reads_body() {
        let png = png_bytes(8, 4);
        let mut response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            png.len()
        )
        .into_bytes();
        response.extend_from_slice(&png);
        let url = serve_once(move |stream| reply(stream, response)).await;

        let bytes = source(Duration::from_secs(5), 1024 * 1024).fetch(&url).await.unwrap();
        assert_eq!(decode_dimensions(&bytes), Ok((8, 4)));
    }

    #[tokio::test]
    async fn test_http_source_status_error() {
        let response =
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_vec();
        let url = serve_once(move |stream| reply(stream, response)).await;

        let result = source(Duration::from_secs(5), 1024).fetch(&url).await;
        assert!(matches!(result, Err(FetchError::Status(404))));
    }

    #[tokio::test]
    async fn test_http_source_stalled_server_times_out() {
        let url = serve_once(|mut stream| async move {
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
        })
        .await;

        let result = source(Duration::from_millis(200), 1024).fetch(&url).await;
        assert!(matches!(
            result,
            Err(FetchError::Timeout(_)) | Err(FetchError::Request(_))
        ));
    }

    #[tokio::test]
    async fn test_http_source_rejects_large_declared_body() {
        let response = b"HTTP/1.1 200 OK\r\nContent-Length: 5000\r\nConnection: close\r\n\r\n".to_vec();
        let url = serve_once(move |stream| reply(stream, response)).await;

        let result = source(Duration::from_secs(5), 1000).fetch(&url).await;
        assert!(matches!(result, Err(FetchError::TooLarge(1000))));
    }

    #[tokio::test]
    async fn test_http_source_rejects_large_streamed_body() {
        let mut response = b"HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n".to_vec();
        response.extend(std::iter::repeat_n(b'x', 5000));
        let url = serve_once(move |stream| reply(stream, response)).await;

        let result = source(Duration::from_secs(5), 1000).fetch(&url).await;
        assert!(matches!(result, Err(FetchError::TooLarge(1000))));
    }

    #[tokio::test]
    async fn test_http_source_unreachable_host() {
        let source = HttpImageSource::new(&ClassifierConfig {
            fetch_timeout_secs: 2,
            ..ClassifierConfig::default()
        })
        .unwrap();
        let url = Url::parse("http://127.0.0.1:9/missing.png").unwrap();
        assert!(source.fetch(&url).await.is_err());
    }
}
