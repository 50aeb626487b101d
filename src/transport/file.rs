use std::fs;
use std::thread;
use std::time::Duration;

use rand::Rng;
use url::Url;

use super::{Reply, RequestToken, Transport};
use crate::error::FetchError;

/// Reads `file://` urls on a worker thread after a random delay of up to
/// `max_latency`, so local slideshows complete out of order like remote ones.
#[derive(Debug, Clone)]
pub struct FileTransport {
    max_latency: Duration,
}

impl FileTransport {
    pub fn new(max_latency: Duration) -> Self {
        Self { max_latency }
    }

    fn max_latency_ms(&self) -> u64 {
        u64::try_from(self.max_latency.as_millis()).unwrap_or(u64::MAX)
    }

    fn latency(&self) -> Duration {
        let max_ms = self.max_latency_ms();
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=max_ms))
    }
}

fn read(url: &Url) -> Result<Vec<u8>, FetchError> {
    let path = url
        .to_file_path()
        .map_err(|()| FetchError::NotAFile(url.clone()))?;
    fs::read(&path).map_err(|source| FetchError::Io { path, source })
}

impl Transport for FileTransport {
    fn fetch(&self, url: &Url, token: RequestToken, reply: Reply) {
        let url = url.clone();
        let latency = self.latency();
        let spawned = thread::Builder::new()
            .name("carousel-file".to_string())
            .spawn(move || {
                thread::sleep(latency);
                if token.is_cancelled() {
                    tracing::trace!(%url, "skipping cancelled read");
                    return;
                }
                reply(read(&url));
            });
        if let Err(e) = spawned {
            tracing::error!(error = %e, "failed to spawn file worker");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn fetch_now(url: &Url, token: RequestToken) -> mpsc::Receiver<Result<Vec<u8>, FetchError>> {
        let (tx, rx) = mpsc::channel();
        FileTransport::new(Duration::ZERO).fetch(
            url,
            token,
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
        );
        rx
    }

    #[test]
    fn huge_latency_saturates_instead_of_wrapping() {
        assert_eq!(FileTransport::new(Duration::MAX).max_latency_ms(), u64::MAX);
        assert_eq!(FileTransport::new(Duration::from_millis(750)).max_latency_ms(), 750);
        assert_eq!(FileTransport::new(Duration::ZERO).latency(), Duration::ZERO);
    }

    #[test]
    fn reads_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        fs::write(&path, b"payload").unwrap();
        let url = Url::from_file_path(&path).unwrap();

        let result = fetch_now(&url, RequestToken::new())
            .recv_timeout(Duration::from_secs(5))
            .unwrap();
        assert_eq!(result.unwrap(), b"payload");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let url = Url::from_file_path(dir.path().join("missing.png")).unwrap();

        let result = fetch_now(&url, RequestToken::new())
            .recv_timeout(Duration::from_secs(5))
            .unwrap();
        assert!(matches!(result, Err(FetchError::Io { .. })));
    }

    #[test]
    fn cancelled_request_never_replies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        fs::write(&path, b"payload").unwrap();
        let token = RequestToken::new();
        token.cancel();

        let rx = fetch_now(&Url::from_file_path(&path).unwrap(), token);
        // The worker drops the reply, which disconnects the channel
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_err());
    }
}
