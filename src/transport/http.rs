use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use url::Url;

use super::{Reply, RequestToken, Transport};
use crate::constants::USER_AGENT;
use crate::error::FetchError;

/// Fetches over HTTP(S), one worker thread per request.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn get(client: &Client, url: &Url) -> Result<Vec<u8>, FetchError> {
    let response = client.get(url.clone()).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    Ok(response.bytes()?.to_vec())
}

impl Transport for HttpTransport {
    fn fetch(&self, url: &Url, token: RequestToken, reply: Reply) {
        let client = self.client.clone();
        let url = url.clone();
        let spawned = thread::Builder::new()
            .name("carousel-http".to_string())
            .spawn(move || {
                if token.is_cancelled() {
                    return;
                }
                let result = get(&client, &url);
                if token.is_cancelled() {
                    tracing::trace!(%url, "dropping response of cancelled request");
                    return;
                }
                reply(result);
            });
        if let Err(e) = spawned {
            tracing::error!(error = %e, "failed to spawn http worker");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;

    /// Answers a single request with `status` and `body`, returns its url.
    fn serve_once(status: &'static str, body: &'static [u8]) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            // Skip the request head
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            let mut stream = reader.into_inner();
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            )
            .unwrap();
            stream.write_all(body).unwrap();
        });
        Url::parse(&format!("http://{addr}/image.png")).unwrap()
    }

    fn transport() -> HttpTransport {
        let client = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        HttpTransport::with_client(client)
    }

    #[test]
    fn success_returns_the_body() {
        let url = serve_once("200 OK", b"image bytes");
        let body = get(&transport().client, &url).unwrap();
        assert_eq!(body, b"image bytes");
    }

    #[test]
    fn non_2xx_status_is_a_failure() {
        let url = serve_once("404 Not Found", b"missing");
        let err = get(&transport().client, &url).unwrap_err();
        assert!(matches!(err, FetchError::Status(404)));

        let url = serve_once("503 Service Unavailable", b"");
        let err = get(&transport().client, &url).unwrap_err();
        assert!(matches!(err, FetchError::Status(503)));
    }

    #[test]
    fn fetch_replies_from_a_worker_thread() {
        let url = serve_once("404 Not Found", b"");
        let (tx, rx) = mpsc::channel();
        transport().fetch(
            &url,
            RequestToken::new(),
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
        );

        let result = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(matches!(result, Err(FetchError::Status(404))));
    }
}
