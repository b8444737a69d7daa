//! Fault isolation at the fetch layer: one broken feed must not cost the
//! run the entries of a healthy one. The healthy feed is a minimal local
//! HTTP stub server; the broken one points at a port nothing listens on.

use environ_news::fetcher;
use environ_news::models::{Category, FeedDescriptor};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const RSS_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Stub Water News</title>
    <item>
      <title>Reservoir level update</title>
      <link>https://stub.ir/news/1</link>
      <pubDate>Tue, 06 May 2025 08:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Pipeline maintenance notice</title>
      <link>https://stub.ir/news/2</link>
      <pubDate>Tue, 06 May 2025 09:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

/// Serve `body` for a single HTTP request on an ephemeral port; returns the
/// base URL.
async fn spawn_stub(body: &'static str, status_line: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "{status_line}\r\nContent-Type: application/rss+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{addr}/rss")
}

fn feed(url: String, source: &str) -> FeedDescriptor {
    FeedDescriptor {
        url,
        category: Category::Water,
        source_name: source.into(),
    }
}

#[tokio::test]
async fn failed_feed_is_reported_and_healthy_feed_still_yields_entries() {
    let good_url = spawn_stub(RSS_BODY, "HTTP/1.1 200 OK").await;
    // Port 1 is essentially never listening; connection is refused fast.
    let bad_url = "http://127.0.0.1:1/rss".to_string();

    let feeds = vec![
        feed(bad_url.clone(), "broken"),
        feed(good_url, "stub-water"),
    ];

    let client = fetcher::build_client(5).unwrap();
    let (fetched, errors) = fetcher::fetch_all(&client, &feeds, 4).await;

    // Descriptor order preserved; the broken feed contributes zero entries.
    assert_eq!(fetched.len(), 2);
    assert_eq!(fetched[0].0.source_name, "broken");
    assert!(fetched[0].1.is_empty());
    assert_eq!(fetched[1].1.len(), 2);
    assert_eq!(
        fetched[1].1[0].title.as_deref(),
        Some("Reservoir level update")
    );

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].feed_url, bad_url);
    assert!(!errors[0].reason.is_empty());
}

#[tokio::test]
async fn http_error_status_is_a_feed_error() {
    let url = spawn_stub("gone", "HTTP/1.1 503 Service Unavailable").await;
    let feeds = vec![feed(url.clone(), "flaky")];

    let client = fetcher::build_client(5).unwrap();
    let (fetched, errors) = fetcher::fetch_all(&client, &feeds, 2).await;

    assert!(fetched[0].1.is_empty());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].reason.contains("503"));
}

#[tokio::test]
async fn non_feed_body_is_a_parse_error() {
    let url = spawn_stub("<html><body>totally a feed</body></html>", "HTTP/1.1 200 OK").await;
    let feeds = vec![feed(url, "not-a-feed")];

    let client = fetcher::build_client(5).unwrap();
    let (fetched, errors) = fetcher::fetch_all(&client, &feeds, 2).await;

    assert!(fetched[0].1.is_empty());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].reason.contains("parse"));
}
