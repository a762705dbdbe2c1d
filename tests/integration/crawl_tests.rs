//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the book site and exercise the
//! fetch, resolve, walk and assemble pipeline end-to-end.

use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tululu_catalog::config::{AssetFailurePolicy, DownloadConfig, HttpConfig};
use tululu_catalog::crawler::{
    build_http_client, BookResolver, CatalogAssembler, CategoryWalker, Fetcher, RetryPolicy,
};
use tululu_catalog::output::{read_catalog, write_catalog, RunStats};
use tululu_catalog::{Catalog, CatalogError, ErrorKind, SiteUrls};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fetcher for the mock server with a short, bounded retry policy
fn create_fetcher(base_url: &str, cancel: CancellationToken) -> Fetcher {
    let client = build_http_client(&HttpConfig::default()).expect("Failed to build client");
    let site = SiteUrls::new(base_url).expect("Failed to parse base URL");
    let retry = RetryPolicy::bounded(Duration::from_millis(10), 3);
    Fetcher::new(client, site, retry, cancel)
}

fn create_download_config(dest: &Path) -> DownloadConfig {
    DownloadConfig {
        dest_folder: dest.to_path_buf(),
        ..DownloadConfig::default()
    }
}

fn create_resolver(server: &MockServer, download: DownloadConfig) -> BookResolver {
    let fetcher = create_fetcher(&server.uri(), CancellationToken::new());
    BookResolver::new(fetcher, download)
}

fn detail_html(title: &str, author: &str, genres: &[&str], comments: &[&str], cover: Option<&str>) -> String {
    let genre_links: Vec<String> = genres
        .iter()
        .map(|g| format!(r#"<a href="/l55/">{}</a>"#, g))
        .collect();
    let comment_blocks: String = comments
        .iter()
        .map(|c| format!(r#"<div class="texts"><b>reader</b><br><span class="black">{}</span></div>"#, c))
        .collect();
    let cover_block = cover
        .map(|src| format!(r#"<div class="bookimage"><a href="/b1/"><img src="{}" alt="cover"></a></div>"#, src))
        .unwrap_or_default();

    format!(
        r#"<html><head><title>{title}</title></head><body>
        <h1>{title} &nbsp; :: &nbsp; <a href="/a1/">{author}</a></h1>
        {cover_block}
        <span class="d_book"><b>Жанр книги:</b> {genres}</span>
        {comment_blocks}
        </body></html>"#,
        title = title,
        author = author,
        cover_block = cover_block,
        genres = genre_links.join(", "),
        comment_blocks = comment_blocks,
    )
}

fn listing_html(ids: &[u64], pages: u32) -> String {
    let entries: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<table class="d_book"><tr><td><a href="/b{id}/"><img src="/shots/{id}.jpg"></a></td></tr>
                   <tr><td><a href="/b{id}/">Book {id}</a></td></tr></table>"#,
                id = id
            )
        })
        .collect();
    let pagination: String = (2..=pages)
        .map(|p| format!(r#"<a class="npage" href="/l55/{p}/">{p}</a>"#, p = p))
        .collect();

    format!("<html><body>{}<p class=\"center\">{}</p></body></html>", entries, pagination)
}

async fn mount_html(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

/// Mounts the home page and a redirect from `page_path` to it
async fn mount_redirect_home(server: &MockServer, page_path: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", format!("{}/", server.uri()).as_str()),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Home</body></html>"))
        .mount(server)
        .await;
}

/// Mounts detail page, text and cover of a complete book
async fn mount_book(server: &MockServer, id: u64, title: &str) {
    let cover = format!("/shots/{}.jpg", id);
    mount_html(
        server,
        &format!("/b{}/", id),
        detail_html(title, "Author", &["Sci-Fi"], &["Nice"], Some(&cover)),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .and(query_param("id", id.to_string().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("Text of {}", title)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(cover.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0]))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_resolve_book_end_to_end() {
    let server = MockServer::start().await;
    let dest = TempDir::new().unwrap();

    mount_html(
        &server,
        "/b1/",
        detail_html("Dune", "Frank Herbert", &["Sci-Fi"], &["Great", "Long"], Some("/shots/1.jpg")),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .and(query_param("id", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("The spice must flow."))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/shots/1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0]))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = create_resolver(&server, create_download_config(dest.path()));
    let record = resolver.resolve(1).await.expect("Failed to resolve book");

    assert_eq!(record.id, 1);
    assert_eq!(record.title, "Dune");
    assert_eq!(record.author, "Frank Herbert");
    assert_eq!(record.genres, vec!["Sci-Fi"]);
    assert_eq!(record.comments, vec!["Great", "Long"]);
    assert_eq!(
        record.cover_url.as_deref(),
        Some(format!("{}/shots/1.jpg", server.uri()).as_str())
    );
    assert_eq!(record.download_url, format!("{}/txt.php?id=1", server.uri()));

    let text_path = dest.path().join("books").join("1_Dune.txt");
    let expected_text = text_path.to_string_lossy().into_owned();
    assert_eq!(record.text_path.as_deref(), Some(expected_text.as_str()));
    assert_eq!(std::fs::read_to_string(&text_path).unwrap(), "The spice must flow.");

    let cover_path = dest.path().join("images").join("1.jpg");
    let expected_cover = cover_path.to_string_lossy().into_owned();
    assert_eq!(record.cover_path.as_deref(), Some(expected_cover.as_str()));
    assert_eq!(std::fs::read(&cover_path).unwrap(), vec![0xFF, 0xD8, 0xFF, 0xE0]);
}

#[tokio::test]
async fn test_text_file_name_is_sanitized() {
    let server = MockServer::start().await;
    let dest = TempDir::new().unwrap();
    mount_book(&server, 8, "Why? Because: yes").await;

    let resolver = create_resolver(&server, create_download_config(dest.path()));
    let record = resolver.resolve(8).await.unwrap();

    assert_eq!(record.title, "Why? Because: yes");
    assert!(dest.path().join("books").join("8_Why Because yes.txt").exists());
}

#[tokio::test]
async fn test_redirect_to_home_is_not_found() {
    let server = MockServer::start().await;
    let dest = TempDir::new().unwrap();
    mount_redirect_home(&server, "/b2/").await;

    let resolver = create_resolver(&server, create_download_config(dest.path()));
    let result = resolver.resolve(2).await;

    assert!(matches!(result, Err(CatalogError::NotFound { .. })));
    assert!(!dest.path().join("books").exists());
}

#[tokio::test]
async fn test_http_error_is_not_retried() {
    let server = MockServer::start().await;
    let dest = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/b3/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = create_resolver(&server, create_download_config(dest.path()));
    let result = resolver.resolve(3).await;

    match result {
        Err(e) => assert_eq!(e.kind(), ErrorKind::NotFound),
        Ok(record) => panic!("Expected NotFound, got {:?}", record),
    }
}

#[tokio::test]
async fn test_malformed_page_is_rejected() {
    let server = MockServer::start().await;
    let dest = TempDir::new().unwrap();
    mount_html(&server, "/b4/", "<html><body><p>No heading</p></body></html>".to_string()).await;

    let resolver = create_resolver(&server, create_download_config(dest.path()));
    let result = resolver.resolve(4).await;

    assert!(matches!(result, Err(CatalogError::MalformedPage { .. })));
}

#[tokio::test]
async fn test_skip_flags_disable_downloads() {
    let server = MockServer::start().await;
    let dest = TempDir::new().unwrap();

    mount_html(
        &server,
        "/b1/",
        detail_html("Dune", "Frank Herbert", &["Sci-Fi"], &[], Some("/shots/1.jpg")),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/shots/1.jpg"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let download = DownloadConfig {
        skip_txt: true,
        skip_imgs: true,
        ..create_download_config(dest.path())
    };
    let resolver = create_resolver(&server, download);
    let record = resolver.resolve(1).await.unwrap();

    assert_eq!(record.title, "Dune");
    assert!(record.cover_url.is_some());
    assert!(record.text_path.is_none());
    assert!(record.cover_path.is_none());
}

#[tokio::test]
async fn test_book_without_cover() {
    let server = MockServer::start().await;
    let dest = TempDir::new().unwrap();

    mount_html(&server, "/b6/", detail_html("Solaris", "Stanislaw Lem", &[], &[], None)).await;
    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .and(query_param("id", "6"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Ocean"))
        .mount(&server)
        .await;

    let resolver = create_resolver(&server, create_download_config(dest.path()));
    let record = resolver.resolve(6).await.unwrap();

    assert!(record.cover_url.is_none());
    assert!(record.cover_path.is_none());
    assert!(record.text_path.is_some());
    assert!(record.genres.is_empty());
}

#[tokio::test]
async fn test_failed_text_download_keeps_metadata() {
    let server = MockServer::start().await;
    let dest = TempDir::new().unwrap();

    mount_html(&server, "/b9/", detail_html("Dune", "Frank Herbert", &["Sci-Fi"], &[], None)).await;
    mount_redirect_home(&server, "/txt.php").await;

    let resolver = create_resolver(&server, create_download_config(dest.path()));
    let record = resolver.resolve(9).await.expect("Metadata should be kept");

    assert_eq!(record.title, "Dune");
    assert!(record.text_path.is_none());
    assert!(!dest.path().join("books").join("9_Dune.txt").exists());
}

#[tokio::test]
async fn test_failed_text_download_with_skip_policy() {
    let server = MockServer::start().await;
    let dest = TempDir::new().unwrap();

    mount_html(&server, "/b9/", detail_html("Dune", "Frank Herbert", &["Sci-Fi"], &[], None)).await;
    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let download = DownloadConfig {
        asset_failure: AssetFailurePolicy::Skip,
        ..create_download_config(dest.path())
    };
    let resolver = create_resolver(&server, download);
    let result = resolver.resolve(9).await;

    assert!(matches!(result, Err(CatalogError::NotFound { .. })));
}

#[tokio::test]
async fn test_connection_failure_is_retried_then_reported() {
    // Reserve a port, then close it so every connection is refused
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let fetcher = create_fetcher(&format!("http://127.0.0.1:{}/", port), CancellationToken::new());
    let url = fetcher.site().book_page(1);
    let result = fetcher.fetch(&url, &[]).await;

    match result {
        Err(e) => assert_eq!(e.kind(), ErrorKind::TransientNetwork),
        Ok(response) => panic!("Expected a connection failure, got {:?}", response.status),
    }
}

#[tokio::test]
async fn test_walker_dedups_across_pages_and_clamps() {
    let server = MockServer::start().await;

    mount_html(&server, "/l55/", listing_html(&[5, 12, 5], 2)).await;
    mount_html(&server, "/l55/2/", listing_html(&[12, 7], 2)).await;

    let walker = CategoryWalker::new(create_fetcher(&server.uri(), CancellationToken::new()));
    let walk = walker.enumerate(55, 1, Some(5)).await.unwrap();

    assert_eq!(walk.ids, vec![5, 12, 7]);
    assert_eq!(walk.page_count, 2);
    assert_eq!(walk.requested_end, 5);
    assert_eq!(walk.effective_end, 2);
    assert!(walk.clamped);
    assert!(walk.skipped_pages.is_empty());
}

#[tokio::test]
async fn test_walker_single_page_category() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/l55/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&[5, 12, 5], 1)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/l55/2/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let walker = CategoryWalker::new(create_fetcher(&server.uri(), CancellationToken::new()));
    let walk = walker.enumerate(55, 1, Some(5)).await.unwrap();

    assert_eq!(walk.ids, vec![5, 12]);
    assert_eq!(walk.page_count, 1);
    assert_eq!(walk.effective_end, 1);
    assert!(walk.clamped);
}

#[tokio::test]
async fn test_walker_skips_missing_page() {
    let server = MockServer::start().await;

    mount_html(&server, "/l55/", listing_html(&[1, 2], 3)).await;
    Mock::given(method("GET"))
        .and(path("/l55/2/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_html(&server, "/l55/3/", listing_html(&[3], 3)).await;

    let walker = CategoryWalker::new(create_fetcher(&server.uri(), CancellationToken::new()));
    let walk = walker.enumerate(55, 1, None).await.unwrap();

    assert_eq!(walk.ids, vec![1, 2, 3]);
    assert_eq!(walk.skipped_pages, vec![2]);
    assert!(!walk.clamped);
    assert_eq!(walk.effective_end, 3);
}

#[tokio::test]
async fn test_walker_page_window() {
    let server = MockServer::start().await;

    mount_html(&server, "/l55/", listing_html(&[1, 2], 3)).await;
    mount_html(&server, "/l55/2/", listing_html(&[3, 4], 3)).await;
    Mock::given(method("GET"))
        .and(path("/l55/3/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let walker = CategoryWalker::new(create_fetcher(&server.uri(), CancellationToken::new()));
    let walk = walker.enumerate(55, 2, Some(2)).await.unwrap();

    assert_eq!(walk.ids, vec![3, 4]);
    assert!(!walk.clamped);
}

#[tokio::test]
async fn test_walker_missing_category() {
    let server = MockServer::start().await;
    mount_redirect_home(&server, "/l999/").await;

    let walker = CategoryWalker::new(create_fetcher(&server.uri(), CancellationToken::new()));
    let result = walker.enumerate(999, 1, None).await;

    assert!(matches!(result, Err(CatalogError::NotFound { .. })));
}

#[tokio::test]
async fn test_assembler_keeps_successes_only() {
    let server = MockServer::start().await;
    let dest = TempDir::new().unwrap();

    mount_book(&server, 1, "First").await;
    mount_book(&server, 5, "Fifth").await;
    mount_redirect_home(&server, "/b2/").await;
    Mock::given(method("GET"))
        .and(path("/b3/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_html(&server, "/b4/", "<html><body>Broken</body></html>".to_string()).await;

    let assembler = CatalogAssembler::new(create_resolver(&server, create_download_config(dest.path())));
    let mut catalog = Catalog::new();
    let mut stats = RunStats::new();
    assembler
        .extend_catalog(&mut catalog, &[5, 1, 2, 3, 4, 5, 1], &mut stats)
        .await
        .unwrap();

    let ids: Vec<u64> = catalog.records().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![5, 1]);
    assert_eq!(stats.requested, 7);
    assert_eq!(stats.cataloged, 2);
    assert_eq!(stats.duplicates, 2);
    assert_eq!(stats.skipped[&ErrorKind::NotFound], 2);
    assert_eq!(stats.skipped[&ErrorKind::MalformedPage], 1);
    assert_eq!(stats.texts_saved, 2);
    assert_eq!(stats.covers_saved, 2);
}

#[tokio::test]
async fn test_build_catalog_and_write_file() {
    let server = MockServer::start().await;
    let dest = TempDir::new().unwrap();

    mount_book(&server, 1, "Алиса в Стране чудес").await;
    mount_redirect_home(&server, "/b2/").await;

    let assembler = CatalogAssembler::new(create_resolver(&server, create_download_config(dest.path())));
    let catalog = assembler.build_catalog(&[1, 2]).await.unwrap();
    assert_eq!(catalog.len(), 1);

    let catalog_path = dest.path().join("catalog.json");
    write_catalog(&catalog_path, &catalog).await.unwrap();

    let json = std::fs::read_to_string(&catalog_path).unwrap();
    assert!(json.contains("Алиса в Стране чудес"));
    assert!(json.contains("txt.php?id=1"));

    let loaded = read_catalog(&catalog_path).await.unwrap();
    assert_eq!(loaded, catalog);
}

#[tokio::test]
async fn test_assembler_stops_when_cancelled() {
    let server = MockServer::start().await;
    let dest = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let fetcher = create_fetcher(&server.uri(), cancel);
    let assembler = CatalogAssembler::new(BookResolver::new(fetcher, create_download_config(dest.path())));

    let mut catalog = Catalog::new();
    let mut stats = RunStats::new();
    let result = assembler.extend_catalog(&mut catalog, &[1, 2, 3], &mut stats).await;

    assert!(matches!(result, Err(CatalogError::Cancelled)));
    assert!(catalog.is_empty());
}
