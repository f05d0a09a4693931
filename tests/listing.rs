#![deny(warnings)]

use std::time::{Duration, SystemTime};

use dirserve::http::header::{HeaderValue, ETAG, LAST_MODIFIED};
use dirserve::{fs::MemFs, Config, Exclude, FileServer};

fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

const DIR_MODIFIED: u64 = 1_700_000_000;

fn tree() -> MemFs {
    MemFs::new()
        .dir("/", Some(at(DIR_MODIFIED)))
        .file("/b.txt", "b", None)
        .file("/a&<b>.txt", "weird", None)
        .file("/Zeta.md", "z", None)
        .dir("/src", None)
        .dir("/.git", None)
        .dir("/.vscode", None)
        .file("/.idea/workspace.xml", "<xml/>", None)
        .unreadable("/broken")
}

fn server() -> FileServer<MemFs> {
    FileServer::new(tree()).exclude(Exclude::default_hidden())
}

#[tokio::test]
async fn listing_sorted_and_filtered() {
    let _ = pretty_env_logger::try_init();

    let res = dirserve::test::request().path("/").reply(&server()).await;

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "text/html; charset=utf-8");
    assert_eq!(res.headers()["last-modified"], httpdate::fmt_http_date(at(DIR_MODIFIED)));
    assert_eq!(
        res.body(),
        "<pre>\n\
         <a href=\"Zeta.md\">Zeta.md</a>\n\
         <a href=\"a&%3Cb%3E.txt\">a&amp;&lt;b&gt;.txt</a>\n\
         <a href=\"b.txt\">b.txt</a>\n\
         <a href=\"broken/\">broken/</a>\n\
         <a href=\"src/\">src/</a>\n\
         </pre>\n"
    );
}

#[tokio::test]
async fn listing_without_exclusions() {
    let _ = pretty_env_logger::try_init();

    let server = FileServer::new(tree());
    let res = dirserve::test::request().path("/").reply(&server).await;

    let body = String::from_utf8(res.body().to_vec()).unwrap();
    assert!(body.contains("<a href=\".git/\">.git/</a>"));
    assert!(body.contains("<a href=\".idea/\">.idea/</a>"));
}

#[tokio::test]
async fn empty_dir_has_no_last_modified() {
    let _ = pretty_env_logger::try_init();

    let res = dirserve::test::request().path("/src/").reply(&server()).await;

    assert_eq!(res.status(), 200);
    assert!(!res.headers().contains_key("last-modified"));
    assert_eq!(res.body(), "<pre>\n</pre>\n");
}

#[tokio::test]
async fn listing_head() {
    let _ = pretty_env_logger::try_init();

    let res = dirserve::test::request()
        .method("HEAD")
        .path("/")
        .reply(&server())
        .await;

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "text/html; charset=utf-8");
    assert!(res.body().is_empty());
}

#[tokio::test]
async fn listing_not_modified() {
    let _ = pretty_env_logger::try_init();

    let res = dirserve::test::request()
        .path("/")
        .header("if-modified-since", httpdate::fmt_http_date(at(DIR_MODIFIED)))
        .reply(&server())
        .await;

    assert_eq!(res.status(), 304);
    assert!(!res.headers().contains_key("content-type"));
    assert!(!res.headers().contains_key("content-length"));
    assert!(res.body().is_empty());
}

#[tokio::test]
async fn listing_modified_since() {
    let _ = pretty_env_logger::try_init();

    let res = dirserve::test::request()
        .path("/")
        .header(
            "if-modified-since",
            httpdate::fmt_http_date(at(DIR_MODIFIED - 1)),
        )
        .reply(&server())
        .await;

    assert_eq!(res.status(), 200);
    assert!(!res.body().is_empty());
}

#[tokio::test]
async fn listing_post_ignores_precondition() {
    let _ = pretty_env_logger::try_init();

    let res = dirserve::test::request()
        .method("POST")
        .path("/")
        .header("if-modified-since", httpdate::fmt_http_date(at(DIR_MODIFIED)))
        .reply(&server())
        .await;

    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn listing_not_modified_prefers_etag() {
    let _ = pretty_env_logger::try_init();

    let config = Config::default()
        .add_header(ETAG, HeaderValue::from_static("\"listing-v1\""))
        .add_header(
            LAST_MODIFIED,
            HeaderValue::from_static("Sun, 06 Nov 1994 08:49:37 GMT"),
        );
    let server = server().config(config);

    let res = dirserve::test::request()
        .path("/")
        .header("if-modified-since", httpdate::fmt_http_date(at(DIR_MODIFIED)))
        .reply(&server)
        .await;

    assert_eq!(res.status(), 304);
    assert_eq!(res.headers()["etag"], "\"listing-v1\"");
    assert!(!res.headers().contains_key("last-modified"));
}

#[tokio::test]
async fn unreadable_dir_is_500() {
    let _ = pretty_env_logger::try_init();

    let res = dirserve::test::request()
        .path("/broken/")
        .reply(&server())
        .await;

    assert_eq!(res.status(), 500);
    assert_eq!(res.headers()["content-type"], "text/plain; charset=utf-8");
    assert_eq!(res.body(), "500 Internal Server Error\n");
}
