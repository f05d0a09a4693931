#![deny(warnings)]

use dirserve::{fs::MemFs, Exclude, FileServer};

fn server() -> FileServer<MemFs> {
    let fs = MemFs::new()
        .file("/file.txt", "file", None)
        .file("/a/index.html", "<p>a</p>", None)
        .file("/a/b/nested/leaf.txt", "leaf", None)
        .file("/docs/readme.txt", "readme", None)
        .file("/.git/HEAD", "ref: refs/heads/main", None)
        .file("/private/key.pem", "-----", None)
        .deny("/private");
    FileServer::new(fs).exclude(Exclude::default_hidden())
}

/// Resolve a relative `Location` against the request path.
fn resolve(base: &str, location: &str) -> String {
    let (loc, query) = match location.split_once('?') {
        Some((loc, q)) => (loc, Some(q)),
        None => (location, None),
    };
    let dir = &base[..=base.rfind('/').expect("rooted")];
    let merged = format!("{}{}", dir, loc);
    let mut out = dirserve::path::clean(&merged);
    if (merged.ends_with('/') || merged.ends_with("/.")) && out != "/" {
        out.push('/');
    }
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    out
}

#[tokio::test]
async fn dir_without_slash() {
    let _ = pretty_env_logger::try_init();

    let res = dirserve::test::request()
        .path("/docs?x=1")
        .reply(&server())
        .await;

    assert_eq!(res.status(), 301);
    assert_eq!(res.headers()["location"], "docs/?x=1");
    assert!(res.body().is_empty());
}

#[tokio::test]
async fn nested_dir_without_slash() {
    let _ = pretty_env_logger::try_init();

    let res = dirserve::test::request()
        .path("/a/b/nested")
        .reply(&server())
        .await;

    assert_eq!(res.status(), 301);
    assert_eq!(res.headers()["location"], "nested/");
    assert_eq!(resolve("/a/b/nested", "nested/"), "/a/b/nested/");
}

#[tokio::test]
async fn strip_index() {
    let _ = pretty_env_logger::try_init();
    let server = server();

    let res = dirserve::test::request()
        .path("/a/index.html")
        .reply(&server)
        .await;
    assert_eq!(res.status(), 301);
    assert_eq!(res.headers()["location"], "./");

    let res = dirserve::test::request()
        .path("/a/index.html?v=2")
        .reply(&server)
        .await;
    assert_eq!(res.status(), 301);
    assert_eq!(res.headers()["location"], "./?v=2");
}

#[tokio::test]
async fn file_with_slash() {
    let _ = pretty_env_logger::try_init();

    let res = dirserve::test::request()
        .path("/file.txt/")
        .reply(&server())
        .await;

    assert_eq!(res.status(), 301);
    assert_eq!(res.headers()["location"], "../file.txt");
}

#[tokio::test]
async fn one_hop_to_canonical() {
    let _ = pretty_env_logger::try_init();
    let server = server();

    let requests = [
        "/docs?x=1",
        "/a/b/nested",
        "/a/index.html",
        "/file.txt/",
        "/docs/",
        "/file.txt",
        "/a/",
    ];
    for path in requests {
        let res = dirserve::test::request().path(path).reply(&server).await;
        let target = if res.status() == 301 {
            let location = res.headers()["location"].to_str().unwrap();
            resolve(path, location)
        } else {
            path.to_owned()
        };

        let res = dirserve::test::request().path(&target).reply(&server).await;
        assert_eq!(res.status(), 200, "{} -> {}", path, target);
    }
}

#[tokio::test]
async fn index_served_for_dir() {
    let _ = pretty_env_logger::try_init();

    let res = dirserve::test::request()
        .path("/a/")
        .reply(&server())
        .await;

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "text/html");
    assert_eq!(res.body(), "<p>a</p>");
}

#[tokio::test]
async fn missing_is_404() {
    let _ = pretty_env_logger::try_init();
    let server = server();

    for path in ["/nope", "/nope/", "/docs/nope.txt", "/nope/index.html"] {
        let res = dirserve::test::request().path(path).reply(&server).await;
        assert_eq!(res.status(), 404, "{}", path);
        assert_eq!(res.body(), "404 page not found\n");
    }
}

#[tokio::test]
async fn denied_is_403() {
    let _ = pretty_env_logger::try_init();
    let server = server();

    for path in ["/private", "/private/", "/private/key.pem"] {
        let res = dirserve::test::request().path(path).reply(&server).await;
        assert_eq!(res.status(), 403, "{}", path);
        assert_eq!(res.headers()["content-type"], "text/plain; charset=utf-8");
        assert_eq!(res.headers()["x-content-type-options"], "nosniff");
        assert_eq!(res.body(), "403 Forbidden\n");
    }
}

#[tokio::test]
async fn excluded_is_404_before_redirect() {
    let _ = pretty_env_logger::try_init();
    let server = server();

    for path in ["/.git", "/.git/HEAD", "/.git/HEAD/"] {
        let res = dirserve::test::request().path(path).reply(&server).await;
        assert_eq!(res.status(), 404, "{}", path);
    }
}
