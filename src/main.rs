//! dirserve - serve a directory over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use dirserve::http::{HeaderName, HeaderValue};
use dirserve::{exclude, fs::Dir, Config, Exclude, FileServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser, Debug)]
#[command(name = "dirserve", version, about = "Serve a directory over HTTP")]
struct Cli {
    /// Directory to serve
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:8000")]
    addr: SocketAddr,

    /// Hide path segments matching this regular expression (repeatable)
    #[arg(short, long = "exclude", value_name = "REGEX")]
    excludes: Vec<String>,

    /// Do not hide .git, .vscode and .idea by default
    #[arg(long)]
    no_default_excludes: bool,

    /// File served in place of a directory listing
    #[arg(long, default_value = "index.html")]
    index: String,

    /// Send weak ETags with file responses
    #[arg(long)]
    etag: bool,

    /// Extra response header, as "Name: value" (repeatable)
    #[arg(short = 'H', long = "header", value_name = "HEADER", value_parser = parse_header)]
    headers: Vec<(HeaderName, HeaderValue)>,
}

fn parse_header(s: &str) -> Result<(HeaderName, HeaderValue), BoxError> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("expected \"Name: value\", got {:?}", s))?;
    Ok((name.trim().parse()?, value.trim().parse()?))
}

impl Cli {
    fn exclude(&self) -> Result<Exclude, regex::Error> {
        let defaults = if self.no_default_excludes {
            &[][..]
        } else {
            exclude::DEFAULT_HIDDEN
        };
        let patterns = defaults
            .iter()
            .copied()
            .chain(self.excludes.iter().map(String::as_str));
        Exclude::new(patterns)
    }

    fn config(&self) -> Config {
        let mut config = Config::default().index(self.index.clone()).etag(self.etag);
        for (name, value) in &self.headers {
            config = config.add_header(name.clone(), value.clone());
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dirserve=info")))
        .init();

    let cli = Cli::parse();
    let exclude = cli.exclude()?;
    let config = cli.config();

    tracing::info!("serving {}", cli.root.display());
    let files = FileServer::new(Dir::new(&cli.root))
        .exclude(exclude)
        .config(config);

    dirserve::serve(files).run(cli.addr).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["dirserve"]);
        assert_eq!(cli.root, PathBuf::from("."));
        assert_eq!(cli.addr, "0.0.0.0:8000".parse::<SocketAddr>().unwrap());
        let exclude = cli.exclude().unwrap();
        assert!(exclude.is_match(".git"));
        assert!(!exclude.is_match("node_modules"));
    }

    #[test]
    fn cli_excludes() {
        let cli = Cli::parse_from(["dirserve", "--no-default-excludes", "-e", "^node_modules$"]);
        let exclude = cli.exclude().unwrap();
        assert!(!exclude.is_match(".git"));
        assert!(exclude.is_match("node_modules"));
    }

    #[test]
    fn cli_headers() {
        let cli = Cli::parse_from(["dirserve", "-H", "Cache-Control: max-age=60", "--etag"]);
        let config = cli.config();
        assert!(config.etag);
        assert_eq!(config.headers["cache-control"], "max-age=60");

        assert!(parse_header("no colon").is_err());
    }
}
