use futures::future::join_all;
use reqwest::{Client, StatusCode};
use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::manifest::Manifest;
use crate::mirror;
use crate::progress::ProgressTracker;
use crate::utils;

/// Why a single document could not be mirrored.
///
/// `Status` is the HTTP-level failure; `Request` and `Io` are transport-level.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("{path}: {status} from {url}")]
    Status {
        path: String,
        url: String,
        status: StatusCode,
    },

    #[error("{path}: request failed: {source}")]
    Request {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{path}: cannot write {}: {source}", dest.display())]
    Io {
        path: String,
        dest: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path}: not a relative document path")]
    InvalidPath { path: String },
}

impl DownloadError {
    /// Relative document path the failure belongs to.
    pub fn path(&self) -> &str {
        match self {
            Self::Status { path, .. }
            | Self::Request { path, .. }
            | Self::Io { path, .. }
            | Self::InvalidPath { path } => path,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A document written to disk.
#[derive(Debug, Clone)]
pub struct Saved {
    pub path: String,
    pub dest: PathBuf,
    pub size: usize,
}

/// Outcome of a whole run, in manifest order.
#[derive(Debug)]
pub struct Summary {
    pub total: usize,
    pub saved: Vec<Saved>,
    pub failures: Vec<DownloadError>,
}

impl Summary {
    fn from_outcomes(outcomes: Vec<Result<Saved, DownloadError>>) -> Self {
        let total = outcomes.len();
        let (saved, failures): (Vec<_>, Vec<_>) = outcomes.into_iter().partition(Result::is_ok);
        Self {
            total,
            saved: saved.into_iter().filter_map(Result::ok).collect(),
            failures: failures.into_iter().filter_map(Result::err).collect(),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.saved.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Process exit status: 0 when every document was saved, 1 otherwise.
    pub fn exit_status(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    pub fn render(&self, output_dir: &Path) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\n{}", "=".repeat(50));
        let bytes = self.saved.iter().map(|s| s.size).sum();
        let _ = writeln!(
            out,
            "Downloaded: {}/{} files ({})",
            self.succeeded(),
            self.total,
            utils::format_size(bytes)
        );

        if self.is_success() {
            let _ = writeln!(
                out,
                "\nDone! Documentation saved to {}/",
                output_dir.display()
            );
        } else {
            let _ = writeln!(out, "\nFailed downloads:");
            for failure in &self.failures {
                let _ = writeln!(out, "  ✗ {failure}");
            }
        }
        out
    }
}

pub struct Downloader {
    client: Client,
    manifest: Manifest,
    progress: ProgressTracker,
}

impl Downloader {
    pub fn new(manifest: Manifest, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            manifest,
            progress: ProgressTracker::hidden(),
        })
    }

    pub fn with_progress(mut self, progress: ProgressTracker) -> Self {
        self.progress = progress;
        self
    }

    /// Fetches one document and writes its body verbatim to the mirrored path,
    /// replacing whatever was there.
    #[instrument(skip(self))]
    pub async fn fetch_document(&self, doc: &str) -> Result<Saved, DownloadError> {
        let dest = mirror::destination_path(&self.manifest.output_dir, doc)?;
        let url = mirror::source_url(&self.manifest.base_url, doc);

        let io_error = |source: io::Error| DownloadError::Io {
            path: doc.to_string(),
            dest: dest.clone(),
            source,
        };

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        self.progress.println(format!("Downloading: {doc}"));
        debug!(%url, "sending request");

        let request_error = |source: reqwest::Error| DownloadError::Request {
            path: doc.to_string(),
            source,
        };

        let response = self.client.get(&url).send().await.map_err(request_error)?;
        let status = response.status();
        debug!(%status, "response received");

        if !status.is_success() {
            return Err(DownloadError::Status {
                path: doc.to_string(),
                url,
                status,
            });
        }

        let body = response.bytes().await.map_err(request_error)?;
        fs::write(&dest, &body).await.map_err(io_error)?;

        self.progress.println(format!(
            "  ✓ Saved to: {} [{}]",
            dest.display(),
            utils::format_size(body.len())
        ));
        info!(dest = %dest.display(), size = body.len(), "saved");

        Ok(Saved {
            path: doc.to_string(),
            dest,
            size: body.len(),
        })
    }

    /// Fetches every document concurrently and waits for all of them to settle.
    /// A failure never cancels its siblings.
    pub async fn download_all(&self) -> Summary {
        let outcomes = join_all(self.manifest.documents.iter().map(|doc| async move {
            let outcome = self.fetch_document(doc).await;
            match outcome {
                Ok(ref saved) => debug!(path = %saved.path, dest = %saved.dest.display(), "settled"),
                Err(ref e) => warn!(status = ?e.status(), error = %e, "download failed"),
            }
            self.progress.settle();
            outcome
        }))
        .await;
        self.progress.finish();

        Summary::from_outcomes(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn downloader(base: &str, root: &Path, documents: &'static [&'static str]) -> Downloader {
        let manifest = Manifest {
            base_url: Url::parse(base).unwrap(),
            output_dir: root.to_path_buf(),
            documents,
        };
        Downloader::new(manifest, Some(Duration::from_secs(10))).unwrap()
    }

    async fn serve(server: &MockServer, route: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_all_documents_saved() {
        let server = MockServer::start().await;
        serve(&server, "/overview/intro.md", ResponseTemplate::new(200).set_body_string("# Intro\n")).await;
        serve(&server, "/protocol/draft/schema.md", ResponseTemplate::new(200).set_body_string("schema")).await;

        let root = TempDir::new().unwrap();
        let summary = downloader(
            &server.uri(),
            root.path(),
            &["/overview/intro.md", "/protocol/draft/schema.md"],
        )
        .download_all()
        .await;

        assert_eq!(summary.exit_status(), 0);
        assert_eq!(summary.succeeded(), 2);
        assert_eq!(
            std::fs::read_to_string(root.path().join("overview/intro.md")).unwrap(),
            "# Intro\n"
        );
        assert_eq!(
            std::fs::read_to_string(root.path().join("protocol/draft/schema.md")).unwrap(),
            "schema"
        );

        let report = summary.render(root.path());
        assert!(report.contains("Downloaded: 2/2 files"));
        assert!(report.contains("Done! Documentation saved to"));
    }

    #[tokio::test]
    async fn test_one_ok_one_not_found() {
        let server = MockServer::start().await;
        serve(&server, "/a.md", ResponseTemplate::new(200).set_body_string("hello")).await;
        serve(&server, "/b.md", ResponseTemplate::new(404)).await;

        let root = TempDir::new().unwrap();
        let summary = downloader(&server.uri(), root.path(), &["/a.md", "/b.md"])
            .download_all()
            .await;

        assert_eq!(summary.exit_status(), 1);
        assert_eq!(
            std::fs::read_to_string(root.path().join("a.md")).unwrap(),
            "hello"
        );
        assert!(!root.path().join("b.md").exists());

        assert_eq!(summary.failures.len(), 1);
        let failure = &summary.failures[0];
        assert_eq!(failure.path(), "/b.md");
        assert_eq!(failure.status(), Some(StatusCode::NOT_FOUND));

        let report = summary.render(root.path());
        assert!(report.contains("Downloaded: 1/2 files"));
        assert!(report.contains("Failed downloads:"));
        assert!(report.contains("✗ /b.md: 404 Not Found"));
    }

    #[tokio::test]
    async fn test_failure_does_not_cancel_slow_sibling() {
        let server = MockServer::start().await;
        serve(&server, "/broken.md", ResponseTemplate::new(500)).await;
        serve(
            &server,
            "/slow.md",
            ResponseTemplate::new(200)
                .set_body_string("eventually")
                .set_delay(Duration::from_millis(300)),
        )
        .await;

        let root = TempDir::new().unwrap();
        let summary = downloader(&server.uri(), root.path(), &["/broken.md", "/slow.md"])
            .download_all()
            .await;

        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.saved[0].path, "/slow.md");
        assert_eq!(summary.failures[0].status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(
            std::fs::read_to_string(root.path().join("slow.md")).unwrap(),
            "eventually"
        );
    }

    #[tokio::test]
    async fn test_write_failure_is_isolated() {
        let server = MockServer::start().await;
        serve(&server, "/blocked/page.md", ResponseTemplate::new(200).set_body_string("x")).await;
        serve(&server, "/fine.md", ResponseTemplate::new(200).set_body_string("fine")).await;

        let root = TempDir::new().unwrap();
        // A regular file where a directory is needed.
        std::fs::write(root.path().join("blocked"), "not a directory").unwrap();

        let summary = downloader(&server.uri(), root.path(), &["/blocked/page.md", "/fine.md"])
            .download_all()
            .await;

        assert_eq!(summary.exit_status(), 1);
        assert!(matches!(summary.failures[0], DownloadError::Io { .. }));
        assert_eq!(summary.failures[0].path(), "/blocked/page.md");
        assert_eq!(
            std::fs::read_to_string(root.path().join("fine.md")).unwrap(),
            "fine"
        );
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_failure() {
        let root = TempDir::new().unwrap();
        let err = downloader("http://127.0.0.1:1", root.path(), &["/a.md"])
            .fetch_document("/a.md")
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Request { .. }));
        assert_eq!(err.status(), None);
        assert!(err.to_string().starts_with("/a.md: request failed"));
    }

    #[tokio::test]
    async fn test_rerun_overwrites_with_identical_bytes() {
        let body: &[u8] = &[0xff, 0x00, b'a', 0xfe, b'\n'];
        let server = MockServer::start().await;
        serve(&server, "/protocol/schema.md", ResponseTemplate::new(200).set_body_bytes(body)).await;

        let root = TempDir::new().unwrap();
        let dest = root.path().join("protocol/schema.md");
        std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
        std::fs::write(&dest, "stale content that is longer than the body").unwrap();

        let downloader = downloader(&server.uri(), root.path(), &["/protocol/schema.md"]);

        assert!(downloader.download_all().await.is_success());
        let first = std::fs::read(&dest).unwrap();
        assert_eq!(first, body);

        assert!(downloader.download_all().await.is_success());
        assert_eq!(std::fs::read(&dest).unwrap(), first);
    }

    #[tokio::test]
    async fn test_invalid_document_path_never_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let root = TempDir::new().unwrap();
        let summary = downloader(&server.uri(), root.path(), &["/../escape.md"])
            .download_all()
            .await;

        assert_eq!(summary.exit_status(), 1);
        assert!(matches!(summary.failures[0], DownloadError::InvalidPath { .. }));
    }
}
