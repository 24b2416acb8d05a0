//! Server endpoint launching: local process, container, or TCP.
//!
//! The three launch modes differ only in how the byte streams are
//! obtained and how workspace paths appear to the server; everything
//! above this module sees one `Endpoint`.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use lsp_types::Url;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::config::{ServerConfig, ServerMode};
use crate::error::SessionError;

/// Mount point used for the workspace inside server containers.
pub const DOCKER_WORKSPACE: &str = "/workspace";

pub type BoxedReader = BufReader<Box<dyn AsyncRead + Send + Unpin>>;
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// One live connection to a language server.
pub struct Endpoint {
    pub reader: BoxedReader,
    pub writer: BoxedWriter,
    child: Option<Child>,
    /// Root path as the server sees it (differs from the local root in
    /// docker mode).
    remote_root: Option<String>,
}

impl Endpoint {
    /// Launches or connects to the endpoint described by `config`.
    pub async fn launch(config: &ServerConfig, root: &Path) -> Result<Self, SessionError> {
        match &config.mode {
            ServerMode::Stdio => Self::spawn_local(config, root),
            ServerMode::Docker => Self::spawn_docker(config, root),
            ServerMode::Tcp { address } => Self::connect_tcp(address).await,
        }
    }

    fn spawn_local(config: &ServerConfig, root: &Path) -> Result<Self, SessionError> {
        let program = config
            .command
            .first()
            .ok_or_else(|| SessionError::Start(format!("no command for {}", config.language)))?;
        debug!(language = %config.language, command = %config.command.join(" "), "spawning language server");

        let child = Command::new(program)
            .args(&config.command[1..])
            .current_dir(root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SessionError::Start(format!("cannot launch '{program}': {e}")))?;

        Self::from_child(child, None)
    }

    fn spawn_docker(config: &ServerConfig, root: &Path) -> Result<Self, SessionError> {
        let image = config.docker_image.as_deref().ok_or_else(|| {
            SessionError::Start(format!("no docker image configured for {}", config.language))
        })?;
        let mount = format!("{}:{}", root.display(), DOCKER_WORKSPACE);
        debug!(language = %config.language, image, "starting containerized language server");

        let mut command = Command::new("docker");
        command
            .args(["run", "--rm", "-i", "-v", &mount, "-w", DOCKER_WORKSPACE])
            .arg(image);
        // Server arguments ride after the image name.
        if config.command.len() > 1 {
            command.args(&config.command[1..]);
        }
        let child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SessionError::Start(format!("cannot launch container '{image}': {e}")))?;

        Self::from_child(child, Some(DOCKER_WORKSPACE.to_string()))
    }

    fn from_child(mut child: Child, remote_root: Option<String>) -> Result<Self, SessionError> {
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SessionError::Start("server stdin not captured".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SessionError::Start("server stdout not captured".into()))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(drain_stderr(stderr));
        }
        Ok(Self {
            reader: BufReader::new(Box::new(stdout) as Box<dyn AsyncRead + Send + Unpin>),
            writer: Box::new(stdin),
            child: Some(child),
            remote_root,
        })
    }

    async fn connect_tcp(address: &str) -> Result<Self, SessionError> {
        let stream = TcpStream::connect(address)
            .await
            .map_err(|e| SessionError::Start(format!("cannot connect to {address}: {e}")))?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(Box::new(read_half) as Box<dyn AsyncRead + Send + Unpin>),
            writer: Box::new(write_half),
            child: None,
            remote_root: None,
        })
    }

    /// Root path from the server's point of view.
    pub fn remote_root(&self) -> Option<&str> {
        self.remote_root.as_deref()
    }

    /// Splits the endpoint into its streams; the caller takes over the
    /// child handle for reaping.
    pub fn into_parts(self) -> (BoxedReader, BoxedWriter, Option<Child>) {
        (self.reader, self.writer, self.child)
    }
}

/// Keeps the child's stderr drained so a chatty server cannot block on
/// a full pipe; lines surface in debug logs.
async fn drain_stderr(stderr: tokio::process::ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!(target: "scribe_lsp::server_stderr", "{line}");
    }
}

/// Builds the file URI for `rel_path` as the server expects it.
pub fn server_uri(
    root: &Path,
    remote_root: Option<&str>,
    rel_path: &Path,
) -> Result<Url, SessionError> {
    match remote_root {
        Some(remote) => {
            let rel = rel_path.to_string_lossy().replace('\\', "/");
            Url::parse(&format!("file://{remote}/{rel}"))
                .map_err(|e| SessionError::Protocol(format!("bad remote uri: {e}")))
        }
        None => Url::from_file_path(root.join(rel_path))
            .map_err(|_| SessionError::Protocol(format!("unrepresentable path {rel_path:?}"))),
    }
}

/// Maps a URI from a server response back to a project-relative path.
///
/// Understands both real workspace paths and the `/workspace` mount
/// used in docker mode. URIs pointing outside the project (standard
/// library, dependencies) map to `None`.
pub fn project_relative(uri: &Url, root: &Path) -> Option<PathBuf> {
    if uri.scheme() != "file" {
        warn!(%uri, "ignoring non-file uri in server response");
        return None;
    }
    let path = uri.to_file_path().ok()?;
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_path_buf());
    }
    if let Ok(rel) = path.strip_prefix(DOCKER_WORKSPACE) {
        return Some(rel.to_path_buf());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_uri_points_into_root() {
        let root = Path::new("/tmp/project");
        let uri = server_uri(root, None, Path::new("src/app.py")).unwrap();
        assert_eq!(uri.as_str(), "file:///tmp/project/src/app.py");
    }

    #[test]
    fn docker_uri_uses_mount_point() {
        let root = Path::new("/tmp/project");
        let uri = server_uri(root, Some(DOCKER_WORKSPACE), Path::new("src/app.py")).unwrap();
        assert_eq!(uri.as_str(), "file:///workspace/src/app.py");
    }

    #[test]
    fn relative_mapping_handles_both_roots() {
        let root = Path::new("/tmp/project");
        let local = Url::parse("file:///tmp/project/src/app.py").unwrap();
        let mounted = Url::parse("file:///workspace/src/app.py").unwrap();
        let foreign = Url::parse("file:///usr/lib/python3.12/json/__init__.py").unwrap();

        assert_eq!(
            project_relative(&local, root),
            Some(PathBuf::from("src/app.py"))
        );
        assert_eq!(
            project_relative(&mounted, root),
            Some(PathBuf::from("src/app.py"))
        );
        assert_eq!(project_relative(&foreign, root), None);
    }
}
