//! Static file service.
//!
//! Maps request paths onto files below a base directory. Paths containing `..` are refused with
//! `403`, directories are served through their `index.html` and files that cannot be found map
//! to `404`.
use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

use log::{debug, warn};

use crate::protocol::{Request, Response};

use super::Service;

const INDEX_FILE: &str = "index.html";

#[derive(Debug, Clone)]
pub struct FileService {
    base: PathBuf,
}

impl FileService {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Resolve a request path to a file below the base directory, or the status to answer with.
    fn resolve(&self, path: &str) -> Result<PathBuf, u16> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(403);
        }

        let mut file = self.base.join(relative);
        if file.is_dir() {
            file.push(INDEX_FILE);
        }
        Ok(file)
    }

    /// Fill in status and entity headers; returns the file path when it can be served.
    fn prepare(&self, request: &Request, response: &mut Response) -> Option<PathBuf> {
        let file = match self.resolve(request.path()) {
            Ok(file) => file,
            Err(status) => {
                debug!("refusing {}", request.path());
                response.set_status(status);
                return None;
            }
        };

        match fs::metadata(&file) {
            Ok(meta) if meta.is_file() => {
                let mime = mime_guess::from_path(&file).first_or_octet_stream();
                response.set_status(200);
                response.set_header("Content-Type", mime.essence_str());
                response.set_header("Content-Length", meta.len().to_string());
                Some(file)
            }
            Ok(_) => {
                response.set_status(404);
                None
            }
            Err(e) => {
                response.set_status(io_status(&e));
                None
            }
        }
    }
}

impl Service for FileService {
    fn head(&self, request: &Request, response: &mut Response) {
        self.prepare(request, response);
    }

    fn get(&self, request: &Request, response: &mut Response) {
        let Some(file) = self.prepare(request, response) else {
            return;
        };

        match fs::read(&file) {
            Ok(contents) => {
                response.set_header("Content-Length", contents.len().to_string());
                response.set_body(contents);
            }
            Err(e) => {
                warn!("failed to read {}: {e}", file.display());
                response.set_status(io_status(&e));
                response.set_header("Content-Length", "0");
            }
        }
    }
}

fn io_status(err: &io::Error) -> u16 {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => 404,
        _ => 500,
    }
}
