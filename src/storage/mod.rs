use actix_multipart::form::tempfile::TempFile;
use log::{info, warn};
use uuid::Uuid;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "bmp", "gif", "svg", "webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// restaurant and driver photos
    Photo,
    ProductImage,
}

impl UploadKind {
    fn directory(&self) -> &'static str {
        match self {
            UploadKind::Photo => "images",
            UploadKind::ProductImage => "products",
        }
    }
}

/// A file received with a request that has not been moved into the upload
/// directory yet.
pub struct PendingUpload {
    source: Box<dyn AsRef<Path> + Send>,
    file_name: Option<String>,
    content_type: Option<String>,
}

impl From<TempFile> for PendingUpload {
    fn from(temp: TempFile) -> Self {
        PendingUpload::new(
            temp.file,
            temp.file_name,
            temp.content_type.map(|mime| mime.to_string()),
        )
    }
}

impl PendingUpload {
    pub fn new(
        source: impl AsRef<Path> + Send + 'static,
        file_name: Option<String>,
        content_type: Option<String>,
    ) -> PendingUpload {
        PendingUpload {
            source: Box::new(source),
            file_name,
            content_type,
        }
    }

    fn client_extension(&self) -> Option<String> {
        let name = self.file_name.as_deref()?;
        let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        if extension.is_empty()
            || extension.len() > 5
            || !extension.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return None;
        }
        Some(extension)
    }

    fn content_type_extension(&self) -> Option<String> {
        let subtype = self.content_type.as_deref()?.strip_prefix("image/")?;
        let subtype = subtype.split(';').next()?.trim();
        match subtype {
            "jpeg" => Some(String::from("jpg")),
            "svg+xml" => Some(String::from("svg")),
            other if IMAGE_EXTENSIONS.contains(&other) => Some(other.to_owned()),
            _ => None,
        }
    }

    pub fn is_image(&self) -> bool {
        let declared_image = self
            .content_type
            .as_deref()
            .map_or(false, |content_type| content_type.starts_with("image/"));

        declared_image
            || self
                .client_extension()
                .map_or(false, |ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
    }

    fn extension(&self) -> String {
        self.client_extension()
            .or_else(|| self.content_type_extension())
            .unwrap_or_else(|| String::from("img"))
    }
}

/// Upload directory on local disk. Files get random names so concurrent
/// uploads never overwrite each other.
#[derive(Debug, Clone)]
pub struct Uploads {
    root: PathBuf,
}

impl Uploads {
    pub fn new(root: impl Into<PathBuf>) -> Uploads {
        Uploads { root: root.into() }
    }

    pub fn prepare(&self) -> io::Result<()> {
        for kind in [UploadKind::Photo, UploadKind::ProductImage] {
            fs::create_dir_all(self.root.join(kind.directory()))?;
        }
        info!("[storage] uploads are written to {}", self.root.display());
        Ok(())
    }

    pub fn path_of(&self, kind: UploadKind, name: &str) -> PathBuf {
        self.root.join(kind.directory()).join(name)
    }

    /// Copies the upload into place and returns the stored file name.
    pub fn save(&self, kind: UploadKind, upload: &PendingUpload) -> io::Result<String> {
        let name = format!("{}.{}", Uuid::new_v4().simple(), upload.extension());
        let destination = self.path_of(kind, &name);

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        let source: &Path = (*upload.source).as_ref();
        fs::copy(source, &destination)?;

        info!("[storage] stored {}", destination.display());
        Ok(name)
    }

    /// Deletes a stored file whose record was never written.
    pub fn remove(&self, kind: UploadKind, name: &str) {
        let path = self.path_of(kind, name);
        match fs::remove_file(&path) {
            Ok(()) => info!("[storage] removed {}", path.display()),
            Err(e) => warn!("[storage] could not remove {}: {}", path.display(), e),
        }
    }
}
