//! Uploads Services, stores product and category images on the local disk
use std::fs;
use std::io::Write;
use std::path::Path;

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use failure::Fail;
use futures::future;
use r2d2::ManageConnection;
use uuid::Uuid;

use errors::Error;
use models::*;
use repos::acl::{self, ApplicationAcl};
use repos::legacy_acl::CheckScope;
use repos::types::RepoAcl;
use repos::ReposFactory;
use services::types::ServiceFuture;
use services::Service;

/// Image file received from a multipart form
#[derive(Clone, Debug)]
pub struct UploadedImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Public location of a stored file
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UploadedFile {
    pub url: String,
}

pub trait UploadsService {
    /// Stores image and returns its public URL
    fn upload_image(&self, image: UploadedImage) -> ServiceFuture<UploadedFile>;
}

struct UploadsScope;

impl CheckScope<Scope, UploadedImage> for UploadsScope {
    fn is_in_scope(&self, _user_id: i32, scope: &Scope, _obj: Option<&UploadedImage>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => false,
        }
    }
}

/// File extension for an `image/*` MIME type
pub fn image_extension(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next().unwrap_or("").trim().to_lowercase();
    let mut parts = essence.splitn(2, '/');
    match (parts.next(), parts.next()) {
        (Some("image"), Some(subtype)) if !subtype.is_empty() => Some(
            match subtype {
                "jpeg" | "pjpeg" => "jpg".to_string(),
                "svg+xml" => "svg".to_string(),
                "x-icon" | "vnd.microsoft.icon" => "ico".to_string(),
                other => other.chars().filter(|c| c.is_ascii_alphanumeric()).collect(),
            },
        ).filter(|extension: &String| !extension.is_empty()),
        _ => None,
    }
}

fn check_upload_allowed(session: SessionContext, image: &UploadedImage) -> Result<(), FailureError> {
    match session {
        SessionContext::Admin { id, role } => {
            let acl: &RepoAcl<UploadedImage> = &ApplicationAcl::new(vec![role.into()], id);
            acl::check(acl, Resource::Uploads, Action::Create, &UploadsScope, Some(image))
        }
        _ => Err(format_err!("Uploads require an admin session").context(Error::Unauthorized).into()),
    }
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > UploadsService for Service<T, M, F>
{
    fn upload_image(&self, image: UploadedImage) -> ServiceFuture<UploadedFile> {
        let session = self.dynamic_context.session;
        let uploads = self.static_context.config.uploads.clone();

        if let Err(e) = check_upload_allowed(session, &image) {
            return Box::new(future::err(e.context("Service uploads, upload_image endpoint error occurred.").into()));
        }
        let extension = match image_extension(&image.content_type) {
            Some(extension) => extension,
            None => {
                return Box::new(future::err(
                    format_err!("Unsupported content type {}", image.content_type)
                        .context(Error::UnsupportedMediaType)
                        .into(),
                ))
            }
        };
        if image.bytes.len() > uploads.max_size_bytes {
            return Box::new(future::err(
                format_err!("Image of {} bytes exceeds {} bytes", image.bytes.len(), uploads.max_size_bytes)
                    .context(Error::PayloadTooLarge)
                    .into(),
            ));
        }

        self.spawn_blocking(move || {
            let file_name = format!("{}.{}", Uuid::new_v4(), extension);
            let dir = Path::new(&uploads.dir);
            fs::create_dir_all(dir)
                .and_then(|_| fs::File::create(dir.join(&file_name)))
                .and_then(|mut file| file.write_all(&image.bytes))
                .map_err(|e| e.context(format!("Writing {} to {} failed", file_name, uploads.dir)))?;
            info!("Stored image {} ({} bytes)", file_name, image.bytes.len());
            Ok(UploadedFile {
                url: format!("{}/{}", uploads.public_url.trim_right_matches('/'), file_name),
            })
        })
    }
}

#[cfg(test)]
pub mod tests {
    use std::path::Path;

    use tokio_core::reactor::Core;

    use models::*;
    use repos::repo_factory::tests::*;
    use services::uploads::*;

    fn png(size: usize) -> UploadedImage {
        UploadedImage {
            content_type: "image/png".to_string(),
            bytes: vec![0x89; size],
        }
    }

    fn moderator() -> SessionContext {
        SessionContext::Admin {
            id: MOCK_ADMIN_ID,
            role: AdminRole::Moderator,
        }
    }

    #[test]
    fn test_extensions() {
        assert_eq!(image_extension("image/jpeg"), Some("jpg".to_string()));
        assert_eq!(image_extension("image/svg+xml"), Some("svg".to_string()));
        assert_eq!(image_extension("IMAGE/PNG; charset=binary"), Some("png".to_string()));
        assert_eq!(image_extension("application/pdf"), None);
        assert_eq!(image_extension("image/"), None);
    }

    #[test]
    fn test_upload_is_stored() {
        let mut core = Core::new().unwrap();
        let service = create_service(moderator());
        let uploaded = core.run(service.upload_image(png(16))).unwrap();
        assert!(uploaded.url.starts_with("/uploads/"));
        assert!(uploaded.url.ends_with(".png"));
        let file_name = uploaded.url.trim_left_matches("/uploads/");
        assert!(Path::new("target/test-uploads").join(file_name).exists());
    }

    #[test]
    fn test_pdf_is_unsupported() {
        let mut core = Core::new().unwrap();
        let service = create_service(moderator());
        let image = UploadedImage {
            content_type: "application/pdf".to_string(),
            bytes: vec![1, 2, 3],
        };
        let err = core.run(service.upload_image(image)).unwrap_err();
        assert_eq!(error_code(&err), 415);
    }

    #[test]
    fn test_large_image_is_rejected() {
        let mut core = Core::new().unwrap();
        let service = create_service(moderator());
        let err = core.run(service.upload_image(png(5 * 1024 * 1024 + 1))).unwrap_err();
        assert_eq!(error_code(&err), 413);
    }

    #[test]
    fn test_customer_can_not_upload() {
        let mut core = Core::new().unwrap();
        let service = create_service(SessionContext::Customer { id: MOCK_CUSTOMER_ID });
        let err = core.run(service.upload_image(png(16))).unwrap_err();
        assert_eq!(error_code(&err), 401);
    }
}
