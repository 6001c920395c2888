//! Content Services, free-form bilingual page sections
use chrono::Utc;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;

use errors::Error;
use models::*;
use repos::ReposFactory;
use services::types::ServiceFuture;
use services::{validate, Service};

pub trait ContentService {
    /// Returns content of a section
    fn get_content(&self, section: String) -> ServiceFuture<ContentBlock>;
    /// Creates or replaces content of a section
    fn update_content(&self, section: String, payload: UpdateContent) -> ServiceFuture<ContentBlock>;
}

fn check_section(section: &str) -> Result<(), FailureError> {
    validate_section(section).map_err(|e| {
        let mut errors = ::validator::ValidationErrors::new();
        errors.add("section", e);
        format_err!("Incorrect section {:?}", section).context(Error::Validate(errors)).into()
    })
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > ContentService for Service<T, M, F>
{
    fn get_content(&self, section: String) -> ServiceFuture<ContentBlock> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let content_blocks_repo = repo_factory.create_content_blocks_repo(&*conn, session);
            check_section(&section)
                .and_then(|_| content_blocks_repo.find(section.clone()))
                .and_then(|block| block.ok_or_else(|| format_err!("Section {} not found", section).context(Error::NotFound).into()))
                .map_err(|e: FailureError| e.context("Service content, get endpoint error occurred.").into())
        })
    }

    fn update_content(&self, section: String, payload: UpdateContent) -> ServiceFuture<ContentBlock> {
        let session = self.dynamic_context.session;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let content_blocks_repo = repo_factory.create_content_blocks_repo(&*conn, session);
            check_section(&section)
                .and_then(|_| validate(&payload))
                .and_then(|_| {
                    content_blocks_repo.upsert(UpsertContent {
                        section: section.clone(),
                        content: payload.content,
                        updated_at: Utc::now().naive_utc(),
                    })
                }).map(|block| {
                    info!("Content section {} updated", block.section);
                    block
                }).map_err(|e: FailureError| e.context("Service content, update endpoint error occurred.").into())
        })
    }
}
