//! Repo for content_blocks table
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use models::*;
use repos::acl;
use repos::legacy_acl::CheckScope;
use repos::types::{RepoAcl, RepoResult};
use schema::content_blocks::dsl::*;

/// Content blocks repository
pub struct ContentBlocksRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<ContentBlock>>,
}

pub trait ContentBlocksRepo {
    /// Find section content
    fn find(&self, section_arg: String) -> RepoResult<Option<ContentBlock>>;

    /// Inserts or replaces section content
    fn upsert(&self, payload: UpsertContent) -> RepoResult<ContentBlock>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ContentBlocksRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<ContentBlock>>) -> Self {
        Self { db_conn, acl }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ContentBlocksRepo for ContentBlocksRepoImpl<'a, T> {
    fn find(&self, section_arg: String) -> RepoResult<Option<ContentBlock>> {
        debug!("Find content of section {}.", section_arg);
        content_blocks
            .filter(section.eq(&section_arg))
            .get_result::<ContentBlock>(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<ContentBlock>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::ContentBlocks, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find content of section {} error occurred", section_arg)).into())
    }

    fn upsert(&self, payload: UpsertContent) -> RepoResult<ContentBlock> {
        debug!("Upsert content of section {}.", payload.section);
        acl::check(&*self.acl, Resource::ContentBlocks, Action::Update, self, None)
            .and_then(|_| {
                diesel::insert_into(content_blocks)
                    .values(&payload)
                    .on_conflict(section)
                    .do_update()
                    .set(&payload)
                    .get_result::<ContentBlock>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Upsert content of section {} error occurred", payload.section)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, ContentBlock>
    for ContentBlocksRepoImpl<'a, T>
{
    fn is_in_scope(&self, _user_id: i32, scope: &Scope, _obj: Option<&ContentBlock>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => false,
        }
    }
}
