//! Short random identifiers and URL slugs.

use rand::{distributions::Alphanumeric, Rng};
use sea_orm::{ConnectionTrait, EntityTrait, PrimaryKeyTrait};

use crate::errors::ModelError;

pub const USER_ID_LEN: usize = 12;
pub const EVENT_ID_LEN: usize = 8;
pub const ORDER_ID_LEN: usize = 8;
pub const REVIEW_ID_LEN: usize = 8;
pub const REPORT_ID_LEN: usize = 10;

const MAX_ID_ATTEMPTS: usize = 16;

/// Random ASCII alphanumeric string of `len` characters.
pub fn random_id(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generate a primary key for `E` that is not yet taken.
pub async fn unique_id<E, C>(db: &C, len: usize) -> Result<String, ModelError>
where
    E: EntityTrait,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = String>,
    C: ConnectionTrait,
{
    for _ in 0..MAX_ID_ATTEMPTS {
        let id = random_id(len);
        if E::find_by_id(id.clone()).one(db).await?.is_none() {
            return Ok(id);
        }
        tracing::debug!(table = %E::default().table_name(), "id collision, retrying");
    }
    Err(ModelError::Db(format!("could not allocate a unique id of length {len}")))
}

/// Lowercase ASCII slug: alphanumerics kept, runs of anything else become a
/// single `-`, no leading or trailing dash.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}
