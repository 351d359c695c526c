//! Global substring search across contacts, properties and deals

use crate::db::deals::DEAL_LISTING_SQL;
use crate::db::escape_like;
use crate::db::properties::PROPERTY_SELECT;
use crate::models::{Contact, DealListing, Property};
use crate::Result;
use sqlx::SqlitePool;
use tracing::debug;

/// Maximum hits returned per entity type
pub const SEARCH_LIMIT: i64 = 20;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub contacts: Vec<Contact>,
    pub properties: Vec<Property>,
    pub deals: Vec<DealListing>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty() && self.properties.is_empty() && self.deals.is_empty()
    }

    pub fn total(&self) -> usize {
        self.contacts.len() + self.properties.len() + self.deals.len()
    }
}

/// Case-insensitive substring search. A blank query matches nothing.
pub async fn search(pool: &SqlitePool, query: &str) -> Result<SearchResults> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(SearchResults::default());
    }

    let pattern = format!("%{}%", escape_like(query));

    let contacts = sqlx::query_as::<_, Contact>(
        r#"
        SELECT * FROM contacts
        WHERE name LIKE ?1 ESCAPE '\' OR company LIKE ?1 ESCAPE '\' OR email LIKE ?1 ESCAPE '\'
        ORDER BY name COLLATE NOCASE, id
        LIMIT ?2
        "#,
    )
    .bind(&pattern)
    .bind(SEARCH_LIMIT)
    .fetch_all(pool)
    .await?;

    let sql = format!(
        r#"{}
        WHERE address LIKE ?1 ESCAPE '\' OR city LIKE ?1 ESCAPE '\' OR name LIKE ?1 ESCAPE '\'
        ORDER BY address COLLATE NOCASE, id
        LIMIT ?2
        "#,
        PROPERTY_SELECT
    );
    let properties = sqlx::query_as::<_, Property>(&sql)
        .bind(&pattern)
        .bind(SEARCH_LIMIT)
        .fetch_all(pool)
        .await?;

    let sql = format!(
        r#"{}
        WHERE d.deal_name LIKE ?1 ESCAPE '\'
        ORDER BY d.deal_name COLLATE NOCASE, d.id
        LIMIT ?2
        "#,
        DEAL_LISTING_SQL
    );
    let deals = sqlx::query_as::<_, DealListing>(&sql)
        .bind(&pattern)
        .bind(SEARCH_LIMIT)
        .fetch_all(pool)
        .await?;

    let results = SearchResults {
        contacts,
        properties,
        deals,
    };
    debug!("Search {:?} matched {} record(s)", query, results.total());
    Ok(results)
}
