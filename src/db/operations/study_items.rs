use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::cache::CacheSlot;
use crate::db::store::StudyItem;
use crate::db::DatabaseProxy;

fn map_row(r: PgRow) -> StudyItem {
    StudyItem {
        id: r.get("id"),
        set_id: r.get("set_id"),
        word: r.get("word"),
        definition: r.get("definition"),
        mcq_options: r.get("mcq_options"),
        sentence_options: r.get("sentence_options"),
    }
}

pub async fn find_by_set(proxy: &DatabaseProxy, set_id: i64) -> Result<Vec<StudyItem>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT "id", "set_id", "word", "definition", "mcq_options", "sentence_options"
        FROM "flashcards"
        WHERE "set_id" = $1
        ORDER BY "id" ASC
        "#,
    )
    .bind(set_id)
    .fetch_all(proxy.pool())
    .await?;

    Ok(rows.into_iter().map(map_row).collect())
}

pub async fn update_cache_slot(
    proxy: &DatabaseProxy,
    item_id: i64,
    slot: CacheSlot,
    encoded: &str,
) -> Result<u64, sqlx::Error> {
    let sql = match slot {
        CacheSlot::McqOptions => r#"UPDATE "flashcards" SET "mcq_options" = $2 WHERE "id" = $1"#,
        CacheSlot::SentenceOptions => {
            r#"UPDATE "flashcards" SET "sentence_options" = $2 WHERE "id" = $1"#
        }
    };

    let result = sqlx::query(sql)
        .bind(item_id)
        .bind(encoded)
        .execute(proxy.pool())
        .await?;

    Ok(result.rows_affected())
}
