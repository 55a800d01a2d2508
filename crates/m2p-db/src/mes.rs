use anyhow::{Context, Result};
use sqlx::{MySqlPool, Row};

use m2p_reconcile::{Barcode, BarcodeBatch, TimeWindow, UpstreamSource};

/// Read-only access to the MES barcode registry.
///
/// The inventory-category filter is fixed at construction: the job has only
/// ever run against one category and the restriction is part of the batch
/// selection, not of an individual query.
pub struct MesDb {
    pool: MySqlPool,
    category_id: i64,
}

impl MesDb {
    pub fn new(pool: MySqlPool, category_id: i64) -> Self {
        Self { pool, category_id }
    }
}

#[async_trait::async_trait]
impl UpstreamSource for MesDb {
    async fn recent_batches(&self, window: TimeWindow) -> Result<Vec<BarcodeBatch>> {
        let rows = sqlx::query(
            r#"
            SELECT
                t1.bc_id,
                t3.task_code,
                t1.inv_code,
                t1.inv_name,
                t3.order_code
            FROM
                `jgmes_barcode_create` AS t1
                LEFT JOIN `jgmes_modeling_inventory` AS t2 ON t2.inv_code = t1.inv_code
                LEFT JOIN `jgmes_pm_production_task` AS t3 ON t3.task_code = t1.bill_code
            WHERE
                t1.last_update_date BETWEEN ? AND ?
                AND t2.ic_id = ?
            ORDER BY
                t1.last_update_date DESC
            "#,
        )
        .bind(window.start)
        .bind(window.end)
        .bind(self.category_id)
        .fetch_all(&self.pool)
        .await
        .context("recent_batches query failed")?;

        let mut batches = Vec::with_capacity(rows.len());
        for row in rows {
            batches.push(BarcodeBatch {
                batch_id: row.try_get("bc_id")?,
                // LEFT JOIN: a batch whose bill_code no longer resolves to a
                // production task carries no order string.
                raw_order: row
                    .try_get::<Option<String>, _>("order_code")?
                    .unwrap_or_default(),
                item_code: row.try_get("inv_code")?,
                item_name: row.try_get("inv_name")?,
                task_code: row.try_get("task_code")?,
            });
        }
        Ok(batches)
    }

    async fn batch_barcodes(&self, batch_id: i64) -> Result<Vec<Barcode>> {
        let rows = sqlx::query(
            r#"
            SELECT
                bd_id,
                `code`
            FROM
                jgmes_barcode_data
            WHERE
                bc_id = ?
                AND delete_flag = 0
            "#,
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await
        .context("batch_barcodes query failed")?;

        let mut barcodes = Vec::with_capacity(rows.len());
        for row in rows {
            barcodes.push(Barcode {
                barcode_id: row.try_get("bd_id")?,
                code: row.try_get("code")?,
            });
        }
        Ok(barcodes)
    }
}
