use anyhow::{Context, Result};
use sqlx::{MySql, MySqlPool, QueryBuilder, Row, Transaction};

use m2p_reconcile::{local_now, DownstreamStore, ReplaceCounts};

/// Read/write access to the PLUS serial registries.
///
/// Reads run on the pool's autocommit connections. A reimport begins its own
/// transaction on a separate pool connection (see [`PlusDb::begin_reimport`]),
/// so the rewrite never holds locks on the connection that scans the rest of
/// the window, and a reader only ever observes the imported set before or
/// after the commit.
pub struct PlusDb {
    pool: MySqlPool,
    import_source: String,
    entered_by: String,
}

impl PlusDb {
    pub fn new(
        pool: MySqlPool,
        import_source: impl Into<String>,
        entered_by: impl Into<String>,
    ) -> Self {
        Self {
            pool,
            import_source: import_source.into(),
            entered_by: entered_by.into(),
        }
    }

    /// Begin a scoped write transaction for one order code's reimport.
    ///
    /// The handle supports delete and insert against the imported-serials
    /// table; nothing becomes visible until [`ReimportTxn::commit`]. Dropping
    /// the handle on any earlier exit path rolls the transaction back.
    pub async fn begin_reimport(&self) -> Result<ReimportTxn<'_>> {
        let tx = self
            .pool
            .begin()
            .await
            .context("beginning PLUS reimport transaction failed")?;
        Ok(ReimportTxn {
            tx,
            import_source: &self.import_source,
            entered_by: &self.entered_by,
        })
    }
}

/// Transactional handle over the imported-serials table. Scope: exactly one
/// order code's delete + insert.
pub struct ReimportTxn<'a> {
    tx: Transaction<'a, MySql>,
    import_source: &'a str,
    entered_by: &'a str,
}

impl ReimportTxn<'_> {
    /// Delete every imported row for the order code. Returns the row count.
    pub async fn delete_imported(&mut self, order_code: &str) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM
                `物料扫码-SN库`
            WHERE
                `销售订单` = ?
            "#,
        )
        .bind(order_code)
        .execute(&mut *self.tx)
        .await
        .context("deleting imported serials failed")?;

        Ok(result.rows_affected())
    }

    /// Bulk-insert the serial codes for the order code, stamped with the
    /// provenance the store was constructed with and the current local time.
    /// Returns the row count.
    pub async fn insert_imported(
        &mut self,
        order_code: &str,
        item_code: &str,
        codes: &[String],
    ) -> Result<u64> {
        if codes.is_empty() {
            return Ok(0);
        }

        let entered_at = local_now();
        let mut qb: QueryBuilder<MySql> = QueryBuilder::new(
            "INSERT INTO `物料扫码-SN库` \
             (`销售订单`, `物料编码`, `SN码`, `导入来源`, `录入人`, `录入时间`) ",
        );
        qb.push_values(codes, |mut b, code| {
            b.push_bind(order_code)
                .push_bind(item_code)
                .push_bind(code.as_str())
                .push_bind(self.import_source)
                .push_bind(self.entered_by)
                .push_bind(entered_at);
        });

        let result = qb
            .build()
            .execute(&mut *self.tx)
            .await
            .context("inserting imported serials failed")?;

        Ok(result.rows_affected())
    }

    pub async fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .await
            .context("committing PLUS reimport transaction failed")
    }
}

#[async_trait::async_trait]
impl DownstreamStore for PlusDb {
    async fn imported_codes(&self, order_code: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT
                `SN码` AS `code`
            FROM
                `物料扫码-SN库`
            WHERE
                `销售订单` = ?
            "#,
        )
        .bind(order_code)
        .fetch_all(&self.pool)
        .await
        .context("imported_codes query failed")?;

        collect_codes(rows)
    }

    async fn incoming_codes(&self, order_code: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT
                `SN码` AS `code`
            FROM
                `物料扫码-库存`
            WHERE
                `销售订单` = ?
            "#,
        )
        .bind(order_code)
        .fetch_all(&self.pool)
        .await
        .context("incoming_codes query failed")?;

        collect_codes(rows)
    }

    async fn outgoing_codes(&self, order_code: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT
                `SN码` AS `code`
            FROM
                `物料扫码-出库`
            WHERE
                `销售订单` = ?
            "#,
        )
        .bind(order_code)
        .fetch_all(&self.pool)
        .await
        .context("outgoing_codes query failed")?;

        collect_codes(rows)
    }

    async fn replace_imported(
        &self,
        order_code: &str,
        item_code: &str,
        codes: &[String],
    ) -> Result<ReplaceCounts> {
        // Any error below drops the handle without commit => rollback, the
        // order's pre-existing rows stay intact.
        let mut txn = self.begin_reimport().await?;
        let deleted = txn.delete_imported(order_code).await?;
        let inserted = txn.insert_imported(order_code, item_code, codes).await?;
        txn.commit().await?;

        Ok(ReplaceCounts { deleted, inserted })
    }
}

fn collect_codes(rows: Vec<sqlx::mysql::MySqlRow>) -> Result<Vec<String>> {
    rows.into_iter()
        .map(|row| row.try_get("code").map_err(Into::into))
        .collect()
}
