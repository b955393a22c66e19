use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                email       TEXT NOT NULL UNIQUE COLLATE NOCASE,
                name        TEXT NOT NULL,
                password    TEXT NOT NULL,
                is_admin    INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- Owners come from the identity provider, which may not be backed
            -- by the users table, so owner_user_id is not a foreign key.
            CREATE TABLE stores (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL,
                owner_user_id   TEXT NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_stores_owner ON stores(owner_user_id, created_at);

            CREATE TABLE billboards (
                id          TEXT PRIMARY KEY,
                store_id    TEXT NOT NULL REFERENCES stores(id) ON DELETE CASCADE,
                label       TEXT NOT NULL,
                image_url   TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_billboards_store ON billboards(store_id, created_at);

            CREATE TABLE categories (
                id              TEXT PRIMARY KEY,
                store_id        TEXT NOT NULL REFERENCES stores(id) ON DELETE CASCADE,
                name            TEXT NOT NULL,
                billboard_id    TEXT NOT NULL REFERENCES billboards(id),
                created_at      TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_categories_store ON categories(store_id, created_at);
            CREATE INDEX idx_categories_billboard ON categories(billboard_id);

            CREATE TABLE products (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                description TEXT NOT NULL,
                price       TEXT NOT NULL,
                category    TEXT NOT NULL,
                pictures    TEXT NOT NULL DEFAULT '[]',
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_products_category ON products(category, created_at);

            CREATE TABLE cart_items (
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                product_id  TEXT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
                quantity    INTEGER NOT NULL,
                PRIMARY KEY (user_id, product_id)
            );

            CREATE TABLE orders (
                id              TEXT PRIMARY KEY,
                owner_user_id   TEXT NOT NULL REFERENCES users(id),
                county          TEXT NOT NULL,
                constituency    TEXT NOT NULL,
                local_area      TEXT NOT NULL,
                status          TEXT NOT NULL DEFAULT 'processing',
                item_count      INTEGER NOT NULL,
                total           TEXT NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_orders_owner ON orders(owner_user_id, created_at);

            -- Line items keep their own price snapshot; product_id is not a
            -- foreign key so deleting a product leaves order history intact.
            CREATE TABLE order_items (
                order_id    TEXT NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
                product_id  TEXT NOT NULL,
                quantity    INTEGER NOT NULL,
                unit_price  TEXT NOT NULL,
                PRIMARY KEY (order_id, product_id)
            );

            CREATE TABLE notifications (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                message     TEXT NOT NULL,
                status      TEXT NOT NULL DEFAULT 'unread',
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_notifications_user ON notifications(user_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
