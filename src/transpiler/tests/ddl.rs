use crate::error::SqlError;
use crate::schema::{Column, ColumnType, FkAction, ForeignKey, Index, Table, TableDiff};
use crate::transpiler::{Driver, MysqlDriver, PostgresDriver};
use pretty_assertions::assert_eq;

fn users() -> Table {
    Table::new("users")
        .column(Column::new("id", ColumnType::BigInt).serial())
        .column(Column::new("email", ColumnType::Varchar).not_null().max_length(120))
        .column(
            Column::new("status", ColumnType::Enum)
                .enum_values(["on", "off"])
                .default("'on'"),
        )
        .column(Column::new("team_id", ColumnType::Integer))
        .index(Index::primary(["id"]))
        .index(Index::unique(["email"]))
        .foreign_key(ForeignKey::new(["team_id"], "teams", ["id"]).on_delete(FkAction::SetNull))
}

#[test]
fn test_postgres_table_statements() {
    let driver = PostgresDriver::with_prefix("app_");
    let statements = driver.table_statements(&users()).unwrap();
    assert_eq!(
        statements,
        vec![
            "CREATE TABLE \"app_users\" (\"id\" BIGINT NOT NULL, \"email\" VARCHAR(120) NOT NULL, \
             \"status\" TEXT DEFAULT 'on', \"team_id\" INTEGER)",
            "ALTER TABLE \"app_users\" ADD CONSTRAINT \"app_users_pkey\" PRIMARY KEY (\"id\")",
            "ALTER TABLE \"app_users\" ALTER COLUMN \"id\" ADD GENERATED BY DEFAULT AS IDENTITY",
            "ALTER TABLE \"app_users\" ADD CONSTRAINT \"app_users_email_key\" UNIQUE (\"email\")",
            "ALTER TABLE \"app_users\" ADD CONSTRAINT \"app_users_status_enum\" \
             CHECK (\"status\" IN ('on', 'off'))",
            "ALTER TABLE \"app_users\" ADD CONSTRAINT \"app_users_team_id_fkey\" \
             FOREIGN KEY (\"team_id\") REFERENCES \"app_teams\" (\"id\") \
             ON UPDATE RESTRICT ON DELETE SET NULL",
        ]
    );
}

#[test]
fn test_mysql_table_statements() {
    let statements = MysqlDriver::new().table_statements(&users()).unwrap();
    assert_eq!(
        statements,
        vec![
            "CREATE TABLE `users` (`id` BIGINT NOT NULL, `email` VARCHAR(120) NOT NULL, \
             `status` ENUM('on', 'off') DEFAULT 'on', `team_id` INT)",
            "ALTER TABLE `users` ADD PRIMARY KEY (`id`)",
            "ALTER TABLE `users` MODIFY `id` BIGINT NOT NULL AUTO_INCREMENT",
            "CREATE UNIQUE INDEX `users_email_key` ON `users` (`email`)",
            "ALTER TABLE `users` ADD CONSTRAINT `users_team_id_fkey` \
             FOREIGN KEY (`team_id`) REFERENCES `teams` (`id`) \
             ON UPDATE RESTRICT ON DELETE SET NULL",
        ]
    );
}

#[test]
fn test_invalid_table_is_rejected_before_ddl() {
    let table = Table::new("t")
        .column(Column::new("id", ColumnType::Integer).serial())
        .column(Column::new("code", ColumnType::Varchar))
        .index(Index::primary(["code"]));
    let err = PostgresDriver::new().table_statements(&table).unwrap_err();
    assert!(matches!(err, SqlError::Validation(_)));
}

#[test]
fn test_unsupported_types() {
    let tiny = Table::new("t").column(Column::new("flag", ColumnType::TinyInt));
    assert!(matches!(
        PostgresDriver::new().table_statements(&tiny),
        Err(SqlError::UnsupportedType { backend: "postgres", .. })
    ));

    let uuid = Table::new("t").column(Column::new("id", ColumnType::Uuid));
    assert!(matches!(
        MysqlDriver::new().table_statements(&uuid),
        Err(SqlError::UnsupportedType { backend: "mysql", .. })
    ));
}

#[test]
fn test_diff_statements_drop_before_add() {
    let current = Table::new("posts")
        .column(Column::new("id", ColumnType::Integer).not_null())
        .column(Column::new("title", ColumnType::Text))
        .index(Index::primary(["id"]))
        .index(Index::index(["title"]));
    let target = Table::new("posts")
        .column(Column::new("id", ColumnType::Integer).serial())
        .column(Column::new("author_id", ColumnType::Integer))
        .index(Index::primary(["id"]))
        .foreign_key(ForeignKey::new(["author_id"], "users", ["id"]).on_delete(FkAction::Cascade));
    let diff = TableDiff::between(&current, &target);

    let statements = PostgresDriver::new().diff_statements(&diff).unwrap();
    assert_eq!(
        statements,
        vec![
            "DROP INDEX \"posts_title_idx\"",
            "ALTER TABLE \"posts\" DROP COLUMN \"title\"",
            "ALTER TABLE \"posts\" ADD COLUMN \"author_id\" INTEGER",
            "ALTER TABLE \"posts\" ALTER COLUMN \"id\" ADD GENERATED BY DEFAULT AS IDENTITY",
            "ALTER TABLE \"posts\" ADD CONSTRAINT \"posts_author_id_fkey\" \
             FOREIGN KEY (\"author_id\") REFERENCES \"users\" (\"id\") \
             ON UPDATE RESTRICT ON DELETE CASCADE",
        ]
    );
}

#[test]
fn test_mysql_drops() {
    let driver = MysqlDriver::new();
    assert_eq!(
        driver.drop_index("users", &Index::primary(["id"])),
        "ALTER TABLE `users` DROP PRIMARY KEY"
    );
    assert_eq!(
        driver.drop_index("users", &Index::unique(["email"])),
        "DROP INDEX `users_email_key` ON `users`"
    );
    assert_eq!(
        driver.drop_foreign_key("users", &ForeignKey::new(["team_id"], "teams", ["id"])),
        "ALTER TABLE `users` DROP FOREIGN KEY `users_team_id_fkey`"
    );
    assert_eq!(
        driver
            .drop_serial("users", &Column::new("id", ColumnType::BigInt).serial())
            .unwrap(),
        "ALTER TABLE `users` MODIFY `id` BIGINT NOT NULL"
    );
    assert_eq!(driver.drop_table("users"), "DROP TABLE `users`");
}

#[test]
fn test_add_enum_column_on_postgres() {
    let column = Column::new("mood", ColumnType::Enum).enum_values(["ok", "it's fine"]);
    assert_eq!(
        PostgresDriver::new().add_column("notes", &column).unwrap(),
        vec![
            "ALTER TABLE \"notes\" ADD COLUMN \"mood\" TEXT".to_string(),
            "ALTER TABLE \"notes\" ADD CONSTRAINT \"notes_mood_enum\" \
             CHECK (\"mood\" IN ('ok', 'it''s fine'))"
                .to_string(),
        ]
    );
}
