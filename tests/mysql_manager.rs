#![cfg(feature = "mysql")]

use std::env;

use sql_manager::prelude::*;

// Needs a reachable server, e.g. TESTING_MYSQL_URL=mysql://root:pw@127.0.0.1:3306/sql_manager_test
fn mysql_url() -> Option<String> {
    env::var("TESTING_MYSQL_URL").ok().filter(|url| !url.is_empty())
}

#[test]
fn mysql_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let Some(url) = mysql_url() else {
        eprintln!("TESTING_MYSQL_URL not set, skipping");
        return Ok(());
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let db = DbManager::from_url(&url)?;
        assert_eq!(db.db_type(), DatabaseType::Mysql);

        db.create_table("sm_users")
            .add_string_len("username", 50)
            .add_boolean_default("active", true)
            .add_integer_default("loginCount", 0)
            .add_double("money")
            .table_constraint("UNIQUE KEY uq_sm_username (username)")
            .create_or_replace()
            .await?;
        assert!(db.table_exists("sm_users").await?);

        let id = db
            .insert("sm_users")
            .set_string("username", "johndoe")
            .set_boolean("active", true)
            .set_double("money", 100.5)
            .execute()
            .await?;
        assert_eq!(id, 1);

        assert!(db.select("sm_users", id).await?);
        assert_eq!(db.get_string("username", ""), "johndoe");
        assert!(db.get_boolean("active", false));
        assert_eq!(db.get_int("loginCount", -1), 0);

        let dupe = db
            .insert("sm_users")
            .set_string("username", "johndoe")
            .execute()
            .await;
        assert!(matches!(dupe, Err(SqlManagerError::StatementError { .. })));

        let changed = db
            .update("sm_users")
            .set_integer("loginCount", 4)
            .where_eq("username", "johndoe")
            .execute()
            .await?;
        assert_eq!(changed, 1);

        // RIGHT JOIN is native here; a self join keeps the fixture small
        let joined = db
            .query("sm_users")
            .select_columns(&["sm_users.username"])
            .right_join("sm_users AS other", "sm_users.id", "other.id")
            .count()
            .await?;
        assert_eq!(joined, 1);

        let columns = db.get_table_structure("sm_users").await?;
        assert_eq!(columns[0].name, "id");
        assert!(columns[0].primary_key);
        assert_eq!(columns[2].logical_type, Some(LogicalType::Boolean));

        db.truncate_table("sm_users").await?;
        let id = db
            .insert("sm_users")
            .set_string("username", "fresh")
            .execute()
            .await?;
        assert_eq!(id, 1);

        db.execute_batch("DROP TABLE sm_users").await?;
        db.close().await?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
