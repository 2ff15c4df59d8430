//! GeoPackage fixture builder for tests

use crate::geometry::encode_point;
use rusqlite::{params, Connection};

enum Table {
    Features {
        name: String,
        id_decl: String,
        rows: Vec<(i64, Option<Vec<u8>>)>,
    },
    Attributes {
        name: String,
        ids: Vec<i64>,
    },
}

/// Builds small GeoPackages in memory
pub struct GeoPackageBuilder {
    metadata_tables: bool,
    tables: Vec<Table>,
}

impl Default for GeoPackageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoPackageBuilder {
    pub fn new() -> Self {
        Self {
            metadata_tables: true,
            tables: Vec::new(),
        }
    }

    /// Produce a plain SQLite database without `gpkg_*` tables
    pub fn without_metadata_tables(mut self) -> Self {
        self.metadata_tables = false;
        self
    }

    /// Point layer with one geometry per id
    pub fn points(self, name: &str, ids: &[i64]) -> Self {
        self.points_with_id_decl(name, "fid INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL", ids)
    }

    /// Point layer whose identifier column is declared with `id_decl`
    pub fn points_with_id_decl(mut self, name: &str, id_decl: &str, ids: &[i64]) -> Self {
        let rows = ids
            .iter()
            .map(|&id| (id, Some(encode_point(4326, id as f64, id as f64 * 2.0))))
            .collect();
        self.tables.push(Table::Features {
            name: name.to_string(),
            id_decl: id_decl.to_string(),
            rows,
        });
        self
    }

    /// Feature layer with raw geometry blobs (`None` stores NULL)
    pub fn geometry_blobs(mut self, name: &str, rows: &[(i64, Option<Vec<u8>>)]) -> Self {
        self.tables.push(Table::Features {
            name: name.to_string(),
            id_decl: "fid INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL".to_string(),
            rows: rows.to_vec(),
        });
        self
    }

    /// Attribute-only layer
    pub fn attributes(mut self, name: &str, ids: &[i64]) -> Self {
        self.tables.push(Table::Attributes {
            name: name.to_string(),
            ids: ids.to_vec(),
        });
        self
    }

    /// Write the database and return its bytes
    pub fn build(self) -> Vec<u8> {
        let dir = tempfile::tempdir().expect("create fixture dir");
        let path = dir.path().join("fixture.gpkg");

        {
            let conn = Connection::open(&path).expect("open fixture database");
            if self.metadata_tables {
                create_metadata_tables(&conn);
            } else {
                conn.execute_batch("CREATE TABLE unrelated (id INTEGER PRIMARY KEY, note TEXT);")
                    .expect("create unrelated table");
            }
            for table in &self.tables {
                write_table(&conn, table);
            }
        }

        std::fs::read(&path).expect("read fixture database")
    }
}

fn create_metadata_tables(conn: &Connection) {
    conn.execute_batch(
        "PRAGMA application_id = 1196444487;
         PRAGMA user_version = 10200;
         CREATE TABLE gpkg_spatial_ref_sys (
             srs_name TEXT NOT NULL,
             srs_id INTEGER PRIMARY KEY,
             organization TEXT NOT NULL,
             organization_coordsys_id INTEGER NOT NULL,
             definition TEXT NOT NULL,
             description TEXT
         );
         INSERT INTO gpkg_spatial_ref_sys VALUES
             ('WGS 84 geodetic', 4326, 'EPSG', 4326, 'GEOGCS[\"WGS 84\"]', NULL);
         CREATE TABLE gpkg_contents (
             table_name TEXT NOT NULL PRIMARY KEY,
             data_type TEXT NOT NULL,
             identifier TEXT UNIQUE,
             description TEXT DEFAULT '',
             last_change DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
             min_x DOUBLE, min_y DOUBLE, max_x DOUBLE, max_y DOUBLE,
             srs_id INTEGER
         );
         CREATE TABLE gpkg_geometry_columns (
             table_name TEXT NOT NULL,
             column_name TEXT NOT NULL,
             geometry_type_name TEXT NOT NULL,
             srs_id INTEGER NOT NULL,
             z TINYINT NOT NULL,
             m TINYINT NOT NULL,
             CONSTRAINT pk_geom_cols PRIMARY KEY (table_name, column_name)
         );",
    )
    .expect("create gpkg metadata tables");
}

fn write_table(conn: &Connection, table: &Table) {
    match table {
        Table::Features { name, id_decl, rows } => {
            conn.execute_batch(&format!(
                "CREATE TABLE \"{name}\" ({id_decl}, geom POINT, name TEXT);"
            ))
            .expect("create feature table");
            conn.execute(
                "INSERT INTO gpkg_contents (table_name, data_type, identifier, srs_id)
                 VALUES (?1, 'features', ?1, 4326)",
                params![name],
            )
            .expect("register feature table");
            conn.execute(
                "INSERT INTO gpkg_geometry_columns VALUES (?1, 'geom', 'POINT', 4326, 0, 0)",
                params![name],
            )
            .expect("register geometry column");
            for (id, geom) in rows {
                conn.execute(
                    &format!("INSERT INTO \"{name}\" (fid, geom, name) VALUES (?1, ?2, ?3)"),
                    params![id, geom, format!("feature {id}")],
                )
                .expect("insert feature");
            }
        }
        Table::Attributes { name, ids } => {
            conn.execute_batch(&format!(
                "CREATE TABLE \"{name}\" (fid INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL, label TEXT);"
            ))
            .expect("create attribute table");
            conn.execute(
                "INSERT INTO gpkg_contents (table_name, data_type, identifier)
                 VALUES (?1, 'attributes', ?1)",
                params![name],
            )
            .expect("register attribute table");
            for id in ids {
                conn.execute(
                    &format!("INSERT INTO \"{name}\" (fid, label) VALUES (?1, ?2)"),
                    params![id, format!("row {id}")],
                )
                .expect("insert attribute row");
            }
        }
    }
}
