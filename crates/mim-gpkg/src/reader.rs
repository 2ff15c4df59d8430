//! SQLite-backed GeoPackage reader

use crate::{
    magic, Container, ContainerReader, FeatureRecord, GeometryHeader, GpkgError, GpkgResult,
    LayerInfo, LayerKind, LayerRecords,
};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::io::Write;
use tempfile::NamedTempFile;

/// Opens GeoPackage payloads with SQLite
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoPackageReader;

impl GeoPackageReader {
    pub fn new() -> Self {
        Self
    }
}

impl ContainerReader for GeoPackageReader {
    fn open(&self, payload: &[u8]) -> GpkgResult<Box<dyn Container>> {
        if !magic::is_sqlite(payload) {
            return Err(GpkgError::NotSqlite(payload.len()));
        }

        if let Some(flavor) = magic::geopackage_flavor(payload) {
            tracing::debug!("Payload advertises {}", flavor);
        }

        // SQLite needs a file; the payload is materialized privately and the
        // file is removed when the container is dropped.
        let mut file = NamedTempFile::new()?;
        file.write_all(payload)?;
        file.flush()?;

        let conn = Connection::open_with_flags(
            file.path(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        Ok(Box::new(GeoPackage { conn, _file: file }))
    }

    fn format_name(&self) -> &'static str {
        "GeoPackage"
    }
}

/// An opened GeoPackage. Field order matters: the connection closes before
/// the backing file is deleted.
struct GeoPackage {
    conn: Connection,
    _file: NamedTempFile,
}

impl GeoPackage {
    fn table_exists(&self, name: &str) -> GpkgResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Pick the identifier column: the integer primary key, else a column
    /// named `fid`, else the implicit rowid.
    fn identifier_column(columns: &[TableColumn]) -> String {
        columns
            .iter()
            .find(|c| c.pk && c.decl_type.to_ascii_uppercase().contains("INT"))
            .or_else(|| columns.iter().find(|c| c.name.eq_ignore_ascii_case("fid")))
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "rowid".to_string())
    }

    fn table_columns(&self, table: &str) -> GpkgResult<Vec<TableColumn>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
        let columns = stmt
            .query_map([], |row| {
                Ok(TableColumn {
                    name: row.get(1)?,
                    decl_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    pk: row.get::<_, i64>(5)? > 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }
}

struct TableColumn {
    name: String,
    decl_type: String,
    pk: bool,
}

impl Container for GeoPackage {
    fn layers(&self) -> GpkgResult<Vec<LayerInfo>> {
        if !self.table_exists("gpkg_contents")? {
            return Err(GpkgError::MissingTable("gpkg_contents".to_string()));
        }

        let sql = if self.table_exists("gpkg_geometry_columns")? {
            "SELECT c.table_name, c.data_type, g.column_name, g.geometry_type_name \
             FROM gpkg_contents c \
             LEFT JOIN gpkg_geometry_columns g ON g.table_name = c.table_name \
             ORDER BY c.rowid"
        } else {
            "SELECT table_name, data_type, NULL, NULL FROM gpkg_contents ORDER BY rowid"
        };

        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let layers = rows
            .into_iter()
            .filter_map(|(name, data_type, geometry_column, geometry_type)| {
                let kind = LayerKind::from_data_type(&data_type)?;
                Some(LayerInfo {
                    name,
                    kind,
                    geometry_column,
                    geometry_type,
                })
            })
            .collect();

        Ok(layers)
    }

    fn read_layer(&self, layer: &LayerInfo) -> GpkgResult<LayerRecords> {
        let columns = self.table_columns(&layer.name)?;
        if columns.is_empty() {
            return Err(GpkgError::MissingTable(layer.name.clone()));
        }

        let id_column = Self::identifier_column(&columns);
        let geometry_column = layer
            .geometry_column
            .as_ref()
            .filter(|g| columns.iter().any(|c| &c.name == *g))
            .cloned();

        let attribute_columns = columns
            .iter()
            .map(|c| c.name.clone())
            .filter(|name| *name != id_column && Some(name) != geometry_column.as_ref())
            .collect();

        let sql = match &geometry_column {
            Some(geom) => format!(
                "SELECT {}, {} FROM {}",
                quote_ident(&id_column),
                quote_ident(geom),
                quote_ident(&layer.name)
            ),
            None => format!(
                "SELECT {}, NULL FROM {}",
                quote_ident(&id_column),
                quote_ident(&layer.name)
            ),
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            let id: i64 = row.get(0)?;
            let geometry = match row.get_ref(1)? {
                ValueRef::Null => None,
                ValueRef::Blob(blob) => Some(GeometryHeader::parse(blob)?),
                other => {
                    return Err(GpkgError::InvalidGeometry(format!(
                        "feature {} holds a {:?} value instead of a geometry blob",
                        id,
                        other.data_type()
                    )))
                }
            };
            records.push(FeatureRecord { id, geometry });
        }

        Ok(LayerRecords {
            layer_name: layer.name.clone(),
            geometry_column,
            attribute_columns,
            records,
        })
    }
}

/// Quote an SQL identifier
fn quote_ident(name: &str) -> String {
    if name == "rowid" {
        return name.to_string();
    }
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::GeoPackageBuilder;

    #[test]
    fn test_rejects_non_sqlite_payload() {
        let reader = GeoPackageReader::new();
        assert!(matches!(
            reader.open(b"just some text"),
            Err(GpkgError::NotSqlite(14))
        ));
    }

    #[test]
    fn test_missing_contents_table() {
        let payload = GeoPackageBuilder::new().without_metadata_tables().build();
        let container = GeoPackageReader::new().open(&payload).unwrap();
        assert!(matches!(
            container.layers(),
            Err(GpkgError::MissingTable(t)) if t == "gpkg_contents"
        ));
    }

    #[test]
    fn test_enumerates_layers_in_contents_order() {
        let payload = GeoPackageBuilder::new()
            .attributes("lookup", &[1, 2])
            .points("point1", &[1, 2, 3])
            .build();

        let container = GeoPackageReader::new().open(&payload).unwrap();
        let layers = container.layers().unwrap();

        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].name, "lookup");
        assert_eq!(layers[0].kind, LayerKind::Attributes);
        assert_eq!(layers[0].geometry_column, None);
        assert_eq!(layers[1].name, "point1");
        assert_eq!(layers[1].geometry_column.as_deref(), Some("geom"));
        assert_eq!(layers[1].geometry_type.as_deref(), Some("POINT"));
    }

    #[test]
    fn test_reads_feature_records() {
        let payload = GeoPackageBuilder::new().points("point1", &[1, 2, 3]).build();
        let container = GeoPackageReader::new().open(&payload).unwrap();
        let layer = &container.layers().unwrap()[0];

        let records = container.read_layer(layer).unwrap();
        assert_eq!(records.identifiers(), vec![1, 2, 3]);
        assert_eq!(records.attribute_columns, vec!["name".to_string()]);
        assert!(records.has_geometry());
        assert_eq!(records.records[0].geometry.as_ref().unwrap().srs_id, 4326);
    }

    #[test]
    fn test_null_geometries_are_none() {
        let payload = GeoPackageBuilder::new()
            .geometry_blobs("empty_pts", &[(1, None), (2, None)])
            .build();
        let container = GeoPackageReader::new().open(&payload).unwrap();
        let layer = &container.layers().unwrap()[0];

        let records = container.read_layer(layer).unwrap();
        assert_eq!(records.len(), 2);
        assert!(!records.has_geometry());
    }

    #[test]
    fn test_corrupt_geometry_fails_layer() {
        let payload = GeoPackageBuilder::new()
            .geometry_blobs("broken", &[(1, Some(b"garbage!".to_vec()))])
            .build();
        let container = GeoPackageReader::new().open(&payload).unwrap();
        let layer = &container.layers().unwrap()[0];

        assert!(matches!(
            container.read_layer(layer),
            Err(GpkgError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_non_rowid_identifier_keeps_storage_order() {
        let payload = GeoPackageBuilder::new()
            .points_with_id_decl("shuffled", "fid INT PRIMARY KEY", &[3, 1, 2])
            .build();
        let container = GeoPackageReader::new().open(&payload).unwrap();
        let layer = &container.layers().unwrap()[0];

        let records = container.read_layer(layer).unwrap();
        assert_eq!(records.identifiers(), vec![3, 1, 2]);
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("point1"), "\"point1\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quote_ident("rowid"), "rowid");
    }
}
