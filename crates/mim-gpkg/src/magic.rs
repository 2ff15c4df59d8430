//! Magic byte detection for SQLite / GeoPackage payloads

/// SQLite database header string, including the trailing NUL
pub const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";

/// Offset of the `application_id` field in the SQLite header
const APPLICATION_ID_OFFSET: usize = 68;

/// `application_id` values registered for GeoPackage
pub const GPKG_APPLICATION_IDS: &[(&[u8; 4], &str)] = &[
    (b"GPKG", "GeoPackage 1.2+"),
    (b"GP10", "GeoPackage 1.0"),
    (b"GP11", "GeoPackage 1.1"),
];

/// Check for the SQLite header
pub fn is_sqlite(data: &[u8]) -> bool {
    data.len() >= SQLITE_MAGIC.len() && &data[..SQLITE_MAGIC.len()] == SQLITE_MAGIC
}

/// Describe the GeoPackage flavour advertised by the header, if any.
///
/// Many tools write GeoPackages without setting `application_id`, so a
/// `None` here does not disqualify the payload.
pub fn geopackage_flavor(data: &[u8]) -> Option<&'static str> {
    if !is_sqlite(data) || data.len() < APPLICATION_ID_OFFSET + 4 {
        return None;
    }

    let id = &data[APPLICATION_ID_OFFSET..APPLICATION_ID_OFFSET + 4];
    GPKG_APPLICATION_IDS
        .iter()
        .find(|(magic, _)| id == magic.as_slice())
        .map(|(_, description)| *description)
}
