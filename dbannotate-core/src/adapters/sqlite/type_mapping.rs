//! SQLite declared type to unified data type conversion.
//!
//! SQLite derives a column's affinity from its declared type name:
//! 1. Contains "INT" -> INTEGER
//! 2. Contains "CHAR", "CLOB", or "TEXT" -> TEXT
//! 3. Contains "BLOB" or no type at all -> BLOB
//! 4. Contains "REAL", "FLOA", or "DOUB" -> REAL
//! 5. Otherwise -> NUMERIC
//!
//! Well-known names with NUMERIC affinity (BOOLEAN, DATE, JSON, ...) are
//! mapped to their intended unified type before rule 5 applies.

use crate::adapters::parse_type_with_length;
use crate::models::UnifiedDataType;

/// Maps a declared SQLite type onto the unified type system.
///
/// Every declaration maps to something; names outside the affinity rules
/// become [`UnifiedDataType::Custom`].
///
/// # Example
/// ```rust
/// use dbannotate_core::adapters::sqlite::map_sqlite_type;
/// use dbannotate_core::models::UnifiedDataType;
///
/// let unified = map_sqlite_type("VARCHAR(255)");
/// assert_eq!(unified, UnifiedDataType::String { max_length: Some(255) });
/// ```
pub fn map_sqlite_type(sqlite_type: &str) -> UnifiedDataType {
    let upper = sqlite_type.trim().to_uppercase();
    if upper.is_empty() {
        return UnifiedDataType::Binary { max_length: None };
    }

    let (base, length) = parse_type_with_length(&upper);

    if base.contains("INT") {
        return map_integer_type(&base);
    }
    if base.contains("CHAR") || base.contains("CLOB") || base.contains("TEXT") {
        return UnifiedDataType::String { max_length: length };
    }
    if base.contains("BLOB") {
        return UnifiedDataType::Binary { max_length: length };
    }
    if base == "FLOAT" {
        return UnifiedDataType::Float {
            precision: Some(24),
        };
    }
    if base.contains("REAL") || base.contains("FLOA") || base.contains("DOUB") {
        return UnifiedDataType::Float {
            precision: Some(53),
        };
    }

    match base.as_str() {
        "BOOLEAN" | "BOOL" => UnifiedDataType::Boolean,
        "DATE" => UnifiedDataType::Date,
        "TIME" => UnifiedDataType::Time {
            with_timezone: false,
        },
        "DATETIME" | "TIMESTAMP" => UnifiedDataType::DateTime {
            with_timezone: false,
        },
        "JSON" | "JSONB" => UnifiedDataType::Json,
        "UUID" | "GUID" => UnifiedDataType::Uuid,
        "BINARY" | "VARBINARY" => UnifiedDataType::Binary { max_length: length },
        "STRING" => UnifiedDataType::String { max_length: length },
        other if other.contains("NUM") || other.contains("DEC") => {
            UnifiedDataType::Float { precision: None }
        }
        _ => UnifiedDataType::Custom {
            type_name: sqlite_type.trim().to_string(),
        },
    }
}

fn map_integer_type(type_name: &str) -> UnifiedDataType {
    let bits = match type_name {
        "TINYINT" => 8,
        "SMALLINT" | "INT2" => 16,
        "MEDIUMINT" | "INT3" => 24,
        "INT" | "INTEGER" | "INT4" => 32,
        // BIGINT, INT8 and anything else with INT use SQLite's 64-bit storage
        _ => 64,
    };
    UnifiedDataType::Integer { bits, signed: true }
}
