//! PostgreSQL to unified data type conversion.
//!
//! Input is the `data_type` / `udt_name` pair from
//! `information_schema.columns`. Arrays report `ARRAY` with the element type
//! as `udt_name` prefixed by `_`; enums and other user-defined types report
//! `USER-DEFINED`.

use crate::adapters::RawColumn;
use crate::models::UnifiedDataType;

/// Maps a catalog column onto the unified type system.
///
/// Returns `None` for types outside the mapping; callers report those as
/// unsupported.
pub fn map_postgres_type(column: &RawColumn) -> Option<UnifiedDataType> {
    let udt_name = column.udt_name.as_deref().unwrap_or(&column.type_name);

    if column.is_enum {
        return Some(UnifiedDataType::Enumeration {
            name: udt_name.to_string(),
        });
    }

    match column.type_name.to_lowercase().as_str() {
        "array" => {
            let element = udt_name.strip_prefix('_').unwrap_or(udt_name);
            let element_type = map_type_name(element, None)?;
            Some(UnifiedDataType::Array {
                element_type: Box::new(element_type),
            })
        }
        "user-defined" => match map_type_name(udt_name, column.max_length) {
            Some(builtin) => Some(builtin),
            None => Some(UnifiedDataType::Custom {
                type_name: udt_name.to_string(),
            }),
        },
        data_type => map_type_name(data_type, column.max_length)
            .or_else(|| map_type_name(&udt_name.to_lowercase(), column.max_length)),
    }
}

fn map_type_name(type_name: &str, max_length: Option<u32>) -> Option<UnifiedDataType> {
    let unified = match type_name {
        "character varying" | "varchar" | "character" | "char" | "bpchar" => {
            UnifiedDataType::String { max_length }
        }
        "text" | "name" | "citext" => UnifiedDataType::String { max_length: None },
        "smallint" | "int2" => UnifiedDataType::Integer {
            bits: 16,
            signed: true,
        },
        "integer" | "int" | "int4" => UnifiedDataType::Integer {
            bits: 32,
            signed: true,
        },
        "bigint" | "int8" => UnifiedDataType::Integer {
            bits: 64,
            signed: true,
        },
        "real" | "float4" => UnifiedDataType::Float {
            precision: Some(24),
        },
        "double precision" | "float8" => UnifiedDataType::Float {
            precision: Some(53),
        },
        "numeric" | "decimal" | "money" => UnifiedDataType::Float { precision: None },
        "boolean" | "bool" => UnifiedDataType::Boolean,
        "timestamp without time zone" | "timestamp" => UnifiedDataType::DateTime {
            with_timezone: false,
        },
        "timestamp with time zone" | "timestamptz" => UnifiedDataType::DateTime {
            with_timezone: true,
        },
        "date" => UnifiedDataType::Date,
        "time without time zone" | "time" => UnifiedDataType::Time {
            with_timezone: false,
        },
        "time with time zone" | "timetz" => UnifiedDataType::Time {
            with_timezone: true,
        },
        "bytea" => UnifiedDataType::Binary { max_length: None },
        "json" | "jsonb" => UnifiedDataType::Json,
        "uuid" => UnifiedDataType::Uuid,
        "interval" | "inet" | "cidr" | "macaddr" | "macaddr8" | "xml" | "point" | "line"
        | "lseg" | "box" | "path" | "polygon" | "circle" => UnifiedDataType::Custom {
            type_name: type_name.to_string(),
        },
        _ => return None,
    };
    Some(unified)
}
