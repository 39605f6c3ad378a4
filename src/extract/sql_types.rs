//! Source-native type codes and their semantic types
//!
//! Codes follow the JDBC `java.sql.Types` numbering so that type metadata
//! from any SQL driver can be fed through one table.

use serde::{Deserialize, Serialize};

use crate::inference::SemanticType;

/// SQL column type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SqlTypeCode {
    Bit,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Real,
    Double,
    Numeric,
    Decimal,
    Char,
    Varchar,
    LongVarchar,
    NChar,
    NVarchar,
    LongNVarchar,
    Date,
    Time,
    Timestamp,
    TimestampWithTimezone,
    Binary,
    VarBinary,
    Boolean,
    Null,
    Other,
}

impl SqlTypeCode {
    /// Every defined code
    pub const ALL: [SqlTypeCode; 25] = [
        SqlTypeCode::Bit,
        SqlTypeCode::TinyInt,
        SqlTypeCode::SmallInt,
        SqlTypeCode::Integer,
        SqlTypeCode::BigInt,
        SqlTypeCode::Float,
        SqlTypeCode::Real,
        SqlTypeCode::Double,
        SqlTypeCode::Numeric,
        SqlTypeCode::Decimal,
        SqlTypeCode::Char,
        SqlTypeCode::Varchar,
        SqlTypeCode::LongVarchar,
        SqlTypeCode::NChar,
        SqlTypeCode::NVarchar,
        SqlTypeCode::LongNVarchar,
        SqlTypeCode::Date,
        SqlTypeCode::Time,
        SqlTypeCode::Timestamp,
        SqlTypeCode::TimestampWithTimezone,
        SqlTypeCode::Binary,
        SqlTypeCode::VarBinary,
        SqlTypeCode::Boolean,
        SqlTypeCode::Null,
        SqlTypeCode::Other,
    ];

    /// Numeric code as used by JDBC drivers
    pub const fn code(self) -> i32 {
        match self {
            SqlTypeCode::Bit => -7,
            SqlTypeCode::TinyInt => -6,
            SqlTypeCode::SmallInt => 5,
            SqlTypeCode::Integer => 4,
            SqlTypeCode::BigInt => -5,
            SqlTypeCode::Float => 6,
            SqlTypeCode::Real => 7,
            SqlTypeCode::Double => 8,
            SqlTypeCode::Numeric => 2,
            SqlTypeCode::Decimal => 3,
            SqlTypeCode::Char => 1,
            SqlTypeCode::Varchar => 12,
            SqlTypeCode::LongVarchar => -1,
            SqlTypeCode::NChar => -15,
            SqlTypeCode::NVarchar => -9,
            SqlTypeCode::LongNVarchar => -16,
            SqlTypeCode::Date => 91,
            SqlTypeCode::Time => 92,
            SqlTypeCode::Timestamp => 93,
            SqlTypeCode::TimestampWithTimezone => 2014,
            SqlTypeCode::Binary => -2,
            SqlTypeCode::VarBinary => -3,
            SqlTypeCode::Boolean => 16,
            SqlTypeCode::Null => 0,
            SqlTypeCode::Other => 1111,
        }
    }

    /// Look up a numeric code
    pub fn from_code(code: i32) -> Option<SqlTypeCode> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    /// Map a declared SQL type name such as `DECIMAL(18,3)` to a code
    ///
    /// Unrecognized names map to [`SqlTypeCode::Other`].
    pub fn from_type_name(name: &str) -> SqlTypeCode {
        let upper = name.trim().to_uppercase();
        let base = upper.split('(').next().unwrap_or("").trim();

        match base {
            "BIT" => SqlTypeCode::Bit,
            "TINYINT" | "INT1" | "UTINYINT" => SqlTypeCode::TinyInt,
            "SMALLINT" | "INT2" | "SHORT" | "USMALLINT" => SqlTypeCode::SmallInt,
            "INTEGER" | "INT" | "INT4" | "SIGNED" | "UINTEGER" => SqlTypeCode::Integer,
            "BIGINT" | "INT8" | "LONG" | "UBIGINT" | "HUGEINT" | "UHUGEINT" => SqlTypeCode::BigInt,
            "FLOAT" | "FLOAT4" => SqlTypeCode::Float,
            "REAL" => SqlTypeCode::Real,
            "DOUBLE" | "DOUBLE PRECISION" | "FLOAT8" => SqlTypeCode::Double,
            "NUMERIC" => SqlTypeCode::Numeric,
            "DECIMAL" | "DEC" => SqlTypeCode::Decimal,
            "CHAR" | "CHARACTER" | "BPCHAR" => SqlTypeCode::Char,
            "VARCHAR" | "CHARACTER VARYING" | "TEXT" | "STRING" => SqlTypeCode::Varchar,
            "LONGVARCHAR" | "CLOB" => SqlTypeCode::LongVarchar,
            "NCHAR" => SqlTypeCode::NChar,
            "NVARCHAR" => SqlTypeCode::NVarchar,
            "LONGNVARCHAR" | "NCLOB" => SqlTypeCode::LongNVarchar,
            "DATE" => SqlTypeCode::Date,
            "TIME" => SqlTypeCode::Time,
            "TIMESTAMP" | "DATETIME" | "TIMESTAMP_S" | "TIMESTAMP_MS" | "TIMESTAMP_NS" => {
                SqlTypeCode::Timestamp
            }
            "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" => SqlTypeCode::TimestampWithTimezone,
            "BINARY" => SqlTypeCode::Binary,
            "VARBINARY" | "BLOB" | "BYTEA" => SqlTypeCode::VarBinary,
            "BOOLEAN" | "BOOL" | "LOGICAL" => SqlTypeCode::Boolean,
            "NULL" => SqlTypeCode::Null,
            _ => SqlTypeCode::Other,
        }
    }

    /// Semantic type for this code
    pub fn semantic_type(self) -> SemanticType {
        match self {
            SqlTypeCode::Float
            | SqlTypeCode::Real
            | SqlTypeCode::Double
            | SqlTypeCode::Decimal
            | SqlTypeCode::Numeric => SemanticType::Fact,
            SqlTypeCode::Date | SqlTypeCode::Timestamp | SqlTypeCode::TimestampWithTimezone => {
                SemanticType::Date
            }
            _ => SemanticType::Attribute,
        }
    }
}

/// Semantic type for a numeric source type code
///
/// Total: codes that are not defined map to `Attribute`.
pub fn column_type(code: i32) -> SemanticType {
    SqlTypeCode::from_code(code)
        .map(SqlTypeCode::semantic_type)
        .unwrap_or(SemanticType::Attribute)
}
