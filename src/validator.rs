/// Pure validation rules, run before any I/O.
///
/// - identifiers: `[A-Za-z_][A-Za-z0-9_]*` for tables and columns
/// - logical column types and their required parameters
/// - conversion rules for `modify`
/// - precision bounds for `avg`

use crate::parser::{is_identifier, is_qualified_identifier};
use crate::types::{ColumnDescriptor, ColumnSpec, DatabaseError, LogicalType, TypeFamily};

const MAX_NUMERIC_PRECISION: u32 = 1000;
const MAX_AVG_PRECISION: u32 = 100;

pub fn validate_identifier(name: &str) -> Result<(), DatabaseError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(DatabaseError::InvalidIdentifier(name.to_string()))
    }
}

/// Like [`validate_identifier`] but also accepts `table.column`.
pub fn validate_column_ref(name: &str) -> Result<(), DatabaseError> {
    if is_qualified_identifier(name) {
        Ok(())
    } else {
        Err(DatabaseError::InvalidIdentifier(name.to_string()))
    }
}

pub fn validate_identifiers<'a, I>(names: I) -> Result<(), DatabaseError>
where
    I: IntoIterator<Item = &'a String>,
{
    names.into_iter().try_for_each(|n| validate_identifier(n))
}

/// Resolves a column definition to its logical type, checking the name,
/// the type name and every parameter the type requires.
pub fn resolve_type(spec: &ColumnSpec) -> Result<&'static LogicalType, DatabaseError> {
    validate_identifier(&spec.name)?;

    let logical = LogicalType::lookup(&spec.type_name)
        .ok_or_else(|| DatabaseError::UnsupportedType(spec.type_name.clone()))?;

    let invalid = |reason: String| DatabaseError::InvalidColumnSpec {
        column: spec.name.clone(),
        reason,
    };

    for param in logical.required {
        if spec.param(*param).is_none() {
            return Err(invalid(format!(
                "type '{}' requires {}",
                logical.name,
                param.name()
            )));
        }
    }

    if let Some(length) = spec.length {
        if length == 0 {
            return Err(invalid("length must be at least 1".to_string()));
        }
    }

    if let (Some(precision), Some(scale)) = (spec.precision, spec.scale) {
        if precision == 0 || precision > MAX_NUMERIC_PRECISION {
            return Err(invalid(format!(
                "precision must be within 1..={MAX_NUMERIC_PRECISION}"
            )));
        }
        if scale > precision {
            return Err(invalid(format!(
                "scale {scale} exceeds precision {precision}"
            )));
        }
    }

    if logical.primary_key && spec.default.is_some() {
        return Err(invalid("primary key columns cannot declare a default".to_string()));
    }

    Ok(logical)
}

/// Numeric targets only accept numeric sources, date/time targets only
/// date/time sources. Text targets accept anything.
pub fn check_conversion(current: &ColumnDescriptor, target: &LogicalType) -> Result<(), DatabaseError> {
    let source = current.family();
    let allowed = match target.family {
        TypeFamily::Numeric => source == TypeFamily::Numeric,
        TypeFamily::DateTime => source == TypeFamily::DateTime,
        _ => true,
    };

    if allowed {
        Ok(())
    } else {
        Err(DatabaseError::IllegalTypeConversion {
            column: current.name.clone(),
            from: current.sql_type.clone(),
            to: target.name.to_string(),
        })
    }
}

pub const fn validate_avg_precision(precision: u32) -> Result<(), DatabaseError> {
    if precision > MAX_AVG_PRECISION {
        Err(DatabaseError::PrecisionOutOfRange(precision))
    } else {
        Ok(())
    }
}
