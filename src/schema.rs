use std::io;
use std::sync::Arc;

use io::Write;

use arrow::datatypes::DataType;
use arrow::datatypes::Field;
use arrow::datatypes::Schema;
use arrow::datatypes::SchemaRef;

use crate::error::SchemaError;
use crate::pattern::Pattern;

/// Named groups of the pattern as `(group index, name)`, in pattern order.
/// Unnamed groups are skipped.
pub fn named_groups<P>(pattern: &P) -> Vec<(usize, &str)>
where
    P: Pattern,
{
    pattern
        .group_names()
        .enumerate()
        .filter_map(|(ix, name)| name.map(|n| (ix, n)))
        .collect()
}

/// Builds a schema with one non-null `Utf8` field per named capture group.
///
/// The `regex` crate refuses to compile a pattern that reuses a group name,
/// so the field names are always unique.
pub fn derive_schema<P>(pattern: &P) -> Result<SchemaRef, SchemaError>
where
    P: Pattern,
{
    let fields: Vec<Field> = named_groups(pattern)
        .into_iter()
        .map(|(_, name)| Field::new(name, DataType::Utf8, false))
        .collect();

    if fields.is_empty() {
        return Err(SchemaError::NoNamedGroups);
    }

    Ok(Arc::new(Schema::new(fields)))
}

pub fn describe_schema<W>(schema: &Schema, mut out: W) -> Result<(), io::Error>
where
    W: Write,
{
    writeln!(out, "Schema ({} fields):", schema.fields().len())?;
    for (ix, field) in schema.fields().iter().enumerate() {
        writeln!(out, "  {ix}: {} ({:?})", field.name(), field.data_type())?;
    }
    out.flush()
}
