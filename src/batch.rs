use std::borrow::Cow;
use std::sync::Arc;

use arrow::datatypes::SchemaRef;

use arrow::array::ArrayRef;
use arrow::array::StringBuilder;

use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;

/// A captured value that can be stored in a `Utf8` column.
///
/// Byte values are converted lossily; invalid sequences become U+FFFD.
pub trait AsText {
    fn as_text(&self) -> Cow<'_, str>;
}

impl AsText for str {
    fn as_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl AsText for [u8] {
    fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self)
    }
}

impl AsText for String {
    fn as_text(&self) -> Cow<'_, str> {
        self.as_str().as_text()
    }
}

impl AsText for Vec<u8> {
    fn as_text(&self) -> Cow<'_, str> {
        self.as_slice().as_text()
    }
}

impl<T> AsText for &T
where
    T: AsText + ?Sized,
{
    fn as_text(&self) -> Cow<'_, str> {
        (**self).as_text()
    }
}

/// Initial capacities of the column builders.
///
/// Passed to each [`BatchAccumulator`] so that independent accumulators never
/// share allocation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Rows reserved per column.
    pub item_capacity: usize,
    /// Bytes of string data reserved per column.
    pub data_capacity: usize,
}

impl BuilderConfig {
    pub const DEFAULT_ITEM_CAPACITY: usize = 1024;
    pub const DEFAULT_BYTES_PER_VALUE: usize = 16;

    /// Capacities sized for a batch of `max_rows`, never above the default
    /// item capacity. Builders grow past the reserve on demand.
    pub fn for_batch_size(max_rows: usize) -> Self {
        let item_capacity = match max_rows {
            0 => Self::DEFAULT_ITEM_CAPACITY,
            n => n.min(Self::DEFAULT_ITEM_CAPACITY),
        };
        Self {
            item_capacity,
            data_capacity: item_capacity.saturating_mul(Self::DEFAULT_BYTES_PER_VALUE),
        }
    }

    fn builder(&self) -> StringBuilder {
        StringBuilder::with_capacity(self.item_capacity, self.data_capacity)
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self::for_batch_size(0)
    }
}

/// Buffers text rows column by column and turns them into record batches.
///
/// Flushing is up to the caller: check [`should_flush`](Self::should_flush)
/// after each [`append`](Self::append) and call
/// [`finalize`](Self::finalize). Each returned batch owns its column memory,
/// which is released when the batch is dropped.
pub struct BatchAccumulator {
    schema: SchemaRef,
    builders: Vec<StringBuilder>,
    max_rows: usize,
    rows: usize,
}

impl BatchAccumulator {
    /// `max_rows` of 0 disables the flush threshold.
    pub fn new(schema: SchemaRef, max_rows: usize, config: BuilderConfig) -> Self {
        let builders = schema.fields().iter().map(|_| config.builder()).collect();
        Self {
            schema,
            builders,
            max_rows,
            rows: 0,
        }
    }

    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    /// Appends one row; `row` must hold one value per schema field.
    ///
    /// Values past the schema width are ignored. A short row leaves the
    /// trailing columns behind, which makes the next [`finalize`](Self::finalize)
    /// fail.
    pub fn append<V>(&mut self, row: &[V])
    where
        V: AsText,
    {
        for (bldr, val) in self.builders.iter_mut().zip(row) {
            bldr.append_value(val.as_text());
        }
        self.rows += 1;
    }

    pub fn should_flush(&self) -> bool {
        self.max_rows > 0 && self.rows >= self.max_rows
    }

    pub fn buffered_rows(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Moves the buffered rows into a new batch and resets the accumulator.
    ///
    /// An empty accumulator yields a zero-row batch. Fails only when a row
    /// shorter than the schema was appended.
    pub fn finalize(&mut self) -> Result<RecordBatch, ArrowError> {
        let columns: Vec<ArrayRef> = self
            .builders
            .iter_mut()
            .map(|b| Arc::new(b.finish()) as ArrayRef)
            .collect();
        self.rows = 0;
        RecordBatch::try_new(Arc::clone(&self.schema), columns)
    }
}
