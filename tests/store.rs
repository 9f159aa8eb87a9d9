use anyhow::Result;
use arrow::array::{Array, Decimal128Array, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray};
use parquetflow::store::{Cell, cast};
use parquetflow::{ArrowStore, BackingStore, Column, ExportError, StorageType, Value};

mod common;
use common::{column, read_parquet};

fn envelope() -> Column {
    Column::new("envelope", StorageType::Json)
}

fn env_value() -> Value {
    Value::Text(r#"{"eventId":"e"}"#.into())
}

#[tokio::test]
async fn new_columns_are_backfilled_with_nulls() -> Result<()> {
    let mut store = ArrowStore::default();
    store.open(&envelope()).await?;
    store.append_row(vec![env_value()]).await?;

    store.add_column(&Column::new("n", StorageType::Int64)).await?;
    store.append_row(vec![env_value(), Value::Int(5)]).await?;

    let batch = store.record_batch()?;
    assert_eq!(batch.num_rows(), 2);
    let n = column::<Int64Array>(&batch, "n")?;
    assert!(n.is_null(0));
    assert_eq!(n.value(1), 5);
    Ok(())
}

#[tokio::test]
async fn refused_rows_leave_no_trace() -> Result<()> {
    let mut store = ArrowStore::default();
    store.open(&envelope()).await?;
    store.add_column(&Column::new("temp", StorageType::Double)).await?;
    store.add_column(&Column::new("label", StorageType::Text)).await?;

    let err = store
        .append_row(vec![env_value(), Value::Text("n/a".into()), Value::Text("x".into())])
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Coercion { ref column, .. } if column == "temp"));
    assert_eq!(store.row_count(), 0);

    store
        .append_row(vec![env_value(), Value::Float(21.5), Value::Text("y".into())])
        .await?;
    let batch = store.record_batch()?;
    assert_eq!(batch.num_rows(), 1);
    assert_eq!(column::<StringArray>(&batch, "label")?.value(0), "y");
    Ok(())
}

#[tokio::test]
async fn row_width_must_match() -> Result<()> {
    let mut store = ArrowStore::default();
    store.open(&envelope()).await?;
    let err = store.append_row(vec![env_value(), Value::Int(1)]).await.unwrap_err();
    assert!(matches!(err, ExportError::RowWidth { expected: 1, actual: 2 }));
    Ok(())
}

#[tokio::test]
async fn duplicate_column_names_are_rejected() -> Result<()> {
    let mut store = ArrowStore::default();
    store.open(&envelope()).await?;
    store.add_column(&Column::new("temp", StorageType::Double)).await?;
    let err = store
        .add_column(&Column::new("Temp", StorageType::Text))
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::ColumnRejected { .. }));
    assert_eq!(store.columns().len(), 2);
    Ok(())
}

#[tokio::test]
async fn closed_store_refuses_everything() -> Result<()> {
    let mut store = ArrowStore::default();
    assert!(matches!(
        store.append_row(vec![env_value()]).await,
        Err(ExportError::Uninitialized)
    ));

    store.open(&envelope()).await?;
    assert!(matches!(store.open(&envelope()).await, Err(ExportError::AlreadyStarted)));
    store.close().await?;
    assert!(!store.is_open());
    assert!(matches!(
        store.add_column(&Column::new("x", StorageType::Int64)).await,
        Err(ExportError::Uninitialized)
    ));
    assert!(matches!(store.close().await, Err(ExportError::Uninitialized)));
    Ok(())
}

#[tokio::test]
async fn exports_typed_parquet() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("typed.parquet");

    let mut store = ArrowStore::default();
    store.open(&envelope()).await?;
    for column in [
        Column::new("at", StorageType::Timestamp),
        Column::new("big", StorageType::Decimal),
        Column::new("temp", StorageType::Double),
    ] {
        store.add_column(&column).await?;
    }
    store
        .append_row(vec![
            env_value(),
            Value::Text("2023-11-14T22:13:20.000Z".into()),
            Value::Decimal("123456789012345678901234567890".into()),
            Value::Text("1.25".into()),
        ])
        .await?;
    store
        .append_row(vec![env_value(), Value::Null, Value::Int(7), Value::Int(3)])
        .await?;

    assert_eq!(store.export(&path).await?, 2);

    let batch = read_parquet(&path)?;
    assert_eq!(batch.num_rows(), 2);
    let at = column::<TimestampMicrosecondArray>(&batch, "at")?;
    assert_eq!(at.value(0), 1_700_000_000_000_000);
    assert!(at.is_null(1));
    let big = column::<Decimal128Array>(&batch, "big")?;
    assert_eq!(big.value(0), 123_456_789_012_345_678_901_234_567_890_i128);
    assert_eq!(big.value(1), 7);
    let temp = column::<Float64Array>(&batch, "temp")?;
    assert_eq!(temp.values().to_vec(), vec![1.25, 3.0]);
    Ok(())
}

#[test]
fn native_conversions() {
    assert_eq!(cast(Value::Null, StorageType::Int64), Ok(Cell::Null));
    assert_eq!(cast(Value::Text(" 42 ".into()), StorageType::Int64), Ok(Cell::Int64(42)));
    assert_eq!(cast(Value::Float(2.5), StorageType::Int64), Ok(Cell::Int64(3)));
    assert_eq!(cast(Value::Bool(true), StorageType::Int64), Ok(Cell::Int64(1)));
    assert_eq!(cast(Value::Int(3), StorageType::Double), Ok(Cell::Float64(3.0)));
    assert_eq!(cast(Value::Text("yes".into()), StorageType::Boolean), Ok(Cell::Boolean(true)));
    assert_eq!(cast(Value::Int(0), StorageType::Boolean), Ok(Cell::Boolean(false)));
    assert_eq!(cast(Value::Int(12), StorageType::Text), Ok(Cell::Utf8("12".into())));
    assert_eq!(
        cast(Value::Text("2024-01-15".into()), StorageType::Timestamp),
        Ok(Cell::Timestamp(1_705_276_800_000_000))
    );
}

#[test]
fn failed_conversions_explain_themselves() {
    let err = cast(Value::Text("n/a".into()), StorageType::Double).unwrap_err();
    assert_eq!(err, "could not convert string 'n/a' to DOUBLE");

    let err = cast(Value::Decimal("9223372036854775808".into()), StorageType::Int64).unwrap_err();
    assert!(err.contains("out of range"));

    assert!(cast(Value::Int(1), StorageType::Timestamp).is_err());
    assert!(cast(Value::Text("maybe".into()), StorageType::Boolean).is_err());
    assert!(cast(Value::Text("9".repeat(39)), StorageType::Decimal).is_err());
}
