use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::postgres::PgRow;
use sqlx::postgres::types::{PgInterval, PgMoney, PgTimeTz};
use sqlx::types::{JsonValue, Uuid};
use sqlx::{Column, Decode, Postgres, Row, Type, TypeInfo, ValueRef};

use sqlcoach_core::{ResultRow, Scalar};

use crate::error::{DbError, DbResult};

type TimeTz = PgTimeTz<NaiveTime, FixedOffset>;

/// Convert a driver row into a [`ResultRow`], keeping column order.
pub fn decode_row(row: &PgRow) -> DbResult<ResultRow> {
    let mut decoded = ResultRow::new();
    for column in row.columns() {
        let value = decode_cell(row, column.ordinal(), column.name(), column.type_info().name())?;
        decoded.insert(column.name(), value);
    }
    Ok(decoded)
}

fn decode_cell(row: &PgRow, index: usize, column: &str, type_name: &str) -> DbResult<Scalar> {
    let is_null = row
        .try_get_raw(index)
        .map_err(|err| DbError::Decode(err.to_string()))?
        .is_null();
    if is_null {
        return Ok(Scalar::Null);
    }

    let value = match type_name {
        "BOOL" => Scalar::Bool(get::<bool>(row, index)?),
        "INT2" => Scalar::Int(i64::from(get::<i16>(row, index)?)),
        "INT4" => Scalar::Int(i64::from(get::<i32>(row, index)?)),
        "INT8" => Scalar::Int(get::<i64>(row, index)?),
        "FLOAT4" => Scalar::Float(f64::from(get::<f32>(row, index)?)),
        "FLOAT8" => Scalar::Float(get::<f64>(row, index)?),
        "NUMERIC" => Scalar::Float(numeric_to_f64(get::<Decimal>(row, index)?, column)?),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => Scalar::Text(get::<String>(row, index)?),
        "DATE" => Scalar::Temporal(format_date(get::<NaiveDate>(row, index)?)),
        "TIME" => Scalar::Temporal(format_time(get::<NaiveTime>(row, index)?)),
        "TIMESTAMP" => Scalar::Temporal(format_timestamp(get::<NaiveDateTime>(row, index)?)),
        "TIMESTAMPTZ" => Scalar::Temporal(format_timestamptz(get::<DateTime<Utc>>(row, index)?)),
        "TIMETZ" => Scalar::Temporal(format_timetz(get::<TimeTz>(row, index)?)),
        "INTERVAL" => Scalar::Temporal(format_interval(get::<PgInterval>(row, index)?)),
        "MONEY" => {
            let amount = money_to_decimal(get::<PgMoney>(row, index)?);
            Scalar::Float(numeric_to_f64(amount, column)?)
        }
        "UUID" => Scalar::Text(get::<Uuid>(row, index)?.to_string()),
        "JSON" | "JSONB" => Scalar::Text(get::<JsonValue>(row, index)?.to_string()),
        // Arrays render as JSON text, NULL elements as `null`.
        "BOOL[]" => Scalar::Text(json_array::<bool>(row, index)?),
        "INT2[]" => Scalar::Text(json_array::<i16>(row, index)?),
        "INT4[]" => Scalar::Text(json_array::<i32>(row, index)?),
        "INT8[]" => Scalar::Text(json_array::<i64>(row, index)?),
        "FLOAT4[]" => Scalar::Text(json_array::<f32>(row, index)?),
        "FLOAT8[]" => Scalar::Text(json_array::<f64>(row, index)?),
        "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "NAME[]" => {
            Scalar::Text(json_array::<String>(row, index)?)
        }
        other => {
            return Err(DbError::UnsupportedType {
                column: column.to_string(),
                type_name: other.to_string(),
            });
        }
    };

    Ok(value)
}

fn get<'r, T>(row: &'r PgRow, index: usize) -> DbResult<T>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get::<T, _>(index)
        .map_err(|err| DbError::Decode(err.to_string()))
}

fn json_array<'r, T>(row: &'r PgRow, index: usize) -> DbResult<String>
where
    Vec<Option<T>>: Decode<'r, Postgres> + Type<Postgres>,
    JsonValue: From<Vec<Option<T>>>,
{
    Ok(JsonValue::from(get::<Vec<Option<T>>>(row, index)?).to_string())
}

/// MONEY arrives as an integer count of cents.
fn money_to_decimal(value: PgMoney) -> Decimal {
    value.to_decimal(2)
}

fn numeric_to_f64(value: Decimal, column: &str) -> DbResult<f64> {
    value
        .to_f64()
        .ok_or_else(|| DbError::Decode(format!("numeric value in '{column}' does not fit f64")))
}

fn format_date(value: NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

fn format_time(value: NaiveTime) -> String {
    value.format("%H:%M:%S%.f").to_string()
}

fn format_timestamp(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

fn format_timestamptz(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

fn format_timetz(value: TimeTz) -> String {
    format!("{}{}", format_time(value.time), value.offset)
}

/// ISO 8601 duration, matching Postgres' `intervalstyle = iso_8601`.
fn format_interval(value: PgInterval) -> String {
    let years = value.months / 12;
    let months = value.months % 12;

    let micros = value.microseconds;
    let hours = micros / 3_600_000_000;
    let minutes = (micros % 3_600_000_000) / 60_000_000;
    let second_micros = micros % 60_000_000;

    let mut out = String::from("P");
    for (amount, unit) in [(years, 'Y'), (months, 'M'), (value.days, 'D')] {
        if amount != 0 {
            out.push_str(&format!("{amount}{unit}"));
        }
    }

    if micros != 0 {
        out.push('T');
        for (amount, unit) in [(hours, 'H'), (minutes, 'M')] {
            if amount != 0 {
                out.push_str(&format!("{amount}{unit}"));
            }
        }
        if second_micros != 0 {
            out.push_str(&format_seconds(second_micros));
            out.push('S');
        }
    }

    if out == "P" {
        out.push_str("T0S");
    }
    out
}

fn format_seconds(micros: i64) -> String {
    let sign = if micros < 0 { "-" } else { "" };
    let micros = micros.unsigned_abs();
    let whole = micros / 1_000_000;
    let fraction = micros % 1_000_000;
    if fraction == 0 {
        format!("{sign}{whole}")
    } else {
        let digits = format!("{fraction:06}");
        format!("{sign}{whole}.{}", digits.trim_end_matches('0'))
    }
}
