//! `tokio-postgres` conversions for [`Scalar`].

use crate::value::Scalar;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::error::Error;
use tokio_postgres::types::{FromSql, IsNull, ToSql, Type, to_sql_checked};

type BoxError = Box<dyn Error + Sync + Send>;

impl ToSql for Scalar {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Scalar::Null => Ok(IsNull::Yes),
            Scalar::Bool(b) => b.to_sql(ty, out),
            Scalar::Int(n) => {
                if *ty == Type::INT2 {
                    i16::try_from(*n)?.to_sql(ty, out)
                } else if *ty == Type::INT4 {
                    i32::try_from(*n)?.to_sql(ty, out)
                } else if *ty == Type::FLOAT4 {
                    (*n as f32).to_sql(ty, out)
                } else if *ty == Type::FLOAT8 {
                    (*n as f64).to_sql(ty, out)
                } else if *ty == Type::TEXT || *ty == Type::VARCHAR {
                    n.to_string().to_sql(ty, out)
                } else {
                    n.to_sql(ty, out)
                }
            }
            Scalar::Float(f) => {
                if *ty == Type::FLOAT4 {
                    (*f as f32).to_sql(ty, out)
                } else {
                    f.to_sql(ty, out)
                }
            }
            Scalar::Text(s) => s.to_sql(ty, out),
            Scalar::Bytes(b) => b.to_sql(ty, out),
            Scalar::Timestamp(ts) => {
                if *ty == Type::TIMESTAMPTZ {
                    DateTime::<Utc>::from_naive_utc_and_offset(*ts, Utc).to_sql(ty, out)
                } else {
                    ts.to_sql(ty, out)
                }
            }
            Scalar::Uuid(u) => u.to_sql(ty, out),
            Scalar::Json(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

impl<'a> FromSql<'a> for Scalar {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        let value = if *ty == Type::BOOL {
            Scalar::Bool(bool::from_sql(ty, raw)?)
        } else if *ty == Type::INT2 {
            Scalar::Int(i16::from_sql(ty, raw)?.into())
        } else if *ty == Type::INT4 {
            Scalar::Int(i32::from_sql(ty, raw)?.into())
        } else if *ty == Type::INT8 {
            Scalar::Int(i64::from_sql(ty, raw)?)
        } else if *ty == Type::FLOAT4 {
            Scalar::Float(f32::from_sql(ty, raw)?.into())
        } else if *ty == Type::FLOAT8 {
            Scalar::Float(f64::from_sql(ty, raw)?)
        } else if *ty == Type::BYTEA {
            Scalar::Bytes(Vec::<u8>::from_sql(ty, raw)?)
        } else if *ty == Type::TIMESTAMP {
            Scalar::Timestamp(NaiveDateTime::from_sql(ty, raw)?)
        } else if *ty == Type::TIMESTAMPTZ {
            Scalar::Timestamp(DateTime::<Utc>::from_sql(ty, raw)?.naive_utc())
        } else if *ty == Type::UUID {
            Scalar::Uuid(uuid::Uuid::from_sql(ty, raw)?)
        } else if *ty == Type::JSON || *ty == Type::JSONB {
            Scalar::Json(serde_json::Value::from_sql(ty, raw)?)
        } else if <String as FromSql>::accepts(ty) {
            Scalar::Text(String::from_sql(ty, raw)?)
        } else {
            return Err(format!("unsupported scalar column type: {ty}").into());
        };
        Ok(value)
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(Scalar::Null)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}
