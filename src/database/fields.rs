//! Runtime Field Inspection
//!
//! Entities are inspected through their serde representation: the serialized
//! object gives the field names and values, and the `id` field decides whether
//! an entity is new (blank ID) or already stored.
//!
//! The serialized value loses the declared type of the `id` field, so that is
//! checked separately by a serializer that only records which
//! kind of value the `id` field hands it.

use serde::Serialize;
use serde::ser::{self, Impossible, Serializer};
use serde_json::{Map, Value};

use crate::database::error::{DbError, Result};
use crate::database::traits::{Entity, ID_FIELD};

/// Serializes `value` and returns its named fields.
pub fn entity_fields<T: Serialize + ?Sized>(
    entity_name: &str,
    value: &T,
) -> Result<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(DbError::NotAStruct {
            entity: entity_name.to_string(),
        }),
    }
}

/// Returns the `id` of an entity, `0` when blank.
pub fn entity_id<T: Entity>(entity: &T) -> Result<u64> {
    inspect_entity(entity).map(|(_, id)| id)
}

/// Serializes an entity and validates its `id`, returning the fields and the ID.
pub(crate) fn inspect_entity<T: Entity>(entity: &T) -> Result<(Map<String, Value>, u64)> {
    let name = T::entity_name();
    let fields = entity_fields(&name, entity)?;
    let id = id_from_fields(&name, &fields)?;
    if !id_is_unsigned(entity) {
        return Err(DbError::InvalidIdType { entity: name });
    }
    Ok((fields, id))
}

/// Whether the declared `id` field is an unsigned integer, or an `Option` of one.
///
/// Types that do not serialize as a struct (maps, flattened structs) carry no
/// declared field types and are accepted on their serialized value alone.
pub(crate) fn id_is_unsigned<T: Serialize + ?Sized>(entity: &T) -> bool {
    !matches!(entity.serialize(IdFieldFinder), Ok(Some(false)))
}

/// The ID must be an unsigned integer; `null` (an unset `Option`) counts as blank.
pub(crate) fn id_from_fields(entity: &str, fields: &Map<String, Value>) -> Result<u64> {
    match fields.get(ID_FIELD) {
        None => Err(DbError::MissingIdField {
            entity: entity.to_string(),
        }),
        Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n.as_u64().ok_or_else(|| DbError::InvalidIdType {
            entity: entity.to_string(),
        }),
        Some(_) => Err(DbError::InvalidIdType {
            entity: entity.to_string(),
        }),
    }
}

/// IDs are stored in `BIGINT` columns.
pub(crate) fn id_to_i64(entity: &str, id: u64) -> Result<i64> {
    i64::try_from(id).map_err(|_| DbError::IdOutOfRange {
        entity: entity.to_string(),
        id,
    })
}

type CheckError = serde_json::Error;

fn not_unsigned<T>() -> std::result::Result<T, CheckError> {
    Err(ser::Error::custom("not an unsigned integer"))
}

/// Accepts `u8` through `u64`, `None`, and `Some` or newtypes around those.
struct IdTypeCheck;

impl Serializer for IdTypeCheck {
    type Ok = ();
    type Error = CheckError;
    type SerializeSeq = Impossible<(), CheckError>;
    type SerializeTuple = Impossible<(), CheckError>;
    type SerializeTupleStruct = Impossible<(), CheckError>;
    type SerializeTupleVariant = Impossible<(), CheckError>;
    type SerializeMap = Impossible<(), CheckError>;
    type SerializeStruct = Impossible<(), CheckError>;
    type SerializeStructVariant = Impossible<(), CheckError>;

    fn serialize_u8(self, _: u8) -> Result<(), CheckError> {
        Ok(())
    }
    fn serialize_u16(self, _: u16) -> Result<(), CheckError> {
        Ok(())
    }
    fn serialize_u32(self, _: u32) -> Result<(), CheckError> {
        Ok(())
    }
    fn serialize_u64(self, _: u64) -> Result<(), CheckError> {
        Ok(())
    }
    fn serialize_none(self) -> Result<(), CheckError> {
        Ok(())
    }
    fn serialize_some<V: Serialize + ?Sized>(self, value: &V) -> Result<(), CheckError> {
        value.serialize(self)
    }
    fn serialize_newtype_struct<V: Serialize + ?Sized>(
        self,
        _: &'static str,
        value: &V,
    ) -> Result<(), CheckError> {
        value.serialize(self)
    }

    fn serialize_bool(self, _: bool) -> Result<(), CheckError> {
        not_unsigned()
    }
    fn serialize_i8(self, _: i8) -> Result<(), CheckError> {
        not_unsigned()
    }
    fn serialize_i16(self, _: i16) -> Result<(), CheckError> {
        not_unsigned()
    }
    fn serialize_i32(self, _: i32) -> Result<(), CheckError> {
        not_unsigned()
    }
    fn serialize_i64(self, _: i64) -> Result<(), CheckError> {
        not_unsigned()
    }
    fn serialize_f32(self, _: f32) -> Result<(), CheckError> {
        not_unsigned()
    }
    fn serialize_f64(self, _: f64) -> Result<(), CheckError> {
        not_unsigned()
    }
    fn serialize_char(self, _: char) -> Result<(), CheckError> {
        not_unsigned()
    }
    fn serialize_str(self, _: &str) -> Result<(), CheckError> {
        not_unsigned()
    }
    fn serialize_bytes(self, _: &[u8]) -> Result<(), CheckError> {
        not_unsigned()
    }
    fn serialize_unit(self) -> Result<(), CheckError> {
        not_unsigned()
    }
    fn serialize_unit_struct(self, _: &'static str) -> Result<(), CheckError> {
        not_unsigned()
    }
    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
    ) -> Result<(), CheckError> {
        not_unsigned()
    }
    fn serialize_newtype_variant<V: Serialize + ?Sized>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: &V,
    ) -> Result<(), CheckError> {
        not_unsigned()
    }
    fn serialize_seq(self, _: Option<usize>) -> Result<Self::SerializeSeq, CheckError> {
        not_unsigned()
    }
    fn serialize_tuple(self, _: usize) -> Result<Self::SerializeTuple, CheckError> {
        not_unsigned()
    }
    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleStruct, CheckError> {
        not_unsigned()
    }
    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleVariant, CheckError> {
        not_unsigned()
    }
    fn serialize_map(self, _: Option<usize>) -> Result<Self::SerializeMap, CheckError> {
        not_unsigned()
    }
    fn serialize_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStruct, CheckError> {
        not_unsigned()
    }
    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStructVariant, CheckError> {
        not_unsigned()
    }
}

/// Walks the top-level struct and runs `IdTypeCheck` on its `id` field.
///
/// Yields `Some(passed)` for a struct with an `id` field, `None` otherwise.
struct IdFieldFinder;

struct IdField(Option<bool>);

impl ser::SerializeStruct for IdField {
    type Ok = Option<bool>;
    type Error = CheckError;

    fn serialize_field<V: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &V,
    ) -> Result<(), CheckError> {
        if key == ID_FIELD {
            self.0 = Some(value.serialize(IdTypeCheck).is_ok());
        }
        Ok(())
    }

    fn end(self) -> Result<Option<bool>, CheckError> {
        Ok(self.0)
    }
}

impl Serializer for IdFieldFinder {
    type Ok = Option<bool>;
    type Error = CheckError;
    type SerializeSeq = Impossible<Option<bool>, CheckError>;
    type SerializeTuple = Impossible<Option<bool>, CheckError>;
    type SerializeTupleStruct = Impossible<Option<bool>, CheckError>;
    type SerializeTupleVariant = Impossible<Option<bool>, CheckError>;
    type SerializeMap = Impossible<Option<bool>, CheckError>;
    type SerializeStruct = IdField;
    type SerializeStructVariant = Impossible<Option<bool>, CheckError>;

    fn serialize_struct(self, _: &'static str, _: usize) -> Result<IdField, CheckError> {
        Ok(IdField(None))
    }
    fn serialize_newtype_struct<V: Serialize + ?Sized>(
        self,
        _: &'static str,
        value: &V,
    ) -> Result<Option<bool>, CheckError> {
        value.serialize(self)
    }

    fn serialize_bool(self, _: bool) -> Result<Option<bool>, CheckError> {
        Ok(None)
    }
    fn serialize_i8(self, _: i8) -> Result<Option<bool>, CheckError> {
        Ok(None)
    }
    fn serialize_i16(self, _: i16) -> Result<Option<bool>, CheckError> {
        Ok(None)
    }
    fn serialize_i32(self, _: i32) -> Result<Option<bool>, CheckError> {
        Ok(None)
    }
    fn serialize_i64(self, _: i64) -> Result<Option<bool>, CheckError> {
        Ok(None)
    }
    fn serialize_u8(self, _: u8) -> Result<Option<bool>, CheckError> {
        Ok(None)
    }
    fn serialize_u16(self, _: u16) -> Result<Option<bool>, CheckError> {
        Ok(None)
    }
    fn serialize_u32(self, _: u32) -> Result<Option<bool>, CheckError> {
        Ok(None)
    }
    fn serialize_u64(self, _: u64) -> Result<Option<bool>, CheckError> {
        Ok(None)
    }
    fn serialize_f32(self, _: f32) -> Result<Option<bool>, CheckError> {
        Ok(None)
    }
    fn serialize_f64(self, _: f64) -> Result<Option<bool>, CheckError> {
        Ok(None)
    }
    fn serialize_char(self, _: char) -> Result<Option<bool>, CheckError> {
        Ok(None)
    }
    fn serialize_str(self, _: &str) -> Result<Option<bool>, CheckError> {
        Ok(None)
    }
    fn serialize_bytes(self, _: &[u8]) -> Result<Option<bool>, CheckError> {
        Ok(None)
    }
    fn serialize_none(self) -> Result<Option<bool>, CheckError> {
        Ok(None)
    }
    fn serialize_some<V: Serialize + ?Sized>(self, _: &V) -> Result<Option<bool>, CheckError> {
        Ok(None)
    }
    fn serialize_unit(self) -> Result<Option<bool>, CheckError> {
        Ok(None)
    }
    fn serialize_unit_struct(self, _: &'static str) -> Result<Option<bool>, CheckError> {
        Ok(None)
    }
    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
    ) -> Result<Option<bool>, CheckError> {
        Ok(None)
    }
    fn serialize_newtype_variant<V: Serialize + ?Sized>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: &V,
    ) -> Result<Option<bool>, CheckError> {
        Ok(None)
    }

    // compound non-struct shapes have no declared id type to check
    fn serialize_seq(self, _: Option<usize>) -> Result<Self::SerializeSeq, CheckError> {
        Err(ser::Error::custom("not a struct"))
    }
    fn serialize_tuple(self, _: usize) -> Result<Self::SerializeTuple, CheckError> {
        Err(ser::Error::custom("not a struct"))
    }
    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleStruct, CheckError> {
        Err(ser::Error::custom("not a struct"))
    }
    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleVariant, CheckError> {
        Err(ser::Error::custom("not a struct"))
    }
    fn serialize_map(self, _: Option<usize>) -> Result<Self::SerializeMap, CheckError> {
        Err(ser::Error::custom("not a struct"))
    }
    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStructVariant, CheckError> {
        Err(ser::Error::custom("not a struct"))
    }
}
