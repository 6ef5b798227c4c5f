//! Serde helpers shared by the wire types.

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

/// Serializes a value as a JSON string, for query fields that carry JSON.
pub(crate) fn serialize_as_json<T, S>(t: &T, s: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    s.serialize_str(
        &serde_json::to_string(t).map_err(|e| serde::ser::Error::custom(format!("{e}")))?,
    )
}

pub(crate) fn is_false(b: &bool) -> bool {
    !*b
}

/// Reads an explicit `null` as the type's default. The engine writes unset
/// slices and maps as `null` wherever its field carries no `omitempty`.
pub(crate) fn null_as_default<'de, T, D>(d: D) -> Result<T, D::Error>
where
    T: Default + Deserialize<'de>,
    D: Deserializer<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// `std::time::Duration` as integer nanoseconds. Zero means "inherit" and is
/// normally skipped by the owning field.
pub mod duration_nanos {
    use super::*;
    use std::time::Duration;

    pub fn serialize<S>(d: &Duration, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let nanos = i64::try_from(d.as_nanos()).map_err(|_| {
            serde::ser::Error::custom(format!("duration {d:?} overflows int64 nanoseconds"))
        })?;
        s.serialize_i64(nanos)
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nanos = i64::deserialize(d)?;
        u64::try_from(nanos)
            .map(Duration::from_nanos)
            .map_err(|_| de::Error::custom(format!("negative duration: {nanos}ns")))
    }

    pub mod option {
        use super::*;

        pub fn serialize<S>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match d {
                Some(d) => super::serialize(d, s),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(d: D) -> Result<Option<Duration>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<i64>::deserialize(d)? {
                Some(nanos) => u64::try_from(nanos)
                    .map(|n| Some(Duration::from_nanos(n)))
                    .map_err(|_| de::Error::custom(format!("negative duration: {nanos}ns"))),
                None => Ok(None),
            }
        }
    }
}

/// A set encoded the way the engine encodes Go `map[T]struct{}`:
/// `{"80/tcp": {}, "443/tcp": {}}`.
pub mod set_as_map {
    use super::*;

    pub fn serialize<T, S>(set: &BTreeSet<T>, s: S) -> Result<S::Ok, S::Error>
    where
        T: fmt::Display,
        S: Serializer,
    {
        let mut map = s.serialize_map(Some(set.len()))?;
        for item in set {
            map.serialize_entry(&item.to_string(), &Empty {})?;
        }
        map.end()
    }

    pub fn deserialize<'de, T, D>(d: D) -> Result<BTreeSet<T>, D::Error>
    where
        T: FromStr + Ord,
        T::Err: fmt::Display,
        D: Deserializer<'de>,
    {
        d.deserialize_option(SetVisitor(PhantomData))
    }

    #[derive(Serialize, Deserialize)]
    struct Empty {}

    struct SetVisitor<T>(PhantomData<T>);

    impl<'de, T> Visitor<'de> for SetVisitor<T>
    where
        T: FromStr + Ord,
        T::Err: fmt::Display,
    {
        type Value = BTreeSet<T>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map whose keys form a set")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(BTreeSet::new())
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(BTreeSet::new())
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_map(self)
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut set = BTreeSet::new();
            while let Some((key, _)) = access.next_entry::<String, de::IgnoredAny>()? {
                let item = key.parse::<T>().map_err(de::Error::custom)?;
                set.insert(item);
            }
            Ok(set)
        }
    }
}
