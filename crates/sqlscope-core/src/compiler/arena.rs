//! Parameter arena.

use std::panic::Location;

use crate::builder::{ParamMarker, SqlValue};
use crate::error::{Error, Result};
use crate::schema::Kind;

/// One positional parameter of a compiled query.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSlot {
    name: Option<String>,
    kind: Kind,
    value: Option<SqlValue>,
}

impl ParamSlot {
    /// Returns the identifier the slot is reused under, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the declared kind.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        self.kind
    }

    /// Returns the captured value, or `None` for a slot supplied at call time.
    #[must_use]
    pub const fn value(&self) -> Option<&SqlValue> {
        self.value.as_ref()
    }

    /// Returns whether the value is supplied at call time.
    #[must_use]
    pub const fn is_runtime(&self) -> bool {
        self.value.is_none()
    }
}

/// Ordered parameter slots of one compiled query, addressed by 1-based
/// position.
///
/// Reuse is purely by name: two markers with the same name share a position,
/// anonymous markers never do, and values are never compared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamArena {
    slots: Vec<ParamSlot>,
}

impl ParamArena {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Assigns or reuses a position for `marker`.
    ///
    /// A named captured marker that reuses a slot keeps the value captured
    /// first.
    pub(crate) fn slot(
        &mut self,
        marker: &ParamMarker,
        location: &'static Location<'static>,
    ) -> Result<usize> {
        if let Some(name) = marker.name.as_deref() {
            let existing = self
                .slots
                .iter()
                .position(|slot| slot.name.as_deref() == Some(name));
            if let Some(index) = existing {
                let slot = &self.slots[index];
                if slot.kind != marker.kind {
                    return Err(Error::Type {
                        context: format!("parameter `{name}`"),
                        expected: slot.kind.to_string(),
                        found: marker.kind.to_string(),
                        location,
                    });
                }
                if slot.is_runtime() != marker.value.is_none() {
                    return Err(Error::Guard {
                        message: format!(
                            "parameter `{name}` is used both as a runtime parameter and as a captured value"
                        ),
                        location,
                    });
                }
                return Ok(index + 1);
            }
        }

        self.slots.push(ParamSlot {
            name: marker.name.clone(),
            kind: marker.kind,
            value: marker.value.clone(),
        });
        Ok(self.slots.len())
    }

    /// Returns the slots in position order.
    #[must_use]
    pub fn slots(&self) -> &[ParamSlot] {
        &self.slots
    }

    /// Returns the slot at a 1-based position.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&ParamSlot> {
        position.checked_sub(1).and_then(|i| self.slots.get(i))
    }

    /// Returns the number of positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns whether the query has no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns how many arguments [`ParamArena::bind`] expects.
    #[must_use]
    pub fn runtime_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_runtime()).count()
    }

    /// Resolves every position into a bindable value.
    ///
    /// `args` fills the runtime slots in position order; captured slots use
    /// their captured value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArgumentCount`] if `args` does not have exactly one
    /// value per runtime slot, and [`Error::ArgumentType`] if a value does not
    /// fit its slot's kind.
    pub fn bind(&self, args: &[SqlValue]) -> Result<Vec<SqlValue>> {
        let expected = self.runtime_count();
        if args.len() != expected {
            return Err(Error::ArgumentCount {
                expected,
                got: args.len(),
            });
        }

        let mut remaining = args.iter();
        let mut bound = Vec::with_capacity(self.slots.len());
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(captured) = &slot.value {
                bound.push(captured.clone());
                continue;
            }
            let arg = remaining.next().ok_or(Error::ArgumentCount {
                expected,
                got: args.len(),
            })?;
            if !slot.kind.accepts(arg) {
                return Err(Error::ArgumentType {
                    position: i + 1,
                    expected: slot.kind.to_string(),
                    found: arg.type_name().to_string(),
                });
            }
            bound.push(arg.clone());
        }
        Ok(bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(name: Option<&str>, kind: Kind, value: Option<SqlValue>) -> ParamMarker {
        ParamMarker {
            name: name.map(String::from),
            kind,
            value,
        }
    }

    #[test]
    fn test_named_markers_share_a_position() {
        let mut arena = ParamArena::new();
        let here = Location::caller();
        let a = arena.slot(&marker(Some("x"), Kind::Integer, None), here).unwrap();
        let b = arena.slot(&marker(Some("y"), Kind::Integer, None), here).unwrap();
        let c = arena.slot(&marker(Some("x"), Kind::Integer, None), here).unwrap();
        assert_eq!((a, b, c), (1, 2, 1));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_anonymous_markers_never_merge() {
        let mut arena = ParamArena::new();
        let here = Location::caller();
        let value = Some(SqlValue::Int(1));
        let a = arena.slot(&marker(None, Kind::Integer, value.clone()), here).unwrap();
        let b = arena.slot(&marker(None, Kind::Integer, value), here).unwrap();
        assert_eq!((a, b), (1, 2));
    }

    #[test]
    fn test_reused_name_with_other_kind_rejected() {
        let mut arena = ParamArena::new();
        let here = Location::caller();
        arena.slot(&marker(Some("x"), Kind::Integer, None), here).unwrap();
        let err = arena
            .slot(&marker(Some("x"), Kind::Text, None), here)
            .unwrap_err();
        assert!(matches!(err, Error::Type { .. }));
    }

    #[test]
    fn test_bind_mixes_runtime_and_captured_values() {
        let mut arena = ParamArena::new();
        let here = Location::caller();
        arena.slot(&marker(None, Kind::Text, Some(SqlValue::Text(String::from("a")))), here).unwrap();
        arena.slot(&marker(Some("age"), Kind::Integer, None), here).unwrap();
        arena.slot(&marker(Some("score"), Kind::Real, None), here).unwrap();
        assert_eq!(arena.runtime_count(), 2);

        let bound = arena.bind(&[SqlValue::Int(30), SqlValue::Int(7)]).unwrap();
        assert_eq!(
            bound,
            vec![
                SqlValue::Text(String::from("a")),
                SqlValue::Int(30),
                SqlValue::Int(7)
            ]
        );
    }

    #[test]
    fn test_bind_checks_count_and_kind() {
        let mut arena = ParamArena::new();
        arena
            .slot(&marker(Some("age"), Kind::Integer, None), Location::caller())
            .unwrap();
        assert_eq!(
            arena.bind(&[]).unwrap_err(),
            Error::ArgumentCount {
                expected: 1,
                got: 0
            }
        );
        assert!(matches!(
            arena.bind(&[SqlValue::Text(String::from("x"))]),
            Err(Error::ArgumentType { position: 1, .. })
        ));
        assert!(matches!(
            arena.bind(&[SqlValue::Null]),
            Err(Error::ArgumentType { .. })
        ));
    }
}
