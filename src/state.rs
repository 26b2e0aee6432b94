use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Marks a value type as attachable state.
///
/// Any `Clone + Send + Sync + Debug + 'static` type can become a state by
/// implementing this trait; nothing is required beyond the empty impl.
/// States are plain values: they are copied out on typed reads and copied
/// back on updates, never mutated through a shared reference.
///
/// # Examples
///
/// ```
/// use sovran_state::{State, StateId};
///
/// #[derive(Debug, Clone)]
/// struct Disabled {
///     opacity: f32,
/// }
///
/// impl State for Disabled {}
///
/// assert_eq!(StateId::of::<Disabled>().name(), "Disabled");
/// ```
pub trait State: Any + Clone + Send + Sync + fmt::Debug {
    /// Stable human-readable identifier for this state type.
    ///
    /// Defaults to the type's name without its module path. It is used for
    /// display only; identity comparisons go through [`StateId`].
    fn name() -> &'static str {
        short_type_name::<Self>()
    }

    /// Compares two values of the same state type.
    ///
    /// The default treats every pair as equal, so two states are the same
    /// whenever their types match. Override this to take content into account.
    fn same_as(&self, _other: &Self) -> bool {
        true
    }
}

/// Identifies a state type.
///
/// Equality and hashing use the underlying `TypeId` only; the name is
/// carried along for messages.
#[derive(Clone, Copy)]
pub struct StateId {
    type_id: TypeId,
    name: &'static str,
}

impl StateId {
    /// Returns the identifier of state type `S`
    pub fn of<S: State>() -> Self {
        Self {
            type_id: TypeId::of::<S>(),
            name: S::name(),
        }
    }

    /// The `TypeId` of the state type
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Display name of the state type, as returned by [`State::name`]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns true if this identifies state type `S`
    pub fn is<S: State>(&self) -> bool {
        self.type_id == TypeId::of::<S>()
    }
}

impl PartialEq for StateId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for StateId {}

impl Hash for StateId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateId({})", self.name)
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// Strips the module path but keeps generic arguments intact.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base_end = full.find('<').unwrap_or(full.len());
    let start = full[..base_end].rfind("::").map_or(0, |i| i + 2);
    &full[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[derive(Debug, Clone)]
    struct Normal;
    impl State for Normal {}

    #[derive(Debug, Clone)]
    struct Highlighted {
        color: u32,
    }
    impl State for Highlighted {
        fn same_as(&self, other: &Self) -> bool {
            self.color == other.color
        }
    }

    #[derive(Debug, Clone)]
    struct Renamed;
    impl State for Renamed {
        fn name() -> &'static str {
            "custom-name"
        }
    }

    #[derive(Debug, Clone)]
    struct Wrapper<T>(T);
    impl<T: Clone + Send + Sync + fmt::Debug + 'static> State for Wrapper<T> {}

    #[test]
    fn test_default_name_strips_module_path() {
        assert_eq!(StateId::of::<Normal>().name(), "Normal");
        assert_eq!(StateId::of::<Highlighted>().name(), "Highlighted");
    }

    #[test]
    fn test_default_name_keeps_generic_arguments() {
        let name = StateId::of::<Wrapper<u8>>().name();
        assert_eq!(name, "Wrapper<u8>");
    }

    #[test]
    fn test_custom_name() {
        assert_eq!(StateId::of::<Renamed>().to_string(), "custom-name");
    }

    #[test]
    fn test_ids_compare_by_type() {
        assert_eq!(StateId::of::<Normal>(), StateId::of::<Normal>());
        assert_ne!(StateId::of::<Normal>(), StateId::of::<Highlighted>());
        assert!(StateId::of::<Normal>().is::<Normal>());
        assert!(!StateId::of::<Normal>().is::<Renamed>());

        let ids: HashSet<StateId> = [
            StateId::of::<Normal>(),
            StateId::of::<Normal>(),
            StateId::of::<Renamed>(),
        ]
        .into_iter()
        .collect();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_same_as_default_ignores_content() {
        assert!(Normal.same_as(&Normal));
        assert!(Highlighted { color: 1 }.same_as(&Highlighted { color: 1 }));
        assert!(!Highlighted { color: 1 }.same_as(&Highlighted { color: 2 }));
    }
}
