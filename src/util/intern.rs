use std::{collections::HashMap, fmt, num::NonZeroU32, rc::Rc};

/// A handle to an interned variable name. To retrieve the `&str`, use
/// [`NameInterner::get`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name {
    // A NonZeroU32 leverages niche layout optimization.
    handle: NonZeroU32,
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.handle)
    }
}

/// Deduplicating store for variable names. Every occurrence of the same
/// spelling maps to the same [`Name`] handle, so name comparisons during
/// code generation are integer comparisons.
pub struct NameInterner {
    map: HashMap<Rc<str>, NonZeroU32>,
    vec: Vec<Rc<str>>,
}

impl NameInterner {
    pub fn with_capacity(capacity: usize) -> Self {
        NameInterner {
            map: HashMap::with_capacity(capacity),
            vec: Vec::with_capacity(capacity),
        }
    }

    /// Interns the provided name, returning a handle which can be used to
    /// retrieve it later.
    pub fn intern(&mut self, name: &str) -> Name {
        if let Some(handle) = self.map.get(name) {
            return Name { handle: *handle };
        }
        let key: Rc<str> = Rc::from(name);
        let len = u32::try_from(self.vec.len()).expect("interner out of capacity");
        // The +1 keeps zero free for the niche.
        let handle = NonZeroU32::new(len + 1).unwrap();
        self.vec.push(Rc::clone(&key));
        self.map.insert(key, handle);
        Name { handle }
    }

    /// Returns the spelling for the provided [`Name`] handle. Panics if not
    /// found.
    pub fn get(&self, name: Name) -> &str {
        let index = name.handle.get() - 1;
        &self.vec[index as usize]
    }
}

impl fmt::Debug for NameInterner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (i, name) in self.vec.iter().enumerate() {
            map.entry(&(i + 1), name);
        }
        map.finish()
    }
}
