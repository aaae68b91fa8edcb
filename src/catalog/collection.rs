use uuid::Uuid;

/// A record held by an [`EntityCollection`].
pub trait Entity: Clone {
    fn id(&self) -> Uuid;

    /// Text fields consulted by free-text search.
    fn search_fields(&self) -> Vec<&str>;
}

/// Where newly added entities land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Head,
    Tail,
}

/// Case-insensitive substring query. A blank query matches everything.
#[derive(Debug, Clone, Default)]
pub struct TextQuery {
    needle: Option<String>,
}

impl TextQuery {
    pub fn new(raw: Option<&str>) -> Self {
        let needle = raw
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_lowercase);
        Self { needle }
    }

    pub fn is_blank(&self) -> bool {
        self.needle.is_none()
    }

    pub fn matches<T: Entity>(&self, entity: &T) -> bool {
        match &self.needle {
            None => true,
            Some(needle) => entity
                .search_fields()
                .into_iter()
                .any(|field| field.to_lowercase().contains(needle.as_str())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntityCollection<T> {
    items: Vec<T>,
    placement: Placement,
}

impl<T: Entity> EntityCollection<T> {
    pub fn new(placement: Placement) -> Self {
        Self {
            items: Vec::new(),
            placement,
        }
    }

    /// Builds a collection that keeps `items` in the given order.
    pub fn with_items(placement: Placement, items: Vec<T>) -> Self {
        Self { items, placement }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn get(&self, id: Uuid) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    pub fn find<P>(&self, predicate: P) -> Option<&T>
    where
        P: Fn(&T) -> bool,
    {
        self.items.iter().find(|item| predicate(item))
    }

    /// Entities matching `predicate`, in collection order. Never mutates.
    pub fn list<P>(&self, predicate: P) -> Vec<T>
    where
        P: Fn(&T) -> bool,
    {
        self.items
            .iter()
            .filter(|item| predicate(item))
            .cloned()
            .collect()
    }

    pub fn search(&self, query: &TextQuery) -> Vec<T> {
        self.list(|item| query.matches(item))
    }

    /// Inserts the entity produced by `build` under a fresh identifier.
    pub fn add<F>(&mut self, build: F) -> &T
    where
        F: FnOnce(Uuid) -> T,
    {
        let mut id = Uuid::new_v4();
        while self.contains(id) {
            id = Uuid::new_v4();
        }

        let entity = build(id);
        match self.placement {
            Placement::Head => {
                self.items.insert(0, entity);
                &self.items[0]
            }
            Placement::Tail => {
                self.items.push(entity);
                &self.items[self.items.len() - 1]
            }
        }
    }

    /// Removes the entity with `id`; unknown ids leave the collection untouched.
    pub fn remove(&mut self, id: Uuid) -> Option<T> {
        let position = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(position))
    }

    pub fn update<F>(&mut self, id: Uuid, apply: F) -> Option<&T>
    where
        F: FnOnce(&mut T),
    {
        let item = self.items.iter_mut().find(|item| item.id() == id)?;
        apply(item);
        Some(&*item)
    }
}
