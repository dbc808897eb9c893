use std::collections::HashSet;
use uuid::Uuid;

/// Devices the user has picked. Ids outlive refreshes, so one may name a
/// device that's no longer listed.
#[derive(Clone, Debug, Default)]
pub struct Selection {
    ids: HashSet<Uuid>,
}

impl Selection {
    pub fn select(&mut self, id: Uuid) -> bool {
        self.ids.insert(id)
    }

    pub fn deselect(&mut self, id: &Uuid) -> bool {
        self.ids.remove(id)
    }

    pub fn is_selected(&self, id: &Uuid) -> bool {
        self.ids.contains(id)
    }

    pub fn selected_ids(&self) -> &HashSet<Uuid> {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear()
    }
}

impl Extend<Uuid> for Selection {
    fn extend<T: IntoIterator<Item = Uuid>>(&mut self, iter: T) {
        self.ids.extend(iter)
    }
}
