//! [`Task`]-related read models.

use crate::domain::{task, user, Task};

/// All [`Task`]s of a single owner, as kept in the cache.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct List {
    /// ID of the [`User`] owning the [`Task`]s.
    ///
    /// [`User`]: crate::domain::User
    pub owner_id: user::Id,

    /// [`Task`]s of the owner.
    pub tasks: Vec<Task>,
}

impl List {
    /// Appends the provided [`Task`] to this [`List`], or replaces the one
    /// with the same ID if this [`List`] already holds it.
    ///
    /// A [`List`] rebuilt from the store between an insert and this call may
    /// already contain the inserted [`Task`].
    pub fn push(&mut self, task: Task) {
        if !self.replace(task.clone()) {
            self.tasks.push(task);
        }
    }

    /// Replaces the first [`Task`] with the same ID in this [`List`].
    ///
    /// Returns `false` if there is no such [`Task`] in this [`List`].
    pub fn replace(&mut self, task: Task) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(t) => {
                *t = task;
                true
            }
            None => false,
        }
    }

    /// Removes the first [`Task`] with the provided ID from this [`List`].
    pub fn remove(&mut self, id: task::Id) -> Option<Task> {
        let pos = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(pos))
    }
}

#[cfg(test)]
mod spec {
    use crate::domain::{task, Task};

    use super::List;

    fn task(id: i64, title: &str) -> Task {
        Task {
            id: id.into(),
            title: task::Title::new(title).unwrap(),
            description: task::Description::new("d").unwrap(),
            status: false,
            owner_id: 1.into(),
        }
    }

    fn list(tasks: Vec<Task>) -> List {
        List {
            owner_id: 1.into(),
            tasks,
        }
    }

    #[test]
    fn pushes_each_id_once() {
        let mut l = list(vec![task(1, "a")]);

        l.push(task(2, "b"));
        l.push(task(1, "A"));

        assert_eq!(l, list(vec![task(1, "A"), task(2, "b")]));
    }

    #[test]
    fn replaces_in_place() {
        let mut l = list(vec![task(1, "a"), task(2, "b"), task(3, "c")]);

        assert!(l.replace(task(2, "B")));

        assert_eq!(l, list(vec![task(1, "a"), task(2, "B"), task(3, "c")]));
    }

    #[test]
    fn replace_of_absent_changes_nothing() {
        let mut l = list(vec![task(1, "a")]);

        assert!(!l.replace(task(2, "b")));

        assert_eq!(l, list(vec![task(1, "a")]));
    }

    #[test]
    fn removes_preserving_order() {
        let mut l = list(vec![task(1, "a"), task(2, "b"), task(3, "c")]);

        assert_eq!(l.remove(2.into()), Some(task(2, "b")));
        assert_eq!(l.remove(2.into()), None);

        assert_eq!(l, list(vec![task(1, "a"), task(3, "c")]));
    }
}
