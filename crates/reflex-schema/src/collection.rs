//! Ordered, non-empty containers of one entity kind.

use std::ops::Index;

use crate::entity::Entity;
use crate::error::{Result, SchemaError};

/// An ordered, non-empty sequence of entities.
///
/// Mutation is for model assembly; once handed to a renderer the collection
/// is only read.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    elements: Vec<T>,
}

impl<T> Collection<T> {
    /// Wrap a pre-built list. An empty list is rejected.
    pub fn new(elements: Vec<T>) -> Result<Self> {
        if elements.is_empty() {
            return Err(SchemaError::EmptyCollection);
        }
        Ok(Self { elements })
    }

    pub fn append(&mut self, element: T) {
        self.elements.push(element);
    }

    /// Insert before `index`; an index past the end appends.
    pub fn insert(&mut self, index: usize, element: T) {
        let index = index.min(self.elements.len());
        self.elements.insert(index, element);
    }

    /// Remove and return the element at `index`, or the last one for `None`.
    ///
    /// Removing the only remaining element is refused.
    pub fn pop(&mut self, index: Option<usize>) -> Result<T> {
        let len = self.elements.len();
        let index = index.unwrap_or(len - 1);
        if index >= len {
            return Err(SchemaError::IndexOutOfRange { index, len });
        }
        if len == 1 {
            return Err(SchemaError::EmptyCollection);
        }
        Ok(self.elements.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.elements.get(index)
    }

    pub fn first(&self) -> &T {
        &self.elements[0]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Always false; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.elements
    }

    pub fn into_vec(self) -> Vec<T> {
        self.elements
    }
}

impl<T: Entity> Collection<T> {
    /// First element with the given name.
    pub fn find(&self, name: &str) -> Option<&T> {
        self.elements.iter().find(|element| element.name() == name)
    }
}

impl<T> Index<usize> for Collection<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.elements[index]
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<T> TryFrom<Vec<T>> for Collection<T> {
    type Error = SchemaError;

    fn try_from(elements: Vec<T>) -> Result<Self> {
        Self::new(elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::PayloadType;
    use crate::register::Register;

    fn registers() -> Collection<Register> {
        Collection::new(vec![
            Register::new("R1", 1, PayloadType::U8),
            Register::new("R2", 2, PayloadType::U8),
        ])
        .unwrap()
    }

    #[test]
    fn empty_collection_is_rejected() {
        let err = Collection::<Register>::new(Vec::new()).unwrap_err();
        assert!(matches!(err, SchemaError::EmptyCollection));
    }

    #[test]
    fn pop_front_shifts_remaining() {
        let mut regs = registers();
        let popped = regs.pop(Some(0)).unwrap();
        assert_eq!(popped.name(), "R1");
        assert_eq!(regs.len(), 1);
        assert_eq!(regs[0].name(), "R2");
    }

    #[test]
    fn pop_defaults_to_last() {
        let mut regs = registers();
        assert_eq!(regs.pop(None).unwrap().name(), "R2");
    }

    #[test]
    fn pop_keeps_collection_non_empty() {
        let mut regs = registers();
        regs.pop(None).unwrap();
        assert!(matches!(regs.pop(None), Err(SchemaError::EmptyCollection)));
        assert!(matches!(
            regs.pop(Some(5)),
            Err(SchemaError::IndexOutOfRange { index: 5, len: 1 })
        ));
    }

    #[test]
    fn append_and_insert_preserve_order() {
        let mut regs = registers();
        regs.append(Register::new("R4", 4, PayloadType::U8));
        regs.insert(2, Register::new("R3", 3, PayloadType::U8));
        regs.insert(99, Register::new("R5", 5, PayloadType::U8));
        let names: Vec<_> = regs.iter().map(|r| r.name().into_owned()).collect();
        assert_eq!(names, vec!["R1", "R2", "R3", "R4", "R5"]);
    }

    #[test]
    fn find_by_name() {
        let regs = registers();
        assert_eq!(regs.find("R2").unwrap().address(), 2);
        assert!(regs.find("R9").is_none());
        assert_eq!((&regs).into_iter().count(), 2);
    }
}
