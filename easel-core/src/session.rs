//! A canvas session - the ordered set of elements on one canvas.

use serde::{Deserialize, Serialize};

use crate::element::{CanvasElement, ElementId};
use crate::error::{CanvasError, CanvasResult};

/// Elements placed on a canvas, bottom-most first.
///
/// Element ids are unique within a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CanvasElement>", into = "Vec<CanvasElement>")]
pub struct CanvasSession {
    elements: Vec<CanvasElement>,
}

impl CanvasSession {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an element on top of the stack.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::DuplicateElement`] if the id is already placed.
    pub fn add(&mut self, element: CanvasElement) -> CanvasResult<ElementId> {
        if self.position(&element.id).is_some() {
            return Err(CanvasError::DuplicateElement(element.id.to_string()));
        }
        let id = element.id.clone();
        tracing::debug!(element_id = %id, element_type = %element.element_type(), "Element added");
        self.elements.push(element);
        Ok(id)
    }

    /// Remove an element.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] if no element has this id.
    pub fn remove(&mut self, id: &ElementId) -> CanvasResult<CanvasElement> {
        let index = self
            .position(id)
            .ok_or_else(|| CanvasError::ElementNotFound(id.to_string()))?;
        Ok(self.elements.remove(index))
    }

    /// Get an element by id.
    #[must_use]
    pub fn get(&self, id: &ElementId) -> Option<&CanvasElement> {
        self.elements.iter().find(|element| &element.id == id)
    }

    /// Get a mutable reference to an element by id.
    pub fn get_mut(&mut self, id: &ElementId) -> Option<&mut CanvasElement> {
        self.elements.iter_mut().find(|element| &element.id == id)
    }

    /// All elements, bottom-most first.
    pub fn elements(&self) -> impl Iterator<Item = &CanvasElement> {
        self.elements.iter()
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the session has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Apply a generated image URL to an image element.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] if the id is unknown, or
    /// [`CanvasError::InvalidOperation`] if the element is not an image.
    pub fn apply_generated_image(&mut self, id: &ElementId, url: &str) -> CanvasResult<()> {
        let element = self
            .get_mut(id)
            .ok_or_else(|| CanvasError::ElementNotFound(id.to_string()))?;
        element.set_image_source(url)?;
        tracing::info!(element_id = %id, url, "Applied generated image");
        Ok(())
    }

    fn position(&self, id: &ElementId) -> Option<usize> {
        self.elements.iter().position(|element| &element.id == id)
    }
}

impl TryFrom<Vec<CanvasElement>> for CanvasSession {
    type Error = CanvasError;

    fn try_from(elements: Vec<CanvasElement>) -> Result<Self, Self::Error> {
        let mut session = Self::new();
        for element in elements {
            session.add(element)?;
        }
        Ok(session)
    }
}

impl From<CanvasSession> for Vec<CanvasElement> {
    fn from(session: CanvasSession) -> Self {
        session.elements
    }
}
