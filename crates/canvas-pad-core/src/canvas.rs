/// Fixed-size design canvas holding an ordered stack of objects.
///
/// The canvas is the document the history manager snapshots. Every
/// successful mutation queues one `ChangeEvent`; restoring a snapshot
/// queues an `Added` event per restored object, the way a re-render would.
use anyhow::{anyhow, bail, Context, Result};
use canvas_pad_config::{AppConfig, HexColor};
use canvas_pad_mod_history::{ChangeEvent, DocumentSurface, Snapshot};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::object::{CanvasObject, ShapeKind};
use crate::text::{TextStyleFlag, TextStyleUpdate};

/// The part of the canvas that goes into snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasState {
    pub background: HexColor,
    /// Bottom-most first.
    pub objects: Vec<CanvasObject>,
}

/// An editable canvas.
#[derive(Debug)]
pub struct Canvas {
    width: u32,
    height: u32,
    /// Background of a fresh canvas, used by `reset`.
    initial_background: HexColor,
    state: CanvasState,
    active: Option<Uuid>,
    events: Vec<ChangeEvent>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: HexColor) -> Self {
        Self {
            width,
            height,
            initial_background: background,
            state: CanvasState {
                background,
                objects: Vec::new(),
            },
            active: None,
            events: Vec::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.canvas_width, config.canvas_height, config.background)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn background(&self) -> HexColor {
        self.state.background
    }

    pub fn state(&self) -> &CanvasState {
        &self.state
    }

    pub fn objects(&self) -> &[CanvasObject] {
        &self.state.objects
    }

    pub fn len(&self) -> usize {
        self.state.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.objects.is_empty()
    }

    pub fn object(&self, id: Uuid) -> Option<&CanvasObject> {
        self.state.objects.iter().find(|o| o.id == id)
    }

    fn object_mut(&mut self, id: Uuid) -> Result<&mut CanvasObject> {
        self.state
            .objects
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| anyhow!("no object with id {id}"))
    }

    /// Currently selected object.
    pub fn active_id(&self) -> Option<Uuid> {
        self.active
    }

    /// Selects `id`. Selection is not part of the document, so no event.
    pub fn select(&mut self, id: Uuid) -> bool {
        if self.object(id).is_some() {
            self.active = Some(id);
            true
        } else {
            false
        }
    }

    pub fn deselect(&mut self) {
        self.active = None;
    }

    /// Adds `object` on top of the stack and selects it.
    pub fn add(&mut self, object: CanvasObject) -> Uuid {
        let id = object.id;
        tracing::debug!("Adding {} {id}", object.type_name());
        self.state.objects.push(object);
        self.active = Some(id);
        self.events.push(ChangeEvent::added(id.to_string()));
        id
    }

    pub fn add_text(&mut self, text: &str) -> Uuid {
        self.add(CanvasObject::text(text))
    }

    pub fn add_shape(&mut self, kind: ShapeKind) -> Uuid {
        self.add(kind.build())
    }

    /// Places an image given by `src` (URL, path or data URL).
    ///
    /// # Errors
    ///
    /// Returns an error if either natural dimension is zero.
    pub fn add_image(&mut self, src: &str, natural_width: u32, natural_height: u32) -> Result<Uuid> {
        let image = CanvasObject::image(src, natural_width, natural_height)
            .with_context(|| format!("Failed to place image {src}"))?;
        Ok(self.add(image))
    }

    /// Removes an object. Returns `false` if it did not exist.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.state.objects.len();
        self.state.objects.retain(|o| o.id != id);
        if self.state.objects.len() == before {
            return false;
        }
        if self.active == Some(id) {
            self.active = None;
        }
        self.events.push(ChangeEvent::removed(id.to_string()));
        true
    }

    /// Removes the selected object, if any.
    pub fn remove_active(&mut self) -> Option<Uuid> {
        let id = self.active?;
        self.remove(id).then_some(id)
    }

    /// # Errors
    ///
    /// Returns an error if the object does not exist or a coordinate is not
    /// finite.
    pub fn move_to(&mut self, id: Uuid, left: f64, top: f64) -> Result<bool> {
        if !left.is_finite() || !top.is_finite() {
            bail!("position ({left}, {top}) is not finite");
        }
        let object = self.object_mut(id)?;
        if object.left == left && object.top == top {
            return Ok(false);
        }
        object.left = left;
        object.top = top;
        self.events.push(ChangeEvent::modified(id.to_string()));
        Ok(true)
    }

    /// Returns whether the color changed.
    pub fn set_background(&mut self, color: HexColor) -> bool {
        if self.state.background == color {
            return false;
        }
        self.state.background = color;
        self.events.push(ChangeEvent::document_modified());
        true
    }

    /// Sets the opacity of an image, clamped to `0.0..=1.0`.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not exist, is not an image, or
    /// `opacity` is NaN.
    pub fn set_opacity(&mut self, id: Uuid, opacity: f64) -> Result<bool> {
        if opacity.is_nan() {
            bail!("opacity must be a number");
        }
        let object = self.object_mut(id)?;
        if !object.is_image() {
            bail!("opacity applies to images, {id} is a {}", object.type_name());
        }
        let opacity = opacity.clamp(0.0, 1.0);
        if object.opacity == opacity {
            return Ok(false);
        }
        object.opacity = opacity;
        self.events.push(ChangeEvent::modified(id.to_string()));
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns an error if the object does not exist, is not a text box, or
    /// the update is invalid.
    pub fn update_text_style(&mut self, id: Uuid, update: &TextStyleUpdate) -> Result<bool> {
        let object = self.object_mut(id)?;
        let kind = object.type_name();
        let text = object
            .as_text_mut()
            .ok_or_else(|| anyhow!("{id} is a {kind}, not a text box"))?;
        let changed = text.apply(update)?;
        if changed {
            self.events.push(ChangeEvent::modified(id.to_string()));
        }
        Ok(changed)
    }

    /// Toggles bold, italic or underline on the chars `start..end` of a text
    /// box.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not exist or is not a text box.
    pub fn toggle_text_style(
        &mut self,
        id: Uuid,
        flag: TextStyleFlag,
        start: usize,
        end: usize,
    ) -> Result<bool> {
        let object = self.object_mut(id)?;
        let kind = object.type_name();
        let text = object
            .as_text_mut()
            .ok_or_else(|| anyhow!("{id} is a {kind}, not a text box"))?;
        let changed = text.toggle_style(flag, start, end);
        if changed {
            self.events.push(ChangeEvent::modified(id.to_string()));
        }
        Ok(changed)
    }

    /// Pretty JSON of the document, for display.
    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.state).context("Failed to render canvas as JSON")
    }
}

impl DocumentSurface for Canvas {
    fn serialize(&self) -> Result<Snapshot> {
        let json = serde_json::to_string(&self.state).context("Failed to serialize canvas")?;
        Ok(Snapshot::new(json))
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        let state: CanvasState =
            serde_json::from_str(snapshot.as_str()).context("Failed to parse canvas snapshot")?;

        self.state = state;
        if self.active.is_some_and(|id| self.object(id).is_none()) {
            self.active = None;
        }
        let added = self
            .state
            .objects
            .iter()
            .map(|o| ChangeEvent::added(o.id.to_string()));
        self.events.extend(added);
        Ok(())
    }

    fn reset(&mut self) {
        self.state = CanvasState {
            background: self.initial_background,
            objects: Vec::new(),
        };
        self.active = None;
    }

    fn take_events(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.events)
    }
}
