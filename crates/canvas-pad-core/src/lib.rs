pub mod canvas;
pub mod object;
pub mod text;

pub use canvas::{Canvas, CanvasState};
pub use object::{CanvasObject, ObjectKind, ShapeKind};
pub use text::{CharStyle, TextBox, TextStyleFlag, TextStyleUpdate};
