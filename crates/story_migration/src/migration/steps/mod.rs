//! One module per schema step, named after the version it produces.
//!
//! Every step is a pure `fn(Value) -> StepResult<Value>`.

pub(super) mod v0002_data_pixels;
pub(super) mod v0003_font_objects;
pub(super) mod v0004_rotation_angle;
pub(super) mod v0005_color_patterns;
pub(super) mod v0006_fullbleed_background;
pub(super) mod v0007_padding_object;
pub(super) mod v0008_media_resource;
pub(super) mod v0009_background_element;
pub(super) mod v0010_inline_text_styles;
