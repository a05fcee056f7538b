use std::{borrow::Cow, sync::Arc};

use crate::foundation::error::{StageError, StageResult};

pub use parley::FontData;

/// One glyph positioned relative to the top-left of its layout box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextGlyph {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

/// Glyphs sharing one font face and size.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub font: FontData,
    pub font_size: f32,
    pub glyphs: Vec<TextGlyph>,
}

/// Shaped and line-broken text, ready to paint.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapedText {
    pub runs: Vec<TextRun>,
    /// Layout box width in CSS pixels.
    pub width: f64,
    /// Layout box height in CSS pixels.
    pub height: f64,
}

impl ShapedText {
    pub fn glyph_count(&self) -> usize {
        self.runs.iter().map(|r| r.glyphs.len()).sum()
    }
}

/// Shapes labels with a single registered font family.
///
/// Text color is not part of the layout; it travels on the draw op.
pub struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    family: String,
}

impl std::fmt::Debug for TextEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEngine")
            .field("family", &self.family)
            .finish()
    }
}

impl TextEngine {
    /// Register `font_bytes` (TTF/OTF) and use its first family for every label.
    pub fn from_font_bytes(font_bytes: &[u8]) -> StageResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| StageError::validation("no font families registered from font bytes"))?;
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| StageError::validation("registered font family has no name"))?
            .to_string();
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family,
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// Shape `text` at `size_px`, center-aligned and wrapped to `max_width_px` when given.
    pub fn shape(
        &mut self,
        text: &str,
        size_px: f32,
        max_width_px: Option<f32>,
    ) -> StageResult<Arc<ShapedText>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(StageError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::StyleProperty::FontFamily(parley::FontFamily::Single(
            parley::FontFamilyName::Named(Cow::Owned(self.family.clone())),
        )));
        builder.push_default(parley::StyleProperty::FontSize(size_px));

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(max_width_px);
        layout.align(parley::Alignment::Center, parley::AlignmentOptions::default());

        let mut runs = Vec::new();
        for line in layout.lines() {
            for item in line.items() {
                let parley::PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let run = glyph_run.run();
                let glyphs: Vec<TextGlyph> = glyph_run
                    .positioned_glyphs()
                    .map(|g| TextGlyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    })
                    .collect();
                if glyphs.is_empty() {
                    continue;
                }
                runs.push(TextRun {
                    font: run.font().clone(),
                    font_size: run.font_size(),
                    glyphs,
                });
            }
        }

        Ok(Arc::new(ShapedText {
            runs,
            width: f64::from(layout.width()),
            height: f64::from(layout.height()),
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
